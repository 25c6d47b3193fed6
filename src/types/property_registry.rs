use std::collections::HashMap;

/// Maps property names referenced by any rule to dense integer indices.
///
/// Built during compilation in first-seen order (rule order, then property
/// name order within a rule). Tree branches and [`IndexedRecord`](super::IndexedRecord)
/// slots refer to properties by these indices.
#[derive(Debug, Clone, Default)]
pub struct PropertyRegistry {
    indices: HashMap<String, usize>,
    names: Vec<String>,
}

impl PropertyRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[cfg(feature = "binary-cache")]
    pub(crate) fn from_names(names: Vec<String>) -> Self {
        let indices = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Self { indices, names }
    }

    /// Register a property, returning its index. If the property is already
    /// registered, returns the existing index.
    pub(crate) fn register(&mut self, name: &str) -> usize {
        if let Some(&idx) = self.indices.get(name) {
            return idx;
        }
        let idx = self.names.len();
        self.indices.insert(name.to_owned(), idx);
        self.names.push(name.to_owned());
        idx
    }

    /// Look up the index for a property name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<usize> {
        self.indices.get(name).copied()
    }

    /// The name registered at `index`.
    #[must_use]
    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterate over property names in index order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_get() {
        let mut reg = PropertyRegistry::new();
        let idx = reg.register("color-a");
        assert_eq!(idx, 0);
        assert_eq!(reg.get("color-a"), Some(0));
        assert_eq!(reg.name(0), Some("color-a"));
    }

    #[test]
    fn duplicate_register_returns_same_index() {
        let mut reg = PropertyRegistry::new();
        let idx1 = reg.register("color-a");
        let idx2 = reg.register("color-a");
        assert_eq!(idx1, idx2);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn indices_follow_registration_order() {
        let mut reg = PropertyRegistry::new();
        reg.register("z");
        reg.register("a");
        reg.register("m");
        assert_eq!(reg.iter().collect::<Vec<_>>(), vec!["z", "a", "m"]);
    }

    #[test]
    fn get_missing_returns_none() {
        let reg = PropertyRegistry::new();
        assert_eq!(reg.get("nonexistent"), None);
        assert_eq!(reg.name(0), None);
        assert!(reg.is_empty());
    }
}
