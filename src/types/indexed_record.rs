use super::property_registry::PropertyRegistry;
use super::value::Value;

/// A pre-indexed record for fast matching. Values are stored in a flat `Vec`
/// with slots matching the compiled tree's property registry.
///
/// Created via [`RecordBuilder`], which is obtained from
/// [`RuleTree::record_builder()`](super::RuleTree::record_builder).
#[derive(Debug, Clone)]
pub struct IndexedRecord {
    values: Vec<Option<Value>>,
}

impl IndexedRecord {
    /// Get a property value by its pre-resolved index.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index).and_then(Option::as_ref)
    }

    #[cfg(test)]
    pub(crate) fn slots(&self) -> usize {
        self.values.len()
    }
}

/// Builder for an [`IndexedRecord`].
///
/// Property names are resolved with the compiled tree's registry. Properties
/// no rule refers to are silently dropped.
#[derive(Debug)]
pub struct RecordBuilder<'a> {
    registry: &'a PropertyRegistry,
    values: Vec<Option<Value>>,
}

impl<'a> RecordBuilder<'a> {
    pub(crate) fn new(registry: &'a PropertyRegistry) -> Self {
        Self {
            registry,
            values: vec![None; registry.len()],
        }
    }

    #[must_use]
    pub fn set(mut self, property: &str, value: impl Into<Value>) -> Self {
        self.insert(property, value);
        self
    }

    pub fn insert(&mut self, property: &str, value: impl Into<Value>) {
        if let Some(idx) = self.registry.get(property) {
            self.values[idx] = Some(value.into());
        }
    }

    #[must_use]
    pub fn build(self) -> IndexedRecord {
        IndexedRecord {
            values: self.values,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{Record, RuleTreeBuilder, Value};

    #[test]
    fn record_builder_sets_known_properties() {
        let tree = RuleTreeBuilder::new()
            .rule("r", |r| r.eq("x", 1_i64))
            .build()
            .unwrap();

        let record = tree.record_builder().set("x", 1_i64).build();
        assert_eq!(record.get(0), Some(&Value::Int(1)));
    }

    #[test]
    fn record_builder_ignores_unknown_properties() {
        let tree = RuleTreeBuilder::new()
            .rule("r", |r| r.eq("x", 1_i64))
            .build()
            .unwrap();

        let record = tree
            .record_builder()
            .set("x", 1_i64)
            .set("y", 2_i64)
            .build();
        assert_eq!(record.slots(), 1);
    }

    #[test]
    fn match_indexed_agrees_with_record() {
        let tree = RuleTreeBuilder::new()
            .rule("orange", |r| r.eq("color-a", "red").eq("color-b", "yellow"))
            .rule("dark", |r| r.any("color-a", ["black", "eternal darkness"]))
            .build()
            .unwrap();

        let mut builder = tree.record_builder();
        builder.insert("color-a", "red");
        builder.insert("color-b", "yellow");
        let indexed = builder.build();
        let plain = Record::new()
            .set("color-a", "red")
            .set("color-b", "yellow");

        assert_eq!(tree.match_indexed(&indexed).unwrap(), vec![&"orange"]);
        assert_eq!(
            tree.match_indexed(&indexed).unwrap(),
            tree.match_record(&plain).unwrap()
        );
    }

    #[test]
    fn match_indexed_missing_property() {
        let tree = RuleTreeBuilder::new()
            .rule("r", |r| r.eq("x", 1_i64))
            .build()
            .unwrap();

        let record = tree.record_builder().build();
        assert!(tree.match_indexed(&record).unwrap().is_empty());
    }
}
