use std::collections::HashMap;

use super::Value;

/// A record to classify: a flat mapping from property name to [`Value`].
///
/// A property set to [`Value::Null`] is present; a property never set is
/// missing. Conditions on null only match the former.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    data: HashMap<String, Value>,
}

impl Record {
    /// Create an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a property, replacing any previous value.
    #[must_use]
    pub fn set(mut self, property: &str, value: impl Into<Value>) -> Self {
        self.insert(property, value);
        self
    }

    /// Set a property (mutable reference version).
    pub fn insert(&mut self, property: &str, value: impl Into<Value>) {
        self.data.insert(property.to_owned(), value.into());
    }

    /// Remove a property, making it missing rather than null.
    pub fn remove(&mut self, property: &str) -> Option<Value> {
        self.data.remove(property)
    }

    #[must_use]
    pub fn get(&self, property: &str) -> Option<&Value> {
        self.data.get(property)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.data.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K, V> FromIterator<(K, V)> for Record
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            data: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
