use std::collections::BTreeMap;

use super::value::Value;

/// The acceptable values for one property of a rule. A record satisfies the
/// condition if its value equals any of them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conditions {
    pub any: Vec<Value>,
}

impl Conditions {
    #[must_use]
    pub fn any<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            any: values.into_iter().map(Into::into).collect(),
        }
    }
}

/// A conjunction of per-property [`Conditions`] and the outcome it contributes
/// when every condition holds.
///
/// A rule without conditions is unconditional and matches every record.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule<T> {
    pub conditions: BTreeMap<String, Conditions>,
    pub outcome: T,
}

impl<T> Rule<T> {
    /// Create an unconditional rule.
    pub fn new(outcome: T) -> Self {
        Self {
            conditions: BTreeMap::new(),
            outcome,
        }
    }

    /// Require `property` to equal any of `values`. Replaces an earlier
    /// condition on the same property.
    #[must_use]
    pub fn any<I, V>(mut self, property: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.conditions
            .insert(property.to_owned(), Conditions::any(values));
        self
    }

    /// Require `property` to equal `value`.
    #[must_use]
    pub fn eq(self, property: &str, value: impl Into<Value>) -> Self {
        self.any(property, [value.into()])
    }

    #[must_use]
    pub fn is_unconditional(&self) -> bool {
        self.conditions.is_empty()
    }
}
