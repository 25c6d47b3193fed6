use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use crate::{Conditions, Rule, Value};

use super::ParseError;

/// One `rule` definition as written, before property names are checked for
/// duplicates.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRule {
    pub outcome: String,
    pub conditions: Vec<(String, Vec<Value>)>,
}

/// The result of parsing a DSL input string.
#[derive(Debug)]
pub struct ParsedRules {
    pub rules: Vec<Rule<String>>,
}

impl ParsedRules {
    pub(crate) fn from_parsed(parsed: Vec<ParsedRule>) -> Result<Self, ParseError> {
        let rules = parsed
            .into_iter()
            .map(ParsedRule::into_rule)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }
}

impl ParsedRule {
    fn into_rule(self) -> Result<Rule<String>, ParseError> {
        let mut conditions = BTreeMap::new();
        for (property, values) in self.conditions {
            match conditions.entry(property) {
                Entry::Occupied(e) => {
                    return Err(ParseError::new(format!(
                        "duplicate property '{}' in rule '{}'",
                        e.key(),
                        self.outcome
                    )));
                }
                Entry::Vacant(e) => {
                    e.insert(Conditions { any: values });
                }
            }
        }
        Ok(Rule {
            conditions,
            outcome: self.outcome,
        })
    }
}
