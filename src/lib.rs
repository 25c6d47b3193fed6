//! Classify records against declarative property rules.
//!
//! Rules are conjunctions of per-property "any of these values" conditions,
//! each carrying an outcome. [`RuleTreeBuilder`] compiles them once into a
//! discrimination tree keyed on (property, value) pairs, and
//! [`RuleTree::match_record`] walks that tree to collect the outcome of every
//! rule a record satisfies.

mod compile;
mod error;
mod matcher;
pub mod parse;
#[cfg(feature = "binary-cache")]
pub mod serial;
mod types;

pub use error::PropmatchError;
#[cfg(feature = "binary-cache")]
pub use serial::{DeserializeError, SerializeError};
pub use types::{
    CompileError, Conditions, GroupingStrategy, IndexedRecord, MatchError, MatchReport,
    PropertyRegistry, Record, RecordBuilder, Rule, RuleBuilder, RuleTree, RuleTreeBuilder, Scalar,
    Value, ValueKind,
};
