mod error;
mod grouping;
mod indexed_record;
mod match_report;
mod node;
mod property_registry;
mod record;
mod rule;
mod tree;
mod value;

pub use error::{CompileError, MatchError};
pub use grouping::GroupingStrategy;
pub use indexed_record::{IndexedRecord, RecordBuilder};
pub use match_report::MatchReport;
pub(crate) use node::{Branch, Edges, Node};
pub use property_registry::PropertyRegistry;
pub use record::Record;
pub use rule::{Conditions, Rule};
pub use tree::{RuleBuilder, RuleTree, RuleTreeBuilder};
pub use value::{Scalar, Value, ValueKind};
