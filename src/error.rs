use thiserror::Error;

use crate::parse::ParseError;
use crate::{CompileError, MatchError};

/// Unified error type covering parsing, compilation, matching, and I/O.
///
/// Returned by convenience methods like [`RuleTree::from_dsl()`](crate::RuleTree::from_dsl)
/// and [`RuleTree::from_file()`](crate::RuleTree::from_file).
#[derive(Debug, Error)]
pub enum PropmatchError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Match(#[from] MatchError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[cfg(feature = "binary-cache")]
    #[error(transparent)]
    Serialize(#[from] crate::serial::SerializeError),

    #[cfg(feature = "binary-cache")]
    #[error(transparent)]
    Deserialize(#[from] crate::serial::DeserializeError),
}
