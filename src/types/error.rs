use thiserror::Error;

use super::ValueKind;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("invalid value type: {kind} in condition on '{property}' (rule #{rule})")]
    InvalidValueKind {
        rule: usize,
        property: String,
        kind: ValueKind,
    },
}

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("invalid value type: {kind} for property '{property}'")]
    InvalidValueKind { property: String, kind: ValueKind },
}
