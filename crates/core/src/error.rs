use thiserror::Error;

use crate::id::ExecutionIdParseError;

/// Errors shared by the id/type layer. Component-specific errors
/// (validation, dispatch, engine) live in their own crates and convert
/// into their own taxonomies; this is deliberately small.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid execution id: {0}")]
    InvalidExecutionId(#[from] ExecutionIdParseError),
}
