//! Execution-level error taxonomy (spec §7). Exactly these seven kinds ever
//! reach a terminal execution record's `error.kind`; nothing else does.

use nebula_core::NodeId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExecutionError {
    /// Graph structure is malformed; never retried. `reason` carries one of
    /// the validator's sub-reasons (missing-field, bad-model-id, orphan,
    /// cycle, unreachable, too-deep, bad-edge-endpoint).
    #[error("validation: {reason}")]
    Validation { reason: String },

    /// A conditional evaluated with no rule true and no default condition.
    #[error("conditional {node} matched no branch")]
    NoMatchingBranch { node: NodeId },

    /// Wrapped fault from a node handler.
    #[error("node {node} failed: {message}")]
    HandlerFailure { node: NodeId, message: String },

    /// External HTTP failure after retries exhausted.
    #[error("tool transport failure on node {node} (status {status}): {message}")]
    ToolTransport {
        node: NodeId,
        status: u16,
        message: String,
    },

    /// Handler blocked by the credential whitelist.
    #[error("tool `{tool_type}` not enabled for this user (node {node})")]
    ToolNotEnabled { node: NodeId, tool_type: String },

    /// Explicit cancellation.
    #[error("execution cancelled")]
    Cancelled,

    /// Bug-class errors from the engine itself.
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl ExecutionError {
    /// The stable string recorded at `execution.error.kind`.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::NoMatchingBranch { .. } => "no_matching_branch",
            Self::HandlerFailure { .. } => "handler_failure",
            Self::ToolTransport { .. } => "tool_transport",
            Self::ToolNotEnabled { .. } => "tool_not_enabled",
            Self::Cancelled => "cancelled",
            Self::Internal { .. } => "internal",
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
