//! The validator's own error taxonomy — one variant per way a submitted
//! graph can fail a structural check (spec §4.1). `code()` gives the short
//! token `nebula-engine` copies into `ExecutionError::Validation { reason }`
//! without needing to parse the `Display` text.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("node `{node_id}` is missing required field `{field}`")]
    MissingField { node_id: String, field: &'static str },

    #[error("graph has no agent or tool node to execute")]
    NoExecutableNode,

    #[error("agent node `{node_id}` has empty instructions")]
    EmptyInstructions { node_id: String },

    #[error("agent node `{node_id}` has unrecognized model_id `{model_id}`")]
    InvalidModelId { node_id: String, model_id: String },

    #[error("edge `{edge_id}` references unknown node `{node_id}`")]
    DanglingEdge { edge_id: String, node_id: String },

    #[error("node `{node_id}` is an orphan (no incoming or outgoing edges)")]
    Orphan { node_id: String },

    #[error("graph has no start node (every node has an incoming edge)")]
    NoStartNode,

    #[error("graph has no end node (every node has an outgoing edge)")]
    NoEndNode,

    #[error("node `{node_id}` is not reachable from any start node")]
    Unreachable { node_id: String },

    #[error("graph contains a cycle: {path}")]
    Cycle { path: String },

    #[error("longest start-to-end path has {length} nodes, exceeding the bound of {bound}")]
    PathTooLong { length: usize, bound: usize },
}

impl ValidationError {
    /// Stable short token, independent of the interpolated `Display` text —
    /// this is what `nebula-engine` records as `ExecutionError::Validation { reason }`.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingField { .. } => "missing-field",
            Self::NoExecutableNode => "no-executable-node",
            Self::EmptyInstructions { .. } => "missing-field",
            Self::InvalidModelId { .. } => "bad-model-id",
            Self::DanglingEdge { .. } => "bad-edge-endpoint",
            Self::Orphan { .. } => "orphan",
            Self::NoStartNode => "orphan",
            Self::NoEndNode => "orphan",
            Self::Unreachable { .. } => "unreachable",
            Self::Cycle { .. } => "cycle",
            Self::PathTooLong { .. } => "too-deep",
        }
    }
}
