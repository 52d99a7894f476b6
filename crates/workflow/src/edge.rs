//! Typed edges. An edge just names its endpoints — `nebula-validator`
//! guarantees both ends exist in the same graph before a [`crate::graph::WorkflowDefinition`]
//! is ever constructed, so this type carries no validation of its own.

use nebula_core::NodeId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub source: NodeId,
    pub target: NodeId,
    /// Which of a conditional source's `conditions[].id` this edge is gated
    /// on, when the source is a conditional node. `None` for edges leaving
    /// any other node kind.
    #[serde(default)]
    pub source_handle: Option<String>,
    /// `"tool"` when this edge binds a tool node into an agent's tool set
    /// rather than describing step order.
    #[serde(default)]
    pub target_handle: Option<String>,
}

impl Edge {
    pub fn binds_tool(&self) -> bool {
        self.target_handle.as_deref() == Some("tool")
    }
}
