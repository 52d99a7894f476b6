//! Node output types.
//!
//! Spec §3 commits to inline JSON output only — the teacher's
//! `ExecutionOutput::BlobRef` spillover path has no counterpart here (no
//! submission payload this spec handles approaches blob-storage scale; see
//! DESIGN.md).

use std::time::Duration;

use chrono::{DateTime, Utc};
use nebula_workflow::NodeState;
use serde::{Deserialize, Serialize};

/// A node's output data along with execution metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeOutput {
    /// The output value produced by the handler.
    pub value: serde_json::Value,
    /// The node state when this output was produced.
    pub status: NodeState,
    /// When this output was produced.
    pub produced_at: DateTime<Utc>,
    /// How long the node took to produce this output.
    #[serde(default, with = "crate::serde_duration_opt")]
    pub duration: Option<Duration>,
}

impl NodeOutput {
    #[must_use]
    pub fn new(value: serde_json::Value, status: NodeState) -> Self {
        Self {
            value,
            status,
            produced_at: Utc::now(),
            duration: None,
        }
    }

    #[must_use]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }
}
