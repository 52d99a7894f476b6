//! The execution record C9 stores and C7 publishes snapshots of (spec §3).
//!
//! `nebula_execution::ExecutionState` already carries every field of the
//! spec's Execution record except `trace` — it's tracked separately here
//! rather than folded into `ExecutionState` itself, since `trace` is only
//! ever produced once, at terminal status, by a crate (`nebula-telemetry`)
//! that `nebula-execution` doesn't and shouldn't depend on.

use nebula_execution::ExecutionState;
use nebula_telemetry::Trace;
use serde::{Deserialize, Serialize};

/// An execution's full persisted state: the state machine `nebula-execution`
/// already models, plus the telemetry trace attached once the execution
/// reaches a terminal status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub state: ExecutionState,
    #[serde(default)]
    pub trace: Option<Trace>,
}

impl ExecutionRecord {
    #[must_use]
    pub fn new(state: ExecutionState) -> Self {
        Self { state, trace: None }
    }
}
