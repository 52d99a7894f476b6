//! External collaborators the engine calls out to (spec §6). `AgentInvoker`
//! and `CredentialBroker` are `nebula-dispatch`'s traits, re-exported here
//! so a caller wiring up an `Engine` only ever imports from this crate.
//! `GraphStore` has no handler-level caller — only the engine's terminal
//! commit step uses it — so it's defined fresh here rather than in
//! `nebula-dispatch`.

pub use nebula_dispatch::{AgentInvoker, CredentialBroker, ToolTransport};

use async_trait::async_trait;

use crate::record::ExecutionRecord;

/// Persists a terminal execution for analytics (spec §6: "graph store —
/// persists executions for analytics"). Called exactly once per execution,
/// after the engine commits the same record to the retention store.
#[async_trait]
pub trait GraphStore: Send + Sync {
    async fn record(&self, execution: &ExecutionRecord);
}

/// A `GraphStore` that discards everything. Useful for tests and for
/// embedders who only care about the retention store / progress bus.
#[derive(Debug, Default)]
pub struct NoopGraphStore;

#[async_trait]
impl GraphStore for NoopGraphStore {
    async fn record(&self, _execution: &ExecutionRecord) {}
}
