//! In-memory stand-ins for the three collaborators spec §6 leaves external
//! (agent invoker, credential broker, graph store) plus the tool transport
//! `nebula-dispatch` calls through. Good enough for `nebula run`'s local
//! smoke test; a real deployment supplies its own.

use async_trait::async_trait;
use nebula_core::UserId;
use nebula_dispatch::{
    AgentInvocation, AgentInvoker, CredentialBroker, ResolvedCredential, ToolCallResponse, ToolTransport,
    ToolTransportError,
};
use nebula_engine::collaborators::GraphStore;
use nebula_engine::record::ExecutionRecord;
use nebula_execution::ExecutionError;
use nebula_telemetry::{NoopPricingTable, PricingTable};
use nebula_workflow::{AgentSpec, ToolSpec};
use serde_json::{Map, Value};

/// Echoes the prompt back as the agent's final output, prefixed so a reader
/// can tell a real model didn't run. Fine for exercising the graph walk;
/// useless for anything else.
#[derive(Debug, Default)]
pub struct EchoAgentInvoker;

#[async_trait]
impl AgentInvoker for EchoAgentInvoker {
    async fn invoke(
        &self,
        agent: &AgentSpec,
        _tools: &[ToolSpec],
        prompt: &str,
        _framework: &str,
    ) -> Result<AgentInvocation, ExecutionError> {
        Ok(AgentInvocation {
            final_output: prompt.to_string(),
            trace: serde_json::json!({
                "spans": [{
                    "name": agent.name,
                    "span_id": "stub-span",
                    "trace_id": "stub-trace",
                    "attributes": {},
                }],
            }),
        })
    }
}

/// Never has a credential on file — every tool node that isn't a built-in
/// (`search_web`/`visit_webpage`) fails with `tool_not_enabled`.
#[derive(Debug, Default)]
pub struct NoCredentialBroker;

#[async_trait]
impl CredentialBroker for NoCredentialBroker {
    async fn resolve(&self, _user_id: &UserId) -> Option<ResolvedCredential> {
        None
    }
}

/// Fails every outbound call it's asked to make — there is no real network
/// boundary behind this stub, so any non-built-in tool node always fails.
#[derive(Debug, Default)]
pub struct UnreachableToolTransport;

#[async_trait]
impl ToolTransport for UnreachableToolTransport {
    async fn call(
        &self,
        tool_type: &str,
        _api_key: &str,
        _inputs: &Map<String, Value>,
    ) -> Result<ToolCallResponse, ToolTransportError> {
        Err(ToolTransportError::Other {
            message: format!("no transport configured for tool `{tool_type}` in the CLI smoke-test harness"),
        })
    }
}

/// Discards every terminal execution snapshot — `nebula run` already prints
/// the record itself, so there's nothing for this to persist.
#[derive(Debug, Default)]
pub struct DiscardGraphStore;

#[async_trait]
impl GraphStore for DiscardGraphStore {
    async fn record(&self, _execution: &ExecutionRecord) {}
}

#[must_use]
pub fn noop_pricing() -> std::sync::Arc<dyn PricingTable> {
    std::sync::Arc::new(NoopPricingTable)
}
