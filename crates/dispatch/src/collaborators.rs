//! Contract boundaries a node handler calls out through (spec §6). These
//! are the two collaborators dispatch itself needs — `AgentInvoker` for
//! agent nodes, `CredentialBroker` and `ToolTransport` for tool nodes.
//! `nebula-engine::collaborators` re-exports `AgentInvoker` and
//! `CredentialBroker` from here so callers only ever import from one
//! place; `GraphStore` (engine-only, never called from a handler) is
//! defined directly in `nebula-engine`.

use async_trait::async_trait;
use nebula_core::UserId;
use nebula_workflow::{AgentSpec, ToolSpec};
use serde_json::Value;

/// Result of an agent invocation (spec §6: `invoke(...) -> {final_output, trace}`).
#[derive(Debug, Clone)]
pub struct AgentInvocation {
    pub final_output: String,
    /// Opaque trace handed unmodified to `nebula-telemetry`.
    pub trace: Value,
}

/// Delegates an agent node to whatever runs the model (spec §6).
/// `framework` is the opaque submission-level hint (spec §6's "Submission
/// surface") threaded through unchanged; the invoker interprets it, this
/// workspace never does.
#[async_trait]
pub trait AgentInvoker: Send + Sync {
    async fn invoke(
        &self,
        agent: &AgentSpec,
        tools: &[ToolSpec],
        prompt: &str,
        framework: &str,
    ) -> Result<AgentInvocation, nebula_execution::ExecutionError>;
}

/// A resolved per-user credential (spec §6: `resolve(user_id) -> {api_key, enabled_tool_ids?}`).
#[derive(Debug, Clone)]
pub struct ResolvedCredential {
    pub api_key: String,
    /// `None` means no whitelist restriction; `Some(ids)` means only those
    /// tool ids may be dispatched for this user.
    pub enabled_tool_ids: Option<Vec<String>>,
}

/// Resolves a user's external-tool credential.
#[async_trait]
pub trait CredentialBroker: Send + Sync {
    async fn resolve(&self, user_id: &UserId) -> Option<ResolvedCredential>;
}

/// The body of a successful external tool call.
#[derive(Debug, Clone)]
pub struct ToolCallResponse {
    pub body: Value,
}

/// Why an external tool call failed, carrying enough of the HTTP status to
/// classify it as retryable or not.
#[derive(Debug, Clone)]
pub enum ToolTransportError {
    Status { status: u16, message: String },
    Other { message: String },
}

/// The actual network boundary for built-in and Composio-style tools.
/// Kept as a trait so `nebula-dispatch` never links `reqwest`'s request
/// path directly into test builds — only its `StatusCode` vocabulary
/// shapes [`ToolTransportError`].
#[async_trait]
pub trait ToolTransport: Send + Sync {
    async fn call(
        &self,
        tool_type: &str,
        api_key: &str,
        inputs: &serde_json::Map<String, Value>,
    ) -> Result<ToolCallResponse, ToolTransportError>;
}
