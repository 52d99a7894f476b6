//! Webhook registry — C10 (spec §4.8). `register` binds a frozen graph to a
//! random id; `trigger` constructs a submission from a posted body and
//! drives it through the standard engine entry point, suspending
//! cooperatively until the execution reaches a terminal status.
//!
//! Deliberately not an HTTP server: no `axum`/`tower-http` route glue lives
//! here (spec §1's non-goal). An embedder wires `trigger`'s `webhook_id`/
//! `body` parameters to whatever HTTP framework it already runs.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use nebula_core::UserId;
use nebula_engine::{Engine, Submission};
use nebula_execution::ExecutionStatus;
use nebula_workflow::GraphWire;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A webhook's opaque id, minted at `register` time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WebhookId(String);

impl WebhookId {
    fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WebhookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WebhookError {
    #[error("webhook `{0}` is not registered")]
    NotFound(WebhookId),
}

#[derive(Debug, Clone)]
struct Binding {
    graph: GraphWire,
    user_id: UserId,
    framework: String,
}

/// What `trigger` returns once the triggered execution reaches a terminal
/// status (spec §4.8: `{ok, result} | {ok:false, error}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TriggerOutcome {
    Ok { ok: bool, result: Value },
    Failed { ok: bool, error: Value },
}

impl TriggerOutcome {
    fn success(result: Value) -> Self {
        Self::Ok { ok: true, result }
    }

    fn failure(error: Value) -> Self {
        Self::Failed { ok: false, error }
    }
}

/// Concurrent readers, exclusive writer only on register/remove (spec §5).
#[derive(Default)]
pub struct WebhookRegistry {
    bindings: DashMap<WebhookId, Binding>,
}

impl WebhookRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mints a random id and stores the frozen graph (spec §4.8). Returns
    /// the id and the caller-facing URL path — this crate carries no HTTP
    /// server of its own, so the path is advisory for whatever router the
    /// embedder wires `trigger` behind.
    pub fn register(&self, graph: GraphWire, user_id: impl Into<String>, framework: impl Into<String>) -> (WebhookId, String) {
        let id = WebhookId::generate();
        let binding = Binding {
            graph,
            user_id: UserId::new(user_id.into()),
            framework: framework.into(),
        };
        self.bindings.insert(id.clone(), binding);
        let url = format!("/webhooks/{id}");
        (id, url)
    }

    pub fn remove(&self, webhook_id: &WebhookId) {
        self.bindings.remove(webhook_id);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Constructs an execution from `body` and drives it through the engine,
/// suspending until it reaches `completed`/`failed` (spec §4.8). Polls at
/// `engine.config().webhook_poll_interval` — while `status` is `running` or
/// `waiting_for_input` the call cooperatively yields rather than busy-waits.
pub async fn trigger(
    engine: Arc<Engine>,
    registry: &WebhookRegistry,
    webhook_id: &WebhookId,
    body: Value,
) -> Result<TriggerOutcome, WebhookError> {
    let binding = registry
        .bindings
        .get(webhook_id)
        .map(|entry| entry.value().clone())
        .ok_or_else(|| WebhookError::NotFound(webhook_id.clone()))?;

    let submission = Submission {
        graph: binding.graph,
        input: body,
        framework: binding.framework,
        user_id: Some(binding.user_id.as_str().to_string()),
        identity: None,
    };

    let poll_interval = engine.config().webhook_poll_interval;
    let execution_id = Arc::clone(&engine).submit(submission);

    let mut interval = tokio::time::interval(poll_interval);
    interval.tick().await; // first tick fires immediately; consume it before the real wait

    loop {
        interval.tick().await;
        let Some(record) = engine.record(&binding.user_id, &execution_id) else {
            continue;
        };
        match record.state.status {
            ExecutionStatus::Completed => {
                return Ok(TriggerOutcome::success(record.state.result.unwrap_or(Value::Null)));
            }
            ExecutionStatus::Failed => {
                let error = record
                    .state
                    .error
                    .and_then(|e| serde_json::to_value(e).ok())
                    .unwrap_or(Value::Null);
                return Ok(TriggerOutcome::failure(error));
            }
            ExecutionStatus::Running | ExecutionStatus::WaitingForInput => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use nebula_dispatch::{AgentInvocation, ResolvedCredential, ToolCallResponse, ToolTransportError};
    use nebula_engine::{AgentInvoker, CredentialBroker, EngineConfig, NoopGraphStore, ToolTransport};
    use nebula_execution::ExecutionError;
    use nebula_telemetry::NoopPricingTable;
    use nebula_workflow::{AgentSpec, EdgeWire, NodeWire, ToolSpec};
    use serde_json::Map;

    struct EchoInvoker;

    #[async_trait]
    impl AgentInvoker for EchoInvoker {
        async fn invoke(
            &self,
            _agent: &AgentSpec,
            _tools: &[ToolSpec],
            prompt: &str,
            _framework: &str,
        ) -> Result<AgentInvocation, ExecutionError> {
            Ok(AgentInvocation {
                final_output: format!("echo: {prompt}"),
                trace: serde_json::json!({}),
            })
        }
    }

    struct NoCredentials;

    #[async_trait]
    impl CredentialBroker for NoCredentials {
        async fn resolve(&self, _user_id: &UserId) -> Option<ResolvedCredential> {
            None
        }
    }

    struct NoTransport;

    #[async_trait]
    impl ToolTransport for NoTransport {
        async fn call(
            &self,
            _tool_type: &str,
            _api_key: &str,
            _inputs: &Map<String, Value>,
        ) -> Result<ToolCallResponse, ToolTransportError> {
            Err(ToolTransportError::Other { message: "not used".into() })
        }
    }

    fn graph_with_agent() -> GraphWire {
        GraphWire {
            nodes: vec![
                NodeWire { id: Some("in".into()), kind: Some("input".into()), data: None, position: None },
                NodeWire {
                    id: Some("a1".into()),
                    kind: Some("agent".into()),
                    data: Some(serde_json::json!({"name": "Writer", "instructions": "reply"})),
                    position: None,
                },
                NodeWire { id: Some("out".into()), kind: Some("output".into()), data: None, position: None },
            ],
            edges: vec![
                EdgeWire { id: Some("e1".into()), source: Some("in".into()), target: Some("a1".into()), source_handle: None, target_handle: None },
                EdgeWire { id: Some("e2".into()), source: Some("a1".into()), target: Some("out".into()), source_handle: None, target_handle: None },
            ],
        }
    }

    #[test]
    fn register_returns_distinct_ids_and_a_url() {
        let registry = WebhookRegistry::new();
        let (id1, url1) = registry.register(graph_with_agent(), "alice", "default");
        let (id2, _url2) = registry.register(graph_with_agent(), "alice", "default");
        assert_ne!(id1, id2);
        assert_eq!(url1, format!("/webhooks/{id1}"));
        assert_eq!(registry.len(), 2);
    }

    fn engine() -> Arc<Engine> {
        Engine::new(
            EngineConfig {
                webhook_poll_interval: Duration::from_millis(20),
                ..EngineConfig::default()
            },
            Arc::new(EchoInvoker),
            Arc::new(NoCredentials),
            Arc::new(NoTransport),
            Arc::new(NoopGraphStore),
            Arc::new(NoopPricingTable),
        )
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn trigger_on_unknown_id_errors() {
        let registry = WebhookRegistry::new();
        let unknown = WebhookId::generate();
        let err = trigger(engine(), &registry, &unknown, serde_json::json!("hi"))
            .await
            .unwrap_err();
        assert_eq!(err, WebhookError::NotFound(unknown));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn trigger_runs_the_bound_graph_and_returns_the_result() {
        let registry = WebhookRegistry::new();
        let (webhook_id, _url) = registry.register(graph_with_agent(), "alice", "default");

        let outcome = trigger(engine(), &registry, &webhook_id, serde_json::json!("hello"))
            .await
            .expect("trigger completes");

        match outcome {
            TriggerOutcome::Ok { ok, result } => {
                assert!(ok);
                assert_eq!(result, serde_json::json!("echo: hello"));
            }
            TriggerOutcome::Failed { .. } => panic!("expected success"),
        }
    }
}
