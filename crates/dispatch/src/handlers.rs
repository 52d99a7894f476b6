//! Per-kind node handlers (spec §4.3). Each takes the inputs the engine
//! collected for this step plus whatever collaborators the kind needs, and
//! returns the `{result, default}`-shaped output map C6 stores on the
//! execution context keyed by node id.

use nebula_core::{NodeId, UserId};
use nebula_workflow::{AgentSpec, ConditionalSpec, IoFormat, ToolSpec};
use serde_json::{Map, Value};

use crate::collaborators::{AgentInvoker, CredentialBroker, ToolTransport};
use crate::conditional;
use crate::retry::call_with_retry;
use crate::tool_name;

const BUILTIN_TOOLS: &[&str] = &["search_web", "visit_webpage"];

/// `input`: echoes the execution's initial input under `result` and `default`.
#[must_use]
pub fn dispatch_input(initial_input: &Value) -> Map<String, Value> {
    let mut out = Map::new();
    out.insert("result".to_string(), initial_input.clone());
    out.insert("default".to_string(), initial_input.clone());
    out
}

/// `output`: passes the gathered input through, wrapping it under `result`
/// when the node's declared format is `json`.
#[must_use]
pub fn dispatch_output(format: IoFormat, gathered_input: &Value) -> Map<String, Value> {
    let mut out = Map::new();
    let value = match format {
        IoFormat::Json => serde_json::json!({ "result": gathered_input }),
        IoFormat::Text => gathered_input.clone(),
    };
    out.insert("result".to_string(), value);
    out
}

/// `agent`: delegates to the agent invoker with the bound tool set and the
/// gathered prompt, surfacing its final output under `result`/`default`.
pub async fn dispatch_agent(
    invoker: &dyn AgentInvoker,
    agent: &AgentSpec,
    tools: &[ToolSpec],
    prompt: &str,
    framework: &str,
) -> Result<(Map<String, Value>, Value), nebula_execution::ExecutionError> {
    let invocation = invoker.invoke(agent, tools, prompt, framework).await?;
    let mut out = Map::new();
    out.insert("result".to_string(), Value::String(invocation.final_output.clone()));
    out.insert("default".to_string(), Value::String(invocation.final_output));
    Ok((out, invocation.trace))
}

/// `tool`: routes built-ins directly through the transport with no
/// credential lookup, and everything else through the credential broker
/// plus the full retry schedule.
pub async fn dispatch_tool(
    node: &NodeId,
    user_id: &UserId,
    tool: &ToolSpec,
    credentials: &dyn CredentialBroker,
    transport: &dyn ToolTransport,
) -> Result<Map<String, Value>, nebula_execution::ExecutionError> {
    let raw_type = tool.tool_type.as_deref().unwrap_or(&tool.name);
    let tool_type = tool_name::canonicalize(raw_type);

    let api_key = if BUILTIN_TOOLS.contains(&tool_type.as_str()) {
        String::new()
    } else {
        let credential = credentials.resolve(user_id).await.ok_or_else(|| {
            nebula_execution::ExecutionError::ToolNotEnabled {
                node: node.clone(),
                tool_type: tool_type.clone(),
            }
        })?;
        if let Some(enabled) = &credential.enabled_tool_ids {
            if !enabled.iter().any(|id| id == &tool_type) {
                return Err(nebula_execution::ExecutionError::ToolNotEnabled {
                    node: node.clone(),
                    tool_type: tool_type.clone(),
                });
            }
        }
        credential.api_key
    };

    let response = call_with_retry(node, transport, &tool_type, &api_key, &tool.inputs).await?;

    let mut out = Map::new();
    out.insert("result".to_string(), response.body.clone());
    out.insert("default".to_string(), response.body);
    Ok(out)
}

/// `conditional`: no data transformation, just the selected branch id (or
/// `None` if nothing matched and there's no default).
#[must_use]
pub fn dispatch_conditional(spec: &ConditionalSpec, input: &Value) -> Option<String> {
    conditional::select_branch(spec, input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{AgentInvocation, ResolvedCredential, ToolCallResponse, ToolTransportError};
    use async_trait::async_trait;

    struct EchoInvoker;

    #[async_trait]
    impl AgentInvoker for EchoInvoker {
        async fn invoke(
            &self,
            _agent: &AgentSpec,
            _tools: &[ToolSpec],
            prompt: &str,
            _framework: &str,
        ) -> Result<AgentInvocation, nebula_execution::ExecutionError> {
            Ok(AgentInvocation {
                final_output: format!("echo: {prompt}"),
                trace: serde_json::json!({}),
            })
        }
    }

    struct AllowAllBroker;

    #[async_trait]
    impl CredentialBroker for AllowAllBroker {
        async fn resolve(&self, _user_id: &UserId) -> Option<ResolvedCredential> {
            Some(ResolvedCredential {
                api_key: "secret".into(),
                enabled_tool_ids: None,
            })
        }
    }

    struct NoCredentialsBroker;

    #[async_trait]
    impl CredentialBroker for NoCredentialsBroker {
        async fn resolve(&self, _user_id: &UserId) -> Option<ResolvedCredential> {
            None
        }
    }

    struct OkTransport;

    #[async_trait]
    impl ToolTransport for OkTransport {
        async fn call(
            &self,
            _tool_type: &str,
            _api_key: &str,
            _inputs: &Map<String, Value>,
        ) -> Result<ToolCallResponse, ToolTransportError> {
            Ok(ToolCallResponse {
                body: serde_json::json!({"ok": true}),
            })
        }
    }

    #[tokio::test]
    async fn agent_dispatch_returns_invoker_output_under_both_keys() {
        let (out, _trace) = dispatch_agent(
            &EchoInvoker,
            &AgentSpec {
                name: "Writer".into(),
                instructions: "reply".into(),
                model_id: Some("gpt-4o-mini".into()),
                description: None,
            },
            &[],
            "hello",
            "default",
        )
        .await
        .unwrap();
        assert_eq!(out.get("result"), Some(&serde_json::json!("echo: hello")));
        assert_eq!(out.get("default"), Some(&serde_json::json!("echo: hello")));
    }

    #[tokio::test]
    async fn builtin_tool_skips_credential_broker() {
        let node = NodeId::new("t1");
        let tool = ToolSpec {
            name: "Search".into(),
            tool_type: Some("web_search".into()),
            inputs: Map::new(),
        };
        let out = dispatch_tool(&node, &UserId::anonymous(), &tool, &NoCredentialsBroker, &OkTransport)
            .await
            .unwrap();
        assert_eq!(out.get("result"), Some(&serde_json::json!({"ok": true})));
    }

    #[tokio::test]
    async fn composio_tool_without_credential_is_not_enabled() {
        let node = NodeId::new("t1");
        let tool = ToolSpec {
            name: "Github".into(),
            tool_type: Some("composio-github".into()),
            inputs: Map::new(),
        };
        let err = dispatch_tool(&node, &UserId::anonymous(), &tool, &NoCredentialsBroker, &OkTransport)
            .await
            .unwrap_err();
        assert!(matches!(err, nebula_execution::ExecutionError::ToolNotEnabled { .. }));
    }

    #[tokio::test]
    async fn composio_tool_with_credential_succeeds() {
        let node = NodeId::new("t1");
        let tool = ToolSpec {
            name: "Github".into(),
            tool_type: Some("composio-github".into()),
            inputs: Map::new(),
        };
        let out = dispatch_tool(&node, &UserId::anonymous(), &tool, &AllowAllBroker, &OkTransport)
            .await
            .unwrap();
        assert_eq!(out.get("result"), Some(&serde_json::json!({"ok": true})));
    }

    #[test]
    fn input_echoes_under_both_keys() {
        let initial = serde_json::json!({"a": 1});
        let out = dispatch_input(&initial);
        assert_eq!(out.get("result"), Some(&initial));
        assert_eq!(out.get("default"), Some(&initial));
    }

    #[test]
    fn output_text_passes_through() {
        let input = serde_json::json!("hello");
        let out = dispatch_output(IoFormat::Text, &input);
        assert_eq!(out.get("result"), Some(&serde_json::json!("hello")));
    }

    #[test]
    fn output_json_wraps_under_result() {
        let input = serde_json::json!({"x": 1});
        let out = dispatch_output(IoFormat::Json, &input);
        assert_eq!(out.get("result"), Some(&serde_json::json!({"result": {"x": 1}})));
    }
}
