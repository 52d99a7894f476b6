//! Gathers the input for a step from its predecessors' outputs (spec §4.4
//! step 5): the `result` (falling back to `default`, falling back to the
//! raw value) of every node reached via a non-tool-binding edge into this
//! one, concatenated with numbered prefixes when more than one contributes.

use nebula_core::NodeId;
use nebula_execution::ExecutionContext;
use nebula_workflow::WorkflowDefinition;
use serde_json::Value;

/// Collects this node's prompt/input value from its non-`binds_tool()`
/// predecessors. Zero contributors yields `Value::Null`; one yields that
/// source's value unwrapped; more than one yields a numbered concatenation.
#[must_use]
pub fn gather_inputs(definition: &WorkflowDefinition, ctx: &ExecutionContext, node_id: &NodeId) -> Value {
    let parts: Vec<Value> = definition
        .incoming(node_id)
        .filter(|edge| !edge.binds_tool())
        .filter_map(|edge| ctx.get_node_output(&edge.source))
        .map(|output| source_value(&output.value))
        .collect();

    match parts.len() {
        0 => Value::Null,
        1 => parts.into_iter().next().expect("len checked"),
        _ => {
            let text = parts
                .iter()
                .enumerate()
                .map(|(i, v)| format!("{}. {}", i + 1, value_to_prompt(v)))
                .collect::<Vec<_>>()
                .join("\n");
            Value::String(text)
        }
    }
}

fn source_value(output: &Value) -> Value {
    output
        .get("result")
        .or_else(|| output.get("default"))
        .cloned()
        .unwrap_or_else(|| output.clone())
}

/// Renders a gathered value as prompt text: strings pass through verbatim,
/// `null` becomes empty, anything else falls back to its JSON form.
#[must_use]
pub fn value_to_prompt(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nebula_core::{ExecutionId, UserId};
    use nebula_workflow::{AgentSpec, Edge, IoFormat, IoSpec, Node, NodeKind};
    use std::sync::Arc;

    fn ctx() -> ExecutionContext {
        ExecutionContext::new(ExecutionId::allocate(UserId::new("alice"), 1), Arc::new(graph()))
    }

    fn graph() -> WorkflowDefinition {
        WorkflowDefinition {
            nodes: vec![
                Node {
                    id: NodeId::new("in"),
                    kind: NodeKind::Input(IoSpec { format: IoFormat::Text }),
                },
                Node {
                    id: NodeId::new("t"),
                    kind: NodeKind::Agent(AgentSpec {
                        name: "Helper".into(),
                        instructions: "go".into(),
                        model_id: None,
                        description: None,
                    }),
                },
                Node {
                    id: NodeId::new("a"),
                    kind: NodeKind::Agent(AgentSpec {
                        name: "Writer".into(),
                        instructions: "go".into(),
                        model_id: None,
                        description: None,
                    }),
                },
            ],
            edges: vec![
                Edge {
                    id: "e1".into(),
                    source: NodeId::new("in"),
                    target: NodeId::new("a"),
                    source_handle: None,
                    target_handle: None,
                },
                Edge {
                    id: "e2".into(),
                    source: NodeId::new("t"),
                    target: NodeId::new("a"),
                    source_handle: None,
                    target_handle: Some("tool".into()),
                },
            ],
        }
    }

    #[test]
    fn single_source_passes_through_unwrapped() {
        let ctx = ctx();
        ctx.set_node_output(
            NodeId::new("in"),
            nebula_execution::NodeOutput::new(
                serde_json::json!({"result": "hello", "default": "hello"}),
                nebula_workflow::NodeState::Completed,
            ),
        );
        let value = gather_inputs(&graph(), &ctx, &NodeId::new("a"));
        assert_eq!(value, serde_json::json!("hello"));
    }

    #[test]
    fn tool_binding_edges_are_ignored() {
        let ctx = ctx();
        ctx.set_node_output(
            NodeId::new("t"),
            nebula_execution::NodeOutput::new(serde_json::json!(null), nebula_workflow::NodeState::Completed),
        );
        let value = gather_inputs(&graph(), &ctx, &NodeId::new("a"));
        assert_eq!(value, Value::Null);
    }

    #[test]
    fn zero_sources_is_null() {
        let ctx = ctx();
        let value = gather_inputs(&graph(), &ctx, &NodeId::new("in"));
        assert_eq!(value, Value::Null);
    }

    #[test]
    fn value_to_prompt_unwraps_strings() {
        assert_eq!(value_to_prompt(&serde_json::json!("hi")), "hi");
        assert_eq!(value_to_prompt(&Value::Null), "");
        assert_eq!(value_to_prompt(&serde_json::json!({"a": 1})), "{\"a\":1}");
    }
}
