//! Workflow definition, structure hashing, identity generation, and
//! topological planning — C1, C3, C4.
//!
//! A submission arrives as a [`wire::GraphWire`] and becomes a typed
//! [`graph::WorkflowDefinition`] only once `nebula-validator` has accepted
//! it; this crate owns the typed shape and everything derived from it, not
//! the acceptance decision itself.

pub mod edge;
pub mod error;
pub mod graph;
pub mod identity;
pub mod node;
pub mod planner;
pub mod state;
pub mod wire;

pub use edge::Edge;
pub use error::WorkflowError;
pub use graph::{Node, WorkflowDefinition};
pub use identity::{generate_identity, Identity, IdentityCache};
pub use node::{
    AgentSpec, Condition, ConditionOperator, ConditionRule, ConditionalSpec, IoFormat, IoSpec,
    NodeKind, ToolSpec,
};
pub use planner::ExecutionPlan;
pub use state::NodeState;
pub use wire::{EdgeWire, GraphWire, NodeWire};

/// Builds a typed [`WorkflowDefinition`] from an already-validated
/// [`GraphWire`]. Callers must have run the wire graph through
/// `nebula-validator` first; this performs no structural re-validation.
pub fn build_definition(wire: &GraphWire) -> Result<WorkflowDefinition, WorkflowError> {
    use nebula_core::NodeId;

    let mut nodes = Vec::with_capacity(wire.nodes.len());
    let mut seen = std::collections::HashSet::with_capacity(wire.nodes.len());
    for node_wire in &wire.nodes {
        let raw_id = node_wire
            .id
            .clone()
            .ok_or_else(|| WorkflowError::MissingField(NodeId::new(""), "id"))?;
        let id = NodeId::new(raw_id);
        if !seen.insert(id.clone()) {
            return Err(WorkflowError::DuplicateNodeId(id));
        }
        let kind = NodeKind::from_wire(&id, node_wire)?;
        nodes.push(Node { id, kind });
    }

    let mut edges = Vec::with_capacity(wire.edges.len());
    for (i, edge_wire) in wire.edges.iter().enumerate() {
        let id = edge_wire
            .id
            .clone()
            .unwrap_or_else(|| format!("edge_{i}"));
        let source = NodeId::new(edge_wire.source.clone().unwrap_or_default());
        let target = NodeId::new(edge_wire.target.clone().unwrap_or_default());
        edges.push(Edge {
            id,
            source,
            target,
            source_handle: edge_wire.source_handle.clone(),
            target_handle: edge_wire.target_handle.clone(),
        });
    }

    Ok(WorkflowDefinition { nodes, edges })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_definition_rejects_duplicate_node_ids() {
        let wire = GraphWire {
            nodes: vec![
                NodeWire {
                    id: Some("a".into()),
                    kind: Some("input".into()),
                    data: None,
                    position: None,
                },
                NodeWire {
                    id: Some("a".into()),
                    kind: Some("output".into()),
                    data: None,
                    position: None,
                },
            ],
            edges: vec![],
        };
        let err = build_definition(&wire).unwrap_err();
        assert!(matches!(err, WorkflowError::DuplicateNodeId(_)));
    }

    #[test]
    fn build_definition_produces_usable_graph() {
        let wire = GraphWire {
            nodes: vec![
                NodeWire {
                    id: Some("in".into()),
                    kind: Some("input".into()),
                    data: None,
                    position: None,
                },
                NodeWire {
                    id: Some("a1".into()),
                    kind: Some("agent".into()),
                    data: Some(serde_json::json!({"name": "Writer", "instructions": "go"})),
                    position: None,
                },
            ],
            edges: vec![EdgeWire {
                id: Some("e1".into()),
                source: Some("in".into()),
                target: Some("a1".into()),
                source_handle: None,
                target_handle: None,
            }],
        };
        let graph = build_definition(&wire).unwrap();
        assert_eq!(graph.nodes.len(), 2);
        let plan = ExecutionPlan::build(&graph);
        assert_eq!(plan.order.len(), 2);
        let identity = generate_identity(&graph);
        assert_eq!(identity.name, "Single Agent Workflow");
    }
}
