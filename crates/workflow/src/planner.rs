//! C4 — topological planner.
//!
//! Produces the node visitation order C6 drives one step at a time:
//! input nodes lead, ties break by ingestion order, and a single-node
//! graph's plan is that node alone. Grounded on the teacher's
//! `DependencyGraph::from_definition`/`compute_levels`/`entry_nodes` shape
//! in `crates/execution/src/plan.rs`, reimplemented over `petgraph` against
//! the spec's own start-node definition rather than the teacher's.

use std::collections::HashMap;

use nebula_core::NodeId;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::graph::WorkflowDefinition;
use crate::node::NodeKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPlan {
    /// Node execution order, input-nodes-first, ties broken by ingestion
    /// order within the original node list.
    pub order: Vec<NodeId>,
    /// `{v : in-degree(v) = 0} ∪ {v : kind = input}` per spec §4.2.
    pub start_nodes: Vec<NodeId>,
}

impl ExecutionPlan {
    /// Builds the plan for an already-validated graph. Validation (C2)
    /// guarantees the graph is acyclic and every node is reachable from a
    /// start node, so the topological sort here cannot fail.
    pub fn build(graph: &WorkflowDefinition) -> Self {
        if graph.nodes.len() == 1 {
            let only = graph.nodes[0].id.clone();
            return Self {
                order: vec![only.clone()],
                start_nodes: vec![only],
            };
        }

        let mut dag = DiGraph::<NodeId, ()>::new();
        let mut index_of: HashMap<NodeId, NodeIndex> = HashMap::with_capacity(graph.nodes.len());
        // Ingestion order preserved: petgraph assigns indices in insertion
        // order, and node_indices() iterates in that same order.
        for node in &graph.nodes {
            let idx = dag.add_node(node.id.clone());
            index_of.insert(node.id.clone(), idx);
        }
        for edge in &graph.edges {
            if let (Some(&src), Some(&dst)) = (index_of.get(&edge.source), index_of.get(&edge.target)) {
                dag.add_edge(src, dst, ());
            }
        }

        let ingestion_rank: HashMap<NodeId, usize> = graph
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.clone(), i))
            .collect();
        let is_input = |id: &NodeId| -> bool {
            graph
                .node(id)
                .is_some_and(|n| matches!(n.kind, NodeKind::Input(_)))
        };

        let start_nodes: Vec<NodeId> = {
            let mut starts: Vec<NodeId> = graph
                .nodes
                .iter()
                .filter(|n| {
                    let idx = index_of[&n.id];
                    dag.edges_directed(idx, Direction::Incoming).next().is_none()
                        || matches!(n.kind, NodeKind::Input(_))
                })
                .map(|n| n.id.clone())
                .collect();
            starts.sort_by_key(|id| ingestion_rank[id]);
            starts
        };

        // Kahn's algorithm with a priority rule: among nodes currently
        // ready, prefer input nodes, then lowest ingestion rank.
        let mut indeg: HashMap<NodeIndex, usize> = dag
            .node_indices()
            .map(|idx| (idx, dag.edges_directed(idx, Direction::Incoming).count()))
            .collect();
        let mut ready: Vec<NodeIndex> = dag
            .node_indices()
            .filter(|idx| indeg[idx] == 0)
            .collect();
        let mut order = Vec::with_capacity(graph.nodes.len());

        while !ready.is_empty() {
            ready.sort_by_key(|&idx| {
                let id = &dag[idx];
                let leads = !is_input(id);
                (leads, ingestion_rank[id])
            });
            let next = ready.remove(0);
            order.push(dag[next].clone());
            for edge in dag.edges_directed(next, Direction::Outgoing) {
                let target = edge.target();
                let remaining = indeg.get_mut(&target).expect("target has recorded in-degree");
                *remaining -= 1;
                if *remaining == 0 {
                    ready.push(target);
                }
            }
        }

        Self { order, start_nodes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::Edge;
    use crate::graph::Node;
    use crate::node::{AgentSpec, IoFormat, IoSpec};

    fn n(id: &str, kind: NodeKind) -> Node {
        Node {
            id: NodeId::new(id),
            kind,
        }
    }

    fn io(fmt: IoFormat) -> NodeKind {
        NodeKind::Input(IoSpec { format: fmt })
    }

    fn agent(name: &str) -> NodeKind {
        NodeKind::Agent(AgentSpec {
            name: name.into(),
            instructions: "x".into(),
            model_id: None,
            description: None,
        })
    }

    fn e(src: &str, dst: &str) -> Edge {
        Edge {
            id: format!("{src}-{dst}"),
            source: NodeId::new(src),
            target: NodeId::new(dst),
            source_handle: None,
            target_handle: None,
        }
    }

    #[test]
    fn single_node_graph_is_trivial_plan() {
        let graph = WorkflowDefinition {
            nodes: vec![n("only", io(IoFormat::Text))],
            edges: vec![],
        };
        let plan = ExecutionPlan::build(&graph);
        assert_eq!(plan.order, vec![NodeId::new("only")]);
        assert_eq!(plan.start_nodes, vec![NodeId::new("only")]);
    }

    #[test]
    fn input_nodes_lead_and_ties_break_by_ingestion_order() {
        let graph = WorkflowDefinition {
            nodes: vec![
                n("a1", agent("First")),
                n("in", io(IoFormat::Text)),
                n("a2", agent("Second")),
            ],
            edges: vec![e("in", "a1"), e("in", "a2")],
        };
        let plan = ExecutionPlan::build(&graph);
        assert_eq!(plan.order[0], NodeId::new("in"));
        assert_eq!(plan.order[1], NodeId::new("a1"));
        assert_eq!(plan.order[2], NodeId::new("a2"));
    }

    #[test]
    fn start_nodes_include_zero_indegree_and_input_kind() {
        let graph = WorkflowDefinition {
            nodes: vec![n("in", io(IoFormat::Text)), n("a1", agent("Solo"))],
            edges: vec![e("in", "a1")],
        };
        let plan = ExecutionPlan::build(&graph);
        assert_eq!(plan.start_nodes, vec![NodeId::new("in")]);
    }

    #[test]
    fn linear_chain_preserves_dependency_order() {
        let graph = WorkflowDefinition {
            nodes: vec![
                n("in", io(IoFormat::Text)),
                n("a1", agent("A")),
                n("a2", agent("B")),
            ],
            edges: vec![e("in", "a1"), e("a1", "a2")],
        };
        let plan = ExecutionPlan::build(&graph);
        assert_eq!(
            plan.order,
            vec![NodeId::new("in"), NodeId::new("a1"), NodeId::new("a2")]
        );
    }
}
