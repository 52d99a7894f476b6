//! The `Ok` side of the validator's public contract.

use nebula_workflow::GraphWire;

/// What a successful validation hands back: a few summary facts plus the
/// graph as it stood after check 4's `web_search` synthesis — callers build
/// the typed [`nebula_workflow::WorkflowDefinition`] from `graph`, not from
/// whatever they originally submitted.
#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    pub graph: GraphWire,
    pub node_count: usize,
    pub edge_count: usize,
    pub start_node_ids: Vec<String>,
    pub end_node_ids: Vec<String>,
}
