//! Structural validation of submitted workflow graphs — C2.
//!
//! Public contract: [`validate`] takes the wire-level graph exactly as
//! submitted and returns `Ok(`[`ValidationOutcome`]`)` or the first
//! [`ValidationError`] encountered, running the 8 checks of spec §4.1 in
//! order and stopping at the first failure. [`ValidatorCache`] wraps
//! `validate` with the 5 s / 50-entry result cache the same section calls
//! for; `nebula-engine` is expected to hold one `ValidatorCache` and go
//! through it rather than calling `validate` directly, so that repeated
//! submissions of an unchanged graph in quick succession don't re-walk it.

pub mod cache;
pub mod checks;
pub mod error;
pub mod outcome;

pub use cache::ValidatorCache;
pub use error::ValidationError;
pub use outcome::ValidationOutcome;

use nebula_workflow::GraphWire;

/// Runs the 8 ordered structural checks against `graph`, uncached.
pub fn validate(graph: &GraphWire) -> Result<ValidationOutcome, ValidationError> {
    checks::well_formedness(graph)?;
    checks::executable_presence(graph)?;
    checks::agent_fields(graph)?;

    let mut graph = graph.clone();
    checks::tool_fields(&mut graph)?;

    checks::edge_endpoints(&graph)?;
    checks::flow(&graph)?;
    checks::acyclic(&graph)?;
    checks::path_length(&graph)?;

    let has_incoming: std::collections::HashSet<&str> = graph
        .edges
        .iter()
        .filter_map(|e| e.target.as_deref())
        .collect();
    let has_outgoing: std::collections::HashSet<&str> = graph
        .edges
        .iter()
        .filter_map(|e| e.source.as_deref())
        .collect();

    let start_node_ids: Vec<String> = graph
        .nodes
        .iter()
        .filter_map(|n| n.id.as_deref())
        .filter(|id| !has_incoming.contains(id))
        .map(str::to_string)
        .collect();
    let end_node_ids: Vec<String> = graph
        .nodes
        .iter()
        .filter_map(|n| n.id.as_deref())
        .filter(|id| !has_outgoing.contains(id))
        .map(str::to_string)
        .collect();

    let node_count = graph.nodes.len();
    let edge_count = graph.edges.len();
    Ok(ValidationOutcome {
        graph,
        node_count,
        edge_count,
        start_node_ids,
        end_node_ids,
    })
}
