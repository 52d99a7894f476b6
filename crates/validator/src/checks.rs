//! The 8 ordered structural checks (spec §4.1). Each takes the wire graph
//! (plus whatever the previous checks have already established) and
//! returns the first [`ValidationError`] it finds; the caller stops at the
//! first failure rather than collecting every problem.

use std::collections::{HashMap, HashSet};

use nebula_workflow::node::is_valid_model_format;
use nebula_workflow::{GraphWire, NodeWire};

use crate::error::ValidationError;

/// Check 1: every node has `id`, `kind`, `data`.
pub fn well_formedness(graph: &GraphWire) -> Result<(), ValidationError> {
    for node in &graph.nodes {
        let id = node
            .id
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ValidationError::MissingField {
                node_id: "<unknown>".into(),
                field: "id",
            })?;
        if node.kind.is_none() {
            return Err(ValidationError::MissingField {
                node_id: id.into(),
                field: "kind",
            });
        }
        if node.data.is_none() {
            return Err(ValidationError::MissingField {
                node_id: id.into(),
                field: "data",
            });
        }
    }
    Ok(())
}

/// Check 2: at least one agent or tool node, using the unified
/// tool-vs-agent classification rule (`NodeWire::is_tool_shaped` /
/// `is_agent_shaped`) rather than trusting `kind` alone.
pub fn executable_presence(graph: &GraphWire) -> Result<(), ValidationError> {
    if graph.nodes.iter().any(NodeWire::is_executable) {
        Ok(())
    } else {
        Err(ValidationError::NoExecutableNode)
    }
}

/// Check 3: every agent-shaped node has a name, non-empty instructions, and
/// (if present) a `model_id` matching a known provider prefix.
pub fn agent_fields(graph: &GraphWire) -> Result<(), ValidationError> {
    for node in graph.nodes.iter().filter(|n| n.is_agent_shaped()) {
        let id = node.id.clone().unwrap_or_default();
        if node.name_or_label().is_none() {
            return Err(ValidationError::MissingField {
                node_id: id,
                field: "name",
            });
        }
        match node.data_str("instructions") {
            Some(s) if !s.is_empty() => {}
            _ => {
                return Err(ValidationError::EmptyInstructions { node_id: id });
            }
        }
        if let Some(model_id) = node.data_str("model_id") {
            if !is_valid_model_format(model_id) {
                return Err(ValidationError::InvalidModelId {
                    node_id: id,
                    model_id: model_id.to_string(),
                });
            }
        }
    }
    Ok(())
}

/// Check 4: every tool-shaped node has a name. Also performs the
/// `web_search` synthesis in place: a tool carrying `model_id` but no
/// `tool_type`, where `model_id` mentions "browse" or "search", gets
/// `tool_type = "web_search"` and loses the spurious `model_id`.
pub fn tool_fields(graph: &mut GraphWire) -> Result<(), ValidationError> {
    for node in graph.nodes.iter_mut().filter(|n| n.is_tool_shaped()) {
        let id = node.id.clone().unwrap_or_default();
        if node.name_or_label().is_none() {
            return Err(ValidationError::MissingField {
                node_id: id,
                field: "name",
            });
        }

        let synth = node.data.as_ref().is_some_and(|data| {
            let has_tool_type = data.get("tool_type").is_some();
            let model_id = data.get("model_id").and_then(serde_json::Value::as_str);
            !has_tool_type
                && model_id.is_some_and(|m| {
                    let lower = m.to_lowercase();
                    lower.contains("browse") || lower.contains("search")
                })
        });
        if synth {
            if let Some(data) = node.data.as_mut().and_then(serde_json::Value::as_object_mut) {
                data.remove("model_id");
                data.insert(
                    "tool_type".to_string(),
                    serde_json::Value::String("web_search".to_string()),
                );
            }
        }
    }
    Ok(())
}

/// Check 5: every edge's `source`/`target` names an existing node.
pub fn edge_endpoints(graph: &GraphWire) -> Result<(), ValidationError> {
    let ids: HashSet<&str> = graph
        .nodes
        .iter()
        .filter_map(|n| n.id.as_deref())
        .collect();
    for (i, edge) in graph.edges.iter().enumerate() {
        let edge_id = edge.id.clone().unwrap_or_else(|| format!("edge_{i}"));
        for endpoint in [&edge.source, &edge.target] {
            match endpoint.as_deref() {
                Some(id) if ids.contains(id) => {}
                other => {
                    return Err(ValidationError::DanglingEdge {
                        edge_id,
                        node_id: other.unwrap_or("").to_string(),
                    });
                }
            }
        }
    }
    Ok(())
}

/// Check 6: flow shape. Orphans (no incoming and no outgoing edges) are
/// forbidden unless the graph is a single node; there must be a non-empty
/// start set (no incoming edges) and end set (no outgoing edges); every
/// node must be reachable from some start node.
pub fn flow(graph: &GraphWire) -> Result<(), ValidationError> {
    if graph.nodes.len() == 1 {
        return Ok(());
    }

    let mut has_incoming: HashSet<&str> = HashSet::new();
    let mut has_outgoing: HashSet<&str> = HashSet::new();
    for edge in &graph.edges {
        if let Some(src) = edge.source.as_deref() {
            has_outgoing.insert(src);
        }
        if let Some(dst) = edge.target.as_deref() {
            has_incoming.insert(dst);
        }
    }

    for node in &graph.nodes {
        let id = node.id.as_deref().unwrap_or_default();
        if !has_incoming.contains(id) && !has_outgoing.contains(id) {
            return Err(ValidationError::Orphan {
                node_id: id.to_string(),
            });
        }
    }

    let start_ids: Vec<&str> = graph
        .nodes
        .iter()
        .filter_map(|n| n.id.as_deref())
        .filter(|id| !has_incoming.contains(id))
        .collect();
    if start_ids.is_empty() {
        return Err(ValidationError::NoStartNode);
    }
    let end_exists = graph
        .nodes
        .iter()
        .filter_map(|n| n.id.as_deref())
        .any(|id| !has_outgoing.contains(id));
    if !end_exists {
        return Err(ValidationError::NoEndNode);
    }

    let adjacency = forward_adjacency(graph);
    let mut reached: HashSet<&str> = HashSet::new();
    let mut stack: Vec<&str> = start_ids.clone();
    while let Some(id) = stack.pop() {
        if !reached.insert(id) {
            continue;
        }
        if let Some(targets) = adjacency.get(id) {
            stack.extend(targets.iter().copied());
        }
    }
    for node in &graph.nodes {
        let id = node.id.as_deref().unwrap_or_default();
        if !reached.contains(id) {
            return Err(ValidationError::Unreachable {
                node_id: id.to_string(),
            });
        }
    }
    Ok(())
}

/// Check 7: acyclic, via DFS with an explicit recursion-stack set.
pub fn acyclic(graph: &GraphWire) -> Result<(), ValidationError> {
    let adjacency = forward_adjacency(graph);
    let mut visited: HashSet<&str> = HashSet::new();
    let mut on_stack: HashSet<&str> = HashSet::new();
    let mut path: Vec<&str> = Vec::new();

    for node in &graph.nodes {
        let id = node.id.as_deref().unwrap_or_default();
        if !visited.contains(id) {
            dfs_cycle(id, &adjacency, &mut visited, &mut on_stack, &mut path)?;
        }
    }
    Ok(())
}

fn dfs_cycle<'a>(
    id: &'a str,
    adjacency: &HashMap<&'a str, Vec<&'a str>>,
    visited: &mut HashSet<&'a str>,
    on_stack: &mut HashSet<&'a str>,
    path: &mut Vec<&'a str>,
) -> Result<(), ValidationError> {
    visited.insert(id);
    on_stack.insert(id);
    path.push(id);

    if let Some(targets) = adjacency.get(id) {
        for &target in targets {
            if on_stack.contains(target) {
                let mut cycle_path: Vec<&str> = path
                    .iter()
                    .copied()
                    .skip_while(|&n| n != target)
                    .collect();
                cycle_path.push(target);
                return Err(ValidationError::Cycle {
                    path: cycle_path.join(" -> "),
                });
            }
            if !visited.contains(target) {
                dfs_cycle(target, adjacency, visited, on_stack, path)?;
            }
        }
    }

    path.pop();
    on_stack.remove(id);
    Ok(())
}

/// Check 8: the longest simple start-to-end path has at most 20 nodes.
/// The graph is already known acyclic (check 7 ran first), so the longest
/// path is computable with a single dynamic-programming pass over a
/// topological order instead of enumerating every simple path.
pub const MAX_PATH_LENGTH: usize = 20;

pub fn path_length(graph: &GraphWire) -> Result<(), ValidationError> {
    let adjacency = forward_adjacency(graph);
    let order = topological_order(graph, &adjacency);

    let mut has_incoming: HashSet<&str> = HashSet::new();
    for edge in &graph.edges {
        if let Some(dst) = edge.target.as_deref() {
            has_incoming.insert(dst);
        }
    }

    let mut longest: HashMap<&str, usize> = HashMap::new();
    let mut max_len = 0;
    for &id in &order {
        let len = if has_incoming.contains(id) {
            longest.get(id).copied().unwrap_or(1)
        } else {
            1
        };
        max_len = max_len.max(len);
        if let Some(targets) = adjacency.get(id) {
            for &target in targets {
                let candidate = len + 1;
                let current = longest.entry(target).or_insert(0);
                if candidate > *current {
                    *current = candidate;
                }
            }
        }
    }

    if max_len > MAX_PATH_LENGTH {
        return Err(ValidationError::PathTooLong {
            length: max_len,
            bound: MAX_PATH_LENGTH,
        });
    }
    Ok(())
}

fn forward_adjacency(graph: &GraphWire) -> HashMap<&str, Vec<&str>> {
    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
    for edge in &graph.edges {
        if let (Some(src), Some(dst)) = (edge.source.as_deref(), edge.target.as_deref()) {
            adjacency.entry(src).or_default().push(dst);
        }
    }
    adjacency
}

fn topological_order<'a>(
    graph: &'a GraphWire,
    adjacency: &HashMap<&'a str, Vec<&'a str>>,
) -> Vec<&'a str> {
    let mut in_degree: HashMap<&str, usize> = graph
        .nodes
        .iter()
        .filter_map(|n| n.id.as_deref())
        .map(|id| (id, 0))
        .collect();
    for targets in adjacency.values() {
        for &target in targets {
            *in_degree.entry(target).or_insert(0) += 1;
        }
    }

    let mut queue: Vec<&str> = in_degree
        .iter()
        .filter(|(_, &deg)| deg == 0)
        .map(|(&id, _)| id)
        .collect();
    queue.sort_unstable();

    let mut order = Vec::with_capacity(in_degree.len());
    let mut cursor = 0;
    while cursor < queue.len() {
        let id = queue[cursor];
        cursor += 1;
        order.push(id);
        if let Some(targets) = adjacency.get(id) {
            let mut newly_ready = Vec::new();
            for &target in targets {
                if let Some(deg) = in_degree.get_mut(target) {
                    *deg -= 1;
                    if *deg == 0 {
                        newly_ready.push(target);
                    }
                }
            }
            newly_ready.sort_unstable();
            queue.extend(newly_ready);
        }
    }
    order
}
