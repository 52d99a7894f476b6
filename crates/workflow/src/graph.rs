//! The typed, validated graph (C1) and its stable structure hash.

use nebula_core::NodeId;
use sha2::{Digest, Sha256};

use crate::edge::Edge;
use crate::node::NodeKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
}

/// A graph that has passed every `nebula-validator` check: no dangling
/// edges, no cycles, at least one start node, every node reachable, every
/// path within the length bound. Constructed only by `nebula-validator`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowDefinition {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl WorkflowDefinition {
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    pub fn outgoing(&self, id: &NodeId) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(move |e| &e.source == id)
    }

    pub fn incoming(&self, id: &NodeId) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(move |e| &e.target == id)
    }

    /// A digest over the multiset of node kinds and the multiset of edges
    /// expressed as `(source_kind_index, target_kind_index)` pairs — never
    /// raw node ids, so two structurally identical graphs built with
    /// different caller-supplied node ids hash identically. Independent of
    /// input ordering and of `position`, which this type never even
    /// carries. See spec §3 Identity invariant and testable property 5.
    pub fn structure_hash(&self) -> String {
        let mut kinds: Vec<&'static str> = self.nodes.iter().map(|n| n.kind.label()).collect();
        kinds.sort_unstable();

        let kind_of = |id: &NodeId| -> u8 { self.node(id).map_or(255, |n| kind_rank(&n.kind)) };
        let mut edge_pairs: Vec<(u8, u8)> = self
            .edges
            .iter()
            .map(|e| (kind_of(&e.source), kind_of(&e.target)))
            .collect();
        edge_pairs.sort_unstable();

        let mut hasher = Sha256::new();
        for kind in &kinds {
            hasher.update(kind.as_bytes());
            hasher.update(b"\0");
        }
        hasher.update(b"|");
        for (src, dst) in &edge_pairs {
            hasher.update([*src, *dst]);
        }
        let digest = hasher.finalize();
        hex_prefix(&digest, 16)
    }
}

/// Canonical, alphabetical index of a node kind — stable across runs and
/// independent of any generated or caller-supplied node id.
fn kind_rank(kind: &NodeKind) -> u8 {
    match kind {
        NodeKind::Agent(_) => 0,
        NodeKind::Conditional(_) => 1,
        NodeKind::Input(_) => 2,
        NodeKind::Output(_) => 3,
        NodeKind::Tool(_) => 4,
    }
}

fn hex_prefix(bytes: &[u8], len: usize) -> String {
    let mut s = String::with_capacity(len);
    for b in bytes {
        use std::fmt::Write;
        write!(s, "{b:02x}").ok();
        if s.len() >= len {
            break;
        }
    }
    s.truncate(len);
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{AgentSpec, IoFormat, IoSpec, ToolSpec};

    fn agent(id: &str) -> Node {
        Node {
            id: NodeId::new(id),
            kind: NodeKind::Agent(AgentSpec {
                name: id.to_string(),
                instructions: "do it".into(),
                model_id: None,
                description: None,
            }),
        }
    }

    fn tool(id: &str) -> Node {
        Node {
            id: NodeId::new(id),
            kind: NodeKind::Tool(ToolSpec {
                name: id.to_string(),
                tool_type: None,
                inputs: Default::default(),
            }),
        }
    }

    fn input(id: &str) -> Node {
        Node {
            id: NodeId::new(id),
            kind: NodeKind::Input(IoSpec {
                format: IoFormat::Text,
            }),
        }
    }

    fn edge(id: &str, src: &str, dst: &str) -> Edge {
        Edge {
            id: id.into(),
            source: NodeId::new(src),
            target: NodeId::new(dst),
            source_handle: None,
            target_handle: None,
        }
    }

    #[test]
    fn structure_hash_is_16_hex_chars() {
        let graph = WorkflowDefinition {
            nodes: vec![input("i"), agent("a")],
            edges: vec![edge("e1", "i", "a")],
        };
        let hash = graph.structure_hash();
        assert_eq!(hash.len(), 16);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn structure_hash_invariant_under_node_and_edge_reordering() {
        let g1 = WorkflowDefinition {
            nodes: vec![input("i"), agent("a"), tool("t")],
            edges: vec![edge("e1", "i", "a"), edge("e2", "a", "t")],
        };
        let g2 = WorkflowDefinition {
            nodes: vec![tool("t"), agent("a"), input("i")],
            edges: vec![edge("e2", "a", "t"), edge("e1", "i", "a")],
        };
        assert_eq!(g1.structure_hash(), g2.structure_hash());
    }

    #[test]
    fn structure_hash_differs_for_different_wiring() {
        let g1 = WorkflowDefinition {
            nodes: vec![input("i"), agent("a"), tool("t")],
            edges: vec![edge("e1", "i", "a"), edge("e2", "a", "t")],
        };
        let g2 = WorkflowDefinition {
            nodes: vec![input("i"), agent("a"), tool("t")],
            edges: vec![edge("e1", "i", "t"), edge("e2", "t", "a")],
        };
        assert_ne!(g1.structure_hash(), g2.structure_hash());
    }
}
