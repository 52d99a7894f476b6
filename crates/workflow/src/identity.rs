//! C3 — deterministic workflow name/category/description from structure.
//!
//! Grounded on `_generate_workflow_identity`/`_generate_simple_workflow_identity`
//! in `original_source/backend/services/workflow_executor.py`: both functions
//! implement the same structural-naming rules, the "simple" variant only
//! existing there to dodge a recursive-call guard. Since this generator is a
//! pure function of the graph, one rule set covers both call sites; the
//! duplicate-suppression the original got from its "simple" fallback is
//! provided here by [`IdentityCache`] instead.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::graph::WorkflowDefinition;
use crate::node::NodeKind;

const DEDUP_WINDOW: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub category: String,
    pub description: String,
    pub confidence: f64,
    pub structure_hash: String,
}

/// Names recognized as internal system scaffolding rather than
/// user-authored agents (spec.md §9 Open Question territory — carried over
/// from the original's `system_workflow_detected` check).
const SYSTEM_AGENT_NAMES: &[&str] = &["contextextractor", "contextgenerator"];

/// Builds an [`Identity`] purely from graph shape. Deterministic: same
/// `structure_hash` in, same `Identity` out.
pub fn generate_identity(graph: &WorkflowDefinition) -> Identity {
    let structure_hash = graph.structure_hash();

    let agent_count = graph
        .nodes
        .iter()
        .filter(|n| matches!(n.kind, NodeKind::Agent(_)))
        .count();
    let tool_count = graph
        .nodes
        .iter()
        .filter(|n| matches!(n.kind, NodeKind::Tool(_)))
        .count();
    let conditional_count = graph
        .nodes
        .iter()
        .filter(|n| matches!(n.kind, NodeKind::Conditional(_)))
        .count();

    let is_system_workflow = graph.nodes.iter().any(|n| match &n.kind {
        NodeKind::Agent(spec) => SYSTEM_AGENT_NAMES.contains(&spec.name.to_lowercase().as_str()),
        _ => false,
    });

    if is_system_workflow {
        return Identity {
            name: "System Workflow".to_string(),
            description: "Internal system processing".to_string(),
            category: "system".to_string(),
            confidence: 0.9,
            structure_hash,
        };
    }

    let (name, description) = match (agent_count, tool_count) {
        (n, _) if n > 1 => (
            format!("{n}-Agent Workflow"),
            format!("A workflow with {n} AI agents"),
        ),
        (1, t) if t > 0 => (
            "Agent-Tool Workflow".to_string(),
            format!("A workflow with {t} tool{}", if t > 1 { "s" } else { "" }),
        ),
        (1, _) => (
            "Single Agent Workflow".to_string(),
            "A workflow with one AI agent".to_string(),
        ),
        _ => (
            "Custom Workflow".to_string(),
            "A custom workflow".to_string(),
        ),
    };

    let category = if conditional_count > 0 {
        "routing"
    } else if tool_count > agent_count {
        "automation"
    } else if agent_count >= 2 {
        "multi-agent"
    } else if agent_count == 1 {
        "conversational"
    } else {
        "general"
    };

    // Deterministic confidence: starts at a baseline and climbs with how
    // unambiguous the shape is — every executable node being exactly one
    // kind (all-agent or all-tool) is the clearest signal; mixing kinds
    // without reaching a majority is the least.
    let executable = agent_count + tool_count;
    let confidence: f64 = if executable == 0 {
        0.5
    } else {
        let dominant = agent_count.max(tool_count) as f64;
        let purity = dominant / executable as f64; // in (0.5, 1.0]
        (0.5 + purity * 0.4).min(0.95)
    };

    Identity {
        name,
        category: category.to_string(),
        description,
        confidence,
        structure_hash,
    }
}

/// Suppresses duplicate identity generation for identical graph structures
/// submitted in rapid succession (spec.md §4.4 step 3).
#[derive(Default)]
pub struct IdentityCache {
    entries: Mutex<HashMap<String, (Instant, Identity)>>,
}

impl IdentityCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_generate(&self, graph: &WorkflowDefinition) -> Identity {
        let hash = graph.structure_hash();
        let now = Instant::now();
        {
            let entries = self.entries.lock();
            if let Some((seen_at, identity)) = entries.get(&hash) {
                if now.duration_since(*seen_at) < DEDUP_WINDOW {
                    return identity.clone();
                }
            }
        }
        let identity = generate_identity(graph);
        self.entries
            .lock()
            .insert(hash, (now, identity.clone()));
        identity
    }
}
