//! Wire-level (untyped, forgiving) graph shapes.
//!
//! A submission arrives as loosely-typed JSON — the kind of payload a
//! front-end visual designer or an AI-assisted builder produces, where a
//! field the spec calls "required" may simply be absent. `nebula-validator`
//! (C2) is what turns a rejection of these into a classified error; this
//! module only carries the shape far enough to be inspected.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A node exactly as submitted, before structural validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeWire {
    pub id: Option<String>,
    pub kind: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub position: Option<Value>,
}

/// An edge exactly as submitted, before structural validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeWire {
    pub id: Option<String>,
    pub source: Option<String>,
    pub target: Option<String>,
    #[serde(default)]
    pub source_handle: Option<String>,
    #[serde(default)]
    pub target_handle: Option<String>,
}

/// A full submitted graph, before structural validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphWire {
    #[serde(default)]
    pub nodes: Vec<NodeWire>,
    #[serde(default)]
    pub edges: Vec<EdgeWire>,
}

impl NodeWire {
    /// Reads a string field out of `data`, tolerating either of the two
    /// upstream producers' naming (`name` or `label`), per spec §4.1 check 3/4.
    pub fn data_str(&self, key: &str) -> Option<&str> {
        self.data.as_ref()?.get(key)?.as_str()
    }

    pub fn name_or_label(&self) -> Option<&str> {
        self.data_str("name").or_else(|| self.data_str("label"))
    }

    /// `data.type`, used to detect a Composio-style tool payload
    /// (`composio-...`) regardless of the node's own `kind` field — the
    /// unification spec §4.1 check 2 calls for.
    pub fn data_type(&self) -> Option<&str> {
        self.data_str("type")
    }

    pub fn is_tool_shaped(&self) -> bool {
        self.kind.as_deref() == Some("tool")
            || self
                .data_type()
                .is_some_and(|t| t.starts_with("composio-"))
    }

    pub fn is_agent_shaped(&self) -> bool {
        !self.is_tool_shaped() && self.kind.as_deref() == Some("agent")
    }

    pub fn is_executable(&self) -> bool {
        self.is_tool_shaped() || self.is_agent_shaped()
    }
}
