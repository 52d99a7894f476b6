//! Execution state tracking for workflows and individual nodes.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use nebula_core::{ExecutionId, NodeId, UserId};
use nebula_workflow::{Identity, NodeKind, NodeState, WorkflowDefinition};
use serde::{Deserialize, Serialize};

use crate::attempt::NodeAttempt;
use crate::error::ExecutionError;
use crate::output::NodeOutput;
use crate::status::ExecutionStatus;
use crate::transition::{validate_execution_transition, validate_node_transition};

/// The execution state of a single node within a running workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeExecutionState {
    /// Current state of the node.
    pub state: NodeState,
    /// Display name, carried alongside state so progress snapshots don't
    /// need to dereference back into the frozen graph.
    pub name: String,
    /// The node's kind label (`"agent"`, `"tool"`, ...).
    pub kind: &'static str,
    /// All attempts made to execute this node.
    pub attempts: Vec<NodeAttempt>,
    /// The current output, if any.
    #[serde(default)]
    pub current_output: Option<NodeOutput>,
    /// When this node started its first attempt.
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    /// When this node reached a terminal state.
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// Error message if the node failed.
    #[serde(default)]
    pub error_message: Option<String>,
}

impl NodeExecutionState {
    /// Create a new node execution state in the Pending state.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: &'static str) -> Self {
        Self {
            state: NodeState::Pending,
            name: name.into(),
            kind,
            attempts: Vec::new(),
            current_output: None,
            started_at: None,
            completed_at: None,
            error_message: None,
        }
    }

    /// Creates a state already marked `completed` — used for non-executable
    /// nodes (conditional/input/output), which spec §3 says are initialized
    /// complete rather than tracked through the handler lifecycle.
    #[must_use]
    pub fn already_completed(name: impl Into<String>, kind: &'static str) -> Self {
        let mut s = Self::new(name, kind);
        s.state = NodeState::Completed;
        s.completed_at = Some(Utc::now());
        s
    }

    /// Number of attempts made so far.
    #[must_use]
    pub fn attempt_count(&self) -> usize {
        self.attempts.len()
    }

    /// Get the latest attempt, if any.
    #[must_use]
    pub fn latest_attempt(&self) -> Option<&NodeAttempt> {
        self.attempts.last()
    }

    /// Transition to a new state, validating the transition.
    pub fn transition_to(&mut self, new_state: NodeState) -> Result<(), ExecutionError> {
        validate_node_transition(self.state, new_state)?;
        self.state = new_state;

        if new_state == NodeState::Running && self.started_at.is_none() {
            self.started_at = Some(Utc::now());
        }
        if new_state.is_terminal() {
            self.completed_at = Some(Utc::now());
        }

        Ok(())
    }
}

/// The per-node status entry exposed on the execution record's progress
/// block (spec §3: `node_status: id→{state, name, kind}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeStatusEntry {
    pub state: NodeState,
    pub name: String,
    pub kind: String,
}

/// Spec §3: `progress = {percent, current_activity, current_step,
/// total_steps, node_status}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Progress {
    pub percent: u8,
    pub current_activity: String,
    pub current_step: usize,
    pub total_steps: usize,
    pub node_status: HashMap<NodeId, NodeStatusEntry>,
}

/// The complete execution state of a running workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionState {
    /// Unique identifier for this execution.
    pub execution_id: ExecutionId,
    /// Owning user.
    pub user_id: UserId,
    /// Current execution status.
    pub status: ExecutionStatus,
    /// The frozen graph this execution is driving (spec §3: `graph (frozen)`).
    pub graph: WorkflowDefinition,
    /// The graph's generated or supplied identity.
    pub identity: Identity,
    /// The raw submitted input.
    pub input: serde_json::Value,
    /// Per-node execution states.
    pub node_states: HashMap<NodeId, NodeExecutionState>,
    /// When the execution was created.
    pub created_at: DateTime<Utc>,
    /// When the execution completed.
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// Final result, set once `status` is `completed`.
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    /// Terminal error, set once `status` is `failed`.
    #[serde(default)]
    pub error: Option<ExecutionError>,
}

impl ExecutionState {
    /// Create a new execution state. Non-executable nodes (conditional,
    /// input, output) start already `completed` per spec §3's invariant
    /// that `node_status` covers exactly the executable nodes.
    #[must_use]
    pub fn new(
        execution_id: ExecutionId,
        user_id: UserId,
        graph: WorkflowDefinition,
        identity: Identity,
        input: serde_json::Value,
    ) -> Self {
        let now = Utc::now();
        let mut node_states = HashMap::with_capacity(graph.nodes.len());
        for node in &graph.nodes {
            let name = node_display_name(&node.kind);
            let kind = node.kind.label();
            let state = if node.kind.is_executable() {
                NodeExecutionState::new(name, kind)
            } else {
                NodeExecutionState::already_completed(name, kind)
            };
            node_states.insert(node.id.clone(), state);
        }

        Self {
            execution_id,
            user_id,
            status: ExecutionStatus::Running,
            graph,
            identity,
            input,
            node_states,
            created_at: now,
            completed_at: None,
            result: None,
            error: None,
        }
    }

    #[must_use]
    pub fn node_state(&self, node_id: &NodeId) -> Option<&NodeExecutionState> {
        self.node_states.get(node_id)
    }

    pub fn set_node_state(&mut self, node_id: NodeId, state: NodeExecutionState) {
        self.node_states.insert(node_id, state);
    }

    /// Returns `true` if every *executable* node is terminal — spec §3
    /// scopes this invariant to agent/tool nodes only.
    #[must_use]
    pub fn all_executable_nodes_terminal(&self) -> bool {
        self.graph
            .nodes
            .iter()
            .filter(|n| n.kind.is_executable())
            .all(|n| {
                self.node_states
                    .get(&n.id)
                    .is_some_and(|ns| ns.state.is_terminal())
            })
    }

    #[must_use]
    pub fn completed_node_ids(&self) -> Vec<NodeId> {
        self.node_states
            .iter()
            .filter(|(_, ns)| ns.state == NodeState::Completed)
            .map(|(id, _)| id.clone())
            .collect()
    }

    #[must_use]
    pub fn failed_node_ids(&self) -> Vec<NodeId> {
        self.node_states
            .iter()
            .filter(|(_, ns)| ns.state == NodeState::Failed)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Transition the execution status, validating the transition.
    pub fn transition_status(&mut self, new_status: ExecutionStatus) -> Result<(), ExecutionError> {
        validate_execution_transition(self.status, new_status)?;
        self.status = new_status;
        if new_status.is_terminal() {
            self.completed_at = Some(Utc::now());
        }
        Ok(())
    }

    /// Computes the current progress snapshot. `percent` is the share of
    /// executable nodes in a terminal state, reaching 100 exactly when
    /// `status` becomes terminal (testable property 2).
    #[must_use]
    pub fn progress(&self, current_activity: impl Into<String>) -> Progress {
        let executable: Vec<&NodeId> = self
            .graph
            .nodes
            .iter()
            .filter(|n| n.kind.is_executable())
            .map(|n| &n.id)
            .collect();
        let total_steps = executable.len();
        let completed_steps = executable
            .iter()
            .filter(|id| {
                self.node_states
                    .get(**id)
                    .is_some_and(|ns| ns.state.is_terminal())
            })
            .count();
        let percent = if total_steps == 0 {
            100
        } else {
            ((completed_steps * 100) / total_steps) as u8
        };

        let node_status = self
            .node_states
            .iter()
            .map(|(id, ns)| {
                (
                    id.clone(),
                    NodeStatusEntry {
                        state: ns.state,
                        name: ns.name.clone(),
                        kind: ns.kind.to_string(),
                    },
                )
            })
            .collect();

        Progress {
            percent,
            current_activity: current_activity.into(),
            current_step: completed_steps,
            total_steps,
            node_status,
        }
    }
}

fn node_display_name(kind: &NodeKind) -> String {
    match kind {
        NodeKind::Agent(spec) => spec.name.clone(),
        NodeKind::Tool(spec) => spec.name.clone(),
        NodeKind::Conditional(_) => "conditional".to_string(),
        NodeKind::Input(_) => "input".to_string(),
        NodeKind::Output(_) => "output".to_string(),
    }
}
