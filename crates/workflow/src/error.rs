//! Errors raised while turning wire-level graph data into typed
//! [`crate::graph::WorkflowDefinition`] values.
//!
//! These are *construction* errors — malformed node payloads that fail to
//! parse into a [`crate::node::NodeKind`]. Structural validation (cycles,
//! reachability, path length) is `nebula-validator`'s job (C2); this crate
//! only rejects a node/edge it cannot type at all.

use nebula_core::NodeId;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("node {0} is missing required field `{1}`")]
    MissingField(NodeId, &'static str),

    #[error("node {0} has unknown kind `{1}`")]
    UnknownKind(NodeId, String),

    #[error("node {0} field `{1}` has the wrong type")]
    WrongType(NodeId, &'static str),

    #[error("conditional node {0} has more than one default condition")]
    MultipleDefaults(NodeId),

    #[error("duplicate node id `{0}`")]
    DuplicateNodeId(NodeId),
}
