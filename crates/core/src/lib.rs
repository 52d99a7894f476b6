//! # Nebula Core
//!
//! Identifiers shared by every other crate in the workspace.
//!
//! - [`UserId`] — opaque, free-form, encodes tenancy (see `id::UserId`).
//! - [`NodeId`] — opaque, free-form; unique within the graph that defines it.
//! - [`ExecutionId`] — encodes its owning [`UserId`] and an allocation
//!   timestamp; not a UUID.

pub mod error;
pub mod id;

pub use error::CoreError;
pub use id::{ExecutionId, ExecutionIdParseError, NodeId, UserId};

/// Result type used throughout the workspace's core layer.
pub type Result<T> = std::result::Result<T, CoreError>;

pub mod prelude {
    pub use super::{CoreError, ExecutionId, NodeId, Result, UserId};
}
