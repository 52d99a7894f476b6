//! Identifiers shared across the engine.
//!
//! `NodeId` is a free-form string, not a UUID: spec §3 defines a graph node's
//! `id` as "string, unique within graph" — callers mint their own ids
//! (`"A1"`, `"router"`, ...), the engine never generates one. `UserId` and
//! `ExecutionId` follow the same free-form-string shape for the same reason:
//! a submission's `user_id` is caller-supplied, and an execution id must
//! encode its owning user as a readable segment, not an opaque UUID.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// A node's identity within its owning graph. Unique only within that graph,
/// not process-wide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Owning identity of a submission. Free-form, not a UUID: the submission
/// surface (§6) only guarantees `user_id` is an opaque string, defaulting to
/// `"anonymous"` when absent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub const ANONYMOUS: &'static str = "anonymous";

    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        if raw.is_empty() {
            Self(Self::ANONYMOUS.to_string())
        } else {
            Self(raw)
        }
    }

    pub fn anonymous() -> Self {
        Self(Self::ANONYMOUS.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::anonymous()
    }
}

/// Error returned when an execution id string does not match
/// `exec_{user_id}_{millis}`.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ExecutionIdParseError {
    #[error("execution id `{0}` is missing the `exec_` prefix")]
    MissingPrefix(String),
    #[error("execution id `{0}` is missing the trailing millisecond segment")]
    MissingTimestamp(String),
    #[error("execution id `{0}` has a non-numeric timestamp segment")]
    InvalidTimestamp(String),
}

/// `exec_{user_id}_{monotonic_ms}` — encodes and allows recovery of the
/// owning [`UserId`]. See spec §3 Invariants and §4.4 step 1.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ExecutionId {
    user_id: UserId,
    millis: u64,
}

impl ExecutionId {
    /// Mints a new id for `user_id`, guaranteeing process-wide uniqueness
    /// even when two allocations land in the same millisecond by padding the
    /// timestamp forward past any previously issued value.
    pub fn allocate(user_id: UserId, now_millis: u64) -> Self {
        static LAST: AtomicU64 = AtomicU64::new(0);
        let mut millis = now_millis;
        loop {
            let last = LAST.load(Ordering::SeqCst);
            if millis <= last {
                millis = last + 1;
            }
            if LAST
                .compare_exchange(last, millis, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                break;
            }
        }
        Self { user_id, millis }
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn millis(&self) -> u64 {
        self.millis
    }
}

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "exec_{}_{}", self.user_id, self.millis)
    }
}

impl FromStr for ExecutionId {
    type Err = ExecutionIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix("exec_")
            .ok_or_else(|| ExecutionIdParseError::MissingPrefix(s.to_string()))?;
        let (user_part, millis_part) = rest
            .rsplit_once('_')
            .ok_or_else(|| ExecutionIdParseError::MissingTimestamp(s.to_string()))?;
        let millis = millis_part
            .parse::<u64>()
            .map_err(|_| ExecutionIdParseError::InvalidTimestamp(s.to_string()))?;
        Ok(Self {
            user_id: UserId::new(user_part),
            millis,
        })
    }
}

impl TryFrom<String> for ExecutionId {
    type Error = ExecutionIdParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ExecutionId> for String {
    fn from(value: ExecutionId) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_roundtrips_as_opaque_string() {
        let id = NodeId::new("router-1");
        assert_eq!(id.as_str(), "router-1");
        assert_eq!(id.to_string(), "router-1");
    }

    #[test]
    fn user_id_defaults_empty_to_anonymous() {
        assert_eq!(UserId::new("").as_str(), "anonymous");
    }

    #[test]
    fn execution_id_display_roundtrips_through_parse() {
        let id = ExecutionId::allocate(UserId::new("alice"), 1_700_000_000_000);
        let rendered = id.to_string();
        assert_eq!(rendered, "exec_alice_1700000000000");
        let parsed: ExecutionId = rendered.parse().unwrap();
        assert_eq!(parsed.user_id().as_str(), "alice");
        assert_eq!(parsed.millis(), 1_700_000_000_000);
    }

    #[test]
    fn execution_id_allocate_is_monotonic_within_same_millis() {
        let a = ExecutionId::allocate(UserId::new("bob"), 10);
        let b = ExecutionId::allocate(UserId::new("bob"), 10);
        assert_ne!(a.millis(), b.millis());
        assert!(b.millis() > a.millis());
    }

    #[test]
    fn execution_id_parse_rejects_missing_prefix() {
        let err = "alice_123".parse::<ExecutionId>().unwrap_err();
        assert!(matches!(err, ExecutionIdParseError::MissingPrefix(_)));
    }

    #[test]
    fn execution_id_parse_rejects_non_numeric_timestamp() {
        let err = "exec_alice_soon".parse::<ExecutionId>().unwrap_err();
        assert!(matches!(err, ExecutionIdParseError::InvalidTimestamp(_)));
    }

    #[test]
    fn execution_id_serde_json_roundtrip() {
        let id = ExecutionId::allocate(UserId::new("carol"), 42);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"exec_carol_42\"");
        let back: ExecutionId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn user_id_embedded_with_underscores_recovers_left_greedily() {
        // rsplit_once on '_' means a user id containing underscores still
        // recovers correctly because the timestamp is always the last segment.
        let id = ExecutionId::allocate(UserId::new("user_42"), 7);
        let rendered = id.to_string();
        let parsed: ExecutionId = rendered.parse().unwrap();
        assert_eq!(parsed.user_id().as_str(), "user_42");
    }
}
