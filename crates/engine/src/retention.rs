//! Retention store — C9. Per-user sharded map of terminal (or in-flight)
//! execution records, bounded by TTL and by a per-user count cap (spec
//! §4.7). `ExecutionId` has no `Ord` impl (see `nebula-core`), so eviction
//! scans rather than using a `BTreeMap` ordered by id; at the ~100-per-user
//! scale spec.md's cap implies, an O(n) scan per insert is cheap enough.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use nebula_core::{ExecutionId, UserId};
use nebula_eventbus::ProgressBus;
use parking_lot::RwLock;
use tokio::sync::oneshot;

use crate::record::ExecutionRecord;

/// Pending user-input-gate waiters, shared between the driver (which
/// inserts a sender when it parks on a question) and the retention store
/// (which drops the sender on eviction, per spec §4.7: "removal also drops
/// the execution's pending input requests").
pub type InputWaiters = DashMap<ExecutionId, oneshot::Sender<String>>;

/// Sharded, bounded store of execution records (spec §4.7). Concurrent
/// readers/writers across users via `DashMap`; exclusive only within one
/// user's shard (spec §5: "eviction holds the user-shard briefly").
pub struct RetentionStore {
    ttl: chrono::Duration,
    cap_per_user: usize,
    users: DashMap<UserId, RwLock<HashMap<ExecutionId, ExecutionRecord>>>,
    progress_bus: Arc<ProgressBus>,
    input_waiters: Arc<InputWaiters>,
}

impl RetentionStore {
    #[must_use]
    pub fn new(
        ttl: Duration,
        cap_per_user: usize,
        progress_bus: Arc<ProgressBus>,
        input_waiters: Arc<InputWaiters>,
    ) -> Self {
        Self {
            ttl: chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::zero()),
            cap_per_user,
            users: DashMap::new(),
            progress_bus,
            input_waiters,
        }
    }

    /// Inserts or replaces a record, then evicts anything past TTL (across
    /// every user) and, if this user is still over the cap, the oldest
    /// record(s) by `created_at` until back at or under it.
    pub fn insert(&self, record: ExecutionRecord) {
        let user_id = record.state.user_id.clone();
        let execution_id = record.state.execution_id.clone();
        self.users
            .entry(user_id.clone())
            .or_insert_with(|| RwLock::new(HashMap::new()))
            .write()
            .insert(execution_id, record);

        self.evict_expired();
        self.evict_over_cap(&user_id);
    }

    /// Looks up a record, evicting expired entries first.
    #[must_use]
    pub fn get(&self, user_id: &UserId, execution_id: &ExecutionId) -> Option<ExecutionRecord> {
        self.evict_expired();
        self.users
            .get(user_id)
            .and_then(|shard| shard.read().get(execution_id).cloned())
    }

    /// Updates an existing record in place via `mutate`, if present.
    pub fn update(
        &self,
        user_id: &UserId,
        execution_id: &ExecutionId,
        mutate: impl FnOnce(&mut ExecutionRecord),
    ) {
        if let Some(shard) = self.users.get(user_id) {
            if let Some(record) = shard.write().get_mut(execution_id) {
                mutate(record);
            }
        }
    }

    #[must_use]
    pub fn len_for_user(&self, user_id: &UserId) -> usize {
        self.users.get(user_id).map_or(0, |shard| shard.read().len())
    }

    fn evict_expired(&self) {
        let now = Utc::now();
        for shard_ref in self.users.iter() {
            let mut shard = shard_ref.write();
            let stale: Vec<ExecutionId> = shard
                .iter()
                .filter(|(_, r)| now.signed_duration_since(r.state.created_at) >= self.ttl)
                .map(|(id, _)| id.clone())
                .collect();
            for id in stale {
                shard.remove(&id);
                self.drop_channels(&id);
            }
        }
    }

    fn evict_over_cap(&self, user_id: &UserId) {
        let Some(shard_ref) = self.users.get(user_id) else {
            return;
        };
        loop {
            let oldest = {
                let shard = shard_ref.read();
                if shard.len() <= self.cap_per_user {
                    None
                } else {
                    shard
                        .iter()
                        .min_by_key(|(_, r)| r.state.created_at)
                        .map(|(id, _)| id.clone())
                }
            };
            match oldest {
                Some(id) => {
                    shard_ref.write().remove(&id);
                    self.drop_channels(&id);
                }
                None => break,
            }
        }
    }

    fn drop_channels(&self, execution_id: &ExecutionId) {
        self.progress_bus.remove(execution_id);
        self.input_waiters.remove(execution_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nebula_execution::ExecutionState;
    use nebula_workflow::{generate_identity, Edge, IoFormat, IoSpec, Node, NodeKind, WorkflowDefinition};
    use nebula_core::NodeId;

    fn graph() -> WorkflowDefinition {
        WorkflowDefinition {
            nodes: vec![Node {
                id: NodeId::new("in"),
                kind: NodeKind::Input(IoSpec { format: IoFormat::Text }),
            }],
            edges: Vec::<Edge>::new(),
        }
    }

    fn record_for(user_id: &str, millis: u64) -> ExecutionRecord {
        let g = graph();
        let identity = generate_identity(&g);
        let state = ExecutionState::new(
            ExecutionId::allocate(UserId::new(user_id), millis),
            UserId::new(user_id),
            g,
            identity,
            serde_json::json!(null),
        );
        ExecutionRecord::new(state)
    }

    fn store() -> RetentionStore {
        RetentionStore::new(
            Duration::from_secs(3600),
            2,
            Arc::new(ProgressBus::new()),
            Arc::new(DashMap::new()),
        )
    }

    #[test]
    fn insert_and_get_roundtrip() {
        let store = store();
        let record = record_for("alice", 1);
        let execution_id = record.state.execution_id.clone();
        store.insert(record);
        assert!(store.get(&UserId::new("alice"), &execution_id).is_some());
    }

    #[test]
    fn cap_evicts_oldest_first() {
        let store = store();
        let first = record_for("alice", 1);
        let first_id = first.state.execution_id.clone();
        store.insert(first);
        store.insert(record_for("alice", 2));
        store.insert(record_for("alice", 3));
        assert_eq!(store.len_for_user(&UserId::new("alice")), 2);
        assert!(store.get(&UserId::new("alice"), &first_id).is_none());
    }

    #[test]
    fn ttl_evicts_stale_record_regardless_of_cap() {
        let store = RetentionStore::new(
            Duration::from_secs(60),
            100,
            Arc::new(ProgressBus::new()),
            Arc::new(DashMap::new()),
        );
        let mut record = record_for("bob", 1);
        record.state.created_at = Utc::now() - chrono::Duration::seconds(120);
        let execution_id = record.state.execution_id.clone();
        store.insert(record);
        assert!(store.get(&UserId::new("bob"), &execution_id).is_none());
    }

    #[test]
    fn users_are_independent_shards() {
        let store = store();
        store.insert(record_for("alice", 1));
        store.insert(record_for("alice", 2));
        store.insert(record_for("bob", 1));
        assert_eq!(store.len_for_user(&UserId::new("alice")), 2);
        assert_eq!(store.len_for_user(&UserId::new("bob")), 1);
    }
}
