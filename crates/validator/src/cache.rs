//! The validator's result cache (spec §4.1: identical requests within 5 s
//! return the cached verdict; stale entries evicted under an LRU cap of
//! ~50). `original_source`'s cache trims in batches once past the cap — see
//! `SPEC_FULL.md` §4.1 — this uses a plain `lru::LruCache` with one-entry
//! eviction per insert instead, a deliberate simplification.

use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;
use nebula_workflow::GraphWire;
use parking_lot::Mutex;

use crate::error::ValidationError;
use crate::outcome::ValidationOutcome;

const CACHE_CAPACITY: usize = 50;
const FRESHNESS_WINDOW: Duration = Duration::from_secs(5);

type CachedResult = Result<ValidationOutcome, ValidationError>;

struct Entry {
    inserted_at: Instant,
    result: CachedResult,
}

/// Thread-safe, content-keyed cache over validation verdicts.
pub struct ValidatorCache {
    entries: Mutex<LruCache<u64, Entry>>,
}

impl Default for ValidatorCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidatorCache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(LruCache::new(
                NonZeroUsize::new(CACHE_CAPACITY).expect("capacity is nonzero"),
            )),
        }
    }

    /// Runs `validate` against `graph`, short-circuiting through the cache
    /// when an unexpired entry exists for the same `(nodes, edges)` content.
    pub fn validate_cached(&self, graph: &GraphWire) -> CachedResult {
        let key = content_hash(graph);

        {
            let mut entries = self.entries.lock();
            if let Some(entry) = entries.get(&key) {
                if entry.inserted_at.elapsed() < FRESHNESS_WINDOW {
                    return entry.result.clone();
                }
            }
            entries.pop(&key);
        }

        let result = crate::validate(graph);
        self.entries.lock().put(
            key,
            Entry {
                inserted_at: Instant::now(),
                result: result.clone(),
            },
        );
        result
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Hash of the submitted `(nodes, edges)` content. In-process only — it
/// never needs to be stable across runs, only within one cache's lifetime.
fn content_hash(graph: &GraphWire) -> u64 {
    let bytes = serde_json::to_vec(graph).unwrap_or_default();
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    bytes.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nebula_workflow::{EdgeWire, NodeWire};
    use serde_json::json;

    fn valid_graph() -> GraphWire {
        GraphWire {
            nodes: vec![
                NodeWire {
                    id: Some("i".into()),
                    kind: Some("input".into()),
                    data: Some(json!({})),
                    position: None,
                },
                NodeWire {
                    id: Some("a".into()),
                    kind: Some("agent".into()),
                    data: Some(json!({"name": "A", "instructions": "go"})),
                    position: None,
                },
            ],
            edges: vec![EdgeWire {
                id: Some("e1".into()),
                source: Some("i".into()),
                target: Some("a".into()),
                source_handle: None,
                target_handle: None,
            }],
        }
    }

    #[test]
    fn second_identical_call_hits_cache() {
        let cache = ValidatorCache::new();
        assert!(cache.validate_cached(&valid_graph()).is_ok());
        assert_eq!(cache.len(), 1);
        assert!(cache.validate_cached(&valid_graph()).is_ok());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn distinct_graphs_get_distinct_entries() {
        let cache = ValidatorCache::new();
        let mut other = valid_graph();
        other.nodes[1].id = Some("b".into());
        cache.validate_cached(&valid_graph()).ok();
        cache.validate_cached(&other).ok();
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn cache_respects_capacity() {
        let cache = ValidatorCache::new();
        for i in 0..(CACHE_CAPACITY + 10) {
            let mut g = valid_graph();
            g.nodes[1].id = Some(format!("b{i}"));
            g.edges[0].target = Some(format!("b{i}"));
            cache.validate_cached(&g).ok();
        }
        assert_eq!(cache.len(), CACHE_CAPACITY);
    }
}
