//! Typed engine configuration (spec §6). No file-based config loading —
//! callers construct an `EngineConfig` in code, same as the teacher prefers
//! typed config over parsing at this layer. Deliberately does not carry
//! validator-cache or identity-cache knobs: both caches bake their own
//! TTL/capacity in as consts (`nebula_validator::cache::ValidatorCache`,
//! `nebula_workflow::identity::IdentityCache`) and take no config at
//! construction, so duplicating those numbers here would be dead surface.

use std::time::Duration;

/// Tunables the engine itself actually wires up.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How long a terminal execution record survives in the retention
    /// store before eviction (spec §4.7).
    pub retention_ttl: Duration,
    /// Maximum records kept per user in the retention store (spec §4.7).
    pub retention_cap_per_user: usize,
    /// Poll interval a webhook trigger waits between status checks while
    /// an execution is still `running`/`waiting_for_input` (spec §4.8).
    pub webhook_poll_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            retention_ttl: Duration::from_secs(24 * 60 * 60),
            retention_cap_per_user: 100,
            webhook_poll_interval: Duration::from_millis(500),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_numbers() {
        let config = EngineConfig::default();
        assert_eq!(config.retention_ttl, Duration::from_secs(86_400));
        assert_eq!(config.retention_cap_per_user, 100);
        assert_eq!(config.webhook_poll_interval, Duration::from_millis(500));
    }
}
