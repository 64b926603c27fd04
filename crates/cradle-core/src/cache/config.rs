//! Cache tuning knobs.

use std::ops::RangeInclusive;
use std::time::Duration;

/// Tiered cache configuration.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// The statically known valid key space. Anything outside is handled
    /// by the penetration guard and never reaches the generator.
    pub valid_weeks: RangeInclusive<u32>,

    /// L1 (process-local) TTL. Short: the local tier may be stale by at
    /// most this much relative to the shared tier.
    pub local_ttl: Duration,

    /// L1 capacity. The key space is bounded, so this just needs to
    /// cover it.
    pub local_capacity: u64,

    /// L2 nominal TTL before jitter.
    pub base_ttl: Duration,

    /// Upper bound of the uniform random addition to `base_ttl`.
    pub jitter_max: Duration,

    /// TTL of the negative marker cached for invalid keys.
    pub negative_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            valid_weeks: 1..=42,
            local_ttl: Duration::from_secs(2 * 60),
            local_capacity: 42,
            base_ttl: Duration::from_secs(24 * 60 * 60),
            jitter_max: Duration::from_secs(2 * 60 * 60),
            negative_ttl: Duration::from_secs(5 * 60),
        }
    }
}
