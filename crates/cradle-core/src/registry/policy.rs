//! Registry configuration and result-consumption policy.

use std::time::Duration;

/// What happens to a finished job's payload on first successful read.
///
/// Both variants have shipped at different times; the choice is a
/// deployment tradeoff (memory vs. re-download tolerance), so it is
/// explicit configuration here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultPolicy {
    /// Remove the record (and its fingerprint index entry) as soon as the
    /// result is fetched once. Frees the payload bytes immediately, but a
    /// duplicate submission after the read starts a new job.
    ConsumeOnce,

    /// Keep the record until the reaper's retention window expires.
    /// Repeated fetches succeed and the dedup guarantee holds for the
    /// whole window.
    CacheUntilTtl,
}

/// Registry tuning knobs.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// How long a record lives after creation before the reaper evicts
    /// it. Not refreshed by status transitions.
    pub retention: Duration,

    pub result_policy: ResultPolicy,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            retention: Duration::from_secs(10 * 60),
            result_policy: ResultPolicy::CacheUntilTtl,
        }
    }
}
