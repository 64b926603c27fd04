//! In-memory job store.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::policy::{RegistryConfig, ResultPolicy};
use crate::domain::{Fingerprint, JobId, JobRecord, JobStatus, StatusReport};
use crate::ports::{Clock, IdGenerator};

/// Registry state behind one lock.
///
/// Both maps live under the same Mutex so that:
/// - record creation and fingerprint registration are one atomic step
///   (two submitters racing on the same fingerprint cannot both miss),
/// - the reaper removes a record and its index entry in the same step
///   (an index entry never outlives its record by more than one sweep).
struct RegistryState {
    /// jobId -> record (single source of truth).
    jobs: HashMap<JobId, JobRecord>,

    /// contentFingerprint -> jobId, for deduplication.
    by_fingerprint: HashMap<Fingerprint, JobId>,
}

impl RegistryState {
    fn new() -> Self {
        Self {
            jobs: HashMap::new(),
            by_fingerprint: HashMap::new(),
        }
    }

    /// Drop every index entry pointing at `job_id`.
    fn unindex(&mut self, job_id: JobId) {
        self.by_fingerprint.retain(|_, id| *id != job_id);
    }
}

/// Outcome of a result fetch, distinct at every stage of the lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultFetch {
    /// Job is done; here are the bytes.
    Ready(Vec<u8>),

    /// Job exists but has not reached `Done` yet.
    NotReady,

    /// Job terminated with a failure.
    Failed(String),

    /// No such job (never existed, already reaped, or consumed).
    NotFound,
}

/// Live job counts by status, for observability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobCounts {
    pub pending: usize,
    pub processing: usize,
    pub done: usize,
    pub failed: usize,
}

impl JobCounts {
    pub fn total(&self) -> usize {
        self.pending + self.processing + self.done + self.failed
    }
}

/// Concurrent in-memory job store with content-addressed deduplication.
///
/// Owned explicitly and passed by `Arc` (構築は DI、static singleton に
/// しない)。すべての操作は任意の並行呼び出しに対して安全です。
pub struct JobRegistry {
    state: Mutex<RegistryState>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    config: RegistryConfig,
}

impl JobRegistry {
    pub fn new(
        ids: Arc<dyn IdGenerator>,
        clock: Arc<dyn Clock>,
        config: RegistryConfig,
    ) -> Self {
        Self {
            state: Mutex::new(RegistryState::new()),
            ids,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Allocate a fresh `Pending` record with no fingerprint association.
    pub async fn create_job(&self) -> JobId {
        let job_id = self.ids.generate_job_id();
        let mut state = self.state.lock().await;
        state.jobs.insert(job_id, JobRecord::new(self.clock.now()));
        job_id
    }

    /// Deduplicating create: return the job already registered for this
    /// fingerprint, or atomically create a new one and register it.
    ///
    /// The bool is `true` when a new job was created (the caller must
    /// dispatch work for it) and `false` on a dedup hit.
    ///
    /// Stale index entries (record already reaped) are healed here: the
    /// entry is dropped and a fresh job is created.
    pub async fn find_or_create(&self, fingerprint: &Fingerprint) -> (JobId, bool) {
        let mut state = self.state.lock().await;

        if let Some(existing) = state.by_fingerprint.get(fingerprint).copied() {
            if state.jobs.contains_key(&existing) {
                debug!(job_id = %existing, "fingerprint dedup hit");
                return (existing, false);
            }
            // Record was reaped but the index entry survived the sweep gap.
            state.by_fingerprint.remove(fingerprint);
        }

        let job_id = self.ids.generate_job_id();
        state.jobs.insert(job_id, JobRecord::new(self.clock.now()));
        state.by_fingerprint.insert(fingerprint.clone(), job_id);
        (job_id, true)
    }

    /// Dedup lookup without creating. Self-heals stale index entries.
    pub async fn lookup_by_fingerprint(&self, fingerprint: &Fingerprint) -> Option<JobId> {
        let mut state = self.state.lock().await;
        match state.by_fingerprint.get(fingerprint).copied() {
            Some(job_id) if state.jobs.contains_key(&job_id) => Some(job_id),
            Some(_) => {
                state.by_fingerprint.remove(fingerprint);
                None
            }
            None => None,
        }
    }

    /// Transition `Pending -> Processing`.
    ///
    /// Unknown id (already reaped): warn + no-op. A job past `Pending`
    /// (duplicate delivery): no-op. Status never regresses.
    pub async fn mark_processing(&self, job_id: JobId) {
        let mut state = self.state.lock().await;
        match state.jobs.get_mut(&job_id) {
            Some(record) => {
                if !record.mark_processing() {
                    debug!(%job_id, status = ?record.status, "mark_processing skipped");
                }
            }
            None => warn!(%job_id, "mark_processing on unknown job (already reaped?)"),
        }
    }

    /// Terminal success. Idempotent: a duplicate report overwrites the
    /// previous terminal state (last writer wins). Unknown id: warn +
    /// no-op; never resurrect a reaped job.
    pub async fn complete(&self, job_id: JobId, payload: Vec<u8>) {
        let mut state = self.state.lock().await;
        match state.jobs.get_mut(&job_id) {
            Some(record) => record.complete(payload),
            None => warn!(%job_id, "complete on unknown job (already reaped?)"),
        }
    }

    /// Terminal failure. Same semantics as [`complete`].
    ///
    /// [`complete`]: JobRegistry::complete
    pub async fn fail(&self, job_id: JobId, error: impl Into<String>) {
        let error = error.into();
        let mut state = self.state.lock().await;
        match state.jobs.get_mut(&job_id) {
            Some(record) => record.fail(error),
            None => warn!(%job_id, "fail on unknown job (already reaped?)"),
        }
    }

    /// Read-only snapshot of a record.
    pub async fn get(&self, job_id: JobId) -> Option<JobRecord> {
        let state = self.state.lock().await;
        state.jobs.get(&job_id).cloned()
    }

    /// Status snapshot for the polling layer.
    pub async fn status_report(&self, job_id: JobId) -> Option<StatusReport> {
        let state = self.state.lock().await;
        state.jobs.get(&job_id).map(JobRecord::status_report)
    }

    /// Fetch a result, honoring the configured [`ResultPolicy`].
    ///
    /// Under `ConsumeOnce`, a `Ready` fetch removes the record and its
    /// fingerprint index entry; the next fetch (and a duplicate
    /// submission) sees `NotFound` / a fresh job.
    pub async fn fetch_result(&self, job_id: JobId) -> ResultFetch {
        let mut state = self.state.lock().await;

        let Some(record) = state.jobs.get(&job_id) else {
            return ResultFetch::NotFound;
        };

        match record.status {
            JobStatus::Done => match self.config.result_policy {
                ResultPolicy::ConsumeOnce => {
                    let payload = state
                        .jobs
                        .remove(&job_id)
                        .and_then(|record| record.payload)
                        .unwrap_or_default();
                    state.unindex(job_id);
                    ResultFetch::Ready(payload)
                }
                ResultPolicy::CacheUntilTtl => {
                    ResultFetch::Ready(record.payload.clone().unwrap_or_default())
                }
            },
            JobStatus::Failed => {
                ResultFetch::Failed(record.error.clone().unwrap_or_default())
            }
            JobStatus::Pending | JobStatus::Processing => ResultFetch::NotReady,
        }
    }

    /// Evict every record older than `retention`, dropping fingerprint
    /// index entries in the same locked step. Returns the eviction count.
    ///
    /// Age is measured against the registry's `Clock`, so retention is
    /// testable with a controllable clock. In-flight `complete`/`fail`
    /// calls for the same id serialize on the registry lock, so a record
    /// is never removed mid-update.
    pub async fn reap_older_than(&self, retention: Duration) -> usize {
        let mut state = self.state.lock().await;
        let now = self.clock.now();

        let expired: Vec<JobId> = state
            .jobs
            .iter()
            .filter(|(_, record)| {
                (now - record.created_at)
                    .to_std()
                    .is_ok_and(|age| age >= retention)
            })
            .map(|(id, _)| *id)
            .collect();

        for job_id in &expired {
            state.jobs.remove(job_id);
            state.unindex(*job_id);
        }

        expired.len()
    }

    /// Number of live records (monitoring).
    pub async fn job_count(&self) -> usize {
        let state = self.state.lock().await;
        state.jobs.len()
    }

    /// Live counts by status (monitoring).
    pub async fn counts(&self) -> JobCounts {
        let state = self.state.lock().await;
        let mut counts = JobCounts::default();
        for record in state.jobs.values() {
            match record.status {
                JobStatus::Pending => counts.pending += 1,
                JobStatus::Processing => counts.processing += 1,
                JobStatus::Done => counts.done += 1,
                JobStatus::Failed => counts.failed += 1,
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fingerprint;
    use crate::ports::{SystemClock, UlidGenerator};

    use chrono::{DateTime, TimeZone, Utc};

    /// Manually advanced clock for retention tests.
    struct SteppingClock {
        now: std::sync::Mutex<DateTime<Utc>>,
    }

    impl SteppingClock {
        fn new(start: DateTime<Utc>) -> Self {
            Self {
                now: std::sync::Mutex::new(start),
            }
        }

        fn advance(&self, delta: chrono::Duration) {
            *self.now.lock().unwrap() += delta;
        }
    }

    impl Clock for SteppingClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap()
        }
    }

    fn registry(policy: ResultPolicy) -> JobRegistry {
        JobRegistry::new(
            Arc::new(UlidGenerator::new(SystemClock)),
            Arc::new(SystemClock),
            RegistryConfig {
                result_policy: policy,
                ..RegistryConfig::default()
            },
        )
    }

    #[tokio::test]
    async fn create_and_get() {
        let registry = registry(ResultPolicy::CacheUntilTtl);
        let job_id = registry.create_job().await;

        let record = registry.get(job_id).await.unwrap();
        assert_eq!(record.status, JobStatus::Pending);
        assert_eq!(registry.job_count().await, 1);
    }

    #[tokio::test]
    async fn find_or_create_deduplicates_identical_and_swapped_pairs() {
        let registry = registry(ResultPolicy::CacheUntilTtl);

        let fp = fingerprint(b"mom", b"dad");
        let (first, created) = registry.find_or_create(&fp).await;
        assert!(created);

        let (second, created) = registry.find_or_create(&fp).await;
        assert!(!created);
        assert_eq!(first, second);

        // Swapped parents produce the same fingerprint, hence the same job.
        let swapped = fingerprint(b"dad", b"mom");
        let (third, created) = registry.find_or_create(&swapped).await;
        assert!(!created);
        assert_eq!(first, third);
    }

    #[tokio::test]
    async fn lookup_self_heals_after_reap() {
        let registry = registry(ResultPolicy::CacheUntilTtl);
        let fp = fingerprint(b"a", b"b");
        let (job_id, _) = registry.find_or_create(&fp).await;

        // Everything is "too old" with a zero retention window.
        let removed = registry.reap_older_than(Duration::ZERO).await;
        assert_eq!(removed, 1);

        assert!(registry.get(job_id).await.is_none());
        assert_eq!(registry.lookup_by_fingerprint(&fp).await, None);

        // A fresh submission after reaping starts a new job.
        let (new_id, created) = registry.find_or_create(&fp).await;
        assert!(created);
        assert_ne!(new_id, job_id);
    }

    #[tokio::test]
    async fn reap_removes_record_and_index_together() {
        let registry = registry(ResultPolicy::CacheUntilTtl);
        let fp = fingerprint(b"x", b"y");
        let (job_id, _) = registry.find_or_create(&fp).await;
        registry.complete(job_id, vec![1]).await;

        registry.reap_older_than(Duration::ZERO).await;

        assert_eq!(registry.fetch_result(job_id).await, ResultFetch::NotFound);
        assert_eq!(registry.lookup_by_fingerprint(&fp).await, None);
        assert_eq!(registry.job_count().await, 0);
    }

    #[tokio::test]
    async fn retention_window_is_measured_on_the_injected_clock() {
        let clock = Arc::new(SteppingClock::new(
            Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap(),
        ));
        let registry = JobRegistry::new(
            Arc::new(UlidGenerator::new(SystemClock)),
            Arc::clone(&clock) as Arc<dyn Clock>,
            RegistryConfig::default(),
        );
        let retention = registry.config().retention;

        let old = registry.create_job().await;
        clock.advance(chrono::Duration::from_std(retention).unwrap());
        let fresh = registry.create_job().await;

        // `old` is exactly at the window edge, `fresh` has zero age.
        assert_eq!(registry.reap_older_than(retention).await, 1);
        assert!(registry.get(old).await.is_none());
        assert!(registry.get(fresh).await.is_some());
    }

    #[tokio::test]
    async fn status_never_regresses() {
        let registry = registry(ResultPolicy::CacheUntilTtl);
        let job_id = registry.create_job().await;

        registry.mark_processing(job_id).await;
        registry.complete(job_id, vec![7]).await;

        // Duplicate delivery after completion must not move it back.
        registry.mark_processing(job_id).await;
        assert_eq!(registry.get(job_id).await.unwrap().status, JobStatus::Done);
    }

    #[tokio::test]
    async fn duplicate_terminal_report_is_last_writer_wins() {
        let registry = registry(ResultPolicy::CacheUntilTtl);
        let job_id = registry.create_job().await;

        registry.complete(job_id, vec![1, 2]).await;
        registry.fail(job_id, "redelivered and failed").await;

        match registry.fetch_result(job_id).await {
            ResultFetch::Failed(reason) => assert_eq!(reason, "redelivered and failed"),
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn transitions_on_unknown_id_are_noops() {
        let registry = registry(ResultPolicy::CacheUntilTtl);
        let ghost = registry.create_job().await;
        registry.reap_older_than(Duration::ZERO).await;

        // None of these may panic or resurrect the record.
        registry.mark_processing(ghost).await;
        registry.complete(ghost, vec![1]).await;
        registry.fail(ghost, "late").await;

        assert!(registry.get(ghost).await.is_none());
        assert_eq!(registry.job_count().await, 0);
    }

    #[tokio::test]
    async fn consume_once_removes_both_sides_on_first_read() {
        let registry = registry(ResultPolicy::ConsumeOnce);
        let fp = fingerprint(b"p1", b"p2");
        let (job_id, _) = registry.find_or_create(&fp).await;
        registry.complete(job_id, vec![9, 9]).await;

        assert_eq!(
            registry.fetch_result(job_id).await,
            ResultFetch::Ready(vec![9, 9])
        );
        assert_eq!(registry.fetch_result(job_id).await, ResultFetch::NotFound);

        // Dedup entry went with the record: same pair is a fresh job now.
        let (new_id, created) = registry.find_or_create(&fp).await;
        assert!(created);
        assert_ne!(new_id, job_id);
    }

    #[tokio::test]
    async fn cache_until_ttl_allows_repeated_reads() {
        let registry = registry(ResultPolicy::CacheUntilTtl);
        let job_id = registry.create_job().await;
        registry.complete(job_id, vec![5]).await;

        assert_eq!(registry.fetch_result(job_id).await, ResultFetch::Ready(vec![5]));
        assert_eq!(registry.fetch_result(job_id).await, ResultFetch::Ready(vec![5]));
    }

    #[tokio::test]
    async fn fetch_result_before_completion_is_not_ready() {
        let registry = registry(ResultPolicy::CacheUntilTtl);
        let job_id = registry.create_job().await;

        assert_eq!(registry.fetch_result(job_id).await, ResultFetch::NotReady);
        registry.mark_processing(job_id).await;
        assert_eq!(registry.fetch_result(job_id).await, ResultFetch::NotReady);
    }

    #[tokio::test]
    async fn counts_by_status() {
        let registry = registry(ResultPolicy::CacheUntilTtl);

        let a = registry.create_job().await;
        let b = registry.create_job().await;
        let _c = registry.create_job().await;

        registry.mark_processing(a).await;
        registry.complete(a, vec![]).await;
        registry.mark_processing(b).await;

        let counts = registry.counts().await;
        assert_eq!(counts.pending, 1);
        assert_eq!(counts.processing, 1);
        assert_eq!(counts.done, 1);
        assert_eq!(counts.failed, 0);
        assert_eq!(counts.total(), 3);
    }
}
