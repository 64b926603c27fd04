//! Image job service: the operation surface exposed to the request layer.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::domain::{AnalysisOutcome, AnalysisRequest, JobId, StatusReport, fingerprint};
use crate::ports::WorkDispatcher;
use crate::registry::{JobCounts, JobRegistry, ResultFetch};

/// Submit / poll / fetch / report surface over the job subsystem.
///
/// HTTP コントローラなどの呼び出し側はこの 4 操作だけに依存します。
/// 返り値は常に確定的な状態であり、一時的なバックエンド障害は
/// `Failed` として現れます（例外を投げない）。
pub struct ImageJobService {
    registry: Arc<JobRegistry>,
    dispatcher: Arc<dyn WorkDispatcher>,
}

impl ImageJobService {
    pub fn new(registry: Arc<JobRegistry>, dispatcher: Arc<dyn WorkDispatcher>) -> Self {
        Self {
            registry,
            dispatcher,
        }
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    /// Submit two parent image blobs for analysis.
    ///
    /// Returns immediately with a job id; the slow remote call happens on
    /// the dispatch path. A submission whose fingerprint matches a live
    /// job short-circuits to that job's id (deduplication). A dispatch
    /// failure marks the new job `Failed`, so the caller still gets an id
    /// and polls into a definite state.
    pub async fn submit(&self, parent_a: Vec<u8>, parent_b: Vec<u8>) -> JobId {
        let fp = fingerprint(&parent_a, &parent_b);

        let (job_id, created) = self.registry.find_or_create(&fp).await;
        if !created {
            info!(%job_id, "duplicate submission, returning existing job");
            return job_id;
        }

        info!(%job_id, "analysis job created");
        let request = AnalysisRequest::new(job_id, parent_a, parent_b);
        if let Err(err) = self.dispatcher.dispatch(request).await {
            warn!(%job_id, %err, "dispatch failed, marking job failed");
            self.registry.fail(job_id, format!("dispatch failed: {err}")).await;
        }

        job_id
    }

    /// Poll a job's status. `None` means not found (never existed, or
    /// already reaped/consumed).
    pub async fn status(&self, job_id: JobId) -> Option<StatusReport> {
        self.registry.status_report(job_id).await
    }

    /// Fetch a finished job's result (consumption behavior follows the
    /// registry's configured `ResultPolicy`).
    pub async fn result(&self, job_id: JobId) -> ResultFetch {
        self.registry.fetch_result(job_id).await
    }

    /// Terminal outcome entry point for external reporters (the remote
    /// worker's webhook callback). The internal consumer funnels through
    /// the same registry writes, so duplicate reports from either side
    /// are idempotent.
    ///
    /// Note: a webhook may complete a job that no consumer ever marked
    /// `Processing`; the `Pending -> Done/Failed` shortcut is allowed.
    pub async fn report_outcome(&self, job_id: JobId, outcome: AnalysisOutcome) {
        match outcome {
            AnalysisOutcome::Success(payload) => {
                info!(%job_id, bytes = payload.len(), "outcome reported: success");
                self.registry.complete(job_id, payload).await;
            }
            AnalysisOutcome::Failure(reason) => {
                error!(%job_id, %reason, "outcome reported: failure");
                self.registry.fail(job_id, reason).await;
            }
        }
    }

    /// Live job counts (monitoring).
    pub async fn counts(&self) -> JobCounts {
        self.registry.counts().await
    }
}
