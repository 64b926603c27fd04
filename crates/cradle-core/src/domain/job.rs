//! Job record and status management.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Job status (strict forward progression).
///
/// State transitions:
/// - Pending -> Processing -> Done
/// - Pending -> Processing -> Failed
/// - Pending -> Done / Failed (webhook completion may skip Processing)
///
/// A terminal status may be overwritten by another terminal write
/// (duplicate delivery, duplicate webhook); last writer wins. It never
/// goes back to Pending or Processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStatus {
    /// Submitted, not yet picked up by a consumer.
    Pending,

    /// A consumer is running the remote analysis.
    Processing,

    /// Analysis finished; result payload is available.
    Done,

    /// Analysis failed; error message is available.
    Failed,
}

impl JobStatus {
    /// Is this a terminal status (no further forward transition)?
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Failed)
    }
}

/// Job record: the single source of truth for one analysis job.
///
/// Design:
/// - Exclusively owned by the registry; callers only hold the `JobId`.
/// - `created_at` is stamped from the registry's `Clock` port, set once
///   and never refreshed on transitions; the reaper evicts by
///   submission age, not by last activity.
/// - State transitions happen via methods, not direct field access.
#[derive(Debug, Clone)]
pub struct JobRecord {
    pub status: JobStatus,

    /// Result bytes, present only when `status == Done`.
    pub payload: Option<Vec<u8>>,

    /// Error text, present only when `status == Failed`.
    pub error: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl JobRecord {
    pub fn new(created_at: DateTime<Utc>) -> Self {
        Self {
            status: JobStatus::Pending,
            payload: None,
            error: None,
            created_at,
        }
    }

    /// Mark as picked up by a consumer.
    ///
    /// Only applies from `Pending`; a redelivered message for a job that
    /// is already processing or terminal must not regress it.
    pub fn mark_processing(&mut self) -> bool {
        if self.status == JobStatus::Pending {
            self.status = JobStatus::Processing;
            true
        } else {
            false
        }
    }

    /// Terminal success. Overwrites any previous terminal write (last
    /// writer wins), preserving `created_at`.
    pub fn complete(&mut self, payload: Vec<u8>) {
        self.status = JobStatus::Done;
        self.payload = Some(payload);
        self.error = None;
    }

    /// Terminal failure. Same overwrite semantics as [`complete`].
    ///
    /// [`complete`]: JobRecord::complete
    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = JobStatus::Failed;
        self.payload = None;
        self.error = Some(error.into());
    }

    /// Snapshot for the polling layer (no payload).
    pub fn status_report(&self) -> StatusReport {
        StatusReport {
            status: self.status.into(),
            error: self.error.clone(),
        }
    }
}

/// Serializable view of JobStatus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatusView {
    Pending,
    Processing,
    Done,
    Failed,
}

impl From<JobStatus> for JobStatusView {
    fn from(status: JobStatus) -> Self {
        match status {
            JobStatus::Pending => JobStatusView::Pending,
            JobStatus::Processing => JobStatusView::Processing,
            JobStatus::Done => JobStatusView::Done,
            JobStatus::Failed => JobStatusView::Failed,
        }
    }
}

/// Status snapshot for API polling responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusReport {
    pub status: JobStatusView,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Terminal outcome reported by a consumer or a webhook callback.
///
/// Both producers funnel through the same registry entry point, so a
/// duplicate report is safe.
#[derive(Debug, Clone)]
pub enum AnalysisOutcome {
    Success(Vec<u8>),
    Failure(String),
}
