//! Domain model (IDs, job records, fingerprints, content, ...).

pub mod content;
pub mod fingerprint;
pub mod ids;
pub mod job;
pub mod request;

pub use content::WeekContent;
pub use fingerprint::{Fingerprint, fingerprint};
pub use ids::JobId;
pub use job::{AnalysisOutcome, JobRecord, JobStatus, JobStatusView, StatusReport};
pub use request::AnalysisRequest;
