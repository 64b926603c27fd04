//! Remote service ports: the two slow external AI collaborators.
//!
//! Both are single blocking RPC-style calls with no internal retry.
//! A transient failure surfaces as an error here and becomes `Failed`
//! on the job (or propagates to the cache caller); any retry policy
//! belongs to the queue's redelivery mechanism, not to these traits.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::WeekContent;

/// Error from a remote call (network failure, non-success response,
/// remote-side processing error). Opaque text is enough: the core only
/// records it, never branches on it.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct RemoteError(pub String);

impl RemoteError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Parent-photo blending service (the slow 30s+ image worker).
#[async_trait]
pub trait FaceAnalyzer: Send + Sync {
    /// One analysis call: two parent image blobs in, result image out.
    async fn analyze(&self, parent_a: &[u8], parent_b: &[u8]) -> Result<Vec<u8>, RemoteError>;
}

/// Week-content generation service (rate-limited LLM backend).
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// One generation call for a single (already validated) week.
    async fn generate(&self, week: u32) -> Result<WeekContent, RemoteError>;
}
