//! QueueDispatcher - WorkQueue へ発行する投入経路（推奨）
//!
//! Dispatch は単に push するだけ。実際の処理は ConsumerGroup が担う。
//! Durable なキューと組み合わせると提出とワーカーを別プロセスにできる。

use std::sync::Arc;

use tracing::debug;

use crate::domain::AnalysisRequest;
use crate::ports::{DispatchError, WorkDispatcher, WorkQueue};

/// Dispatcher that hands requests to a work queue.
pub struct QueueDispatcher {
    queue: Arc<dyn WorkQueue>,
}

impl QueueDispatcher {
    pub fn new(queue: Arc<dyn WorkQueue>) -> Self {
        Self { queue }
    }
}

#[async_trait::async_trait]
impl WorkDispatcher for QueueDispatcher {
    async fn dispatch(&self, request: AnalysisRequest) -> Result<(), DispatchError> {
        debug!(job_id = %request.job_id, "dispatching to work queue");
        self.queue
            .push(request)
            .await
            .map_err(|e| DispatchError::Failed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::domain::JobId;
    use crate::impls::InMemoryWorkQueue;
    use ulid::Ulid;

    #[tokio::test]
    async fn dispatch_lands_on_the_queue() {
        let queue = Arc::new(InMemoryWorkQueue::new());
        let dispatcher = QueueDispatcher::new(Arc::clone(&queue) as Arc<dyn WorkQueue>);

        let job_id = JobId::from_ulid(Ulid::new());
        dispatcher
            .dispatch(AnalysisRequest::new(job_id, vec![1], vec![2]))
            .await
            .unwrap();

        let popped = queue.pop(Duration::from_secs(1)).await.unwrap().unwrap();
        assert_eq!(popped.job_id, job_id);
    }
}
