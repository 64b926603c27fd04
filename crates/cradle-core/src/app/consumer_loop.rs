//! Consumer loop: drains the work queue and resolves jobs.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::domain::{AnalysisOutcome, AnalysisRequest};
use crate::ports::{FaceAnalyzer, WorkQueue};
use crate::registry::JobRegistry;

/// How long one `pop` waits before re-checking shutdown.
const POP_WAIT: Duration = Duration::from_millis(500);

/// Consumer group handle.
/// - `request_shutdown()` で新規 lease を止める
/// - `shutdown_and_join()` で全 consumer の終了を待てる
///
/// Shutdown does not cancel an in-flight pop or remote call; the
/// consumer finishes its current iteration (bounded by `POP_WAIT` plus
/// the call timeout) and then exits.
pub struct ConsumerGroup {
    shutdown_tx: watch::Sender<bool>,
    joins: Vec<JoinHandle<()>>,
}

impl ConsumerGroup {
    /// Spawn `n` consumers draining `queue`.
    pub fn spawn(
        n: usize,
        queue: Arc<dyn WorkQueue>,
        registry: Arc<JobRegistry>,
        analyzer: Arc<dyn FaceAnalyzer>,
        call_timeout: Duration,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut joins = Vec::with_capacity(n);
        for consumer_id in 0..n {
            let q = Arc::clone(&queue);
            let reg = Arc::clone(&registry);
            let an = Arc::clone(&analyzer);
            let rx = shutdown_rx.clone();

            let join = tokio::spawn(async move {
                consumer_loop(consumer_id, q, reg, an, call_timeout, rx).await;
            });
            joins.push(join);
        }

        Self { shutdown_tx, joins }
    }

    /// Request shutdown for all consumers.
    pub fn request_shutdown(&self) {
        // ignore send error: receivers may already be dropped
        let _ = self.shutdown_tx.send(true);
    }

    /// Shutdown and wait for all consumers.
    pub async fn shutdown_and_join(self) {
        self.request_shutdown();
        for j in self.joins {
            let _ = j.await;
        }
    }
}

async fn consumer_loop(
    consumer_id: usize,
    queue: Arc<dyn WorkQueue>,
    registry: Arc<JobRegistry>,
    analyzer: Arc<dyn FaceAnalyzer>,
    call_timeout: Duration,
    shutdown_rx: watch::Receiver<bool>,
) {
    info!(consumer_id, "consumer started");
    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        // pop は POP_WAIT で必ず返る。pop の future を途中で drop すると
        // 裏の blocking task が取り出したリクエストを捨ててしまうため、
        // shutdown とは select で競合させず、ループ先頭の確認だけにする。
        let request = match queue.pop(POP_WAIT).await {
            Ok(Some(request)) => request,
            Ok(None) => continue,
            Err(err) => {
                warn!(consumer_id, %err, "queue pop failed");
                continue;
            }
        };

        info!(consumer_id, job_id = %request.job_id, "analysis request received");
        process_request(&registry, analyzer.as_ref(), call_timeout, request).await;
    }
    info!(consumer_id, "consumer stopped");
}

/// Run one analysis request to its terminal state.
///
/// Shared by the queue consumers and the pooled fallback dispatcher.
/// One remote call, no internal retry; the call is bounded by
/// `call_timeout` so a hung remote cannot occupy a consumer slot
/// forever. The job never stays `Processing` past this function.
pub async fn process_request(
    registry: &JobRegistry,
    analyzer: &dyn FaceAnalyzer,
    call_timeout: Duration,
    request: AnalysisRequest,
) {
    let job_id = request.job_id;
    registry.mark_processing(job_id).await;

    let outcome = match tokio::time::timeout(
        call_timeout,
        analyzer.analyze(&request.parent_a, &request.parent_b),
    )
    .await
    {
        Ok(Ok(bytes)) => AnalysisOutcome::Success(bytes),
        Ok(Err(err)) => AnalysisOutcome::Failure(err.to_string()),
        Err(_) => AnalysisOutcome::Failure(format!(
            "analyze call exceeded {}ms",
            call_timeout.as_millis()
        )),
    };

    match outcome {
        AnalysisOutcome::Success(payload) => {
            info!(%job_id, bytes = payload.len(), "analysis completed");
            registry.complete(job_id, payload).await;
        }
        AnalysisOutcome::Failure(reason) => {
            error!(%job_id, %reason, "analysis failed");
            registry.fail(job_id, reason).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::domain::JobStatus;
    use crate::impls::InMemoryWorkQueue;
    use crate::ports::{RemoteError, SystemClock, UlidGenerator};
    use crate::registry::RegistryConfig;

    struct EchoAnalyzer;

    #[async_trait]
    impl FaceAnalyzer for EchoAnalyzer {
        async fn analyze(&self, parent_a: &[u8], parent_b: &[u8]) -> Result<Vec<u8>, RemoteError> {
            let mut out = parent_a.to_vec();
            out.extend_from_slice(parent_b);
            Ok(out)
        }
    }

    struct FailingAnalyzer;

    #[async_trait]
    impl FaceAnalyzer for FailingAnalyzer {
        async fn analyze(&self, _a: &[u8], _b: &[u8]) -> Result<Vec<u8>, RemoteError> {
            Err(RemoteError::new("model backend returned 500"))
        }
    }

    struct HangingAnalyzer;

    #[async_trait]
    impl FaceAnalyzer for HangingAnalyzer {
        async fn analyze(&self, _a: &[u8], _b: &[u8]) -> Result<Vec<u8>, RemoteError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(vec![])
        }
    }

    fn registry() -> Arc<JobRegistry> {
        Arc::new(JobRegistry::new(
            Arc::new(UlidGenerator::new(SystemClock)),
            Arc::new(SystemClock),
            RegistryConfig::default(),
        ))
    }

    async fn wait_for_terminal(registry: &JobRegistry, job_id: crate::domain::JobId) -> JobStatus {
        for _ in 0..200 {
            if let Some(record) = registry.get(job_id).await
                && record.status.is_terminal()
            {
                return record.status;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job never reached a terminal state");
    }

    #[tokio::test]
    async fn consumer_resolves_job_to_done_with_exact_bytes() {
        let registry = registry();
        let queue: Arc<dyn WorkQueue> = Arc::new(InMemoryWorkQueue::new());
        let group = ConsumerGroup::spawn(
            2,
            Arc::clone(&queue),
            Arc::clone(&registry),
            Arc::new(EchoAnalyzer),
            Duration::from_secs(5),
        );

        let job_id = registry.create_job().await;
        queue
            .push(AnalysisRequest::new(job_id, vec![1, 2], vec![3]))
            .await
            .unwrap();

        assert_eq!(wait_for_terminal(&registry, job_id).await, JobStatus::Done);
        let record = registry.get(job_id).await.unwrap();
        assert_eq!(record.payload.as_deref(), Some(&[1u8, 2, 3][..]));

        group.shutdown_and_join().await;
    }

    #[tokio::test]
    async fn remote_failure_marks_job_failed_not_stuck() {
        let registry = registry();
        let queue: Arc<dyn WorkQueue> = Arc::new(InMemoryWorkQueue::new());
        let group = ConsumerGroup::spawn(
            1,
            Arc::clone(&queue),
            Arc::clone(&registry),
            Arc::new(FailingAnalyzer),
            Duration::from_secs(5),
        );

        let job_id = registry.create_job().await;
        queue
            .push(AnalysisRequest::new(job_id, vec![1], vec![2]))
            .await
            .unwrap();

        assert_eq!(wait_for_terminal(&registry, job_id).await, JobStatus::Failed);
        let record = registry.get(job_id).await.unwrap();
        assert!(record.error.unwrap().contains("model backend returned 500"));

        group.shutdown_and_join().await;
    }

    #[tokio::test]
    async fn hung_remote_call_is_bounded_by_timeout() {
        let registry = registry();

        let job_id = registry.create_job().await;
        process_request(
            &registry,
            &HangingAnalyzer,
            Duration::from_millis(50),
            AnalysisRequest::new(job_id, vec![1], vec![2]),
        )
        .await;

        let record = registry.get(job_id).await.unwrap();
        assert_eq!(record.status, JobStatus::Failed);
        assert!(record.error.unwrap().contains("exceeded"));
    }

    #[tokio::test]
    async fn duplicate_delivery_is_idempotent() {
        let registry = registry();
        let job_id = registry.create_job().await;
        let request = AnalysisRequest::new(job_id, vec![4], vec![5]);

        process_request(&registry, &EchoAnalyzer, Duration::from_secs(5), request.clone()).await;
        // Redelivered message for the already-done job: last writer wins,
        // no regression through Pending/Processing.
        process_request(&registry, &EchoAnalyzer, Duration::from_secs(5), request).await;

        let record = registry.get(job_id).await.unwrap();
        assert_eq!(record.status, JobStatus::Done);
        assert_eq!(record.payload.as_deref(), Some(&[4u8, 5][..]));
    }

    #[tokio::test]
    async fn shutdown_does_not_lose_a_request_pushed_mid_pop() {
        let registry = registry();
        let queue: Arc<dyn WorkQueue> = Arc::new(InMemoryWorkQueue::new());
        let group = ConsumerGroup::spawn(
            1,
            Arc::clone(&queue),
            Arc::clone(&registry),
            Arc::new(EchoAnalyzer),
            Duration::from_secs(5),
        );

        // Let the consumer block inside pop on the empty queue.
        tokio::time::sleep(Duration::from_millis(100)).await;

        group.request_shutdown();
        let job_id = registry.create_job().await;
        queue
            .push(AnalysisRequest::new(job_id, vec![1], vec![2]))
            .await
            .unwrap();

        group.shutdown_and_join().await;

        // The request was either processed before the consumer exited or
        // is still queued for the next consumer. It must not vanish.
        let processed = registry.get(job_id).await.unwrap().status.is_terminal();
        let still_queued = queue
            .pop(Duration::from_millis(100))
            .await
            .unwrap()
            .is_some();
        assert!(
            processed || still_queued,
            "request dropped during shutdown"
        );
    }

    #[tokio::test]
    async fn shutdown_joins_idle_consumers() {
        let registry = registry();
        let queue: Arc<dyn WorkQueue> = Arc::new(InMemoryWorkQueue::new());
        let group = ConsumerGroup::spawn(
            3,
            queue,
            registry,
            Arc::new(EchoAnalyzer),
            Duration::from_secs(5),
        );

        tokio::time::timeout(Duration::from_secs(5), group.shutdown_and_join())
            .await
            .expect("consumers did not shut down in time");
    }
}
