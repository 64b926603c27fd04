//! PooledDispatcher - bounded worker pool with caller-runs overflow
//!
//! キューを持たない構成での fallback 投入経路。bounded channel を
//! N 個のワーカーで消費し、channel が満杯のときは呼び出し側の
//! タスク上でそのまま処理します（caller-runs）。提出側が遅くなる
//! ことで自然なバックプレッシャーになり、リクエストは捨てません。

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::app::process_request;
use crate::domain::AnalysisRequest;
use crate::ports::{DispatchError, FaceAnalyzer, WorkDispatcher};
use crate::registry::JobRegistry;

/// Worker pool sizing.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Number of concurrent workers.
    pub workers: usize,

    /// Bounded backlog in front of the workers. Beyond this, dispatch
    /// runs the request on the caller's task.
    pub queue_capacity: usize,

    /// Upper bound on one remote analyze call.
    pub call_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: 5,
            queue_capacity: 25,
            call_timeout: Duration::from_secs(60),
        }
    }
}

/// In-process dispatcher: bounded channel + worker pool.
pub struct PooledDispatcher {
    tx: mpsc::Sender<AnalysisRequest>,
    registry: Arc<JobRegistry>,
    analyzer: Arc<dyn FaceAnalyzer>,
    call_timeout: Duration,
    joins: Vec<JoinHandle<()>>,
}

impl PooledDispatcher {
    pub fn spawn(
        registry: Arc<JobRegistry>,
        analyzer: Arc<dyn FaceAnalyzer>,
        config: PoolConfig,
    ) -> Self {
        let (tx, rx) = mpsc::channel::<AnalysisRequest>(config.queue_capacity);
        // 複数ワーカーで 1 本の receiver を共有する
        let rx = Arc::new(Mutex::new(rx));

        let mut joins = Vec::with_capacity(config.workers);
        for worker_id in 0..config.workers {
            let rx = Arc::clone(&rx);
            let reg = Arc::clone(&registry);
            let an = Arc::clone(&analyzer);
            let call_timeout = config.call_timeout;

            let join = tokio::spawn(async move {
                info!(worker_id, "pool worker started");
                loop {
                    let request = {
                        let mut guard = rx.lock().await;
                        guard.recv().await
                    };
                    let Some(request) = request else {
                        // sender dropped: pool is shutting down
                        break;
                    };
                    process_request(&reg, an.as_ref(), call_timeout, request).await;
                }
                info!(worker_id, "pool worker stopped");
            });
            joins.push(join);
        }

        Self {
            tx,
            registry,
            analyzer,
            call_timeout: config.call_timeout,
            joins,
        }
    }

    /// Drop the sender and wait for the workers to drain the backlog.
    pub async fn shutdown_and_join(self) {
        drop(self.tx);
        for j in self.joins {
            let _ = j.await;
        }
    }
}

#[async_trait::async_trait]
impl WorkDispatcher for PooledDispatcher {
    async fn dispatch(&self, request: AnalysisRequest) -> Result<(), DispatchError> {
        match self.tx.try_send(request) {
            Ok(()) => {
                debug!("request handed to pool");
                Ok(())
            }
            Err(mpsc::error::TrySendError::Full(request)) => {
                // Caller-runs: 満杯時は提出側のタスクで処理して送り返す
                warn!(job_id = %request.job_id, "pool saturated, running on caller task");
                process_request(
                    &self.registry,
                    self.analyzer.as_ref(),
                    self.call_timeout,
                    request,
                )
                .await;
                Ok(())
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                Err(DispatchError::Failed("worker pool is shut down".into()))
            }
        }
    }
}
