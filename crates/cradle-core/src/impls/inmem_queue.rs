//! InMemoryWorkQueue - 開発用の配送キュー
//!
//! # 実装詳細
//! - VecDeque を Mutex で排他制御
//! - Condvar で push 時の通知
//! - Async での blocking 処理は spawn_blocking に逃がす
//!
//! 本番の durable queue と違いプロセス再起動で中身は消えます。

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use crate::domain::AnalysisRequest;
use crate::ports::{QueueError, WorkQueue};

/// In-memory work queue with blocking pop.
pub struct InMemoryWorkQueue {
    queue: Arc<Mutex<VecDeque<AnalysisRequest>>>,
    condvar: Arc<Condvar>,
}

impl InMemoryWorkQueue {
    pub fn new() -> Self {
        Self {
            queue: Arc::new(Mutex::new(VecDeque::new())),
            condvar: Arc::new(Condvar::new()),
        }
    }
}

impl Default for InMemoryWorkQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl WorkQueue for InMemoryWorkQueue {
    async fn push(&self, request: AnalysisRequest) -> Result<(), QueueError> {
        let queue = self.queue.clone();
        let condvar = self.condvar.clone();

        // spawn_blocking で同期処理を実行（async context で std Mutex を使うため）
        tokio::task::spawn_blocking(move || {
            let mut guard = queue
                .lock()
                .map_err(|e| QueueError::OperationFailed(format!("lock poisoned: {e}")))?;
            guard.push_back(request);

            // 待機中のスレッドに通知
            condvar.notify_one();
            Ok(())
        })
        .await
        .map_err(|e| QueueError::OperationFailed(format!("push failed: {e}")))?
    }

    /// Not cancellation-safe: the backing blocking task runs to
    /// completion even if the returned future is dropped, and a request
    /// it popped would be lost. Callers must await the future fully.
    async fn pop(&self, timeout: Duration) -> Result<Option<AnalysisRequest>, QueueError> {
        let queue = self.queue.clone();
        let condvar = self.condvar.clone();

        tokio::task::spawn_blocking(move || {
            let start = std::time::Instant::now();
            let mut guard = queue
                .lock()
                .map_err(|e| QueueError::OperationFailed(format!("lock poisoned: {e}")))?;
            loop {
                if let Some(request) = guard.pop_front() {
                    return Ok(Some(request));
                }

                let elapsed = start.elapsed();
                if elapsed >= timeout {
                    return Ok(None);
                }

                let remaining = timeout.saturating_sub(elapsed);
                let (new_guard, result) = condvar
                    .wait_timeout(guard, remaining)
                    .map_err(|e| QueueError::OperationFailed(format!("lock poisoned: {e}")))?;
                guard = new_guard;

                if result.timed_out() {
                    return Ok(guard.pop_front());
                }
            }
        })
        .await
        .map_err(|e| QueueError::OperationFailed(format!("pop failed: {e}")))?
    }
}
