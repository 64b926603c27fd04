//! WorkQueue port - 分析リクエストの配送キュー
//!
//! 本番では durable queue（RabbitMQ など）が実装し、プロセス再起動を
//! 跨いで仕事が生き残ります。開発・テストでは `impls::InMemoryWorkQueue`
//! を使用します。
//!
//! # 設計原則
//! - キューはリクエストを運ぶだけ（状態は registry に保存）
//! - blocking pop（timeout 付き）
//! - 再配送・DLQ はキュー実装側の責務

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::AnalysisRequest;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("queue operation failed: {0}")]
    OperationFailed(String),
}

/// WorkQueue は分析リクエストを配送するためのキュー
#[async_trait]
pub trait WorkQueue: Send + Sync {
    /// リクエストをキューに追加
    async fn push(&self, request: AnalysisRequest) -> Result<(), QueueError>;

    /// リクエストを 1 件取り出す（timeout まで待つ。なければ None）
    async fn pop(&self, timeout: Duration) -> Result<Option<AnalysisRequest>, QueueError>;
}
