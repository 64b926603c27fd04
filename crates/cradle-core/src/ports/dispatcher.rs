//! WorkDispatcher port - 投入経路の抽象化
//!
//! 提出側は「この仕事をどこかに渡す」ことだけを知っていて、経路
//! （durable queue か bounded worker pool か）は実装が決めます。
//!
//! # 実装
//! - **QueueDispatcher**（推奨）: WorkQueue に発行して即 return
//! - **PooledDispatcher**（fallback）: bounded pool + caller-runs 飽和政策

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::AnalysisRequest;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("dispatch failed: {0}")]
    Failed(String),
}

/// WorkDispatcher は投入された仕事を処理経路へ渡す
///
/// # Contract
/// - 仕事の完了を待たずに return する（caller-runs 飽和時のみ例外で、
///   呼び出し側タスク上で同期実行される）
/// - 仕事を黙って捨てない: エラーを返すか、いつか必ず処理される
#[async_trait]
pub trait WorkDispatcher: Send + Sync {
    async fn dispatch(&self, request: AnalysisRequest) -> Result<(), DispatchError>;
}
