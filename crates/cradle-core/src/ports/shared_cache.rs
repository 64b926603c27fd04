//! SharedCache port - 共有キャッシュ（L2）の抽象化
//!
//! 本番では Redis が実装します（マルチプロセスで共有される
//! source of truth）。core は文字列 get/set/exists だけに依存し、
//! 値の直列化はキャッシュ層（`cache::TieredContentCache`）が行います。

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("shared cache backend error: {0}")]
    Backend(String),
}

/// SharedCache は TTL 付き文字列 KV ストア
#[async_trait]
pub trait SharedCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Set with per-entry TTL. The entry must expire on its own; callers
    /// rely on that for negative markers and jittered content TTLs.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    async fn exists(&self, key: &str) -> Result<bool, CacheError>;
}
