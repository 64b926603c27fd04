//! Impls - ports の実装（開発用・テスト用）
//!
//! # 含まれる実装
//! - **InMemoryWorkQueue**: 開発用の配送キュー
//! - **InMemorySharedCache**: 開発用の L2 キャッシュ
//! - **QueueDispatcher**: WorkQueue へ発行する投入経路（推奨）
//! - **PooledDispatcher**: bounded pool + caller-runs の投入経路（fallback）
//!
//! # 本番用実装
//! 本番用の実装は別クレートに配置します：
//! - RabbitMQ 実装の WorkQueue
//! - Redis 実装の SharedCache

pub mod inmem_queue;
pub mod memory_cache;
pub mod pooled_dispatch;
pub mod queue_dispatch;

pub use self::inmem_queue::InMemoryWorkQueue;
pub use self::memory_cache::InMemorySharedCache;
pub use self::pooled_dispatch::{PoolConfig, PooledDispatcher};
pub use self::queue_dispatch::QueueDispatcher;
