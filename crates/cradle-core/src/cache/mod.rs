//! Tiered content cache: L1 local + L2 shared read-through cache.
//!
//! レート制限付きの遅いコンテンツ生成サービスを守るための 2 段キャッシュ。
//! 3 つの古典的なキャッシュ障害に対する防御を持ちます：
//! - **Penetration**: 不正キーは negative marker で即拒否
//! - **Hot key**: L1 ローカルキャッシュが単一キー集中を吸収
//! - **Avalanche**: L2 の TTL にランダム jitter を加えて一斉失効を分散

mod config;
mod tiered;

pub use config::CacheConfig;
pub use tiered::{ContentError, NULL_MARKER, TieredContentCache};
