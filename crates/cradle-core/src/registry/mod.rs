//! Job registry: in-memory job store with fingerprint deduplication.
//!
//! 遅い外部計算（30 秒超の画像ブレンド）をポーリング型の非同期ジョブに
//! 変換するための中核。job map と fingerprint index は単一の Mutex の
//! 下にあり、per-id の更新と dedup 登録は常にアトミックです。

mod policy;
mod store;

pub use policy::{RegistryConfig, ResultPolicy};
pub use store::{JobCounts, JobRegistry, ResultFetch};
