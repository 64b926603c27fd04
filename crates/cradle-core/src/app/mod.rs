//! App - アプリケーション層
//!
//! このモジュールは、ports と registry / cache を組み合わせて
//! アプリケーションロジックを実装します。
//!
//! # 主要コンポーネント
//! - **ImageJobService**: 提出・ポーリング・結果取得・完了報告の表面
//! - **ConsumerGroup**: キュー消費ループ（pop→markProcessing→analyze→report）
//! - **Reaper**: レジストリの TTL 回収ループ
//! - **warmup**: 起動時のキャッシュ事前ロード

pub mod consumer_loop;
pub mod reaper_loop;
pub mod service;
pub mod warmup;

pub use self::consumer_loop::{ConsumerGroup, process_request};
pub use self::reaper_loop::Reaper;
pub use self::service::ImageJobService;
pub use self::warmup::spawn_warmup;
