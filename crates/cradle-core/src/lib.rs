//! cradle-core
//!
//! 妊娠週数トラッカーのバックエンドコア：非同期ジョブ処理とコンテンツキャッシュ。
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, job, fingerprint, content, request）
//! - **ports**: 抽象化レイヤー（Clock, IdGenerator, WorkQueue, SharedCache,
//!   WorkDispatcher, FaceAnalyzer, ContentGenerator）
//! - **registry**: ジョブレジストリ（in-memory, fingerprint dedup, TTL 回収）
//! - **cache**: 2 段 read-through キャッシュ（L1 ローカル / L2 共有）
//! - **app**: アプリケーションロジック（service, consumer_loop, reaper_loop, warmup）
//! - **impls**: ports の in-memory 実装（開発・テスト用）
//!
//! # 設計原則
//! - 共有可変状態はレジストリとキャッシュ層だけに閉じる
//! - 外部サービス（画像解析・コンテンツ生成）は ports 経由の不透明な RPC
//! - バックグラウンドループは明示的な spawn / shutdown（watch channel）

pub mod app;
pub mod cache;
pub mod domain;
pub mod impls;
pub mod ports;
pub mod registry;
