//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! 各 trait は外部システム（メッセージキュー、共有キャッシュ、リモート
//! AI サービスなど）へのインターフェースを提供し、実装の詳細を隠蔽します。
//!
//! # 設計原則
//! - リモート呼び出しは 1 回の不透明な RPC（内部リトライなし）
//! - 再配送ポリシーはキュー側の責務（core は関与しない）
//! - in-memory 実装は `impls`、本番実装（Redis / RabbitMQ / HTTP）は
//!   別クレートに配置する想定

pub mod clock;
pub mod dispatcher;
pub mod id_generator;
pub mod remote;
pub mod shared_cache;
pub mod work_queue;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::dispatcher::{DispatchError, WorkDispatcher};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::remote::{ContentGenerator, FaceAnalyzer, RemoteError};
pub use self::shared_cache::{CacheError, SharedCache};
pub use self::work_queue::{QueueError, WorkQueue};
