//! IdGenerator port - ID 生成の抽象化
//!
//! IdGenerator は分散システムで使える ID を生成するためのインターフェースです。
//! テスト容易性のために、trait として抽象化しています。
//!
//! # 実装
//! - **UlidGenerator**: ULID ベース（本番用）

use ulid::Ulid;

use crate::domain::ids::JobId;
use crate::ports::Clock;

/// IdGenerator は分散システムで使える ID を生成
///
/// # Thread Safety
/// - `Send + Sync` を要求（複数スレッドから使える）
pub trait IdGenerator: Send + Sync {
    /// Job ID を生成
    fn generate_job_id(&self) -> JobId;
}

/// UlidGenerator は ULID ベースの ID 生成器
///
/// Clock を使って現在時刻ベースの ULID を生成します。
/// これにより、テスト時に FixedClock を使って決定的な ID を生成できます。
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_job_id(&self) -> JobId {
        let timestamp_ms = self.clock.now().timestamp_millis() as u64;
        let ulid = Ulid::from_parts(timestamp_ms, rand::random());
        JobId::from(ulid)
    }
}
