//! Startup warm-up: pre-load the whole key space into the cache.
//!
//! サーバ起動直後の全キー MISS を避けるため、全週を 1 回ずつロードする。
//! 各キーに jitter 付き TTL が適用されるので、ここで一括ロードしても
//! 失効は分散される（avalanche 防止）。

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::cache::TieredContentCache;

/// Delay between generator calls during warm-up (rate-limit protection).
pub const DEFAULT_WARMUP_DELAY: Duration = Duration::from_millis(200);

/// Spawn the warm-up pass; does not block startup.
///
/// Iterates the valid key space once, skipping weeks already present in
/// the shared tier (they survived the restart). Individual load failures
/// are logged and skipped; a missing week just stays a cold key.
/// Returns the number of freshly loaded weeks.
pub fn spawn_warmup(cache: Arc<TieredContentCache>, delay: Duration) -> JoinHandle<usize> {
    tokio::spawn(async move {
        let weeks = cache.valid_weeks();
        info!(
            from = *weeks.start(),
            to = *weeks.end(),
            "content warm-up started"
        );

        let mut loaded = 0;
        for week in weeks {
            if cache.has_shared(week).await {
                continue;
            }

            match cache.get_week_content(week).await {
                Ok(_) => loaded += 1,
                Err(err) => warn!(week, %err, "warm-up load failed"),
            }

            tokio::time::sleep(delay).await;
        }

        info!(loaded, "content warm-up finished");
        loaded
    })
}
