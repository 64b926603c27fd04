//! Reaper loop: periodic TTL eviction for the job registry.
//!
//! Result payloads are image bytes held by strong references in the job
//! map; without an explicit sweep they live forever. The reaper evicts
//! records older than the registry's retention window (and their
//! fingerprint index entries) on a fixed period.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::info;

use crate::registry::JobRegistry;

/// Default sweep period (the retention window lives on the registry).
pub const DEFAULT_REAP_PERIOD: Duration = Duration::from_secs(60);

/// Background reaper handle with explicit start/shutdown.
pub struct Reaper {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl Reaper {
    /// Spawn the sweep loop. Eviction and index cleanup happen inside
    /// the registry's lock, so an in-flight `complete`/`fail` for the
    /// same id can never interleave with removal.
    pub fn spawn(registry: Arc<JobRegistry>, period: Duration) -> Self {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let join = tokio::spawn(async move {
            let retention = registry.config().retention;
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = registry.reap_older_than(retention).await;
                        if removed > 0 {
                            let live = registry.job_count().await;
                            info!(removed, live, "expired jobs evicted");
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
        });

        Self { shutdown_tx, join }
    }

    pub fn request_shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    pub async fn shutdown_and_join(self) {
        self.request_shutdown();
        let _ = self.join.await;
    }
}
