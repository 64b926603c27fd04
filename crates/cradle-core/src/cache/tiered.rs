//! Two-level read-through cache over the content generator.

use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache as LocalCache;
use rand::Rng;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::config::CacheConfig;
use crate::domain::WeekContent;
use crate::ports::{ContentGenerator, RemoteError, SharedCache};

/// Sentinel stored in the shared tier meaning "key confirmed invalid."
pub const NULL_MARKER: &str = "__NULL__";

const KEY_PREFIX: &str = "pregnancy:week:";

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("invalid pregnancy week: {0}")]
    InvalidWeek(u32),

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// Read-through cache for per-week content.
///
/// Lookup order per request:
/// 1. Penetration guard (invalid week → negative marker, reject)
/// 2. L1 local (sub-millisecond, no shared-tier round trip)
/// 3. L2 shared (source of truth across processes; populates L1)
/// 4. Miss → one `generate` call, write L2 (jittered TTL) + L1, return
///
/// L2 への書き込み失敗・直列化失敗はログだけ残して結果はそのまま返す
/// （現在のレスポンスの正しさ > キャッシュの population）。
pub struct TieredContentCache {
    local: LocalCache<u32, WeekContent>,
    shared: Arc<dyn SharedCache>,
    generator: Arc<dyn ContentGenerator>,
    config: CacheConfig,
}

impl TieredContentCache {
    pub fn new(
        shared: Arc<dyn SharedCache>,
        generator: Arc<dyn ContentGenerator>,
        config: CacheConfig,
    ) -> Self {
        let local = LocalCache::builder()
            .max_capacity(config.local_capacity)
            .time_to_live(config.local_ttl)
            .build();

        Self {
            local,
            shared,
            generator,
            config,
        }
    }

    pub fn valid_weeks(&self) -> RangeInclusive<u32> {
        self.config.valid_weeks.clone()
    }

    fn shared_key(week: u32) -> String {
        format!("{KEY_PREFIX}{week}")
    }

    /// Is this week already present in the shared tier? (Used by the
    /// warm-up pass to skip keys that survived a restart.)
    pub async fn has_shared(&self, week: u32) -> bool {
        match self.shared.exists(&Self::shared_key(week)).await {
            Ok(present) => present,
            Err(err) => {
                warn!(week, %err, "shared cache exists check failed");
                false
            }
        }
    }

    /// Resolve content for `week` through the tiers.
    pub async fn get_week_content(&self, week: u32) -> Result<WeekContent, ContentError> {
        // 1. Penetration guard: invalid keys never reach the generator.
        if !self.config.valid_weeks.contains(&week) {
            return self.reject_invalid(week).await;
        }

        // 2. L1
        if let Some(content) = self.local.get(&week).await {
            debug!(week, "L1 hit");
            return Ok(content);
        }

        // 3. L2
        let key = Self::shared_key(week);
        match self.shared.get(&key).await {
            Ok(Some(json)) => match serde_json::from_str::<WeekContent>(&json) {
                Ok(content) => {
                    debug!(week, "L2 hit");
                    self.local.insert(week, content.clone()).await;
                    return Ok(content);
                }
                Err(err) => {
                    warn!(week, %err, "L2 entry failed to deserialize, regenerating");
                }
            },
            Ok(None) => {}
            Err(err) => {
                warn!(week, %err, "shared cache read failed, falling through to generator");
            }
        }

        // 4. Miss: one remote call, no retry at this layer.
        info!(week, "cache miss, calling content generator");
        let content = self.generator.generate(week).await?;

        // 5. Avalanche defense: per-entry jittered TTL on the shared tier.
        let ttl = self.jittered_ttl();
        match serde_json::to_string(&content) {
            Ok(json) => {
                if let Err(err) = self.shared.set(&key, &json, ttl).await {
                    warn!(week, %err, "shared cache write failed");
                } else {
                    debug!(week, ttl_secs = ttl.as_secs(), "shared cache populated");
                }
            }
            Err(err) => {
                warn!(week, %err, "serialization failed, skipping shared cache write");
            }
        }

        self.local.insert(week, content.clone()).await;
        Ok(content)
    }

    /// Negative-marker path for keys outside the valid space.
    ///
    /// At most one shared-tier write per negative-TTL window; within the
    /// window, repeated probes cost a single shared-tier read each and
    /// never invoke the generator.
    async fn reject_invalid(&self, week: u32) -> Result<WeekContent, ContentError> {
        let key = Self::shared_key(week);
        match self.shared.get(&key).await {
            Ok(Some(marker)) if marker == NULL_MARKER => {
                debug!(week, "penetration block: null marker hit");
            }
            Ok(_) => {
                if let Err(err) = self
                    .shared
                    .set(&key, NULL_MARKER, self.config.negative_ttl)
                    .await
                {
                    warn!(week, %err, "failed to cache null marker");
                } else {
                    warn!(week, "invalid week requested, null marker cached");
                }
            }
            Err(err) => {
                warn!(week, %err, "shared cache read failed during penetration check");
            }
        }
        Err(ContentError::InvalidWeek(week))
    }

    fn jittered_ttl(&self) -> Duration {
        let jitter_secs = self.config.jitter_max.as_secs();
        let jitter = if jitter_secs == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=jitter_secs)
        };
        self.config.base_ttl + Duration::from_secs(jitter)
    }
}
