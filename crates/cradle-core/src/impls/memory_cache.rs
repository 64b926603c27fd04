//! InMemorySharedCache - 開発用の L2 キャッシュ
//!
//! # 実装詳細
//! - HashMap を Mutex で排他制御
//! - TTL は lazy expiry（読み取り時に失効判定）
//!
//! 単一プロセス内でのみ共有されます。プロセスをまたぐ共有は
//! Redis 実装の SharedCache を使ってください。

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::ports::{CacheError, SharedCache};

struct Entry {
    value: String,
    expires_at: Instant,
}

/// In-memory shared cache with per-key TTL.
pub struct InMemorySharedCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl InMemorySharedCache {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Time left before `key` expires. None for absent or expired keys.
    /// Test-facing: lets TTL behavior be asserted without sleeping.
    pub fn remaining_ttl(&self, key: &str) -> Option<Duration> {
        let entries = self.entries.lock().ok()?;
        let entry = entries.get(key)?;
        entry.expires_at.checked_duration_since(Instant::now())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Entry>>, CacheError> {
        self.entries
            .lock()
            .map_err(|e| CacheError::Backend(format!("lock poisoned: {e}")))
    }
}

impl Default for InMemorySharedCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SharedCache for InMemorySharedCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut entries = self.lock()?;
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(Some(entry.value.clone())),
            Some(_) => {
                // 失効済みエントリは読み取り時に掃除する
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut entries = self.lock()?;
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        let mut entries = self.lock()?;
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(true),
            Some(_) => {
                entries.remove(key);
                Ok(false)
            }
            None => Ok(false),
        }
    }
}
