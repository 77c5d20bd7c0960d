//! Two-tier cache: bounded local map plus optional remote key-value tier.
//!
//! The cache is a performance layer, never a correctness dependency:
//! remote failures are logged and swallowed, and entries are never
//! served past their expiry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::traits::cache::RemoteCache;
use crate::types::config::CacheConfig;

struct LocalEntry {
    value: Value,
    expires_at: Instant,
    last_access: Instant,
}

/// Layered cache with write-through population of the local tier.
pub struct LayeredCache {
    config: CacheConfig,
    local: Mutex<HashMap<String, LocalEntry>>,
    remote: Option<Arc<dyn RemoteCache>>,
}

impl LayeredCache {
    /// Create a local-only cache.
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            local: Mutex::new(HashMap::new()),
            remote: None,
        }
    }

    /// Attach a remote tier.
    pub fn with_remote(mut self, remote: Arc<dyn RemoteCache>) -> Self {
        self.remote = Some(remote);
        self
    }

    /// The remote tier, if configured.
    pub fn remote(&self) -> Option<&Arc<dyn RemoteCache>> {
        self.remote.as_ref()
    }

    /// Look up a key: local tier first, then remote.
    ///
    /// A remote hit is written through into the local tier with the
    /// local TTL before being returned.
    pub async fn get(&self, key: &str) -> Option<Value> {
        if let Some(value) = self.get_local(key) {
            return Some(value);
        }

        if let Some(remote) = &self.remote {
            match remote.get(key).await {
                Ok(Some(raw)) => match serde_json::from_str::<Value>(&raw) {
                    Ok(value) => {
                        debug!(key, "remote cache hit, populating local tier");
                        self.set_local(key, value.clone());
                        return Some(value);
                    }
                    Err(err) => {
                        warn!(key, error = %err, "remote cache payload not decodable");
                    }
                },
                Ok(None) => {}
                Err(err) => {
                    warn!(key, error = %err, "remote cache read failed");
                }
            }
        }

        None
    }

    /// Store a value in both tiers.
    ///
    /// The local write always happens; the remote write is attempted
    /// with the remote TTL and failures are swallowed.
    pub async fn set(&self, key: &str, value: Value) {
        self.set_local(key, value.clone());

        if let Some(remote) = &self.remote {
            match serde_json::to_string(&value) {
                Ok(raw) => {
                    if let Err(err) = remote.set(key, &raw, self.config.remote_ttl).await {
                        warn!(key, error = %err, "remote cache write failed");
                    }
                }
                Err(err) => {
                    warn!(key, error = %err, "value not serializable for remote tier");
                }
            }
        }
    }

    /// Local-tier lookup; expired entries are deleted on sight.
    fn get_local(&self, key: &str) -> Option<Value> {
        let mut local = self.local.lock().unwrap();
        let now = Instant::now();
        match local.get_mut(key) {
            Some(entry) if now < entry.expires_at => {
                entry.last_access = now;
                Some(entry.value.clone())
            }
            Some(_) => {
                local.remove(key);
                None
            }
            None => None,
        }
    }

    /// Local-tier write with least-recently-accessed eviction on overflow.
    fn set_local(&self, key: &str, value: Value) {
        let now = Instant::now();
        let mut local = self.local.lock().unwrap();
        local.insert(
            key.to_string(),
            LocalEntry {
                value,
                expires_at: now + self.config.local_ttl,
                last_access: now,
            },
        );

        if local.len() > self.config.max_local_entries {
            if let Some(oldest) = local
                .iter()
                .min_by_key(|(_, entry)| entry.last_access)
                .map(|(key, _)| key.clone())
            {
                debug!(key = %oldest, "evicting least-recently-accessed entry");
                local.remove(&oldest);
            }
        }
    }

    /// Number of entries currently in the local tier.
    pub fn local_len(&self) -> usize {
        self.local.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryRemoteCache;
    use serde_json::json;
    use std::time::Duration;

    fn cache(local_ttl_secs: u64, max_entries: usize) -> LayeredCache {
        LayeredCache::new(CacheConfig {
            local_ttl: Duration::from_secs(local_ttl_secs),
            remote_ttl: Duration::from_secs(3600),
            max_local_entries: max_entries,
        })
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let cache = cache(5, 10);
        cache.set("k", json!("v")).await;
        assert_eq!(cache.get("k").await, Some(json!("v")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_local_entry_expires() {
        let cache = cache(5, 10);
        cache.set("k", json!("v")).await;

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.get("k").await, Some(json!("v")));

        tokio::time::advance(Duration::from_secs(4)).await;
        assert_eq!(cache.get("k").await, None);
        assert_eq!(cache.local_len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_eviction_removes_least_recently_accessed() {
        let cache = cache(60, 2);
        cache.set("a", json!(1)).await;
        tokio::time::advance(Duration::from_millis(10)).await;
        cache.set("b", json!(2)).await;
        tokio::time::advance(Duration::from_millis(10)).await;

        // Touch "a" so "b" becomes the eviction candidate.
        cache.get("a").await;
        tokio::time::advance(Duration::from_millis(10)).await;

        cache.set("c", json!(3)).await;
        assert_eq!(cache.local_len(), 2);
        assert_eq!(cache.get("b").await, None);
        assert_eq!(cache.get("a").await, Some(json!(1)));
        assert_eq!(cache.get("c").await, Some(json!(3)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_remote_hit_populates_local_tier() {
        let remote = Arc::new(MemoryRemoteCache::new());
        remote
            .set("k", "{\"from\":\"remote\"}", Duration::from_secs(3600))
            .await
            .unwrap();

        let cache = cache(60, 10).with_remote(remote.clone());
        assert_eq!(cache.get("k").await, Some(json!({"from": "remote"})));

        // Local tier now holds the value even if the remote forgets it.
        remote.clear();
        assert_eq!(cache.get("k").await, Some(json!({"from": "remote"})));
    }

    #[tokio::test]
    async fn test_remote_failures_are_swallowed() {
        let remote = Arc::new(MemoryRemoteCache::new().failing());
        let cache = cache(60, 10).with_remote(remote);

        cache.set("k", json!("v")).await;
        assert_eq!(cache.get("k").await, Some(json!("v")));
        assert_eq!(cache.get("missing").await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_local_miss_can_still_hit_remote_after_local_ttl() {
        let remote = Arc::new(MemoryRemoteCache::new());
        let cache = cache(5, 10).with_remote(remote);

        cache.set("k", json!("v")).await;
        tokio::time::advance(Duration::from_secs(6)).await;

        // Local expired, remote TTL (1h) still valid.
        assert_eq!(cache.get("k").await, Some(json!("v")));
    }
}
