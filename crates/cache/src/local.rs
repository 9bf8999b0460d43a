//! In-process per-platform cache backed by DashMap for lock-free concurrent
//! access. Holds expensive-to-build values such as media indices.

use campaign_core::error::CampaignResult;
use campaign_core::types::{MediaIndex, Platform};
use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

struct CacheEntry<V> {
    value: Arc<V>,
    inserted_at: Instant,
}

/// Values keyed by platform, shared as `Arc<V>`. Entries live until
/// invalidated, or until `ttl` elapses when one is set.
pub struct PlatformCache<V> {
    store: DashMap<Platform, CacheEntry<V>>,
    ttl: Option<Duration>,
    name: &'static str,
}

/// Cache of media-library indices, one per platform folder.
pub type MediaIndexCache = PlatformCache<MediaIndex>;

impl<V> PlatformCache<V> {
    pub fn new(name: &'static str) -> Self {
        Self {
            store: DashMap::new(),
            ttl: None,
            name,
        }
    }

    pub fn with_ttl(name: &'static str, ttl: Duration) -> Self {
        Self {
            store: DashMap::new(),
            ttl: Some(ttl),
            name,
        }
    }

    /// TTL in seconds from configuration; `None` keeps entries indefinitely.
    pub fn from_ttl_secs(name: &'static str, ttl_secs: Option<u64>) -> Self {
        match ttl_secs {
            Some(secs) => Self::with_ttl(name, Duration::from_secs(secs)),
            None => Self::new(name),
        }
    }

    fn is_expired(&self, entry: &CacheEntry<V>) -> bool {
        self.ttl
            .is_some_and(|ttl| entry.inserted_at.elapsed() > ttl)
    }

    /// Get a cached value, returns None if expired or missing.
    pub fn get(&self, platform: &Platform) -> Option<Arc<V>> {
        let entry = match self.store.get(platform) {
            Some(entry) => entry,
            None => {
                metrics::counter!("cache.platform.miss", "cache" => self.name).increment(1);
                return None;
            }
        };
        if self.is_expired(&entry) {
            drop(entry);
            self.store.remove(platform);
            metrics::counter!("cache.platform.expired", "cache" => self.name).increment(1);
            metrics::counter!("cache.platform.miss", "cache" => self.name).increment(1);
            return None;
        }
        metrics::counter!("cache.platform.hit", "cache" => self.name).increment(1);
        Some(Arc::clone(&entry.value))
    }

    /// Insert or replace the value for a platform.
    pub fn insert(&self, platform: Platform, value: V) -> Arc<V> {
        let value = Arc::new(value);
        self.store.insert(
            platform,
            CacheEntry {
                value: Arc::clone(&value),
                inserted_at: Instant::now(),
            },
        );
        value
    }

    /// Return the cached value or build it with `loader`. A failed load is
    /// returned to the caller and nothing is cached. Concurrent loads for
    /// the same platform both run; the last one to finish wins.
    pub async fn get_or_load<F, Fut>(&self, platform: &Platform, loader: F) -> CampaignResult<Arc<V>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = CampaignResult<V>>,
    {
        if let Some(value) = self.get(platform) {
            return Ok(value);
        }
        debug!(cache = self.name, platform = %platform, "Loading cache entry");
        let value = loader().await?;
        Ok(self.insert(platform.clone(), value))
    }

    /// Drop one platform's entry so the next read rebuilds it.
    pub fn invalidate(&self, platform: &Platform) -> bool {
        let removed = self.store.remove(platform).is_some();
        if removed {
            metrics::counter!("cache.platform.invalidate", "cache" => self.name).increment(1);
            debug!(cache = self.name, platform = %platform, "Cache entry invalidated");
        }
        removed
    }

    pub fn invalidate_all(&self) -> usize {
        let count = self.store.len();
        self.store.clear();
        metrics::counter!("cache.platform.invalidate", "cache" => self.name).increment(count as u64);
        count
    }

    /// Remove expired entries.
    pub fn evict_expired(&self) -> usize {
        let before = self.store.len();
        if let Some(ttl) = self.ttl {
            self.store
                .retain(|_, entry| entry.inserted_at.elapsed() <= ttl);
        }
        before - self.store.len()
    }

    pub fn contains(&self, platform: &Platform) -> bool {
        self.store.contains_key(platform)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

impl<V> Default for PlatformCache<V> {
    fn default() -> Self {
        Self::new("platform")
    }
}
