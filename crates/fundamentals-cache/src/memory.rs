//! In-memory cache implementation.

use async_trait::async_trait;
use chrono::Utc;
use fundamentals_core::DocumentCache;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// Cache entry with timestamp for TTL-based invalidation.
#[derive(Debug, Clone)]
struct CacheEntry {
    content: String,
    cached_at: chrono::DateTime<Utc>,
}

impl CacheEntry {
    fn new(content: &str) -> Self {
        Self {
            content: content.to_string(),
            cached_at: Utc::now(),
        }
    }

    fn is_stale(&self, ttl: Duration) -> bool {
        let age = Utc::now().signed_duration_since(self.cached_at);
        age > chrono::TimeDelta::from_std(ttl).unwrap_or(chrono::TimeDelta::MAX)
    }
}

/// URL-keyed in-memory document cache.
///
/// Documents are stored in an `RwLock`-protected `HashMap` and are lost when
/// the cache is dropped. With a TTL set, expired entries are treated as misses.
#[derive(Debug, Default)]
pub struct InMemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Option<Duration>,
}

impl InMemoryCache {
    /// Create a new empty in-memory cache without expiry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache whose entries expire after `ttl`.
    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: RwLock::default(),
            ttl: Some(ttl),
        }
    }

    /// Number of stored entries, including expired ones not yet invalidated.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns true if nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl DocumentCache for InMemoryCache {
    #[instrument(skip(self))]
    async fn get(&self, url: &str) -> Option<String> {
        let cache = self.entries.read().await;
        match cache.get(url) {
            Some(entry) if self.ttl.is_some_and(|ttl| entry.is_stale(ttl)) => {
                debug!("Cache entry expired");
                None
            }
            Some(entry) => {
                debug!("Cache hit");
                Some(entry.content.clone())
            }
            None => {
                debug!("Cache miss");
                None
            }
        }
    }

    #[instrument(skip(self, content), fields(bytes = content.len()))]
    async fn put(&self, url: &str, content: &str) {
        let mut cache = self.entries.write().await;
        cache.insert(url.to_string(), CacheEntry::new(content));
        debug!("Cached document");
    }

    #[instrument(skip(self))]
    async fn invalidate_stale(&self, ttl: Duration) -> usize {
        let mut cache = self.entries.write().await;
        let before = cache.len();
        cache.retain(|_, entry| !entry.is_stale(ttl));
        let removed = before - cache.len();

        if removed > 0 {
            debug!("Invalidated {} stale cache entries", removed);
        }
        removed
    }

    #[instrument(skip(self))]
    async fn clear(&self) {
        self.entries.write().await.clear();
        debug!("Cleared all cache entries");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://www.sec.gov/Archives/edgar/data/320193/000032019323000106/R2.htm";

    #[tokio::test]
    async fn test_memory_cache_roundtrip() {
        let cache = InMemoryCache::new();

        // Initially no data
        assert!(cache.get(URL).await.is_none());

        cache.put(URL, "<table></table>").await;
        assert_eq!(cache.get(URL).await.as_deref(), Some("<table></table>"));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_memory_cache_ttl_expiry() {
        let cache = InMemoryCache::with_ttl(Duration::from_millis(10));
        cache.put(URL, "body").await;

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(cache.get(URL).await.is_none());

        // Expired entries are still stored until invalidated
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.invalidate_stale(Duration::from_millis(10)).await, 1);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_memory_cache_invalidate_keeps_fresh() {
        let cache = InMemoryCache::new();
        cache.put(URL, "body").await;

        assert_eq!(cache.invalidate_stale(Duration::from_secs(3600)).await, 0);
        assert!(cache.get(URL).await.is_some());
    }

    #[tokio::test]
    async fn test_memory_cache_clear() {
        let cache = InMemoryCache::new();
        cache.put(URL, "a").await;
        cache.put("https://example.com/b", "b").await;

        cache.clear().await;
        assert!(cache.is_empty().await);
    }
}
