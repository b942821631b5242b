use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use crate::scoring::RankedItem;

pub const DEFAULT_SEARCH_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

struct CacheEntry {
    results: Vec<RankedItem>,
    expires_at: Instant,
}

/// In-process result cache keyed by normalized query text.
///
/// Deliberately ephemeral: a restart starts cold and the next searches
/// recompute. Writes that change ranking inputs call `invalidate_all`,
/// everything else ages out on the TTL.
#[derive(Clone)]
pub struct SearchCache {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
    ttl: Duration,
}

impl SearchCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub async fn get(&self, key: &str) -> Option<Vec<RankedItem>> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        if entry.expires_at <= Instant::now() {
            return None;
        }
        Some(entry.results.clone())
    }

    pub async fn put(&self, key: &str, results: Vec<RankedItem>) {
        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            CacheEntry {
                results,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    pub async fn invalidate_all(&self) {
        let mut entries = self.entries.write().await;
        entries.clear();
    }
}

impl Default for SearchCache {
    fn default() -> Self {
        Self::new(DEFAULT_SEARCH_CACHE_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_returns_what_was_put() {
        let cache = SearchCache::new(Duration::from_secs(60));
        assert!(cache.get("rust").await.is_none());

        cache.put("rust", vec![]).await;
        assert_eq!(cache.get("rust").await, Some(vec![]));
        assert!(cache.get("other").await.is_none());
    }

    #[tokio::test]
    async fn test_expired_entries_are_misses() {
        let cache = SearchCache::new(Duration::from_secs(0));
        cache.put("rust", vec![]).await;
        assert!(cache.get("rust").await.is_none());
    }

    #[tokio::test]
    async fn test_invalidate_all_clears_every_entry() {
        let cache = SearchCache::new(Duration::from_secs(60));
        cache.put("one", vec![]).await;
        cache.put("two", vec![]).await;

        cache.invalidate_all().await;
        assert!(cache.get("one").await.is_none());
        assert!(cache.get("two").await.is_none());
    }
}
