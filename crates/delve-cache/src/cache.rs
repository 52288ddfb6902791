use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

use delve_types::Source;

/// Default entry lifetime: one hour.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// A cached answer for one normalized query.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub response: String,
    pub stored_at: Instant,
    pub ttl: Duration,
    pub sources: Option<Vec<Source>>,
    pub duration_ms: Option<u64>,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.stored_at) > self.ttl
    }
}

/// Hit/miss counters accumulated over the cache's lifetime. Reset only
/// by `clear()`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub total_queries: u64,
    pub hit_rate: f64,
}

impl CacheStats {
    fn recompute_hit_rate(&mut self) {
        if self.total_queries > 0 {
            self.hit_rate = self.hits as f64 / self.total_queries as f64;
        }
    }
}

struct Inner {
    entries: HashMap<String, CacheEntry>,
    stats: CacheStats,
}

/// In-memory response cache keyed by normalized question text.
///
/// Only the default (fast agent) mode reads or writes it. Keys are
/// case- and whitespace-insensitive, a deliberately coarse fuzzy match
/// with no semantic awareness. Expired entries are evicted lazily on
/// read and periodically by [`crate::CacheSweeper`].
///
/// The map is mutex-guarded so `get`/`set`/`cleanup` are safe across
/// threads; share the cache behind an `Arc`.
pub struct ResponseCache {
    inner: Mutex<Inner>,
    default_ttl: Duration,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl ResponseCache {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                stats: CacheStats::default(),
            }),
            default_ttl,
        }
    }

    /// Lowercase, trim, collapse internal whitespace runs to a single
    /// space. Queries differing only in case/whitespace share a key.
    fn normalize_query(query: &str) -> String {
        query
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Look up a query. Every call counts toward `total_queries`; an
    /// expired entry is evicted and counted as a miss.
    pub fn get(&self, query: &str) -> Option<CacheEntry> {
        let key = Self::normalize_query(query);
        let now = Instant::now();
        let mut inner = self.lock();

        inner.stats.total_queries += 1;

        let hit = match inner.entries.get(&key) {
            Some(entry) if entry.is_expired(now) => {
                inner.entries.remove(&key);
                None
            }
            Some(entry) => Some(entry.clone()),
            None => None,
        };

        if hit.is_some() {
            inner.stats.hits += 1;
        } else {
            inner.stats.misses += 1;
        }
        inner.stats.recompute_hit_rate();
        hit
    }

    /// Store or overwrite an entry with the current timestamp. Does not
    /// touch stats.
    pub fn set(
        &self,
        query: &str,
        response: impl Into<String>,
        sources: Option<Vec<Source>>,
        duration_ms: Option<u64>,
        ttl: Option<Duration>,
    ) {
        let key = Self::normalize_query(query);
        let entry = CacheEntry {
            response: response.into(),
            stored_at: Instant::now(),
            ttl: ttl.unwrap_or(self.default_ttl),
            sources,
            duration_ms,
        };
        self.lock().entries.insert(key, entry);
    }

    pub fn delete(&self, query: &str) -> bool {
        let key = Self::normalize_query(query);
        self.lock().entries.remove(&key).is_some()
    }

    /// Drop all entries and reset stats to zero.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.stats = CacheStats::default();
    }

    /// Sweep every expired entry, returning how many were evicted.
    pub fn cleanup(&self) -> usize {
        let now = Instant::now();
        let mut inner = self.lock();
        let before = inner.entries.len();
        inner.entries.retain(|_, entry| !entry.is_expired(now));
        let cleaned = before - inner.entries.len();
        if cleaned > 0 {
            tracing::debug!(cleaned, "evicted expired cache entries");
        }
        cleaned
    }

    pub fn size(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn stats(&self) -> CacheStats {
        self.lock().stats.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock means a panic while holding it; the map is
        // still structurally valid, so keep serving.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_then_get_before_ttl() {
        let cache = ResponseCache::default();
        cache.set("hello", "Hi there", None, Some(1200), None);

        let entry = cache.get("hello").unwrap();
        assert_eq!(entry.response, "Hi there");
        assert_eq!(entry.duration_ms, Some(1200));
    }

    #[test]
    fn test_key_normalization() {
        let cache = ResponseCache::default();
        cache.set("hello world", "r", None, None, None);

        assert!(cache.get("Hello  World").is_some());
        assert!(cache.get("  HELLO\tWORLD  ").is_some());
        assert_eq!(cache.size(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_counts_as_miss_and_evicts() {
        let cache = ResponseCache::new(Duration::from_secs(10));
        cache.set("q", "r", None, None, None);

        tokio::time::advance(Duration::from_secs(11)).await;

        assert!(cache.get("q").is_none());
        assert_eq!(cache.size(), 0);

        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 0);
    }

    #[test]
    fn test_stats_accumulation() {
        let cache = ResponseCache::default();
        cache.set("a", "r", None, None, None);

        cache.get("a");
        cache.get("a");
        cache.get("b");

        let stats = cache.stats();
        assert_eq!(stats.total_queries, 3);
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_hit_rate_zero_without_queries() {
        let cache = ResponseCache::default();
        assert_eq!(cache.stats().hit_rate, 0.0);
    }

    #[test]
    fn test_clear_resets_stats() {
        let cache = ResponseCache::default();
        cache.set("a", "r", None, None, None);
        cache.get("a");
        cache.clear();

        let stats = cache.stats();
        assert_eq!(stats.total_queries, 0);
        assert_eq!(stats.hits, 0);
        assert_eq!(cache.size(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_returns_evicted_count() {
        let cache = ResponseCache::new(Duration::from_secs(10));
        cache.set("a", "r", None, None, None);
        cache.set("b", "r", None, None, Some(Duration::from_secs(100)));

        tokio::time::advance(Duration::from_secs(11)).await;

        assert_eq!(cache.cleanup(), 1);
        assert_eq!(cache.size(), 1);
    }

    #[test]
    fn test_overwrite_replaces_wholesale() {
        let cache = ResponseCache::default();
        cache.set("q", "old", Some(vec![Source::new("t", "https://a.com")]), None, None);
        cache.set("q", "new", None, None, None);

        let entry = cache.get("q").unwrap();
        assert_eq!(entry.response, "new");
        assert!(entry.sources.is_none());
    }

    #[test]
    fn test_delete() {
        let cache = ResponseCache::default();
        cache.set("q", "r", None, None, None);
        assert!(cache.delete("Q"));
        assert!(!cache.delete("q"));
    }
}
