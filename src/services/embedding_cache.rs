//! LRU+TTL cache for query embeddings, keyed by normalized query text
//! with LRU eviction and TTL expiry.
//!
//! A single `Mutex`-guarded `lru::LruCache` is the fine-grained lock the
//! spec allows ("or equivalent") — the critical section is a pointer swap
//! plus a capacity check, never I/O, so contention is negligible next to
//! the embedding-provider call it replaces.

use std::future::Future;
use std::num::NonZeroUsize;
use std::pin::Pin;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use lru::LruCache;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::utils::ScheduledTask;

struct CacheEntry {
    vector: Vec<f32>,
    inserted_at: Instant,
    hit_count: u64,
}

pub struct EmbeddingCache {
    inner: Mutex<LruCache<String, CacheEntry>>,
    ttl: Duration,
}

#[derive(Debug, Clone, Copy)]
pub struct CacheStats {
    pub len: usize,
    pub capacity: usize,
}

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Lowercase, strip punctuation, collapse whitespace — the same
/// normalization rule used as the cache key for every entry.
pub fn normalize_cache_key(query: &str) -> String {
    let lower = query.trim().to_lowercase();
    let no_punct = NON_WORD.replace_all(&lower, "");
    WHITESPACE.replace_all(&no_punct, " ").trim().to_string()
}

impl EmbeddingCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::new(1).unwrap());
        Self { inner: Mutex::new(LruCache::new(capacity)), ttl }
    }

    pub fn get(&self, query: &str) -> Option<Vec<f32>> {
        let key = normalize_cache_key(query);
        let mut guard = self.inner.lock().expect("embedding cache mutex poisoned");
        let expired = match guard.get(&key) {
            Some(entry) => entry.inserted_at.elapsed() > self.ttl,
            None => return None,
        };
        if expired {
            guard.pop(&key);
            return None;
        }
        let entry = guard.get_mut(&key)?;
        entry.hit_count += 1;
        Some(entry.vector.clone())
    }

    pub fn set(&self, query: &str, vector: Vec<f32>) {
        if vector.is_empty() {
            return;
        }
        let key = normalize_cache_key(query);
        let mut guard = self.inner.lock().expect("embedding cache mutex poisoned");
        guard.put(key, CacheEntry { vector, inserted_at: Instant::now(), hit_count: 0 });
    }

    /// Removes expired entries. Bounded by the current cache size, never
    /// blocking callers of `get`/`set` longer than that scan.
    pub fn sweep(&self) -> usize {
        let mut guard = self.inner.lock().expect("embedding cache mutex poisoned");
        let ttl = self.ttl;
        let expired_keys: Vec<String> = guard
            .iter()
            .filter(|(_, entry)| entry.inserted_at.elapsed() > ttl)
            .map(|(k, _)| k.clone())
            .collect();
        let removed = expired_keys.len();
        for key in expired_keys {
            guard.pop(&key);
        }
        removed
    }

    pub fn stats(&self) -> CacheStats {
        let guard = self.inner.lock().expect("embedding cache mutex poisoned");
        CacheStats { len: guard.len(), capacity: guard.cap().get() }
    }
}

/// Adapts [`EmbeddingCache::sweep`] to the process's periodic-task runner.
pub struct CacheSweepTask {
    cache: std::sync::Arc<EmbeddingCache>,
}

impl CacheSweepTask {
    pub fn new(cache: std::sync::Arc<EmbeddingCache>) -> Self {
        Self { cache }
    }
}

impl ScheduledTask for CacheSweepTask {
    fn run(&self) -> Pin<Box<dyn Future<Output = Result<(), anyhow::Error>> + Send + '_>> {
        Box::pin(async move {
            let removed = self.cache.sweep();
            if removed > 0 {
                tracing::debug!(removed, "swept expired embedding cache entries");
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_within_ttl_returns_vector() {
        let cache = EmbeddingCache::new(10, Duration::from_secs(60));
        cache.set("Find mechanical engineers", vec![1.0, 2.0, 3.0]);
        assert_eq!(cache.get("find mechanical engineers"), Some(vec![1.0, 2.0, 3.0]));
    }

    #[test]
    fn empty_vector_is_not_cached() {
        let cache = EmbeddingCache::new(10, Duration::from_secs(60));
        cache.set("anything", vec![]);
        assert_eq!(cache.get("anything"), None);
    }

    #[test]
    fn get_after_ttl_is_a_miss() {
        let cache = EmbeddingCache::new(10, Duration::from_millis(1));
        cache.set("query", vec![1.0]);
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.get("query"), None);
    }

    #[test]
    fn evicts_oldest_when_over_capacity() {
        let cache = EmbeddingCache::new(1, Duration::from_secs(60));
        cache.set("first", vec![1.0]);
        cache.set("second", vec![2.0]);
        assert_eq!(cache.get("first"), None);
        assert_eq!(cache.get("second"), Some(vec![2.0]));
    }

    #[test]
    fn normalization_collapses_punctuation_and_case() {
        assert_eq!(normalize_cache_key("  Find, Mechanical!  Engineers  "), "find mechanical engineers");
    }

    #[test]
    fn sweep_removes_only_expired_entries() {
        let cache = EmbeddingCache::new(10, Duration::from_millis(5));
        cache.set("stale", vec![1.0]);
        std::thread::sleep(Duration::from_millis(10));
        cache.set("fresh", vec![2.0]);
        let removed = cache.sweep();
        assert_eq!(removed, 1);
        assert_eq!(cache.stats().len, 1);
    }
}
