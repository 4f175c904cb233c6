//! TTL cache of shared in-flight futures
//!
//! Each entry pairs a [`Shared`] future with its creation time. Concurrent
//! readers of the same key clone the same future, so at most one underlying
//! computation runs per key per TTL window and every reader observes the
//! same eventual value or the same eventual failure. Validity is checked
//! lazily on read; there is no eviction thread. Entries are replaced whole,
//! never mutated in place.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use futures::future::{BoxFuture, Shared};

/// A cached value: the shared future producing it plus its creation time
pub struct CacheEntry<V: Clone> {
    pub value: Shared<BoxFuture<'static, V>>,
    pub created_at: Instant,
}

impl<V: Clone> Clone for CacheEntry<V> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            created_at: self.created_at,
        }
    }
}

impl<V: Clone> CacheEntry<V> {
    /// An entry is valid while its age stays under the cache TTL
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.created_at.elapsed() < ttl
    }
}

pub struct TtlCache<K, V: Clone> {
    entries: Mutex<HashMap<K, CacheEntry<V>>>,
    ttl: Duration,
}

impl<K: Eq + Hash + Clone, V: Clone> TtlCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    fn lock_entries(&self) -> MutexGuard<'_, HashMap<K, CacheEntry<V>>> {
        self.entries.lock().expect("cache mutex poisoned")
    }

    /// Returns the entry for `key` if present and still fresh
    pub fn get(&self, key: &K) -> Option<CacheEntry<V>> {
        let entries = self.lock_entries();
        entries.get(key).filter(|e| e.is_fresh(self.ttl)).cloned()
    }

    /// Returns the fresh entry for `key`, or replaces a missing or stale one
    /// with a new entry built from `make`. A stale entry is discarded, never
    /// reused.
    pub fn get_or_insert_with(
        &self,
        key: &K,
        make: impl FnOnce() -> Shared<BoxFuture<'static, V>>,
    ) -> CacheEntry<V> {
        let mut entries = self.lock_entries();
        if let Some(entry) = entries.get(key)
            && entry.is_fresh(self.ttl)
        {
            return entry.clone();
        }
        let entry = CacheEntry {
            value: make(),
            created_at: Instant::now(),
        };
        entries.insert(key.clone(), entry.clone());
        entry
    }

    /// Removes the entry for `key`, but only if it is still the generation
    /// the caller observed. A failed fetch must not evict the replacement a
    /// later caller already installed.
    pub fn invalidate(&self, key: &K, created_at: Instant) {
        let mut entries = self.lock_entries();
        if entries.get(key).is_some_and(|e| e.created_at == created_at) {
            entries.remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures::FutureExt;

    fn counting_future(
        counter: &Arc<AtomicUsize>,
        value: u32,
    ) -> Shared<BoxFuture<'static, u32>> {
        counter.fetch_add(1, Ordering::SeqCst);
        async move { value }.boxed().shared()
    }

    #[tokio::test]
    async fn repeated_reads_within_ttl_share_one_future() {
        let cache: TtlCache<String, u32> = TtlCache::new(Duration::from_secs(60));
        let builds = Arc::new(AtomicUsize::new(0));
        let key = "lodash".to_string();

        let first = cache.get_or_insert_with(&key, || counting_future(&builds, 42));
        let second = cache.get_or_insert_with(&key, || counting_future(&builds, 99));

        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert_eq!(first.value.clone().await, 42);
        assert_eq!(second.value.clone().await, 42);
    }

    #[tokio::test]
    async fn stale_entry_is_replaced_not_reused() {
        let cache: TtlCache<String, u32> = TtlCache::new(Duration::from_millis(10));
        let builds = Arc::new(AtomicUsize::new(0));
        let key = "lodash".to_string();

        cache.get_or_insert_with(&key, || counting_future(&builds, 1));
        tokio::time::sleep(Duration::from_millis(20)).await;
        let replacement = cache.get_or_insert_with(&key, || counting_future(&builds, 2));

        assert_eq!(builds.load(Ordering::SeqCst), 2);
        assert_eq!(replacement.value.clone().await, 2);
    }

    #[tokio::test]
    async fn get_skips_stale_entries() {
        let cache: TtlCache<String, u32> = TtlCache::new(Duration::from_millis(10));
        let builds = Arc::new(AtomicUsize::new(0));
        let key = "lodash".to_string();

        cache.get_or_insert_with(&key, || counting_future(&builds, 1));
        assert!(cache.get(&key).is_some());

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(cache.get(&key).is_none());
    }

    #[tokio::test]
    async fn invalidate_removes_the_observed_generation() {
        let cache: TtlCache<String, u32> = TtlCache::new(Duration::from_secs(60));
        let builds = Arc::new(AtomicUsize::new(0));
        let key = "lodash".to_string();

        let entry = cache.get_or_insert_with(&key, || counting_future(&builds, 1));
        cache.invalidate(&key, entry.created_at);

        assert!(cache.get(&key).is_none());
        cache.get_or_insert_with(&key, || counting_future(&builds, 2));
        assert_eq!(builds.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn invalidate_leaves_a_newer_generation_in_place() {
        let cache: TtlCache<String, u32> = TtlCache::new(Duration::from_millis(10));
        let builds = Arc::new(AtomicUsize::new(0));
        let key = "lodash".to_string();

        let stale = cache.get_or_insert_with(&key, || counting_future(&builds, 1));
        tokio::time::sleep(Duration::from_millis(20)).await;
        let fresh = cache.get_or_insert_with(&key, || counting_future(&builds, 2));

        // A caller holding the stale generation must not evict the fresh one
        cache.invalidate(&key, stale.created_at);
        let current = cache.get(&key).expect("fresh entry evicted");
        assert_eq!(current.created_at, fresh.created_at);
        assert_eq!(current.value.clone().await, 2);
    }

    #[tokio::test]
    async fn distinct_keys_hold_distinct_entries() {
        let cache: TtlCache<String, u32> = TtlCache::new(Duration::from_secs(60));
        let builds = Arc::new(AtomicUsize::new(0));

        let a = cache.get_or_insert_with(&"a".to_string(), || counting_future(&builds, 1));
        let b = cache.get_or_insert_with(&"b".to_string(), || counting_future(&builds, 2));

        assert_eq!(builds.load(Ordering::SeqCst), 2);
        assert_eq!(a.value.clone().await, 1);
        assert_eq!(b.value.clone().await, 2);
    }
}
