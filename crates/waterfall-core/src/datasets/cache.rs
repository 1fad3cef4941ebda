//! Explicit dataset cache.
//!
//! Values are fetched once per key and reused until invalidated or, when a
//! max age is set, until they go stale. Invalidation contract:
//! - `invalidate(key)` drops one entry; the next `get_or_fetch` refetches.
//! - `refresh(key, ..)` refetches unconditionally and replaces the entry.
//! - `invalidate_all()` empties the cache.
//! - A failed fetch never touches the cache.

use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;
use tracing::debug;

use crate::WaterfallResult;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct DatasetCache<V> {
    entries: BTreeMap<String, CacheEntry<V>>,
    max_age: Option<Duration>,
}

impl<V> Default for DatasetCache<V> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            max_age: None,
        }
    }
}

impl<V: Clone> DatasetCache<V> {
    /// Cache whose entries never expire on their own.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_age(max_age: Duration) -> Self {
        Self {
            entries: BTreeMap::new(),
            max_age: Some(max_age),
        }
    }

    /// Cached value if present and fresh, otherwise fetch, store and return.
    pub fn get_or_fetch<F>(&mut self, key: &str, fetch: F) -> WaterfallResult<V>
    where
        F: FnOnce() -> WaterfallResult<V>,
    {
        self.get_or_fetch_at(key, Utc::now(), fetch)
    }

    /// Fetch unconditionally and replace whatever was cached.
    pub fn refresh<F>(&mut self, key: &str, fetch: F) -> WaterfallResult<V>
    where
        F: FnOnce() -> WaterfallResult<V>,
    {
        self.refresh_at(key, Utc::now(), fetch)
    }

    /// Fresh cached value, if any.
    pub fn get(&self, key: &str) -> Option<&V> {
        self.fresh_entry(key, Utc::now()).map(|e| &e.value)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: V) {
        self.insert_at(key.into(), value, Utc::now());
    }

    pub fn fetched_at(&self, key: &str) -> Option<DateTime<Utc>> {
        self.entries.get(key).map(|e| e.fetched_at)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Drop one entry. Returns whether anything was cached under `key`.
    pub fn invalidate(&mut self, key: &str) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            debug!(key, "cache entry invalidated");
        }
        removed
    }

    /// Drop every entry whose key satisfies `pred`. Returns how many went.
    pub fn invalidate_matching<P>(&mut self, mut pred: P) -> usize
    where
        P: FnMut(&str) -> bool,
    {
        let before = self.entries.len();
        self.entries.retain(|k, _| !pred(k));
        before - self.entries.len()
    }

    pub fn invalidate_all(&mut self) {
        debug!(entries = self.entries.len(), "cache cleared");
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // -----------------------------------------------------------------------
    // Clock-explicit internals
    // -----------------------------------------------------------------------

    fn is_fresh(&self, entry: &CacheEntry<V>, now: DateTime<Utc>) -> bool {
        match self.max_age {
            Some(max_age) => now - entry.fetched_at <= max_age,
            None => true,
        }
    }

    fn fresh_entry(&self, key: &str, now: DateTime<Utc>) -> Option<&CacheEntry<V>> {
        self.entries
            .get(key)
            .filter(|entry| self.is_fresh(entry, now))
    }

    fn insert_at(&mut self, key: String, value: V, now: DateTime<Utc>) {
        self.entries.insert(
            key,
            CacheEntry {
                value,
                fetched_at: now,
            },
        );
    }

    fn get_or_fetch_at<F>(&mut self, key: &str, now: DateTime<Utc>, fetch: F) -> WaterfallResult<V>
    where
        F: FnOnce() -> WaterfallResult<V>,
    {
        if let Some(entry) = self.fresh_entry(key, now) {
            debug!(key, "cache hit");
            return Ok(entry.value.clone());
        }
        self.refresh_at(key, now, fetch)
    }

    fn refresh_at<F>(&mut self, key: &str, now: DateTime<Utc>, fetch: F) -> WaterfallResult<V>
    where
        F: FnOnce() -> WaterfallResult<V>,
    {
        let value = fetch()?;
        debug!(key, "cache miss, fetched");
        self.insert_at(key.to_string(), value.clone(), now);
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WaterfallError;
    use std::cell::Cell;

    #[test]
    fn test_fetches_once() {
        let calls = Cell::new(0);
        let mut cache: DatasetCache<u32> = DatasetCache::new();
        let fetch = || -> WaterfallResult<u32> {
            calls.set(calls.get() + 1);
            Ok(7)
        };
        assert_eq!(cache.get_or_fetch("ds", fetch).unwrap(), 7);
        assert_eq!(cache.get_or_fetch("ds", fetch).unwrap(), 7);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_invalidate_forces_refetch() {
        let calls = Cell::new(0);
        let mut cache: DatasetCache<u32> = DatasetCache::new();
        let fetch = || -> WaterfallResult<u32> {
            calls.set(calls.get() + 1);
            Ok(calls.get())
        };
        assert_eq!(cache.get_or_fetch("ds", fetch).unwrap(), 1);
        assert!(cache.invalidate("ds"));
        assert!(!cache.invalidate("ds"));
        assert_eq!(cache.get_or_fetch("ds", fetch).unwrap(), 2);
    }

    #[test]
    fn test_refresh_replaces_value() {
        let mut cache: DatasetCache<&str> = DatasetCache::new();
        cache.insert("ds", "old");
        assert_eq!(cache.refresh("ds", || Ok("new")).unwrap(), "new");
        assert_eq!(cache.get("ds"), Some(&"new"));
    }

    #[test]
    fn test_failed_fetch_leaves_cache_untouched() {
        let mut cache: DatasetCache<u32> = DatasetCache::new();
        cache.insert("ds", 1);
        let res = cache.refresh("ds", || Err(WaterfallError::ProviderError("down".into())));
        assert!(res.is_err());
        assert_eq!(cache.get("ds"), Some(&1));

        let res = cache.get_or_fetch("other", || {
            Err(WaterfallError::ProviderError("down".into()))
        });
        assert!(res.is_err());
        assert!(!cache.contains("other"));
    }

    #[test]
    fn test_stale_entries_refetched() {
        let mut cache: DatasetCache<u32> = DatasetCache::with_max_age(Duration::minutes(5));
        let t0 = Utc::now();
        cache.get_or_fetch_at("ds", t0, || Ok(1)).unwrap();

        let fresh = cache
            .get_or_fetch_at("ds", t0 + Duration::minutes(4), || Ok(2))
            .unwrap();
        assert_eq!(fresh, 1);

        let stale = cache
            .get_or_fetch_at("ds", t0 + Duration::minutes(6), || Ok(3))
            .unwrap();
        assert_eq!(stale, 3);
        assert_eq!(cache.fetched_at("ds"), Some(t0 + Duration::minutes(6)));
    }

    #[test]
    fn test_invalidate_matching_and_all() {
        let mut cache: DatasetCache<u32> = DatasetCache::new();
        cache.insert("loans", 1);
        cache.insert("loans?kind=consumer", 2);
        cache.insert("other", 3);
        assert_eq!(cache.invalidate_matching(|k| k.starts_with("loans")), 2);
        assert_eq!(cache.len(), 1);
        cache.invalidate_all();
        assert!(cache.is_empty());
    }
}
