//! Result cache behavior through the store

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use revsearch::CacheError;

use crate::common::*;

/// Backend that counts calls and always fails.
#[derive(Default)]
struct BrokenCache {
    calls: AtomicUsize,
}

impl CacheBackend for BrokenCache {
    fn get(&self, _key: &str, timeout: Duration) -> Result<Option<Vec<u8>>, CacheError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::Timeout(timeout))
    }

    fn set_with_expiry(
        &self,
        _key: &str,
        _value: Vec<u8>,
        _ttl: Duration,
        _timeout: Duration,
    ) -> Result<(), CacheError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::Unavailable("down".into()))
    }

    fn invalidate_prefix(&self, _prefix: &str, _timeout: Duration) -> Result<usize, CacheError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::Unavailable("down".into()))
    }
}

#[test]
fn repeated_search_is_served_from_cache() {
    let ts = TestStore::with_memory_cache(4);
    ts.store.add_feature("a", &axis(4, 0), Metadata::new()).unwrap();
    ts.store.add_feature("b", &[1.0, 0.2, 0.0, 0.0], Metadata::new()).unwrap();

    let first = ts.store.search_similar(&axis(4, 0), 5).unwrap();
    let cache = ts.cache.as_ref().unwrap();
    assert_eq!(cache.len(), 1);

    let second = ts.store.search_similar(&axis(4, 0), 5).unwrap();
    assert_eq!(first, second);
    assert_eq!(cache.len(), 1);
}

#[test]
fn different_k_uses_a_different_key() {
    let ts = TestStore::with_memory_cache(4);
    ts.store.add_feature("a", &axis(4, 0), Metadata::new()).unwrap();

    ts.store.search_similar(&axis(4, 0), 1).unwrap();
    ts.store.search_similar(&axis(4, 0), 2).unwrap();
    assert_eq!(ts.cache.as_ref().unwrap().len(), 2);
}

#[test]
fn mutation_invalidates_cached_results() {
    let ts = TestStore::with_memory_cache(4);
    ts.store.add_feature("a", &axis(4, 0), Metadata::new()).unwrap();
    let before = ts.store.search_similar(&axis(4, 0), 5).unwrap();
    assert_eq!(hit_ids(&before), vec!["a"]);

    ts.store.add_feature("a2", &axis(4, 0), Metadata::new()).unwrap();
    assert!(ts.cache.as_ref().unwrap().is_empty());
    let after_add = ts.store.search_similar(&axis(4, 0), 5).unwrap();
    assert_eq!(hit_ids(&after_add), vec!["a", "a2"]);

    ts.store.remove_features(&["a"]).unwrap();
    let after_remove = ts.store.search_similar(&axis(4, 0), 5).unwrap();
    assert_eq!(hit_ids(&after_remove), vec!["a2"]);
}

#[test]
fn failing_backend_never_surfaces_errors() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = StoreConfig::new(4, dir.path());
    config.cache.enabled = true;
    let broken = Arc::new(BrokenCache::default());
    let backend: Arc<dyn CacheBackend> = broken.clone();
    let store = VectorStore::open(config, Some(backend)).unwrap();

    store.add_feature("a", &axis(4, 0), Metadata::new()).unwrap();
    let hits = store.search_similar(&axis(4, 0), 3).unwrap();
    assert_eq!(hit_ids(&hits), vec!["a"]);
    store.remove_features(&["a"]).unwrap();
    assert!(store.search_similar(&axis(4, 0), 3).unwrap().is_empty());

    assert!(broken.calls.load(Ordering::SeqCst) > 0);
}

#[test]
fn backend_ignored_when_cache_disabled() {
    let dir = tempfile::tempdir().unwrap();
    let cache = Arc::new(MemoryCache::new());
    let backend: Arc<dyn CacheBackend> = cache.clone();
    let store = VectorStore::open(StoreConfig::new(4, dir.path()), Some(backend)).unwrap();

    store.add_feature("a", &axis(4, 0), Metadata::new()).unwrap();
    store.search_similar(&axis(4, 0), 3).unwrap();
    assert!(cache.is_empty());
    assert!(!store.stats().cache_enabled);
}
