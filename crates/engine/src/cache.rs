//! Search result cache (cache-aside, best-effort)
//!
//! `ResultCache` memoizes filtered search results keyed by
//! `search:{generation}:{xxh3(query)}:{k}`. Every mutation bumps the
//! generation, so stale results become unreachable even if the backend's
//! prefix invalidation fails; the old keys then age out through their TTL.
//!
//! Backend failures never reach the caller: they are logged and treated
//! as a miss.

use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use dashmap::DashMap;
use revsearch_core::{CacheConfig, SearchHit};
use thiserror::Error;
use tracing::{debug, warn};
use xxhash_rust::xxh3::xxh3_64;

/// Prefix shared by every search result key
pub const SEARCH_KEY_PREFIX: &str = "search:";

/// Errors a cache backend may report
#[derive(Debug, Error)]
pub enum CacheError {
    /// Backend unreachable or refused the request
    #[error("Cache unavailable: {0}")]
    Unavailable(String),

    /// Round-trip exceeded the configured bound
    #[error("Cache operation timed out after {0:?}")]
    Timeout(Duration),
}

/// Key/value store used to memoize search results
///
/// Implementations must bound every call by `timeout` and report
/// `CacheError::Timeout` when it is exceeded.
pub trait CacheBackend: Send + Sync {
    /// Fetch a value; `Ok(None)` on miss or expiry
    fn get(&self, key: &str, timeout: Duration) -> Result<Option<Vec<u8>>, CacheError>;

    /// Store a value that expires after `ttl`
    fn set_with_expiry(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Duration,
        timeout: Duration,
    ) -> Result<(), CacheError>;

    /// Drop every key starting with `prefix`, returning how many were removed
    fn invalidate_prefix(&self, prefix: &str, timeout: Duration) -> Result<usize, CacheError>;
}

/// Backend that caches nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCache;

impl CacheBackend for NoopCache {
    fn get(&self, _key: &str, _timeout: Duration) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(None)
    }

    fn set_with_expiry(
        &self,
        _key: &str,
        _value: Vec<u8>,
        _ttl: Duration,
        _timeout: Duration,
    ) -> Result<(), CacheError> {
        Ok(())
    }

    fn invalidate_prefix(&self, _prefix: &str, _timeout: Duration) -> Result<usize, CacheError> {
        Ok(0)
    }
}

struct CachedValue {
    bytes: Vec<u8>,
    expires_at: Instant,
}

/// In-process backend with lazy TTL expiry
///
/// Expired entries are dropped when read or when a prefix invalidation
/// sweeps the map.
#[derive(Default)]
pub struct MemoryCache {
    entries: DashMap<String, CachedValue>,
}

impl MemoryCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) entries
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.iter().filter(|e| e.expires_at > now).count()
    }

    /// Check if there are no live entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheBackend for MemoryCache {
    fn get(&self, key: &str, _timeout: Duration) -> Result<Option<Vec<u8>>, CacheError> {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(key) {
            if entry.expires_at > now {
                return Ok(Some(entry.bytes.clone()));
            }
        }
        self.entries.remove_if(key, |_, v| v.expires_at <= now);
        Ok(None)
    }

    fn set_with_expiry(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Duration,
        _timeout: Duration,
    ) -> Result<(), CacheError> {
        self.entries.insert(
            key.to_string(),
            CachedValue {
                bytes: value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    fn invalidate_prefix(&self, prefix: &str, _timeout: Duration) -> Result<usize, CacheError> {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries
            .retain(|key, value| !key.starts_with(prefix) && value.expires_at > now);
        Ok(before - self.entries.len())
    }
}

/// Cache-aside adapter between the store and a backend
pub struct ResultCache {
    backend: Option<Arc<dyn CacheBackend>>,
    ttl: Duration,
    timeout: Duration,
    generation: u64,
}

impl ResultCache {
    /// Build from config; `backend` is ignored unless `config.enabled`
    pub fn new(backend: Option<Arc<dyn CacheBackend>>, config: &CacheConfig) -> Self {
        ResultCache {
            backend: if config.enabled { backend } else { None },
            ttl: config.ttl(),
            timeout: config.timeout(),
            generation: initial_generation(),
        }
    }

    /// Whether a backend is attached
    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    /// Current key generation
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Key for a normalized query and k
    pub fn key(&self, query: &[f32], k: usize) -> String {
        let bytes: Vec<u8> = query.iter().flat_map(|x| x.to_le_bytes()).collect();
        format!(
            "{}{}:{:016x}:{}",
            SEARCH_KEY_PREFIX,
            self.generation,
            xxh3_64(&bytes),
            k
        )
    }

    /// Cached results for this query, if any
    pub fn lookup(&self, query: &[f32], k: usize) -> Option<Vec<SearchHit>> {
        let backend = self.backend.as_ref()?;
        let key = self.key(query, k);
        let started = Instant::now();

        let bytes = match backend.get(&key, self.timeout) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                self.note_latency("get", started);
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Cache lookup failed, treating as miss");
                return None;
            }
        };
        self.note_latency("get", started);

        match rmp_serde::from_slice::<Vec<SearchHit>>(&bytes) {
            Ok(hits) => {
                debug!(key = %key, hits = hits.len(), "Search served from cache");
                Some(hits)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Undecodable cache entry, treating as miss");
                None
            }
        }
    }

    /// Remember results for this query
    pub fn store(&self, query: &[f32], k: usize, hits: &[SearchHit]) {
        let Some(backend) = self.backend.as_ref() else {
            return;
        };
        let bytes = match rmp_serde::to_vec(hits) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "Failed to encode search results for cache");
                return;
            }
        };
        let started = Instant::now();
        if let Err(e) = backend.set_with_expiry(&self.key(query, k), bytes, self.ttl, self.timeout)
        {
            warn!(error = %e, "Cache store failed");
            return;
        }
        self.note_latency("set", started);
    }

    /// Make every cached result unreachable
    pub fn invalidate(&mut self) {
        let Some(backend) = self.backend.as_ref() else {
            return;
        };
        self.generation = self.generation.wrapping_add(1);
        match backend.invalidate_prefix(SEARCH_KEY_PREFIX, self.timeout) {
            Ok(removed) => debug!(removed, generation = self.generation, "Search cache invalidated"),
            Err(e) => warn!(
                error = %e,
                generation = self.generation,
                "Cache invalidation failed, relying on generation bump"
            ),
        }
    }

    fn note_latency(&self, op: &'static str, started: Instant) {
        let elapsed = started.elapsed();
        if elapsed > self.timeout {
            warn!(op, ?elapsed, timeout = ?self.timeout, "Cache backend exceeded its timeout");
        }
    }
}

impl std::fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCache")
            .field("enabled", &self.is_enabled())
            .field("ttl", &self.ttl)
            .field("timeout", &self.timeout)
            .field("generation", &self.generation)
            .finish()
    }
}

// Start from wall-clock micros so a restarted process never reuses the
// generation of keys an external backend may still hold.
fn initial_generation() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}
