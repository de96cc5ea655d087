//! Age-windowed cache of the last known-good endpoint
//!
//! The cache is a pure accelerator for discovery: a fresh entry lets the
//! orchestrator skip straight to probing one address. Because discovery works
//! without it, every storage failure here degrades to a cache miss and is
//! never surfaced to the caller.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, warn};

use crate::endpoint::Endpoint;
use crate::store::KeyValueStore;

/// Store key holding the cached base URL
pub const KEY_CACHED_URL: &str = "cached_api_url";
/// Store key holding the epoch-millisecond write timestamp
pub const KEY_CACHE_TIMESTAMP: &str = "cache_timestamp";

/// Default validity window for a cached endpoint
pub const DEFAULT_VALIDITY_WINDOW: Duration = Duration::from_secs(60 * 60);

/// Last-known-good endpoint cache over a key-value store
pub struct EndpointCache {
    store: Arc<dyn KeyValueStore>,
    validity_window: Duration,
}

impl EndpointCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            validity_window: DEFAULT_VALIDITY_WINDOW,
        }
    }

    pub fn with_validity_window(mut self, window: Duration) -> Self {
        self.validity_window = window;
        self
    }

    /// Return the cached endpoint only while it is younger than the validity
    /// window. Missing keys, unparseable values, storage errors, and expiry
    /// all yield None.
    pub fn get(&self) -> Option<Endpoint> {
        let url = match self.store.get(KEY_CACHED_URL) {
            Ok(Some(url)) => url,
            Ok(None) => return None,
            Err(e) => {
                warn!("Endpoint cache read failed, treating as miss: {}", e);
                return None;
            }
        };

        let recorded_at: i64 = match self.store.get(KEY_CACHE_TIMESTAMP) {
            Ok(Some(ts)) => match ts.parse() {
                Ok(ms) => ms,
                Err(_) => {
                    warn!("Endpoint cache timestamp '{}' is not a number", ts);
                    return None;
                }
            },
            Ok(None) => return None,
            Err(e) => {
                warn!("Endpoint cache read failed, treating as miss: {}", e);
                return None;
            }
        };

        let age_ms = Utc::now().timestamp_millis().saturating_sub(recorded_at);
        if age_ms < 0 || age_ms as u128 >= self.validity_window.as_millis() {
            debug!("Cached endpoint {} expired ({}ms old)", url, age_ms);
            return None;
        }

        match Endpoint::parse(&url) {
            Ok(endpoint) => {
                debug!("Endpoint cache hit: {} ({}ms old)", endpoint, age_ms);
                Some(endpoint)
            }
            Err(e) => {
                warn!("Cached endpoint '{}' failed to parse: {}", url, e);
                None
            }
        }
    }

    /// Write-through after a successful discovery. Storage failure is logged
    /// and swallowed; discovery still functions without a cache.
    pub fn put(&self, endpoint: &Endpoint) {
        let now_ms = Utc::now().timestamp_millis();
        let result = self
            .store
            .set(KEY_CACHED_URL, &endpoint.base_url())
            .and_then(|_| self.store.set(KEY_CACHE_TIMESTAMP, &now_ms.to_string()));

        match result {
            Ok(()) => debug!("Cached endpoint {}", endpoint),
            Err(e) => warn!("Failed to cache endpoint {}: {}", endpoint, e),
        }
    }

    /// Best-effort invalidation, used on logout/reset paths
    pub fn clear(&self) {
        for key in [KEY_CACHED_URL, KEY_CACHE_TIMESTAMP] {
            if let Err(e) = self.store.delete(key) {
                warn!("Failed to clear cache key {}: {}", key, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use std::sync::atomic::Ordering;

    fn cache_over(store: Arc<MemoryStore>) -> EndpointCache {
        EndpointCache::new(store)
    }

    #[test]
    fn test_miss_on_empty_store() {
        let cache = cache_over(Arc::new(MemoryStore::new()));
        assert!(cache.get().is_none());
    }

    #[test]
    fn test_put_then_get() {
        let store = Arc::new(MemoryStore::new());
        let cache = cache_over(store.clone());

        let ep = Endpoint::http("192.168.1.10", 8000);
        cache.put(&ep);

        assert_eq!(cache.get(), Some(ep));
        assert!(store.get(KEY_CACHE_TIMESTAMP).unwrap().is_some());
    }

    #[test]
    fn test_expired_entry_ignored() {
        let store = Arc::new(MemoryStore::new());
        let stale = Utc::now().timestamp_millis() - 2 * 60 * 60 * 1000;
        store.set(KEY_CACHED_URL, "http://192.168.1.10:8000").unwrap();
        store.set(KEY_CACHE_TIMESTAMP, &stale.to_string()).unwrap();

        let cache = cache_over(store);
        assert!(cache.get().is_none());
    }

    #[test]
    fn test_garbage_values_are_a_miss() {
        let store = Arc::new(MemoryStore::new());
        store.set(KEY_CACHED_URL, "not a url").unwrap();
        store
            .set(
                KEY_CACHE_TIMESTAMP,
                &Utc::now().timestamp_millis().to_string(),
            )
            .unwrap();
        assert!(cache_over(store.clone()).get().is_none());

        store.set(KEY_CACHED_URL, "http://10.0.0.5:8000").unwrap();
        store.set(KEY_CACHE_TIMESTAMP, "yesterday").unwrap();
        assert!(cache_over(store).get().is_none());
    }

    #[test]
    fn test_put_swallows_storage_failure() {
        let store = Arc::new(MemoryStore::new());
        store.fail_writes.store(true, Ordering::SeqCst);

        let cache = cache_over(store);
        cache.put(&Endpoint::http("localhost", 8000));
        assert!(cache.get().is_none());
    }

    #[test]
    fn test_clear_removes_both_keys() {
        let store = Arc::new(MemoryStore::new());
        let cache = cache_over(store.clone());
        cache.put(&Endpoint::http("localhost", 8000));

        cache.clear();
        assert!(store.get(KEY_CACHED_URL).unwrap().is_none());
        assert!(store.get(KEY_CACHE_TIMESTAMP).unwrap().is_none());
    }
}
