//! In-memory result cache with in-flight request sharing.
//!
//! Entries never expire on their own; they are dropped by explicit
//! [`ResultCache::invalidate`]. Concurrent misses for the same key share one
//! pending fetch. Errors are handed to every waiter but never stored.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::debug;

use crate::error::SearchError;

type SharedFetch<V> = Shared<BoxFuture<'static, Result<Arc<V>, SearchError>>>;

/// How a value was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Served from a stored entry.
    Hit,
    /// Fetched by this caller.
    Miss,
    /// Joined a fetch another caller had already started.
    Shared,
}

impl fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hit => write!(f, "HIT"),
            Self::Miss => write!(f, "MISS"),
            Self::Shared => write!(f, "SHARED"),
        }
    }
}

/// A stored value.
#[derive(Debug)]
pub struct CacheEntry<V> {
    pub value: Arc<V>,
    pub stored_at: DateTime<Utc>,
}

impl<V> Clone for CacheEntry<V> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
            stored_at: self.stored_at,
        }
    }
}

struct InFlight<V> {
    id: u64,
    future: SharedFetch<V>,
}

struct Inner<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    inflight: HashMap<K, InFlight<V>>,
}

/// Key to value map guarded by a single mutex.
///
/// The lock is only held for map operations, never across an await, so
/// readers never observe a partially written entry.
pub struct ResultCache<K, V> {
    inner: Mutex<Inner<K, V>>,
    next_id: AtomicU64,
}

impl<K, V> Default for ResultCache<K, V> {
    fn default() -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                inflight: HashMap::new(),
            }),
            next_id: AtomicU64::new(1),
        }
    }
}

impl<K, V> ResultCache<K, V>
where
    K: Eq + Hash + Clone + fmt::Display + Send + 'static,
    V: Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner<K, V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get a stored value.
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        self.lock().entries.get(key).map(|e| Arc::clone(&e.value))
    }

    /// Get a stored value with its metadata.
    pub fn entry(&self, key: &K) -> Option<CacheEntry<V>> {
        self.lock().entries.get(key).cloned()
    }

    /// Store a value, replacing any previous one.
    pub fn put(&self, key: K, value: Arc<V>) {
        self.lock().entries.insert(
            key,
            CacheEntry {
                value,
                stored_at: Utc::now(),
            },
        );
    }

    /// Drop every entry, stored or in flight, whose key matches `predicate`.
    ///
    /// A fetch already in flight for a dropped key still resolves for its
    /// waiters but its result is not stored.
    pub fn invalidate<P>(&self, predicate: P) -> usize
    where
        P: Fn(&K) -> bool,
    {
        let mut inner = self.lock();
        let before = inner.entries.len();
        inner.entries.retain(|k, _| !predicate(k));
        inner.inflight.retain(|k, _| !predicate(k));
        let removed = before - inner.entries.len();
        debug!(removed, "cache invalidated");
        removed
    }

    /// Forget in-flight fetches whose key matches `predicate`, keeping stored
    /// entries. Their results are still handed to current waiters but not stored.
    pub fn abandon_inflight<P>(&self, predicate: P) -> usize
    where
        P: Fn(&K) -> bool,
    {
        let mut inner = self.lock();
        let before = inner.inflight.len();
        inner.inflight.retain(|k, _| !predicate(k));
        before - inner.inflight.len()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of fetches currently in flight.
    pub fn inflight(&self) -> usize {
        self.lock().inflight.len()
    }

    /// Return the stored value for `key`, or run `fetch` once for all
    /// concurrent callers asking for the same missing key.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        key: K,
        fetch: F,
    ) -> Result<(Arc<V>, CacheStatus), SearchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, SearchError>> + Send + 'static,
    {
        let (future, id, status) = {
            let mut inner = self.lock();
            if let Some(entry) = inner.entries.get(&key) {
                debug!(key = %key, "cache hit");
                return Ok((Arc::clone(&entry.value), CacheStatus::Hit));
            }
            let existing = inner
                .inflight
                .get(&key)
                .map(|pending| (pending.future.clone(), pending.id));
            match existing {
                Some((future, id)) => {
                    debug!(key = %key, "joining in-flight fetch");
                    (future, id, CacheStatus::Shared)
                }
                None => {
                    debug!(key = %key, "cache miss");
                    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                    let pending = fetch();
                    let future = async move { pending.await.map(Arc::new) }
                        .boxed()
                        .shared();
                    inner.inflight.insert(
                        key.clone(),
                        InFlight {
                            id,
                            future: future.clone(),
                        },
                    );
                    (future, id, CacheStatus::Miss)
                }
            }
        };

        let result = future.await;

        let mut inner = self.lock();
        if inner.inflight.get(&key).is_some_and(|p| p.id == id) {
            inner.inflight.remove(&key);
            if let Ok(value) = &result {
                inner.entries.insert(
                    key,
                    CacheEntry {
                        value: Arc::clone(value),
                        stored_at: Utc::now(),
                    },
                );
            }
        }

        result.map(|value| (value, status))
    }
}

impl<K, V> fmt::Debug for ResultCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("ResultCache")
            .field("entries", &inner.entries.len())
            .field("inflight", &inner.inflight.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::oneshot;

    fn transient() -> SearchError {
        SearchError::Transient {
            status: Some(502),
            message: "bad gateway".into(),
        }
    }

    #[test]
    fn test_put_get_invalidate() {
        let cache: ResultCache<String, u32> = ResultCache::new();
        cache.put("shoes@0".into(), Arc::new(1));
        cache.put("shoes@25".into(), Arc::new(2));
        cache.put("boots@0".into(), Arc::new(3));

        assert_eq!(cache.get(&"shoes@25".to_string()).as_deref(), Some(&2));
        assert!(cache.entry(&"boots@0".to_string()).is_some());

        let removed = cache.invalidate(|k| k.starts_with("shoes"));

        assert_eq!(removed, 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&"shoes@0".to_string()).is_none());
        assert!(cache.get(&"boots@0".to_string()).is_some());
    }

    #[tokio::test]
    async fn test_concurrent_misses_share_one_fetch() {
        let cache: ResultCache<String, u32> = ResultCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let fetch = || {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::task::yield_now().await;
                tokio::task::yield_now().await;
                Ok(7)
            }
        };

        let (a, b) = tokio::join!(
            cache.get_or_fetch("k".to_string(), fetch),
            cache.get_or_fetch("k".to_string(), fetch),
        );

        let (a, status_a) = a.unwrap();
        let (b, status_b) = b.unwrap();
        assert_eq!((*a, *b), (7, 7));
        assert_eq!(status_a, CacheStatus::Miss);
        assert_eq!(status_b, CacheStatus::Shared);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.inflight(), 0);

        let (_, status) = cache
            .get_or_fetch("k".to_string(), fetch)
            .await
            .unwrap();
        assert_eq!(status, CacheStatus::Hit);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_errors_are_shared_but_not_cached() {
        let cache: ResultCache<String, u32> = ResultCache::new();

        let result = cache
            .get_or_fetch("k".to_string(), || async { Err(transient()) })
            .await;
        assert_eq!(result.unwrap_err(), transient());
        assert!(cache.is_empty());
        assert_eq!(cache.inflight(), 0);

        let (value, status) = cache
            .get_or_fetch("k".to_string(), || async { Ok(1) })
            .await
            .unwrap();
        assert_eq!((*value, status), (1, CacheStatus::Miss));
    }

    #[tokio::test]
    async fn test_invalidated_inflight_result_is_not_stored() {
        let cache: ResultCache<String, u32> = ResultCache::new();
        let (tx, rx) = oneshot::channel::<u32>();

        let (result, _) = tokio::join!(
            cache.get_or_fetch("k".to_string(), move || async move {
                rx.await.map_err(|_| transient())
            }),
            async {
                assert_eq!(cache.inflight(), 1);
                cache.invalidate(|_| true);
                assert_eq!(cache.inflight(), 0);
                let _ = tx.send(9);
            },
        );

        assert_eq!(*result.unwrap().0, 9);
        assert!(cache.get(&"k".to_string()).is_none());
    }

    #[tokio::test]
    async fn test_abandoned_inflight_keeps_stored_entries() {
        let cache: ResultCache<String, u32> = ResultCache::new();
        cache.put("shoes@0".into(), Arc::new(1));
        let (tx, rx) = oneshot::channel::<u32>();

        let (result, _) = tokio::join!(
            cache.get_or_fetch("shoes@25".to_string(), move || async move {
                rx.await.map_err(|_| transient())
            }),
            async {
                assert_eq!(cache.abandon_inflight(|k| k.starts_with("shoes")), 1);
                let _ = tx.send(2);
            },
        );

        assert_eq!(*result.unwrap().0, 2);
        assert!(cache.get(&"shoes@25".to_string()).is_none());
        assert_eq!(cache.get(&"shoes@0".to_string()).as_deref(), Some(&1));
    }
}
