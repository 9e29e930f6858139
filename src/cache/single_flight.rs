use super::ConnectionCache;
use anyhow::Result;
use futures::future::{BoxFuture, FutureExt, Shared, TryFutureExt};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// Error of a shared load, handed to every waiting caller.
#[derive(Clone, Debug)]
pub struct SharedError(Arc<anyhow::Error>);

impl fmt::Display for SharedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#}", self.0)
    }
}

impl std::error::Error for SharedError {}

type Flight<V> = Shared<BoxFuture<'static, Result<V, SharedError>>>;

/// Memoized, single-flight loader keyed by string.
///
/// The first caller for a key starts the load; callers arriving while it
/// is running await the same shared future and observe the same value or
/// error. Successful values are written to the backing cache and served
/// from there for the life of the connection. A failed load is not cached,
/// so a later caller starts a fresh flight.
pub struct SingleFlight<V> {
    cache: Arc<dyn ConnectionCache<V>>,
    inflight: Mutex<HashMap<String, Flight<V>>>,
}

impl<V> SingleFlight<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(cache: Arc<dyn ConnectionCache<V>>) -> Self {
        Self {
            cache,
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached value for `key`, loading it at most once.
    pub async fn get_or_load<F, Fut>(&self, key: &str, load: F) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        if let Some(value) = self.cache.get(key) {
            return Ok(value);
        }

        let flight = {
            let mut inflight = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
            // Re-check under the lock: a flight may have completed meanwhile.
            if let Some(value) = self.cache.get(key) {
                return Ok(value);
            }
            match inflight.get(key) {
                Some(flight) => flight.clone(),
                None => {
                    debug!(key = %key, "Starting single-flight load");
                    let flight = load()
                        .map_err(|e| SharedError(Arc::new(e)))
                        .boxed()
                        .shared();
                    inflight.insert(key.to_string(), flight.clone());
                    flight
                }
            }
        };

        let outcome = flight.clone().await;
        if let Ok(value) = &outcome {
            self.cache.set(key, value.clone());
        }

        {
            let mut inflight = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
            if inflight
                .get(key)
                .is_some_and(|current| current.ptr_eq(&flight))
            {
                inflight.remove(key);
            }
        }

        outcome.map_err(anyhow::Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use anyhow::anyhow;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn flight() -> Arc<SingleFlight<String>> {
        Arc::new(SingleFlight::new(Arc::new(MemoryCache::<String>::new())))
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_load() {
        let memo = flight();
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let memo = Arc::clone(&memo);
            let calls = Arc::clone(&calls);
            handles.push(tokio::spawn(async move {
                memo.get_or_load("account", move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok("acc-123".to_string())
                })
                .await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "acc-123");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_error() {
        let memo = flight();
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let memo = Arc::clone(&memo);
            let calls = Arc::clone(&calls);
            handles.push(tokio::spawn(async move {
                memo.get_or_load("account", move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Err::<String, _>(anyhow!("Mailchimp auth error: API key invalid (401)"))
                })
                .await
            }));
        }

        for handle in handles {
            let err = handle.await.unwrap().unwrap_err();
            assert!(err.to_string().contains("401"));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cached_value_served_without_load() {
        let memo = flight();
        let calls = AtomicUsize::new(0);
        for _ in 0..3 {
            let value = memo
                .get_or_load("account", || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Ok("first".to_string()) }
                })
                .await
                .unwrap();
            assert_eq!(value, "first");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_load_is_retried_later() {
        let memo = flight();
        let err = memo
            .get_or_load("account", || async { Err(anyhow!("timeout")) })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("timeout"));

        let value = memo
            .get_or_load("account", || async { Ok("recovered".to_string()) })
            .await
            .unwrap();
        assert_eq!(value, "recovered");
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let memo = flight();
        let a = memo
            .get_or_load("a", || async { Ok("A".to_string()) })
            .await
            .unwrap();
        let b = memo
            .get_or_load("b", || async { Ok("B".to_string()) })
            .await
            .unwrap();
        assert_eq!((a.as_str(), b.as_str()), ("A", "B"));
    }
}
