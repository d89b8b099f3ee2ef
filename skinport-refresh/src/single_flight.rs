//! Keyed single-flight registry.
//!
//! At most one future runs per key at a time. Callers arriving while it is in
//! flight attach to the same [`Shared`] future and observe the same result.
//! The future is also driven by a spawned task, so it runs to completion even
//! if every caller goes away, and it removes its own registration when it
//! settles.

use futures_util::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type SharedResult<V, E> = Shared<BoxFuture<'static, Result<V, E>>>;
type Registry<K, V, E> = Arc<Mutex<HashMap<K, SharedResult<V, E>>>>;

pub struct SingleFlight<K, V, E> {
    in_flight: Registry<K, V, E>,
}

impl<K, V, E> Default for SingleFlight<K, V, E> {
    fn default() -> Self {
        Self {
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<K, V, E> std::fmt::Debug for SingleFlight<K, V, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SingleFlight").finish_non_exhaustive()
    }
}

impl<K, V, E> SingleFlight<K, V, E>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    fn registry(&self) -> MutexGuard<'_, HashMap<K, SharedResult<V, E>>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Attach to the in-flight future for `key`, or start one from `make`.
    ///
    /// The check and the registration happen under one lock with no
    /// suspension point in between. `make` only builds the future; it must
    /// not block. Returns the shared future and whether this call started it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn join_or_start<F, Fut>(&self, key: K, make: F) -> (SharedResult<V, E>, bool)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        let mut registry = self.registry();
        if let Some(existing) = registry.get(&key) {
            return (existing.clone(), false);
        }

        let work = make();
        let in_flight = Arc::clone(&self.in_flight);
        let owned_key = key.clone();
        let shared = async move {
            let result = work.await;
            in_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&owned_key);
            result
        }
        .boxed()
        .shared();

        registry.insert(key, shared.clone());
        drop(registry);

        tokio::spawn(shared.clone());
        (shared, true)
    }

    /// Run (or join) the flight for `key` and await its result.
    pub async fn run<F, Fut>(&self, key: K, make: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        let (flight, _started) = self.join_or_start(key, make);
        flight.await
    }

    pub fn in_flight(&self, key: &K) -> bool {
        self.registry().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.registry().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
