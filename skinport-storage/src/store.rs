//! Cache store traits and the tolerant adapter.
//!
//! [`CacheBackend`] is the fallible interface a concrete key-value store
//! implements. [`CacheStore`] is what the rest of the service consumes: it
//! cannot fail by signature. [`TolerantStore`] joins the two by logging every
//! backend error and degrading to "absent" or "no-op".

use async_trait::async_trait;
use std::time::{Duration, Instant};

use skinport_core::{HealthCheck, StoreError};

/// Result type for backend operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Pluggable key-value backend.
///
/// Implementations must be safe for concurrent use. Values are opaque strings
/// (serialized envelopes); keys are namespaced by the caller.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Short backend name used in logs and health output.
    fn name(&self) -> &str;

    /// Read a raw value. `Ok(None)` is a miss.
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Write a raw value, optionally bounding its retention.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> StoreResult<()>;

    /// Round-trip check against the backend.
    async fn ping(&self) -> StoreResult<()>;

    /// Release any connection held by the backend.
    async fn disconnect(&self) -> StoreResult<()>;
}

/// Non-throwing cache capability consumed by the vault and coordinator.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Raw value under `key`, or `None` on miss or store failure.
    async fn get(&self, key: &str) -> Option<String>;

    /// Best-effort write; failures are logged by the implementation.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>);

    async fn disconnect(&self);

    async fn health(&self) -> HealthCheck;
}

/// Seconds to pass to the store for a retention bound: rounded up, at least 1.
pub fn ttl_seconds(ttl: Duration) -> u64 {
    let secs = ttl.as_secs() + u64::from(ttl.subsec_nanos() > 0);
    secs.max(1)
}

/// Adapter that absorbs every [`CacheBackend`] error.
#[derive(Debug, Clone)]
pub struct TolerantStore<B> {
    backend: B,
}

impl<B: CacheBackend> TolerantStore<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

#[async_trait]
impl<B: CacheBackend> CacheStore for TolerantStore<B> {
    async fn get(&self, key: &str) -> Option<String> {
        match self.backend.get(key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(
                    backend = self.backend.name(),
                    key = %key,
                    error = %e,
                    "Cache read failed, treating as miss"
                );
                None
            }
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) {
        if let Err(e) = self.backend.set(key, value, ttl).await {
            tracing::warn!(
                backend = self.backend.name(),
                key = %key,
                error = %e,
                "Cache write failed, continuing without cache"
            );
        }
    }

    async fn disconnect(&self) {
        match self.backend.disconnect().await {
            Ok(()) => tracing::info!(backend = self.backend.name(), "Cache store disconnected"),
            Err(e) => tracing::warn!(
                backend = self.backend.name(),
                error = %e,
                "Cache store disconnect failed"
            ),
        }
    }

    async fn health(&self) -> HealthCheck {
        let start = Instant::now();
        let result = self.backend.ping().await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(()) => HealthCheck::healthy(self.backend.name()).with_response_time(elapsed_ms),
            Err(e) => HealthCheck::unhealthy(self.backend.name(), e.to_string())
                .with_response_time(elapsed_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBackend;
    use skinport_core::HealthStatus;

    #[test]
    fn test_ttl_seconds_rounds_up() {
        assert_eq!(ttl_seconds(Duration::from_secs(600)), 600);
        assert_eq!(ttl_seconds(Duration::from_millis(1500)), 2);
        assert_eq!(ttl_seconds(Duration::from_millis(1)), 1);
        assert_eq!(ttl_seconds(Duration::ZERO), 1);
    }

    #[tokio::test]
    async fn test_tolerant_store_passes_through_when_available() {
        let store = TolerantStore::new(MemoryBackend::new());
        store.set("k", "v", None).await;
        assert_eq!(store.get("k").await.as_deref(), Some("v"));
        assert!(store.health().await.is_healthy());
    }

    #[tokio::test]
    async fn test_tolerant_store_absorbs_backend_failures() {
        let backend = MemoryBackend::new();
        backend.set_available(false);
        let store = TolerantStore::new(backend);

        store.set("k", "v", Some(Duration::from_secs(10))).await;
        assert_eq!(store.get("k").await, None);
        store.disconnect().await;

        let health = store.health().await;
        assert_eq!(health.status, HealthStatus::Unhealthy);
        assert!(health.message.is_some());
    }

    #[tokio::test]
    async fn test_tolerant_store_recovers_after_outage() {
        let store = TolerantStore::new(MemoryBackend::new());
        store.backend().set_available(false);
        store.set("k", "lost", None).await;

        store.backend().set_available(true);
        assert_eq!(store.get("k").await, None);
        store.set("k", "kept", None).await;
        assert_eq!(store.get("k").await.as_deref(), Some("kept"));
    }
}
