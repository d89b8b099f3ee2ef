//! The refresh coordinator.
//!
//! Read path: cache hit → serve; miss → join or start the single in-flight
//! fetch for the cache key. Fetch path: upstream → process → stamp → write,
//! falling back to the existing entry (tagged stale) when upstream fails.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use skinport_core::{
    CacheStatus, ConfigError, RefreshError, ServiceResponse, Timestamp,
};
use skinport_fetch::ItemsFetcher;
use skinport_storage::{CacheStore, EnvelopeVault};

use crate::background::BackgroundHandle;
use crate::config::CoordinatorConfig;
use crate::metrics::{RefreshMetrics, RefreshMetricsSnapshot};
use crate::processing::process_items;
use crate::single_flight::SingleFlight;

/// Price cache coordinator. Cheap to clone; clones share all state.
#[derive(Clone)]
pub struct RefreshCoordinator {
    pub(crate) inner: Arc<CoordinatorInner>,
    pub(crate) background: Arc<Mutex<Option<BackgroundHandle>>>,
}

pub(crate) struct CoordinatorInner {
    pub(crate) vault: EnvelopeVault,
    pub(crate) fetcher: Arc<dyn ItemsFetcher>,
    pub(crate) config: CoordinatorConfig,
    pub(crate) cache_key: String,
    pub(crate) in_flight: SingleFlight<String, ServiceResponse, RefreshError>,
    pub(crate) metrics: RefreshMetrics,
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("cache_key", &self.inner.cache_key)
            .field("fetcher", &self.inner.fetcher.name())
            .field("running", &self.is_running())
            .finish()
    }
}

impl RefreshCoordinator {
    pub fn new(
        store: Arc<dyn CacheStore>,
        fetcher: Arc<dyn ItemsFetcher>,
        config: CoordinatorConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let cache_key = config.cache_key();
        Ok(Self {
            inner: Arc::new(CoordinatorInner {
                vault: EnvelopeVault::new(store),
                fetcher,
                config,
                cache_key,
                in_flight: SingleFlight::new(),
                metrics: RefreshMetrics::new(),
            }),
            background: Arc::new(Mutex::new(None)),
        })
    }

    /// Current items: cached when possible, otherwise from one shared upstream
    /// fetch, otherwise the previous entry tagged stale.
    ///
    /// Fails only with [`RefreshError::NoDataAvailable`].
    pub async fn get_items(&self) -> Result<ServiceResponse, RefreshError> {
        let inner = &self.inner;

        if let Some(read) = inner
            .vault
            .get_with_metadata::<ServiceResponse>(&inner.cache_key)
            .await
        {
            if read.satisfies(&inner.config.freshness) {
                RefreshMetrics::incr(&inner.metrics.cache_hits);
                let (response, updated_at) = read.into_parts();
                return Ok(response.retagged(updated_at, CacheStatus::Fresh));
            }
            tracing::debug!(
                cache_key = %inner.cache_key,
                age_secs = read.staleness().as_secs(),
                "Cached data exceeds freshness policy, refreshing"
            );
        }

        RefreshMetrics::incr(&inner.metrics.cache_misses);
        tracing::warn!(
            cache_key = %inner.cache_key,
            "Cache miss or store unavailable, fetching from upstream"
        );
        self.refresh().await
    }

    /// Run (or join) the fetch-and-cache path, bypassing the cache read.
    pub async fn refresh(&self) -> Result<ServiceResponse, RefreshError> {
        CoordinatorInner::refresh(&self.inner).await
    }

    /// `updatedAt` of the current cache entry.
    pub async fn last_update_time(&self) -> Option<Timestamp> {
        self.inner.vault.update_time(&self.inner.cache_key).await
    }

    /// Whether the cache entry is younger than `threshold` (default from
    /// config). Independent of the read path's freshness policy.
    pub async fn is_data_fresh(&self, threshold: Option<Duration>) -> bool {
        let threshold = threshold.unwrap_or(self.inner.config.freshness_threshold);
        self.inner
            .vault
            .is_value_fresh(&self.inner.cache_key, threshold)
            .await
    }

    pub fn cache_key(&self) -> &str {
        &self.inner.cache_key
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.inner.config
    }

    pub fn vault(&self) -> &EnvelopeVault {
        &self.inner.vault
    }

    pub fn metrics(&self) -> RefreshMetricsSnapshot {
        self.inner.metrics.snapshot()
    }

    /// Whether an upstream fetch is currently in flight.
    pub fn is_refreshing(&self) -> bool {
        self.inner.in_flight.in_flight(&self.inner.cache_key)
    }
}

impl CoordinatorInner {
    pub(crate) async fn refresh(this: &Arc<Self>) -> Result<ServiceResponse, RefreshError> {
        let inner = Arc::clone(this);
        this.in_flight
            .run(this.cache_key.clone(), move || async move {
                inner.fetch_and_cache().await
            })
            .await
    }

    async fn fetch_and_cache(&self) -> Result<ServiceResponse, RefreshError> {
        RefreshMetrics::incr(&self.metrics.upstream_fetches);

        let raw_items = match self.fetcher.fetch_items().await {
            Ok(raw_items) => raw_items,
            Err(e) => {
                RefreshMetrics::incr(&self.metrics.upstream_failures);
                tracing::error!(
                    fetcher = self.fetcher.name(),
                    error = %e,
                    "Upstream fetch failed"
                );
                return self.stale_fallback(e.to_string()).await;
            }
        };

        let batch = process_items(&raw_items);
        self.metrics
            .items_dropped
            .fetch_add(batch.dropped as u64, std::sync::atomic::Ordering::Relaxed);

        let updated_at = self.vault.next_timestamp(&self.cache_key);
        let response = ServiceResponse::success(
            self.config.currency.clone(),
            batch.items,
            updated_at,
            CacheStatus::Fresh,
        );

        if let Err(e) = self
            .vault
            .set_with_timestamp(&self.cache_key, &response, updated_at, self.config.ttl)
            .await
        {
            tracing::warn!(
                cache_key = %self.cache_key,
                error = %e,
                "Failed to encode cache envelope, serving uncached response"
            );
        }

        tracing::info!(
            cache_key = %self.cache_key,
            processed = response.items.len(),
            total = raw_items.len(),
            dropped = batch.dropped,
            "Cache updated"
        );

        Ok(response)
    }

    async fn stale_fallback(&self, reason: String) -> Result<ServiceResponse, RefreshError> {
        match self
            .vault
            .get_with_metadata::<ServiceResponse>(&self.cache_key)
            .await
        {
            Some(read) => {
                RefreshMetrics::incr(&self.metrics.stale_served);
                let (response, updated_at) = read.into_parts();
                tracing::warn!(
                    cache_key = %self.cache_key,
                    last_update = %updated_at,
                    "Serving stale cache after upstream failure"
                );
                Ok(response.retagged(updated_at, CacheStatus::Stale))
            }
            None => Err(RefreshError::NoDataAvailable { reason }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skinport_core::{FetchError, RawItem};
    use skinport_fetch::FetchResult;
    use skinport_storage::{MemoryBackend, TolerantStore};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingFetcher {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait::async_trait]
    impl ItemsFetcher for CountingFetcher {
        async fn fetch_items(&self) -> FetchResult<Vec<RawItem>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(FetchError::InvalidResponse {
                    source_name: "counting".to_string(),
                    reason: "down".to_string(),
                })
            } else {
                Ok(vec![RawItem::new(serde_json::json!({"name": "A", "min_price": 1.5}))])
            }
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    fn coordinator(fail: bool) -> (RefreshCoordinator, Arc<CountingFetcher>) {
        let fetcher = Arc::new(CountingFetcher {
            calls: AtomicUsize::new(0),
            fail,
        });
        let store = Arc::new(TolerantStore::new(MemoryBackend::new()));
        let coordinator =
            RefreshCoordinator::new(store, fetcher.clone(), CoordinatorConfig::default()).unwrap();
        (coordinator, fetcher)
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let (coordinator, fetcher) = coordinator(false);

        let first = coordinator.get_items().await.unwrap();
        assert_eq!(first.cache_status, CacheStatus::Fresh);
        assert_eq!(first.currency, "EUR");
        assert_eq!(first.items.len(), 1);

        let second = coordinator.get_items().await.unwrap();
        assert_eq!(second, first);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);

        let metrics = coordinator.metrics();
        assert_eq!(metrics.cache_misses, 1);
        assert_eq!(metrics.cache_hits, 1);
        assert_eq!(coordinator.last_update_time().await, Some(first.last_update));
    }

    #[tokio::test]
    async fn test_cold_failure_is_no_data_available() {
        let (coordinator, _) = coordinator(true);
        let err = coordinator.get_items().await.unwrap_err();
        assert!(matches!(err, RefreshError::NoDataAvailable { .. }));
        assert!(err.to_string().contains("down"));
        assert!(!coordinator.is_data_fresh(None).await);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let fetcher = Arc::new(CountingFetcher {
            calls: AtomicUsize::new(0),
            fail: false,
        });
        let store = Arc::new(TolerantStore::new(MemoryBackend::new()));
        let config = CoordinatorConfig::default().with_ttl(Some(Duration::from_secs(1)));
        assert!(RefreshCoordinator::new(store, fetcher, config).is_err());
    }
}
