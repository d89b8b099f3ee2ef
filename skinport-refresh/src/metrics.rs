//! Coordinator counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for coordinator activity since startup.
#[derive(Debug, Default)]
pub struct RefreshMetrics {
    /// Reads served straight from the cache
    pub cache_hits: AtomicU64,

    /// Reads that went to upstream (absent or too old)
    pub cache_misses: AtomicU64,

    /// Upstream fetches started (after single-flight deduplication)
    pub upstream_fetches: AtomicU64,

    /// Upstream fetches that failed
    pub upstream_failures: AtomicU64,

    /// Fetch failures answered with the previous cache entry
    pub stale_served: AtomicU64,

    /// Raw items dropped during processing
    pub items_dropped: AtomicU64,

    /// Background refresh cycles run
    pub background_cycles: AtomicU64,

    /// Background cycles that did not produce fresh data
    pub background_failures: AtomicU64,
}

impl RefreshMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> RefreshMetricsSnapshot {
        RefreshMetricsSnapshot {
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            upstream_fetches: self.upstream_fetches.load(Ordering::Relaxed),
            upstream_failures: self.upstream_failures.load(Ordering::Relaxed),
            stale_served: self.stale_served.load(Ordering::Relaxed),
            items_dropped: self.items_dropped.load(Ordering::Relaxed),
            background_cycles: self.background_cycles.load(Ordering::Relaxed),
            background_failures: self.background_failures.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of coordinator metrics at a point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshMetricsSnapshot {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub upstream_fetches: u64,
    pub upstream_failures: u64,
    pub stale_served: u64,
    pub items_dropped: u64,
    pub background_cycles: u64,
    pub background_failures: u64,
}
