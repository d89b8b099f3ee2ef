//! Freshness contracts for cache reads.
//!
//! The coordinator's read path decides from a [`Freshness`] policy whether a
//! cache hit may be served as-is. Freshness is logical; physical eviction is
//! governed separately by the store TTL.

use chrono::Utc;
use std::time::Duration;

use skinport_core::Timestamp;

/// Freshness requirement for cache reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Freshness {
    /// Any cache hit is fresh, regardless of age.
    ///
    /// The background refresh keeps the entry current and the TTL bounds how
    /// old it can physically get.
    #[default]
    Presence,

    /// A hit older than `max_staleness` is treated as a miss.
    ///
    /// The old entry stays in the cache and remains available as a stale
    /// fallback if the refresh it triggers fails.
    MaxAge {
        /// Maximum acceptable age for cached data.
        max_staleness: Duration,
    },
}

impl Freshness {
    pub fn presence() -> Self {
        Self::Presence
    }

    pub fn max_age(max_staleness: Duration) -> Self {
        Self::MaxAge { max_staleness }
    }

    /// Whether data of the given age satisfies this policy.
    pub fn accepts(&self, staleness: Duration) -> bool {
        match self {
            Self::Presence => true,
            Self::MaxAge { max_staleness } => staleness <= *max_staleness,
        }
    }
}

/// Result of a cache read, carrying when the value was written.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheRead<T> {
    value: T,
    cached_at: Timestamp,
}

impl<T> CacheRead<T> {
    pub fn from_cache(value: T, cached_at: Timestamp) -> Self {
        Self { value, cached_at }
    }

    pub fn into_value(self) -> T {
        self.value
    }

    pub fn into_parts(self) -> (T, Timestamp) {
        (self.value, self.cached_at)
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    /// The envelope's `updatedAt`.
    pub fn cached_at(&self) -> Timestamp {
        self.cached_at
    }

    /// Age of the data relative to `now`. Future stamps count as zero.
    pub fn staleness_at(&self, now: Timestamp) -> Duration {
        (now - self.cached_at).to_std().unwrap_or(Duration::ZERO)
    }

    pub fn staleness(&self) -> Duration {
        self.staleness_at(Utc::now())
    }

    pub fn satisfies(&self, freshness: &Freshness) -> bool {
        freshness.accepts(self.staleness())
    }
}
