//! The cached aggregate served by the read endpoint.

use serde::{Deserialize, Serialize};

use crate::item::ProcessedItem;
use crate::Timestamp;

/// Whether a response came from a successful refresh or a fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStatus {
    /// Served from a cache hit or a successful upstream refresh.
    Fresh,
    /// Served from the cache after a failed refresh attempt.
    Stale,
}

/// The unit stored in, and served from, the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceResponse {
    pub success: bool,
    pub currency: String,
    pub items: Vec<ProcessedItem>,
    pub last_update: Timestamp,
    pub cache_status: CacheStatus,
}

impl ServiceResponse {
    /// Build a successful response with the given status.
    pub fn success(
        currency: impl Into<String>,
        items: Vec<ProcessedItem>,
        last_update: Timestamp,
        cache_status: CacheStatus,
    ) -> Self {
        Self {
            success: true,
            currency: currency.into(),
            items,
            last_update,
            cache_status,
        }
    }

    /// Re-stamp and re-tag a response, keeping its payload.
    pub fn retagged(self, last_update: Timestamp, cache_status: CacheStatus) -> Self {
        Self::success(self.currency, self.items, last_update, cache_status)
    }

    pub fn is_stale(&self) -> bool {
        self.cache_status == CacheStatus::Stale
    }
}
