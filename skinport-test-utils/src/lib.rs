//! Skinport Test Utilities
//!
//! Shared test infrastructure for the workspace:
//! - A scripted [`ItemsFetcher`] for driving the refresh coordinator
//! - Proptest generators for the cached data types
//! - Fixtures for common upstream payloads
//! - Assertions for coordinator outcomes

// Re-export the in-memory store from its source crate
pub use skinport_storage::{MemoryBackend, TolerantStore};

pub use skinport_core::{
    CacheStatus, FetchError, ProcessedItem, RawItem, RefreshError, ServiceResponse, Timestamp,
};
pub use skinport_fetch::{FetchResult, ItemsFetcher};

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

// ============================================================================
// MOCK FETCHER
// ============================================================================

/// An [`ItemsFetcher`] that replays scripted outcomes.
///
/// Queued outcomes are consumed in order; once the queue is empty every call
/// returns the fallback outcome. An optional delay is slept (on the tokio
/// clock) before each outcome is returned.
#[derive(Debug)]
pub struct ScriptedFetcher {
    script: Mutex<VecDeque<FetchResult<Vec<RawItem>>>>,
    fallback: Mutex<FetchResult<Vec<RawItem>>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    in_progress: AtomicUsize,
    max_concurrent: AtomicUsize,
}

impl ScriptedFetcher {
    /// Every call succeeds with `items`.
    pub fn succeeding(items: Vec<RawItem>) -> Self {
        Self::with_fallback(Ok(items))
    }

    /// Every call fails with `error`.
    pub fn failing(error: FetchError) -> Self {
        Self::with_fallback(Err(error))
    }

    pub fn with_fallback(fallback: FetchResult<Vec<RawItem>>) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(fallback),
            delay: None,
            calls: AtomicUsize::new(0),
            in_progress: AtomicUsize::new(0),
            max_concurrent: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue one outcome ahead of the fallback.
    pub fn push(&self, outcome: FetchResult<Vec<RawItem>>) {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(outcome);
    }

    pub fn set_fallback(&self, outcome: FetchResult<Vec<RawItem>>) {
        *self.fallback.lock().unwrap_or_else(PoisonError::into_inner) = outcome;
    }

    /// Number of `fetch_items` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneously running `fetch_items` calls.
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent.load(Ordering::SeqCst)
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    fn next_outcome(&self) -> FetchResult<Vec<RawItem>> {
        let queued = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        queued.unwrap_or_else(|| {
            self.fallback
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        })
    }
}

#[async_trait]
impl ItemsFetcher for ScriptedFetcher {
    async fn fetch_items(&self) -> FetchResult<Vec<RawItem>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let running = self.in_progress.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_concurrent.fetch_max(running, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let outcome = self.next_outcome();

        self.in_progress.fetch_sub(1, Ordering::SeqCst);
        outcome
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for the cached data types.

    use super::*;
    use proptest::prelude::*;

    /// Generate a Timestamp with sub-second precision (2020-2030).
    pub fn arb_timestamp() -> impl Strategy<Value = Timestamp> {
        (1577836800i64..1893456000i64, 0u32..1_000_000_000u32).prop_map(|(secs, nanos)| {
            chrono::DateTime::from_timestamp(secs, nanos).unwrap_or_else(chrono::Utc::now)
        })
    }

    /// Generate an optional price expressed in whole cents.
    pub fn arb_price() -> impl Strategy<Value = Option<f64>> {
        prop::option::of((1u64..100_000_000u64).prop_map(|cents| cents as f64 / 100.0))
    }

    pub fn arb_item_name() -> impl Strategy<Value = String> {
        "[A-Za-z0-9★ |()-]{1,48}"
    }

    pub fn arb_processed_item() -> impl Strategy<Value = ProcessedItem> {
        (arb_item_name(), arb_price(), arb_price())
            .prop_map(|(name, tradable, non_tradable)| ProcessedItem::new(name, tradable, non_tradable))
    }

    pub fn arb_cache_status() -> impl Strategy<Value = CacheStatus> {
        prop_oneof![Just(CacheStatus::Fresh), Just(CacheStatus::Stale)]
    }

    pub fn arb_currency() -> impl Strategy<Value = String> {
        prop_oneof![Just("EUR"), Just("USD"), Just("GBP")].prop_map(String::from)
    }

    pub fn arb_service_response() -> impl Strategy<Value = ServiceResponse> {
        (
            arb_currency(),
            prop::collection::vec(arb_processed_item(), 0..20),
            arb_timestamp(),
            arb_cache_status(),
        )
            .prop_map(|(currency, items, last_update, status)| {
                ServiceResponse::success(currency, items, last_update, status)
            })
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    //! Upstream payloads and cached responses for common scenarios.

    use super::*;
    use serde_json::{json, Value};

    /// A Skinport-shaped raw item.
    pub fn raw_item(name: &str, min_price: Option<f64>, suggested_price: Option<f64>) -> RawItem {
        RawItem::new(json!({
            "market_hash_name": name,
            "currency": "EUR",
            "min_price": min_price,
            "suggested_price": suggested_price,
            "quantity": 1,
        }))
    }

    /// Any JSON value as a raw item.
    pub fn raw_value(value: Value) -> RawItem {
        RawItem::new(value)
    }

    pub fn sample_raw_items() -> Vec<RawItem> {
        vec![
            raw_item("AK-47 | Redline (Field-Tested)", Some(11.5), Some(13.18)),
            raw_item("AWP | Asiimov (Field-Tested)", None, Some(70.0)),
            raw_item("Glock-18 | Fade (Factory New)", Some(1450.0), None),
        ]
    }

    pub fn sample_items() -> Vec<ProcessedItem> {
        vec![
            ProcessedItem::new("AK-47 | Redline (Field-Tested)", Some(11.5), Some(13.18)),
            ProcessedItem::new("AWP | Asiimov (Field-Tested)", None, Some(70.0)),
            ProcessedItem::new("Glock-18 | Fade (Factory New)", Some(1450.0), None),
        ]
    }

    pub fn sample_response() -> ServiceResponse {
        ServiceResponse::success("EUR", sample_items(), chrono::Utc::now(), CacheStatus::Fresh)
    }

    /// What an exhausted upstream request looks like.
    pub fn upstream_failure(reason: &str) -> FetchError {
        FetchError::Failed {
            context: "HTTP Request to upstream".to_string(),
            attempts: 3,
            last_error: reason.to_string(),
        }
    }

    /// A tolerant store over a fresh memory backend.
    pub fn memory_store() -> Arc<TolerantStore<MemoryBackend>> {
        Arc::new(TolerantStore::new(MemoryBackend::new()))
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions for coordinator outcomes.

    use super::*;

    #[track_caller]
    pub fn assert_fresh(result: &Result<ServiceResponse, RefreshError>) {
        match result {
            Ok(response) => assert_eq!(
                response.cache_status,
                CacheStatus::Fresh,
                "Expected fresh response, got: {:?}",
                response
            ),
            Err(e) => panic!("Expected fresh response, got error: {:?}", e),
        }
    }

    #[track_caller]
    pub fn assert_stale(result: &Result<ServiceResponse, RefreshError>) {
        match result {
            Ok(response) => assert_eq!(
                response.cache_status,
                CacheStatus::Stale,
                "Expected stale response, got: {:?}",
                response
            ),
            Err(e) => panic!("Expected stale response, got error: {:?}", e),
        }
    }

    #[track_caller]
    pub fn assert_no_data_available(result: &Result<ServiceResponse, RefreshError>) {
        match result {
            Err(RefreshError::NoDataAvailable { .. }) => {}
            other => panic!("Expected NoDataAvailable, got: {:?}", other),
        }
    }
}
