//! In-process cache backend.
//!
//! Used in tests and local runs without Redis. Expiry is measured on the
//! tokio clock so paused-time tests can drive TTLs deterministically.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

use skinport_core::StoreError;

use crate::store::{CacheBackend, StoreResult};

#[derive(Debug, Clone)]
struct MemoryEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl MemoryEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// Map-backed [`CacheBackend`] with TTL expiry and a simulated outage switch.
#[derive(Debug)]
pub struct MemoryBackend {
    entries: RwLock<HashMap<String, MemoryEntry>>,
    available: AtomicBool,
    gets: AtomicU64,
    sets: AtomicU64,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
            gets: AtomicU64::new(0),
            sets: AtomicU64::new(0),
        }
    }

    /// When `false`, every operation fails with [`StoreError::Unavailable`].
    /// Stored entries survive the outage.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    /// Number of `get` calls, including failed ones.
    pub fn get_count(&self) -> u64 {
        self.gets.load(Ordering::SeqCst)
    }

    /// Number of `set` calls, including failed ones.
    pub fn set_count(&self) -> u64 {
        self.sets.load(Ordering::SeqCst)
    }

    /// Remaining retention of a live entry. `None` for missing, expired or
    /// unbounded entries.
    pub async fn remaining_ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        let entry = entries.get(key).filter(|e| !e.is_expired(now))?;
        entry.expires_at.map(|at| at.saturating_duration_since(now))
    }

    /// Number of live entries.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|e| !e.is_expired(now))
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Write a value directly, bypassing the availability switch.
    pub async fn insert_raw(&self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.write().await.insert(
            key.into(),
            MemoryEntry {
                value: value.into(),
                expires_at: None,
            },
        );
    }

    fn check_available(&self, operation: &str) -> StoreResult<()> {
        if self.is_available() {
            Ok(())
        } else {
            Err(StoreError::Unavailable {
                reason: format!("memory backend offline during {}", operation),
            })
        }
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.check_available("get")?;

        let now = Instant::now();
        let mut entries = self.entries.write().await;
        match entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                entries.remove(key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value.clone())),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> StoreResult<()> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.check_available("set")?;

        let expires_at = ttl.map(|ttl| Instant::now() + ttl);
        self.entries.write().await.insert(
            key.to_string(),
            MemoryEntry {
                value: value.to_string(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn ping(&self) -> StoreResult<()> {
        self.check_available("ping")
    }

    async fn disconnect(&self) -> StoreResult<()> {
        self.check_available("disconnect")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let backend = MemoryBackend::new();
        backend
            .set("k", "v", Some(Duration::from_secs(600)))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(599)).await;
        assert_eq!(backend.get("k").await.unwrap().as_deref(), Some("v"));
        assert_eq!(backend.remaining_ttl("k").await, Some(Duration::from_secs(1)));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(backend.get("k").await.unwrap(), None);
        assert!(backend.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_without_ttl_is_retained() {
        let backend = MemoryBackend::new();
        backend.set("k", "v", None).await.unwrap();

        tokio::time::advance(Duration::from_secs(60 * 60 * 24)).await;
        assert_eq!(backend.get("k").await.unwrap().as_deref(), Some("v"));
        assert_eq!(backend.remaining_ttl("k").await, None);
    }

    #[tokio::test]
    async fn test_overwrite_replaces_value_and_ttl() {
        let backend = MemoryBackend::new();
        backend
            .set("k", "old", Some(Duration::from_secs(5)))
            .await
            .unwrap();
        backend.set("k", "new", None).await.unwrap();

        assert_eq!(backend.get("k").await.unwrap().as_deref(), Some("new"));
        assert_eq!(backend.remaining_ttl("k").await, None);
    }

    #[tokio::test]
    async fn test_unavailable_backend_fails_every_operation() {
        let backend = MemoryBackend::new();
        backend.insert_raw("k", "v").await;
        backend.set_available(false);

        assert!(matches!(
            backend.get("k").await,
            Err(StoreError::Unavailable { .. })
        ));
        assert!(backend.set("k", "x", None).await.is_err());
        assert!(backend.ping().await.is_err());
        assert_eq!(backend.get_count(), 1);
        assert_eq!(backend.set_count(), 1);

        backend.set_available(true);
        assert_eq!(backend.get("k").await.unwrap().as_deref(), Some("v"));
    }
}
