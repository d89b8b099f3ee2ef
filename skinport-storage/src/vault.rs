//! Typed, timestamped access to a [`CacheStore`].
//!
//! The vault owns envelope encoding and the per-key write clock. Stamps handed
//! out by [`EnvelopeVault::next_timestamp`] never go backwards for a key, even
//! if the wall clock does.

use chrono::Utc;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use skinport_core::{EnvelopeError, Timestamp};

use crate::envelope::{decode, encode};
use crate::freshness::CacheRead;
use crate::store::CacheStore;

/// Envelope reads and writes over a shared [`CacheStore`].
pub struct EnvelopeVault {
    store: Arc<dyn CacheStore>,
    last_stamps: Mutex<HashMap<String, Timestamp>>,
}

impl std::fmt::Debug for EnvelopeVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvelopeVault").finish_non_exhaustive()
    }
}

impl EnvelopeVault {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self {
            store,
            last_stamps: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    /// Reserve the next write stamp for `key`: `max(now, previous stamp)`.
    pub fn next_timestamp(&self, key: &str) -> Timestamp {
        let now = Utc::now();
        let mut stamps = self
            .last_stamps
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let stamp = match stamps.get(key) {
            Some(last) if *last > now => *last,
            _ => now,
        };
        stamps.insert(key.to_string(), stamp);
        stamp
    }

    fn record_stamp(&self, key: &str, stamp: Timestamp) {
        let mut stamps = self
            .last_stamps
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let entry = stamps.entry(key.to_string()).or_insert(stamp);
        if stamp > *entry {
            *entry = stamp;
        }
    }

    /// Write `value` under `key`, stamped with the next monotonic timestamp.
    pub async fn set<T>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<Timestamp, EnvelopeError>
    where
        T: Serialize + Sync,
    {
        let stamp = self.next_timestamp(key);
        self.set_with_timestamp(key, value, stamp, ttl).await?;
        Ok(stamp)
    }

    /// Write `value` under `key` with an explicit stamp.
    ///
    /// The stamp is written verbatim. Later [`EnvelopeVault::set`] calls for
    /// the same key will not stamp earlier than it.
    pub async fn set_with_timestamp<T>(
        &self,
        key: &str,
        value: &T,
        updated_at: Timestamp,
        ttl: Option<Duration>,
    ) -> Result<(), EnvelopeError>
    where
        T: Serialize + Sync,
    {
        let raw = encode(value, updated_at)?;
        self.record_stamp(key, updated_at);
        self.store.set(key, &raw, ttl).await;
        Ok(())
    }

    /// Payload and stamp under `key`. Missing and malformed entries are `None`.
    pub async fn get_with_metadata<T: DeserializeOwned>(&self, key: &str) -> Option<CacheRead<T>> {
        let raw = self.store.get(key).await?;
        match decode::<T>(&raw) {
            Ok((value, updated_at)) => Some(CacheRead::from_cache(value, updated_at)),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Discarding unreadable cache envelope");
                None
            }
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get_with_metadata(key).await.map(CacheRead::into_value)
    }

    /// The envelope stamp under `key`, without decoding the payload type.
    pub async fn update_time(&self, key: &str) -> Option<Timestamp> {
        self.get_with_metadata::<IgnoredAny>(key)
            .await
            .map(|read| read.cached_at())
    }

    /// Whether the entry under `key` was written less than `period` ago.
    ///
    /// A missing or unreadable entry is never fresh.
    pub async fn is_value_fresh(&self, key: &str, period: Duration) -> bool {
        match self.update_time(key).await {
            Some(updated_at) => {
                let age = (Utc::now() - updated_at).to_std().unwrap_or(Duration::ZERO);
                age < period
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBackend;
    use crate::store::TolerantStore;

    fn vault() -> (EnvelopeVault, Arc<TolerantStore<MemoryBackend>>) {
        let store = Arc::new(TolerantStore::new(MemoryBackend::new()));
        (EnvelopeVault::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_set_then_get_round_trips() {
        let (vault, _) = vault();
        let stamp = vault.set("k", &vec![1, 2, 3], None).await.unwrap();

        let read = vault.get_with_metadata::<Vec<i32>>("k").await.unwrap();
        assert_eq!(read.value(), &vec![1, 2, 3]);
        assert_eq!(read.cached_at(), stamp);
        assert_eq!(vault.update_time("k").await, Some(stamp));
    }

    #[tokio::test]
    async fn test_missing_and_malformed_entries_read_as_none() {
        let (vault, store) = vault();
        assert!(vault.get::<String>("missing").await.is_none());

        store.backend().insert_raw("broken", "{not json").await;
        assert!(vault.get::<String>("broken").await.is_none());
        assert!(vault.update_time("broken").await.is_none());
        assert!(!vault.is_value_fresh("broken", Duration::from_secs(3600)).await);
    }

    #[tokio::test]
    async fn test_stamps_never_go_backwards() {
        let (vault, _) = vault();
        let future = Utc::now() + chrono::Duration::hours(1);
        vault
            .set_with_timestamp("k", &"seeded", future, None)
            .await
            .unwrap();

        let next = vault.set("k", &"later write", None).await.unwrap();
        assert_eq!(next, future);

        let other = vault.set("other", &"x", None).await.unwrap();
        assert!(other < future);
    }

    #[tokio::test]
    async fn test_is_value_fresh_uses_envelope_age() {
        let (vault, _) = vault();
        let old = Utc::now() - chrono::Duration::minutes(10);
        vault.set_with_timestamp("old", &1, old, None).await.unwrap();
        vault.set("new", &1, None).await.unwrap();

        assert!(!vault.is_value_fresh("old", Duration::from_secs(300)).await);
        assert!(vault.is_value_fresh("old", Duration::from_secs(3600)).await);
        assert!(vault.is_value_fresh("new", Duration::from_secs(300)).await);
        assert!(!vault.is_value_fresh("missing", Duration::from_secs(300)).await);
    }

    #[tokio::test]
    async fn test_store_outage_reads_as_miss() {
        let (vault, store) = vault();
        vault.set("k", &"v", None).await.unwrap();
        store.backend().set_available(false);
        assert!(vault.get::<String>("k").await.is_none());
    }
}
