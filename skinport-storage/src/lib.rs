//! Skinport Storage - Cache Layer
//!
//! Everything between the refresh coordinator and the external key-value
//! store:
//!
//! - [`envelope`]: the `{ updatedAt, data }` wire format written under a key
//! - [`store`]: the fallible [`CacheBackend`] trait and the non-throwing
//!   [`CacheStore`] capability, joined by [`TolerantStore`]
//! - [`redis_backend`] and [`memory`]: concrete backends
//! - [`vault`]: typed, timestamped reads and writes over a [`CacheStore`]
//! - [`freshness`]: read-side staleness contracts
//!
//! The service must behave correctly with no cache at all, so store failures
//! stop at [`TolerantStore`] and never reach callers of [`CacheStore`].

pub mod envelope;
pub mod freshness;
pub mod memory;
pub mod redis_backend;
pub mod store;
pub mod vault;

pub use envelope::{decode, encode, CacheEnvelope};
pub use freshness::{CacheRead, Freshness};
pub use memory::MemoryBackend;
pub use redis_backend::{RedisBackend, RedisSettings};
pub use store::{ttl_seconds, CacheBackend, CacheStore, StoreResult, TolerantStore};
pub use vault::EnvelopeVault;
