//! Skinport Refresh - Price Cache Coordinator
//!
//! Decides, on every read, whether to serve cached market data, join a single
//! deduplicated upstream fetch, or fall back to stale data when upstream
//! fails. A background worker refreshes the same cache entry on a fixed
//! cadence through the same path.
//!
//! ```ignore
//! let coordinator = RefreshCoordinator::new(store, fetcher, CoordinatorConfig::default())?;
//! coordinator.start();
//! let response = coordinator.get_items().await?;
//! coordinator.shutdown().await;
//! ```

mod background;
pub mod config;
pub mod coordinator;
pub mod metrics;
pub mod processing;
pub mod single_flight;

pub use config::CoordinatorConfig;
pub use coordinator::RefreshCoordinator;
pub use metrics::{RefreshMetrics, RefreshMetricsSnapshot};
pub use processing::{process_item, process_items, ProcessedBatch};
pub use single_flight::SingleFlight;
