//! Shared application state for the HTTP handlers.

use std::sync::Arc;
use std::time::Instant;

use skinport_refresh::RefreshCoordinator;
use skinport_storage::CacheStore;

#[derive(Clone)]
pub struct AppState {
    pub coordinator: RefreshCoordinator,
    pub store: Arc<dyn CacheStore>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(coordinator: RefreshCoordinator, store: Arc<dyn CacheStore>) -> Self {
        Self {
            coordinator,
            store,
            start_time: Instant::now(),
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("coordinator", &self.coordinator)
            .field("uptime_secs", &self.start_time.elapsed().as_secs())
            .finish_non_exhaustive()
    }
}
