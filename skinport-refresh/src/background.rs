//! Background refresh lifecycle.
//!
//! A single worker loop runs one cycle immediately, then one per interval.
//! Each cycle is awaited before the next tick is taken and missed ticks are
//! skipped, so cycles never overlap. Cycles go through the same single-flight
//! registry as cache misses. Failures are logged and never stop the loop.

use std::sync::{Arc, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::coordinator::{CoordinatorInner, RefreshCoordinator};
use crate::metrics::RefreshMetrics;

pub(crate) struct BackgroundHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl BackgroundHandle {
    fn is_alive(&self) -> bool {
        !self.task.is_finished()
    }

    fn signal(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

impl RefreshCoordinator {
    /// Start the background refresh worker.
    ///
    /// Returns `false` without side effects if it is already running. Must be
    /// called from within a tokio runtime.
    pub fn start(&self) -> bool {
        let mut background = self
            .background
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if background.as_ref().is_some_and(BackgroundHandle::is_alive) {
            tracing::debug!(cache_key = %self.cache_key(), "Background refresh already running");
            return false;
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(background_loop(inner, shutdown_rx));

        *background = Some(BackgroundHandle { shutdown_tx, task });
        true
    }

    /// Signal the worker to stop after any in-progress cycle. Idempotent;
    /// returns whether a running worker was signalled.
    pub fn stop(&self) -> bool {
        let handle = self
            .background
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        match handle {
            Some(handle) => {
                handle.signal();
                tracing::info!(cache_key = %self.cache_key(), "Background refresh stop requested");
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.background
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(BackgroundHandle::is_alive)
    }

    /// Stop the worker and wait for it to exit.
    pub async fn shutdown(&self) {
        let handle = self
            .background
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(handle) = handle {
            handle.signal();
            if let Err(e) = handle.task.await {
                tracing::warn!(error = %e, "Background refresh worker ended abnormally");
            }
        }
    }
}

async fn background_loop(inner: Arc<CoordinatorInner>, mut shutdown_rx: watch::Receiver<bool>) {
    let mut ticker = interval(inner.config.update_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::info!(
        cache_key = %inner.cache_key,
        interval_secs = inner.config.update_interval.as_secs(),
        fetcher = inner.fetcher.name(),
        "Background refresh started"
    );

    loop {
        tokio::select! {
            biased;

            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    tracing::info!(cache_key = %inner.cache_key, "Background refresh shutting down");
                    break;
                }
            }

            _ = ticker.tick() => {
                run_cycle(&inner).await;
            }
        }
    }

    let snapshot = inner.metrics.snapshot();
    tracing::info!(
        background_cycles = snapshot.background_cycles,
        background_failures = snapshot.background_failures,
        cache_hits = snapshot.cache_hits,
        cache_misses = snapshot.cache_misses,
        upstream_fetches = snapshot.upstream_fetches,
        upstream_failures = snapshot.upstream_failures,
        stale_served = snapshot.stale_served,
        items_dropped = snapshot.items_dropped,
        "Background refresh stopped"
    );
}

async fn run_cycle(inner: &Arc<CoordinatorInner>) {
    RefreshMetrics::incr(&inner.metrics.background_cycles);

    match CoordinatorInner::refresh(inner).await {
        Ok(response) if response.is_stale() => {
            RefreshMetrics::incr(&inner.metrics.background_failures);
            tracing::warn!(
                cache_key = %inner.cache_key,
                last_update = %response.last_update,
                "Background refresh failed, cache left at previous data"
            );
        }
        Ok(response) => {
            tracing::debug!(
                cache_key = %inner.cache_key,
                items = response.items.len(),
                "Background refresh completed"
            );
        }
        Err(e) => {
            RefreshMetrics::incr(&inner.metrics.background_failures);
            tracing::error!(cache_key = %inner.cache_key, error = %e, "Background refresh failed");
        }
    }
}
