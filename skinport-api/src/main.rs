//! Skinport API Server Entry Point
//!
//! Bootstraps configuration, the cache store, the upstream fetcher and the
//! refresh coordinator, then serves HTTP until Ctrl-C or SIGTERM.

use std::sync::Arc;
use tokio::signal;

use skinport_api::{
    create_api_router, init_tracing, ApiConfig, ApiError, ApiResult, AppState, TelemetryConfig,
};
use skinport_core::SkinportResult;
use skinport_fetch::build_fetcher;
use skinport_refresh::{CoordinatorConfig, RefreshCoordinator};
use skinport_storage::{CacheStore, RedisBackend, RedisSettings, TolerantStore};

#[tokio::main]
async fn main() -> ApiResult<()> {
    init_tracing(&TelemetryConfig::default())?;

    let config = ApiConfig::from_env()?;
    let service = &config.service;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        fetcher = service.fetcher_kind.as_str(),
        update_interval_secs = service.update_interval.as_secs(),
        cache_key = %service.cache.cache_key(),
        "Starting Skinport price service"
    );

    let (store, coordinator) = build_services(&config)?;
    coordinator.start();

    let state = Arc::new(AppState::new(coordinator.clone(), Arc::clone(&store)));
    let app = create_api_router(state, &config);

    let addr = config.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;
    tracing::info!(%addr, "Listening");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    coordinator.shutdown().await;
    store.disconnect().await;
    tracing::info!("Shutdown complete");

    served.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))
}

/// Build the cache store and the refresh coordinator without starting anything.
fn build_services(config: &ApiConfig) -> SkinportResult<(Arc<dyn CacheStore>, RefreshCoordinator)> {
    let service = &config.service;

    let redis = RedisBackend::new(
        RedisSettings::new(service.redis_url.clone())
            .with_connect_timeout(service.redis_connect_timeout),
    )?;
    let store: Arc<dyn CacheStore> = Arc::new(TolerantStore::new(redis));

    let fetcher = build_fetcher(service.fetcher_kind, &service.upstream, &service.fetcher)?;
    let coordinator = RefreshCoordinator::new(
        Arc::clone(&store),
        fetcher,
        CoordinatorConfig::from_service_config(service),
    )?;
    Ok((store, coordinator))
}

/// Wait for Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl-C"),
        _ = terminate => tracing::info!("Received SIGTERM"),
    }
}
