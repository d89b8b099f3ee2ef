//! Redis cache backend.
//!
//! The connection is established lazily on first use so the service starts
//! even when Redis is down. A [`ConnectionManager`] reconnects on its own after
//! transient failures; every command is bounded by an operation timeout.
//!
//! At most one connect attempt runs at a time. Callers arriving while it runs,
//! or within the reconnect cooldown after it failed, get
//! [`StoreError::Unavailable`] immediately.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, RedisResult};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

use skinport_core::StoreError;

use crate::store::{ttl_seconds, CacheBackend, StoreResult};

/// Connection settings for [`RedisBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedisSettings {
    pub url: String,
    pub connect_timeout: Duration,
    pub operation_timeout: Duration,
    /// How long callers fail fast after a failed connect attempt.
    pub reconnect_cooldown: Duration,
}

impl Default for RedisSettings {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            connect_timeout: Duration::from_secs(2),
            operation_timeout: Duration::from_secs(2),
            reconnect_cooldown: Duration::from_secs(5),
        }
    }
}

impl RedisSettings {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    pub fn with_reconnect_cooldown(mut self, cooldown: Duration) -> Self {
        self.reconnect_cooldown = cooldown;
        self
    }
}

#[derive(Default)]
struct ConnectionState {
    manager: Option<ConnectionManager>,
    connecting: bool,
    last_failure: Option<Instant>,
}

/// [`CacheBackend`] over a single multiplexed Redis connection.
pub struct RedisBackend {
    client: redis::Client,
    settings: RedisSettings,
    state: Arc<Mutex<ConnectionState>>,
}

impl std::fmt::Debug for RedisBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisBackend")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl RedisBackend {
    /// Validate the URL without connecting.
    pub fn new(settings: RedisSettings) -> StoreResult<Self> {
        let client = redis::Client::open(settings.url.as_str()).map_err(|e| {
            StoreError::InvalidUrl {
                reason: e.to_string(),
            }
        })?;

        Ok(Self {
            client,
            settings,
            state: Arc::new(Mutex::new(ConnectionState::default())),
        })
    }

    pub fn settings(&self) -> &RedisSettings {
        &self.settings
    }

    fn state(&self) -> MutexGuard<'_, ConnectionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The shared connection, opened on first use.
    ///
    /// The state lock is never held across an await. The connect attempt runs
    /// on its own task so it settles even if the caller is dropped.
    async fn connection(&self) -> StoreResult<ConnectionManager> {
        {
            let mut state = self.state();
            if let Some(conn) = state.manager.as_ref() {
                return Ok(conn.clone());
            }
            if state.connecting {
                return Err(StoreError::Unavailable {
                    reason: "connect attempt in progress".to_string(),
                });
            }
            if let Some(failed_at) = state.last_failure {
                if failed_at.elapsed() < self.settings.reconnect_cooldown {
                    return Err(StoreError::Unavailable {
                        reason: "reconnect cooldown after failed connect".to_string(),
                    });
                }
            }
            state.connecting = true;
        }

        let attempt = tokio::spawn(connect(
            self.client.clone(),
            self.settings.connect_timeout,
            Arc::clone(&self.state),
        ));
        match attempt.await {
            Ok(result) => result,
            Err(e) => {
                self.state().connecting = false;
                Err(StoreError::Unavailable {
                    reason: format!("connect task failed: {}", e),
                })
            }
        }
    }

    async fn timed<T, F>(&self, operation: &str, fut: F) -> StoreResult<T>
    where
        F: Future<Output = RedisResult<T>>,
    {
        let timeout = self.settings.operation_timeout;
        match tokio::time::timeout(timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(StoreError::Unavailable {
                reason: format!("{} failed: {}", operation, e),
            }),
            Err(_) => Err(StoreError::Timeout {
                operation: operation.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            }),
        }
    }
}

async fn connect(
    client: redis::Client,
    timeout: Duration,
    state: Arc<Mutex<ConnectionState>>,
) -> StoreResult<ConnectionManager> {
    let result = match tokio::time::timeout(timeout, ConnectionManager::new(client)).await {
        Ok(Ok(conn)) => Ok(conn),
        Ok(Err(e)) => Err(StoreError::Unavailable {
            reason: e.to_string(),
        }),
        Err(_) => Err(StoreError::Timeout {
            operation: "CONNECT".to_string(),
            timeout_ms: timeout.as_millis() as u64,
        }),
    };

    let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
    state.connecting = false;
    match &result {
        Ok(conn) => {
            state.manager = Some(conn.clone());
            state.last_failure = None;
            tracing::info!("Connected to Redis");
        }
        Err(e) => {
            state.last_failure = Some(Instant::now());
            tracing::warn!(error = %e, "Redis connect failed");
        }
    }
    result
}

#[async_trait]
impl CacheBackend for RedisBackend {
    fn name(&self) -> &str {
        "redis"
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let mut conn = self.connection().await?;
        self.timed("GET", conn.get::<_, Option<String>>(key)).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> StoreResult<()> {
        let mut conn = self.connection().await?;
        match ttl {
            Some(ttl) => {
                self.timed("SETEX", conn.set_ex::<_, _, ()>(key, value, ttl_seconds(ttl)))
                    .await
            }
            None => self.timed("SET", conn.set::<_, _, ()>(key, value)).await,
        }
    }

    async fn ping(&self) -> StoreResult<()> {
        let mut conn = self.connection().await?;
        let cmd = redis::cmd("PING");
        let _pong: String = self.timed("PING", cmd.query_async(&mut conn)).await?;
        Ok(())
    }

    async fn disconnect(&self) -> StoreResult<()> {
        let taken = self.state().manager.take();
        let Some(mut conn) = taken else {
            return Ok(());
        };
        let cmd = redis::cmd("QUIT");
        let _: () = self.timed("QUIT", cmd.query_async(&mut conn)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_url_is_rejected_without_connecting() {
        let result = RedisBackend::new(RedisSettings::new("not-a-url"));
        assert!(matches!(result, Err(StoreError::InvalidUrl { .. })));
    }

    #[test]
    fn test_valid_url_constructs_lazily() {
        let backend = RedisBackend::new(
            RedisSettings::new("redis://127.0.0.1:6390").with_connect_timeout(Duration::from_millis(50)),
        )
        .unwrap();
        assert_eq!(backend.name(), "redis");
        assert_eq!(backend.settings().connect_timeout, Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_disconnect_without_connection_is_noop() {
        let backend = RedisBackend::new(RedisSettings::default()).unwrap();
        assert!(backend.disconnect().await.is_ok());
    }
}
