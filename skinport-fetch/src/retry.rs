//! Bounded retries with linear backoff.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use skinport_core::{FetchError, FetcherConfig};

/// How many times to attempt an operation and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero is treated as one.
    pub max_attempts: u32,
    /// Base delay; the wait after failed attempt `n` is `retry_delay * n`.
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&FetcherConfig::default())
    }
}

impl From<&FetcherConfig> for RetryPolicy {
    fn from(config: &FetcherConfig) -> Self {
        Self {
            max_attempts: config.max_retries,
            retry_delay: config.retry_delay,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, retry_delay: Duration) -> Self {
        Self {
            max_attempts,
            retry_delay,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Wait after failed attempt `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.retry_delay.saturating_mul(attempt)
    }
}

/// Run `op` until it succeeds or the policy's attempts are exhausted.
///
/// `op` receives the 1-based attempt number. Each attempt is independent; no
/// state is carried between them except the count.
pub async fn with_retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    context: &str,
    mut op: F,
) -> Result<T, FetchError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = policy.attempts();
    let mut attempt = 1;

    loop {
        tracing::debug!(context = %context, attempt, "Attempting upstream operation");

        match op(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!(context = %context, attempt, "Upstream operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) if attempt < max_attempts => {
                let delay = policy.delay_after(attempt);
                tracing::warn!(
                    context = %context,
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Upstream attempt failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                tracing::error!(
                    context = %context,
                    attempts = attempt,
                    error = %e,
                    "Upstream operation failed, attempts exhausted"
                );
                return Err(FetchError::Failed {
                    context: context.to_string(),
                    attempts: attempt,
                    last_error: e.to_string(),
                });
            }
        }
    }
}
