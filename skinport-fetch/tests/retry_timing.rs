//! Backoff timing measured on a paused tokio clock.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

use skinport_core::FetchError;
use skinport_fetch::{with_retry, RetryPolicy};

#[tokio::test(start_paused = true)]
async fn exhausted_retries_sleep_linearly_between_attempts() {
    let delay = Duration::from_secs(2);
    let policy = RetryPolicy::new(3, delay);
    let start = Instant::now();
    let attempt_times = Arc::new(Mutex::new(Vec::new()));

    let recorded = attempt_times.clone();
    let result: Result<(), FetchError> = with_retry(&policy, "HTTP Request to upstream", |attempt| {
        recorded.lock().unwrap().push((attempt, start.elapsed()));
        async move { Err::<(), _>(format!("boom {}", attempt)) }
    })
    .await;

    match result {
        Err(FetchError::Failed {
            context,
            attempts,
            last_error,
        }) => {
            assert_eq!(context, "HTTP Request to upstream");
            assert_eq!(attempts, 3);
            assert_eq!(last_error, "boom 3");
        }
        other => panic!("unexpected result: {:?}", other),
    }

    let times = attempt_times.lock().unwrap().clone();
    assert_eq!(
        times,
        vec![
            (1, Duration::ZERO),
            (2, delay),
            (3, delay * 3),
        ]
    );
    assert_eq!(start.elapsed(), delay * 3);
}

#[tokio::test(start_paused = true)]
async fn success_after_failures_stops_retrying() {
    let policy = RetryPolicy::new(5, Duration::from_millis(100));
    let start = Instant::now();
    let calls = Arc::new(Mutex::new(0u32));

    let counter = calls.clone();
    let result = with_retry(&policy, "op", |attempt| {
        *counter.lock().unwrap() += 1;
        async move {
            if attempt < 3 {
                Err("transient")
            } else {
                Ok(attempt)
            }
        }
    })
    .await;

    assert_eq!(result.unwrap(), 3);
    assert_eq!(*calls.lock().unwrap(), 3);
    assert_eq!(start.elapsed(), Duration::from_millis(300));
}

#[tokio::test(start_paused = true)]
async fn failure_message_mentions_attempt_count() {
    let policy = RetryPolicy::new(3, Duration::from_millis(1));
    let err = with_retry(&policy, "HTTP Request to x", |_| async { Err::<(), _>("down") })
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "HTTP Request to x failed after 3 attempts: down"
    );
}
