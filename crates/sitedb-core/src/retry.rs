//! Bounded retry with exponential backoff
//!
//! Transient failures (conflicts, rate limits, timeouts, transport errors)
//! are retried with `base * 2^attempt` plus random jitter; fatal errors
//! (validation, auth, missing documents) return immediately. Each call
//! tracks its own attempt counter.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

use crate::error::{Result, StoreError};

/// Attempts made before a transient error is given up on
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Base backoff delay
const BACKOFF_BASE: Duration = Duration::from_millis(500);

/// Run an operation, retrying transient failures up to `max_attempts` times
///
/// `op_id` identifies the logical operation in retry logs. The final error
/// is returned unchanged once attempts are exhausted; non-transient errors
/// are returned after the first attempt.
pub async fn with_retry<T, F, Fut>(op_id: &str, max_attempts: u32, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt: u32 = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) if error.is_transient() && attempt + 1 < max_attempts => {
                let delay = backoff_delay(attempt);
                warn!(
                    op = op_id,
                    attempt = attempt + 1,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "transient failure, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(error) => return Err(error),
        }
    }
}

fn backoff_delay(attempt: u32) -> Duration {
    let jitter = rand::thread_rng().gen_range(0..BACKOFF_BASE.as_millis() as u64);
    BACKOFF_BASE * 2u32.saturating_pow(attempt) + Duration::from_millis(jitter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn transient() -> StoreError {
        StoreError::Conflict {
            collection: "posts".to_string(),
        }
    }

    fn fatal() -> StoreError {
        StoreError::Auth("bad credentials".to_string())
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_error_exhausts_max_attempts() {
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = attempts.clone();

        let result: Result<()> = with_retry("test", 5, || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(transient())
            }
        })
        .await;

        assert!(matches!(result, Err(StoreError::Conflict { .. })));
        assert_eq!(attempts.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_fatal_error_makes_one_attempt() {
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = attempts.clone();

        let result: Result<()> = with_retry("test", 5, || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(fatal())
            }
        })
        .await;

        assert!(matches!(result, Err(StoreError::Auth(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_after_transient_failures() {
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = attempts.clone();

        let result = with_retry("test", 5, || {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(transient())
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_immediate_success_makes_one_attempt() {
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = attempts.clone();

        let result = with_retry("test", 5, || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok("done")
            }
        })
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_backoff_grows_exponentially() {
        // Jitter adds at most one extra base period on top of base * 2^n.
        for attempt in 0..4 {
            let delay = backoff_delay(attempt);
            let floor = BACKOFF_BASE * 2u32.pow(attempt);
            assert!(delay >= floor);
            assert!(delay < floor + BACKOFF_BASE);
        }
    }
}
