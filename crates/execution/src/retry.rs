//! Bounded retry with a fixed backoff.

use std::fmt::{Debug, Display};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, warn};

/// How many times to try and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, the first one included.
    pub max_attempts: u32,
    /// Fixed delay between attempts.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(4, Duration::from_secs(2))
    }
}

impl RetryPolicy {
    #[must_use]
    pub const fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts,
            backoff,
        }
    }

    /// Policy for custody status reads: 3 attempts, 5 seconds apart.
    #[must_use]
    pub const fn status_reads() -> Self {
        Self::new(3, Duration::from_secs(5))
    }

    /// A single attempt.
    #[must_use]
    pub const fn once() -> Self {
        Self::new(1, Duration::ZERO)
    }
}

/// All attempts failed.
#[derive(Debug, Error)]
#[error("gave up after {attempts} attempts: {last}")]
pub struct RetryExhausted<E> {
    /// Attempts made.
    pub attempts: u32,
    /// Error from the final attempt.
    pub last: E,
}

/// Runs `op` until it succeeds or the policy is exhausted.
///
/// `op` receives the 1-based attempt number.
///
/// # Errors
/// Returns [`RetryExhausted`] with the last error once every attempt failed.
pub async fn retry<T, E, F, Fut>(
    operation: &str,
    policy: RetryPolicy,
    op: F,
) -> Result<T, RetryExhausted<E>>
where
    E: Display + Debug,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    retry_if(operation, policy, |_| true, op).await
}

/// Like [`retry`], but stops at the first error `should_retry` rejects.
///
/// # Errors
/// Returns [`RetryExhausted`] carrying the attempts made so far and the
/// error that ended the loop.
pub async fn retry_if<T, E, F, Fut, P>(
    operation: &str,
    policy: RetryPolicy,
    should_retry: P,
    mut op: F,
) -> Result<T, RetryExhausted<E>>
where
    E: Display + Debug,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match op(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(operation, attempts = attempt, "Operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) if attempt >= max_attempts || !should_retry(&err) => {
                warn!(operation, attempts = attempt, error = %err, "Giving up");
                return Err(RetryExhausted {
                    attempts: attempt,
                    last: err,
                });
            }
            Err(err) => {
                warn!(
                    operation,
                    attempt,
                    max_attempts,
                    backoff_ms = policy.backoff.as_millis() as u64,
                    error = %err,
                    "Attempt failed, retrying"
                );
                sleep(policy.backoff).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_first_success_makes_one_attempt() {
        let calls = AtomicU32::new(0);
        let result = retry("op", RetryPolicy::default(), |_| async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, String>(42)
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_keeps_last_error() {
        let start = Instant::now();
        let result = retry("op", RetryPolicy::default(), |attempt| async move {
            Err::<(), _>(format!("failure {attempt}"))
        })
        .await;

        let err = result.unwrap_err();
        assert_eq!(err.attempts, 4);
        assert_eq!(err.last, "failure 4");
        assert_eq!(start.elapsed(), Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_transient_failures() {
        let result = retry("op", RetryPolicy::status_reads(), |attempt| async move {
            if attempt < 3 { Err("busy") } else { Ok(attempt) }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_error_stops_early() {
        let calls = AtomicU32::new(0);
        let result = retry_if(
            "op",
            RetryPolicy::default(),
            |e: &&str| *e != "reverted",
            |_| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>("reverted")
            },
        )
        .await;

        assert_eq!(result.unwrap_err().attempts, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
