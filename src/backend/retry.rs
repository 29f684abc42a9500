//! Bounded retry with a fixed delay between attempts.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::StoreError;

/// Attempts a backing store call gets by default: one plus twenty reconnects.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 21;

/// Delay between attempts by default.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

// == Retry Policy ==
/// How many times to try an operation and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Fixed wait between consecutive attempts
    pub delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy; `max_attempts` is clamped to at least one.
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Single attempt, no waiting.
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY)
    }
}

// == Retry ==
/// Runs `op` until it succeeds, fails with a non-retryable error, or the
/// policy's attempts are used up.
///
/// Only [`StoreError::is_retryable`] failures are retried. Exhausting the
/// budget yields [`StoreError::Unavailable`]. The delay uses tokio's clock,
/// so tests can drive it with a paused runtime.
pub async fn retry<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, StoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if !err.is_retryable() => return Err(err),
            Err(err) if attempt >= policy.max_attempts => {
                warn!("Backing store unavailable after {} attempts: {}", attempt, err);
                return Err(StoreError::Unavailable { attempts: attempt });
            }
            Err(err) => {
                warn!(
                    "Reconnecting to backing store (attempt {}/{}): {}",
                    attempt + 1,
                    policy.max_attempts,
                    err
                );
                tokio::time::sleep(policy.delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn refused() -> StoreError {
        StoreError::Connection(io::Error::from(io::ErrorKind::ConnectionRefused))
    }

    /// Fails `failures` times with a connection error, then returns the attempt number.
    async fn flaky(calls: &AtomicU32, failures: u32) -> Result<u32, StoreError> {
        let call = calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= failures {
            Err(refused())
        } else {
            Ok(call)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_when_failures_below_budget() {
        let policy = RetryPolicy::new(5, Duration::from_secs(1));
        let calls = AtomicU32::new(0);

        let result = retry(&policy, || flaky(&calls, 4)).await;

        assert_eq!(result.unwrap(), 5);
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fails_after_exactly_max_attempts() {
        let policy = RetryPolicy::new(5, Duration::from_secs(1));
        let calls = AtomicU32::new(0);

        let result = retry(&policy, || flaky(&calls, 5)).await;

        assert!(matches!(result, Err(StoreError::Unavailable { attempts: 5 })));
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_fixed_delay_between_attempts() {
        let policy = RetryPolicy::new(4, Duration::from_secs(1));
        let calls = AtomicU32::new(0);
        let start = tokio::time::Instant::now();

        let _ = retry(&policy, || flaky(&calls, 10)).await;

        // Three waits between four attempts, none after the last one
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(3));
        assert!(elapsed < Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_non_retryable_error_returns_immediately() {
        let policy = RetryPolicy::new(5, Duration::from_secs(1));
        let calls = AtomicU32::new(0);

        let result: Result<(), StoreError> = retry(&policy, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(StoreError::Server("WRONGTYPE".to_string())) }
        })
        .await;

        assert!(matches!(result, Err(StoreError::Server(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 21);
        assert_eq!(policy.delay, Duration::from_secs(1));
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts, 1);
    }
}
