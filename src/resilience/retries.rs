//! Retry of fallible remote operations.
//!
//! Operations report their outcome as a [`Fetched`] pair instead of a
//! `Result`, so the retry loop does not depend on how a particular backend
//! client signals failure. A pair carrying an `error` is retried; anything
//! else is returned at once.

use std::future::Future;
use std::time::Duration;
use thiserror::Error;

use crate::config::RetryConfig;
use crate::observability::metrics;
use crate::resilience::backoff::calculate_backoff;

/// Outcome of one remote call: data, an error marker, or neither.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<T, E> {
    pub data: Option<T>,
    pub error: Option<E>,
}

impl<T, E> Fetched<T, E> {
    pub fn ok(data: T) -> Self {
        Self { data: Some(data), error: None }
    }

    pub fn err(error: E) -> Self {
        Self { data: None, error: Some(error) }
    }

    /// No row and no error (e.g. a lookup that matched nothing).
    pub fn empty() -> Self {
        Self { data: None, error: None }
    }

    pub fn is_err(&self) -> bool {
        self.error.is_some()
    }
}

impl<T, E> From<Result<T, E>> for Fetched<T, E> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(error) => Self::err(error),
        }
    }
}

/// Failure surfaced once every attempt has been used.
#[derive(Debug, Error)]
#[error("gave up after {attempts} attempt(s): {last}")]
pub struct RetryError<E> {
    /// How many times the operation was invoked.
    pub attempts: u32,
    /// The error reported by the final attempt.
    pub last: E,
}

/// Bounds for one retry sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter_ratio: f64,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay_ms: u64) -> Self {
        Self {
            max_attempts,
            base_delay_ms,
            ..Self::default()
        }
    }

    /// Wait applied after the attempt at `attempt_index` (zero-based) failed.
    pub fn delay_for(&self, attempt_index: u32) -> Duration {
        calculate_backoff(attempt_index, self.base_delay_ms, self.max_delay_ms, self.jitter_ratio)
    }

    /// Upper bound on time spent waiting across a full sequence, jitter excluded.
    pub fn worst_case_wait(&self) -> Duration {
        (0..self.max_attempts.max(1) - 1)
            .map(|i| calculate_backoff(i, self.base_delay_ms, self.max_delay_ms, 0.0))
            .sum()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            max_delay_ms: 5000,
            jitter_ratio: 0.0,
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            base_delay_ms: config.base_delay_ms,
            max_delay_ms: config.max_delay_ms,
            jitter_ratio: config.jitter_ratio,
        }
    }
}

/// Run `operation` until it reports no error or the policy is exhausted.
///
/// Each call owns its own attempt counter, so concurrent sequences never
/// interfere. Waiting suspends the task; it never blocks the runtime.
/// Only pass idempotent operations.
pub async fn retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    operation_name: &str,
    mut operation: F,
) -> Result<Option<T>, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Fetched<T, E>>,
    E: std::fmt::Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempts = 0u32;

    loop {
        let fetched = operation().await;
        attempts += 1;

        let error = match fetched.error {
            None => {
                metrics::record_fetch_attempt(operation_name, "success");
                if attempts > 1 {
                    tracing::info!(operation = operation_name, attempts, "Remote operation recovered");
                }
                return Ok(fetched.data);
            }
            Some(error) => error,
        };

        metrics::record_fetch_attempt(operation_name, "failure");

        if attempts >= max_attempts {
            metrics::record_retry_exhausted(operation_name);
            tracing::warn!(
                operation = operation_name,
                attempts,
                error = %error,
                "Remote operation failed, retries exhausted"
            );
            return Err(RetryError { attempts, last: error });
        }

        let delay = policy.delay_for(attempts - 1);
        tracing::info!(
            operation = operation_name,
            attempt = attempts,
            delay = ?delay,
            error = %error,
            "Retrying remote operation"
        );
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tokio::time::Instant;

    fn assert_waited(start: Instant, expected_ms: u64) {
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(expected_ms), "waited {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(expected_ms + 10), "waited {:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fails_twice_then_succeeds() {
        let mut calls = 0u32;
        let start = Instant::now();

        let result = retry(&RetryPolicy::new(3, 1000), "test", || {
            calls += 1;
            let n = calls;
            async move {
                if n < 3 {
                    Fetched::err("unavailable")
                } else {
                    Fetched::ok("payload")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), Some("payload"));
        assert_eq!(calls, 3);
        // 1000ms after the first failure, 2000ms after the second.
        assert_waited(start, 3000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_failing_surfaces_last_error() {
        let mut calls = 0u32;
        let start = Instant::now();

        let result: Result<Option<()>, _> = retry(&RetryPolicy::new(3, 1000), "test", || {
            calls += 1;
            let n = calls;
            async move { Fetched::err(format!("failure {}", n)) }
        })
        .await;

        let err = result.unwrap_err();
        assert_eq!(calls, 3);
        assert_eq!(err.attempts, 3);
        assert_eq!(err.last, "failure 3");
        assert_waited(start, 3000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_returns_without_waiting() {
        let mut calls = 0u32;
        let start = Instant::now();

        let result: Result<Option<u32>, RetryError<String>> =
            retry(&RetryPolicy::default(), "test", || {
                calls += 1;
                async { Fetched::ok(7) }
            })
            .await;

        assert_eq!(result.unwrap(), Some(7));
        assert_eq!(calls, 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_pair_is_not_a_failure() {
        let result: Result<Option<u32>, RetryError<String>> =
            retry(&RetryPolicy::default(), "test", || async { Fetched::empty() }).await;
        assert_eq!(result.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_attempts_still_calls_once() {
        let mut calls = 0u32;
        let result: Result<Option<()>, _> = retry(&RetryPolicy::new(0, 1000), "test", || {
            calls += 1;
            async { Fetched::err("down") }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_sequences_keep_separate_counters() {
        let flaky_calls = Arc::new(AtomicU32::new(0));
        let healthy_calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::new(3, 1000);

        let flaky = {
            let calls = flaky_calls.clone();
            retry(&policy, "flaky", move || {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n < 2 {
                        Fetched::err("timeout")
                    } else {
                        Fetched::ok(n)
                    }
                }
            })
        };
        let healthy = {
            let calls = healthy_calls.clone();
            retry(&policy, "healthy", move || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Fetched::<u32, &str>::ok(1) }
            })
        };

        let (flaky, healthy) = tokio::join!(flaky, healthy);
        assert_eq!(flaky.unwrap(), Some(2));
        assert_eq!(healthy.unwrap(), Some(1));
        assert_eq!(flaky_calls.load(Ordering::SeqCst), 2);
        assert_eq!(healthy_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_policy_delays() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(1), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(5), Duration::from_millis(5000));
        assert_eq!(policy.worst_case_wait(), Duration::from_millis(3000));
    }

    #[test]
    fn test_fetched_from_result() {
        let ok: Fetched<u8, &str> = Ok(1).into();
        assert_eq!(ok, Fetched::ok(1));
        let err: Fetched<u8, &str> = Err("boom").into();
        assert!(err.is_err());
    }
}
