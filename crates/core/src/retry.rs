//! Timeout and retry policy for gateway calls.
//!
//! Every call to an external collaborator (language model, retriever, web
//! search) goes through [`with_retry`] so that failure semantics are the same
//! everywhere: each attempt has a deadline, transient failures are retried
//! with exponential backoff, everything else surfaces immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::{AppError, AppResult};

/// Per-call deadline and retry budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Deadline for a single attempt
    pub timeout: Duration,

    /// Retries after the first attempt (0 = try once)
    pub max_retries: u32,

    /// Sleep before the first retry; doubles on every subsequent one
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            max_retries: 2,
            initial_backoff: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// A policy that tries exactly once with the given deadline.
    pub fn no_retry(timeout: Duration) -> Self {
        Self {
            timeout,
            max_retries: 0,
            initial_backoff: Duration::ZERO,
        }
    }
}

/// Run `op` under `policy`.
///
/// `name` identifies the gateway in logs and in the timeout error.
pub async fn with_retry<F, Fut, T>(policy: &RetryPolicy, name: &str, mut op: F) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let mut backoff = policy.initial_backoff;
    let mut attempt = 0u32;

    loop {
        let result = match tokio::time::timeout(policy.timeout, op()).await {
            Ok(result) => result,
            Err(_) => Err(AppError::Timeout(format!(
                "{} call exceeded {}ms",
                name,
                policy.timeout.as_millis()
            ))),
        };

        match result {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < policy.max_retries => {
                attempt += 1;
                tracing::warn!(
                    gateway = name,
                    attempt = attempt,
                    max_retries = policy.max_retries,
                    backoff_ms = backoff.as_millis() as u64,
                    "Gateway call failed, retrying: {}",
                    e
                );
                tokio::time::sleep(backoff).await;
                backoff = next_backoff(backoff);
            }
            Err(e) => return Err(e),
        }
    }
}

/// Doubled backoff, clamped at `Duration::MAX`.
fn next_backoff(backoff: Duration) -> Duration {
    backoff.saturating_mul(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            timeout: Duration::from_millis(200),
            max_retries,
            initial_backoff: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_success_first_try() {
        let calls = AtomicU32::new(0);
        let result = with_retry(&fast_policy(3), "test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, AppError>(42)
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retries_transient_then_succeeds() {
        let calls = AtomicU32::new(0);
        let result = with_retry(&fast_policy(3), "test", || async {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err(AppError::Network("connection reset".to_string()))
            } else {
                Ok("done")
            }
        })
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_budget() {
        let calls = AtomicU32::new(0);
        let result: AppResult<()> = with_retry(&fast_policy(2), "test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(AppError::Network("unreachable".to_string()))
        })
        .await;

        assert!(matches!(result, Err(AppError::Network(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_not_retried() {
        let calls = AtomicU32::new(0);
        let result: AppResult<()> = with_retry(&fast_policy(5), "test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(AppError::Llm("invalid model".to_string()))
        })
        .await;

        assert!(matches!(result, Err(AppError::Llm(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_timeout_maps_to_error() {
        let policy = RetryPolicy::no_retry(Duration::from_millis(10));
        let result: AppResult<()> = with_retry(&policy, "slow", || async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;

        match result {
            Err(AppError::Timeout(msg)) => assert!(msg.contains("slow")),
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[test]
    fn test_backoff_doubles_and_saturates() {
        assert_eq!(next_backoff(Duration::from_millis(500)), Duration::from_secs(1));
        assert_eq!(next_backoff(Duration::MAX), Duration::MAX);
        assert_eq!(next_backoff(Duration::MAX / 2 + Duration::from_secs(1)), Duration::MAX);
    }
}
