// src/error_recovery.rs
//! Retry with exponential backoff for API operations.

use crate::constants::{RETRY_INITIAL_DELAY, RETRY_MAX_ATTEMPTS};
use crate::error::AppError;
use std::time::Duration;

/// How often and how patiently a failed remote call is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: RETRY_MAX_ATTEMPTS,
            initial_delay: RETRY_INITIAL_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(self, max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..self
        }
    }

    /// The pause taken after each failed attempt except the last.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (0..self.max_attempts.saturating_sub(1)).map(move |n| self.initial_delay * 2u32.pow(n))
    }
}

/// Retries an async operation with exponential backoff.
///
/// Only errors for which `AppError::is_retryable` holds are retried; any
/// other error is returned on the spot. When the attempts run out the last
/// transient error is returned unchanged.
pub async fn retry_with_backoff<F, T, Fut>(
    label: &str,
    policy: RetryPolicy,
    mut operation: F,
) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, AppError>>,
{
    let mut delay = policy.initial_delay;
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if e.is_retryable() && attempt < policy.max_attempts => {
                log::warn!(
                    "{} failed (attempt {}/{}): {}; retrying after {:?}",
                    label,
                    attempt,
                    policy.max_attempts,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
                delay *= 2;
                attempt += 1;
            }
            Err(e) => {
                if e.is_retryable() {
                    log::error!("{} failed after {} attempts: {}", label, attempt, e);
                } else {
                    log::error!("{} failed: {}", label, e);
                }
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NotionErrorCode;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn rate_limited() -> AppError {
        AppError::NotionService {
            code: NotionErrorCode::RateLimited,
            message: "rate limited".into(),
            status: 429,
        }
    }

    #[test]
    fn default_schedule_doubles_from_half_a_second() {
        let delays: Vec<_> = RetryPolicy::default().delays().collect();
        assert_eq!(
            delays,
            vec![
                Duration::from_millis(500),
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = retry_with_backoff("lookup", RetryPolicy::default(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(AppError::NotionService {
                    code: NotionErrorCode::ObjectNotFound,
                    message: "missing".into(),
                    status: 404,
                })
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn single_attempt_policy_returns_first_error() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::default().with_max_attempts(1);
        let result: Result<(), _> = retry_with_backoff("once", policy, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(rate_limited()) }
        })
        .await;

        assert!(result.unwrap_err().is_retryable());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
