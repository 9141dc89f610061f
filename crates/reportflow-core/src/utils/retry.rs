/// Bounded retry with linear backoff for resilient operations
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Classifies failures that may succeed on another attempt
pub trait Retriable {
    fn is_retriable(&self) -> bool;
}

/// Retry configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy whose delay grows linearly with the attempt number
    pub fn linear(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay: base_delay.saturating_mul(max_attempts.max(1)),
        }
    }

    /// Calculates the pause after a failed attempt (1-based)
    ///
    /// Formula: min(base_delay * attempt, max_delay)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(attempt.max(1))
            .min(self.max_delay)
    }
}

/// Why a retried operation gave up
#[derive(Debug)]
pub struct RetryFailure<E> {
    /// Attempts actually made
    pub attempts: u32,
    /// Error of the last attempt
    pub error: E,
    /// True when the operation stopped on a non-retriable error
    pub permanent: bool,
}

/// Runs `operation` until it succeeds, fails permanently or the policy runs
/// out of attempts. The operation receives the 1-based attempt number.
///
/// # Example
/// ```ignore
/// let link = retry_with_backoff(
///     |attempt| async move { shorten_once(attempt).await },
///     &RetryPolicy::linear(3, Duration::from_secs(1)),
///     "short_link",
/// ).await?;
/// ```
pub async fn retry_with_backoff<F, Fut, T, E>(
    mut operation: F,
    policy: &RetryPolicy,
    operation_name: &str,
) -> Result<T, RetryFailure<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retriable + Display,
{
    let mut attempt = 1;

    loop {
        match operation(attempt).await {
            Ok(result) => {
                if attempt > 1 {
                    debug!(
                        operation = operation_name,
                        attempt = attempt,
                        "Operation succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(e) => {
                if !e.is_retriable() {
                    warn!(
                        operation = operation_name,
                        attempt = attempt,
                        error = %e,
                        "Permanent error, not retrying"
                    );
                    return Err(RetryFailure {
                        attempts: attempt,
                        error: e,
                        permanent: true,
                    });
                }

                if attempt >= policy.max_attempts {
                    warn!(
                        operation = operation_name,
                        attempt = attempt,
                        max_attempts = policy.max_attempts,
                        error = %e,
                        "Max attempts exhausted"
                    );
                    return Err(RetryFailure {
                        attempts: attempt,
                        error: e,
                        permanent: false,
                    });
                }

                let delay = policy.delay_for(attempt);
                warn!(
                    operation = operation_name,
                    attempt = attempt,
                    max_attempts = policy.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Attempt failed, will retry after delay"
                );

                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
