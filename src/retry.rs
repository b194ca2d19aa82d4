//! Bounded retry with a fixed or multiplying delay between attempts.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// How many times an operation is attempted and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
    multiplier: u32,
}

impl RetryPolicy {
    /// `max_attempts` is clamped to at least one attempt
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
            multiplier: 1,
        }
    }

    /// A single attempt, no waiting
    pub fn once() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Multiply the delay after every failed attempt (1 = fixed delay)
    pub fn with_multiplier(mut self, multiplier: u32) -> Self {
        self.multiplier = multiplier.max(1);
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay slept before the 1-based `attempt`. The first attempt never waits.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        let factor = self.multiplier.saturating_pow(attempt - 2);
        self.delay.saturating_mul(factor)
    }
}

/// Returned when every attempt failed
#[derive(Debug, thiserror::Error)]
#[error("{operation} failed after {attempts} attempt(s): {last_error}")]
pub struct RetryError<E> {
    pub operation: String,
    pub attempts: u32,
    pub last_error: E,
}

/// Run `probe` until it succeeds or the policy is exhausted.
///
/// The probe receives the 1-based attempt number. No delay follows the final
/// failed attempt.
pub async fn retry_with_policy<T, E, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut probe: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut attempt = 1;

    loop {
        match probe(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    info!(operation, attempt, "Succeeded after retrying");
                }
                return Ok(value);
            }
            Err(err) if attempt >= policy.max_attempts => {
                warn!(
                    operation,
                    attempts = attempt,
                    error = %err,
                    "Giving up, retry budget exhausted"
                );
                return Err(RetryError {
                    operation: operation.to_string(),
                    attempts: attempt,
                    last_error: err,
                });
            }
            Err(err) => {
                let delay = policy.delay_before(attempt + 1);
                warn!(
                    operation,
                    attempt,
                    max_attempts = policy.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Attempt failed, retrying"
                );
                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
