//! Retry with linear backoff.
//!
//! An idempotent request is driven through a small state machine:
//!
//! ```text
//! Attempting ──ok──────────────► Success
//!     │
//!     ├─transient, retries left─► RetryWait ──sleep──► Attempting
//!     │
//!     └─fatal or exhausted──────► Failed
//! ```
//!
//! With `max_retries = 3` and a 2 second step the waits are 2s, 4s, 6s.

use std::future::Future;
use std::time::Duration;

use crate::error::{AppError, Result};
use crate::models::ScraperConfiguration;

/// Retry limits and backoff step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt
    max_retries: u32,
    /// Wait before retry `n` is `backoff_step * n`
    backoff_step: Duration,
}

/// One state of a retried operation.
#[derive(Debug)]
pub enum RetryState<T> {
    /// About to run attempt `attempt` (1-indexed)
    Attempting { attempt: u32 },
    /// Attempt `attempt` failed transiently; wait `delay` before the next one
    RetryWait {
        attempt: u32,
        delay: Duration,
        cause: AppError,
    },
    /// The operation produced a value
    Success(T),
    /// No further attempts will be made
    Failed(AppError),
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff_step: Duration) -> Self {
        Self {
            max_retries,
            backoff_step,
        }
    }

    pub fn from_config(config: &ScraperConfiguration) -> Result<Self> {
        Ok(Self::new(
            config.max_retry_attempts,
            config.retry_backoff()?,
        ))
    }

    /// Attempts made before giving up on a persistently transient failure.
    pub fn total_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Wait before the retry that follows failed attempt `attempt`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_step.saturating_mul(attempt)
    }

    /// Next state after attempt `attempt` finished with `outcome`.
    pub fn transition<T>(&self, attempt: u32, outcome: Result<T>) -> RetryState<T> {
        match outcome {
            Ok(value) => RetryState::Success(value),
            Err(cause) if !cause.is_transient() => RetryState::Failed(cause),
            Err(cause) if attempt > self.max_retries => {
                RetryState::Failed(Self::exhausted(attempt, cause))
            }
            Err(cause) => RetryState::RetryWait {
                attempt,
                delay: self.backoff(attempt),
                cause,
            },
        }
    }

    /// Drive `operation` until it succeeds, fails fatally, or runs out of retries.
    ///
    /// `operation` receives the 1-indexed attempt number.
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut state = RetryState::Attempting { attempt: 1 };
        loop {
            state = match state {
                RetryState::Attempting { attempt } => {
                    let outcome = operation(attempt).await;
                    self.transition(attempt, outcome)
                }
                RetryState::RetryWait {
                    attempt,
                    delay,
                    cause,
                } => {
                    log::warn!(
                        "Request failed, retrying in {:.1}s ({}/{}): {}",
                        delay.as_secs_f64(),
                        attempt,
                        self.max_retries,
                        cause
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    RetryState::Attempting {
                        attempt: attempt + 1,
                    }
                }
                RetryState::Success(value) => return Ok(value),
                RetryState::Failed(error) => return Err(error),
            };
        }
    }

    fn exhausted(attempts: u32, cause: AppError) -> AppError {
        match cause {
            AppError::Transient { url, message } => AppError::fatal(
                url,
                format!("gave up after {attempts} attempts: {message}"),
            ),
            other => other,
        }
    }
}
