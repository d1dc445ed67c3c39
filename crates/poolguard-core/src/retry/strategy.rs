//! Retry strategy trait and the loops that drive it.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::error::{Result, SlotError};

/// A strategy for retrying failed slot initialization with backoff.
///
/// Implementations determine which errors are worth another attempt, how long
/// to wait between attempts, and when to give up.
pub trait BackoffStrategy: Send + Sync {
    /// Determine if an error is retryable.
    ///
    /// Default implementation defers to [`SlotError::is_retryable`]: factory
    /// failures and timeouts are retried, construction and codec errors are
    /// not.
    ///
    /// # Parameters
    /// - `error`: The error to evaluate
    /// - `attempt`: The current attempt number (0-indexed)
    fn should_retry(&self, error: &SlotError, attempt: u32) -> bool {
        let _ = attempt;
        error.is_retryable()
    }

    /// Calculate the delay before the next retry attempt.
    ///
    /// Called after a failure and before sleeping; `next_delay(0)` is the
    /// wait before the second try. `None` stops retrying.
    fn next_delay(&self, attempt: u32) -> Option<Duration>;

    /// Maximum number of retries after the initial attempt.
    ///
    /// `max_retries() == 3` means up to 4 attempts in total.
    fn max_retries(&self) -> u32;
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// the strategy gives up. Sleeps the current thread between attempts.
pub fn retry_blocking<S, T, F>(strategy: &S, mut operation: F) -> Result<T>
where
    S: BackoffStrategy + ?Sized,
    F: FnMut() -> Result<T>,
{
    let mut attempt = 0;
    loop {
        match operation() {
            Ok(value) => return Ok(value),
            Err(err) if !strategy.should_retry(&err, attempt) => return Err(err),
            Err(err) if attempt >= strategy.max_retries() => return Err(err),
            Err(err) => {
                let Some(delay) = strategy.next_delay(attempt) else {
                    return Err(err);
                };
                debug!(attempt, ?delay, error = %err, "retrying slot initialization");
                std::thread::sleep(delay);
                attempt += 1;
            }
        }
    }
}

/// Async counterpart of [`retry_blocking`], sleeping with `tokio::time::sleep`.
pub async fn retry<S, T, F, Fut>(strategy: &S, mut operation: F) -> Result<T>
where
    S: BackoffStrategy + ?Sized,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if !strategy.should_retry(&err, attempt) => return Err(err),
            Err(err) if attempt >= strategy.max_retries() => return Err(err),
            Err(err) => {
                let Some(delay) = strategy.next_delay(attempt) else {
                    return Err(err);
                };
                debug!(attempt, ?delay, error = %err, "retrying slot initialization");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
