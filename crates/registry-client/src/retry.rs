//! Retry logic with exponential backoff
//!
//! Transient failures (see [`Error::is_transient`]) are retried up to
//! [`RetryPolicy::max_attempts`] total attempts. The delay before retry `n`
//! is `initial_delay * backoff_multiplier^n`, capped at `max_delay`. A server
//! may ask for a specific delay through `Retry-After`; that value replaces the
//! computed one but is still capped.

use crate::{Error, Result};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first one
    pub max_attempts: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Maximum delay between attempts
    pub max_delay: Duration,
    /// Backoff multiplier (e.g., 2.0 for exponential backoff)
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Create a new retry policy
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Default::default()
        }
    }

    /// A policy that sends every request exactly once
    pub fn no_retry() -> Self {
        Self::new(1)
    }

    /// Set the initial delay
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the maximum delay
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Set the backoff multiplier
    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Calculate the delay before retry number `retry` (0-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        let delay_ms = self.initial_delay.as_millis() as f64
            * self.backoff_multiplier.powi(retry.min(i32::MAX as u32) as i32);

        if !delay_ms.is_finite() || delay_ms >= self.max_delay.as_millis() as f64 {
            return self.max_delay;
        }

        Duration::from_millis(delay_ms.max(0.0) as u64)
    }
}

/// A failed attempt, carrying the delay the server asked for, if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptError {
    /// The error produced by the attempt
    pub error: Error,
    /// Delay requested via `Retry-After`
    pub retry_after: Option<Duration>,
}

impl From<Error> for AttemptError {
    fn from(error: Error) -> Self {
        Self {
            error,
            retry_after: None,
        }
    }
}

/// Parse a `Retry-After` header given in whole seconds
///
/// The HTTP-date form is ignored and the computed backoff applies instead.
pub fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// Run `operation` until it succeeds, fails permanently, or runs out of attempts
///
/// `operation` receives the 1-based attempt number. When attempts are
/// exhausted the error of the last attempt is returned.
///
/// # Examples
/// ```
/// use registry_client::retry::{retry, RetryPolicy};
///
/// async fn example() -> registry_client::Result<String> {
///     retry(&RetryPolicy::new(3), |_attempt| async {
///         Ok("success".to_string())
///     })
///     .await
/// }
/// ```
pub async fn retry<F, Fut, T>(policy: &RetryPolicy, mut operation: F) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = std::result::Result<T, AttemptError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation(attempt).await {
            Ok(result) => return Ok(result),
            Err(AttemptError { error, retry_after }) => {
                if !error.is_transient() {
                    return Err(error);
                }

                if attempt >= max_attempts {
                    tracing::warn!(attempts = attempt, error = %error, "Giving up after transient failures");
                    return Err(error);
                }

                let delay = match retry_after {
                    Some(requested) => requested.min(policy.max_delay),
                    None => policy.delay_for(attempt - 1),
                };
                tracing::warn!(
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "Transient failure, retrying"
                );
                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
