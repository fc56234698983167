//! Exponential backoff policy.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{PolicyError, Result};

/// Errors that know whether another attempt could succeed.
pub trait Retryable {
    /// Whether the failure is transient.
    fn is_retryable(&self) -> bool;

    /// Minimum wait the failing service asked for, if any.
    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

/// Retry behavior for calls to external services.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,

    /// Delay before the second attempt, in milliseconds.
    pub base_delay_ms: u64,

    /// Growth factor applied to the delay after each failed attempt.
    pub multiplier: f64,

    /// Upper bound on any single delay, in milliseconds.
    pub max_delay_ms: u64,

    /// Whether to add up to 50% random jitter to each delay.
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 200,
            multiplier: 2.0,
            max_delay_ms: 5_000,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Set the total number of attempts.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Set the base delay.
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay_ms = duration_ms(delay);
        self
    }

    /// Set the backoff multiplier.
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Set the maximum delay.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay_ms = duration_ms(delay);
        self
    }

    /// Enable or disable jitter.
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Check that the settings describe a usable policy.
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(PolicyError::NoAttempts);
        }
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            return Err(PolicyError::InvalidMultiplier(self.multiplier));
        }
        if self.base_delay_ms > self.max_delay_ms {
            return Err(PolicyError::DelayOutOfBounds {
                base_ms: self.base_delay_ms,
                max_ms: self.max_delay_ms,
            });
        }
        Ok(())
    }

    /// Backoff before retry number `retry` (1 = the wait after the first failure),
    /// without jitter.
    pub fn backoff(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry.saturating_sub(1)).unwrap_or(i32::MAX);
        let raw = self.base_delay_ms as f64 * self.multiplier.powi(exponent);
        let capped = raw.min(self.max_delay_ms as f64);
        Duration::from_millis(capped as u64)
    }

    /// Backoff with jitter applied, still bounded by `max_delay_ms`.
    ///
    /// A server-provided `retry_after` raises the delay but never past the cap.
    fn delay_with_hint(&self, retry: u32, retry_after: Option<Duration>) -> Duration {
        let delay = self.delay_for(retry);
        match retry_after {
            Some(hint) if hint > delay => hint.min(Duration::from_millis(self.max_delay_ms)),
            _ => delay,
        }
    }

    fn delay_for(&self, retry: u32) -> Duration {
        let base = duration_ms(self.backoff(retry));
        if !self.jitter || base == 0 {
            return Duration::from_millis(base);
        }
        let jitter = rand::rng().random_range(0..=base / 2);
        Duration::from_millis(base.saturating_add(jitter).min(self.max_delay_ms))
    }

    /// Run `operation`, retrying failures whose [`Retryable::is_retryable`] is true.
    ///
    /// A [`Retryable::retry_after`] hint is used as a lower bound on the delay.
    pub async fn run<T, E, F, Fut>(&self, operation: F) -> std::result::Result<T, E>
    where
        E: Retryable + std::fmt::Display,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        self.retry_loop(E::is_retryable, E::retry_after, operation).await
    }

    /// Run `operation`, retrying failures accepted by `should_retry`.
    ///
    /// `operation` receives the 1-based attempt number. The last error is
    /// returned once attempts run out or a failure is rejected by the predicate.
    pub async fn run_with<T, E, P, F, Fut>(
        &self,
        should_retry: P,
        operation: F,
    ) -> std::result::Result<T, E>
    where
        E: std::fmt::Display,
        P: Fn(&E) -> bool,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        self.retry_loop(should_retry, |_: &E| None, operation).await
    }

    async fn retry_loop<T, E, P, H, F, Fut>(
        &self,
        should_retry: P,
        retry_after: H,
        mut operation: F,
    ) -> std::result::Result<T, E>
    where
        E: std::fmt::Display,
        P: Fn(&E) -> bool,
        H: Fn(&E) -> Option<Duration>,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match operation(attempt).await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(attempt, "Operation succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) if attempt < max_attempts && should_retry(&err) => {
                    let delay = self.delay_with_hint(attempt, retry_after(&err));
                    warn!(
                        attempt,
                        max_attempts,
                        delay_ms = duration_ms(delay),
                        error = %err,
                        "Transient failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    debug!(attempt, error = %err, "Giving up");
                    return Err(err);
                }
            }
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
