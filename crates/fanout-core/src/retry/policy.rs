//! Retry policy and backoff schedule.

use std::time::Duration;

use crate::config::{
    ConfigError, DEFAULT_BACKOFF_FACTOR, DEFAULT_INITIAL_DELAY_MS, DEFAULT_MAX_DELAY_MS,
    DEFAULT_MAX_RETRIES,
};

/// Retry policy with deterministic exponential backoff.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Backoff multiplier (e.g., 2.0 for exponential backoff).
    pub backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay: Duration::from_millis(DEFAULT_INITIAL_DELAY_MS),
            max_delay: Duration::from_millis(DEFAULT_MAX_DELAY_MS),
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
        }
    }
}

impl RetryPolicy {
    /// Create a new retry policy.
    pub fn new(
        max_retries: u32,
        initial_delay: Duration,
        max_delay: Duration,
        backoff_factor: f64,
    ) -> Self {
        Self { max_retries, initial_delay, max_delay, backoff_factor }
    }

    /// A policy that makes exactly one attempt.
    pub fn none() -> Self {
        Self { max_retries: 0, ..Self::default() }
    }

    /// Check that the backoff factor is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.backoff_factor.is_finite() || self.backoff_factor <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "backoff_factor must be a positive finite number, got {}",
                self.backoff_factor
            )));
        }
        Ok(())
    }

    /// Calculate the delay before retry number `retry_count` (zero-based).
    ///
    /// Uses exponential backoff: initial_delay * backoff_factor^retry_count, capped at max_delay.
    pub fn calculate_delay(&self, retry_count: u32) -> Duration {
        let exponent = i32::try_from(retry_count).unwrap_or(i32::MAX);
        let secs = self.initial_delay.as_secs_f64() * self.backoff_factor.powi(exponent);
        Duration::try_from_secs_f64(secs.min(self.max_delay.as_secs_f64()))
            .unwrap_or(self.max_delay)
    }

    /// Delay that follows `delay` in the schedule.
    pub fn next_delay(&self, delay: Duration) -> Duration {
        Duration::try_from_secs_f64(delay.as_secs_f64() * self.backoff_factor)
            .map_or(self.max_delay, |next| next.min(self.max_delay))
    }

    /// The full delay schedule, one entry per retry.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        std::iter::successors(Some(self.initial_delay.min(self.max_delay)), move |delay| {
            Some(self.next_delay(*delay))
        })
        .take(self.max_retries as usize)
    }
}
