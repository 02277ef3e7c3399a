//! Retry policy and exponential backoff calculation.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::MarketDataError;

/// Default number of attempts (first try included).
const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default delay before the second attempt.
const DEFAULT_INITIAL_DELAY_MS: u64 = 1_000;

/// Default cap on any computed backoff delay.
const DEFAULT_MAX_DELAY_MS: u64 = 10_000;

/// Default backoff multiplier.
const DEFAULT_BACKOFF_FACTOR: f64 = 2.0;

/// Retry policy for a single logical request.
///
/// The delay before attempt `n + 1` is
/// `min(max_delay_ms, initial_delay_ms * backoff_factor^(n - 1))`,
/// unless the server supplied a `retry-after` hint on a 429.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetryPolicy {
    /// Total attempts, first try included. Must be at least 1.
    pub max_attempts: u32,
    /// Delay after the first failed attempt.
    pub initial_delay_ms: u64,
    /// Upper bound on computed delays. Must be >= `initial_delay_ms`.
    pub max_delay_ms: u64,
    /// Exponential growth factor. Must be finite and >= 1.
    pub backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_delay_ms: DEFAULT_INITIAL_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
        }
    }
}

impl RetryPolicy {
    /// Create a retry policy with custom settings.
    #[must_use]
    pub const fn new(
        max_attempts: u32,
        initial_delay_ms: u64,
        max_delay_ms: u64,
        backoff_factor: f64,
    ) -> Self {
        Self {
            max_attempts,
            initial_delay_ms,
            max_delay_ms,
            backoff_factor,
        }
    }

    /// A policy that makes exactly one attempt.
    #[must_use]
    pub const fn single_attempt() -> Self {
        Self {
            max_attempts: 1,
            initial_delay_ms: 0,
            max_delay_ms: 0,
            backoff_factor: 1.0,
        }
    }

    /// Check the policy bounds.
    pub fn validate(&self) -> Result<(), MarketDataError> {
        if self.max_attempts < 1 {
            return Err(MarketDataError::InvalidRetryPolicy(
                "maxAttempts must be at least 1".to_string(),
            ));
        }
        if self.max_delay_ms < self.initial_delay_ms {
            return Err(MarketDataError::InvalidRetryPolicy(format!(
                "maxDelayMs ({}) must be >= initialDelayMs ({})",
                self.max_delay_ms, self.initial_delay_ms
            )));
        }
        if !self.backoff_factor.is_finite() || self.backoff_factor < 1.0 {
            return Err(MarketDataError::InvalidRetryPolicy(format!(
                "backoffFactor must be a finite number >= 1, got {}",
                self.backoff_factor
            )));
        }
        Ok(())
    }

    /// Computed backoff after the given (1-based) failed attempt.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        if self.initial_delay_ms == 0 {
            return Duration::ZERO;
        }
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let multiplier = self.backoff_factor.powi(exponent);
        let delay_ms = self.initial_delay_ms as f64 * multiplier;

        // powi can overflow to infinity for large attempt counts; min() clamps it
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let capped = delay_ms.min(self.max_delay_ms as f64) as u64;
        Duration::from_millis(capped)
    }
}
