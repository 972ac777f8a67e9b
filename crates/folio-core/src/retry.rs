//! Exponential backoff policy.
//!
//! Used by the connectivity monitor between health probes and by the
//! scheduled-task runner between failed runs.

use std::time::Duration;

/// Growth factor between consecutive delays.
pub const BACKOFF_FACTOR: f64 = 1.75;

/// Exponential backoff with a cap.
///
/// Delay for attempt `n` (zero based) is `min(initial * factor^n, max)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffPolicy {
    /// Delay before the first retry.
    pub initial: Duration,
    /// Upper bound for any single delay.
    pub max: Duration,
    /// Multiplier applied after each attempt.
    pub factor: f64,
    /// Outer bound on attempts; `None` retries forever.
    pub max_retries: Option<u32>,
}

impl BackoffPolicy {
    pub const fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max,
            factor: BACKOFF_FACTOR,
            max_retries: None,
        }
    }

    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: Option<u32>) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Delay to wait before attempt `attempt` (zero based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let scaled = self.initial.as_secs_f64() * self.factor.powi(exponent);
        if !scaled.is_finite() || scaled >= self.max.as_secs_f64() {
            self.max
        } else {
            Duration::from_secs_f64(scaled)
        }
    }

    /// Whether another attempt is allowed after `attempts` failures.
    pub fn allows(&self, attempts: u32) -> bool {
        self.max_retries.is_none_or(|max| attempts < max)
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::new(Duration::from_millis(200), Duration::from_secs(30))
    }
}
