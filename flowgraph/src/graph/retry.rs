//! Retry policy for node execution.

use std::time::Duration;

/// Retry policy for handling node execution failures.
#[derive(Debug, Clone)]
pub enum RetryPolicy {
    /// No retry — fail immediately on error.
    None,
    /// Fixed interval retry.
    Fixed {
        max_attempts: usize,
        interval: Duration,
    },
    /// Exponential backoff retry.
    Exponential {
        max_attempts: usize,
        initial_interval: Duration,
        max_interval: Duration,
        multiplier: f64,
    },
}

impl RetryPolicy {
    pub fn fixed(max_attempts: usize, interval: Duration) -> Self {
        RetryPolicy::Fixed {
            max_attempts,
            interval,
        }
    }

    pub fn exponential(
        max_attempts: usize,
        initial_interval: Duration,
        max_interval: Duration,
        multiplier: f64,
    ) -> Self {
        RetryPolicy::Exponential {
            max_attempts,
            initial_interval,
            max_interval,
            multiplier,
        }
    }

    /// Whether a retry should be attempted for the given (zero-based) attempt number.
    pub fn should_retry(&self, attempt: usize) -> bool {
        match self {
            RetryPolicy::None => false,
            RetryPolicy::Fixed { max_attempts, .. } => attempt < *max_attempts,
            RetryPolicy::Exponential { max_attempts, .. } => attempt < *max_attempts,
        }
    }

    /// Delay before the given attempt.
    pub fn delay(&self, attempt: usize) -> Duration {
        match self {
            RetryPolicy::None => Duration::ZERO,
            RetryPolicy::Fixed { interval, .. } => *interval,
            RetryPolicy::Exponential {
                initial_interval,
                max_interval,
                multiplier,
                ..
            } => {
                let secs = initial_interval.as_secs_f64() * multiplier.powi(attempt as i32);
                Duration::from_secs_f64(secs).min(*max_interval)
            }
        }
    }
}
