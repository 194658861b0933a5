//! Retry policy and backoff between attempts.

use rand::Rng;
use std::time::Duration;

/// Configuration for the delay between attempts.
///
/// The number of attempts comes from `ClientConfig::max_retries`.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Maximum delay between retries. Applies to every strategy, including
    /// the linear default.
    pub max_delay: Duration,
    /// Backoff strategy to use.
    pub backoff: BackoffStrategy,
    /// Whether a 429 `Retry-After` hint replaces the backoff delay.
    pub respect_retry_after: bool,
    /// Maximum time to wait from a Retry-After header.
    pub max_retry_after: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff: BackoffStrategy::Linear,
            respect_retry_after: false,
            max_retry_after: Duration::from_secs(60),
        }
    }
}

impl RetryConfig {
    /// Set the delay before the first retry.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the maximum delay between retries.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Set the backoff strategy.
    pub fn with_backoff(mut self, backoff: BackoffStrategy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Wait for the server's Retry-After hint on 429 responses.
    pub fn with_respect_retry_after(mut self, respect: bool) -> Self {
        self.respect_retry_after = respect;
        self
    }
}

/// Backoff strategy for determining retry delays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackoffStrategy {
    /// Constant delay between retries.
    Constant,
    /// Linear increase in delay (delay * (attempt + 1)).
    Linear,
    /// Exponential increase in delay (delay * factor^attempt).
    Exponential { factor: f64 },
    /// Exponential plus a random jitter of up to the same amount again.
    ExponentialWithJitter { factor: f64 },
}

impl BackoffStrategy {
    /// Calculate the delay after a failed attempt (0-indexed).
    pub fn delay(&self, attempt: u32, initial_delay: Duration, max_delay: Duration) -> Duration {
        let delay = match self {
            BackoffStrategy::Constant => initial_delay,
            BackoffStrategy::Linear => initial_delay.saturating_mul(attempt.saturating_add(1)),
            BackoffStrategy::Exponential { factor } => {
                let multiplier = factor.powi(attempt as i32);
                duration_from_secs(initial_delay.as_secs_f64() * multiplier)
            }
            BackoffStrategy::ExponentialWithJitter { factor } => {
                let base_delay = initial_delay.as_secs_f64() * factor.powi(attempt as i32);
                let jitter = rand::rng().random::<f64>() * base_delay;
                duration_from_secs(base_delay + jitter)
            }
        };

        std::cmp::min(delay, max_delay)
    }
}

fn duration_from_secs(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}

/// Retry state for a single request.
///
/// Tracks the current attempt against the attempt budget and decides how long
/// to wait before the next one.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
    max_attempts: u32,
    attempt: u32,
}

impl RetryPolicy {
    /// Create a new retry policy allowing `max_attempts` attempts in total.
    pub fn new(config: RetryConfig, max_attempts: u32) -> Self {
        Self {
            config,
            max_attempts: max_attempts.max(1),
            attempt: 0,
        }
    }

    /// Returns the current attempt number (0-indexed).
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Returns the number of attempts made so far, including the current one.
    pub fn attempts_made(&self) -> u32 {
        self.attempt + 1
    }

    /// Returns true if another attempt remains after the current one.
    pub fn should_retry(&self) -> bool {
        self.attempt + 1 < self.max_attempts
    }

    /// Advance to the next attempt and return the delay to wait first.
    ///
    /// Returns None when the attempt budget is spent.
    pub fn next_delay(&mut self, retry_after: Option<Duration>) -> Option<Duration> {
        if !self.should_retry() {
            return None;
        }

        let delay = match retry_after {
            Some(hint) if self.config.respect_retry_after => {
                std::cmp::min(hint, self.config.max_retry_after)
            }
            _ => self.config.backoff.delay(
                self.attempt,
                self.config.initial_delay,
                self.config.max_delay,
            ),
        };

        self.attempt += 1;
        Some(delay)
    }
}
