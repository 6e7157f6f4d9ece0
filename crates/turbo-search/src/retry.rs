//! Retry policy for catalog fetches.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::SearchError;

/// Backoff strategy between retry attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackoffStrategy {
    /// No delay between retries.
    None,
    /// Fixed delay between retries.
    Fixed(Duration),
    /// Exponential backoff with base and max.
    Exponential {
        /// Initial delay.
        base: Duration,
        /// Maximum delay.
        max: Duration,
    },
}

impl BackoffStrategy {
    /// Calculate delay for a given attempt number (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        match self {
            Self::None => Duration::ZERO,
            Self::Fixed(d) => *d,
            Self::Exponential { base, max } => {
                let multiplier = 2u32.saturating_pow(attempt);
                std::cmp::min(base.saturating_mul(multiplier), *max)
            }
        }
    }
}

impl Default for BackoffStrategy {
    fn default() -> Self {
        Self::Exponential {
            base: Duration::from_millis(200),
            max: Duration::from_secs(2),
        }
    }
}

/// How many times, and how patiently, a failed fetch is retried.
///
/// Transient failures are retried up to `max_attempts` times. A malformed
/// response is retried once. Invalid parameters and stale results are never
/// retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt.
    pub max_attempts: u32,
    pub backoff: BackoffStrategy,
}

impl RetryPolicy {
    /// Create a new retry policy with the default backoff.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff: BackoffStrategy::default(),
        }
    }

    /// Create a policy with no retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 0,
            backoff: BackoffStrategy::None,
        }
    }

    /// Set backoff strategy.
    pub fn with_backoff(mut self, strategy: BackoffStrategy) -> Self {
        self.backoff = strategy;
        self
    }

    /// Whether `error`, raised on attempt `attempt` (0-indexed), warrants another try.
    pub fn should_retry(&self, error: &SearchError, attempt: u32) -> bool {
        if attempt >= self.max_attempts {
            return false;
        }
        match error {
            SearchError::Transient { .. } => true,
            SearchError::MalformedResponse(_) => attempt == 0,
            SearchError::InvalidParameter { .. } | SearchError::Stale => false,
        }
    }

    /// Run `op` until it succeeds or the policy gives up.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, SearchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SearchError>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if self.should_retry(&err, attempt) => {
                    let delay = self.backoff.delay_for_attempt(attempt);
                    warn!(attempt, delay_ms = delay.as_millis() as u64, error = %err, "retrying catalog fetch");
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(2)
    }
}
