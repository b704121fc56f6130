//! Retry with exponential backoff for remote calls.

use crate::Result;
use std::future::Future;
use std::time::Duration;

/// How often and how patiently a failing request is repeated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: usize,
    /// Delay after the first failure; doubled after each further failure.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// A policy that tries exactly once.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
        }
    }

    pub fn with_max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Delay before retrying after the zero-based `attempt` failed.
    pub fn delay_for(&self, attempt: usize) -> Duration {
        let factor = 1u32.checked_shl(attempt as u32).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// attempts are used up. The last error is returned.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt + 1 < attempts => {
                    let delay = self.delay_for(attempt);
                    log::warn!(
                        "{} failed (attempt {}/{}): {}; retrying in {:?}",
                        label,
                        attempt + 1,
                        attempts,
                        err,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    if attempt > 0 {
                        log::error!("{} failed after {} attempts: {}", label, attempt + 1, err);
                    }
                    return Err(err);
                }
            }
        }
    }
}
