//! Explicit retry policy for collaborator calls
//!
//! Bounded attempts with exponential backoff and a retryable-error predicate,
//! applied at each call site rather than hidden behind the client.

use crate::config::FeedConfig;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Retry policy: attempt count and backoff curve
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Create a new policy
    pub fn new(max_attempts: u32, initial_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
            max_delay,
        }
    }

    /// Build the policy from feed configuration
    pub fn from_config(cfg: &FeedConfig) -> Self {
        Self::new(
            cfg.retry_max_attempts,
            Duration::from_millis(cfg.retry_initial_delay_ms),
            Duration::from_millis(cfg.retry_max_delay_ms),
        )
    }

    /// Run `op` until it succeeds, the error is not retryable, or attempts
    /// are exhausted. The delay doubles after every failure, capped at
    /// `max_delay`. Returns the last error on exhaustion.
    pub async fn run<T, E, Fut>(
        &self,
        what: &str,
        retryable: impl Fn(&E) -> bool,
        mut op: impl FnMut() -> Fut,
    ) -> Result<T, E>
    where
        E: std::fmt::Display,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut delay = self.initial_delay;
        let mut attempt = 1u32;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.max_attempts && retryable(&e) => {
                    tracing::warn!(
                        call = what,
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %e,
                        "call failed, backing off"
                    );
                    sleep(delay).await;
                    delay = (delay * 2).min(self.max_delay);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
