//! Retry of transient Vault failures.
//!
//! Vault answers 429 while rate limiting and 5xx while sealed, stepping down
//! or failing over. Only failures for which [`ApiError::is_transient`] holds
//! are retried; a denial, an unsupported path or a malformed body is final
//! on the first attempt.
//!
//! ```text
//! attempt 1 ──503──→ wait initial_delay
//! attempt 2 ──503──→ wait 2 × initial_delay (capped at max_delay)
//! attempt 3 ──503──→ ApiError::Transport
//! ```

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::client::{ApiError, ApiResult};

/// Backoff policy for one Vault request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Attempts per request, including the first
    pub max_attempts: u32,

    /// Wait before the first retry; doubled for every further retry
    pub initial_delay: Duration,

    /// Upper bound of a single wait
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryConfig {
    /// Policy allowing `max_retries` retries after the first attempt.
    pub fn from_max_retries(max_retries: u32) -> Self {
        Self {
            max_attempts: max_retries.saturating_add(1),
            ..Self::default()
        }
    }

    /// Single attempt, no waiting.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Wait before retry number `retry` (1 for the first retry).
    pub fn delay_before(&self, retry: u32) -> Duration {
        let factor = 1u32
            .checked_shl(retry.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.initial_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Run one request of `path`, retrying transient failures.
    pub async fn run<T, F, Fut>(&self, path: &str, mut attempt: F) -> ApiResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ApiResult<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempts = 0;

        loop {
            attempts += 1;
            match attempt().await {
                Ok(value) => {
                    if attempts > 1 {
                        debug!(path = %path, attempts, "Vault request recovered");
                    }
                    return Ok(value);
                }
                Err(err) if !err.is_transient() => return Err(err),
                Err(err) if attempts >= max_attempts => {
                    warn!(path = %path, attempts, error = %err, "Giving up on Vault request");
                    return Err(err);
                }
                Err(err) => {
                    let delay = self.delay_before(attempts);
                    debug!(
                        path = %path,
                        attempt = attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Transient Vault failure, retrying"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}
