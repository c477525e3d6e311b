use std::{future::Future, time::Duration};

use tracing::{debug, warn};

use super::UpstreamError;

/// Longest single backoff sleep, regardless of attempt count.
const MAX_BACKOFF: Duration = Duration::from_secs(10);

/// Exponential backoff for the read path.
///
/// Only transient failures (see [`UpstreamError::is_transient`]) are retried. The
/// wait before retry `n` (0-based) is `base_backoff * 2^n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: 2, base_backoff: Duration::from_millis(100) }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn new(max_retries: u32, base_backoff: Duration) -> Self {
        Self { max_retries, base_backoff }
    }

    /// A policy that makes exactly one attempt.
    #[must_use]
    pub fn none() -> Self {
        Self { max_retries: 0, base_backoff: Duration::ZERO }
    }

    /// Backoff before retry number `attempt` (0-based).
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_backoff.saturating_mul(factor).min(MAX_BACKOFF)
    }

    /// Runs `operation` until it succeeds, fails permanently, or retries run out.
    ///
    /// # Errors
    ///
    /// Returns the last error produced by `operation`.
    pub async fn execute<T, F, Fut>(
        &self,
        operation_name: &str,
        mut operation: F,
    ) -> Result<T, UpstreamError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, UpstreamError>>,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!(operation = operation_name, attempt, "upstream call recovered");
                    }
                    return Ok(value);
                }
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    let delay = self.backoff(attempt);
                    warn!(
                        operation = operation_name,
                        attempt,
                        error = %e,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "upstream call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    warn!(
                        operation = operation_name,
                        attempt,
                        error = %e,
                        kind = e.as_str(),
                        "upstream call failed"
                    );
                    return Err(e);
                }
            }
        }
    }
}
