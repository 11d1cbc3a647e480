//! Jittered, bounded retry with exponential backoff for page fetches.
//!
//! Every attempt is preceded by a uniformly random pause inside the policy's
//! jitter window, which spaces out requests to the same retailer. Failed
//! attempts are followed by `backoff_base * 2^attempt` before the next try.

use std::future::Future;
use std::time::Duration;

use pricewatch_core::AppConfig;

use crate::error::FetchError;

/// Retry budget and pacing for one fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    max_attempts: u32,
    backoff_base: Duration,
    jitter_min: Duration,
    jitter_max: Duration,
}

impl RetryPolicy {
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidPolicy`] when `max_attempts` is zero,
    /// `backoff_base` is zero, or the jitter window is inverted.
    pub fn new(
        max_attempts: u32,
        backoff_base: Duration,
        jitter_min: Duration,
        jitter_max: Duration,
    ) -> Result<Self, FetchError> {
        if max_attempts == 0 {
            return Err(FetchError::InvalidPolicy(
                "max_attempts must be at least 1".to_owned(),
            ));
        }
        if backoff_base.is_zero() {
            return Err(FetchError::InvalidPolicy(
                "backoff_base must be greater than zero".to_owned(),
            ));
        }
        if jitter_min > jitter_max {
            return Err(FetchError::InvalidPolicy(format!(
                "jitter window is inverted ({jitter_min:?} > {jitter_max:?})"
            )));
        }
        Ok(Self {
            max_attempts,
            backoff_base,
            jitter_min,
            jitter_max,
        })
    }

    /// # Errors
    ///
    /// Returns [`FetchError::InvalidPolicy`] if the configured values are
    /// rejected by [`RetryPolicy::new`].
    pub fn from_app_config(config: &AppConfig) -> Result<Self, FetchError> {
        Self::new(
            config.scraper_max_attempts,
            Duration::from_millis(config.scraper_backoff_base_ms),
            Duration::from_millis(config.scraper_jitter_min_ms),
            Duration::from_millis(config.scraper_jitter_max_ms),
        )
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Wait after the failed attempt with zero-based index `attempt`.
    #[must_use]
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.min(20);
        self.backoff_base.saturating_mul(factor)
    }

    fn jitter(&self) -> Duration {
        if self.jitter_min == self.jitter_max {
            return self.jitter_min;
        }
        #[allow(clippy::cast_possible_truncation)]
        let (lo, hi) = (
            self.jitter_min.as_millis() as u64,
            self.jitter_max.as_millis() as u64,
        );
        Duration::from_millis(rand::random_range(lo..=hi))
    }
}

/// Runs `operation` up to `policy.max_attempts()` times.
///
/// Every failure is treated as transient. The last error is returned once the
/// budget is spent.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    url: &str,
    mut operation: F,
) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut attempt = 0u32;
    loop {
        let pause = policy.jitter();
        if !pause.is_zero() {
            tracing::debug!(url, delay_ms = pause.as_millis(), "pausing before request");
            tokio::time::sleep(pause).await;
        }

        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt + 1 >= policy.max_attempts {
                    tracing::error!(
                        url,
                        attempts = attempt + 1,
                        error = %err,
                        "fetch failed; retry budget exhausted"
                    );
                    return Err(err);
                }
                let delay = policy.backoff_delay(attempt);
                tracing::warn!(
                    url,
                    attempt = attempt + 1,
                    max_attempts = policy.max_attempts,
                    delay_ms = delay.as_millis(),
                    error = %err,
                    "fetch failed, retrying after backoff"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
