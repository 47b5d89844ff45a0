//! Backoff for vendor and Telegram HTTP calls.
//!
//! Only errors that `VendorError::is_retryable` approves get another attempt;
//! everything else surfaces on the first failure.

use crate::vendor::VendorError;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Exponential backoff settings for one retried operation
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first one); 0 behaves as 1
    pub max_attempts: u32,
    /// Delay before the first retry, doubled after every further retry
    pub initial_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
}

impl RetryConfig {
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay,
            max_delay: Duration::from_secs(30),
        }
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Preset: translation/detection vendor calls (3 attempts)
    /// Delays: 500ms, 1s
    pub fn vendor_call() -> Self {
        Self::new(3, Duration::from_millis(500)).with_max_delay(Duration::from_secs(2))
    }

    /// Preset: Telegram Bot API calls (3 attempts)
    /// Delays: 1s, 2s
    pub fn telegram_api() -> Self {
        Self::new(3, Duration::from_secs(1)).with_max_delay(Duration::from_secs(5))
    }

    /// A single attempt, no retries
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Delay before the `retry`-th retry (1-indexed)
    fn delay_before_retry(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

/// Run a vendor call, retrying rate limits, server errors, transport
/// failures and timeouts with exponential backoff.
///
/// Returns the first success, the first non-retryable error, or the error
/// of the final attempt.
pub async fn with_vendor_retry<T, F, Fut>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
) -> Result<T, VendorError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, VendorError>>,
{
    let attempts = config.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        let error = match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    debug!(
                        "{}: Succeeded on attempt {}/{}",
                        operation_name, attempt, attempts
                    );
                }
                return Ok(result);
            }
            Err(e) => e,
        };

        if !error.is_retryable() {
            debug!(
                "{}: {} is not retryable, failing immediately: {}",
                operation_name,
                error.kind(),
                error
            );
            return Err(error);
        }

        if attempt >= attempts {
            warn!(
                "{}: All {} attempts failed, last {}: {}",
                operation_name,
                attempts,
                error.kind(),
                error
            );
            return Err(error);
        }

        let delay = config.delay_before_retry(attempt);
        warn!(
            "{}: Attempt {}/{} failed ({}: {}), retrying in {:?}",
            operation_name,
            attempt,
            attempts,
            error.kind(),
            error,
            delay
        );
        sleep(delay).await;
        attempt += 1;
    }
}
