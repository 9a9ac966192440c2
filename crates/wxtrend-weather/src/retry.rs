//! Backoff for transient weather API failures.
//!
//! Retried: timeouts, connection failures, 5xx, 408 and 429.
//! Not retried: other 4xx (a bad key or unknown city will not fix itself).
//! All attempts happen inside one scheduler tick.

use std::future::Future;
use std::time::Duration;

use reqwest::{Response, StatusCode};

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts after the first one
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each subsequent one
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no retries
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry);
        self.initial_delay.saturating_mul(factor).min(self.max_delay)
    }
}

pub(crate) fn is_transient_status(status: StatusCode) -> bool {
    status.is_server_error()
        || status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
}

pub(crate) fn is_transient_error(error: &reqwest::Error) -> bool {
    if error.is_timeout() || error.is_connect() {
        return true;
    }
    error.status().is_some_and(is_transient_status)
}

/// Run `send` until it succeeds, fails permanently, or retries run out.
///
/// A transient status on the final attempt is returned as `Ok` so the
/// caller can map it to a typed error.
pub async fn send_with_retry<F, Fut>(
    policy: &RetryPolicy,
    send: F,
) -> Result<Response, reqwest::Error>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<Response, reqwest::Error>>,
{
    let mut retry = 0;
    loop {
        let last_attempt = retry >= policy.max_retries;

        match send().await {
            Ok(response) if !last_attempt && is_transient_status(response.status()) => {
                tracing::warn!(
                    "Weather API returned {}, retry {} of {}",
                    response.status(),
                    retry + 1,
                    policy.max_retries
                );
            }
            Ok(response) => return Ok(response),
            Err(e) if !last_attempt && is_transient_error(&e) => {
                tracing::warn!(
                    "Weather request failed ({}), retry {} of {}",
                    e.without_url(),
                    retry + 1,
                    policy.max_retries
                );
            }
            Err(e) => return Err(e),
        }

        let delay = policy.delay_for_retry(retry);
        tracing::debug!("Waiting {:?} before retrying", delay);
        tokio::time::sleep(delay).await;
        retry += 1;
    }
}
