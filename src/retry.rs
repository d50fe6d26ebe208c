//! Capped exponential-backoff retry.
//!
//! [`RetryPolicy::execute`] re-invokes an action while a predicate asks for
//! it and surfaces the last result once the attempt cap is reached. It never
//! invents an error of its own on exhaustion.

use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;
use tokio::time::sleep;

use crate::{ClientOptions, HttpRequest, HttpResponse, TransportError};

/// Base interval and attempt cap for [`RetryPolicy::execute`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RetryPolicy {
    base_interval: Duration,
    max_attempts: usize,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Duration::from_millis(500), 10)
    }
}

impl RetryPolicy {
    /// `max_attempts` is clamped to at least one.
    pub fn new(base_interval: Duration, max_attempts: usize) -> Self {
        Self {
            base_interval,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn from_options(options: &ClientOptions) -> Self {
        Self::new(
            Duration::from_millis(options.retry_backoff_ms),
            options.max_attempts,
        )
    }

    /// Policy that makes exactly one attempt.
    pub fn single_attempt() -> Self {
        Self::new(Duration::ZERO, 1)
    }

    pub fn base_interval(&self) -> Duration {
        self.base_interval
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Narrows the policy for `request`: anything carrying a body is a write
    /// and gets a single attempt.
    pub fn for_request(&self, request: &HttpRequest) -> Self {
        if request.body.is_some() {
            Self::single_attempt()
        } else {
            *self
        }
    }

    /// Sleep before the retry that follows attempt `attempt` (0-indexed):
    /// `base_interval * 2^attempt`, saturating.
    pub fn delay_for(&self, attempt: usize) -> Duration {
        let exp = attempt.min(31) as u32;
        self.base_interval
            .checked_mul(1u32 << exp)
            .unwrap_or(Duration::MAX)
    }

    /// Runs `action` until `should_retry` rejects its result or the attempt
    /// cap is reached, and returns the last result.
    pub async fn execute<T, E, F, Fut, P>(&self, mut action: F, should_retry: P) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&Result<T, E>) -> bool,
    {
        let mut attempt = 0usize;
        loop {
            let result = action().await;
            if !should_retry(&result) || attempt + 1 >= self.max_attempts {
                return result;
            }

            let delay = self.delay_for(attempt);

            #[cfg(feature = "tracing")]
            tracing::debug!(
                attempt = attempt + 1,
                max_attempts = self.max_attempts,
                delay_ms = delay.as_millis() as u64,
                "retrying request"
            );

            sleep(delay).await;
            attempt += 1;
        }
    }
}

/// Statuses the executor classifies as terminal rather than transient.
fn is_terminal_status(status: StatusCode) -> bool {
    matches!(status, StatusCode::UNAUTHORIZED | StatusCode::NOT_FOUND)
}

/// Default predicate for authenticated API calls.
///
/// Retries a transport timeout and any non-2xx status except 401 and 404.
pub fn should_retry_response(result: &Result<HttpResponse, TransportError>) -> bool {
    match result {
        Ok(response) => !response.status.is_success() && !is_terminal_status(response.status),
        Err(err) => err.is_timeout(),
    }
}

/// Predicate for the unauthenticated state download hop.
///
/// Retries a transport timeout and any non-2xx status.
pub fn should_retry_download(result: &Result<HttpResponse, TransportError>) -> bool {
    match result {
        Ok(response) => !response.status.is_success(),
        Err(err) => err.is_timeout(),
    }
}
