//! Throttling retries shared by the SharePoint and Graph clients.
//!
//! Only 429 and 503 are retried. A wait is never longer than the policy's
//! `max_delay` or the request timeout; a server asking for more than that
//! gets the throttled response back as an error instead.

use std::time::Duration;

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{RequestBuilder, Response, StatusCode};
use tokio::time::sleep;
use tracing::{error, warn};

use super::SharePointError;
use crate::auth::AccessTokenProvider;
use crate::config::{DEFAULT_MAX_ATTEMPTS, DEFAULT_REQUEST_TIMEOUT_SECS};

/// Backoff for throttled requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubled for each one after.
    pub base_delay: Duration,
    /// Longest single wait, whether computed or asked for by the server.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl RetryPolicy {
    /// Wait after the failed attempt number `attempt` (0-based).
    ///
    /// A `Retry-After` hint wins over the computed backoff, but a hint above
    /// `max_delay` yields `None`: the caller should stop retrying.
    pub fn delay(&self, attempt: u32, retry_after: Option<Duration>) -> Option<Duration> {
        match retry_after {
            Some(hint) if hint > self.max_delay => None,
            Some(hint) => Some(hint),
            None => Some(
                self.base_delay
                    .saturating_mul(2u32.saturating_pow(attempt))
                    .min(self.max_delay),
            ),
        }
    }

    /// The same policy with `max_delay` no longer than `limit`.
    pub fn capped(self, limit: Option<Duration>) -> Self {
        match limit {
            Some(limit) => Self {
                max_delay: self.max_delay.min(limit),
                ..self
            },
            None => self,
        }
    }

    pub(crate) fn normalized(self) -> Self {
        Self {
            max_attempts: self.max_attempts.max(1),
            ..self
        }
    }

    fn is_retryable(status: StatusCode) -> bool {
        matches!(
            status,
            StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE
        )
    }
}

/// `Retry-After` in whole seconds. HTTP-date values are ignored.
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// Sends the request built by `build` (given a fresh bearer token) until it
/// succeeds, fails with a non-throttling status, or runs out of attempts.
/// Returns only 2xx responses.
pub(crate) async fn send_with_retry<F>(
    service: &str,
    url: &str,
    policy: RetryPolicy,
    timeout: Option<Duration>,
    tokens: &dyn AccessTokenProvider,
    build: F,
) -> Result<Response, SharePointError>
where
    F: Fn(String) -> RequestBuilder,
{
    let policy = policy.capped(timeout);
    let mut attempt = 0;
    loop {
        let token = tokens.access_token().await?;
        let mut request = build(token);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let resp = request.send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        if RetryPolicy::is_retryable(status) && attempt + 1 < policy.max_attempts {
            let hint = retry_after(resp.headers());
            if let Some(delay) = policy.delay(attempt, hint) {
                warn!(
                    service,
                    status = status.as_u16(),
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    "throttled request, retrying"
                );
                sleep(delay).await;
                attempt += 1;
                continue;
            }
            warn!(
                service,
                status = status.as_u16(),
                retry_after_secs = hint.map(|d| d.as_secs()),
                "Retry-After exceeds the allowed wait, giving up"
            );
        }

        let body = resp.text().await.unwrap_or_default();
        error!(service, status = status.as_u16(), url, body = %body, "upstream request failed");
        return Err(SharePointError::Remote {
            status: status.as_u16(),
            body,
        });
    }
}
