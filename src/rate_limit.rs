//! Request execution that rides out GitHub rate limiting.
//!
//! A `403 Forbidden` with an exhausted `X-RateLimit-Remaining` quota is
//! absorbed by sleeping until `X-RateLimit-Reset` and re-sending the same
//! request. Any other response, including a `403` with quota left, goes back
//! to the caller untouched.

use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use reqwest::{Client, Request, Response, StatusCode};
use tokio::time::{sleep, Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{Result, SearchError};
use crate::progress::CooldownDisplay;

pub const REMAINING_HEADER: &str = "X-RateLimit-Remaining";
pub const RESET_HEADER: &str = "X-RateLimit-Reset";

const COOLDOWN_TICK: Duration = Duration::from_millis(500);

// Added to every computed wait so a reset that is already past (clock skew,
// repeated 403s) never turns into back-to-back retries.
const RESET_BUFFER: Duration = Duration::from_secs(1);

/// HTTP transport that retries throttled requests once the quota resets.
#[derive(Debug, Clone)]
pub struct RateLimitedTransport {
    client: Client,
    cooldown: CooldownDisplay,
}

impl RateLimitedTransport {
    pub fn new(client: Client) -> Self {
        Self::with_cooldown(client, CooldownDisplay::hidden())
    }

    pub fn with_cooldown(client: Client, cooldown: CooldownDisplay) -> Self {
        Self { client, cooldown }
    }

    /// Sends `request`, waiting out and retrying rate-limit rejections.
    ///
    /// Transport failures and malformed rate-limit headers are returned
    /// immediately. Throttled requests are retried with no attempt limit, one
    /// second after the advertised reset at the earliest; the only way out of a
    /// wait besides the reset is `cancel` firing.
    pub async fn execute(&self, request: Request, cancel: &CancellationToken) -> Result<Response> {
        loop {
            let attempt = request
                .try_clone()
                .ok_or_else(|| SearchError::RequestNotRetryable {
                    url: request.url().to_string(),
                })?;

            debug!(url = %request.url(), "performing HTTP request");
            let response = tokio::select! {
                () = cancel.cancelled() => return Err(SearchError::Cancelled),
                sent = self.client.execute(attempt) => sent?,
            };

            if response.status() != StatusCode::FORBIDDEN {
                return Ok(response);
            }

            let remaining = remaining_quota(response.headers())?;
            if remaining > 0 {
                // got the 403 for another reason
                return Ok(response);
            }

            let reset_at = reset_timestamp(response.headers())?;
            let wait = wait_duration(reset_at, Utc::now()) + RESET_BUFFER;
            debug!(wait_seconds = wait.as_secs(), "rate limit hit");
            warn!("Rate limit reached. Waiting {} seconds...", wait.as_secs());

            self.wait_for_reset(wait, cancel).await?;
        }
    }

    async fn wait_for_reset(&self, wait: Duration, cancel: &CancellationToken) -> Result<()> {
        self.cooldown.start(wait);
        let start = Instant::now();
        let end = start + wait;

        loop {
            let now = Instant::now();
            if now >= end {
                break;
            }

            let step = (end - now).min(COOLDOWN_TICK);
            tokio::select! {
                () = cancel.cancelled() => {
                    self.cooldown.finish();
                    return Err(SearchError::Cancelled);
                }
                () = sleep(step) => {}
            }
            self.cooldown.update(start.elapsed(), wait);
        }

        self.cooldown.finish();
        Ok(())
    }
}

/// Remaining quota from a throttled response; an absent header counts as exhausted.
fn remaining_quota(headers: &HeaderMap) -> Result<i64> {
    match header_str(headers, REMAINING_HEADER) {
        None => Ok(0),
        Some(value) => parse_header(REMAINING_HEADER, value),
    }
}

fn reset_timestamp(headers: &HeaderMap) -> Result<i64> {
    parse_header(RESET_HEADER, header_str(headers, RESET_HEADER).unwrap_or_default())
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).map(|value| value.to_str().unwrap_or("<non-ascii>"))
}

fn parse_header(header: &'static str, value: &str) -> Result<i64> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|source| SearchError::MalformedRateLimit {
            header,
            value: value.to_string(),
            source,
        })
}

/// Time left until `reset_at` (epoch seconds), zero if it already passed.
pub fn wait_duration(reset_at: i64, now: DateTime<Utc>) -> Duration {
    let wait_millis = reset_at
        .saturating_mul(1000)
        .saturating_sub(now.timestamp_millis());
    u64::try_from(wait_millis).map_or(Duration::ZERO, Duration::from_millis)
}
