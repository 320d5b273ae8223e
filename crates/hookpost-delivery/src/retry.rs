//! Rate-limit retry policy.
//!
//! The provider signals throttling with HTTP 429 and tells the client how
//! long to wait. Only that condition is retried; every other failure is
//! returned to the caller as-is. Retries of one logical request are bounded
//! so a persistently throttled webhook cannot loop forever.

use std::time::Duration;

use chrono::{DateTime, Utc};
use http::HeaderMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Header the provider uses for bucket reset, in (fractional) seconds.
pub const RESET_AFTER_HEADER: &str = "x-ratelimit-reset-after";

/// Standard HTTP retry header, in seconds or as an HTTP date.
pub const RETRY_AFTER_HEADER: &str = "retry-after";

/// How rate-limited requests are retried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitPolicy {
    /// Maximum retries of a single logical request after 429 responses.
    pub max_retries: u32,

    /// Wait used when the provider gives no usable hint.
    pub default_retry_after: Duration,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self { max_retries: 60, default_retry_after: Duration::from_secs(3) }
    }
}

/// Whether a rate-limited attempt should be retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wait this long, then re-issue the identical request.
    Retry {
        /// Provider-requested wait
        wait: Duration,
    },
    /// Retry budget spent; surface the 429 as a failure.
    GiveUp,
}

impl RateLimitPolicy {
    /// Decides what to do after the `retries_so_far`-th consecutive 429.
    pub fn decide(&self, retries_so_far: u32, headers: &HeaderMap, body: &Value) -> RetryDecision {
        if retries_so_far >= self.max_retries {
            return RetryDecision::GiveUp;
        }
        RetryDecision::Retry { wait: self.retry_after(headers, body) }
    }

    /// Reads the provider's requested wait from a 429 response.
    ///
    /// Checks `x-ratelimit-reset-after`, then `retry-after`, then the JSON
    /// body's `retry_after`. A header that is present but unparseable yields
    /// the default rather than falling through to the next source.
    pub fn retry_after(&self, headers: &HeaderMap, body: &Value) -> Duration {
        for name in [RESET_AFTER_HEADER, RETRY_AFTER_HEADER] {
            if let Some(value) = headers.get(name) {
                return value
                    .to_str()
                    .ok()
                    .and_then(parse_wait)
                    .unwrap_or(self.default_retry_after);
            }
        }

        body.get("retry_after")
            .and_then(Value::as_f64)
            .and_then(seconds_to_duration)
            .unwrap_or(self.default_retry_after)
    }
}

/// Parses a wait hint given either as seconds (fractional allowed) or as an
/// HTTP date.
fn parse_wait(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    if let Ok(seconds) = raw.parse::<f64>() {
        return seconds_to_duration(seconds);
    }

    let at = DateTime::parse_from_rfc2822(raw).ok()?.with_timezone(&Utc);
    Some(at.signed_duration_since(Utc::now()).to_std().unwrap_or(Duration::ZERO))
}

fn seconds_to_duration(seconds: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(seconds).ok()
}
