//! Classification of a single request attempt.
//!
//! Every attempt ends in exactly one [`AttemptOutcome`]. The retry loop only
//! looks at the outcome tag; it never inspects raw errors or status codes.
//!
//! | Observation | Outcome |
//! |-------------|---------|
//! | 2xx | `Success` |
//! | 429 | `Retryable` (honors a positive `retry-after`) |
//! | 408, 5xx | `Retryable` |
//! | other 4xx, 1xx, 3xx | `Fatal` |
//! | connect / timeout / body read failure | `Retryable` |
//! | request construction failure | `Fatal` |

use std::time::Duration;

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::errors::MarketDataError;

/// A response that completed with a 2xx status.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// The final URL that was requested (query included).
    pub url: String,
    pub status: u16,
    pub headers: HeaderMap,
    pub body: String,
}

impl FetchResponse {
    /// Deserialize the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, MarketDataError> {
        serde_json::from_str(&self.body).map_err(|e| MarketDataError::Decode {
            provider: self.url.clone(),
            message: e.to_string(),
        })
    }

    /// Look up a header value as a string.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Result of one attempt.
#[derive(Debug)]
pub enum AttemptOutcome {
    /// The request succeeded; stop and return it.
    Success(FetchResponse),
    /// A transient failure. `suggested_delay` overrides the computed backoff.
    Retryable {
        reason: String,
        suggested_delay: Option<Duration>,
    },
    /// Retrying can't help; surface this error immediately.
    Fatal(MarketDataError),
}

/// How a status code should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Success,
    Retryable { suggested_delay: Option<Duration> },
    Fatal,
}

/// Classify an HTTP status and its headers.
pub fn classify_status(status: StatusCode, headers: &HeaderMap) -> StatusClass {
    if status.is_success() {
        return StatusClass::Success;
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        let suggested_delay = headers
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_retry_after);
        return StatusClass::Retryable { suggested_delay };
    }

    if status == StatusCode::REQUEST_TIMEOUT || status.is_server_error() {
        return StatusClass::Retryable {
            suggested_delay: None,
        };
    }

    StatusClass::Fatal
}

/// Longest server-suggested wait that will be honored.
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(300);

/// Parse a `retry-after` value given in seconds.
///
/// Only a positive, finite number of seconds is accepted. Empty, zero,
/// negative, and non-numeric values (including HTTP-date forms) yield `None`
/// so the caller falls back to its computed backoff. Larger hints are
/// clamped to [`MAX_RETRY_AFTER`]; a request deadline can cut it shorter.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    let seconds: f64 = trimmed.parse().ok()?;
    if !seconds.is_finite() || seconds <= 0.0 {
        return None;
    }

    let delay = Duration::try_from_secs_f64(seconds).unwrap_or(MAX_RETRY_AFTER);
    Some(delay.min(MAX_RETRY_AFTER))
}

/// Classify an error raised by the HTTP client before a status was available.
pub fn classify_transport_error(error: &reqwest::Error) -> AttemptOutcome {
    if error.is_builder() || error.is_redirect() {
        return AttemptOutcome::Fatal(MarketDataError::Transport {
            message: error.to_string(),
        });
    }

    let reason = if error.is_timeout() {
        format!("timeout: {}", error)
    } else if error.is_connect() {
        format!("connection failed: {}", error)
    } else {
        format!("network error: {}", error)
    };

    AttemptOutcome::Retryable {
        reason,
        suggested_delay: None,
    }
}
