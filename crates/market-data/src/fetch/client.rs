//! Retrying HTTP fetch.
//!
//! [`RetryableFetch`] executes one logical request with bounded, classified
//! retries. Attempts are strictly sequential: attempt N+1 never starts before
//! attempt N has been classified and its backoff has elapsed.

use std::time::Duration;

use log::{debug, warn};
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::Client;
use tokio::time::Instant;

use super::outcome::{classify_status, classify_transport_error, StatusClass};
use super::{build_url, AttemptOutcome, FetchResponse, RequestOptions, RetryPolicy};
use crate::errors::MarketDataError;

/// Default timeout for a single attempt.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client wrapper that retries transient failures with exponential backoff.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone)]
pub struct RetryableFetch {
    client: Client,
    default_policy: RetryPolicy,
}

impl Default for RetryableFetch {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryableFetch {
    /// Create a fetcher with the default policy and a 30s per-attempt timeout.
    pub fn new() -> Self {
        Self::with_timeout(RetryPolicy::default(), DEFAULT_REQUEST_TIMEOUT)
    }

    /// Create a fetcher with a custom default policy and per-attempt timeout.
    pub fn with_timeout(default_policy: RetryPolicy, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self::with_client(client, default_policy)
    }

    /// Create a fetcher around an existing client.
    pub fn with_client(client: Client, default_policy: RetryPolicy) -> Self {
        Self {
            client,
            default_policy,
        }
    }

    /// The policy used when a call doesn't supply one.
    pub fn default_policy(&self) -> &RetryPolicy {
        &self.default_policy
    }

    /// Fetch `url` with retries.
    ///
    /// Query parameters from `options.params` are appended in the order given.
    /// `policy` overrides the fetcher's default for this call only.
    ///
    /// Returns the first 2xx response, or:
    /// - `RequestFailed` on a non-retryable status (first occurrence, no retry)
    /// - `Transport` when the request can't be constructed
    /// - `RetriesExhausted` when every attempt failed transiently
    /// - `DeadlineExceeded` when `options.deadline` ran out first; an attempt
    ///   still in flight at the deadline is abandoned
    pub async fn fetch_with_retry(
        &self,
        url: &str,
        options: &RequestOptions,
        policy: Option<&RetryPolicy>,
    ) -> Result<FetchResponse, MarketDataError> {
        let policy = policy.unwrap_or(&self.default_policy);
        policy.validate()?;

        let target = build_url(url, &options.params);
        reqwest::Url::parse(&target)
            .map_err(|e| MarketDataError::InvalidUrl(format!("{}: {}", target, e)))?;

        let deadline = options.deadline.map(|budget| Instant::now() + budget);
        let mut last_failure: Option<String> = None;
        let mut attempt: u32 = 0;

        loop {
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    warn!(
                        "Deadline exceeded for {} after {} attempt(s)",
                        target, attempt
                    );
                    return Err(MarketDataError::DeadlineExceeded {
                        attempts: attempt,
                        last_failure,
                    });
                }
            }

            attempt += 1;
            debug!(
                "{} {} (attempt {}/{})",
                options.method, target, attempt, policy.max_attempts
            );

            let outcome = match deadline {
                Some(deadline) => {
                    match tokio::time::timeout_at(deadline, self.attempt(&target, options)).await {
                        Ok(outcome) => outcome,
                        Err(_) => {
                            warn!(
                                "Deadline exceeded for {} during attempt {}",
                                target, attempt
                            );
                            return Err(MarketDataError::DeadlineExceeded {
                                attempts: attempt,
                                last_failure,
                            });
                        }
                    }
                }
                None => self.attempt(&target, options).await,
            };

            let (reason, suggested_delay) = match outcome {
                AttemptOutcome::Success(response) => return Ok(response),
                AttemptOutcome::Fatal(error) => {
                    warn!("Request to {} failed permanently: {}", target, error);
                    return Err(error);
                }
                AttemptOutcome::Retryable {
                    reason,
                    suggested_delay,
                } => (reason, suggested_delay),
            };

            if attempt >= policy.max_attempts {
                warn!(
                    "Retries exhausted for {} after {} attempt(s): {}",
                    target, attempt, reason
                );
                return Err(MarketDataError::RetriesExhausted {
                    attempts: attempt,
                    last_failure: reason,
                });
            }

            let delay = suggested_delay.unwrap_or_else(|| policy.delay_after(attempt));

            if let Some(deadline) = deadline {
                if Instant::now() + delay >= deadline {
                    warn!(
                        "Backoff of {:?} for {} would pass the deadline, giving up after {} attempt(s)",
                        delay, target, attempt
                    );
                    return Err(MarketDataError::DeadlineExceeded {
                        attempts: attempt,
                        last_failure: Some(reason),
                    });
                }
            }

            debug!(
                "Attempt {} for {} failed ({}), retrying in {:?}",
                attempt, target, reason, delay
            );
            last_failure = Some(reason);
            tokio::time::sleep(delay).await;
        }
    }

    /// Run one attempt and classify it.
    async fn attempt(&self, target: &str, options: &RequestOptions) -> AttemptOutcome {
        let mut request = self.client.request(options.method.clone(), target);

        for (name, value) in &options.headers {
            let header_name = match HeaderName::from_bytes(name.as_bytes()) {
                Ok(n) => n,
                Err(e) => {
                    return AttemptOutcome::Fatal(MarketDataError::Transport {
                        message: format!("invalid header name '{}': {}", name, e),
                    })
                }
            };
            let header_value = match HeaderValue::from_str(value) {
                Ok(v) => v,
                Err(e) => {
                    return AttemptOutcome::Fatal(MarketDataError::Transport {
                        message: format!("invalid value for header '{}': {}", name, e),
                    })
                }
            };
            request = request.header(header_name, header_value);
        }

        if let Some(body) = &options.body {
            request = request.body(body.clone());
        }

        let response = match request.send().await {
            Ok(r) => r,
            Err(e) => return classify_transport_error(&e),
        };

        let status = response.status();
        match classify_status(status, response.headers()) {
            StatusClass::Success => {
                let headers = response.headers().clone();
                match response.text().await {
                    Ok(body) => AttemptOutcome::Success(FetchResponse {
                        url: target.to_string(),
                        status: status.as_u16(),
                        headers,
                        body,
                    }),
                    Err(e) => AttemptOutcome::Retryable {
                        reason: format!("failed to read response body: {}", e),
                        suggested_delay: None,
                    },
                }
            }
            StatusClass::Retryable { suggested_delay } => AttemptOutcome::Retryable {
                reason: format!("HTTP {}", status),
                suggested_delay,
            },
            StatusClass::Fatal => AttemptOutcome::Fatal(MarketDataError::RequestFailed {
                status: status.as_u16(),
                url: target.to_string(),
            }),
        }
    }
}
