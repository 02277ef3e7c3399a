//! Error types and retry classification for the market data crate.
//!
//! This module provides:
//! - [`MarketDataError`]: The main error enum for all market data operations
//! - [`RetryClass`]: Classification for walking the provider fallback chain

mod retry;

pub use retry::RetryClass;

use thiserror::Error;

/// Errors that can occur during market data operations.
///
/// Each variant is classified into a [`RetryClass`] via the [`retry_class`](Self::retry_class)
/// method, which determines whether a fallback walk should move on to the next provider.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The provider's `initialize()` failed. Registration was aborted.
    #[error("Initialization failed for provider '{provider}': {message}")]
    InitializationFailed {
        /// The provider that failed to initialize
        provider: String,
        /// What went wrong
        message: String,
    },

    /// The provider's `validate_config()` returned false. Registration was aborted.
    #[error("Invalid configuration for provider '{provider}'")]
    InvalidConfig {
        /// The provider whose configuration was rejected
        provider: String,
    },

    /// No provider is registered under the requested name.
    #[error("Provider not found: {0}")]
    ProviderNotFound(String),

    /// The server answered with a non-retryable status (4xx other than 408/429).
    /// Surfaced on the first attempt, never retried.
    #[error("Request to {url} failed with HTTP {status}")]
    RequestFailed {
        /// HTTP status code
        status: u16,
        /// The URL that was requested
        url: String,
    },

    /// The request could not be built or sent for a reason that carries no
    /// status code (invalid method, header, or body).
    #[error("Transport error: {message}")]
    Transport {
        /// Description of the failure
        message: String,
    },

    /// Every attempt allowed by the retry policy failed with a transient error.
    #[error("Retries exhausted after {attempts} attempt(s): {last_failure}")]
    RetriesExhausted {
        /// Number of attempts made
        attempts: u32,
        /// The last observed failure
        last_failure: String,
    },

    /// The caller's deadline passed before the request could succeed.
    #[error("Deadline exceeded after {attempts} attempt(s)")]
    DeadlineExceeded {
        /// Number of attempts made before giving up
        attempts: u32,
        /// The last observed failure, if any attempt ran
        last_failure: Option<String>,
    },

    /// A retry policy violated its bounds.
    #[error("Invalid retry policy: {0}")]
    InvalidRetryPolicy(String),

    /// The target URL could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A response body could not be decoded.
    #[error("Failed to decode response from {provider}: {message}")]
    Decode {
        /// The provider (or URL) the body came from
        provider: String,
        /// Decoder error message
        message: String,
    },

    /// A provider-specific error occurred.
    /// Try the next provider in the chain.
    #[error("Provider error: {provider} - {message}")]
    ProviderError {
        /// The provider that returned the error
        provider: String,
        /// The error message from the provider
        message: String,
    },

    /// The provider does not implement the requested operation.
    #[error("Operation '{operation}' not supported by {provider}")]
    NotSupported {
        /// The operation that was requested
        operation: String,
        /// The provider that doesn't support it
        provider: String,
    },

    /// The fallback chain was empty.
    #[error("No providers available")]
    NoProvidersAvailable,
}

impl MarketDataError {
    /// Returns the failover classification for this error.
    ///
    /// - [`RetryClass::Never`]: the request is invalid; stop walking the chain
    /// - [`RetryClass::NextProvider`]: this provider couldn't serve it; try the next
    ///
    /// # Examples
    ///
    /// ```
    /// use tradeboard_market_data::errors::{MarketDataError, RetryClass};
    ///
    /// let error = MarketDataError::RequestFailed { status: 400, url: "http://x".to_string() };
    /// assert_eq!(error.retry_class(), RetryClass::Never);
    ///
    /// let error = MarketDataError::RetriesExhausted { attempts: 3, last_failure: "HTTP 503".to_string() };
    /// assert_eq!(error.retry_class(), RetryClass::NextProvider);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self {
            // Client errors - another provider would reject the same request
            Self::RequestFailed { .. }
            | Self::InvalidRetryPolicy(_)
            | Self::InvalidUrl(_)
            | Self::InvalidConfig { .. }
            | Self::ProviderNotFound(_)
            | Self::NoProvidersAvailable => RetryClass::Never,

            // This provider is down, exhausted, or can't serve the operation
            Self::InitializationFailed { .. }
            | Self::Transport { .. }
            | Self::RetriesExhausted { .. }
            | Self::DeadlineExceeded { .. }
            | Self::Decode { .. }
            | Self::ProviderError { .. }
            | Self::NotSupported { .. } => RetryClass::NextProvider,
        }
    }
}
