//! Tradeboard Market Data Crate
//!
//! This crate provides the resilient, provider-agnostic data-fetch layer
//! behind the Tradeboard dashboard.
//!
//! # Overview
//!
//! The market data crate supports:
//! - Interchangeable providers behind one trait
//! - A priority-ordered fallback chain with stable tie-breaking
//! - Concurrent, timeout-bounded provider health checks
//! - HTTP fetching with classified retries and exponential backoff
//!
//! # Architecture
//!
//! ```text
//! +------------------+
//! |     Caller       |  (dashboard, probe binary)
//! +------------------+
//!          |  fallback_chain() / fetch_with_fallback()
//!          v
//! +------------------+
//! | ProviderRegistry |  (ordering + health, no cross-provider retry)
//! +------------------+
//!          |
//!          v
//! +------------------+
//! |    Provider      |  (RestProvider, custom adapters)
//! +------------------+
//!          |
//!          v
//! +------------------+
//! |  RetryableFetch  |  (per-request retry/backoff)
//! +------------------+
//! ```
//!
//! # Core Types
//!
//! - [`ProviderRegistry`] - Registered providers and their fallback chain
//! - [`MarketDataProvider`] - Capability contract every provider implements
//! - [`RetryableFetch`] - HTTP client with bounded, classified retries
//! - [`RetryPolicy`] - Attempts and backoff parameters
//! - [`Quote`] - Normalized market data quote

pub mod config;
pub mod errors;
pub mod fallback;
pub mod fetch;
pub mod models;
pub mod provider;
pub mod registry;

// Re-export all public types from models
pub use models::{HealthStatus, Quote, SearchResult};

// Re-export fetch types
pub use fetch::{AttemptOutcome, FetchResponse, RequestOptions, RetryPolicy, RetryableFetch};

// Re-export provider types
pub use provider::rest::RestProvider;
pub use provider::{MarketDataProvider, ProviderCapabilities};

// Re-export registry and fallback types
pub use fallback::{fetch_with_fallback, FallbackDiagnostics, ProviderAttempt, SkipReason};
pub use registry::ProviderRegistry;

pub use config::{ConfigError, MarketDataConfig, ProviderConfig};
pub use errors::{MarketDataError, RetryClass};
