//! Market data provider trait definitions.
//!
//! This module defines the core `MarketDataProvider` trait that all
//! market data providers must implement.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::MarketDataError;
use crate::models::{Quote, SearchResult};

use super::capabilities::ProviderCapabilities;

/// Trait for market data providers.
///
/// Implement this trait to add support for a new market data source.
/// The registry uses `name` as the provider's identity and `priority`
/// to place it in the fallback chain.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use tradeboard_market_data::provider::MarketDataProvider;
///
/// struct MyProvider {
///     api_key: String,
/// }
///
/// #[async_trait]
/// impl MarketDataProvider for MyProvider {
///     fn name(&self) -> &str {
///         "MY_PROVIDER"
///     }
///
///     fn validate_config(&self) -> bool {
///         !self.api_key.is_empty()
///     }
///
///     // ... implement health_check and quote methods
/// }
/// ```
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Unique name for this provider.
    ///
    /// Used as the registry key, in the fallback chain, and in logs.
    fn name(&self) -> &str;

    /// Provider priority for ordering.
    ///
    /// Higher values = preferred. Default is 0. Providers with equal
    /// priority keep their registration order in the fallback chain.
    fn priority(&self) -> i32 {
        0
    }

    /// Describes which data operations this provider serves.
    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities::default()
    }

    /// Prepare the provider for use.
    ///
    /// Called once by the registry before `validate_config`. An error aborts
    /// registration.
    async fn initialize(&self) -> Result<(), MarketDataError> {
        Ok(())
    }

    /// Check that the provider's configuration is usable.
    ///
    /// Returning false aborts registration with `InvalidConfig`.
    fn validate_config(&self) -> bool;

    /// Probe whether the provider is reachable right now.
    ///
    /// An error is treated as unhealthy by the registry.
    async fn health_check(&self) -> Result<bool, MarketDataError>;

    /// Fetch the latest quote for a symbol.
    async fn get_latest_quote(&self, symbol: &str) -> Result<Quote, MarketDataError>;

    /// Fetch historical quotes for a symbol.
    ///
    /// `start` and `end` are inclusive. Quotes are ordered by timestamp ascending.
    async fn get_historical_quotes(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Quote>, MarketDataError>;

    /// Search for symbols matching the query.
    ///
    /// Default implementation returns `NotSupported`.
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, MarketDataError> {
        let _ = query;
        Err(MarketDataError::NotSupported {
            operation: "search".to_string(),
            provider: self.name().to_string(),
        })
    }
}
