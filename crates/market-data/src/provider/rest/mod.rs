//! Configurable HTTP provider.
//!
//! Speaks the normalized JSON document format:
//! - `GET {quotePath}?symbol=AAPL` -> one quote document
//! - `GET {historyPath}?symbol=AAPL&start=..&end=..` -> array of quote documents
//! - `GET {searchPath}?q=apple` -> array of search documents
//! - `GET {healthPath}` -> any 2xx means healthy
//!
//! Vendor-specific formats are out of scope; a gateway in front of each vendor
//! is expected to serve this shape. All network calls go through the shared
//! [`RetryableFetch`].

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::ProviderConfig;
use crate::errors::MarketDataError;
use crate::fetch::{FetchResponse, RequestOptions, RetryPolicy, RetryableFetch};
use crate::models::{Quote, SearchResult};
use crate::provider::{MarketDataProvider, ProviderCapabilities};

// ============================================================================
// Wire documents
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteDocument {
    #[serde(default)]
    symbol: Option<String>,
    timestamp: DateTime<Utc>,
    #[serde(default)]
    open: Option<Decimal>,
    #[serde(default)]
    high: Option<Decimal>,
    #[serde(default)]
    low: Option<Decimal>,
    close: Decimal,
    #[serde(default)]
    volume: Option<Decimal>,
    currency: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchDocument {
    symbol: String,
    name: String,
    #[serde(default)]
    exchange: Option<String>,
    #[serde(default)]
    currency: Option<String>,
}

// ============================================================================
// RestProvider
// ============================================================================

/// HTTP provider driven entirely by [`ProviderConfig`].
pub struct RestProvider {
    config: ProviderConfig,
    fetch: RetryableFetch,
    ready: AtomicBool,
}

impl RestProvider {
    pub fn new(config: ProviderConfig, fetch: RetryableFetch) -> Self {
        Self {
            config,
            fetch,
            ready: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Base request carrying the API key, if any.
    fn request(&self) -> RequestOptions {
        let options = RequestOptions::get().header("Accept", "application/json");

        match (&self.config.api_key, &self.config.api_key_header) {
            (Some(key), Some(header)) => options.header(header.as_str(), key.as_str()),
            (Some(key), None) => options.param(self.config.api_key_param.as_str(), key.as_str()),
            (None, _) => options,
        }
    }

    fn ensure_ready(&self) -> Result<(), MarketDataError> {
        if self.ready.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(MarketDataError::ProviderError {
                provider: self.config.name.clone(),
                message: "provider used before initialize()".to_string(),
            })
        }
    }

    async fn get(
        &self,
        path: &str,
        options: RequestOptions,
        policy: Option<&RetryPolicy>,
    ) -> Result<FetchResponse, MarketDataError> {
        let url = self.endpoint(path);
        debug!(
            "{} request: {} with {} params",
            self.config.name,
            path,
            options.params.len()
        );

        let policy = policy.or(self.config.retry.as_ref());
        self.fetch.fetch_with_retry(&url, &options, policy).await
    }

    fn decode<T: serde::de::DeserializeOwned>(
        &self,
        response: &FetchResponse,
    ) -> Result<T, MarketDataError> {
        serde_json::from_str(&response.body).map_err(|e| {
            warn!("{}: failed to decode {}: {}", self.config.name, response.url, e);
            MarketDataError::Decode {
                provider: self.config.name.clone(),
                message: e.to_string(),
            }
        })
    }

    fn to_quote(&self, requested: &str, doc: QuoteDocument) -> Quote {
        Quote {
            symbol: doc.symbol.unwrap_or_else(|| requested.to_string()),
            timestamp: doc.timestamp,
            open: doc.open,
            high: doc.high,
            low: doc.low,
            close: doc.close,
            volume: doc.volume,
            currency: doc.currency,
            source: self.config.name.clone(),
        }
    }
}

#[async_trait]
impl MarketDataProvider for RestProvider {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn priority(&self) -> i32 {
        self.config.priority
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            supports_latest: true,
            supports_historical: true,
            supports_search: self.config.supports_search,
        }
    }

    async fn initialize(&self) -> Result<(), MarketDataError> {
        reqwest::Url::parse(&self.config.base_url).map_err(|e| {
            MarketDataError::InitializationFailed {
                provider: self.config.name.clone(),
                message: format!("invalid base URL '{}': {}", self.config.base_url, e),
            }
        })?;

        self.ready.store(true, Ordering::Release);
        Ok(())
    }

    fn validate_config(&self) -> bool {
        let config = &self.config;

        if config.name.trim().is_empty() {
            return false;
        }
        if !(config.base_url.starts_with("http://") || config.base_url.starts_with("https://")) {
            return false;
        }
        if matches!(&config.api_key, Some(key) if key.trim().is_empty()) {
            return false;
        }

        true
    }

    async fn health_check(&self) -> Result<bool, MarketDataError> {
        // A probe answers "reachable right now?", so it never retries
        self.get(
            &self.config.health_path,
            self.request(),
            Some(&RetryPolicy::single_attempt()),
        )
        .await?;
        Ok(true)
    }

    async fn get_latest_quote(&self, symbol: &str) -> Result<Quote, MarketDataError> {
        self.ensure_ready()?;

        let options = self.request().param("symbol", symbol);
        let response = self.get(&self.config.quote_path, options, None).await?;
        let doc: QuoteDocument = self.decode(&response)?;

        Ok(self.to_quote(symbol, doc))
    }

    async fn get_historical_quotes(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Quote>, MarketDataError> {
        self.ensure_ready()?;

        let options = self
            .request()
            .param("symbol", symbol)
            .param("start", start.to_rfc3339_opts(SecondsFormat::Secs, true))
            .param("end", end.to_rfc3339_opts(SecondsFormat::Secs, true));
        let response = self.get(&self.config.history_path, options, None).await?;
        let docs: Vec<QuoteDocument> = self.decode(&response)?;

        let mut quotes: Vec<Quote> = docs
            .into_iter()
            .map(|doc| self.to_quote(symbol, doc))
            .filter(|q| q.timestamp >= start && q.timestamp <= end)
            .collect();
        quotes.sort_by_key(|q| q.timestamp);

        Ok(quotes)
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, MarketDataError> {
        if !self.config.supports_search {
            return Err(MarketDataError::NotSupported {
                operation: "search".to_string(),
                provider: self.config.name.clone(),
            });
        }
        self.ensure_ready()?;

        let options = self.request().param("q", query);
        let response = self.get(&self.config.search_path, options, None).await?;
        let docs: Vec<SearchDocument> = self.decode(&response)?;

        Ok(docs
            .into_iter()
            .map(|doc| SearchResult {
                symbol: doc.symbol,
                name: doc.name,
                exchange: doc.exchange,
                currency: doc.currency,
                source: self.config.name.clone(),
            })
            .collect())
    }
}
