//! Caller-level failover across the registry's fallback chain.
//!
//! The registry only says which providers exist and in what order. This module
//! is one policy layered on top of that: walk the chain, stop on the first
//! success or on an error no other provider could fix, and record what happened
//! to each provider along the way.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};

use crate::errors::{MarketDataError, RetryClass};
use crate::models::{Quote, SearchResult};
use crate::provider::{MarketDataProvider, ProviderCapabilities};
use crate::registry::ProviderRegistry;

/// Why a provider was skipped during a fallback walk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// Provider doesn't declare the capability this operation needs.
    OperationNotSupported,
}

/// Record of a single provider during a fallback walk.
#[derive(Clone, Debug)]
pub struct ProviderAttempt {
    pub provider: String,
    pub skipped: Option<SkipReason>,
    pub error: Option<String>,
    pub success: bool,
}

/// What happened to each provider, in the order they were visited.
#[derive(Clone, Debug, Default)]
pub struct FallbackDiagnostics {
    pub attempts: Vec<ProviderAttempt>,
}

impl FallbackDiagnostics {
    pub fn new() -> Self {
        Self {
            attempts: Vec::new(),
        }
    }

    pub fn record_skip(&mut self, provider: &str, reason: SkipReason) {
        self.attempts.push(ProviderAttempt {
            provider: provider.to_string(),
            skipped: Some(reason),
            error: None,
            success: false,
        });
    }

    pub fn record_error(&mut self, provider: &str, error: String) {
        self.attempts.push(ProviderAttempt {
            provider: provider.to_string(),
            skipped: None,
            error: Some(error),
            success: false,
        });
    }

    pub fn record_success(&mut self, provider: &str) {
        self.attempts.push(ProviderAttempt {
            provider: provider.to_string(),
            skipped: None,
            error: None,
            success: true,
        });
    }

    /// Provider that served the request, if any.
    pub fn served_by(&self) -> Option<&str> {
        self.attempts
            .iter()
            .find(|a| a.success)
            .map(|a| a.provider.as_str())
    }

    /// Providers that were actually called (not skipped).
    pub fn tried(&self) -> Vec<&str> {
        self.attempts
            .iter()
            .filter(|a| a.skipped.is_none())
            .map(|a| a.provider.as_str())
            .collect()
    }

    /// One-line summary for logs.
    pub fn summary(&self) -> String {
        self.attempts
            .iter()
            .map(|a| {
                if a.success {
                    format!("{}: ok", a.provider)
                } else if let Some(reason) = &a.skipped {
                    format!("{}: skipped ({:?})", a.provider, reason)
                } else {
                    format!(
                        "{}: failed ({})",
                        a.provider,
                        a.error.as_deref().unwrap_or("unknown")
                    )
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Run `op` against each provider in fallback order until one succeeds.
///
/// - success: returned immediately
/// - [`RetryClass::Never`] error: returned immediately, later providers untouched
/// - [`RetryClass::NextProvider`] error: recorded, next provider tried
///
/// An empty chain yields `NoProvidersAvailable`; if every provider fails, the
/// last error is returned.
pub async fn fetch_with_fallback<T, F, Fut>(
    registry: &ProviderRegistry,
    op: F,
) -> (Result<T, MarketDataError>, FallbackDiagnostics)
where
    F: FnMut(Arc<dyn MarketDataProvider>) -> Fut,
    Fut: Future<Output = Result<T, MarketDataError>>,
{
    walk_chain(registry, |_| true, op).await
}

async fn walk_chain<T, S, F, Fut>(
    registry: &ProviderRegistry,
    supports: S,
    mut op: F,
) -> (Result<T, MarketDataError>, FallbackDiagnostics)
where
    S: Fn(&ProviderCapabilities) -> bool,
    F: FnMut(Arc<dyn MarketDataProvider>) -> Fut,
    Fut: Future<Output = Result<T, MarketDataError>>,
{
    let mut diagnostics = FallbackDiagnostics::new();
    let providers = registry.providers_in_chain_order();

    if providers.is_empty() {
        warn!("Fallback requested but no providers are registered");
        return (Err(MarketDataError::NoProvidersAvailable), diagnostics);
    }

    let mut last_error: Option<MarketDataError> = None;

    for provider in providers {
        let name = provider.name().to_string();

        if !supports(&provider.capabilities()) {
            diagnostics.record_skip(&name, SkipReason::OperationNotSupported);
            continue;
        }

        match op(provider).await {
            Ok(value) => {
                diagnostics.record_success(&name);
                debug!("Fallback served by '{}': {}", name, diagnostics.summary());
                return (Ok(value), diagnostics);
            }
            Err(e) => {
                diagnostics.record_error(&name, e.to_string());

                match e.retry_class() {
                    RetryClass::Never => {
                        info!("Terminal error from '{}': {}, not trying others", name, e);
                        return (Err(e), diagnostics);
                    }
                    RetryClass::NextProvider => {
                        debug!("Provider '{}' failed with {}, trying next provider", name, e);
                        last_error = Some(e);
                    }
                }
            }
        }
    }

    if last_error.is_none() {
        // Every provider was skipped for lack of capability
        return (Err(MarketDataError::NoProvidersAvailable), diagnostics);
    }

    warn!("All providers failed: {}", diagnostics.summary());
    (
        Err(last_error.unwrap_or(MarketDataError::NoProvidersAvailable)),
        diagnostics,
    )
}

/// Latest quote from the first provider that can serve it.
pub async fn latest_quote_with_fallback(
    registry: &ProviderRegistry,
    symbol: &str,
) -> (Result<Quote, MarketDataError>, FallbackDiagnostics) {
    walk_chain(
        registry,
        |caps| caps.supports_latest,
        |provider| async move { provider.get_latest_quote(symbol).await },
    )
    .await
}

/// Historical quotes from the first provider that can serve them.
pub async fn historical_quotes_with_fallback(
    registry: &ProviderRegistry,
    symbol: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> (Result<Vec<Quote>, MarketDataError>, FallbackDiagnostics) {
    walk_chain(
        registry,
        |caps| caps.supports_historical,
        |provider| async move { provider.get_historical_quotes(symbol, start, end).await },
    )
    .await
}

/// Search results from the first search-capable provider that answers.
pub async fn search_with_fallback(
    registry: &ProviderRegistry,
    query: &str,
) -> (Result<Vec<SearchResult>, MarketDataError>, FallbackDiagnostics) {
    walk_chain(
        registry,
        |caps| caps.supports_search,
        |provider| async move { provider.search(query).await },
    )
    .await
}
