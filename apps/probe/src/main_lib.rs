use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tradeboard_market_data::{
    MarketDataConfig, ProviderRegistry, RestProvider, RetryableFetch,
};

pub fn init_tracing() {
    let log_format = std::env::var("MD_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

/// What the probe prints on stdout.
#[derive(Debug, Serialize)]
pub struct ProbeReport {
    pub fallback_chain: Vec<String>,
    pub health: BTreeMap<String, bool>,
}

/// Register every configured provider on a fresh registry.
///
/// Providers that fail to register are logged and left out; the rest of the
/// configuration still loads.
pub async fn build_registry(config: &MarketDataConfig) -> ProviderRegistry {
    let fetch = RetryableFetch::with_timeout(config.retry.clone(), config.request_timeout());
    let registry = ProviderRegistry::with_health_check_timeout(config.health_check_timeout());

    for provider_config in &config.providers {
        let name = provider_config.name.clone();
        let provider = Arc::new(RestProvider::new(provider_config.clone(), fetch.clone()));

        match registry.register_provider(provider).await {
            Ok(()) => tracing::debug!("Provider '{}' ready", name),
            Err(e) => tracing::error!("Skipping provider '{}': {}", name, e),
        }
    }

    if registry.is_empty() {
        tracing::warn!("No providers registered; check MD_CONFIG_FILE");
    }

    registry
}

pub async fn run_probe(registry: &ProviderRegistry) -> ProbeReport {
    let health = registry.health_check().await;
    let unhealthy = health.values().filter(|ok| !**ok).count();
    if unhealthy > 0 {
        tracing::warn!("{} of {} providers unhealthy", unhealthy, health.len());
    } else {
        tracing::info!("All {} providers healthy", health.len());
    }

    ProbeReport {
        fallback_chain: registry.fallback_chain(),
        health: health.into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tradeboard_market_data::ProviderConfig;

    #[tokio::test]
    async fn test_bad_providers_are_skipped() {
        let mut config = MarketDataConfig::default();
        config.providers = vec![
            ProviderConfig::new("GOOD", "http://127.0.0.1:1", 1),
            ProviderConfig::new("BAD_SCHEME", "ftp://example.com", 5),
            ProviderConfig::new("ALSO_GOOD", "https://example.com", 3),
        ];

        let registry = build_registry(&config).await;
        assert_eq!(
            registry.fallback_chain(),
            vec!["ALSO_GOOD".to_string(), "GOOD".to_string()]
        );
    }

    #[tokio::test]
    async fn test_report_shape() {
        let registry = ProviderRegistry::new();
        let report = run_probe(&registry).await;
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "fallback_chain": [], "health": {} })
        );
    }
}
