//! Provider registry.
//!
//! The registry is the single source of truth for which providers exist and in
//! what order they should be tried. It handles:
//! - Registration (initialize + validate, then insert)
//! - Fallback chain derivation (priority descending, registration order on ties)
//! - Point-in-time health aggregation across all providers
//!
//! It never retries across providers; see [`crate::fallback`] for that.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use futures::future::join_all;
use log::{debug, info, warn};

use crate::errors::MarketDataError;
use crate::models::HealthStatus;
use crate::provider::MarketDataProvider;

/// Default per-probe timeout for `health_check`.
pub const DEFAULT_HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

struct RegisteredProvider {
    provider: Arc<dyn MarketDataProvider>,
    /// Priority captured at registration, so the chain can't drift.
    priority: i32,
}

/// Provider map plus its derived chain. Always mutated as a unit.
#[derive(Default)]
struct RegistryState {
    providers: HashMap<String, RegisteredProvider>,
    /// Names in first-registration order. Re-registering keeps the original slot.
    registration_order: Vec<String>,
    /// Derived from the two fields above; rebuilt on every change.
    fallback_chain: Vec<String>,
}

impl RegistryState {
    fn recompute_chain(&mut self) {
        let mut ranked: Vec<(&String, i32)> = self
            .registration_order
            .iter()
            .filter_map(|name| self.providers.get(name).map(|p| (name, p.priority)))
            .collect();

        // sort_by is stable: equal priorities keep registration order
        ranked.sort_by(|a, b| b.1.cmp(&a.1));

        self.fallback_chain = ranked.into_iter().map(|(name, _)| name.clone()).collect();
    }
}

/// Registry of market data providers.
///
/// Construct one per scope and share it (e.g. behind an `Arc`). All methods
/// take `&self`; the provider map is guarded by a read/write lock so readers
/// never observe a half-updated fallback chain.
pub struct ProviderRegistry {
    state: RwLock<RegistryState>,
    health_check_timeout: Duration,
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderRegistry {
    /// Create an empty registry with the default 5s health probe timeout.
    pub fn new() -> Self {
        Self::with_health_check_timeout(DEFAULT_HEALTH_CHECK_TIMEOUT)
    }

    /// Create an empty registry with a custom per-probe timeout.
    pub fn with_health_check_timeout(health_check_timeout: Duration) -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
            health_check_timeout,
        }
    }

    /// Lock the state for reading, recovering from poison if necessary.
    ///
    /// Writers only swap fully built values in, so a poisoned lock still
    /// holds a consistent map and chain.
    fn read_state(&self) -> RwLockReadGuard<'_, RegistryState> {
        self.state.read().unwrap_or_else(|poisoned| {
            warn!("Provider registry lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.state.write().unwrap_or_else(|poisoned| {
            warn!("Provider registry lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Register a provider.
    ///
    /// 1. Awaits `initialize()`; a failure aborts with `InitializationFailed`
    /// 2. Calls `validate_config()`; false aborts with `InvalidConfig`
    /// 3. Inserts (or replaces) the provider under its name and rebuilds the chain
    ///
    /// Steps 1 and 2 run without holding the lock. A failed registration
    /// leaves the registry untouched.
    pub async fn register_provider(
        &self,
        provider: Arc<dyn MarketDataProvider>,
    ) -> Result<(), MarketDataError> {
        let name = provider.name().to_string();

        if let Err(e) = provider.initialize().await {
            warn!("Provider '{}' failed to initialize: {}", name, e);
            return Err(match e {
                MarketDataError::InitializationFailed { .. } => e,
                other => MarketDataError::InitializationFailed {
                    provider: name,
                    message: other.to_string(),
                },
            });
        }

        if !provider.validate_config() {
            warn!("Provider '{}' rejected its configuration", name);
            return Err(MarketDataError::InvalidConfig { provider: name });
        }

        let priority = provider.priority();
        let mut state = self.write_state();

        let replaced = state
            .providers
            .insert(name.clone(), RegisteredProvider { provider, priority })
            .is_some();
        if !replaced {
            state.registration_order.push(name.clone());
        }
        state.recompute_chain();

        if replaced {
            info!("Replaced provider '{}' (priority {})", name, priority);
        } else {
            info!("Registered provider '{}' (priority {})", name, priority);
        }
        debug!("Fallback chain: {:?}", state.fallback_chain);

        Ok(())
    }

    /// Look up a provider by name. No fallback substitution.
    pub fn get_provider(&self, name: &str) -> Result<Arc<dyn MarketDataProvider>, MarketDataError> {
        self.read_state()
            .providers
            .get(name)
            .map(|p| Arc::clone(&p.provider))
            .ok_or_else(|| MarketDataError::ProviderNotFound(name.to_string()))
    }

    /// Provider names ordered by preference.
    ///
    /// Returns an owned copy; changing it has no effect on the registry.
    pub fn fallback_chain(&self) -> Vec<String> {
        self.read_state().fallback_chain.clone()
    }

    /// Providers ordered by preference, snapshotted under one lock.
    pub fn providers_in_chain_order(&self) -> Vec<Arc<dyn MarketDataProvider>> {
        let state = self.read_state();
        state
            .fallback_chain
            .iter()
            .filter_map(|name| state.providers.get(name))
            .map(|p| Arc::clone(&p.provider))
            .collect()
    }

    /// Provider names in registration order.
    pub fn provider_names(&self) -> Vec<String> {
        self.read_state().registration_order.clone()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read_state().providers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.read_state().providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_state().providers.is_empty()
    }

    pub fn health_check_timeout(&self) -> Duration {
        self.health_check_timeout
    }

    /// Probe every registered provider and report name -> healthy.
    ///
    /// Probes run concurrently, each on its own task under the per-probe
    /// timeout. A probe that errors, panics, or times out is reported as
    /// `false`; it never affects the other probes and is never propagated.
    pub async fn health_check(&self) -> HealthStatus {
        let snapshot: Vec<(String, Arc<dyn MarketDataProvider>)> = {
            let state = self.read_state();
            state
                .registration_order
                .iter()
                .filter_map(|name| {
                    state
                        .providers
                        .get(name)
                        .map(|p| (name.clone(), Arc::clone(&p.provider)))
                })
                .collect()
        };

        let timeout = self.health_check_timeout;
        let probes = snapshot.into_iter().map(|(name, provider)| {
            let task_name = name.clone();
            let handle = tokio::spawn(async move {
                match tokio::time::timeout(timeout, provider.health_check()).await {
                    Ok(Ok(healthy)) => healthy,
                    Ok(Err(e)) => {
                        warn!("Health probe for '{}' failed: {}", task_name, e);
                        false
                    }
                    Err(_) => {
                        warn!(
                            "Health probe for '{}' timed out after {:?}",
                            task_name, timeout
                        );
                        false
                    }
                }
            });
            async move {
                match handle.await {
                    Ok(healthy) => (name, healthy),
                    Err(e) => {
                        warn!("Health probe for '{}' aborted: {}", name, e);
                        (name, false)
                    }
                }
            }
        });

        let status: HealthStatus = join_all(probes).await.into_iter().collect();
        debug!("Health check complete: {:?}", status);
        status
    }
}
