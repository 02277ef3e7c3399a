//! Provider registry module.
//!
//! This module provides:
//! - Provider registration with initialize/validate gating
//! - The priority-ordered fallback chain
//! - Concurrent, timeout-bounded health checks

mod provider_registry;

pub use provider_registry::{ProviderRegistry, DEFAULT_HEALTH_CHECK_TIMEOUT};
