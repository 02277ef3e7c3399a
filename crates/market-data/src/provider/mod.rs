//! Market data provider abstractions and implementations.
//!
//! This module contains:
//! - The `MarketDataProvider` trait that all providers implement
//! - Provider capabilities
//! - `RestProvider`, a configurable HTTP adapter
//!
//! Providers do their network I/O through [`RetryableFetch`](crate::fetch::RetryableFetch);
//! the registry only orders and probes them.

mod capabilities;
mod traits;

pub mod rest;

pub use capabilities::ProviderCapabilities;
pub use traits::MarketDataProvider;
