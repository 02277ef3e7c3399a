//! Provider capabilities.
//!
//! Describes which data operations a market data provider can serve, so
//! callers can skip providers that would only answer `NotSupported`.

/// Describes the capabilities of a market data provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProviderCapabilities {
    /// Whether the provider supports latest quote fetching.
    pub supports_latest: bool,

    /// Whether the provider supports historical quote fetching.
    pub supports_historical: bool,

    /// Whether the provider supports symbol search.
    pub supports_search: bool,
}

impl Default for ProviderCapabilities {
    fn default() -> Self {
        Self {
            supports_latest: true,
            supports_historical: true,
            supports_search: false,
        }
    }
}
