//! Provider capabilities.
//!
//! Describes which parts of a normalized record a provider can fill, so
//! callers know which zero values are "unknown" rather than "zero".

use serde::Serialize;

/// Describes the capabilities of a market data provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderCapabilities {
    /// Whether records carry a market capitalization.
    pub supports_market_cap: bool,

    /// Whether records carry a 24h volume.
    pub supports_volume: bool,

    /// Whether records carry a native 7-day sparkline.
    pub supports_sparkline: bool,

    /// Whether the provider needs an API key.
    pub requires_api_key: bool,
}

impl ProviderCapabilities {
    /// A provider that only reports prices.
    pub const fn price_only() -> Self {
        Self {
            supports_market_cap: false,
            supports_volume: false,
            supports_sparkline: false,
            requires_api_key: false,
        }
    }
}
