//! Coinfeed Market Data Crate
//!
//! Fetches cryptocurrency spot-market data (price, market cap, 24h volume,
//! 7-day sparkline) from several upstream providers and normalizes every
//! response into one record shape.
//!
//! # Architecture
//!
//! ```text
//! +------------------+
//! | MarketDispatcher |  (provider name + currency -> snapshot)
//! +------------------+
//!          |
//!          v
//! +------------------+
//! |  CachedFetcher   |  (one per provider, TTL cache)
//! +------------------+
//!          |
//!          v
//! +------------------+
//! | ProviderAdapter  |  (Binance, CoinGecko, CryptoCompare, CoinMarketCap)
//! +------------------+
//!          |
//!          v
//! +------------------+
//! |  MarketSnapshot  |  (symbol -> MarketRecord)
//! +------------------+
//! ```
//!
//! # Core Types
//!
//! - [`MarketRecord`] - Normalized per-asset market data
//! - [`CoinConfig`] - The static list of tracked coins
//! - [`ApiConfig`] / [`ProviderSettings`] - Per-provider connection settings
//! - [`ProviderKind`] - The closed set of provider names
//! - [`MarketDispatcher`] - Entry point for callers

pub mod errors;
pub mod models;
pub mod provider;
pub mod registry;

// Re-export all public types from models
pub use models::{
    ApiConfig, Coin, CoinConfig, Currency, MarketRecord, MarketSnapshot, ProviderSettings,
    Sparkline,
};

// Re-export provider types
pub use provider::binance::BinanceProvider;
pub use provider::coingecko::CoinGeckoProvider;
pub use provider::coinmarketcap::CoinMarketCapProvider;
pub use provider::cryptocompare::CryptoCompareProvider;
pub use provider::{FetchRequest, ProviderAdapter, ProviderCapabilities};

// Re-export registry types
pub use registry::{
    CacheStatus, CachedFetcher, MarketDispatcher, ProviderKind, ProviderStatus, DEFAULT_CURRENCY,
};

pub use errors::{ConfigError, MarketDataError, RetryClass};
