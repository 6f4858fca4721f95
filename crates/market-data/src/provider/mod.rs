//! Market data provider abstractions and implementations.
//!
//! This module contains:
//! - The `ProviderAdapter` trait that all providers implement
//! - Provider capabilities
//! - Concrete adapters (Binance, CoinGecko, CryptoCompare, CoinMarketCap)
//!
//! # Architecture
//!
//! Each adapter owns its HTTP transport (endpoint, API key, timeout) and
//! knows one wire format. Caching and provider selection live in the
//! registry module, not in the adapters themselves.

mod capabilities;
mod http;
mod parse;
mod traits;

pub mod binance;
pub mod coingecko;
pub mod coinmarketcap;
pub mod cryptocompare;

// Re-exports
pub use capabilities::ProviderCapabilities;
pub use traits::{FetchRequest, ProviderAdapter};
