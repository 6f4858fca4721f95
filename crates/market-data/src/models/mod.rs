//! Market data models
//!
//! This module contains the core data types shared by every provider:
//! - `types` - Type aliases for common identifiers (Currency)
//! - `record` - The normalized record (MarketRecord) and per-fetch snapshot
//! - `coin` - The tracked coin list (CoinConfig)
//! - `settings` - Per-provider connection settings (ProviderSettings, ApiConfig)

mod coin;
mod record;
mod settings;
mod types;

pub use coin::{Coin, CoinConfig};
pub use record::{insert_unique, non_negative, valid_price, MarketRecord, MarketSnapshot, Sparkline};
pub use settings::{ApiConfig, ProviderSettings, DEFAULT_CACHE_TTL_SECS, DEFAULT_TIMEOUT_SECS};
pub use types::Currency;
