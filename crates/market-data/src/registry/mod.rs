//! Provider registry module.
//!
//! This module turns adapters into a queryable service:
//! - `CachedFetcher` wraps one adapter with a TTL cache
//! - `ProviderKind` is the closed set of provider names callers may use
//! - `MarketDispatcher` routes a provider name and currency to its fetcher

mod cached_fetcher;
mod dispatcher;
mod provider_kind;

pub use cached_fetcher::{CacheStatus, CachedFetcher};
pub use dispatcher::{MarketDispatcher, ProviderStatus, DEFAULT_CURRENCY};
pub use provider_kind::ProviderKind;
