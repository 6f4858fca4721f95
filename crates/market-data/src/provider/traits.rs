//! Provider adapter trait definitions.
//!
//! This module defines the core `ProviderAdapter` trait that all
//! upstream market data providers implement, and the request type
//! handed to them.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::errors::MarketDataError;
use crate::models::{Currency, MarketSnapshot};

use super::capabilities::ProviderCapabilities;

/// Per-call parameters for a market fetch.
///
/// Two requests that compare equal are served from the same cached snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FetchRequest {
    /// Lower-cased quote currency; empty for providers that ignore it
    pub currency: Currency,

    /// Extra query parameters for this call, overriding configured ones
    pub params: BTreeMap<String, String>,
}

impl FetchRequest {
    pub fn for_currency(currency: &str) -> Self {
        Self {
            currency: currency.trim().to_lowercase(),
            params: BTreeMap::new(),
        }
    }

    /// A request whose result does not depend on currency.
    pub fn unscoped() -> Self {
        Self::default()
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Upper-cased currency as most providers expect it in query strings.
    pub fn currency_upper(&self) -> String {
        self.currency.to_uppercase()
    }
}

/// Trait for upstream market data providers.
///
/// Implement this trait to add support for a new source. An adapter knows
/// its provider's endpoint conventions and wire format, and translates a
/// raw response into a [`MarketSnapshot`] keyed by upper-cased symbol.
///
/// Adapters own their HTTP transport and its timeout, and never retry.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use coinfeed_market_data::provider::{FetchRequest, ProviderAdapter, ProviderCapabilities};
///
/// struct MyProvider;
///
/// #[async_trait]
/// impl ProviderAdapter for MyProvider {
///     fn id(&self) -> &'static str {
///         "MY_PROVIDER"
///     }
///
///     fn capabilities(&self) -> ProviderCapabilities {
///         ProviderCapabilities::price_only()
///     }
///
///     async fn fetch_market_data(
///         &self,
///         request: &FetchRequest,
///     ) -> Result<MarketSnapshot, MarketDataError> {
///         // ... call upstream and normalize
///     }
/// }
/// ```
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Unique identifier for this provider, e.g. "COINGECKO".
    ///
    /// Used in logs and error messages.
    fn id(&self) -> &'static str;

    /// Describes which record fields this provider actually fills.
    fn capabilities(&self) -> ProviderCapabilities;

    /// Fetch and normalize the provider's market data.
    ///
    /// Returns one entry per tracked coin the provider recognizes.
    /// Coins missing from the payload are skipped, not errors.
    async fn fetch_market_data(
        &self,
        request: &FetchRequest,
    ) -> Result<MarketSnapshot, MarketDataError>;
}
