//! Provider dispatcher.
//!
//! Maps a provider name and currency to the right [`CachedFetcher`] and
//! applies the provider's currency handling. Unknown names are rejected
//! before any fetcher is touched.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::Serialize;

use super::cached_fetcher::CachedFetcher;
use super::provider_kind::ProviderKind;
use crate::errors::MarketDataError;
use crate::models::{ApiConfig, CoinConfig, MarketRecord, MarketSnapshot};
use crate::provider::binance::{trading_pair, BinanceProvider};
use crate::provider::coingecko::CoinGeckoProvider;
use crate::provider::coinmarketcap::CoinMarketCapProvider;
use crate::provider::cryptocompare::CryptoCompareProvider;
use crate::provider::{FetchRequest, ProviderAdapter, ProviderCapabilities};

/// Currency used when the caller supplies none.
pub const DEFAULT_CURRENCY: &str = "usd";

/// Cache state of one registered provider.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStatus {
    pub provider: ProviderKind,
    pub id: &'static str,
    pub capabilities: ProviderCapabilities,
    pub cache_ttl_secs: u64,
    pub currency: Option<String>,
    pub entries: usize,
    pub last_fetched_at: Option<DateTime<Utc>>,
}

/// Routes fetches to one cached fetcher per configured provider.
pub struct MarketDispatcher {
    coins: Arc<CoinConfig>,
    fetchers: HashMap<ProviderKind, CachedFetcher>,
}

impl MarketDispatcher {
    /// Create a dispatcher with no providers registered.
    pub fn new(coins: Arc<CoinConfig>) -> Self {
        Self {
            coins,
            fetchers: HashMap::new(),
        }
    }

    /// Build adapters for every provider present in `api`.
    pub fn from_config(coins: Arc<CoinConfig>, api: &ApiConfig) -> Result<Self, MarketDataError> {
        let mut dispatcher = Self::new(Arc::clone(&coins));

        if let Some(settings) = &api.binance {
            let ttl = settings.cache_ttl();
            dispatcher.register(
                ProviderKind::Binance,
                Arc::new(BinanceProvider::new(settings.clone())?),
                ttl,
            );
        }
        if let Some(settings) = &api.coingecko {
            let ttl = settings.cache_ttl();
            dispatcher.register(
                ProviderKind::Gecko,
                Arc::new(CoinGeckoProvider::new(settings.clone(), Arc::clone(&coins))?),
                ttl,
            );
        }
        if let Some(settings) = &api.cryptocompare {
            let ttl = settings.cache_ttl();
            dispatcher.register(
                ProviderKind::CryptoCompare,
                Arc::new(CryptoCompareProvider::new(settings.clone(), Arc::clone(&coins))?),
                ttl,
            );
        }
        if let Some(settings) = &api.coinmarketcap {
            let ttl = settings.cache_ttl();
            dispatcher.register(
                ProviderKind::CoinMarketCap,
                Arc::new(CoinMarketCapProvider::new(settings.clone(), Arc::clone(&coins))?),
                ttl,
            );
        }

        Ok(dispatcher)
    }

    /// Register (or replace) the adapter serving `kind`.
    pub fn register(
        &mut self,
        kind: ProviderKind,
        adapter: Arc<dyn ProviderAdapter>,
        ttl: Duration,
    ) {
        info!(
            "Registered provider '{}' ({}) with TTL {:?}",
            kind,
            adapter.id(),
            ttl
        );
        self.fetchers.insert(kind, CachedFetcher::new(adapter, ttl));
    }

    /// Builder form of [`register`](Self::register).
    pub fn with_provider(
        mut self,
        kind: ProviderKind,
        adapter: Arc<dyn ProviderAdapter>,
        ttl: Duration,
    ) -> Self {
        self.register(kind, adapter, ttl);
        self
    }

    pub fn coins(&self) -> &CoinConfig {
        &self.coins
    }

    /// Registered providers, in [`ProviderKind::ALL`] order.
    pub fn providers(&self) -> Vec<ProviderKind> {
        ProviderKind::ALL
            .into_iter()
            .filter(|kind| self.fetchers.contains_key(kind))
            .collect()
    }

    /// Fetch the snapshot for a provider name and currency.
    ///
    /// An empty currency means [`DEFAULT_CURRENCY`].
    pub async fn fetch(
        &self,
        provider: &str,
        currency: &str,
    ) -> Result<Arc<MarketSnapshot>, MarketDataError> {
        let kind: ProviderKind = provider.parse()?;
        self.fetch_kind(kind, currency).await
    }

    pub async fn fetch_kind(
        &self,
        kind: ProviderKind,
        currency: &str,
    ) -> Result<Arc<MarketSnapshot>, MarketDataError> {
        let fetcher = self
            .fetchers
            .get(&kind)
            .ok_or_else(|| MarketDataError::ProviderNotConfigured(kind.to_string()))?;

        let currency = match currency.trim() {
            "" => DEFAULT_CURRENCY,
            c => c,
        };

        if kind.is_currency_scoped() {
            return fetcher.get_all(&FetchRequest::for_currency(currency)).await;
        }

        let pairs = fetcher.get_all(&FetchRequest::unscoped()).await?;
        Ok(Arc::new(self.match_trading_pairs(&pairs, currency)))
    }

    /// Fetch and return records in coin config order; untracked symbols follow, sorted.
    pub async fn fetch_ordered(
        &self,
        provider: &str,
        currency: &str,
    ) -> Result<Vec<MarketRecord>, MarketDataError> {
        let snapshot = self.fetch(provider, currency).await?;
        let mut records: Vec<MarketRecord> = snapshot.values().cloned().collect();
        records.sort_by(|a, b| {
            match (self.coins.position(&a.symbol), self.coins.position(&b.symbol)) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => a.symbol.cmp(&b.symbol),
            }
        });
        Ok(records)
    }

    pub async fn status(&self) -> Vec<ProviderStatus> {
        let mut statuses = Vec::with_capacity(self.fetchers.len());
        for kind in self.providers() {
            if let Some(fetcher) = self.fetchers.get(&kind) {
                let cache = fetcher.status().await;
                statuses.push(ProviderStatus {
                    provider: kind,
                    id: cache.provider,
                    capabilities: cache.capabilities,
                    cache_ttl_secs: cache.ttl.as_secs(),
                    currency: cache.currency,
                    entries: cache.entries,
                    last_fetched_at: cache.last_fetched_at,
                });
            }
        }
        statuses
    }

    /// Look up each tracked coin's trading pair in a pair-keyed Binance snapshot.
    fn match_trading_pairs(&self, pairs: &MarketSnapshot, currency: &str) -> MarketSnapshot {
        let mut snapshot = MarketSnapshot::with_capacity(self.coins.len());
        for coin in self.coins.coins() {
            let pair = trading_pair(&coin.symbol, currency);
            let Some(ticker) = pairs.get(&pair) else {
                debug!("No Binance pair {} for {}", pair, coin.symbol);
                continue;
            };
            snapshot.insert(
                coin.symbol.clone(),
                MarketRecord::priced(coin.id.clone(), &coin.symbol, coin.name.clone(), ticker.price)
                    .with_image(coin.image.clone()),
            );
        }
        snapshot
    }
}
