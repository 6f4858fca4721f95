//! CoinGecko `coins/markets` provider.
//!
//! The only provider returning a native 7-day sparkline. Coins are
//! requested by their lower-case CoinGecko ids.
//!
//! API documentation: https://docs.coingecko.com/reference/coins-markets

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::errors::MarketDataError;
use crate::models::{valid_price, CoinConfig, MarketRecord, MarketSnapshot, ProviderSettings};
use crate::provider::http::ProviderHttp;
use crate::provider::parse::SnapshotBuilder;
use crate::provider::{FetchRequest, ProviderAdapter, ProviderCapabilities};

const PROVIDER_ID: &str = "COINGECKO";

// ============================================================================
// API Response Structures
// ============================================================================

/// Element of the `coins/markets` array
#[derive(Debug, Deserialize)]
struct MarketEntry {
    id: Option<String>,
    symbol: Option<String>,
    name: Option<String>,
    image: Option<String>,
    current_price: Option<f64>,
    market_cap: Option<f64>,
    total_volume: Option<f64>,
    sparkline_in_7d: Option<SparklineEntry>,
}

#[derive(Debug, Deserialize)]
struct SparklineEntry {
    #[serde(default)]
    price: Vec<Option<f64>>,
}

// ============================================================================
// Parsing
// ============================================================================

/// Parse a `coins/markets` body.
///
/// Missing numeric fields become zero; icons missing from the payload are
/// backfilled from the coin config.
pub fn parse_markets(body: &str, coins: &CoinConfig) -> Result<MarketSnapshot, MarketDataError> {
    let entries: Vec<Value> = serde_json::from_str(body)
        .map_err(|e| MarketDataError::malformed(PROVIDER_ID, e.to_string()))?;

    let mut builder = SnapshotBuilder::new(PROVIDER_ID);
    for (index, entry) in entries.into_iter().enumerate() {
        let Some(entry) = builder.decode::<MarketEntry>(index, entry) else {
            continue;
        };
        let id = entry.id.unwrap_or_default();
        let symbol = match entry.symbol.filter(|s| !s.trim().is_empty()) {
            Some(symbol) => symbol,
            None => {
                builder.skip_malformed(&id, "missing symbol");
                continue;
            }
        };
        let price = match valid_price(entry.current_price.unwrap_or(0.0)) {
            Some(price) => price,
            None => {
                builder.skip_malformed(&symbol, "negative price");
                continue;
            }
        };

        let image = entry
            .image
            .filter(|image| !image.is_empty())
            .or_else(|| coins.image_for(&symbol).map(str::to_string))
            .unwrap_or_default();

        let sparkline = entry
            .sparkline_in_7d
            .map(|s| s.price.into_iter().flatten().collect())
            .unwrap_or_default();

        builder.push(
            MarketRecord::priced(id, &symbol, entry.name.unwrap_or_default(), price)
                .with_market_cap(entry.market_cap)
                .with_volume(entry.total_volume)
                .with_image(image)
                .with_sparkline(sparkline),
        );
    }
    builder.finish()
}

// ============================================================================
// CoinGeckoProvider
// ============================================================================

/// CoinGecko market data provider. No API key required.
pub struct CoinGeckoProvider {
    http: ProviderHttp,
    coins: Arc<CoinConfig>,
}

impl CoinGeckoProvider {
    pub fn new(
        settings: ProviderSettings,
        coins: Arc<CoinConfig>,
    ) -> Result<Self, MarketDataError> {
        Ok(Self {
            http: ProviderHttp::new(PROVIDER_ID, settings)?,
            coins,
        })
    }
}

#[async_trait]
impl ProviderAdapter for CoinGeckoProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            supports_market_cap: true,
            supports_volume: true,
            supports_sparkline: true,
            requires_api_key: false,
        }
    }

    async fn fetch_market_data(
        &self,
        request: &FetchRequest,
    ) -> Result<MarketSnapshot, MarketDataError> {
        let query = self.http.build_query(
            &[
                ("vs_currency", request.currency.clone()),
                ("ids", self.coins.joined_ids()),
                ("order", "market_cap_desc".to_string()),
                ("sparkline", "true".to_string()),
            ],
            request,
        );

        let body = self.http.get_text(&query, &[]).await?;
        let snapshot = parse_markets(&body, &self.coins)?;

        debug!(
            "CoinGecko: fetched {} markets in {}",
            snapshot.len(),
            request.currency
        );
        Ok(snapshot)
    }
}

// ============================================================================
// Tests
// ============================================================================
