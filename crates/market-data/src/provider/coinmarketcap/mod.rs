//! CoinMarketCap `cryptocurrency/listings/latest` provider.
//!
//! Results are wrapped in `{ "data": [...] }`, ordered by rank, with one
//! quote block per requested `convert` currency. A successful response with
//! an empty `data` array is reported as [`MarketDataError::NoDataReturned`].

use std::collections::HashMap;
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

const PROVIDER_ID: &str = "COINMARKETCAP";

/// Listing size when the configuration does not set `limit`.
const DEFAULT_LIMIT: &str = "100";

#[derive(Debug, Deserialize)]
struct ListingResponse {
    data: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct Listing {
    id: Option<u64>,
    name: Option<String>,
    symbol: Option<String>,
    #[serde(default)]
    quote: HashMap<String, ListingQuote>,
}

#[derive(Debug, Deserialize)]
struct ListingQuote {
    price: Option<f64>,
    volume_24h: Option<f64>,
    market_cap: Option<f64>,
}

/// Parse a listings body, keeping tracked coins quoted in `currency`.
///
/// CoinMarketCap serves no icon URLs here, so images come from the coin config.
pub fn parse_listings(
    body: &str,
    coins: &CoinConfig,
    currency: &str,
) -> Result<MarketSnapshot, MarketDataError> {
    let response: ListingResponse = serde_json::from_str(body)
        .map_err(|e| MarketDataError::malformed(PROVIDER_ID, e.to_string()))?;

    let listings = response
        .data
        .ok_or_else(|| MarketDataError::malformed(PROVIDER_ID, "missing data section"))?;

    if listings.is_empty() {
        return Err(MarketDataError::NoDataReturned {
            provider: PROVIDER_ID.to_string(),
        });
    }

    let currency = currency.to_uppercase();
    let mut builder = SnapshotBuilder::new(PROVIDER_ID);

    for (index, entry) in listings.into_iter().enumerate() {
        let Some(listing) = builder.decode::<Listing>(index, entry) else {
            continue;
        };
        let Some(symbol) = listing.symbol else {
            builder.skip_malformed(&format!("#{}", index), "missing symbol");
            continue;
        };
        let Some(coin) = coins.find_by_symbol(&symbol) else {
            continue;
        };
        let Some(quote) = listing.quote.get(&currency) else {
            continue;
        };
        let price = match valid_price(quote.price.unwrap_or(0.0)) {
            Some(price) => price,
            None => {
                builder.skip_malformed(&symbol, "negative price");
                continue;
            }
        };

        let id = listing.id.map(|id| id.to_string()).unwrap_or_else(|| coin.id.clone());
        let name = listing.name.unwrap_or_else(|| coin.name.clone());
        builder.push(
            MarketRecord::priced(id, &symbol, name, price)
                .with_market_cap(quote.market_cap)
                .with_volume(quote.volume_24h)
                .with_image(coin.image.clone()),
        );
    }
    builder.finish()
}

/// CoinMarketCap market data provider. Requires an API key.
pub struct CoinMarketCapProvider {
    http: ProviderHttp,
    coins: Arc<CoinConfig>,
}

impl CoinMarketCapProvider {
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
impl ProviderAdapter for CoinMarketCapProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            supports_market_cap: true,
            supports_volume: true,
            supports_sparkline: false,
            requires_api_key: true,
        }
    }

    async fn fetch_market_data(
        &self,
        request: &FetchRequest,
    ) -> Result<MarketSnapshot, MarketDataError> {
        let query = self.http.build_query(
            &[
                ("convert", request.currency_upper()),
                ("limit", DEFAULT_LIMIT.to_string()),
            ],
            request,
        );

        let mut headers = Vec::new();
        if let Some(key) = self.http.api_key() {
            headers.push(("X-CMC_PRO_API_KEY", key.to_string()));
        }

        let body = self.http.get_text(&query, &headers).await?;
        let snapshot = parse_listings(&body, &self.coins, &request.currency)?;

        debug!(
            "CoinMarketCap: kept {} tracked listings in {}",
            snapshot.len(),
            request.currency
        );
        Ok(snapshot)
    }
}
