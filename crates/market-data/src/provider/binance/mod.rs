//! Binance spot ticker provider.
//!
//! Binance exposes the full price list for every trading pair in one call
//! (`/api/v3/ticker/price`), so the request carries no currency and the
//! snapshot is keyed by trading pair (e.g. `BTCUSDT`). Matching pairs to
//! tracked coins happens in the dispatcher, see [`trading_pair`].
//!
//! Prices arrive as strings. Volume and market cap are not part of this
//! endpoint and stay zero.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::errors::MarketDataError;
use crate::models::{valid_price, MarketRecord, MarketSnapshot, ProviderSettings};
use crate::provider::http::ProviderHttp;
use crate::provider::parse::SnapshotBuilder;
use crate::provider::{FetchRequest, ProviderAdapter, ProviderCapabilities};

const PROVIDER_ID: &str = "BINANCE";

/// Element of the `/ticker/price` array.
#[derive(Debug, Deserialize)]
struct TickerPrice {
    #[serde(default)]
    symbol: String,
    #[serde(default)]
    price: String,
}

/// Binance has no fiat USD books; USD prices come from the USDT pairs.
pub fn quote_asset(currency: &str) -> String {
    let currency = currency.trim().to_uppercase();
    if currency == "USD" {
        "USDT".to_string()
    } else {
        currency
    }
}

/// Trading-pair key for a coin symbol and quote currency, e.g. `BTC` + `usd` → `BTCUSDT`.
pub fn trading_pair(symbol: &str, currency: &str) -> String {
    format!("{}{}", symbol.to_uppercase(), quote_asset(currency))
}

/// Parse a `/ticker/price` body into a pair-keyed snapshot.
///
/// Each record's `symbol` and `id` is the trading pair.
pub fn parse_ticker_prices(body: &str) -> Result<MarketSnapshot, MarketDataError> {
    let entries: Vec<Value> = serde_json::from_str(body)
        .map_err(|e| MarketDataError::malformed(PROVIDER_ID, e.to_string()))?;

    let mut builder = SnapshotBuilder::new(PROVIDER_ID);
    for (index, entry) in entries.into_iter().enumerate() {
        let Some(ticker) = builder.decode::<TickerPrice>(index, entry) else {
            continue;
        };
        if ticker.symbol.is_empty() {
            builder.skip_malformed("<no symbol>", "missing symbol");
            continue;
        }
        let price = match ticker.price.trim().parse::<f64>().ok().and_then(valid_price) {
            Some(price) => price,
            None => {
                builder.skip_malformed(&ticker.symbol, &format!("bad price '{}'", ticker.price));
                continue;
            }
        };
        builder.push(MarketRecord::priced(
            ticker.symbol.clone(),
            &ticker.symbol,
            ticker.symbol.clone(),
            price,
        ));
    }
    builder.finish()
}

/// Binance spot price provider.
pub struct BinanceProvider {
    http: ProviderHttp,
}

impl BinanceProvider {
    pub fn new(settings: ProviderSettings) -> Result<Self, MarketDataError> {
        Ok(Self {
            http: ProviderHttp::new(PROVIDER_ID, settings)?,
        })
    }
}

#[async_trait]
impl ProviderAdapter for BinanceProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities::price_only()
    }

    async fn fetch_market_data(
        &self,
        request: &FetchRequest,
    ) -> Result<MarketSnapshot, MarketDataError> {
        let query = self.http.build_query(&[], request);
        let body = self.http.get_text(&query, &[]).await?;
        let snapshot = parse_ticker_prices(&body)?;

        debug!("Binance: fetched {} trading pairs", snapshot.len());
        Ok(snapshot)
    }
}
