//! CryptoCompare `pricemultifull` provider.
//!
//! The response nests four levels deep: `RAW.<SYMBOL>.<CURRENCY>.<FIELD>`.
//! A symbol or currency missing from that nesting is a per-coin skip; a
//! body without `RAW` at all is malformed. CryptoCompare reports its own
//! errors with HTTP 200 and a `{"Response": "Error", "Message": ...}` body.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::debug;

use crate::errors::MarketDataError;
use crate::models::{valid_price, CoinConfig, MarketRecord, MarketSnapshot, ProviderSettings};
use crate::provider::http::ProviderHttp;
use crate::provider::parse::SnapshotBuilder;
use crate::provider::{FetchRequest, ProviderAdapter, ProviderCapabilities};

const PROVIDER_ID: &str = "CRYPTOCOMPARE";

/// Host that `IMAGEURL` paths are relative to.
const IMAGE_HOST: &str = "https://www.cryptocompare.com";

/// Read a numeric field that may be encoded as a number or a string.
fn number_field(fields: &Map<String, Value>, key: &str) -> Option<f64> {
    match fields.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Parse a `pricemultifull` body for the tracked coins in `currency`.
pub fn parse_price_multi_full(
    body: &str,
    coins: &CoinConfig,
    currency: &str,
) -> Result<MarketSnapshot, MarketDataError> {
    let root: Value = serde_json::from_str(body)
        .map_err(|e| MarketDataError::malformed(PROVIDER_ID, e.to_string()))?;

    let raw = match root.get("RAW").and_then(Value::as_object) {
        Some(raw) => raw,
        None => {
            let message = root
                .get("Message")
                .and_then(Value::as_str)
                .unwrap_or("missing RAW section");
            return Err(MarketDataError::malformed(PROVIDER_ID, message));
        }
    };

    let currency = currency.to_uppercase();
    let mut builder = SnapshotBuilder::new(PROVIDER_ID);

    for coin in coins.coins() {
        let Some(fields) = raw
            .get(&coin.symbol)
            .and_then(|by_currency| by_currency.get(&currency))
            .and_then(Value::as_object)
        else {
            continue;
        };

        let price = match number_field(fields, "PRICE").and_then(valid_price) {
            Some(price) => price,
            None => {
                builder.skip_malformed(&coin.symbol, "unparseable PRICE");
                continue;
            }
        };

        let image = fields
            .get("IMAGEURL")
            .and_then(Value::as_str)
            .filter(|path| !path.is_empty())
            .map(|path| format!("{}{}", IMAGE_HOST, path))
            .unwrap_or_else(|| coin.image.clone());

        builder.push(
            MarketRecord::priced(coin.id.clone(), &coin.symbol, coin.name.clone(), price)
                .with_market_cap(number_field(fields, "MKTCAP"))
                .with_volume(number_field(fields, "TOTALVOLUME24HTO"))
                .with_image(image),
        );
    }
    builder.finish()
}

/// CryptoCompare market data provider. Requires an API key.
pub struct CryptoCompareProvider {
    http: ProviderHttp,
    coins: Arc<CoinConfig>,
}

impl CryptoCompareProvider {
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
impl ProviderAdapter for CryptoCompareProvider {
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
                ("fsyms", self.coins.joined_symbols()),
                ("tsyms", request.currency_upper()),
            ],
            request,
        );

        let mut headers = Vec::new();
        if let Some(key) = self.http.api_key() {
            headers.push(("Authorization", format!("Apikey {}", key)));
        }

        let body = self.http.get_text(&query, &headers).await?;
        let snapshot = parse_price_multi_full(&body, &self.coins, &request.currency)?;

        debug!(
            "CryptoCompare: fetched {} prices in {}",
            snapshot.len(),
            request.currency
        );
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::http::test_server::serve_once;
    use crate::models::Coin;

    fn coins() -> CoinConfig {
        CoinConfig::new(vec![
            Coin {
                id: "bitcoin".to_string(),
                symbol: "BTC".to_string(),
                name: "Bitcoin".to_string(),
                image: "/media/images/coins/btc.png".to_string(),
            },
            Coin {
                id: "ethereum".to_string(),
                symbol: "ETH".to_string(),
                name: "Ethereum".to_string(),
                image: "/media/images/coins/eth.png".to_string(),
            },
            Coin {
                id: "solana".to_string(),
                symbol: "SOL".to_string(),
                name: "Solana".to_string(),
                image: String::new(),
            },
        ])
        .unwrap()
    }

    #[test]
    fn test_parse_nested_raw() {
        let body = r#"{
            "RAW": {
                "BTC": {"USD": {"PRICE": 65000.5, "MKTCAP": 1.28e12, "TOTALVOLUME24HTO": 3.5e10, "IMAGEURL": "/media/37746251/btc.png"}},
                "ETH": {"USD": {"PRICE": "3200.25"}}
            },
            "DISPLAY": {}
        }"#;

        let snapshot = parse_price_multi_full(body, &coins(), "usd").unwrap();
        assert_eq!(snapshot.len(), 2);

        let btc = &snapshot["BTC"];
        assert_eq!(btc.id, "bitcoin");
        assert_eq!(btc.price, 65000.5);
        assert_eq!(btc.market_cap, 1.28e12);
        assert_eq!(btc.image, "https://www.cryptocompare.com/media/37746251/btc.png");

        let eth = &snapshot["ETH"];
        assert_eq!(eth.price, 3200.25);
        assert_eq!(eth.total_volume, 0.0);
        assert_eq!(eth.image, "/media/images/coins/eth.png");
    }

    #[test]
    fn test_missing_nesting_skips_coin() {
        let body = r#"{"RAW": {"BTC": {"EUR": {"PRICE": 60000}}, "ETH": {"USD": {"PRICE": 3200}}}}"#;
        let snapshot = parse_price_multi_full(body, &coins(), "usd").unwrap();
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.contains_key("ETH"));
    }

    #[test]
    fn test_missing_raw_is_malformed() {
        let body = r#"{"DISPLAY": {}}"#;
        let err = parse_price_multi_full(body, &coins(), "usd").unwrap_err();
        assert!(matches!(err, MarketDataError::MalformedResponse { .. }));
    }

    #[test]
    fn test_error_body_message_surfaces() {
        let body = r#"{"Response": "Error", "Message": "You are over your rate limit please upgrade your account!"}"#;
        let err = parse_price_multi_full(body, &coins(), "usd").unwrap_err();
        assert!(err.to_string().contains("rate limit"));
    }

    #[test]
    fn test_all_prices_malformed_fails() {
        let body = r#"{"RAW": {"BTC": {"USD": {"PRICE": "n/a"}}}}"#;
        let err = parse_price_multi_full(body, &coins(), "usd").unwrap_err();
        assert!(matches!(err, MarketDataError::MalformedResponse { .. }));
    }

    #[test]
    fn test_provider_requires_key() {
        let provider = CryptoCompareProvider::new(
            ProviderSettings::new("https://min-api.cryptocompare.com", "/data/pricemultifull"),
            Arc::new(coins()),
        )
        .unwrap();
        assert_eq!(provider.id(), "CRYPTOCOMPARE");
        assert!(provider.capabilities().requires_api_key);
    }

    #[tokio::test]
    async fn test_fetch_sends_key_and_symbols() {
        let server = serve_once(200, r#"{"RAW": {"BTC": {"EUR": {"PRICE": 60000.0}}}}"#).await;
        let provider = CryptoCompareProvider::new(
            ProviderSettings::new(&server.base_url, "/data/pricemultifull").with_api_key("secret"),
            Arc::new(coins()),
        )
        .unwrap();

        let snapshot = provider
            .fetch_market_data(&FetchRequest::for_currency("eur"))
            .await
            .unwrap();
        assert_eq!(snapshot["BTC"].price, 60000.0);

        let request = server.request().await;
        assert!(request.line.starts_with("GET /data/pricemultifull?"));
        assert_eq!(request.header("authorization"), Some("Apikey secret"));
        assert_eq!(request.query_param("fsyms").as_deref(), Some("BTC,ETH,SOL"));
        assert_eq!(request.query_param("tsyms").as_deref(), Some("EUR"));
    }

    #[tokio::test]
    async fn test_fetch_without_key_sends_no_auth_header() {
        let server = serve_once(200, r#"{"RAW": {"ETH": {"USD": {"PRICE": 3000.0}}}}"#).await;
        let provider = CryptoCompareProvider::new(
            ProviderSettings::new(&server.base_url, "/data/pricemultifull"),
            Arc::new(coins()),
        )
        .unwrap();

        provider
            .fetch_market_data(&FetchRequest::for_currency("usd"))
            .await
            .unwrap();
        assert!(server.request().await.header("authorization").is_none());
    }
}
