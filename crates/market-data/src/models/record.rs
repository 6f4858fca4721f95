use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Mapping of upper-cased symbol to its normalized record for one fetch.
pub type MarketSnapshot = HashMap<String, MarketRecord>;

/// 7-day price samples, serialized as `{ "price": [...] }`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Sparkline {
    #[serde(default)]
    pub price: Vec<f64>,
}

impl From<Vec<f64>> for Sparkline {
    fn from(price: Vec<f64>) -> Self {
        Self { price }
    }
}

/// One asset's market snapshot, normalized across providers.
///
/// The wire shape is the CoinGecko `coins/markets` shape so that clients
/// written against CoinGecko can consume any provider.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketRecord {
    /// Provider- or config-assigned identifier
    pub id: String,

    /// Upper-case ticker
    pub symbol: String,

    /// Display name
    pub name: String,

    /// Icon URL, empty when unknown
    #[serde(default)]
    pub image: String,

    /// Current price in the quote currency
    #[serde(rename = "current_price")]
    pub price: f64,

    #[serde(rename = "market_cap")]
    pub market_cap: f64,

    /// 24h volume
    #[serde(rename = "total_volume")]
    pub total_volume: f64,

    #[serde(rename = "sparkline_in_7d", default)]
    pub sparkline: Sparkline,
}

impl MarketRecord {
    /// Create a record with price only; market cap, volume and sparkline are zero-valued.
    pub fn priced(
        id: impl Into<String>,
        symbol: &str,
        name: impl Into<String>,
        price: f64,
    ) -> Self {
        Self {
            id: id.into(),
            symbol: symbol.to_uppercase(),
            name: name.into(),
            price: non_negative(Some(price)),
            ..Default::default()
        }
    }

    pub fn with_market_cap(mut self, market_cap: Option<f64>) -> Self {
        self.market_cap = non_negative(market_cap);
        self
    }

    pub fn with_volume(mut self, total_volume: Option<f64>) -> Self {
        self.total_volume = non_negative(total_volume);
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    pub fn with_sparkline(mut self, samples: Vec<f64>) -> Self {
        self.sparkline = Sparkline::from(samples);
        self
    }
}

/// Clamp an optional money/volume figure to a finite, non-negative float.
pub fn non_negative(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => v,
        _ => 0.0,
    }
}

/// Parse a usable price: finite and non-negative. Anything else is malformed.
pub fn valid_price(value: f64) -> Option<f64> {
    (value.is_finite() && value >= 0.0).then_some(value)
}

/// Insert a record keyed by its upper-cased symbol, keeping the first one seen.
///
/// Returns `false` when the symbol was already present.
pub fn insert_unique(snapshot: &mut MarketSnapshot, record: MarketRecord) -> bool {
    let key = record.symbol.to_uppercase();
    if snapshot.contains_key(&key) {
        return false;
    }
    snapshot.insert(key, record);
    true
}
