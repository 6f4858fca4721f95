use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::errors::MarketDataError;

/// The closed set of providers a caller can ask for by name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Binance,
    Gecko,
    CryptoCompare,
    CoinMarketCap,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 4] = [
        ProviderKind::Binance,
        ProviderKind::Gecko,
        ProviderKind::CryptoCompare,
        ProviderKind::CoinMarketCap,
    ];

    /// The request-facing name, e.g. `gecko`.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Binance => "binance",
            ProviderKind::Gecko => "gecko",
            ProviderKind::CryptoCompare => "cryptocompare",
            ProviderKind::CoinMarketCap => "coinmarketcap",
        }
    }

    /// Whether snapshots from this provider depend on the quote currency.
    pub const fn is_currency_scoped(&self) -> bool {
        !matches!(self, ProviderKind::Binance)
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = MarketDataError;

    /// Case-insensitive; `coingecko` is accepted for `gecko`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "binance" => Ok(ProviderKind::Binance),
            "gecko" | "coingecko" => Ok(ProviderKind::Gecko),
            "cryptocompare" => Ok(ProviderKind::CryptoCompare),
            "coinmarketcap" => Ok(ProviderKind::CoinMarketCap),
            _ => Err(MarketDataError::UnknownProvider(s.to_string())),
        }
    }
}
