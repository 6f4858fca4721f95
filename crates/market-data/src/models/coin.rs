use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// A tracked coin as listed in the coin config.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    /// CoinGecko-style identifier (e.g. "bitcoin")
    pub id: String,
    /// Ticker, upper-cased on load
    pub symbol: String,
    pub name: String,
    #[serde(rename = "img_url", alias = "image", default)]
    pub image: String,
}

#[derive(Debug, Deserialize)]
struct CoinConfigFile {
    coins: Vec<Coin>,
}

/// Static, ordered list of tracked coins. Read-only after load.
#[derive(Clone, Debug, Default)]
pub struct CoinConfig {
    coins: Vec<Coin>,
    by_symbol: HashMap<String, usize>,
}

impl CoinConfig {
    /// Build a config from coins, upper-casing symbols.
    ///
    /// Duplicate symbols are rejected since symbols key every snapshot.
    pub fn new(coins: Vec<Coin>) -> Result<Self, ConfigError> {
        let mut by_symbol = HashMap::with_capacity(coins.len());
        let coins: Vec<Coin> = coins
            .into_iter()
            .map(|mut coin| {
                coin.symbol = coin.symbol.trim().to_uppercase();
                coin
            })
            .collect();

        for (index, coin) in coins.iter().enumerate() {
            if coin.symbol.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "coin '{}' has an empty symbol",
                    coin.id
                )));
            }
            if by_symbol.insert(coin.symbol.clone(), index).is_some() {
                return Err(ConfigError::Invalid(format!(
                    "duplicate coin symbol '{}'",
                    coin.symbol
                )));
            }
        }

        Ok(Self { coins, by_symbol })
    }

    /// Load the coin list from a JSON file of the form `{ "coins": [...] }`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&data).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.display().to_string(),
                source,
            },
            other => other,
        })
    }

    pub fn from_json(data: &str) -> Result<Self, ConfigError> {
        let file: CoinConfigFile =
            serde_json::from_str(data).map_err(|source| ConfigError::Parse {
                path: "<inline>".to_string(),
                source,
            })?;
        Self::new(file.coins)
    }

    pub fn coins(&self) -> &[Coin] {
        &self.coins
    }

    pub fn len(&self) -> usize {
        self.coins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coins.is_empty()
    }

    /// Look up a coin by symbol, case-insensitively.
    pub fn find_by_symbol(&self, symbol: &str) -> Option<&Coin> {
        self.by_symbol
            .get(&symbol.to_uppercase())
            .map(|&index| &self.coins[index])
    }

    /// Position of a symbol in config order, used to order output.
    pub fn position(&self, symbol: &str) -> Option<usize> {
        self.by_symbol.get(&symbol.to_uppercase()).copied()
    }

    /// Configured icon URL for a symbol, if any.
    pub fn image_for(&self, symbol: &str) -> Option<&str> {
        self.find_by_symbol(symbol)
            .map(|coin| coin.image.as_str())
            .filter(|image| !image.is_empty())
    }

    /// Comma-joined coin ids (CoinGecko `ids=`).
    pub fn joined_ids(&self) -> String {
        self.coins
            .iter()
            .map(|coin| coin.id.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Comma-joined symbols (CryptoCompare `fsyms=`).
    pub fn joined_symbols(&self) -> String {
        self.coins
            .iter()
            .map(|coin| coin.symbol.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }
}
