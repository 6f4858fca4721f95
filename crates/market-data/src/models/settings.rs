use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Default upstream request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default cache time-to-live.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 60;

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_cache_ttl_secs() -> u64 {
    DEFAULT_CACHE_TTL_SECS
}

/// Connection settings for a single provider, injected into its adapter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSettings {
    /// Scheme and host, e.g. `https://api.binance.com`
    #[serde(alias = "BaseURL", alias = "base_url")]
    pub base_url: String,

    /// Path of the market endpoint, e.g. `/api/v3/ticker/price`
    #[serde(alias = "market_url")]
    pub market_url: String,

    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    #[serde(default = "default_timeout_secs", alias = "timeout_seconds")]
    pub timeout_secs: u64,

    #[serde(default = "default_cache_ttl_secs", alias = "cache_ttl_seconds")]
    pub cache_ttl_secs: u64,

    /// Extra static query parameters appended to every request.
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

impl ProviderSettings {
    pub fn new(base_url: impl Into<String>, market_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            market_url: market_url.into(),
            api_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            params: BTreeMap::new(),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl_secs = ttl.as_secs();
        self
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, self.market_url)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

/// Per-provider connection settings. A missing entry leaves that provider unregistered.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ApiConfig {
    #[serde(default, alias = "Binance")]
    pub binance: Option<ProviderSettings>,

    #[serde(default, alias = "CoinGecko", alias = "gecko")]
    pub coingecko: Option<ProviderSettings>,

    #[serde(default, alias = "CryptoCompare")]
    pub cryptocompare: Option<ProviderSettings>,

    #[serde(default, alias = "CoinMarketCap")]
    pub coinmarketcap: Option<ProviderSettings>,
}

impl ApiConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let entries = [
            ("binance", &self.binance),
            ("coingecko", &self.coingecko),
            ("cryptocompare", &self.cryptocompare),
            ("coinmarketcap", &self.coinmarketcap),
        ];
        for (name, settings) in entries {
            if let Some(settings) = settings {
                if settings.base_url.is_empty() {
                    return Err(ConfigError::Invalid(format!("{} has an empty baseUrl", name)));
                }
                if settings.timeout_secs == 0 {
                    return Err(ConfigError::Invalid(format!(
                        "{} timeout must be greater than zero",
                        name
                    )));
                }
            }
        }
        Ok(())
    }
}
