use std::{net::SocketAddr, path::PathBuf, time::Duration};

use anyhow::Context;

pub struct Config {
    pub listen_addr: SocketAddr,
    pub coin_config_path: PathBuf,
    pub api_config_path: PathBuf,
    pub cors_allow: Vec<String>,
    pub request_timeout: Duration,
    pub cryptocompare_api_key: Option<String>,
    pub coinmarketcap_api_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            coin_config_path: PathBuf::from("config/coin.json"),
            api_config_path: PathBuf::from("config/api.json"),
            cors_allow: vec!["*".to_string()],
            request_timeout: Duration::from_millis(30000),
            cryptocompare_api_key: None,
            coinmarketcap_api_key: None,
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let listen_addr = match non_empty_var("COINFEED_LISTEN_ADDR") {
            Some(addr) => addr
                .parse()
                .with_context(|| format!("Invalid COINFEED_LISTEN_ADDR '{}'", addr))?,
            None => defaults.listen_addr,
        };
        let coin_config_path = non_empty_var("COINFEED_COIN_CONFIG")
            .map(PathBuf::from)
            .unwrap_or(defaults.coin_config_path);
        let api_config_path = non_empty_var("COINFEED_API_CONFIG")
            .map(PathBuf::from)
            .unwrap_or(defaults.api_config_path);
        let cors_allow = std::env::var("COINFEED_CORS_ALLOW_ORIGINS")
            .unwrap_or_else(|_| "*".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let timeout_ms: u64 = std::env::var("COINFEED_REQUEST_TIMEOUT_MS")
            .unwrap_or_else(|_| "30000".into())
            .parse()
            .unwrap_or(30000);

        Ok(Self {
            listen_addr,
            coin_config_path,
            api_config_path,
            cors_allow,
            request_timeout: Duration::from_millis(timeout_ms),
            cryptocompare_api_key: non_empty_var("COINFEED_CRYPTOCOMPARE_API_KEY"),
            coinmarketcap_api_key: non_empty_var("COINFEED_COINMARKETCAP_API_KEY"),
        })
    }
}
