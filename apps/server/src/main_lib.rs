use std::sync::Arc;

use anyhow::Context;
use coinfeed_market_data::{ApiConfig, CoinConfig, MarketDispatcher};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Config;

pub struct AppState {
    pub dispatcher: Arc<MarketDispatcher>,
}

impl AppState {
    pub fn new(dispatcher: MarketDispatcher) -> Arc<Self> {
        Arc::new(Self {
            dispatcher: Arc::new(dispatcher),
        })
    }
}

/// Install the global subscriber. `log` records from the core crate are
/// forwarded through tracing-subscriber's log bridge.
pub fn init_tracing() {
    let log_format = std::env::var("COINFEED_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

/// Keys from the environment win over keys in the API config.
fn apply_key_overrides(api: &mut ApiConfig, config: &Config) {
    if let (Some(settings), Some(key)) = (
        api.cryptocompare.as_mut(),
        config.cryptocompare_api_key.as_ref(),
    ) {
        settings.api_key = Some(key.clone());
    }
    if let (Some(settings), Some(key)) = (
        api.coinmarketcap.as_mut(),
        config.coinmarketcap_api_key.as_ref(),
    ) {
        settings.api_key = Some(key.clone());
    }
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let coins = CoinConfig::load(&config.coin_config_path).with_context(|| {
        format!(
            "Failed to load coin config from {}",
            config.coin_config_path.display()
        )
    })?;
    tracing::info!(
        "Tracking {} coins from {}",
        coins.len(),
        config.coin_config_path.display()
    );

    let mut api = ApiConfig::load(&config.api_config_path).with_context(|| {
        format!(
            "Failed to load API config from {}",
            config.api_config_path.display()
        )
    })?;
    apply_key_overrides(&mut api, config);

    let dispatcher = MarketDispatcher::from_config(Arc::new(coins), &api)?;
    if dispatcher.providers().is_empty() {
        tracing::warn!("No providers configured; every price request will fail");
    }
    Ok(AppState::new(dispatcher))
}
