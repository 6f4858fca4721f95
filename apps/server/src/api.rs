use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, HeaderValue, Method},
    routing::get,
    Json, Router,
};
use coinfeed_market_data::{MarketRecord, ProviderStatus, DEFAULT_CURRENCY};
use serde::Deserialize;
use tower_http::{
    cors::{Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::{config::Config, error::ApiResult, main_lib::AppState};

const DEFAULT_PROVIDER: &str = "gecko";

pub async fn healthz() -> &'static str {
    "ok"
}

#[derive(Debug, Deserialize)]
struct PriceQuery {
    provider: Option<String>,
    currency: Option<String>,
}

/// Missing or blank parameters fall back to the defaults.
fn param_or<'a>(value: &'a Option<String>, default: &'a str) -> &'a str {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
}

async fn get_price(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PriceQuery>,
) -> ApiResult<Json<Vec<MarketRecord>>> {
    let provider = param_or(&query.provider, DEFAULT_PROVIDER);
    let currency = param_or(&query.currency, DEFAULT_CURRENCY);
    let records = state.dispatcher.fetch_ordered(provider, currency).await?;
    Ok(Json(records))
}

async fn list_providers(State(state): State<Arc<AppState>>) -> Json<Vec<ProviderStatus>> {
    Json(state.dispatcher.status().await)
}

pub fn app_router(state: Arc<AppState>, config: &Config) -> Router {
    let cors = if config.cors_allow.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins = config
            .cors_allow
            .iter()
            .filter_map(|o| o.parse::<HeaderValue>().ok())
            .collect::<Vec<_>>();
        CorsLayer::new().allow_origin(origins)
    };
    let cors = cors
        .allow_methods([Method::GET])
        .allow_headers([header::CONTENT_TYPE]);
    // CorsLayer only sends these on preflight; browsers expect them on GET too.
    let allow_methods = SetResponseHeaderLayer::if_not_present(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET"),
    );
    let allow_headers = SetResponseHeaderLayer::if_not_present(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("content-type"),
    );

    let api = Router::new()
        .route("/healthz", get(healthz))
        .route("/providers", get(list_providers));

    Router::new()
        .route("/price", get(get_price))
        .nest("/api/v1", api)
        .with_state(state)
        .layer(cors)
        .layer(allow_methods)
        .layer(allow_headers)
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(TraceLayer::new_for_http())
}
