use std::io::Write;

use axum::{
    body::{to_bytes, Body},
    http::Request,
};
use coinfeed_server::{api::app_router, build_state, config::Config};
use tempfile::tempdir;
use tower::ServiceExt;

fn write_file(path: &std::path::Path, contents: &str) {
    let mut file = std::fs::File::create(path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
}

fn config_in(dir: &std::path::Path) -> Config {
    let coin_config_path = dir.join("coin.json");
    let api_config_path = dir.join("api.json");
    write_file(
        &coin_config_path,
        r#"{"coins": [
            {"id": "bitcoin", "symbol": "btc", "name": "Bitcoin", "img_url": "/media/images/coins/btc.png"},
            {"id": "ethereum", "symbol": "eth", "name": "Ethereum", "img_url": "/media/images/coins/eth.png"}
        ]}"#,
    );
    write_file(
        &api_config_path,
        r#"{
            "binance": {"baseUrl": "https://api.binance.com", "marketUrl": "/api/v3/ticker/price"},
            "CoinGecko": {"BaseURL": "https://api.coingecko.com", "marketUrl": "/api/v3/coins/markets", "cacheTtlSecs": 120}
        }"#,
    );

    Config {
        coin_config_path,
        api_config_path,
        ..Default::default()
    }
}

#[tokio::test]
async fn healthz_works() {
    let tmp = tempdir().unwrap();
    let config = config_in(tmp.path());
    let state = build_state(&config).await.unwrap();
    let app = app_router(state, &config);

    let response = app
        .oneshot(Request::builder().uri("/api/v1/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"ok");
}

#[tokio::test]
async fn configured_providers_are_listed() {
    let tmp = tempdir().unwrap();
    let config = config_in(tmp.path());
    let state = build_state(&config).await.unwrap();
    let app = app_router(state, &config);

    let response = app
        .oneshot(Request::builder().uri("/api/v1/providers").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let providers = json.as_array().unwrap();
    assert_eq!(providers.len(), 2);
    assert_eq!(providers[0]["provider"], "binance");
    assert_eq!(providers[0]["capabilities"]["supportsMarketCap"], false);
    assert_eq!(providers[1]["provider"], "gecko");
    assert_eq!(providers[1]["cacheTtlSecs"], 120);
    assert_eq!(providers[1]["entries"], 0);
}

#[tokio::test]
async fn missing_coin_config_fails_startup() {
    let tmp = tempdir().unwrap();
    let config = Config {
        coin_config_path: tmp.path().join("missing.json"),
        api_config_path: tmp.path().join("api.json"),
        ..Default::default()
    };
    let err = build_state(&config).await.err().unwrap();
    assert!(err.to_string().contains("coin config"));
}
