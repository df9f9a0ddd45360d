// tests/quote_client.rs
//
// ProxyQuoteClient against a loopback quote proxy, including the full
// "proxy down -> demo" path through the aggregator.

use axum::{extract::Query, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;
use std::collections::HashMap;

use market_tracker::aggregator::refresh_prices;
use market_tracker::quotes::{ProxyQuoteClient, QuoteError, QuoteSource};
use market_tracker::types::{AssetType, DataSource, WatchlistEntry};

async fn spawn_proxy(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind loopback");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve proxy");
    });
    format!("http://{addr}")
}

/// AAPL has a full chart, ZERO reports a zero previous close, anything else 500s.
async fn fake_quote(Query(q): Query<HashMap<String, String>>) -> impl IntoResponse {
    match q.get("symbol").map(String::as_str) {
        Some("AAPL") => Json(json!({
            "chart": { "result": [ { "meta": {
                "regularMarketPrice": 230.0,
                "chartPreviousClose": 200.0,
                "regularMarketVolume": 42_000_000u64,
                "currency": "USD"
            } } ] }
        }))
        .into_response(),
        Some("ZERO") => Json(json!({
            "chart": { "result": [ { "meta": {
                "regularMarketPrice": 10.0,
                "chartPreviousClose": 0
            } } ] }
        }))
        .into_response(),
        Some("EMPTY") => Json(json!({ "chart": { "result": [] } })).into_response(),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
    }
}

#[tokio::test]
async fn parses_live_quote_from_proxy() {
    let base = spawn_proxy(Router::new().route("/quote", get(fake_quote))).await;
    let client = ProxyQuoteClient::new(&base, 5).unwrap();

    let q = client.fetch_quote("AAPL").await.unwrap();
    assert_eq!(q.price, 230.0);
    assert_eq!(q.change, 30.0);
    assert_eq!(q.change_percent, 15.0);
    assert_eq!(q.volume, Some(42_000_000));
    assert_eq!(q.currency, "USD");
}

#[tokio::test]
async fn maps_each_failure_to_its_kind() {
    let base = spawn_proxy(Router::new().route("/quote", get(fake_quote))).await;
    let client = ProxyQuoteClient::new(&base, 5).unwrap();

    assert_eq!(
        client.fetch_quote("TSLA").await,
        Err(QuoteError::HttpStatus(500))
    );
    assert_eq!(
        client.fetch_quote("ZERO").await,
        Err(QuoteError::MissingPriceData)
    );
    assert!(matches!(
        client.fetch_quote("EMPTY").await,
        Err(QuoteError::InvalidShape(_))
    ));
}

#[tokio::test]
async fn unreachable_proxy_is_a_transport_error_and_yields_demo() {
    let client = ProxyQuoteClient::new("http://127.0.0.1:9", 2).unwrap();
    assert!(matches!(
        client.fetch_quote("AAPL").await,
        Err(QuoteError::Transport(_))
    ));

    let wl = vec![WatchlistEntry::new("AAPL", "Apple Inc.", AssetType::Stock)];
    let batch = refresh_prices(&client, &wl).await;
    assert_eq!(batch.source, DataSource::Demo);
    assert_eq!(batch.assets[0].price, 225.50);
}

#[tokio::test]
async fn mixed_proxy_answers_keep_live_subset() {
    let base = spawn_proxy(Router::new().route("/quote", get(fake_quote))).await;
    let client = ProxyQuoteClient::new(&base, 5).unwrap();
    let wl = vec![
        WatchlistEntry::new("AAPL", "Apple Inc.", AssetType::Stock),
        WatchlistEntry::new("TSLA", "Tesla Inc.", AssetType::Stock),
    ];

    let batch = refresh_prices(&client, &wl).await;
    assert_eq!(batch.source, DataSource::Live);
    assert_eq!(batch.assets.len(), 1);
    assert_eq!(batch.assets[0].symbol(), "AAPL");
    assert_eq!(batch.assets[0].name(), "Apple Inc.");
    assert_eq!(batch.failed, vec!["TSLA".to_string()]);
}
