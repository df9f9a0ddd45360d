// src/api.rs
//! HTTP surface: quote/news proxy routes plus the tracker API.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::news::newsdata::NewsDataClient;
use crate::tracker::Tracker;
use crate::types::AssetType;
use crate::upstream::YahooChartClient;
use crate::watchlist::WatchlistError;

#[derive(Clone)]
pub struct AppState {
    pub tracker: Arc<Tracker>,
    pub upstream: YahooChartClient,
    pub newsdata: NewsDataClient,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/quote", get(quote_proxy))
        .route("/news", get(news_proxy))
        .route("/api/assets", get(assets))
        .route("/api/refresh", post(refresh))
        .route("/api/watchlist", get(watchlist).post(add_asset))
        .route("/api/watchlist/{symbol}", delete(remove_asset))
        .route("/api/news", get(news_state))
        .route("/api/news/{symbol}", post(select_news))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// `{ "error": message }` with a status code.
#[derive(Debug)]
pub struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, Json(json!({ "error": self.1 }))).into_response()
    }
}

impl From<WatchlistError> for ApiError {
    fn from(e: WatchlistError) -> Self {
        let status = match e {
            WatchlistError::DuplicateAsset(_) | WatchlistError::WatchlistEmpty => {
                StatusCode::CONFLICT
            }
            WatchlistError::EmptySymbol => StatusCode::BAD_REQUEST,
            WatchlistError::NotFound(_) => StatusCode::NOT_FOUND,
        };
        ApiError(status, e.to_string())
    }
}

/// Plain ticker: at least one alphanumeric plus `.-=^`, so `..` never reaches the URL path.
fn is_ticker(s: &str) -> bool {
    s.len() <= 32
        && s.chars().any(|c| c.is_ascii_alphanumeric())
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '=' | '^'))
}

async fn quote_proxy(
    State(state): State<AppState>,
    Query(q): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let symbol = q.get("symbol").map(|s| s.trim()).unwrap_or_default();
    if symbol.is_empty() {
        return Err(ApiError(StatusCode::BAD_REQUEST, "Symbol is required".into()));
    }
    if !is_ticker(symbol) {
        return Err(ApiError(StatusCode::BAD_REQUEST, "Invalid symbol".into()));
    }

    match state.upstream.chart(symbol).await {
        Ok(body) => {
            let mut resp = Json(body).into_response();
            let h = resp.headers_mut();
            h.insert(
                header::ACCESS_CONTROL_ALLOW_ORIGIN,
                HeaderValue::from_static("*"),
            );
            h.insert(
                header::CACHE_CONTROL,
                HeaderValue::from_static("s-maxage=30, stale-while-revalidate"),
            );
            Ok(resp)
        }
        Err(e) => {
            let detail = format!("{e:#}");
            tracing::error!(target: "api", %symbol, error = %detail, "quote proxy failed");
            Err(ApiError(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

async fn news_proxy(
    State(state): State<AppState>,
    Query(q): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let query = q.get("query").map(|s| s.trim()).unwrap_or_default();
    if query.is_empty() {
        return Err(ApiError(StatusCode::BAD_REQUEST, "Query is required".into()));
    }

    match state.newsdata.search(query).await {
        Ok(articles) => {
            let mut resp = Json(articles).into_response();
            resp.headers_mut().insert(
                header::ACCESS_CONTROL_ALLOW_ORIGIN,
                HeaderValue::from_static("*"),
            );
            Ok(resp)
        }
        Err(e) => {
            let detail = format!("{e:#}");
            tracing::error!(target: "api", error = %detail, "news fetch error");
            Err(ApiError(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

async fn assets(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.tracker.prices())
}

#[derive(Deserialize, Default)]
struct WaitQuery {
    #[serde(default)]
    wait: bool,
}

async fn refresh(State(state): State<AppState>, Query(q): Query<WaitQuery>) -> Response {
    if q.wait || !state.tracker.refresh_now() {
        state.tracker.run_cycle_now().await;
        return (StatusCode::OK, Json(state.tracker.prices())).into_response();
    }
    (StatusCode::ACCEPTED, Json(json!({ "queued": true }))).into_response()
}

async fn watchlist(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.tracker.watchlist())
}

#[derive(Deserialize)]
struct AddReq {
    symbol: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "type", default)]
    kind: AssetType,
}

async fn add_asset(
    State(state): State<AppState>,
    Json(body): Json<AddReq>,
) -> Result<impl IntoResponse, ApiError> {
    let entry = state
        .tracker
        .add_asset(&body.symbol, body.name.as_deref(), body.kind)?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn remove_asset(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let symbol = symbol.trim().to_ascii_uppercase();
    let removed = state.tracker.remove_asset(&symbol)?;
    Ok(Json(removed))
}

async fn news_state(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.tracker.news_state())
}

async fn select_news(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(q): Query<WaitQuery>,
) -> Result<Response, ApiError> {
    let symbol = symbol.trim().to_ascii_uppercase();
    let ticket = state.tracker.begin_news(&symbol)?;

    if q.wait {
        state.tracker.complete_news(ticket).await;
        return Ok(Json(state.tracker.news_state()).into_response());
    }

    let tracker = state.tracker.clone();
    tokio::spawn(async move {
        tracker.complete_news(ticket).await;
    });
    Ok((StatusCode::ACCEPTED, Json(state.tracker.news_state())).into_response())
}
