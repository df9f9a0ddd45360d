// src/lib.rs
// Public library surface for integration tests and the binary entrypoint.

pub mod aggregator;
pub mod api;
pub mod board;
pub mod config;
pub mod demo;
pub mod metrics;
pub mod news;
pub mod quotes;
pub mod scheduler;
pub mod tracker;
pub mod types;
pub mod upstream;
pub mod watchlist;

pub use crate::api::router;
pub use crate::tracker::Tracker;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::Router;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::api::AppState;
use crate::config::TrackerConfig;
use crate::metrics::Metrics;
use crate::news::newsdata::NewsDataClient;
use crate::news::{ClaudeSearchBackend, DynSearchBackend, NewsRetriever, StaticSearchBackend};
use crate::quotes::ProxyQuoteClient;
use crate::upstream::YahooChartClient;
use crate::watchlist::WatchlistStore;

pub const ENV_LOG_FILTER: &str = "TRACKER_LOG";
pub const ENV_LOG_FORMAT: &str = "TRACKER_LOG_FORMAT";

/// Install a tracing subscriber unless the host already did.
/// `TRACKER_LOG` takes an `EnvFilter` directive; `TRACKER_LOG_FORMAT=json`
/// switches to JSON lines.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env(ENV_LOG_FILTER)
        .unwrap_or_else(|_| EnvFilter::new("market_tracker=info,warn"));

    let json = std::env::var(ENV_LOG_FORMAT)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let res = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .try_init()
    };
    if res.is_err() {
        // Shuttle (or a test harness) installed one already.
        tracing::debug!("tracing subscriber already set");
    }
}

fn build_search_backend(cfg: &TrackerConfig) -> Result<DynSearchBackend> {
    if !cfg.news.enabled {
        warn!(target: "news", "news search disabled in config; templated articles only");
        return Ok(Arc::new(StaticSearchBackend::unconfigured()));
    }
    match cfg.news.resolved_api_key() {
        Some(key) => {
            // Safe diagnostics: only model + key length
            info!(
                target: "news",
                model = %cfg.news.model,
                key_len = key.len(),
                "news search backend configured"
            );
            Ok(Arc::new(ClaudeSearchBackend::new(
                &cfg.news.endpoint,
                key,
                &cfg.news.model,
                cfg.news.max_tokens,
            )?))
        }
        None => {
            warn!(target: "news", "no search API key; templated articles only");
            Ok(Arc::new(StaticSearchBackend::unconfigured()))
        }
    }
}

/// Build the full application from an explicit config. Starts the refresh
/// scheduler, so it must run inside a Tokio runtime.
pub fn app_with_config(cfg: &TrackerConfig) -> Result<Router> {
    // Recorder first: the mount cycle fires as soon as the scheduler starts.
    let metrics = Metrics::init(cfg.refresh.interval_secs)?;

    let quotes = ProxyQuoteClient::new(&cfg.quotes.proxy_base_url, cfg.quotes.timeout_secs)?;
    let retriever = NewsRetriever::new(build_search_backend(cfg)?, cfg.news.article_count);
    let store = WatchlistStore::new(cfg.seed_entries());

    info!(
        quote_proxy = %quotes.base_url(),
        news_backend = retriever.backend_name(),
        watchlist = store.len(),
        refresh_secs = cfg.refresh.interval_secs,
        "building market tracker"
    );

    let mut tracker = Tracker::new(store, Arc::new(quotes), retriever);
    tracker.start_scheduler(Duration::from_secs(cfg.refresh.interval_secs));

    let state = AppState {
        tracker: Arc::new(tracker),
        upstream: YahooChartClient::new(&cfg.quotes.upstream_base_url, cfg.quotes.timeout_secs)?,
        newsdata: NewsDataClient::from_env(&cfg.newsdata.endpoint)?,
    };
    if !state.newsdata.is_configured() {
        warn!(target: "news", "NEWSDATA_API_KEY not set; /news will answer 500");
    }

    Ok(api::router(state).merge(metrics.router()))
}

/// Load configuration from disk/env and build the application router.
pub async fn app() -> Result<Router> {
    let cfg = TrackerConfig::load_default()?;
    app_with_config(&cfg)
}
