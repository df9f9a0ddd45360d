// src/aggregator.rs
//! Price aggregation: concurrent per-symbol fan-out with an all-or-nothing
//! demo fallback.

use std::time::Instant;

use futures::future::join_all;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use serde::Serialize;

use crate::demo::generate_demo;
use crate::quotes::{QuoteSource, RawQuote};
use crate::types::{Asset, DataSource, WatchlistEntry};

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("quotes_fetch_total", "Quote requests sent to the proxy.");
        describe_counter!(
            "quotes_fetch_errors_total",
            "Per-symbol quote failures, by error kind."
        );
        describe_counter!(
            "price_cycles_total",
            "Completed refresh cycles, by resulting data source."
        );
        describe_histogram!("price_cycle_ms", "Refresh cycle duration in milliseconds.");
    });
}

/// Outcome of one refresh cycle. `assets` is either all live or all demo.
#[derive(Debug, Clone, Serialize)]
pub struct PriceBatch {
    pub assets: Vec<Asset>,
    pub source: DataSource,
    /// Symbols whose live fetch failed this cycle (dropped, not substituted).
    pub failed: Vec<String>,
}

pub fn live_asset(entry: &WatchlistEntry, q: RawQuote) -> Asset {
    Asset {
        entry: entry.clone(),
        price: q.price,
        change: q.change,
        change_percent: q.change_percent,
        volume: q.volume,
        market_cap: q.market_cap,
        currency: q.currency,
        data_source: DataSource::Live,
    }
}

/// Fetch every entry concurrently and wait for all of them. Individual
/// failures never abort the batch.
pub async fn refresh_prices(source: &dyn QuoteSource, watchlist: &[WatchlistEntry]) -> PriceBatch {
    ensure_metrics_described();
    let t0 = Instant::now();

    let outcomes = join_all(watchlist.iter().map(|entry| async move {
        match source.fetch_quote(&entry.symbol).await {
            Ok(q) => Some(live_asset(entry, q)),
            Err(e) => {
                tracing::warn!(
                    target: "aggregator",
                    symbol = %entry.symbol,
                    provider = source.name(),
                    error = %e,
                    "quote fetch failed"
                );
                counter!("quotes_fetch_errors_total", "kind" => e.kind()).increment(1);
                None
            }
        }
    }))
    .await;

    let mut assets = Vec::with_capacity(outcomes.len());
    let mut failed = Vec::new();
    for (entry, outcome) in watchlist.iter().zip(outcomes) {
        match outcome {
            Some(a) => assets.push(a),
            None => failed.push(entry.symbol.clone()),
        }
    }

    let batch = if assets.is_empty() {
        tracing::warn!(
            target: "aggregator",
            symbols = watchlist.len(),
            "no valid price data received; using demo data"
        );
        PriceBatch {
            assets: generate_demo(watchlist),
            source: DataSource::Demo,
            failed,
        }
    } else {
        PriceBatch {
            assets,
            source: DataSource::Live,
            failed,
        }
    };

    counter!("price_cycles_total", "source" => batch.source.as_str()).increment(1);
    histogram!("price_cycle_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    tracing::debug!(
        target: "aggregator",
        source = batch.source.as_str(),
        kept = batch.assets.len(),
        failed = batch.failed.len(),
        "price cycle resolved"
    );
    batch
}
