// src/demo.rs
//! Synthetic quotes used when no live quote succeeds in a cycle.
//!
//! Price/change/changePercent come from a fixed table; volume and market cap
//! are random within fixed bounds and only serve visual plausibility.

use rand::Rng;

use crate::types::{Asset, AssetType, DataSource, WatchlistEntry};

pub const VOLUME_MIN: u64 = 10_000_000;
pub const VOLUME_MAX: u64 = 60_000_000;
pub const MARKET_CAP_MIN: u64 = 100_000_000_000;
pub const MARKET_CAP_MAX: u64 = 2_100_000_000_000;

/// (symbol, price, change, changePercent)
const KNOWN: &[(&str, f64, f64, f64)] = &[
    ("AAPL", 225.50, 2.75, 1.23),
    ("TSLA", 195.80, -3.45, -1.73),
    ("GOOGL", 175.30, 1.20, 0.69),
    ("MSFT", 442.15, 5.80, 1.33),
    ("NVDA", 890.25, 12.40, 1.41),
    ("BTC-USD", 98_750.00, -1_250.50, -1.25),
    ("ETH-USD", 3_685.40, 45.20, 1.24),
    ("SOL-USD", 195.75, -2.35, -1.19),
];

/// Fixed (price, change, changePercent) for a symbol; neutral placeholder when unknown.
pub fn demo_triple(symbol: &str) -> (f64, f64, f64) {
    KNOWN
        .iter()
        .find(|(s, ..)| *s == symbol)
        .map(|&(_, p, c, pct)| (p, c, pct))
        .unwrap_or((100.0, 0.0, 0.0))
}

pub fn generate_demo(watchlist: &[WatchlistEntry]) -> Vec<Asset> {
    let mut rng = rand::rng();
    watchlist
        .iter()
        .map(|entry| {
            let (price, change, change_percent) = demo_triple(&entry.symbol);
            let market_cap = match entry.kind {
                AssetType::Crypto => None,
                AssetType::Stock => Some(rng.random_range(MARKET_CAP_MIN..MARKET_CAP_MAX)),
            };
            Asset {
                entry: entry.clone(),
                price,
                change,
                change_percent,
                volume: Some(rng.random_range(VOLUME_MIN..VOLUME_MAX)),
                market_cap,
                currency: "USD".to_string(),
                data_source: DataSource::Demo,
            }
        })
        .collect()
}
