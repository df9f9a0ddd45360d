// src/types.rs
//! Shared data model: watchlist entries, derived assets and news articles.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    #[default]
    Stock,
    Crypto,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Live,
    Demo,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::Live => "live",
            DataSource::Demo => "demo",
        }
    }
}

/// One tracked instrument. `symbol` is already normalized (uppercase, crypto suffix).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WatchlistEntry {
    pub symbol: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AssetType,
}

impl WatchlistEntry {
    pub fn new(symbol: impl Into<String>, name: impl Into<String>, kind: AssetType) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
            kind,
        }
    }
}

/// Derived per-cycle view of a watchlist entry. Rebuilt on every refresh.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    #[serde(flatten)]
    pub entry: WatchlistEntry,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub volume: Option<u64>,
    pub market_cap: Option<u64>,
    pub currency: String,
    pub data_source: DataSource,
}

impl Asset {
    pub fn symbol(&self) -> &str {
        &self.entry.symbol
    }

    pub fn name(&self) -> &str {
        &self.entry.name
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewsArticle {
    pub title: String,
    pub source: String,
    /// Relative, human-readable ("2h ago").
    pub time: String,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl NewsArticle {
    pub fn new(
        title: impl Into<String>,
        source: impl Into<String>,
        time: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            source: source.into(),
            time: time.into(),
            summary: summary.into(),
            url: None,
        }
    }
}
