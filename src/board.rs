// src/board.rs
//! Committed state shared between refresh cycles, news lookups and the API.
//!
//! Both boards replace their content wholesale and use monotonic sequence
//! numbers so a late result from a superseded request is dropped instead of
//! overwriting newer data.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use metrics::counter;
use serde::Serialize;

use crate::aggregator::PriceBatch;
use crate::news::{ArticleOrigin, FallbackTier, NewsOutcome};
use crate::types::{Asset, DataSource, NewsArticle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshPhase {
    Idle,
    Fetching,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleTicket {
    pub seq: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSnapshot {
    pub assets: Vec<Asset>,
    /// `None` until the first cycle commits.
    pub data_source: Option<DataSource>,
    pub last_update: Option<DateTime<Utc>>,
    pub phase: RefreshPhase,
    pub cycle: u64,
}

#[derive(Debug, Default)]
struct PriceInner {
    next_seq: u64,
    committed_seq: u64,
    in_flight: usize,
    assets: Vec<Asset>,
    source: Option<DataSource>,
    last_update: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
pub struct PriceBoard {
    inner: Mutex<PriceInner>,
}

impl PriceBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_cycle(&self) -> CycleTicket {
        let mut g = self.inner.lock().expect("price board mutex poisoned");
        g.next_seq += 1;
        g.in_flight += 1;
        CycleTicket { seq: g.next_seq }
    }

    /// Replace the asset list if `ticket` is newer than the last commit.
    /// Returns `false` when the result belongs to a superseded cycle.
    pub fn commit(&self, ticket: CycleTicket, batch: PriceBatch) -> bool {
        let mut g = self.inner.lock().expect("price board mutex poisoned");
        if ticket.seq <= g.committed_seq {
            counter!("price_cycles_superseded_total").increment(1);
            tracing::debug!(
                target: "scheduler",
                seq = ticket.seq,
                committed = g.committed_seq,
                "dropping superseded price cycle"
            );
            return false;
        }
        g.committed_seq = ticket.seq;
        g.assets = batch.assets;
        g.source = Some(batch.source);
        g.last_update = Some(Utc::now());
        true
    }

    pub fn finish(&self, _ticket: CycleTicket) {
        let mut g = self.inner.lock().expect("price board mutex poisoned");
        g.in_flight = g.in_flight.saturating_sub(1);
    }

    pub fn phase(&self) -> RefreshPhase {
        let g = self.inner.lock().expect("price board mutex poisoned");
        if g.in_flight > 0 {
            RefreshPhase::Fetching
        } else {
            RefreshPhase::Idle
        }
    }

    pub fn snapshot(&self) -> PriceSnapshot {
        let g = self.inner.lock().expect("price board mutex poisoned");
        PriceSnapshot {
            assets: g.assets.clone(),
            data_source: g.source,
            last_update: g.last_update,
            phase: if g.in_flight > 0 {
                RefreshPhase::Fetching
            } else {
                RefreshPhase::Idle
            },
            cycle: g.committed_seq,
        }
    }
}

/// Selection and article state for the news panel, keyed by asset identity.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum NewsState {
    Idle,
    Fetching {
        symbol: String,
        name: String,
    },
    Loaded {
        symbol: String,
        name: String,
        articles: Vec<NewsArticle>,
    },
    /// Lookup failed; articles are the templated fallback for `tier`.
    Failed {
        symbol: String,
        name: String,
        tier: FallbackTier,
        articles: Vec<NewsArticle>,
    },
}

impl NewsState {
    pub fn symbol(&self) -> Option<&str> {
        match self {
            NewsState::Idle => None,
            NewsState::Fetching { symbol, .. }
            | NewsState::Loaded { symbol, .. }
            | NewsState::Failed { symbol, .. } => Some(symbol),
        }
    }

    pub fn articles(&self) -> &[NewsArticle] {
        match self {
            NewsState::Loaded { articles, .. } | NewsState::Failed { articles, .. } => articles,
            _ => &[],
        }
    }

    pub fn is_fetching(&self) -> bool {
        matches!(self, NewsState::Fetching { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsTicket {
    pub seq: u64,
    pub symbol: String,
}

#[derive(Debug)]
struct NewsInner {
    seq: u64,
    state: NewsState,
}

#[derive(Debug)]
pub struct NewsPanel {
    inner: Mutex<NewsInner>,
}

impl Default for NewsPanel {
    fn default() -> Self {
        Self {
            inner: Mutex::new(NewsInner {
                seq: 0,
                state: NewsState::Idle,
            }),
        }
    }
}

impl NewsPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select an asset and enter `Fetching` before any I/O starts.
    pub fn select(&self, symbol: &str, name: &str) -> NewsTicket {
        let mut g = self.inner.lock().expect("news panel mutex poisoned");
        g.seq += 1;
        g.state = NewsState::Fetching {
            symbol: symbol.to_string(),
            name: name.to_string(),
        };
        NewsTicket {
            seq: g.seq,
            symbol: symbol.to_string(),
        }
    }

    /// Apply a lookup result if its ticket still identifies the current selection.
    pub fn commit(&self, ticket: &NewsTicket, outcome: NewsOutcome) -> bool {
        let mut g = self.inner.lock().expect("news panel mutex poisoned");
        let current = g.seq == ticket.seq && g.state.symbol() == Some(ticket.symbol.as_str());
        if !current {
            counter!("news_stale_discarded_total").increment(1);
            tracing::debug!(
                target: "news",
                symbol = %ticket.symbol,
                "discarding news for a stale selection"
            );
            return false;
        }
        let name = match &g.state {
            NewsState::Fetching { name, .. }
            | NewsState::Loaded { name, .. }
            | NewsState::Failed { name, .. } => name.clone(),
            NewsState::Idle => String::new(),
        };
        let symbol = ticket.symbol.clone();
        g.state = match outcome.origin {
            ArticleOrigin::Search => NewsState::Loaded {
                symbol,
                name,
                articles: outcome.articles,
            },
            ArticleOrigin::Fallback(tier) => NewsState::Failed {
                symbol,
                name,
                tier,
                articles: outcome.articles,
            },
        };
        true
    }

    /// Clear selection and articles when `symbol` is the selected asset.
    pub fn clear_if(&self, symbol: &str) -> bool {
        let mut g = self.inner.lock().expect("news panel mutex poisoned");
        if g.state.symbol() == Some(symbol) {
            // bump so an in-flight lookup for the removed asset cannot land
            g.seq += 1;
            g.state = NewsState::Idle;
            true
        } else {
            false
        }
    }

    pub fn state(&self) -> NewsState {
        self.inner
            .lock()
            .expect("news panel mutex poisoned")
            .state
            .clone()
    }
}
