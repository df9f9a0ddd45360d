// src/tracker.rs
//! Service facade tying the watchlist, price board, news panel and
//! scheduler together. HTTP handlers only talk to this type.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::board::{NewsPanel, NewsState, NewsTicket, PriceBoard, PriceSnapshot};
use crate::news::NewsRetriever;
use crate::quotes::QuoteSource;
use crate::scheduler::{run_cycle, CycleContext, RefreshScheduler};
use crate::types::{AssetType, WatchlistEntry};
use crate::watchlist::{WatchlistError, WatchlistStore};

pub struct Tracker {
    ctx: CycleContext,
    news: Arc<NewsPanel>,
    retriever: Arc<NewsRetriever>,
    scheduler: Option<RefreshScheduler>,
}

impl Tracker {
    pub fn new(
        store: WatchlistStore,
        quotes: Arc<dyn QuoteSource>,
        retriever: NewsRetriever,
    ) -> Self {
        Self {
            ctx: CycleContext {
                quotes,
                watchlist: Arc::new(RwLock::new(store)),
                board: Arc::new(PriceBoard::new()),
            },
            news: Arc::new(NewsPanel::new()),
            retriever: Arc::new(retriever),
            scheduler: None,
        }
    }

    /// Start periodic refreshes; the first cycle runs immediately.
    /// Must be called from within a Tokio runtime.
    pub fn start_scheduler(&mut self, interval: Duration) {
        tracing::info!(
            target: "scheduler",
            interval_secs = interval.as_secs(),
            "starting refresh scheduler"
        );
        self.scheduler = Some(RefreshScheduler::spawn(self.ctx.clone(), interval));
    }

    pub fn watchlist(&self) -> Vec<WatchlistEntry> {
        self.ctx
            .watchlist
            .read()
            .expect("watchlist rwlock poisoned")
            .snapshot()
    }

    pub fn prices(&self) -> PriceSnapshot {
        self.ctx.board.snapshot()
    }

    pub fn news_state(&self) -> NewsState {
        self.news.state()
    }

    pub fn add_asset(
        &self,
        symbol: &str,
        name: Option<&str>,
        kind: AssetType,
    ) -> Result<WatchlistEntry, WatchlistError> {
        let added = {
            let mut g = self.ctx.watchlist.write().expect("watchlist rwlock poisoned");
            g.add(symbol, name, kind)
        };
        match &added {
            Ok(entry) => {
                tracing::info!(target: "watchlist", symbol = %entry.symbol, "asset added");
                self.on_watchlist_changed();
            }
            Err(e) => tracing::info!(target: "watchlist", error = %e, "add rejected"),
        }
        added
    }

    /// Remove an asset; clears the news panel when it was the selected one.
    pub fn remove_asset(&self, symbol: &str) -> Result<WatchlistEntry, WatchlistError> {
        let removed = {
            let mut g = self.ctx.watchlist.write().expect("watchlist rwlock poisoned");
            g.remove(symbol)
        };
        match &removed {
            Ok(entry) => {
                if self.news.clear_if(&entry.symbol) {
                    tracing::debug!(target: "news", symbol = %entry.symbol, "selection cleared");
                }
                tracing::info!(target: "watchlist", symbol = %entry.symbol, "asset removed");
                self.on_watchlist_changed();
            }
            Err(e) => tracing::info!(target: "watchlist", error = %e, "remove rejected"),
        }
        removed
    }

    fn on_watchlist_changed(&self) {
        if let Some(s) = &self.scheduler {
            s.restart();
        }
    }

    /// Ask the scheduler for a cycle without waiting for it. Without a
    /// running scheduler this is a no-op.
    pub fn refresh_now(&self) -> bool {
        match &self.scheduler {
            Some(s) => {
                s.trigger();
                true
            }
            None => false,
        }
    }

    /// Run one cycle inline and wait for it to settle.
    pub async fn run_cycle_now(&self) -> bool {
        run_cycle(&self.ctx).await
    }

    /// Mark `symbol` as the selected news asset. Happens synchronously, before any fetch.
    pub fn begin_news(&self, symbol: &str) -> Result<NewsTicket, WatchlistError> {
        let entry = {
            let g = self.ctx.watchlist.read().expect("watchlist rwlock poisoned");
            g.get(symbol)
                .cloned()
                .ok_or_else(|| WatchlistError::NotFound(symbol.to_string()))?
        };
        Ok(self.news.select(&entry.symbol, &entry.name))
    }

    /// Fetch articles for a ticket and commit them if the selection is unchanged.
    pub async fn complete_news(&self, ticket: NewsTicket) -> bool {
        let name = match self.news.state() {
            NewsState::Fetching { symbol, name } if symbol == ticket.symbol => name,
            _ => return false,
        };
        let outcome = self.retriever.fetch_news(&ticket.symbol, &name).await;
        self.news.commit(&ticket, outcome)
    }

    pub async fn select_news(&self, symbol: &str) -> Result<NewsState, WatchlistError> {
        let ticket = self.begin_news(symbol)?;
        self.complete_news(ticket).await;
        Ok(self.news.state())
    }
}
