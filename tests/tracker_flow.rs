// tests/tracker_flow.rs
//
// End-to-end flows through the Tracker facade:
// - refresh cycles and the live/demo decision as seen by consumers
// - overlapping cycles: last *started* cycle wins, late results are dropped
// - news selection, stale responses, removal of the selected asset
// - scheduler triggers (mount, interval, manual, watchlist restart)

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use market_tracker::board::{NewsState, RefreshPhase};
use market_tracker::news::{FallbackTier, NewsRetriever, StaticSearchBackend};
use market_tracker::quotes::{QuoteError, QuoteSource, RawQuote};
use market_tracker::types::{AssetType, DataSource, WatchlistEntry};
use market_tracker::watchlist::{WatchlistError, WatchlistStore};
use market_tracker::Tracker;

/// Fails every symbol with HTTP 500.
struct DownQuotes;

#[async_trait]
impl QuoteSource for DownQuotes {
    async fn fetch_quote(&self, _symbol: &str) -> Result<RawQuote, QuoteError> {
        Err(QuoteError::HttpStatus(500))
    }
    fn name(&self) -> &'static str {
        "down"
    }
}

/// Succeeds; the n-th call (0-based) is priced `n + 1` and the first call is slow.
struct SequencedQuotes {
    calls: AtomicUsize,
    first_delay: Duration,
}

#[async_trait]
impl QuoteSource for SequencedQuotes {
    async fn fetch_quote(&self, _symbol: &str) -> Result<RawQuote, QuoteError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n == 0 {
            tokio::time::sleep(self.first_delay).await;
        }
        Ok(RawQuote::from_prices((n + 1) as f64, 1.0, None, None, None))
    }
    fn name(&self) -> &'static str {
        "sequenced"
    }
}

fn apple_only() -> WatchlistStore {
    WatchlistStore::new(vec![WatchlistEntry::new(
        "AAPL",
        "Apple Inc.",
        AssetType::Stock,
    )])
}

fn news_json() -> StaticSearchBackend {
    StaticSearchBackend::text(
        r#"[{"title":"Apple ships","source":"Wire","time":"1h ago","summary":"ok"}]"#,
    )
}

fn tracker(store: WatchlistStore, quotes: Arc<dyn QuoteSource>) -> Tracker {
    Tracker::new(store, quotes, NewsRetriever::new(Arc::new(news_json()), 5))
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

#[tokio::test]
async fn upstream_down_shows_demo_prices() {
    let t = tracker(apple_only(), Arc::new(DownQuotes));
    assert!(t.prices().data_source.is_none());

    assert!(t.run_cycle_now().await);

    let snap = t.prices();
    assert_eq!(snap.data_source, Some(DataSource::Demo));
    assert_eq!(snap.assets.len(), 1);
    assert_eq!(snap.assets[0].symbol(), "AAPL");
    assert_eq!(snap.assets[0].data_source, DataSource::Demo);
    assert_eq!(snap.assets[0].price, 225.50);
    assert!(snap.last_update.is_some());
    assert_eq!(snap.phase, RefreshPhase::Idle);
}

#[tokio::test(start_paused = true)]
async fn late_result_from_superseded_cycle_is_dropped() {
    let quotes = Arc::new(SequencedQuotes {
        calls: AtomicUsize::new(0),
        first_delay: Duration::from_secs(5),
    });
    let t = tracker(apple_only(), quotes);

    let (first, second) = tokio::join!(t.run_cycle_now(), async {
        settle().await;
        t.run_cycle_now().await
    });

    assert!(!first, "slow first cycle must not overwrite the newer one");
    assert!(second);
    let snap = t.prices();
    assert_eq!(snap.assets[0].price, 2.0);
    assert_eq!(snap.cycle, 2);
    assert_eq!(snap.phase, RefreshPhase::Idle);
}

#[tokio::test]
async fn selecting_news_loads_articles_for_that_asset() {
    let t = tracker(WatchlistStore::with_defaults(), Arc::new(DownQuotes));

    let state = t.select_news("AAPL").await.unwrap();
    match state {
        NewsState::Loaded {
            symbol,
            name,
            articles,
        } => {
            assert_eq!(symbol, "AAPL");
            assert_eq!(name, "Apple Inc.");
            assert_eq!(articles.len(), 1);
        }
        other => panic!("unexpected state {other:?}"),
    }

    assert_eq!(
        t.select_news("ZZZ").await.unwrap_err(),
        WatchlistError::NotFound("ZZZ".into())
    );
}

#[tokio::test]
async fn failed_lookup_is_reported_with_fallback_articles() {
    let t = Tracker::new(
        WatchlistStore::with_defaults(),
        Arc::new(DownQuotes),
        NewsRetriever::new(Arc::new(StaticSearchBackend::text("nothing")), 5),
    );
    match t.select_news("TSLA").await.unwrap() {
        NewsState::Failed { tier, articles, .. } => {
            assert_eq!(tier, FallbackTier::Unparsed);
            assert_eq!(articles.len(), 3);
            assert!(articles[0].title.starts_with("Tesla Inc."));
        }
        other => panic!("unexpected state {other:?}"),
    }
}

#[tokio::test]
async fn response_for_previous_selection_is_discarded() {
    let t = tracker(WatchlistStore::with_defaults(), Arc::new(DownQuotes));

    let a = t.begin_news("AAPL").unwrap();
    // selection is updated synchronously
    assert_eq!(t.news_state().symbol(), Some("AAPL"));
    assert!(t.news_state().is_fetching());

    let b = t.begin_news("TSLA").unwrap();
    assert!(!t.complete_news(a).await);
    assert_eq!(t.news_state().symbol(), Some("TSLA"));
    assert!(t.news_state().is_fetching());

    assert!(t.complete_news(b).await);
    assert_eq!(t.news_state().symbol(), Some("TSLA"));
    assert_eq!(t.news_state().articles().len(), 1);
}

#[tokio::test]
async fn removing_selected_asset_clears_news() {
    let t = tracker(WatchlistStore::with_defaults(), Arc::new(DownQuotes));
    t.select_news("NVDA").await.unwrap();
    assert!(!t.news_state().articles().is_empty());

    // removing another asset leaves the selection alone
    t.remove_asset("TSLA").unwrap();
    assert_eq!(t.news_state().symbol(), Some("NVDA"));

    t.remove_asset("NVDA").unwrap();
    assert_eq!(t.news_state(), NewsState::Idle);
    assert!(t.news_state().articles().is_empty());
}

#[tokio::test]
async fn removal_during_fetch_drops_the_late_response() {
    let t = tracker(WatchlistStore::with_defaults(), Arc::new(DownQuotes));
    let ticket = t.begin_news("MSFT").unwrap();
    t.remove_asset("MSFT").unwrap();
    assert!(!t.complete_news(ticket).await);
    assert_eq!(t.news_state(), NewsState::Idle);
}

#[tokio::test]
async fn store_errors_surface_and_leave_state_unchanged() {
    let t = tracker(apple_only(), Arc::new(DownQuotes));
    assert_eq!(t.remove_asset("AAPL"), Err(WatchlistError::WatchlistEmpty));

    t.add_asset("btc", None, AssetType::Crypto).unwrap();
    assert_eq!(
        t.add_asset("BTC", Some("Bitcoin"), AssetType::Crypto),
        Err(WatchlistError::DuplicateAsset("BTC-USD".into()))
    );
    let symbols: Vec<_> = t.watchlist().into_iter().map(|e| e.symbol).collect();
    assert_eq!(symbols, vec!["AAPL", "BTC-USD"]);
}

#[tokio::test(start_paused = true)]
async fn scheduler_runs_on_mount_and_every_interval() {
    let mut t = tracker(apple_only(), Arc::new(DownQuotes));
    t.start_scheduler(Duration::from_secs(60));

    settle().await;
    assert_eq!(t.prices().cycle, 1, "mount refresh");

    tokio::time::sleep(Duration::from_secs(60)).await;
    settle().await;
    assert_eq!(t.prices().cycle, 2, "periodic refresh");

    assert!(t.refresh_now());
    settle().await;
    assert_eq!(t.prices().cycle, 3, "manual refresh");
}

#[tokio::test(start_paused = true)]
async fn watchlist_change_restarts_the_interval_window() {
    let mut t = tracker(apple_only(), Arc::new(DownQuotes));
    t.start_scheduler(Duration::from_secs(60));
    settle().await;
    assert_eq!(t.prices().cycle, 1);

    tokio::time::sleep(Duration::from_secs(30)).await;
    t.add_asset("eth", Some("Ethereum"), AssetType::Crypto).unwrap();
    settle().await;
    assert_eq!(t.prices().cycle, 2, "immediate refresh on change");
    assert_eq!(t.prices().assets.len(), 2);

    // the old window would have fired at t=60
    tokio::time::sleep(Duration::from_secs(45)).await;
    assert_eq!(t.prices().cycle, 2);

    // new window fires 60s after the change
    tokio::time::sleep(Duration::from_secs(20)).await;
    settle().await;
    assert_eq!(t.prices().cycle, 3);
}
