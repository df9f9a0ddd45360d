// src/scheduler.rs
//! Refresh scheduler: runs a price cycle on start, on demand, and on a fixed
//! interval. A watchlist change restarts the interval window.
//!
//! Cycles are spawned as independent tasks and may overlap; `PriceBoard`
//! sequence numbers decide which result is kept.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::aggregator::refresh_prices;
use crate::board::PriceBoard;
use crate::quotes::QuoteSource;
use crate::watchlist::WatchlistStore;

/// Everything a price cycle needs; cheap to clone.
#[derive(Clone)]
pub struct CycleContext {
    pub quotes: Arc<dyn QuoteSource>,
    pub watchlist: Arc<RwLock<WatchlistStore>>,
    pub board: Arc<PriceBoard>,
}

/// Run one fan-out-and-join cycle and commit it. Returns whether the result
/// was committed (false when a newer cycle already landed).
pub async fn run_cycle(ctx: &CycleContext) -> bool {
    let ticket = ctx.board.begin_cycle();
    let entries = {
        let g = ctx.watchlist.read().expect("watchlist rwlock poisoned");
        g.snapshot()
    };

    let batch = refresh_prices(ctx.quotes.as_ref(), &entries).await;
    let source = batch.source;
    let kept = batch.assets.len();
    let committed = ctx.board.commit(ticket, batch);
    ctx.board.finish(ticket);

    tracing::info!(
        target: "scheduler",
        seq = ticket.seq,
        source = source.as_str(),
        kept,
        committed,
        "price cycle finished"
    );
    committed
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Refresh,
    Restart,
}

pub struct RefreshScheduler {
    tx: mpsc::UnboundedSender<Command>,
    handle: JoinHandle<()>,
}

impl RefreshScheduler {
    /// Spawn the scheduler loop. The first interval tick fires immediately,
    /// which is the initial (mount) refresh.
    pub fn spawn(ctx: CycleContext, interval: Duration) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Command>();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut trigger = "mount";

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        spawn_cycle(&ctx, trigger);
                        trigger = "periodic";
                    }
                    cmd = rx.recv() => match cmd {
                        Some(Command::Refresh) => spawn_cycle(&ctx, "manual"),
                        Some(Command::Restart) => {
                            ticker.reset();
                            spawn_cycle(&ctx, "watchlist");
                        }
                        None => break,
                    },
                }
            }
            tracing::debug!(target: "scheduler", "scheduler loop stopped");
        });

        Self { tx, handle }
    }

    /// Manual refresh. Does not touch the interval window.
    pub fn trigger(&self) {
        if self.tx.send(Command::Refresh).is_err() {
            tracing::warn!(target: "scheduler", "refresh requested after scheduler stopped");
        }
    }

    /// Watchlist changed: fetch now and start a fresh interval window.
    pub fn restart(&self) {
        if self.tx.send(Command::Restart).is_err() {
            tracing::warn!(target: "scheduler", "restart requested after scheduler stopped");
        }
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn spawn_cycle(ctx: &CycleContext, trigger: &'static str) {
    tracing::debug!(target: "scheduler", trigger, "starting price cycle");
    let ctx = ctx.clone();
    tokio::spawn(async move {
        run_cycle(&ctx).await;
    });
}
