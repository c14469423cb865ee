//! Periodic recomputation of the board.
//!
//! The ticker owns no state of its own: on every tick, and whenever the
//! store publishes a new snapshot, it recomputes the derived fields of all
//! bays and publishes the resulting board.

use crate::core::calculator::status::recompute_all;
use crate::core::store::BayStore;
use crate::models::DisplayBay;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace};

pub type Board = Arc<Vec<DisplayBay>>;

pub struct Ticker {
    board: watch::Receiver<Board>,
    shutdown: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    /// Start ticking every `period`. Ticks never overlap; late ticks are
    /// skipped rather than bunched up.
    pub fn spawn(store: Arc<BayStore>, period: Duration) -> Self {
        let (board_tx, board_rx) = watch::channel(Arc::new(store.board()));
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut changes = store.subscribe();

            loop {
                tokio::select! {
                    _ = interval.tick() => trace!("tick"),
                    res = changes.changed() => {
                        if res.is_err() {
                            break;
                        }
                        trace!("snapshot changed");
                    }
                    _ = shutdown_rx.changed() => break,
                }

                let snapshot = changes.borrow_and_update().clone();
                let board = recompute_all(
                    &snapshot,
                    store.num_bays(),
                    &store.thresholds(),
                    store.now_ms(),
                );
                board_tx.send_replace(Arc::new(board));
            }
            debug!("ticker stopped");
        });

        Self {
            board: board_rx,
            shutdown: shutdown_tx,
            handle: Some(handle),
        }
    }

    /// Receiver of every recomputed board.
    pub fn board(&self) -> watch::Receiver<Board> {
        self.board.clone()
    }

    pub fn current(&self) -> Board {
        Arc::clone(&self.board.borrow())
    }

    /// Stop ticking and wait for the task to finish.
    pub async fn stop(mut self) {
        let _ = self.shutdown.send(true);
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
