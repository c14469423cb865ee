use crate::cli::commands::open_store;
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::config::prefs::Preferences;
use crate::core::ticker::Ticker;
use crate::errors::AppResult;
use crate::ui::board::{Palette, render_board, render_footer};
use crate::utils::date::today_str;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const CLEAR: &str = "\x1b[2J\x1b[H";

/// Live board. Refreshes on every tick and on every store change until
/// Ctrl-C (or `--ticks` refreshes).
pub async fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Watch { ticks } = cmd {
        let store = Arc::new(open_store(cfg).await?);
        let palette = Palette::for_mode(Preferences::load().dark_mode);
        let ticker = Ticker::spawn(Arc::clone(&store), Duration::from_millis(cfg.tick_ms));
        let mut board_rx = ticker.board();

        let mut completed = 0;
        let mut refreshes = 0u64;

        loop {
            let board = board_rx.borrow_and_update().clone();

            // A failed read keeps the previous count on screen.
            match store.completed_on(&today_str()).await {
                Ok(n) => completed = n,
                Err(e) => warn!(error = %e, "could not count today's clocked times"),
            }

            print!("{CLEAR}");
            print!("{}", render_board(&board, &palette));
            println!();
            println!(
                "{}",
                render_footer(&palette, store.active_bays_count(), store.num_bays(), completed)
            );

            refreshes += 1;
            if ticks.is_some_and(|limit| refreshes >= limit) {
                break;
            }

            tokio::select! {
                res = board_rx.changed() => {
                    if res.is_err() {
                        break;
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    debug!("interrupted");
                    break;
                }
            }
        }

        ticker.stop().await;
        store.detach();
    }
    Ok(())
}
