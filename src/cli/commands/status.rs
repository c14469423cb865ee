use crate::cli::commands::open_store;
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::config::prefs::Preferences;
use crate::core::calculator::stats::performance_metrics;
use crate::errors::AppResult;
use crate::ui::board::{Palette, render_board, render_footer, render_metrics};
use crate::ui::messages::header;
use crate::utils::date::today_str;

pub async fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Status { json, metrics } = cmd {
        let store = open_store(cfg).await?;
        let board = store.board();

        if *json {
            println!("{}", serde_json::to_string_pretty(&board)?);
            return Ok(());
        }

        let palette = Palette::for_mode(Preferences::load().dark_mode);
        let completed = store.completed_on(&today_str()).await?;

        header("Loading bays");
        print!("{}", render_board(&board, &palette));
        println!();
        println!(
            "{}",
            render_footer(&palette, store.active_bays_count(), store.num_bays(), completed)
        );

        if *metrics {
            println!("{}", render_metrics(&performance_metrics(&board, store.num_bays())));
        }
    }
    Ok(())
}
