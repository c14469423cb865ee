use crate::cli::commands::{open_store, parse_bay};
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::calculator::stats::summarize;
use crate::core::export::ReportFilter;
use crate::errors::AppResult;
use crate::ui::board::render_summary;
use crate::ui::messages::{header, info};

pub async fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Stats {
        range,
        days,
        bay,
        truck,
        json,
    } = cmd
    {
        let filter = match (range, days) {
            (Some(r), _) => ReportFilter::from_range(r)?,
            (None, Some(n)) => ReportFilter::last_days(*n),
            (None, None) => ReportFilter::default(),
        }
        .with_bay(parse_bay(bay.as_deref(), cfg)?)
        .with_truck(truck.clone());

        let store = open_store(cfg).await?;
        let summary = if filter.is_full() {
            store.clocked_time_stats().await?
        } else {
            summarize(&filter.select(&store.all_clocked_times().await?))
        };

        if *json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
            return Ok(());
        }

        if summary.is_empty() {
            info("No clocked times found for the selected filters.");
            return Ok(());
        }

        header("Clocked-time statistics");
        print!("{}", render_summary(&summary));
    }
    Ok(())
}
