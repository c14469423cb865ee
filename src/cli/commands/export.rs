use crate::cli::commands::{open_store, parse_bay};
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::export::{ExportLogic, ReportFilter};
use crate::errors::AppResult;

pub async fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Export {
        format,
        file,
        range,
        days,
        bay,
        truck,
        status,
        force,
    } = cmd
    {
        let store = open_store(cfg).await?;

        if *status {
            ExportLogic::export_status(&store, *format, file.as_deref(), *force).await?;
            return Ok(());
        }

        let filter = match (range, days) {
            (Some(r), _) => ReportFilter::from_range(r)?,
            (None, Some(n)) => ReportFilter::last_days(*n),
            (None, None) => ReportFilter::default(),
        }
        .with_bay(parse_bay(bay.as_deref(), cfg)?)
        .with_truck(truck.clone());

        ExportLogic::export_clocked_times(&store, *format, file.as_deref(), &filter, *force)
            .await?;
    }
    Ok(())
}
