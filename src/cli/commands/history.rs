use crate::cli::commands::{ask_confirmation, open_store, parse_bay};
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::calculator::stats;
use crate::errors::{AppError, AppResult};
use crate::ui::board::render_history;
use crate::ui::messages::{header, info, success};
use crate::utils::date::parse_date;

pub async fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::History {
        bay,
        from,
        to,
        truck,
        recent,
        delete,
        clear,
        yes,
    } = cmd
    {
        let store = open_store(cfg).await?;

        if let Some(id) = delete {
            store.delete_clocked_time(id).await?;
            success(format!("Clocked time {id} deleted."));
            return Ok(());
        }

        if *clear {
            let count = store.clocked_times_count().await?;
            if !*yes
                && !ask_confirmation(&format!(
                    "Delete ALL {count} clocked times? This action is irreversible."
                ))
            {
                info("Operation cancelled.");
                return Ok(());
            }
            store.clear_all_clocked_times().await?;
            success(format!("{count} clocked times deleted."));
            return Ok(());
        }

        for d in [from, to].into_iter().flatten() {
            if parse_date(d).is_none() {
                return Err(AppError::InvalidDate(d.clone()));
            }
        }
        let bay = parse_bay(bay.as_deref(), cfg)?;

        let range = from.as_deref().zip(to.as_deref());

        // The first filter picks the store query, the others narrow it down.
        let mut records = match (bay, range, truck.as_deref()) {
            (None, None, None) => {
                store
                    .recent_clocked_times(recent.unwrap_or(cfg.recent_limit))
                    .await?
            }
            (Some(id), _, _) => store.clocked_times_by_bay(id).await?,
            (None, Some((f, t)), _) => store.clocked_times_by_date_range(f, t).await?,
            (None, None, Some(t)) => store.clocked_times_by_truck(t).await?,
        };
        if let Some((f, t)) = range {
            records = stats::filter_by_date_range(&records, f, t);
        }
        if let Some(t) = truck {
            records = stats::filter_by_truck_exact(&records, t);
        }
        if let Some(n) = recent {
            records.truncate(*n);
        }

        if records.is_empty() {
            info("No clocked times found.");
            return Ok(());
        }

        header(format!("Clocked times ({})", records.len()));
        print!("{}", render_history(&records));
    }
    Ok(())
}
