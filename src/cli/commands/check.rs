use crate::cli::commands::open_store;
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::ui::messages::success;
use crate::utils::date::today_str;

/// Handle the `check` command: one read of the clocked-times collection.
pub async fn handle(cfg: &Config) -> AppResult<()> {
    let store = open_store(cfg).await?;

    if !store.is_collection_accessible().await {
        return Err(AppError::BackendUnavailable(
            "the clocked-times collection cannot be read".into(),
        ));
    }

    let total = store.clocked_times_count().await?;
    let today = store.completed_on(&today_str()).await?;
    success(format!(
        "Clocked-times collection is accessible ({total} records, {today} today)."
    ));
    success(format!(
        "{} of {} bays active.",
        store.active_bays_count(),
        store.num_bays()
    ));
    Ok(())
}
