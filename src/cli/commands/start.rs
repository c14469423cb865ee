use crate::cli::commands::open_store;
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{success, warning};

pub async fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Start { bay, truck } = cmd {
        let truck = truck.trim();
        if truck.is_empty() {
            return Err(AppError::InvalidState("a truck number is required".into()));
        }

        let store = open_store(cfg).await?;
        let id = store.bay_id(bay)?;

        if let Some(previous) = store.lookup(id).filter(|b| b.is_active()) {
            warning(format!(
                "{id} was loading {}; that session is replaced.",
                previous.truck
            ));
        }

        store.start_loading(id, truck).await?;
        success(format!("Started loading {truck} at {id}."));
    }
    Ok(())
}
