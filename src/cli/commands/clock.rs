use crate::cli::commands::{ask_confirmation, open_store};
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::errors::AppResult;
use crate::ui::messages::{info, success};

pub async fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Clock { bay, yes } = cmd {
        let store = open_store(cfg).await?;
        let id = store.bay_id(bay)?;

        if let Some(current) = store.lookup(id).filter(|b| b.is_active())
            && !*yes
            && !ask_confirmation(&format!("Clock time for {id} ({})?", current.truck))
        {
            info("Operation cancelled.");
            return Ok(());
        }

        let record = store.clock_time(id).await?;
        success(format!(
            "Clocked {} for truck {} at {id}.",
            record.elapsed_time, record.truck_number
        ));
    }
    Ok(())
}
