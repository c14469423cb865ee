use crate::cli::commands::{ask_confirmation, open_store};
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::errors::AppResult;
use crate::ui::messages::{info, success};

pub async fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Reset { bay, all, yes } = cmd {
        let store = open_store(cfg).await?;

        if *all {
            if !*yes && !ask_confirmation("Reset ALL bays? Running sessions are lost.") {
                info("Operation cancelled.");
                return Ok(());
            }
            store.reset_all_bays().await?;
            success(format!("All {} bays have been reset.", store.num_bays()));
            return Ok(());
        }

        if let Some(raw) = bay {
            let id = store.bay_id(raw)?;
            let active = store.lookup(id).is_some_and(|b| b.is_active());
            if active && !*yes && !ask_confirmation(&format!("Reset {id}? Its session is lost.")) {
                info("Operation cancelled.");
                return Ok(());
            }
            store.reset_bay(id).await?;
            success(format!("{id} has been reset."));
        }
    }
    Ok(())
}
