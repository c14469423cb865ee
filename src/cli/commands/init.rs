use crate::cli::parser::Cli;
use crate::config::Config;
use crate::db::SqliteStore;
use crate::errors::AppResult;
use crate::ui::messages::{info, success};

/// Handle the `init` command
///
/// Creates the config directory, writes the configuration file and
/// prepares the SQLite database schema.
pub fn handle(cli: &Cli) -> AppResult<()> {
    let (conf_path, db_path) = Config::init_all(cli.db.as_deref())?;

    info("Initializing baytracker…");
    info(format!("Config file : {}", conf_path.display()));
    info(format!("Database    : {}", db_path.display()));

    SqliteStore::open(&db_path.to_string_lossy())?;

    success(format!("Database initialized at {}", db_path.display()));
    Ok(())
}
