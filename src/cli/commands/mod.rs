pub mod check;
pub mod clock;
pub mod config;
pub mod export;
pub mod history;
pub mod init;
pub mod reset;
pub mod start;
pub mod stats;
pub mod status;
pub mod theme;
pub mod watch;

use crate::config::Config;
use crate::core::store::BayStore;
use crate::db::SqliteStore;
use crate::errors::AppResult;
use crate::models::BayId;
use crate::ui::messages::warning;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Open the configured database and start listening to every bay.
pub(crate) async fn open_store(cfg: &Config) -> AppResult<BayStore> {
    if let Some(dir) = Path::new(&cfg.database).parent()
        && !dir.as_os_str().is_empty()
    {
        std::fs::create_dir_all(dir)?;
    }
    let backend = Arc::new(
        SqliteStore::open(&cfg.database)?.with_poll_interval(Duration::from_millis(cfg.tick_ms)),
    );
    BayStore::attach(backend, cfg).await
}

/// Optional `--bay` argument, checked against the configured bay count.
pub(crate) fn parse_bay(raw: Option<&str>, cfg: &Config) -> AppResult<Option<BayId>> {
    raw.map(|b| BayId::parse_within(b, cfg.num_bays)).transpose()
}

/// Ask a yes/no confirmation from the user
pub(crate) fn ask_confirmation(prompt: &str) -> bool {
    warning(prompt);
    print!("Confirm [y/N]: ");
    let _ = io::stdout().flush();

    let mut s = String::new();
    if io::stdin().read_line(&mut s).is_ok() {
        matches!(s.trim().to_lowercase().as_str(), "y" | "yes")
    } else {
        false
    }
}
