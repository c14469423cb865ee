//! baytracker library root.
//! Exposes the CLI parser, the async run() entry point and the internal
//! modules (store, evaluator, aggregator, exporters, backends).

pub mod cli;
pub mod config;
pub mod core;
pub mod db;
pub mod errors;
pub mod export;
pub mod models;
pub mod ui;
pub mod utils;

use cli::parser::{Cli, Commands};
use config::Config;
use errors::AppResult;

/// Central command dispatcher
pub async fn dispatch(cli: &Cli, cfg: &Config) -> AppResult<()> {
    use crate::cli::commands as c;

    match &cli.command {
        Commands::Init => c::init::handle(cli),
        Commands::Config { .. } => c::config::handle(&cli.command, cfg),
        Commands::Theme { .. } => c::theme::handle(&cli.command),
        Commands::Start { .. } => c::start::handle(&cli.command, cfg).await,
        Commands::Reset { .. } => c::reset::handle(&cli.command, cfg).await,
        Commands::Clock { .. } => c::clock::handle(&cli.command, cfg).await,
        Commands::Status { .. } => c::status::handle(&cli.command, cfg).await,
        Commands::Watch { .. } => c::watch::handle(&cli.command, cfg).await,
        Commands::History { .. } => c::history::handle(&cli.command, cfg).await,
        Commands::Stats { .. } => c::stats::handle(&cli.command, cfg).await,
        Commands::Export { .. } => c::export::handle(&cli.command, cfg).await,
        Commands::Check => c::check::handle(cfg).await,
    }
}

/// Load the configuration for a parsed command line, applying `--db`.
pub fn resolve_config(cli: &Cli) -> AppResult<Config> {
    let mut cfg = Config::load()?;
    if let Some(custom_db) = &cli.db {
        cfg.database = custom_db.clone();
    }
    Ok(cfg)
}

/// Entry point used by main.rs
pub async fn run(cli: Cli, cfg: Config) -> AppResult<()> {
    dispatch(&cli, &cfg).await
}
