//! baytracker main entrypoint.

use baytracker::cli::parser::Cli;
use baytracker::ui::messages::error;
use baytracker::{resolve_config, run};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::UtcTime;

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let cfg = match resolve_config(&cli) {
        Ok(cfg) => cfg,
        Err(e) => {
            init_tracing("warn");
            error(e.user_message());
            std::process::exit(1);
        }
    };
    init_tracing(&cfg.log_level);

    if let Err(e) = run(cli, cfg).await {
        tracing::debug!(error = %e, "command failed");
        error(e.user_message());
        std::process::exit(1);
    }
}
