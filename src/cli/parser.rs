use crate::export::ExportFormat;
use clap::{ArgGroup, Parser, Subcommand};

/// Command-line interface definition for baytracker
/// Live loading-bay board, clocked times and reports over a shared store
#[derive(Parser)]
#[command(
    name = "baytracker",
    version = env!("CARGO_PKG_VERSION"),
    about = "Track truck loading bays: who is loading where, for how long, and how it went",
    long_about = None
)]
pub struct Cli {
    /// Override database path (useful for tests or custom DB)
    #[arg(global = true, long = "db")]
    pub db: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and configuration
    Init,

    /// Start loading a truck at a bay (replaces any running session there)
    Start {
        /// Bay, as `bay3` or `3`
        bay: String,

        /// Truck number
        truck: String,
    },

    /// Clear one bay, or every bay with --all
    #[command(group(ArgGroup::new("target").required(true).args(["bay", "all"])))]
    Reset {
        bay: Option<String>,

        #[arg(long, help = "Reset every bay")]
        all: bool,

        #[arg(long, short = 'y', help = "Do not ask for confirmation")]
        yes: bool,
    },

    /// Record the elapsed time of an active bay
    Clock {
        bay: String,

        #[arg(long, short = 'y', help = "Do not ask for confirmation")]
        yes: bool,
    },

    /// Print the board once
    Status {
        #[arg(long, help = "Print the board as JSON")]
        json: bool,

        #[arg(long, help = "Also print utilization and active-time metrics")]
        metrics: bool,
    },

    /// Keep the board on screen, refreshed every tick
    Watch {
        #[arg(long, value_name = "N", help = "Stop after N refreshes")]
        ticks: Option<u64>,
    },

    /// Browse or prune clocked times
    History {
        #[arg(long, help = "Only this bay")]
        bay: Option<String>,

        #[arg(long, value_name = "YYYY-MM-DD", requires = "to")]
        from: Option<String>,

        #[arg(long, value_name = "YYYY-MM-DD", requires = "from")]
        to: Option<String>,

        #[arg(long, help = "Exact truck number")]
        truck: Option<String>,

        #[arg(long, value_name = "N", help = "Only the N most recent records")]
        recent: Option<usize>,

        #[arg(long, value_name = "ID", help = "Delete one record")]
        delete: Option<String>,

        #[arg(long, help = "Delete every record (asks for confirmation)")]
        clear: bool,

        #[arg(long, short = 'y', help = "Do not ask for confirmation")]
        yes: bool,
    },

    /// Summary statistics over clocked times
    Stats {
        #[arg(long, short, help = "Year/month/day or a custom range (YYYY-MM-DD:YYYY-MM-DD)")]
        range: Option<String>,

        #[arg(long, value_name = "N", conflicts_with = "range", help = "Last N days")]
        days: Option<u64>,

        #[arg(long)]
        bay: Option<String>,

        #[arg(long, help = "Truck number substring (case-insensitive)")]
        truck: Option<String>,

        #[arg(long, help = "Print as JSON")]
        json: bool,
    },

    /// Export clocked times or the current status
    Export {
        #[arg(long, value_enum, default_value = "xlsx")]
        format: ExportFormat,

        #[arg(long, value_name = "FILE", help = "Output file (default: generated name)")]
        file: Option<String>,

        #[arg(long, short, help = "Year/month/day, a custom range, or `all`")]
        range: Option<String>,

        #[arg(long, value_name = "N", conflicts_with = "range", help = "Quick report over the last N days")]
        days: Option<u64>,

        #[arg(long)]
        bay: Option<String>,

        #[arg(long, help = "Truck number substring (case-insensitive)")]
        truck: Option<String>,

        #[arg(
            long,
            conflicts_with_all = ["range", "days", "bay", "truck"],
            help = "Export the bays active right now instead of the history"
        )]
        status: bool,

        #[arg(long, help = "Overwrite an existing file without asking")]
        force: bool,
    },

    /// Check that the clocked-times collection can be read
    Check,

    /// Manage the configuration file (view or edit)
    Config {
        #[arg(long = "print", help = "Print the current configuration")]
        print_config: bool,

        #[arg(
            long = "edit",
            help = "Edit the configuration file (default editor: $EDITOR, or nano/notepad)"
        )]
        edit_config: bool,

        #[arg(long = "editor", help = "Specify the editor to use (vim, nano, or custom path)")]
        editor: Option<String>,
    },

    /// Show or switch the board theme
    Theme {
        #[arg(long, conflicts_with_all = ["dark", "light"])]
        toggle: bool,

        #[arg(long, conflicts_with = "light")]
        dark: bool,

        #[arg(long)]
        light: bool,
    },
}
