use crate::export::ExportFormat;
use clap::{ArgAction, Parser, Subcommand};

/// Command-line interface definition for totemlog
/// Sensor analytics pipeline for kiosk totems, backed by SQLite
#[derive(Parser)]
#[command(
    name = "totemlog",
    version = env!("CARGO_PKG_VERSION"),
    about = "Collect, clean, analyze and classify kiosk totem sensor events using SQLite",
    long_about = None
)]
pub struct Cli {
    /// Override database path (useful for tests or custom DB)
    #[arg(global = true, long = "db")]
    pub db: Option<String>,

    /// Run in test mode (no config file update)
    #[arg(global = true, long = "test", hide = true)]
    pub test: bool,

    /// More diagnostics on stderr (-v debug, -vv trace)
    #[arg(global = true, short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    /// Only report errors on stderr
    #[arg(global = true, short = 'q', long = "quiet", conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and configuration
    Init,

    /// Manage the configuration file (view or edit)
    Config {
        #[arg(long = "print", help = "Print the effective configuration")]
        print_config: bool,

        #[arg(
            long = "edit",
            help = "Edit the configuration file (default editor: $EDITOR, or nano/notepad)"
        )]
        edit_config: bool,

        #[arg(long = "editor", help = "Editor to use (vim, nano, or custom path)")]
        editor: Option<String>,
    },

    /// Manage the database (migrations, integrity checks, etc.)
    Db {
        #[arg(long = "migrate", help = "Run pending database migrations")]
        migrate: bool,

        #[arg(long = "check", help = "Check database integrity")]
        check: bool,

        #[arg(long = "vacuum", help = "Optimize the database using VACUUM")]
        vacuum: bool,

        #[arg(long = "info", help = "Show database information")]
        info: bool,
    },

    /// Print the internal audit log
    Log {
        #[arg(long = "print", help = "Print rows from the internal log table")]
        print: bool,
    },

    /// Create a backup copy of the database
    Backup {
        #[arg(long, value_name = "FILE")]
        file: String,

        #[arg(long)]
        compress: bool,

        #[arg(long, short = 'f', help = "Overwrite an existing file without asking")]
        force: bool,
    },

    /// Simulate sensor sessions and store them
    Collect {
        #[arg(long, default_value_t = 1, help = "Number of sessions to simulate")]
        sessions: u32,

        #[arg(long, default_value_t = 30, help = "Simulated seconds per session")]
        duration: u32,

        #[arg(long, help = "Totem id (default: configured totem)")]
        totem: Option<String>,

        #[arg(long, help = "Seed for reproducible readings")]
        seed: Option<u64>,
    },

    /// Store a recorded session from a JSON array of raw events
    Ingest {
        #[arg(long, value_name = "FILE")]
        file: String,
    },

    /// Deduplicate, repair and normalize stored events
    Clean {
        #[arg(long, help = "Also delete data older than the retention period")]
        purge: bool,

        #[arg(long, value_name = "DAYS", help = "Retention period (default: configured)")]
        retention_days: Option<i64>,
    },

    /// Show the data quality report
    Quality {
        #[arg(long, help = "Print as JSON")]
        json: bool,
    },

    /// Statistical report over a recent window
    Report {
        #[arg(long, help = "Restrict to one totem")]
        totem: Option<String>,

        #[arg(long, help = "Window length in days (default: configured)")]
        days: Option<i64>,

        #[arg(long, help = "Print as JSON")]
        json: bool,
    },

    /// Per-totem summary of sessions, touches and scores
    Stats,

    /// Train the touch classifier and save it
    Train {
        #[arg(long, help = "Test fraction (default: configured)")]
        test_size: Option<f64>,

        #[arg(long, help = "Random seed (default: configured)")]
        seed: Option<u64>,

        #[arg(long, value_name = "PATH", help = "Model file (default: configured)")]
        model: Option<String>,
    },

    /// Classify a touch with the saved model
    Predict {
        #[arg(long, help = "Touch duration in seconds")]
        duration: f64,

        #[arg(long)]
        session_duration: Option<f64>,

        #[arg(long)]
        total_touches: Option<i64>,

        #[arg(long)]
        avg_light: Option<f64>,

        #[arg(long)]
        time_in_session: Option<f64>,

        #[arg(long, value_name = "PATH", help = "Model file (default: configured)")]
        model: Option<String>,
    },

    /// Export sensor events
    Export {
        #[arg(long, value_enum, default_value = "csv")]
        format: ExportFormat,

        #[arg(long, value_name = "FILE")]
        file: String,

        #[arg(
            long,
            value_name = "RANGE",
            help = "Filter by year/month/day or a custom range (start:end)"
        )]
        range: Option<String>,

        #[arg(long, short = 'f')]
        force: bool,
    },
}
