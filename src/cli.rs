//! Command-line interface definitions for RowDupe.
//!
//! Global options (verbosity, color, config file) apply to every subcommand.
//! Store options pick the database, table and kind; anything left out falls
//! back to the config file, then `ROWDUPE_*` environment variables, then the
//! built-in defaults.
//!
//! # Example
//!
//! ```bash
//! # How many duplicate ACF fields are there?
//! rowdupe count --database site.db
//!
//! # Remove them, keeping the newest of each
//! rowdupe clean --database site.db
//!
//! # Another table layout, JSON report
//! rowdupe clean --database app.db --table items --id-column id \
//!     --key-column slug --kind-column type --kind import --output json
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::resolver::DeleteStrategy;

/// Remove duplicate rows sharing a natural key, keeping the newest.
///
/// RowDupe finds records of one kind that share a natural key and deletes all
/// but the one with the highest identifier.
#[derive(Debug, Parser)]
#[command(name = "rowdupe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Print errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Configuration file (TOML)
    ///
    /// Defaults to the platform config directory, e.g.
    /// ~/.config/rowdupe/config.toml on Linux.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for RowDupe.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Report how many duplicate groups exist (read-only)
    Count(CountArgs),
    /// Delete all but the newest record of every duplicate group
    Clean(CleanArgs),
    /// Print the effective configuration as TOML
    Config(StoreArgs),
}

/// Options selecting the database, table layout and record kind.
#[derive(Debug, Clone, Default, Args)]
pub struct StoreArgs {
    /// SQLite database file
    #[arg(short, long, value_name = "PATH")]
    pub database: Option<PathBuf>,

    /// Table holding the records
    #[arg(long, value_name = "NAME")]
    pub table: Option<String>,

    /// Identifier column (strictly increasing with creation)
    #[arg(long, value_name = "NAME")]
    pub id_column: Option<String>,

    /// Natural key column
    #[arg(long, value_name = "NAME")]
    pub key_column: Option<String>,

    /// Kind discriminator column
    #[arg(long, value_name = "NAME")]
    pub kind_column: Option<String>,

    /// Kind value to restrict the scan to
    #[arg(short, long, value_name = "KIND")]
    pub kind: Option<String>,

    /// Milliseconds to wait on a locked database
    #[arg(long, value_name = "MS")]
    pub busy_timeout_ms: Option<u64>,
}

/// Arguments for the count subcommand.
#[derive(Debug, Args)]
pub struct CountArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the clean subcommand.
#[derive(Debug, Args)]
pub struct CleanArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// How each group is deleted
    ///
    /// atomic re-checks the newest id inside a write transaction and skips
    /// groups that changed since the scan; snapshot deletes by the winner
    /// chosen at scan time.
    #[arg(long, value_enum, value_name = "STRATEGY")]
    pub strategy: Option<DeleteStrategy>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Output format for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON for scripting
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl Cli {
    /// Store options of whichever subcommand was given.
    #[must_use]
    pub fn store_args(&self) -> &StoreArgs {
        match &self.command {
            Commands::Count(args) => &args.store,
            Commands::Clean(args) => &args.store,
            Commands::Config(args) => args,
        }
    }
}
