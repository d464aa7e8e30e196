//! RowDupe - Duplicate Row Cleaner
//!
//! Finds records of one kind that share a natural key and deletes all but the
//! newest (highest identifier) of each, through an explicit [`store::RecordStore`].

pub mod cli;
pub mod config;
pub mod error;
pub mod lock;
pub mod logging;
pub mod output;
pub mod progress;
pub mod resolver;
pub mod signal;
pub mod store;

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::cli::{Cli, Commands, OutputFormat};
use crate::config::Config;
use crate::error::ExitCode;
use crate::progress::Progress;
use crate::resolver::{DuplicateResolver, ResolveReport};
use crate::store::SqliteStore;

/// Run the application, writing reports to stdout.
///
/// # Errors
///
/// Returns an error if configuration, storage or the run lock fail.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run_app_with_output(cli, &mut out)
}

/// Run the application, writing reports to `out`.
///
/// Logging, progress and errors still go to stderr.
///
/// # Errors
///
/// Returns an error if configuration, storage or the run lock fail.
pub fn run_app_with_output<W: Write>(cli: Cli, out: &mut W) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);
    if cli.no_color {
        yansi::disable();
    }

    let mut config =
        Config::load(cli.config.as_deref()).context("failed to load configuration")?;

    config.merge_store_args(cli.store_args());
    if let Commands::Clean(args) = &cli.command {
        config.merge_clean_args(args);
    }
    config.validate()?;
    log::debug!("Effective configuration: {:?}", config);

    match &cli.command {
        Commands::Count(args) => run_count(&config, args.output, out),
        Commands::Clean(args) => run_clean(&config, args.output, cli.quiet, out),
        Commands::Config(_) => {
            write!(out, "{}", config.to_toml()?)?;
            Ok(ExitCode::Success)
        }
    }
}

fn open_store(config: &Config) -> Result<SqliteStore> {
    let database = config.database()?;
    let store = SqliteStore::open(database, config.schema.clone())
        .with_context(|| format!("failed to open {}", database.display()))?;
    store.set_busy_timeout(config.busy_timeout())?;
    Ok(store)
}

fn run_count<W: Write>(config: &Config, format: OutputFormat, out: &mut W) -> Result<ExitCode> {
    let resolver = DuplicateResolver::new(open_store(config)?, config.resolver_config());
    let status = resolver.status()?;

    let exit_code = if status.has_duplicates() {
        ExitCode::Success
    } else {
        ExitCode::NoDuplicates
    };

    match format {
        OutputFormat::Text => output::text::write_count(out, &config.kind, &status)?,
        OutputFormat::Json => {
            let json = output::JsonCount::new(&config.kind, &status, exit_code);
            writeln!(out, "{}", output::json::to_json_pretty(&json)?)?;
        }
    }
    Ok(exit_code)
}

fn run_clean<W: Write>(
    config: &Config,
    format: OutputFormat,
    quiet: bool,
    out: &mut W,
) -> Result<ExitCode> {
    let database = config.database()?;
    let shutdown = signal::install_handler()?;
    let progress = Arc::new(Progress::new(quiet || format == OutputFormat::Json));

    let resolver_config = config
        .resolver_config()
        .with_shutdown_flag(shutdown.get_flag())
        .with_progress_callback(progress);
    let mut resolver = DuplicateResolver::new(open_store(config)?, resolver_config);

    let report = lock::with_run_lock(database, || resolver.resolve())??;
    let exit_code = clean_exit_code(&report);

    match format {
        OutputFormat::Text => output::text::write_clean(out, &report)?,
        OutputFormat::Json => {
            let json = output::JsonClean::new(&report, exit_code);
            writeln!(out, "{}", output::json::to_json_pretty(&json)?)?;
        }
    }
    Ok(exit_code)
}

/// Exit code for a finished cleanup.
#[must_use]
pub fn clean_exit_code(report: &ResolveReport) -> ExitCode {
    if report.interrupted {
        ExitCode::Interrupted
    } else if report.groups_found == 0 {
        ExitCode::NoDuplicates
    } else if !report.failures.is_empty() {
        ExitCode::PartialSuccess
    } else {
        ExitCode::Success
    }
}
