//! Logging setup using the `log` facade and `env_logger` backend.
//!
//! Level precedence, highest first:
//!
//! 1. `RUST_LOG` environment variable
//! 2. `--quiet` (errors only)
//! 3. `--verbose` count (`-v` debug, `-vv` trace)
//! 4. info
//!
//! Logs go to stderr so that `--output json` on stdout stays machine-readable.

use std::env;
use std::io::Write;

use env_logger::{Builder, Target};
use log::LevelFilter;

/// Initialize logging from CLI verbosity flags.
///
/// Safe to call more than once; only the first call installs a logger.
/// With `-v` or in debug builds each line carries a timestamp and the
/// module path.
///
/// # Arguments
///
/// * `verbose` - Number of `-v` flags (0 = info, 1 = debug, 2+ = trace)
/// * `quiet` - If true, only errors are shown; wins over `verbose`
///
/// `RUST_LOG`, when set, replaces both arguments.
///
/// # Example
///
/// ```rust,no_run
/// rowdupe::logging::init_logging(1, false);
/// log::debug!("visible with -v");
/// ```
pub fn init_logging(verbose: u8, quiet: bool) {
    let mut builder = Builder::new();
    builder.target(Target::Stderr);

    let from_env = env::var("RUST_LOG").is_ok();
    if from_env {
        builder.parse_default_env();
    } else {
        builder.filter_level(determine_level(verbose, quiet));
    }

    let detailed = verbose > 0 || cfg!(debug_assertions);
    builder.format(move |buf, record| {
        let level = record.level();
        let style = buf.default_level_style(level);
        if detailed {
            writeln!(
                buf,
                "{} {style}{:<5}{style:#} [{}] {}",
                buf.timestamp_seconds(),
                level,
                record.target(),
                record.args()
            )
        } else {
            writeln!(buf, "{style}{:<5}{style:#} {}", level, record.args())
        }
    });

    if builder.try_init().is_ok() {
        log::debug!(
            "Logging initialized at {} (from RUST_LOG: {})",
            current_level_name(),
            from_env
        );
    }
}

/// Map CLI flags to a level filter.
///
/// # Arguments
///
/// * `verbose` - Number of `-v` flags
/// * `quiet` - If true, errors only
///
/// # Returns
///
/// `Error` when quiet, otherwise `Info`, `Debug` or `Trace` by verbosity.
fn determine_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Name of the current maximum log level.
///
/// # Returns
///
/// A lowercase level name such as `"info"`, for log lines and diagnostics.
#[must_use]
pub fn current_level_name() -> &'static str {
    match log::max_level() {
        LevelFilter::Off => "off",
        LevelFilter::Error => "error",
        LevelFilter::Warn => "warn",
        LevelFilter::Info => "info",
        LevelFilter::Debug => "debug",
        LevelFilter::Trace => "trace",
    }
}
