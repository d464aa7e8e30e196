//! Cross-process run lock.
//!
//! Two cleanups against the same database would scan the same groups and
//! race each other's deletes. [`with_run_lock`] takes an exclusive advisory
//! lock on a sidecar file next to the database for the duration of a run and
//! fails fast when another process already holds it.

use std::ffi::OsString;
use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};

use fd_lock::RwLock;
use thiserror::Error;

/// Suffix appended to the database path to form the lock file path.
pub const LOCK_SUFFIX: &str = ".rowdupe.lock";

/// Error type for run lock acquisition.
#[derive(Debug, Error)]
pub enum LockError {
    /// Another run holds the lock.
    #[error("another cleanup is already running (lock held on {0})")]
    Busy(PathBuf),

    /// The lock file could not be opened or locked.
    #[error("cannot lock {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Lock file path for a database.
#[must_use]
pub fn lock_path(database: &Path) -> PathBuf {
    let mut name = OsString::from(database.as_os_str());
    name.push(LOCK_SUFFIX);
    PathBuf::from(name)
}

/// Run `f` while holding the exclusive run lock for `database`.
///
/// The lock is released when `f` returns. The lock file itself is left in
/// place; its presence alone means nothing.
///
/// # Errors
///
/// Returns [`LockError::Busy`] without calling `f` if another holder exists.
pub fn with_run_lock<T>(database: &Path, f: impl FnOnce() -> T) -> Result<T, LockError> {
    let path = lock_path(database);
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&path)
        .map_err(|source| LockError::Io {
            path: path.clone(),
            source,
        })?;

    let mut lock = RwLock::new(file);
    let _guard = match lock.try_write() {
        Ok(guard) => guard,
        Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Err(LockError::Busy(path)),
        Err(source) => return Err(LockError::Io { path, source }),
    };
    log::debug!("Acquired run lock {}", path.display());

    Ok(f())
}
