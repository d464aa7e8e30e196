//! Signal handling for graceful shutdown.
//!
//! Ctrl+C sets a shared `AtomicBool`. The resolver checks it between groups,
//! so a cleanup stops at a group boundary instead of mid-delete.
//!
//! ```rust,no_run
//! use rowdupe::resolver::ResolverConfig;
//! use rowdupe::signal::install_handler;
//!
//! let handler = install_handler().expect("Failed to install signal handler");
//! let config = ResolverConfig::default().with_shutdown_flag(handler.get_flag());
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Exit code for SIGINT (Ctrl+C) interruption (128 + SIGINT).
pub const EXIT_CODE_INTERRUPTED: i32 = 130;

/// Shared shutdown flag set on Ctrl+C.
///
/// Cloning the handler shares the flag; every clone observes the same
/// shutdown request.
///
/// # Example
///
/// ```
/// use rowdupe::signal::ShutdownHandler;
///
/// let handler = ShutdownHandler::new();
/// let observer = handler.clone();
///
/// handler.request_shutdown();
/// assert!(observer.is_shutdown_requested());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandler {
    /// Create a handler with no shutdown requested.
    ///
    /// The handler is not hooked to Ctrl+C; use [`install_handler`] for that.
    ///
    /// # Returns
    ///
    /// A new `ShutdownHandler` with its flag cleared.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if shutdown has been requested.
    ///
    /// # Returns
    ///
    /// `true` if Ctrl+C was pressed or `request_shutdown()` was called since
    /// the last `reset()`.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Manually request a shutdown.
    ///
    /// The resolver sees the request before its next group and stops there.
    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Get a clone of the shutdown flag.
    ///
    /// This is how the signal reaches [`DuplicateResolver`](crate::resolver::DuplicateResolver).
    ///
    /// # Returns
    ///
    /// An `Arc<AtomicBool>` shared with this handler.
    ///
    /// # Example
    ///
    /// ```
    /// use rowdupe::resolver::ResolverConfig;
    /// use rowdupe::signal::ShutdownHandler;
    ///
    /// let handler = ShutdownHandler::new();
    /// let config = ResolverConfig::default().with_shutdown_flag(handler.get_flag());
    /// assert!(config.shutdown_flag.is_some());
    /// ```
    #[must_use]
    pub fn get_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    /// Reset the shutdown flag to `false`.
    ///
    /// Used when one process runs several cleanups, so an earlier interrupt
    /// does not stop the next run.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Error type for signal handler installation.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// Failed to install the Ctrl+C handler.
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

static GLOBAL_HANDLER: OnceLock<ShutdownHandler> = OnceLock::new();

/// Install a Ctrl+C handler that raises the shutdown flag.
///
/// The process-wide hook is installed once. Later calls (for example from
/// tests that call `run_app` repeatedly) get the same handler back with its
/// flag cleared.
///
/// # Returns
///
/// The process-wide `ShutdownHandler`, with no shutdown requested.
///
/// # Errors
///
/// Returns [`SignalError::InstallFailed`] if the platform hook cannot be
/// registered.
///
/// # Example
///
/// ```rust,no_run
/// use rowdupe::signal::install_handler;
///
/// let first = install_handler().unwrap();
/// let second = install_handler().unwrap();
/// first.request_shutdown();
/// assert!(second.is_shutdown_requested());
/// ```
pub fn install_handler() -> Result<ShutdownHandler, SignalError> {
    if let Some(handler) = GLOBAL_HANDLER.get() {
        handler.reset();
        return Ok(handler.clone());
    }

    let handler = ShutdownHandler::new();
    let flag = handler.get_flag();

    let installed = ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
        let _ = writeln!(
            std::io::stderr(),
            "\nInterrupted. Finishing current group..."
        );
        let _ = std::io::stderr().flush();
        log::info!("Shutdown signal received");
    });

    match installed {
        Ok(()) => {
            let _ = GLOBAL_HANDLER.set(handler.clone());
            Ok(handler)
        }
        // Another thread won the race to install the hook; share its handler
        // once published, otherwise fall back to an unhooked one.
        Err(ctrlc::Error::MultipleHandlers) => {
            log::debug!("Ctrl+C handler already registered, reusing shared handler");
            let shared = GLOBAL_HANDLER.get_or_init(|| handler).clone();
            shared.reset();
            Ok(shared)
        }
        Err(e) => Err(SignalError::InstallFailed(e)),
    }
}
