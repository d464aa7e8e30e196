//! Structured error handling and exit codes.

use serde::Serialize;

use crate::lock::LockError;
use crate::signal::EXIT_CODE_INTERRUPTED;

/// Exit codes for the RowDupe application.
///
/// - 0: Success (duplicates reported, or every group resolved)
/// - 1: General error (unexpected failure)
/// - 2: No duplicates found
/// - 3: Partial success (some groups failed to resolve)
/// - 4: Locked (another cleanup holds the run lock)
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: duplicates were found (count) or all resolved (clean).
    Success = 0,
    /// General error: An unexpected error occurred.
    GeneralError = 1,
    /// No duplicates: the table holds no duplicate groups.
    NoDuplicates = 2,
    /// Partial success: some groups could not be resolved.
    PartialSuccess = 3,
    /// Locked: another cleanup is running against the same database.
    Locked = 4,
    /// Interrupted: cleanup was interrupted by user (Ctrl+C).
    Interrupted = EXIT_CODE_INTERRUPTED as isize,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "RW000",
            Self::GeneralError => "RW001",
            Self::NoDuplicates => "RW002",
            Self::PartialSuccess => "RW003",
            Self::Locked => "RW004",
            Self::Interrupted => "RW130",
        }
    }

    /// Pick the exit code for an error that escaped `run_app`.
    #[must_use]
    pub fn for_error(err: &anyhow::Error) -> Self {
        if err
            .downcast_ref::<LockError>()
            .is_some_and(|e| matches!(e, LockError::Busy(_)))
        {
            Self::Locked
        } else {
            Self::GeneralError
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "RW001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message, including its causes
    pub message: String,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
        }
    }
}
