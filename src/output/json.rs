//! JSON output for count and clean reports.
//!
//! # Output Schema
//!
//! `rowdupe count --output json`:
//!
//! ```json
//! {
//!   "kind": "acf-field",
//!   "duplicate_groups": 2,
//!   "duplicate_records": 5,
//!   "surplus_records": 3,
//!   "exit_code": 0,
//!   "exit_code_name": "RW000"
//! }
//! ```
//!
//! `rowdupe clean --output json`:
//!
//! ```json
//! {
//!   "kind": "acf-field",
//!   "groups_found": 2,
//!   "groups_resolved": 1,
//!   "groups_failed": 1,
//!   "records_deleted": 2,
//!   "failures": [
//!     { "key": "field_a", "kept_id": 9, "kind": "concurrent_modification", "message": "..." }
//!   ],
//!   "interrupted": false,
//!   "started_at": "2024-05-01T12:00:00Z",
//!   "duration_ms": 12,
//!   "exit_code": 3,
//!   "exit_code_name": "RW003"
//! }
//! ```

use serde::Serialize;

use crate::error::ExitCode;
use crate::resolver::{DuplicateStatus, ResolveReport};

/// JSON form of a duplicate count.
#[derive(Debug, Clone, Serialize)]
pub struct JsonCount {
    /// Kind discriminator the count was scoped to
    pub kind: String,
    /// Natural keys with more than one record
    pub duplicate_groups: usize,
    /// Records belonging to those keys
    pub duplicate_records: usize,
    /// Records a cleanup would delete
    pub surplus_records: usize,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "RW000")
    pub exit_code_name: String,
}

impl JsonCount {
    /// Build from a status snapshot.
    #[must_use]
    pub fn new(kind: &str, status: &DuplicateStatus, exit_code: ExitCode) -> Self {
        Self {
            kind: kind.to_string(),
            duplicate_groups: status.groups,
            duplicate_records: status.records,
            surplus_records: status.surplus(),
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }
}

/// JSON form of a cleanup report.
#[derive(Debug, Clone, Serialize)]
pub struct JsonClean<'a> {
    #[serde(flatten)]
    report: &'a ResolveReport,
    /// Number of groups whose deletion failed
    pub groups_failed: usize,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name
    pub exit_code_name: String,
}

impl<'a> JsonClean<'a> {
    /// Wrap a report with its exit code.
    #[must_use]
    pub fn new(report: &'a ResolveReport, exit_code: ExitCode) -> Self {
        Self {
            report,
            groups_failed: report.groups_failed(),
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }
}

/// Serialize any output value as pretty JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_json_pretty<T: Serialize>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(value)
}
