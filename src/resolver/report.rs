//! Outcome of a count or a cleanup run.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::store::RecordId;

/// Read-only snapshot of duplicate state for one kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DuplicateStatus {
    /// Natural keys with more than one record.
    pub groups: usize,
    /// Records belonging to those keys.
    pub records: usize,
}

impl DuplicateStatus {
    /// Records a cleanup would delete (all but one per group).
    #[must_use]
    pub fn surplus(&self) -> usize {
        self.records.saturating_sub(self.groups)
    }

    /// Check if there is anything to clean.
    #[must_use]
    pub fn has_duplicates(&self) -> bool {
        self.groups > 0
    }
}

/// A group whose deletion failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupFailure {
    /// Natural key of the group.
    pub key: String,
    /// Identifier that was meant to survive.
    pub kept_id: RecordId,
    /// Machine-readable error kind.
    pub kind: String,
    /// Human-readable error message.
    pub message: String,
}

/// Result of [`DuplicateResolver::resolve`](super::DuplicateResolver::resolve).
#[derive(Debug, Clone, Serialize)]
pub struct ResolveReport {
    /// Kind discriminator the run was scoped to.
    pub kind: String,
    /// Duplicate groups found by the scan.
    pub groups_found: usize,
    /// Groups whose surplus records were deleted.
    pub groups_resolved: usize,
    /// Records deleted across all groups.
    pub records_deleted: usize,
    /// Groups whose deletion failed.
    pub failures: Vec<GroupFailure>,
    /// Whether the run stopped early on a shutdown request.
    pub interrupted: bool,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// Wall-clock duration of the run.
    #[serde(serialize_with = "serialize_millis", rename = "duration_ms")]
    pub duration: Duration,
}

impl ResolveReport {
    pub(crate) fn new(kind: &str, groups_found: usize, started_at: DateTime<Utc>) -> Self {
        Self {
            kind: kind.to_string(),
            groups_found,
            groups_resolved: 0,
            records_deleted: 0,
            failures: Vec::new(),
            interrupted: false,
            started_at,
            duration: Duration::ZERO,
        }
    }

    /// Number of groups whose deletion failed.
    #[must_use]
    pub fn groups_failed(&self) -> usize {
        self.failures.len()
    }

    /// Groups neither resolved nor failed (skipped after an interrupt).
    #[must_use]
    pub fn groups_skipped(&self) -> usize {
        self.groups_found
            .saturating_sub(self.groups_resolved + self.groups_failed())
    }

    /// Check if every group found was resolved.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.interrupted && self.failures.is_empty() && self.groups_resolved == self.groups_found
    }

    /// Human-readable summary of the run.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.groups_found == 0 {
            return "No duplicate groups found".to_string();
        }
        let mut text = format!(
            "Resolved {} of {} group(s), deleted {} record(s)",
            self.groups_resolved, self.groups_found, self.records_deleted
        );
        if !self.failures.is_empty() {
            text.push_str(&format!(", {} failed", self.failures.len()));
        }
        if self.interrupted {
            text.push_str(&format!(", {} skipped (interrupted)", self.groups_skipped()));
        }
        text
    }
}

fn serialize_millis<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
}
