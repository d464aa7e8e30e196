//! Duplicate grouping and winner selection.
//!
//! # Overview
//!
//! The store hands back a flat list of records whose natural key occurs more
//! than once. This module partitions that list into [`DuplicateGroup`]s, one
//! per key, and decides which record of each group survives: the one with the
//! highest identifier.
//!
//! # Example
//!
//! ```
//! use rowdupe::resolver::group_by_key;
//! use rowdupe::store::Record;
//!
//! let records = vec![
//!     Record::new(1, "a"),
//!     Record::new(5, "a"),
//!     Record::new(3, "a"),
//!     Record::new(2, "b"),
//! ];
//!
//! let groups = group_by_key(records);
//!
//! // "b" has a single record, so it is not a duplicate group
//! assert_eq!(groups.len(), 1);
//! assert_eq!(groups[0].key, "a");
//! assert_eq!(groups[0].winner(), Some(5));
//! assert_eq!(groups[0].losers(), vec![1, 3]);
//! ```

use std::collections::BTreeMap;

use serde::Serialize;

use crate::store::{Record, RecordId};

/// Records sharing one natural key, materialized only when there are 2+.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    /// Natural key shared by every record in the group.
    pub key: String,
    /// Identifiers in the order they were fetched.
    pub ids: Vec<RecordId>,
}

impl DuplicateGroup {
    /// Create a group from a key and its identifiers.
    #[must_use]
    pub fn new(key: impl Into<String>, ids: Vec<RecordId>) -> Self {
        Self {
            key: key.into(),
            ids,
        }
    }

    /// Number of records in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Identifier of the record that survives resolution.
    ///
    /// This is the maximum identifier. If several records carry that same
    /// maximum, the first one encountered is kept; deletion is by identifier
    /// inequality, so the others with the same value survive with it.
    #[must_use]
    pub fn winner(&self) -> Option<RecordId> {
        let mut best: Option<RecordId> = None;
        for &id in &self.ids {
            if best.is_none_or(|b| id > b) {
                best = Some(id);
            }
        }
        best
    }

    /// Identifiers that resolution removes, in fetch order.
    #[must_use]
    pub fn losers(&self) -> Vec<RecordId> {
        match self.winner() {
            Some(winner) => self.ids.iter().copied().filter(|&id| id != winner).collect(),
            None => Vec::new(),
        }
    }

    /// Number of records resolution removes.
    #[must_use]
    pub fn surplus(&self) -> usize {
        self.losers().len()
    }
}

/// Partition records into duplicate groups keyed by natural key.
///
/// Groups come back sorted by key. Keys with a single record are dropped, so
/// the function is safe to call on an unfiltered record list too.
#[must_use]
pub fn group_by_key(records: Vec<Record>) -> Vec<DuplicateGroup> {
    let mut by_key: BTreeMap<String, Vec<RecordId>> = BTreeMap::new();
    for record in records {
        by_key.entry(record.key).or_default().push(record.id);
    }

    by_key
        .into_iter()
        .filter(|(_, ids)| ids.len() > 1)
        .map(|(key, ids)| DuplicateGroup::new(key, ids))
        .collect()
}
