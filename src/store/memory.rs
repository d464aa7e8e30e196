//! In-process record store.
//!
//! Keeps rows in a `Vec` and answers the same questions as the SQLite store.
//! Useful for embedding the resolver over data that is already in memory and
//! for exercising it in tests without a database file.

use std::collections::HashMap;

use super::{Record, RecordId, RecordStore, StoreError, StoreResult};

#[derive(Debug, Clone)]
struct Row {
    id: RecordId,
    key: String,
    kind: String,
}

/// Record store backed by a vector of rows.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    rows: Vec<Row>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row.
    pub fn insert(&mut self, id: RecordId, key: impl Into<String>, kind: impl Into<String>) {
        self.rows.push(Row {
            id,
            key: key.into(),
            kind: kind.into(),
        });
    }

    /// Records of `kind`, ordered by id.
    #[must_use]
    pub fn records(&self, kind: &str) -> Vec<Record> {
        let mut records: Vec<Record> = self
            .rows
            .iter()
            .filter(|row| row.kind == kind)
            .map(|row| Record::new(row.id, row.key.clone()))
            .collect();
        records.sort_by_key(|r| r.id);
        records
    }

    /// Total number of rows of any kind.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the store holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn key_counts(&self, kind: &str) -> HashMap<&str, usize> {
        let mut counts = HashMap::new();
        for row in self.rows.iter().filter(|row| row.kind == kind) {
            *counts.entry(row.key.as_str()).or_insert(0) += 1;
        }
        counts
    }

    fn retain_except(&mut self, kind: &str, key: &str, keep: RecordId) -> usize {
        let before = self.rows.len();
        self.rows
            .retain(|row| !(row.kind == kind && row.key == key && row.id != keep));
        before - self.rows.len()
    }
}

impl RecordStore for MemoryStore {
    fn count_duplicate_groups(&self, kind: &str) -> StoreResult<usize> {
        Ok(self.key_counts(kind).values().filter(|&&n| n > 1).count())
    }

    fn count_duplicate_records(&self, kind: &str) -> StoreResult<usize> {
        Ok(self.key_counts(kind).values().filter(|&&n| n > 1).sum())
    }

    fn fetch_duplicates(&self, kind: &str) -> StoreResult<Vec<Record>> {
        let counts = self.key_counts(kind);
        let mut records: Vec<Record> = self
            .rows
            .iter()
            .filter(|row| row.kind == kind && counts.get(row.key.as_str()).is_some_and(|&n| n > 1))
            .map(|row| Record::new(row.id, row.key.clone()))
            .collect();
        records.sort_by(|a, b| a.key.cmp(&b.key).then(a.id.cmp(&b.id)));
        Ok(records)
    }

    fn delete_others(&mut self, kind: &str, key: &str, keep: RecordId) -> StoreResult<usize> {
        Ok(self.retain_except(kind, key, keep))
    }

    fn delete_others_if_latest(
        &mut self,
        kind: &str,
        key: &str,
        keep: RecordId,
    ) -> StoreResult<usize> {
        let newest = self
            .rows
            .iter()
            .filter(|row| row.kind == kind && row.key == key)
            .map(|row| row.id)
            .max();
        if newest != Some(keep) {
            return Err(StoreError::ConcurrentModification {
                key: key.to_string(),
                expected: keep,
                found: newest,
            });
        }
        Ok(self.retain_except(kind, key, keep))
    }
}
