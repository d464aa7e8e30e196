//! Record storage for duplicate resolution.
//!
//! The resolver never touches a database handle directly. It talks to a
//! [`RecordStore`], which knows how to run the grouped duplicate scan and the
//! key-scoped delete against some backing table.
//!
//! # Implementations
//!
//! * [`SqliteStore`]: rusqlite connection over a file or in-memory database.
//! * [`MemoryStore`]: plain in-process table, handy for embedding and tests.
//!
//! # Example
//!
//! ```
//! use rowdupe::store::{MemoryStore, RecordStore};
//!
//! let mut store = MemoryStore::new();
//! store.insert(1, "field_a", "acf-field");
//! store.insert(2, "field_a", "acf-field");
//! store.insert(3, "field_b", "acf-field");
//!
//! assert_eq!(store.count_duplicate_groups("acf-field").unwrap(), 1);
//! ```

pub mod memory;
pub mod schema;
pub mod sqlite;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use memory::MemoryStore;
pub use schema::{validate_identifier, TableSchema};
pub use sqlite::SqliteStore;

/// Row identifier. Strictly increasing with creation order.
pub type RecordId = i64;

/// A single row as seen by the resolver.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
    /// Identifier, used as the recency order.
    pub id: RecordId,
    /// Natural key shared by duplicates.
    pub key: String,
}

impl Record {
    /// Create a new record.
    #[must_use]
    pub fn new(id: RecordId, key: impl Into<String>) -> Self {
        Self {
            id,
            key: key.into(),
        }
    }
}

/// Error type for storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The database could not be opened or configured.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// A statement failed to prepare or execute.
    #[error("query failed: {0}")]
    Query(#[from] rusqlite::Error),

    /// A newer record appeared for the key between scan and delete.
    #[error("concurrent modification of '{key}': expected newest id {expected}, found {found:?}")]
    ConcurrentModification {
        /// Natural key of the group
        key: String,
        /// Winner chosen at scan time
        expected: RecordId,
        /// Newest id at delete time
        found: Option<RecordId>,
    },

    /// A table or column name is not a plain SQL identifier.
    #[error("invalid SQL identifier: '{0}'")]
    InvalidSchema(String),
}

impl StoreError {
    /// Short machine-readable name of the error kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unavailable(_) | Self::Query(_) => "storage_unavailable",
            Self::ConcurrentModification { .. } => "concurrent_modification",
            Self::InvalidSchema(_) => "invalid_schema",
        }
    }
}

/// Result alias for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Backing table the resolver reads from and deletes in.
///
/// Every operation is restricted to records whose kind discriminator equals
/// `kind`. Records of other kinds are invisible, even when they share a key.
pub trait RecordStore {
    /// Number of natural keys with more than one record.
    fn count_duplicate_groups(&self, kind: &str) -> StoreResult<usize>;

    /// Number of records belonging to some duplicate group.
    fn count_duplicate_records(&self, kind: &str) -> StoreResult<usize>;

    /// All records belonging to some duplicate group, ordered by key then id.
    fn fetch_duplicates(&self, kind: &str) -> StoreResult<Vec<Record>>;

    /// Delete every record with `key` whose id is not `keep`.
    ///
    /// Returns the number of records deleted.
    fn delete_others(&mut self, kind: &str, key: &str, keep: RecordId) -> StoreResult<usize>;

    /// Like [`delete_others`](Self::delete_others), but only if `keep` is
    /// still the newest record for `key`; the check and the delete are atomic.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ConcurrentModification`] and deletes nothing if
    /// the newest id differs from `keep`.
    fn delete_others_if_latest(
        &mut self,
        kind: &str,
        key: &str,
        keep: RecordId,
    ) -> StoreResult<usize>;
}
