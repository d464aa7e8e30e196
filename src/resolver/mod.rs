//! Duplicate detection and resolution.
//!
//! # Overview
//!
//! [`DuplicateResolver`] owns a [`RecordStore`] and runs the two operations a
//! caller needs:
//!
//! 1. **Count** - how many natural keys have more than one record
//! 2. **Resolve** - for each such key, delete every record but the newest
//!
//! Groups are processed independently. A failed delete is recorded in the
//! [`ResolveReport`] and the run moves on to the next group; there is no
//! transaction spanning groups.
//!
//! # Example
//!
//! ```
//! use rowdupe::resolver::{DuplicateResolver, ResolverConfig};
//! use rowdupe::store::{MemoryStore, Record};
//!
//! let mut store = MemoryStore::new();
//! store.insert(1, "a", "acf-field");
//! store.insert(5, "a", "acf-field");
//! store.insert(3, "a", "acf-field");
//! store.insert(2, "b", "acf-field");
//!
//! let mut resolver = DuplicateResolver::new(store, ResolverConfig::default());
//! assert_eq!(resolver.count_duplicate_groups().unwrap(), 1);
//!
//! let report = resolver.resolve().unwrap();
//! assert_eq!(report.groups_resolved, 1);
//! assert_eq!(
//!     resolver.store().records("acf-field"),
//!     vec![Record::new(2, "b"), Record::new(5, "a")]
//! );
//! ```

pub mod groups;
pub mod report;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::progress::ProgressCallback;
use crate::store::{RecordStore, StoreError};

pub use groups::{group_by_key, DuplicateGroup};
pub use report::{DuplicateStatus, GroupFailure, ResolveReport};

/// Kind discriminator used when none is configured.
pub const DEFAULT_KIND: &str = "acf-field";

/// How each group's surplus records are deleted.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum DeleteStrategy {
    /// Re-check the newest id and delete in one write transaction.
    ///
    /// A group that gained a newer record since the scan is left untouched
    /// and reported as a concurrent modification.
    #[default]
    Atomic,
    /// Delete by the winner chosen at scan time, without re-checking.
    ///
    /// A record inserted for the key after the scan is deleted too.
    Snapshot,
}

impl std::fmt::Display for DeleteStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Atomic => write!(f, "atomic"),
            Self::Snapshot => write!(f, "snapshot"),
        }
    }
}

/// Error type for resolver operations that abort before any group is touched.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The duplicate scan could not be run.
    #[error("duplicate scan failed: {0}")]
    Scan(#[from] StoreError),
}

/// Configuration for [`DuplicateResolver`].
#[derive(Clone)]
pub struct ResolverConfig {
    /// Kind discriminator restricting every scan and delete.
    pub kind: String,
    /// Delete strategy for each group.
    pub strategy: DeleteStrategy,
    /// Optional shutdown flag, checked between groups.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for ResolverConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverConfig")
            .field("kind", &self.kind)
            .field("strategy", &self.strategy)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            kind: DEFAULT_KIND.to_string(),
            strategy: DeleteStrategy::default(),
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl ResolverConfig {
    /// Set the kind discriminator.
    #[must_use]
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    /// Set the delete strategy.
    #[must_use]
    pub fn with_strategy(mut self, strategy: DeleteStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Finds and removes duplicate records, keeping the newest per natural key.
///
/// The resolver is constructed explicitly around its store; there is no
/// shared global instance. [`resolve`](Self::resolve) takes `&mut self`, so
/// a single resolver can never run two resolutions at once.
#[derive(Debug)]
pub struct DuplicateResolver<S> {
    store: S,
    config: ResolverConfig,
}

impl<S: RecordStore> DuplicateResolver<S> {
    /// Create a resolver over `store`.
    #[must_use]
    pub fn new(store: S, config: ResolverConfig) -> Self {
        Self { store, config }
    }

    /// Create a resolver with the default configuration.
    #[must_use]
    pub fn with_defaults(store: S) -> Self {
        Self::new(store, ResolverConfig::default())
    }

    /// Resolver configuration.
    #[must_use]
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Underlying store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Underlying store, mutably.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Consume the resolver and return its store.
    #[must_use]
    pub fn into_store(self) -> S {
        self.store
    }

    /// Number of natural keys with more than one record of the configured kind.
    ///
    /// Returns 0 for an empty table. Never modifies storage.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Scan`] if the store cannot be queried.
    pub fn count_duplicate_groups(&self) -> Result<usize, ResolveError> {
        let groups = self.store.count_duplicate_groups(&self.config.kind)?;
        log::debug!(
            "Found {} duplicate group(s) of kind '{}'",
            groups,
            self.config.kind
        );
        Ok(groups)
    }

    /// Number of records of the configured kind that belong to a duplicate group.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Scan`] if the store cannot be queried.
    pub fn count_duplicate_records(&self) -> Result<usize, ResolveError> {
        Ok(self.store.count_duplicate_records(&self.config.kind)?)
    }

    /// Group and record counts together.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Scan`] if the store cannot be queried.
    pub fn status(&self) -> Result<DuplicateStatus, ResolveError> {
        Ok(DuplicateStatus {
            groups: self.count_duplicate_groups()?,
            records: self.count_duplicate_records()?,
        })
    }

    /// Delete every duplicate record except the newest per natural key.
    ///
    /// Groups are handled one at a time in key order. A group whose delete
    /// fails is recorded in [`ResolveReport::failures`] and the next group is
    /// still attempted. If the shutdown flag is raised, the run stops before
    /// the next group and the report is marked interrupted.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Scan`] if the duplicate records cannot be
    /// fetched; nothing has been deleted in that case.
    pub fn resolve(&mut self) -> Result<ResolveReport, ResolveError> {
        let start = Instant::now();
        let started_at = Utc::now();
        let kind = self.config.kind.clone();
        let progress = self.config.progress_callback.clone();

        let groups = group_by_key(self.store.fetch_duplicates(&kind)?);
        let mut report = ResolveReport::new(&kind, groups.len(), started_at);
        log::info!(
            "Resolving {} duplicate group(s) of kind '{}' ({} strategy)",
            groups.len(),
            kind,
            self.config.strategy
        );

        if let Some(ref callback) = progress {
            callback.on_start(groups.len());
        }

        for (index, group) in groups.iter().enumerate() {
            if self.config.is_shutdown_requested() {
                log::warn!(
                    "Shutdown requested, stopping before group {} of {}",
                    index + 1,
                    groups.len()
                );
                report.interrupted = true;
                break;
            }

            let Some(winner) = group.winner() else {
                continue;
            };

            if let Some(ref callback) = progress {
                callback.on_group(index + 1, &group.key);
            }
            log::trace!(
                "Group '{}': keeping id {}, {} surplus record(s) {:?}",
                group.key,
                winner,
                group.surplus(),
                group.losers()
            );

            let outcome = match self.config.strategy {
                DeleteStrategy::Atomic => {
                    self.store
                        .delete_others_if_latest(&kind, &group.key, winner)
                }
                DeleteStrategy::Snapshot => self.store.delete_others(&kind, &group.key, winner),
            };

            match outcome {
                Ok(deleted) => {
                    log::debug!(
                        "Kept id {} for '{}', deleted {} record(s)",
                        winner,
                        group.key,
                        deleted
                    );
                    report.groups_resolved += 1;
                    report.records_deleted += deleted;
                }
                Err(e) => {
                    log::warn!("Failed to resolve '{}': {}", group.key, e);
                    if let Some(ref callback) = progress {
                        callback.on_failure(&group.key, &e.to_string());
                    }
                    report.failures.push(GroupFailure {
                        key: group.key.clone(),
                        kept_id: winner,
                        kind: e.kind().to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }

        if let Some(ref callback) = progress {
            callback.on_finish();
        }

        report.duration = start.elapsed();
        log::info!("{}", report.summary());
        Ok(report)
    }
}
