//! Table and column names for the record table.
//!
//! SQL identifiers cannot be bound as parameters, so every name is checked
//! against a plain identifier pattern before it is spliced into a statement.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::StoreError;

static IDENTIFIER: OnceLock<Regex> = OnceLock::new();

fn identifier_pattern() -> &'static Regex {
    IDENTIFIER.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid")
    })
}

/// Check that `name` is usable as an unquoted SQL identifier.
///
/// # Errors
///
/// Returns [`StoreError::InvalidSchema`] if the name is empty or contains
/// anything other than ASCII letters, digits and underscores.
pub fn validate_identifier(name: &str) -> Result<(), StoreError> {
    if identifier_pattern().is_match(name) {
        Ok(())
    } else {
        Err(StoreError::InvalidSchema(name.to_string()))
    }
}

/// Names of the record table and the three columns the resolver reads.
///
/// Defaults match a WordPress posts table holding ACF field definitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableSchema {
    /// Table holding the records.
    pub table: String,
    /// Monotonically increasing identifier column.
    pub id_column: String,
    /// Natural key column.
    pub key_column: String,
    /// Kind discriminator column.
    pub kind_column: String,
}

impl Default for TableSchema {
    fn default() -> Self {
        Self {
            table: "wp_posts".to_string(),
            id_column: "ID".to_string(),
            key_column: "post_name".to_string(),
            kind_column: "post_type".to_string(),
        }
    }
}

impl TableSchema {
    /// Validate every name in the schema.
    ///
    /// # Errors
    ///
    /// Returns the first [`StoreError::InvalidSchema`] encountered.
    pub fn validate(&self) -> Result<(), StoreError> {
        for name in [
            &self.table,
            &self.id_column,
            &self.key_column,
            &self.kind_column,
        ] {
            validate_identifier(name)?;
        }
        Ok(())
    }

    /// Subquery selecting natural keys that occur more than once for kind `?1`.
    ///
    /// NULL keys are excluded: `IN` never matches them, so counting them here
    /// would report groups that no fetch or delete can reach.
    pub(crate) fn duplicate_keys_subquery(&self) -> String {
        format!(
            "SELECT {key} FROM {table} WHERE {kind} = ?1 AND {key} IS NOT NULL \
             GROUP BY {key} HAVING COUNT(*) > 1",
            key = self.key_column,
            table = self.table,
            kind = self.kind_column,
        )
    }

    pub(crate) fn count_groups_sql(&self) -> String {
        format!("SELECT COUNT(*) FROM ({})", self.duplicate_keys_subquery())
    }

    pub(crate) fn count_records_sql(&self) -> String {
        format!(
            "SELECT COUNT(*) FROM {table} WHERE {kind} = ?1 AND {key} IN ({sub})",
            table = self.table,
            kind = self.kind_column,
            key = self.key_column,
            sub = self.duplicate_keys_subquery(),
        )
    }

    pub(crate) fn fetch_sql(&self) -> String {
        format!(
            "SELECT {id}, {key} FROM {table} WHERE {kind} = ?1 AND {key} IN ({sub}) \
             ORDER BY {key}, {id}",
            id = self.id_column,
            key = self.key_column,
            table = self.table,
            kind = self.kind_column,
            sub = self.duplicate_keys_subquery(),
        )
    }

    pub(crate) fn max_id_sql(&self) -> String {
        format!(
            "SELECT MAX({id}) FROM {table} WHERE {kind} = ?1 AND {key} = ?2",
            id = self.id_column,
            table = self.table,
            kind = self.kind_column,
            key = self.key_column,
        )
    }

    pub(crate) fn delete_sql(&self) -> String {
        format!(
            "DELETE FROM {table} WHERE {kind} = ?1 AND {key} = ?2 AND {id} != ?3",
            table = self.table,
            kind = self.kind_column,
            key = self.key_column,
            id = self.id_column,
        )
    }
}
