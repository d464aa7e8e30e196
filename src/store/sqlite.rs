//! SQLite-backed record store.

use std::path::Path;
use std::time::Duration;

use rusqlite::{params, Connection, OpenFlags, OptionalExtension, TransactionBehavior};

use super::{Record, RecordId, RecordStore, StoreError, StoreResult, TableSchema};

/// Default time to wait on a locked database before failing.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Record store over a SQLite database.
pub struct SqliteStore {
    conn: Connection,
    schema: TableSchema,
}

impl SqliteStore {
    /// Open an existing database file.
    ///
    /// The file must already exist; a missing database is reported as
    /// [`StoreError::Unavailable`] rather than silently created empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema is invalid or the file cannot be opened.
    pub fn open(path: &Path, schema: TableSchema) -> StoreResult<Self> {
        schema.validate()?;
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags).map_err(|e| {
            StoreError::Unavailable(format!("cannot open {}: {}", path.display(), e))
        })?;
        log::debug!("Opened record store at {}", path.display());
        Self::with_connection(conn, schema)
    }

    /// Open a private in-memory database.
    ///
    /// The table is not created; call [`create_table`](Self::create_table)
    /// or run your own DDL through [`connection`](Self::connection).
    ///
    /// # Errors
    ///
    /// Returns an error if the schema is invalid.
    pub fn open_in_memory(schema: TableSchema) -> StoreResult<Self> {
        schema.validate()?;
        let conn = Connection::open_in_memory()
            .map_err(|e| StoreError::Unavailable(format!("cannot open in-memory database: {e}")))?;
        Self::with_connection(conn, schema)
    }

    /// Wrap an already open connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema is invalid or the busy timeout cannot
    /// be set.
    pub fn with_connection(conn: Connection, schema: TableSchema) -> StoreResult<Self> {
        schema.validate()?;
        conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)?;
        Ok(Self { conn, schema })
    }

    /// Change how long statements wait on a locked database.
    ///
    /// # Errors
    ///
    /// Returns an error if SQLite rejects the setting.
    pub fn set_busy_timeout(&self, timeout: Duration) -> StoreResult<()> {
        self.conn.busy_timeout(timeout)?;
        Ok(())
    }

    /// Create the record table if it does not exist.
    ///
    /// Only the three columns the resolver needs are created.
    ///
    /// # Errors
    ///
    /// Returns an error if the DDL fails.
    pub fn create_table(&self) -> StoreResult<()> {
        let ddl = format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                {id} INTEGER PRIMARY KEY AUTOINCREMENT,
                {key} TEXT NOT NULL,
                {kind} TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS {table}_{kind}_{key}_idx ON {table} ({kind}, {key});",
            table = self.schema.table,
            id = self.schema.id_column,
            key = self.schema.key_column,
            kind = self.schema.kind_column,
        );
        self.conn.execute_batch(&ddl)?;
        Ok(())
    }

    /// Insert a record with an explicit id.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails (for example, a duplicate id).
    pub fn insert(&self, id: RecordId, key: &str, kind: &str) -> StoreResult<()> {
        let sql = format!(
            "INSERT INTO {} ({}, {}, {}) VALUES (?1, ?2, ?3)",
            self.schema.table, self.schema.id_column, self.schema.key_column, self.schema.kind_column
        );
        self.conn.execute(&sql, params![id, key, kind])?;
        Ok(())
    }

    /// Every record of `kind`, ordered by id. Mostly useful for inspection.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn all_records(&self, kind: &str) -> StoreResult<Vec<Record>> {
        let sql = format!(
            "SELECT {id}, {key} FROM {table} WHERE {kind} = ?1 ORDER BY {id}",
            id = self.schema.id_column,
            key = self.schema.key_column,
            table = self.schema.table,
            kind = self.schema.kind_column,
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![kind], |row| {
            Ok(Record::new(row.get(0)?, row.get::<_, String>(1)?))
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Underlying connection.
    #[must_use]
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn count(&self, sql: &str, kind: &str) -> StoreResult<usize> {
        let count: i64 = self.conn.query_row(sql, params![kind], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }
}

impl RecordStore for SqliteStore {
    fn count_duplicate_groups(&self, kind: &str) -> StoreResult<usize> {
        self.count(&self.schema.count_groups_sql(), kind)
    }

    fn count_duplicate_records(&self, kind: &str) -> StoreResult<usize> {
        self.count(&self.schema.count_records_sql(), kind)
    }

    fn fetch_duplicates(&self, kind: &str) -> StoreResult<Vec<Record>> {
        let mut stmt = self.conn.prepare(&self.schema.fetch_sql())?;
        let rows = stmt.query_map(params![kind], |row| {
            Ok(Record::new(row.get(0)?, row.get::<_, String>(1)?))
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn delete_others(&mut self, kind: &str, key: &str, keep: RecordId) -> StoreResult<usize> {
        let deleted = self
            .conn
            .execute(&self.schema.delete_sql(), params![kind, key, keep])?;
        Ok(deleted)
    }

    fn delete_others_if_latest(
        &mut self,
        kind: &str,
        key: &str,
        keep: RecordId,
    ) -> StoreResult<usize> {
        let max_sql = self.schema.max_id_sql();
        let delete_sql = self.schema.delete_sql();

        // IMMEDIATE takes the write lock up front so no writer can slip a
        // newer row in between the check and the delete.
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let newest: Option<RecordId> = tx
            .query_row(&max_sql, params![kind, key], |row| row.get(0))
            .optional()?
            .flatten();

        if newest != Some(keep) {
            // Dropping the transaction rolls it back.
            return Err(StoreError::ConcurrentModification {
                key: key.to_string(),
                expected: keep,
                found: newest,
            });
        }

        let deleted = tx.execute(&delete_sql, params![kind, key, keep])?;
        tx.commit()?;
        Ok(deleted)
    }
}
