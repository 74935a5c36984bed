//! Database trait definition

use crate::error::{DbError, DbResult};
use crate::value::{Row, Value};
use cz_core::{ColumnName, TableName};

/// Conflict resolution for [`Database::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictPolicy {
    #[default]
    Abort,
    Fail,
    Ignore,
    Replace,
    Rollback,
}

impl ConflictPolicy {
    pub fn as_sql(&self) -> &'static str {
        match self {
            ConflictPolicy::Abort => "ABORT",
            ConflictPolicy::Fail => "FAIL",
            ConflictPolicy::Ignore => "IGNORE",
            ConflictPolicy::Replace => "REPLACE",
            ConflictPolicy::Rollback => "ROLLBACK",
        }
    }
}

/// Database handle the migration core is written against.
///
/// Synchronous by design: migrations run to completion on the opening
/// connection before anything else may touch the store.
pub trait Database {
    /// Execute one DDL/DML statement, returning affected rows
    fn execute(&self, sql: &str) -> DbResult<usize>;

    /// Execute multiple SQL statements, discarding any result rows
    fn execute_batch(&self, sql: &str) -> DbResult<()>;

    /// Run a query and collect every row
    fn query(&self, sql: &str) -> DbResult<Vec<Row>>;

    /// Insert one row, returning the rowid of the inserted row
    fn insert(
        &self,
        table: &TableName,
        conflict: ConflictPolicy,
        values: &[(ColumnName, Value)],
    ) -> DbResult<i64>;

    /// Whether an explicit transaction is open on this connection
    fn in_transaction(&self) -> bool;

    /// Database type identifier for logging
    fn db_type(&self) -> &'static str;

    /// First column of the first row, if any
    fn query_value(&self, sql: &str) -> DbResult<Option<Value>> {
        Ok(self
            .query(sql)?
            .into_iter()
            .next()
            .and_then(|row| row.get(0).cloned()))
    }
}

/// Execute `body` within a `BEGIN IMMEDIATE` / `COMMIT` transaction on `db`,
/// rolling back on error.
pub fn with_transaction<T, E, F>(db: &dyn Database, body: F) -> Result<T, E>
where
    F: FnOnce() -> Result<T, E>,
    E: From<DbError>,
{
    db.execute_batch("BEGIN IMMEDIATE")?;
    match body() {
        Ok(value) => {
            if let Err(commit_err) = db.execute_batch("COMMIT") {
                if let Err(rollback_err) = db.execute_batch("ROLLBACK") {
                    log::warn!("ROLLBACK after failed COMMIT also failed: {rollback_err}");
                }
                return Err(commit_err.into());
            }
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = db.execute_batch("ROLLBACK") {
                log::warn!("ROLLBACK failed: {rollback_err}");
            }
            Err(e)
        }
    }
}
