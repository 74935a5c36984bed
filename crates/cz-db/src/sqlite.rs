//! SQLite database backend implementation

use crate::error::{DbError, DbResult};
use crate::traits::{ConflictPolicy, Database};
use crate::value::{Row, Value};
use cz_core::{ColumnName, TableName};
use rusqlite::Connection;
use std::path::{Path, PathBuf};

/// SQLite database backend
///
/// Owns one connection. Single-threaded; no `Mutex` needed because the
/// connection is only used by the open sequence and then handed to its
/// owner.
pub struct SqliteBackend {
    conn: Connection,
    path: Option<PathBuf>,
}

impl SqliteBackend {
    /// Create a new in-memory SQLite connection
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self { conn, path: None })
    }

    /// Create a new SQLite connection from a file path
    pub fn from_path(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| DbError::ConnectionError(format!("{e}: {}", path.display())))?;
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(path))
        }
    }

    /// Borrow the underlying connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// File backing this connection, `None` when in memory.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl Database for SqliteBackend {
    fn execute(&self, sql: &str) -> DbResult<usize> {
        log::trace!("execute: {sql}");
        self.conn
            .execute(sql, [])
            .map_err(|e| DbError::from_sql(e, sql))
    }

    fn execute_batch(&self, sql: &str) -> DbResult<()> {
        log::trace!("execute_batch: {sql}");
        self.conn
            .execute_batch(sql)
            .map_err(|e| DbError::from_sql(e, sql))
    }

    fn query(&self, sql: &str) -> DbResult<Vec<Row>> {
        log::trace!("query: {sql}");
        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| DbError::from_sql(e, sql))?;
        let column_count = stmt.column_count();
        let rows = stmt.query_map([], |row| {
            let mut values = Vec::with_capacity(column_count);
            for i in 0..column_count {
                values.push(Value::from(row.get_ref(i)?));
            }
            Ok(Row::new(values))
        })?;
        let collected = rows.collect::<Result<Vec<_>, _>>();
        collected.map_err(|e| DbError::from_sql(e, sql))
    }

    fn insert(
        &self,
        table: &TableName,
        conflict: ConflictPolicy,
        values: &[(ColumnName, Value)],
    ) -> DbResult<i64> {
        let columns = values
            .iter()
            .map(|(col, _)| col.quoted())
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = (1..=values.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT OR {} INTO {} ({}) VALUES ({})",
            conflict.as_sql(),
            table.quoted(),
            columns,
            placeholders
        );
        log::trace!("insert: {sql}");
        self.conn
            .execute(&sql, rusqlite::params_from_iter(values.iter().map(|(_, v)| v)))
            .map_err(|e| DbError::from_sql(e, &sql))?;
        Ok(self.conn.last_insert_rowid())
    }

    fn in_transaction(&self) -> bool {
        !self.conn.is_autocommit()
    }

    fn db_type(&self) -> &'static str {
        "sqlite"
    }
}

#[cfg(test)]
#[path = "sqlite_test.rs"]
mod tests;
