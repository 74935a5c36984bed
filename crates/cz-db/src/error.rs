//! Error types for cz-db

use thiserror::Error;

/// Database operation errors
#[derive(Error, Debug)]
pub enum DbError {
    /// Connection error (D001)
    #[error("[D001] Database connection failed: {0}")]
    ConnectionError(String),

    /// Query execution error (D002)
    #[error("[D002] SQL execution failed: {0}")]
    ExecutionError(String),

    /// Table not found (D003)
    #[error("[D003] Table not found: {0}")]
    TableNotFound(String),

    /// Storage exhausted (D004)
    #[error("[D004] Database storage is full: {0}")]
    StorageFull(String),

    /// Corrupt database file (D005)
    #[error("[D005] Database file is corrupt: {0}")]
    Corrupt(String),

    /// Row value had an unexpected type (D006)
    #[error("[D006] Column {index}: expected {expected}, found {found}")]
    TypeMismatch {
        index: usize,
        expected: &'static str,
        found: String,
    },

    /// Pragma returned no usable value (D007)
    #[error("[D007] Pragma {pragma} returned no value")]
    PragmaUnavailable { pragma: String },
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;

impl DbError {
    /// Classify a driver error, attaching the statement for context.
    pub fn from_sql(err: rusqlite::Error, sql: &str) -> Self {
        match DbError::from(err) {
            DbError::ExecutionError(msg) => DbError::ExecutionError(format!("{msg}: {sql}")),
            other => other,
        }
    }

    /// Whether the engine rejected the statement for a storage-level reason
    /// rather than a problem with the statement itself.
    pub fn is_storage_failure(&self) -> bool {
        matches!(self, DbError::StorageFull(_) | DbError::Corrupt(_))
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(err: rusqlite::Error) -> Self {
        let msg = err.to_string();
        match err.sqlite_error_code() {
            Some(rusqlite::ErrorCode::DiskFull) => return DbError::StorageFull(msg),
            Some(rusqlite::ErrorCode::DatabaseCorrupt) | Some(rusqlite::ErrorCode::NotADatabase) => {
                return DbError::Corrupt(msg)
            }
            Some(rusqlite::ErrorCode::CannotOpen) => return DbError::ConnectionError(msg),
            _ => {}
        }
        // rusqlite reports missing tables as a generic SQLITE_ERROR, so the
        // message is the only signal.
        if msg.contains("no such table") {
            DbError::TableNotFound(msg)
        } else {
            DbError::ExecutionError(msg)
        }
    }
}
