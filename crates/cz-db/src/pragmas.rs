//! Connection pragmas read and written by the storage layer.
//!
//! `user_version` holds the schema generation, `foreign_keys` and
//! `defer_foreign_keys` are toggled around repairs, and the caller-configured
//! pragmas from [`PragmaConfig`] are applied once migration has finished.

use crate::error::{DbError, DbResult};
use crate::traits::Database;
use crate::value::Value;
use cz_core::{PragmaConfig, SchemaVersion};

/// Connection flags the migration core toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionFlag {
    ForeignKeys,
    DeferForeignKeys,
    LegacyAlterTable,
}

impl ConnectionFlag {
    pub fn pragma_name(&self) -> &'static str {
        match self {
            ConnectionFlag::ForeignKeys => "foreign_keys",
            ConnectionFlag::DeferForeignKeys => "defer_foreign_keys",
            ConnectionFlag::LegacyAlterTable => "legacy_alter_table",
        }
    }
}

/// Read an integer-valued pragma.
fn read_i64(db: &dyn Database, pragma: &str) -> DbResult<i64> {
    match db.query_value(&format!("PRAGMA {pragma}"))? {
        Some(Value::Integer(v)) => Ok(v),
        _ => Err(DbError::PragmaUnavailable {
            pragma: pragma.to_string(),
        }),
    }
}

/// Schema version stamped in the file header.
pub fn user_version(db: &dyn Database) -> DbResult<SchemaVersion> {
    let raw = read_i64(db, "user_version")?;
    // user_version is a signed 32-bit header field; negative values can only
    // come from foreign writers and are treated as unversioned.
    Ok(SchemaVersion::new(u32::try_from(raw).unwrap_or(0)))
}

/// Stamp the schema version.
pub fn set_user_version(db: &dyn Database, version: SchemaVersion) -> DbResult<()> {
    db.execute_batch(&format!("PRAGMA user_version = {}", version.get()))
}

/// Current value of a connection flag.
pub fn flag(db: &dyn Database, flag: ConnectionFlag) -> DbResult<bool> {
    Ok(read_i64(db, flag.pragma_name())? != 0)
}

/// Set a connection flag. Some flags are silently ignored by the engine
/// inside a transaction; callers that care must read the value back.
pub fn set_flag(db: &dyn Database, flag: ConnectionFlag, on: bool) -> DbResult<()> {
    db.execute_batch(&format!(
        "PRAGMA {} = {}",
        flag.pragma_name(),
        if on { "ON" } else { "OFF" }
    ))
}

/// Names of user tables (excluding engine-internal `sqlite_` tables).
pub fn user_tables(db: &dyn Database) -> DbResult<Vec<String>> {
    db.query(
        "SELECT name FROM sqlite_master \
         WHERE type = 'table' AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\' \
         ORDER BY name",
    )?
    .iter()
    .map(|row| row.str_at(0).map(str::to_string))
    .collect()
}

/// A row reported by `PRAGMA foreign_key_check`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyViolation {
    pub table: String,
    pub rowid: Option<i64>,
    pub parent: String,
}

/// Every foreign-key violation currently in the database.
pub fn foreign_key_violations(db: &dyn Database) -> DbResult<Vec<ForeignKeyViolation>> {
    db.query("PRAGMA foreign_key_check")?
        .iter()
        .map(|row| {
            Ok(ForeignKeyViolation {
                table: row.str_at(0)?.to_string(),
                rowid: match row.get(1) {
                    Some(Value::Integer(id)) => Some(*id),
                    _ => None,
                },
                parent: row.str_at(2)?.to_string(),
            })
        })
        .collect()
}

/// Apply the caller-configured pragmas and re-enable foreign keys.
///
/// Must run after migration: changing the journal mode takes its own lock
/// and would interfere with the exclusive upgrade transaction.
pub fn apply_pragmas(db: &dyn Database, config: &PragmaConfig) -> DbResult<()> {
    let mode = db.query_value(&format!(
        "PRAGMA journal_mode = {}",
        config.journal_mode.as_pragma()
    ))?;
    if let Some(Value::Text(effective)) = mode {
        if !effective.eq_ignore_ascii_case(config.journal_mode.as_pragma()) {
            log::debug!(
                "journal_mode {} requested, engine kept {effective}",
                config.journal_mode.as_pragma()
            );
        }
    }
    db.execute_batch(&format!(
        "PRAGMA synchronous = {};
         PRAGMA cache_size = {};
         PRAGMA wal_autocheckpoint = {};
         PRAGMA busy_timeout = {};
         PRAGMA foreign_keys = ON;",
        config.synchronous.as_pragma(),
        config.cache_size,
        config.wal_autocheckpoint,
        config.busy_timeout_ms,
    ))
}

#[cfg(test)]
#[path = "pragmas_test.rs"]
mod tests;
