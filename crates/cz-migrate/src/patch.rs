//! Idempotent single-column additions.

use crate::introspect::SchemaIntrospector;
use cz_core::{ColumnSpec, TableName};
use cz_db::{Database, DbResult};

/// Result of [`ColumnPatcher::ensure_column`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchOutcome {
    Added,
    AlreadyPresent,
    /// The engine refused the `ADD COLUMN`. Not fatal to the caller.
    Failed(String),
}

impl PatchOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, PatchOutcome::Failed(_))
    }
}

pub struct ColumnPatcher<'a> {
    db: &'a dyn Database,
}

impl<'a> ColumnPatcher<'a> {
    pub fn new(db: &'a dyn Database) -> Self {
        Self { db }
    }

    /// Add `spec` to `table` unless a column of that name exists.
    ///
    /// Statement rejections come back as [`PatchOutcome::Failed`]; storage
    /// failures (disk full, corruption) are returned as errors.
    pub fn ensure_column(&self, table: &TableName, spec: &ColumnSpec) -> DbResult<PatchOutcome> {
        let live = SchemaIntrospector::new(self.db).describe(table)?;
        if live.is_empty() {
            return Ok(PatchOutcome::Failed(format!("table {table} does not exist")));
        }
        if live.iter().any(|c| c.name.eq_ignore_ascii_case(&spec.name)) {
            return Ok(PatchOutcome::AlreadyPresent);
        }

        let sql = format!(
            "ALTER TABLE {} ADD COLUMN {}",
            table.quoted(),
            spec.definition_sql()
        );
        match self.db.execute(&sql) {
            Ok(_) => {
                log::debug!("Added column {table}.{}", spec.name);
                Ok(PatchOutcome::Added)
            }
            Err(e) if e.is_storage_failure() => Err(e),
            Err(e) => Ok(PatchOutcome::Failed(e.to_string())),
        }
    }
}

#[cfg(test)]
#[path = "patch_test.rs"]
mod tests;
