//! Table recreation under a known-good definition.
//!
//! The live table is renamed aside, the desired table is created in its
//! place, rows are copied across with per-column substitution, and the old
//! table is dropped. The whole sequence runs under a savepoint: if the engine
//! rejects any step the savepoint is rolled back and the original table is
//! left exactly as it was.

use crate::error::{MigrateError, MigrateResult};
use crate::guard::PragmaGuard;
use crate::introspect::SchemaIntrospector;
use cz_core::sql_utils::quote_ident;
use cz_core::TableSchema;
use cz_db::pragmas::{self, ConnectionFlag};
use cz_db::{Database, DbError};
use serde::Serialize;
use std::fmt;

const SAVEPOINT: &str = "cadenza_rebuild";

/// Step of a rebuild, reported with [`MigrateError::RebuildFailure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RebuildPhase {
    Prepare,
    Rename,
    DropStaleIndexes,
    Create,
    CreateIndexes,
    Copy,
    DropOld,
}

impl fmt::Display for RebuildPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RebuildPhase::Prepare => "prepare",
            RebuildPhase::Rename => "rename",
            RebuildPhase::DropStaleIndexes => "drop stale indexes",
            RebuildPhase::Create => "create",
            RebuildPhase::CreateIndexes => "create indexes",
            RebuildPhase::Copy => "copy",
            RebuildPhase::DropOld => "drop old",
        })
    }
}

pub struct TableRebuilder<'a> {
    db: &'a dyn Database,
}

impl<'a> TableRebuilder<'a> {
    pub fn new(db: &'a dyn Database) -> Self {
        Self { db }
    }

    /// Recreate `desired.name` under `desired`, keeping every row.
    ///
    /// `existing` lists the live column names; desired columns not in it are
    /// filled with their substitution literal. Returns the number of rows
    /// copied.
    ///
    /// `foreign_keys` must already be off (see
    /// [`ForeignKeyGuard`](crate::ForeignKeyGuard)); the rebuild refuses to
    /// start otherwise, including when checks are only deferred.
    pub fn rebuild(&self, desired: &TableSchema, existing: &[String]) -> MigrateResult<usize> {
        let table = desired.name.as_str();
        let fail = move |phase: RebuildPhase| {
            move |source: DbError| MigrateError::RebuildFailure {
                table: table.to_string(),
                phase,
                source,
            }
        };

        // With foreign_keys on, RENAME rewrites child REFERENCES clauses to the
        // temporary name even under legacy_alter_table, and deferring the
        // checks does not change that.
        let enforcing = pragmas::flag(self.db, ConnectionFlag::ForeignKeys)
            .map_err(fail(RebuildPhase::Prepare))?;
        if enforcing {
            return Err(fail(RebuildPhase::Prepare)(DbError::ExecutionError(
                "foreign key enforcement is active; turn it off outside a transaction before rebuilding"
                    .to_string(),
            )));
        }

        // Keep child tables' REFERENCES clauses pointing at the original name.
        let _legacy = PragmaGuard::set(self.db, ConnectionFlag::LegacyAlterTable, true)
            .map_err(fail(RebuildPhase::Prepare))?;
        let temp = self
            .temp_name(table)
            .map_err(fail(RebuildPhase::Prepare))?;

        self.db
            .execute_batch(&format!("SAVEPOINT {SAVEPOINT}"))
            .map_err(fail(RebuildPhase::Prepare))?;

        match self.run_steps(desired, existing, &temp) {
            Ok(rows) => {
                self.db
                    .execute_batch(&format!("RELEASE {SAVEPOINT}"))
                    .map_err(fail(RebuildPhase::DropOld))?;
                log::debug!("Rebuilt {table}: {rows} rows copied via {temp}");
                Ok(rows)
            }
            Err((phase, source)) => {
                if let Err(e) = self
                    .db
                    .execute_batch(&format!("ROLLBACK TO {SAVEPOINT}; RELEASE {SAVEPOINT}"))
                {
                    log::warn!("Rolling back rebuild of {table} failed: {e}");
                }
                Err(fail(phase)(source))
            }
        }
    }

    fn run_steps(
        &self,
        desired: &TableSchema,
        existing: &[String],
        temp: &str,
    ) -> Result<usize, (RebuildPhase, DbError)> {
        let at = |phase: RebuildPhase| move |e: DbError| (phase, e);
        let table = desired.name.quoted();

        self.db
            .execute(&format!("ALTER TABLE {table} RENAME TO {}", quote_ident(temp)))
            .map_err(at(RebuildPhase::Rename))?;

        // Renamed tables keep their explicit indexes under the old names.
        let stale = SchemaIntrospector::new(self.db)
            .indexes(temp)
            .map_err(at(RebuildPhase::DropStaleIndexes))?;
        for index in stale.iter().filter(|i| i.explicit) {
            self.db
                .execute(&format!("DROP INDEX {}", quote_ident(&index.name)))
                .map_err(at(RebuildPhase::DropStaleIndexes))?;
        }

        self.db
            .execute(&desired.create_table_sql())
            .map_err(at(RebuildPhase::Create))?;

        for sql in desired.create_index_sql() {
            self.db
                .execute(&sql)
                .map_err(at(RebuildPhase::CreateIndexes))?;
        }

        let rows = self
            .db
            .execute(&copy_sql(desired, existing, temp))
            .map_err(at(RebuildPhase::Copy))?;

        self.db
            .execute(&format!("DROP TABLE {}", quote_ident(temp)))
            .map_err(at(RebuildPhase::DropOld))?;

        Ok(rows)
    }

    /// `<table>_old_<utc millis>`, bumped until unused.
    fn temp_name(&self, table: &str) -> Result<String, DbError> {
        let introspector = SchemaIntrospector::new(self.db);
        let mut suffix = chrono::Utc::now().timestamp_millis();
        loop {
            let candidate = format!("{table}_old_{suffix}");
            if !introspector.table_exists(&candidate)? {
                return Ok(candidate);
            }
            suffix += 1;
        }
    }
}

/// `INSERT INTO <table> (...) SELECT ... FROM <temp>` with one select
/// expression per desired column.
pub(crate) fn copy_sql(desired: &TableSchema, existing: &[String], temp: &str) -> String {
    let columns: Vec<String> = desired.columns.iter().map(|c| c.name.quoted()).collect();
    let exprs: Vec<String> = desired
        .columns
        .iter()
        .map(|col| {
            let present = existing.iter().any(|e| e.eq_ignore_ascii_case(&col.name));
            match (present, col.not_null) {
                (true, true) => format!(
                    "COALESCE({}, {})",
                    col.name.quoted(),
                    col.substitute_literal()
                ),
                (true, false) => col.name.quoted(),
                (false, _) => col.substitute_literal(),
            }
        })
        .collect();
    format!(
        "INSERT INTO {} ({}) SELECT {} FROM {}",
        desired.name.quoted(),
        columns.join(", "),
        exprs.join(", "),
        quote_ident(temp)
    )
}

#[cfg(test)]
#[path = "rebuild_test.rs"]
mod tests;
