//! What an edge body sees while it runs.

use crate::error::MigrateResult;
use crate::introspect::SchemaIntrospector;
use crate::logging::MigrationLog;
use crate::patch::{ColumnPatcher, PatchOutcome};
use crate::repair::{ColumnFailure, RepairReport, SchemaRepairEngine};
use chrono::{DateTime, Utc};
use cz_core::{Catalog, TableSchema};
use cz_db::Database;
use std::cell::RefCell;

/// Handle, log, and desired schema for one migration run.
///
/// Repairs and column failures from every edge of the run accumulate into a
/// single [`RepairReport`].
pub struct MigrationContext<'a> {
    db: &'a dyn Database,
    log: &'a dyn MigrationLog,
    catalog: &'a Catalog,
    started_at: DateTime<Utc>,
    report: RefCell<RepairReport>,
}

impl<'a> MigrationContext<'a> {
    pub fn new(db: &'a dyn Database, log: &'a dyn MigrationLog, catalog: &'a Catalog) -> Self {
        Self {
            db,
            log,
            catalog,
            started_at: Utc::now(),
            report: RefCell::new(RepairReport::default()),
        }
    }

    pub fn db(&self) -> &'a dyn Database {
        self.db
    }

    pub fn log(&self) -> &'a dyn MigrationLog {
        self.log
    }

    pub fn catalog(&self) -> &'a Catalog {
        self.catalog
    }

    /// When the run started. Backfills stamp rows with this, not the wall
    /// clock, so every row touched by one run agrees.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn table(&self, name: &str) -> MigrateResult<&'a TableSchema> {
        Ok(self.catalog.require_table(name)?)
    }

    pub fn execute(&self, sql: &str) -> MigrateResult<usize> {
        Ok(self.db.execute(sql)?)
    }

    /// Create `name` with its current definition and indexes, if absent.
    pub fn create_table(&self, name: &str) -> MigrateResult<()> {
        let table = self.table(name)?;
        self.db.execute(&table.create_table_if_not_exists_sql())?;
        for sql in table.create_index_sql() {
            self.db.execute(&sql)?;
        }
        Ok(())
    }

    /// Create every catalog table that does not exist yet.
    pub fn create_missing_tables(&self) -> MigrateResult<Vec<String>> {
        let introspector = SchemaIntrospector::new(self.db);
        let mut created = Vec::new();
        for table in self.catalog.tables() {
            if !introspector.table_exists(&table.name)? {
                self.create_table(&table.name)?;
                self.log.info(&format!("Created table {}", table.name));
                created.push(table.name.to_string());
            }
        }
        Ok(created)
    }

    /// Add `table.column` with its current definition. A refused addition is
    /// logged and recorded, never returned as an error.
    pub fn ensure_column(&self, table: &str, column: &str) -> MigrateResult<PatchOutcome> {
        let schema = self.table(table)?;
        let spec = schema.require_column(column)?;
        let outcome = ColumnPatcher::new(self.db).ensure_column(&schema.name, spec)?;
        if let PatchOutcome::Failed(reason) = &outcome {
            self.log
                .error(&format!("Could not add column {table}.{column}: {reason}"));
            self.report.borrow_mut().column_failures.push(ColumnFailure {
                table: schema.name.to_string(),
                column: spec.name.to_string(),
                reason: reason.clone(),
            });
        }
        Ok(outcome)
    }

    /// Run the repair pass over the named tables, in catalog order.
    pub fn repair(&self, tables: &[&str]) -> MigrateResult<RepairReport> {
        let mut selected = Vec::with_capacity(tables.len());
        for name in tables {
            selected.push(self.table(name)?);
        }
        let order = |t: &&TableSchema| {
            self.catalog
                .tables()
                .iter()
                .position(|c| c.name == t.name)
        };
        selected.sort_by_key(order);
        let report = SchemaRepairEngine::new(self.db, self.log).repair_tables(selected)?;
        self.report.borrow_mut().merge(report.clone());
        Ok(report)
    }

    /// Run the repair pass over every catalog table.
    pub fn repair_all(&self) -> MigrateResult<RepairReport> {
        let report = SchemaRepairEngine::new(self.db, self.log).repair_all(self.catalog)?;
        self.report.borrow_mut().merge(report.clone());
        Ok(report)
    }

    /// Create every declared index that does not exist, on tables that do.
    pub fn ensure_all_indexes(&self) -> MigrateResult<()> {
        let introspector = SchemaIntrospector::new(self.db);
        let engine = SchemaRepairEngine::new(self.db, self.log);
        for table in self.catalog.tables() {
            if introspector.table_exists(&table.name)? {
                engine.ensure_indexes(table)?;
            }
        }
        Ok(())
    }

    /// Everything repaired during the run so far.
    pub fn into_report(self) -> RepairReport {
        self.report.into_inner()
    }
}
