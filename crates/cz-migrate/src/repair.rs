//! Self-healing repair pass over every table with a desired definition.
//!
//! For each table, in catalog order: introspect, classify, then patch the
//! missing columns or rebuild the table, normalize stray NULLs in required
//! columns, and ensure declared indexes exist. Running the pass on a
//! database that is already correct changes nothing.

use crate::diff::{classify, TablePlan};
use crate::error::MigrateResult;
use crate::guard::ForeignKeyGuard;
use crate::introspect::SchemaIntrospector;
use crate::logging::MigrationLog;
use crate::patch::{ColumnPatcher, PatchOutcome};
use crate::rebuild::TableRebuilder;
use cz_core::{Catalog, TableSchema};
use cz_db::{Database, DbResult};
use serde::Serialize;

/// A column `ADD COLUMN` could not add.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnFailure {
    pub table: String,
    pub column: String,
    pub reason: String,
}

/// What a repair pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepairReport {
    pub tables_patched: usize,
    pub tables_rebuilt: usize,
    pub column_failures: Vec<ColumnFailure>,
    /// NULLs replaced by their column default in required columns.
    pub rows_normalized: usize,
}

impl RepairReport {
    /// No table needed patching or rebuilding.
    pub fn is_clean(&self) -> bool {
        self.tables_patched == 0 && self.tables_rebuilt == 0 && self.column_failures.is_empty()
    }

    pub fn merge(&mut self, other: RepairReport) {
        self.tables_patched += other.tables_patched;
        self.tables_rebuilt += other.tables_rebuilt;
        self.column_failures.extend(other.column_failures);
        self.rows_normalized += other.rows_normalized;
    }
}

pub struct SchemaRepairEngine<'a> {
    db: &'a dyn Database,
    log: &'a dyn MigrationLog,
}

impl<'a> SchemaRepairEngine<'a> {
    pub fn new(db: &'a dyn Database, log: &'a dyn MigrationLog) -> Self {
        Self { db, log }
    }

    /// Classify one table without writing.
    pub fn plan(&self, desired: &TableSchema) -> DbResult<TablePlan> {
        let live = SchemaIntrospector::new(self.db).describe(&desired.name)?;
        Ok(classify(desired, &live))
    }

    /// Classify every catalog table without writing.
    pub fn plan_all(&self, catalog: &Catalog) -> DbResult<Vec<(String, TablePlan)>> {
        catalog
            .tables()
            .iter()
            .map(|t| Ok((t.name.to_string(), self.plan(t)?)))
            .collect()
    }

    /// Repair every catalog table.
    pub fn repair_all(&self, catalog: &Catalog) -> MigrateResult<RepairReport> {
        self.repair_tables(catalog.tables())
    }

    /// Repair `tables` in the order given, with foreign-key enforcement
    /// suspended for the whole pass.
    pub fn repair_tables<'t, I>(&self, tables: I) -> MigrateResult<RepairReport>
    where
        I: IntoIterator<Item = &'t TableSchema>,
    {
        let _fk = ForeignKeyGuard::suspend(self.db)?;
        let mut report = RepairReport::default();
        for desired in tables {
            self.repair_table(desired, &mut report)?;
        }
        Ok(report)
    }

    fn repair_table(&self, desired: &TableSchema, report: &mut RepairReport) -> MigrateResult<()> {
        let table = &desired.name;
        match self.plan(desired)? {
            TablePlan::Missing => {
                log::debug!("Skipping repair of {table}: table does not exist");
                return Ok(());
            }
            TablePlan::InSync => {}
            TablePlan::Patch { columns } => {
                let patcher = ColumnPatcher::new(self.db);
                let mut failed = false;
                for name in &columns {
                    let spec = desired.require_column(name)?;
                    match patcher.ensure_column(table, spec)? {
                        PatchOutcome::Added => self.log.info(&format!("Added column {table}.{name}")),
                        PatchOutcome::AlreadyPresent => {}
                        PatchOutcome::Failed(reason) => {
                            self.log
                                .warn(&format!("Could not add column {table}.{name}: {reason}"));
                            report.column_failures.push(ColumnFailure {
                                table: table.to_string(),
                                column: name.clone(),
                                reason,
                            });
                            failed = true;
                        }
                    }
                }
                if failed {
                    self.log
                        .warn(&format!("Rebuilding {table} after failed column additions"));
                    self.rebuild(desired, report)?;
                } else {
                    report.tables_patched += 1;
                }
            }
            TablePlan::Rebuild { reasons } => {
                let why: Vec<String> = reasons.iter().map(|r| r.to_string()).collect();
                self.log
                    .info(&format!("Rebuilding {table}: {}", why.join("; ")));
                self.rebuild(desired, report)?;
            }
        }

        report.rows_normalized += self.normalize(desired)?;
        self.ensure_indexes(desired)?;
        Ok(())
    }

    fn rebuild(&self, desired: &TableSchema, report: &mut RepairReport) -> MigrateResult<()> {
        let existing: Vec<String> = SchemaIntrospector::new(self.db)
            .describe(&desired.name)?
            .into_iter()
            .map(|c| c.name)
            .collect();
        TableRebuilder::new(self.db).rebuild(desired, &existing)?;
        report.tables_rebuilt += 1;
        Ok(())
    }

    /// Set NULLs in required, defaulted columns to the default.
    pub fn normalize(&self, desired: &TableSchema) -> DbResult<usize> {
        let mut updated = 0;
        for col in desired.columns.iter().filter(|c| c.not_null) {
            let Some(default) = &col.default else {
                continue;
            };
            updated += self.db.execute(&format!(
                "UPDATE {table} SET {col} = {value} WHERE {col} IS NULL",
                table = desired.name.quoted(),
                col = col.name.quoted(),
                value = default.render(),
            ))?;
        }
        if updated > 0 {
            self.log.info(&format!(
                "Normalized {updated} NULL values in {}",
                desired.name
            ));
        }
        Ok(updated)
    }

    /// Create any declared index that does not exist.
    pub fn ensure_indexes(&self, desired: &TableSchema) -> DbResult<()> {
        for sql in desired.create_index_sql() {
            self.db.execute(&sql)?;
        }
        Ok(())
    }

    /// Differences that remain between the live schema and `catalog`, one
    /// line per table. Empty when everything matches.
    pub fn verify(&self, catalog: &Catalog) -> DbResult<Vec<String>> {
        let mut mismatches = Vec::new();
        for (table, plan) in self.plan_all(catalog)? {
            match plan {
                TablePlan::InSync => {}
                TablePlan::Missing => mismatches.push(format!("{table}: table is missing")),
                TablePlan::Patch { columns } => {
                    mismatches.push(format!("{table}: missing columns {}", columns.join(", ")))
                }
                TablePlan::Rebuild { reasons } => {
                    let why: Vec<String> = reasons.iter().map(|r| r.to_string()).collect();
                    mismatches.push(format!("{table}: {}", why.join("; ")));
                }
            }
        }
        Ok(mismatches)
    }
}

#[cfg(test)]
#[path = "repair_test.rs"]
mod tests;
