//! Applies the selected edges in a single upgrade transaction.

use crate::context::MigrationContext;
use crate::error::{MigrateError, MigrateResult};
use crate::guard::ForeignKeyGuard;
use crate::logging::MigrationLog;
use crate::registry::{MigrationRegistry, PathKind};
use crate::repair::{RepairReport, SchemaRepairEngine};
use cz_core::{Catalog, SchemaVersion};
use cz_db::{pragmas, with_transaction, Database};
use serde::Serialize;

/// What a run did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub from: SchemaVersion,
    pub to: SchemaVersion,
    pub path: PathKind,
    /// Applied edges, e.g. `v3 -> v5`.
    pub edges: Vec<String>,
    pub repair: RepairReport,
    pub foreign_key_violations: usize,
}

pub struct MigrationRunner<'a> {
    db: &'a dyn Database,
    registry: &'a MigrationRegistry,
    catalog: &'a Catalog,
    log: &'a dyn MigrationLog,
    verify: bool,
}

impl<'a> MigrationRunner<'a> {
    pub fn new(
        db: &'a dyn Database,
        registry: &'a MigrationRegistry,
        catalog: &'a Catalog,
        log: &'a dyn MigrationLog,
    ) -> Self {
        Self {
            db,
            registry,
            catalog,
            log,
            verify: true,
        }
    }

    /// Check every table against the catalog before committing (only when
    /// migrating to the catalog's version).
    pub fn verify_after_migrate(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    /// Move the database from `on_disk` to `target`.
    ///
    /// Foreign keys are suspended, then every edge body and post-migrate hook
    /// runs inside one `BEGIN IMMEDIATE` transaction that also stamps
    /// `user_version`. Any failure rolls the whole run back; there are no
    /// retries and no partial commits.
    pub fn run(&self, on_disk: SchemaVersion, target: SchemaVersion) -> MigrateResult<RunSummary> {
        let path = self.registry.select(on_disk, target)?;
        let mut summary = RunSummary {
            from: on_disk,
            to: target,
            path: path.kind,
            edges: path.edges.iter().map(|e| e.to_string()).collect(),
            repair: RepairReport::default(),
            foreign_key_violations: 0,
        };
        if path.edges.is_empty() {
            return Ok(summary);
        }
        if self.db.in_transaction() {
            return Err(MigrateError::Transaction(
                "cannot migrate inside an open transaction".to_string(),
            ));
        }

        self.log.info(&format!(
            "Migrating {on_disk} -> {target} via {} ({})",
            path.kind,
            summary.edges.join(", ")
        ));

        let _fk = ForeignKeyGuard::suspend(self.db)?;
        let ctx = MigrationContext::new(self.db, self.log, self.catalog);

        let violations = with_transaction(self.db, || -> MigrateResult<usize> {
            for edge in &path.edges {
                edge.apply(&ctx).map_err(|e| MigrateError::EdgeBody {
                    from: edge.from().max(on_disk),
                    to: edge.to(),
                    source: Box::new(e),
                })?;
                log::debug!("Applied migration {edge}: {}", edge.description());
            }

            let violations = pragmas::foreign_key_violations(self.db)?;
            for v in &violations {
                self.log.warn(&format!(
                    "Foreign key violation: {} row {} references missing {}",
                    v.table,
                    v.rowid.map_or_else(|| "?".to_string(), |id| id.to_string()),
                    v.parent
                ));
            }

            if self.verify && target == self.catalog.version() {
                let mismatches = SchemaRepairEngine::new(self.db, self.log).verify(self.catalog)?;
                if !mismatches.is_empty() {
                    return Err(MigrateError::ValidationFailed { mismatches });
                }
            }

            pragmas::set_user_version(self.db, target)?;
            Ok(violations.len())
        });

        match violations {
            Ok(count) => {
                summary.foreign_key_violations = count;
                summary.repair = ctx.into_report();
                self.log.info(&format!("Database is now at {target}"));
                Ok(summary)
            }
            Err(e) => {
                self.log.error(&format!("Migration {on_disk} -> {target} failed: {e}"));
                Err(e)
            }
        }
    }
}

#[cfg(test)]
#[path = "runner_test.rs"]
mod tests;
