//! The open sequence: connect, create or migrate, then apply pragmas.

use crate::app;
use crate::error::{MigrateError, MigrateResult};
use crate::guard::ForeignKeyGuard;
use crate::logging::MigrationLog;
use crate::registry::MigrationRegistry;
use crate::repair::{RepairReport, SchemaRepairEngine};
use crate::runner::{MigrationRunner, RunSummary};
use cz_core::sql_utils::quote_ident;
use cz_core::{Catalog, Config, SchemaVersion};
use cz_db::{pragmas, with_transaction, Database, SqliteBackend};
use serde::Serialize;
use std::path::Path;

/// How [`Store::open`] brought the file to the current version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum OpenOutcome {
    /// Empty file; every table created.
    Created { version: SchemaVersion },
    UpToDate { version: SchemaVersion },
    Migrated(RunSummary),
    /// No in-place path and the caller allowed destructive recreation. All
    /// previous rows are gone.
    Recreated {
        from: SchemaVersion,
        to: SchemaVersion,
        reason: String,
    },
}

/// An open, current library database.
pub struct Store {
    db: SqliteBackend,
    catalog: Catalog,
    outcome: OpenOutcome,
}

impl Store {
    /// Open the database named by `config` (relative to `root`) with the
    /// library schema.
    pub fn open(config: &Config, root: &Path, log: &dyn MigrationLog) -> MigrateResult<Self> {
        let db = if config.is_in_memory() {
            SqliteBackend::in_memory()?
        } else {
            SqliteBackend::from_path(&config.database_path(root))?
        };
        Self::open_with(db, config, app::catalog()?, &app::registry()?, log)
    }

    /// Run the open sequence on an existing connection.
    pub fn open_with(
        db: SqliteBackend,
        config: &Config,
        catalog: Catalog,
        registry: &MigrationRegistry,
        log: &dyn MigrationLog,
    ) -> MigrateResult<Self> {
        let on_disk = pragmas::user_version(&db)?;
        let target = catalog.version();

        let outcome = if on_disk == SchemaVersion::UNVERSIONED
            && pragmas::user_tables(&db)?.is_empty()
        {
            create_all(&db, &catalog)?;
            log.info(&format!("Created library database at {target}"));
            OpenOutcome::Created { version: target }
        } else if on_disk == target {
            OpenOutcome::UpToDate { version: target }
        } else {
            let runner = MigrationRunner::new(&db, registry, &catalog, log)
                .verify_after_migrate(config.migration.verify_after_migrate);
            match runner.run(on_disk, target) {
                Ok(summary) => OpenOutcome::Migrated(summary),
                Err(e) if e.is_no_path() && fallback_allowed(config, on_disk, target) => {
                    log.warn(&format!(
                        "{e}; recreating the database, existing data will be lost"
                    ));
                    recreate(&db, &catalog)?;
                    OpenOutcome::Recreated {
                        from: on_disk,
                        to: target,
                        reason: e.to_string(),
                    }
                }
                Err(e) => return Err(e),
            }
        };

        pragmas::apply_pragmas(&db, &config.pragmas)?;
        Ok(Self {
            db,
            catalog,
            outcome,
        })
    }

    pub fn outcome(&self) -> &OpenOutcome {
        &self.outcome
    }

    pub fn db(&self) -> &SqliteBackend {
        &self.db
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn version(&self) -> MigrateResult<SchemaVersion> {
        Ok(pragmas::user_version(&self.db)?)
    }

    /// Run the repair pass outside of any migration, in its own transaction.
    pub fn repair(&self, log: &dyn MigrationLog) -> MigrateResult<RepairReport> {
        let _fk = ForeignKeyGuard::suspend(&self.db)?;
        with_transaction(&self.db, || {
            SchemaRepairEngine::new(&self.db, log).repair_all(&self.catalog)
        })
    }

    pub fn into_inner(self) -> SqliteBackend {
        self.db
    }
}

fn fallback_allowed(config: &Config, from: SchemaVersion, to: SchemaVersion) -> bool {
    if from > to {
        config.migration.fallback_on_downgrade
    } else {
        config.migration.fallback_to_destructive
    }
}

fn create_all(db: &dyn Database, catalog: &Catalog) -> MigrateResult<()> {
    with_transaction(db, || {
        create_tables(db, catalog)?;
        pragmas::set_user_version(db, catalog.version())?;
        Ok(())
    })
}

fn create_tables(db: &dyn Database, catalog: &Catalog) -> MigrateResult<()> {
    for table in catalog.tables() {
        db.execute(&table.create_table_sql())?;
        for sql in table.create_index_sql() {
            db.execute(&sql)?;
        }
    }
    Ok(())
}

/// Drop every user table and create the catalog from scratch.
fn recreate(db: &dyn Database, catalog: &Catalog) -> MigrateResult<()> {
    let _fk = ForeignKeyGuard::suspend(db)?;
    with_transaction(db, || -> Result<(), MigrateError> {
        for table in pragmas::user_tables(db)? {
            db.execute(&format!("DROP TABLE IF EXISTS {}", quote_ident(&table)))?;
        }
        create_tables(db, catalog)?;
        pragmas::set_user_version(db, catalog.version())?;
        Ok(())
    })
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
