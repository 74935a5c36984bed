//! Error types for the migration core.
//!
//! A column that cannot be added is not an error here: it is reported as
//! [`PatchOutcome::Failed`](crate::PatchOutcome::Failed) and recorded in the
//! repair report. Everything below aborts the current run.

use crate::rebuild::RebuildPhase;
use cz_core::{CoreError, SchemaVersion};
use cz_db::DbError;
use thiserror::Error;

/// Migration errors.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Neither an edge, a single-step chain, nor the catch-all connects the
    /// versions (M001).
    #[error("[M001] No migration path from {from} to {to}")]
    NoMigrationPath {
        from: SchemaVersion,
        to: SchemaVersion,
    },

    /// The engine rejected a statement while rebuilding a table (M002). The
    /// original rows are still in place.
    #[error("[M002] Rebuild of table '{table}' failed during {phase}: {source}")]
    RebuildFailure {
        table: String,
        phase: RebuildPhase,
        #[source]
        source: DbError,
    },

    /// A version edge's body or post-migrate hook failed (M003).
    #[error("[M003] Migration {from} -> {to} failed: {source}")]
    EdgeBody {
        from: SchemaVersion,
        to: SchemaVersion,
        #[source]
        source: Box<MigrateError>,
    },

    /// Edge rejected at registration (M004).
    #[error("[M004] Invalid migration edge {from} -> {to}: {reason}")]
    InvalidEdge {
        from: SchemaVersion,
        to: SchemaVersion,
        reason: String,
    },

    /// Two edges registered for the same version pair (M005).
    #[error("[M005] Duplicate migration edge {from} -> {to}")]
    DuplicateEdge {
        from: SchemaVersion,
        to: SchemaVersion,
    },

    /// Tables still differ from their desired definition after every edge
    /// ran (M006).
    #[error("[M006] Schema validation failed after migration: {}", mismatches.join("; "))]
    ValidationFailed { mismatches: Vec<String> },

    /// BEGIN / COMMIT of the upgrade transaction failed (M007).
    #[error("[M007] Migration transaction failed: {0}")]
    Transaction(String),

    /// Database error outside a rebuild (M008).
    #[error("[M008] {0}")]
    Db(#[from] DbError),

    /// Schema definition error (M009).
    #[error("[M009] {0}")]
    Core(#[from] CoreError),
}

/// Result type alias for [`MigrateError`].
pub type MigrateResult<T> = Result<T, MigrateError>;

impl MigrateError {
    /// The error that started it all, looking through [`MigrateError::EdgeBody`].
    pub fn root(&self) -> &MigrateError {
        match self {
            MigrateError::EdgeBody { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether path selection found nothing, the one failure the open
    /// sequence may answer with destructive recreation. Failures inside an
    /// edge never count.
    pub fn is_no_path(&self) -> bool {
        matches!(self, MigrateError::NoMigrationPath { .. })
    }
}
