//! cz-migrate - Schema migration and repair for the Cadenza library store.
//!
//! Moves an SQLite library file from any historical schema version to the
//! current one and corrects schema drift that versioned migrations alone
//! cannot catch (missing columns, defaults stored in the wrong textual form).
//!
//! Leaves first: [`SchemaIntrospector`] reads live column metadata,
//! [`ColumnPatcher`] adds single columns, [`TableRebuilder`] recreates a
//! table under its desired definition, [`SchemaRepairEngine`] decides
//! between the two for every table, [`MigrationRegistry`] selects version
//! edges, [`MigrationRunner`] applies them in one transaction, and
//! [`Store`] is the open sequence that ties them to a database file.

pub mod app;
pub mod context;
pub mod diff;
pub mod error;
pub mod guard;
pub mod introspect;
pub mod logging;
pub mod patch;
pub mod rebuild;
pub mod registry;
pub mod repair;
pub mod runner;
pub mod store;

pub use context::MigrationContext;
pub use diff::{classify, RebuildReason, TablePlan};
pub use error::{MigrateError, MigrateResult};
pub use guard::{ForeignKeyGuard, PragmaGuard};
pub use introspect::{LiveColumnInfo, LiveIndexInfo, SchemaIntrospector};
pub use logging::{LogEntry, LogFacade, MemoryLog, MigrationLog};
pub use patch::{ColumnPatcher, PatchOutcome};
pub use rebuild::{RebuildPhase, TableRebuilder};
pub use registry::{EdgeBody, EdgeKind, MigrationEdge, MigrationPath, MigrationRegistry, PathKind};
pub use repair::{ColumnFailure, RepairReport, SchemaRepairEngine};
pub use runner::{MigrationRunner, RunSummary};
pub use store::{OpenOutcome, Store};
