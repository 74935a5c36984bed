//! The library schema: desired tables at [`TARGET_VERSION`] and the edges
//! that reach it.

mod edges;
pub mod tables;

use crate::error::MigrateResult;
use crate::registry::MigrationRegistry;
use cz_core::{Catalog, CoreResult, SchemaVersion};

pub const TARGET_VERSION: SchemaVersion = SchemaVersion::new(5);

/// Desired tables at [`TARGET_VERSION`].
pub fn catalog() -> CoreResult<Catalog> {
    Catalog::new(TARGET_VERSION, tables::all()?)
}

/// Every edge up to [`TARGET_VERSION`].
pub fn registry() -> MigrateResult<MigrationRegistry> {
    edges::registry()
}

#[cfg(test)]
#[path = "app_test.rs"]
mod tests;
