//! cz-core - Core library for Cadenza storage
//!
//! This crate provides the shared vocabulary of the storage layer: validated
//! SQL identifiers, schema versions, the typed table builder used to declare
//! desired table shapes, default-literal formatting, and `cadenza.yml`
//! configuration.

pub mod catalog;
pub mod config;
pub mod error;
pub mod ident;
pub mod literal;
pub mod schema;
pub mod sql_utils;
pub mod version;

pub use catalog::Catalog;
pub use config::{Config, JournalMode, MigrationPolicy, PragmaConfig, SynchronousMode};
pub use error::{CoreError, CoreResult};
pub use ident::{ColumnName, IndexName, TableName};
pub use literal::DefaultValue;
pub use schema::{
    ColumnDef, ColumnSpec, FkAction, ForeignKeyDef, ForeignKeySpec, IndexDef, IndexSpec, SqlType,
    TableSchema, TableSchemaBuilder,
};
pub use version::SchemaVersion;
