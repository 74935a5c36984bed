//! cz-db - Database abstraction layer for Cadenza storage
//!
//! This crate provides the `Database` handle trait the migration core is
//! written against, its SQLite implementation, and helpers for the
//! connection pragmas the storage layer reads and sets.

pub mod error;
pub mod pragmas;
pub mod sqlite;
pub mod traits;
pub mod value;

pub use error::{DbError, DbResult};
pub use sqlite::SqliteBackend;
pub use traits::{with_transaction, ConflictPolicy, Database};
pub use value::{Row, Value};
