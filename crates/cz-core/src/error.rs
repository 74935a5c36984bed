//! Error types for cz-core

use thiserror::Error;

/// Core error type for Cadenza storage
#[derive(Error, Debug)]
pub enum CoreError {
    /// C001: Configuration file not found
    #[error("[C001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// C002: Failed to parse configuration file
    #[error("[C002] Failed to parse config: {message}")]
    ConfigParseError { message: String },

    /// C003: Invalid configuration value
    #[error("[C003] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// C004: Identifier rejected by the allow-list
    #[error("[C004] Invalid identifier '{name}': {reason}")]
    InvalidIdentifier { name: String, reason: String },

    /// C005: Table definition is internally inconsistent
    #[error("[C005] Invalid definition for table '{table}': {reason}")]
    InvalidTable { table: String, reason: String },

    /// C006: Table not present in the catalog
    #[error("[C006] Unknown table: {name}")]
    UnknownTable { name: String },

    /// C007: Column not present in a table definition
    #[error("[C007] Unknown column '{column}' in table '{table}'")]
    UnknownColumn { table: String, column: String },

    /// C008: IO error with path context
    #[error("[C008] IO error at {path}: {source}")]
    IoWithPath {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;

impl From<serde_yaml::Error> for CoreError {
    fn from(err: serde_yaml::Error) -> Self {
        CoreError::ConfigParseError {
            message: err.to_string(),
        }
    }
}
