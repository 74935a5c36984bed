//! Configuration types and parsing for cadenza.yml

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file name looked up by [`Config::load_from_dir`].
pub const CONFIG_FILE_NAME: &str = "cadenza.yml";

/// Storage configuration from cadenza.yml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Database file location
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Connection pragmas applied on every open, after migration
    #[serde(default)]
    pub pragmas: PragmaConfig,

    /// Caller policy for failed or impossible upgrades
    #[serde(default)]
    pub migration: MigrationPolicy,
}

/// Database file location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Path to the SQLite file, or `:memory:`
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Connection-scoped pragmas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PragmaConfig {
    /// Page cache size (negative values are KiB, positive are pages)
    #[serde(default = "default_cache_size")]
    pub cache_size: i64,

    /// WAL auto-checkpoint threshold in pages
    #[serde(default = "default_wal_autocheckpoint")]
    pub wal_autocheckpoint: u32,

    /// Busy timeout in milliseconds
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u32,

    #[serde(default)]
    pub synchronous: SynchronousMode,

    #[serde(default)]
    pub journal_mode: JournalMode,
}

impl Default for PragmaConfig {
    fn default() -> Self {
        Self {
            cache_size: default_cache_size(),
            wal_autocheckpoint: default_wal_autocheckpoint(),
            busy_timeout_ms: default_busy_timeout_ms(),
            synchronous: SynchronousMode::default(),
            journal_mode: JournalMode::default(),
        }
    }
}

/// `PRAGMA synchronous` levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SynchronousMode {
    Off,
    #[default]
    Normal,
    Full,
    Extra,
}

impl SynchronousMode {
    pub fn as_pragma(&self) -> &'static str {
        match self {
            SynchronousMode::Off => "OFF",
            SynchronousMode::Normal => "NORMAL",
            SynchronousMode::Full => "FULL",
            SynchronousMode::Extra => "EXTRA",
        }
    }
}

/// `PRAGMA journal_mode` values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JournalMode {
    Delete,
    Truncate,
    Persist,
    Memory,
    #[default]
    Wal,
    Off,
}

impl JournalMode {
    pub fn as_pragma(&self) -> &'static str {
        match self {
            JournalMode::Delete => "DELETE",
            JournalMode::Truncate => "TRUNCATE",
            JournalMode::Persist => "PERSIST",
            JournalMode::Memory => "MEMORY",
            JournalMode::Wal => "WAL",
            JournalMode::Off => "OFF",
        }
    }
}

/// What the open sequence may do when in-place upgrade is impossible.
///
/// Both fallbacks destroy every row in the store and are off unless the
/// caller opts in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MigrationPolicy {
    /// Recreate the store empty when no upgrade path exists
    #[serde(default)]
    pub fallback_to_destructive: bool,

    /// Recreate the store empty when the file is newer than this build
    #[serde(default)]
    pub fallback_on_downgrade: bool,

    /// Validate every table against its desired schema before committing
    #[serde(default = "default_true")]
    pub verify_after_migrate: bool,
}

impl Default for MigrationPolicy {
    fn default() -> Self {
        Self {
            fallback_to_destructive: false,
            fallback_on_downgrade: false,
            verify_after_migrate: true,
        }
    }
}

fn default_db_path() -> String {
    "library.db".to_string()
}

fn default_cache_size() -> i64 {
    -8000
}

fn default_wal_autocheckpoint() -> u32 {
    1000
}

fn default_busy_timeout_ms() -> u32 {
    5000
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config = Self::from_yaml(&content)?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load `cadenza.yml` from a directory
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        Self::load(&dir.join(CONFIG_FILE_NAME))
    }

    /// Parse and validate configuration text
    pub fn from_yaml(content: &str) -> CoreResult<Self> {
        let config: Config = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Whether the configured database lives in memory
    pub fn is_in_memory(&self) -> bool {
        self.database.path == ":memory:"
    }

    /// Database path resolved against `root` (in-memory paths are returned as-is)
    pub fn database_path(&self, root: &Path) -> PathBuf {
        let path = Path::new(&self.database.path);
        if self.is_in_memory() || path.is_absolute() {
            path.to_path_buf()
        } else {
            root.join(path)
        }
    }

    /// Validate the configuration
    fn validate(&self) -> CoreResult<()> {
        if self.database.path.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "database.path cannot be empty".to_string(),
            });
        }
        if self.pragmas.cache_size == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "pragmas.cache_size must be non-zero".to_string(),
            });
        }
        if self.is_in_memory() && self.pragmas.journal_mode == JournalMode::Wal {
            log::debug!("WAL journal mode is not available for in-memory databases");
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
