//! Shared utilities for CLI commands

use anyhow::{bail, Context, Result};
use cz_core::config::CONFIG_FILE_NAME;
use cz_core::Config;
use cz_db::SqliteBackend;
use cz_migrate::{LogFacade, MemoryLog, MigrationLog, TablePlan};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::cli::GlobalArgs;

/// Error type representing a non-zero process exit code.
///
/// Return `Err(ExitCode(N).into())` instead of calling `std::process::exit`
/// so the database connection is closed before the process ends.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) i32);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Control flow only; main() never prints it.
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// Resolved configuration plus the directory relative paths are taken from.
pub(crate) struct Settings {
    pub(crate) config: Config,
    pub(crate) root: PathBuf,
}

impl Settings {
    pub(crate) fn database_path(&self) -> PathBuf {
        self.config.database_path(&self.root)
    }
}

/// Load `--config`, else `./cadenza.yml` when present, else defaults; then
/// apply `--database`.
pub(crate) fn load_settings(global: &GlobalArgs) -> Result<Settings> {
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let (mut config, root) = match &global.config {
        Some(path) => {
            let path = Path::new(path);
            let config = Config::load(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?;
            let root = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| cwd.clone());
            (config, root)
        }
        None if cwd.join(CONFIG_FILE_NAME).exists() => {
            let config = Config::load_from_dir(&cwd).context("Failed to load cadenza.yml")?;
            (config, cwd)
        }
        None => (Config::default(), cwd),
    };

    if let Some(database) = &global.database {
        config.database.path = database.clone();
    }
    Ok(Settings { config, root })
}

/// Connect without creating or migrating anything.
///
/// Read-only commands refuse to run against a file that does not exist, since
/// opening it would create an empty database.
pub(crate) fn connect_existing(settings: &Settings) -> Result<SqliteBackend> {
    if settings.config.is_in_memory() {
        return Ok(SqliteBackend::in_memory()?);
    }
    let path = settings.database_path();
    if !path.exists() {
        bail!("Database not found: {}", path.display());
    }
    SqliteBackend::from_path(&path)
        .with_context(|| format!("Failed to open database {}", path.display()))
}

/// Log sink for a command: records every message, and forwards it to the
/// terminal logger unless output is JSON.
pub(crate) struct CommandLog {
    memory: MemoryLog,
    forward: bool,
}

impl CommandLog {
    pub(crate) fn new(global: &GlobalArgs) -> Self {
        Self {
            memory: MemoryLog::new(),
            forward: !global.json,
        }
    }

    /// Recorded messages in JSON-friendly form.
    pub(crate) fn entries(&self) -> Vec<LogLine> {
        self.memory
            .entries()
            .into_iter()
            .map(|e| LogLine {
                level: e.level.as_str().to_ascii_lowercase(),
                message: e.message,
            })
            .collect()
    }
}

impl MigrationLog for CommandLog {
    fn info(&self, message: &str) {
        self.memory.info(message);
        if self.forward {
            LogFacade.info(message);
        }
    }

    fn warn(&self, message: &str) {
        self.memory.warn(message);
        if self.forward {
            LogFacade.warn(message);
        }
    }

    fn error(&self, message: &str) {
        self.memory.error(message);
        if self.forward {
            LogFacade.error(message);
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct LogLine {
    pub(crate) level: String,
    pub(crate) message: String,
}

/// One-line summary of a table plan.
pub(crate) fn describe_plan(plan: &TablePlan) -> String {
    match plan {
        TablePlan::Patch { columns } => format!("patch: add {}", columns.join(", ")),
        TablePlan::Rebuild { reasons } => {
            let why: Vec<String> = reasons.iter().map(|r| r.to_string()).collect();
            format!("rebuild: {}", why.join("; "))
        }
        other => other.label().to_string(),
    }
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
    println!("{json}");
    Ok(())
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;
