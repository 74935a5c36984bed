//! Injected logging for migration bodies and the repair engine.

use std::cell::RefCell;

/// Sink for messages emitted while migrating.
pub trait MigrationLog {
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
}

/// Forwards to the `log` facade under the `cadenza::migrate` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogFacade;

const TARGET: &str = "cadenza::migrate";

impl MigrationLog for LogFacade {
    fn info(&self, message: &str) {
        log::info!(target: TARGET, "{message}");
    }

    fn warn(&self, message: &str) {
        log::warn!(target: TARGET, "{message}");
    }

    fn error(&self, message: &str) {
        log::error!(target: TARGET, "{message}");
    }
}

/// One recorded message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: log::Level,
    pub message: String,
}

/// Records every message in memory.
#[derive(Debug, Default)]
pub struct MemoryLog {
    entries: RefCell<Vec<LogEntry>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.borrow().clone()
    }

    /// Messages recorded at `level`.
    pub fn messages(&self, level: log::Level) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .filter(|e| e.level == level)
            .map(|e| e.message.clone())
            .collect()
    }

    /// Whether any message at `level` contains `needle`.
    pub fn contains(&self, level: log::Level, needle: &str) -> bool {
        self.entries
            .borrow()
            .iter()
            .any(|e| e.level == level && e.message.contains(needle))
    }

    fn push(&self, level: log::Level, message: &str) {
        self.entries.borrow_mut().push(LogEntry {
            level,
            message: message.to_string(),
        });
    }
}

impl MigrationLog for MemoryLog {
    fn info(&self, message: &str) {
        self.push(log::Level::Info, message);
    }

    fn warn(&self, message: &str) {
        self.push(log::Level::Warn, message);
    }

    fn error(&self, message: &str) {
        self.push(log::Level::Error, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_log_records_in_order() {
        let log = MemoryLog::new();
        log.info("opening");
        log.warn("column skipped");
        log.error("rebuild failed");

        let entries = log.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].level, log::Level::Info);
        assert_eq!(entries[2].message, "rebuild failed");
        assert_eq!(log.messages(log::Level::Warn), vec!["column skipped"]);
        assert!(log.contains(log::Level::Error, "rebuild"));
        assert!(!log.contains(log::Level::Info, "rebuild"));
    }

    #[test]
    fn test_facade_is_usable_as_trait_object() {
        let sink: &dyn MigrationLog = &LogFacade;
        sink.info("no backend installed; message is dropped");
    }
}
