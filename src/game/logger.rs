//! Centralized simulation logger
//!
//! Messages carry a verbosity level and an optional category. Depending on the
//! output mode they go to stdout, into an in-memory buffer, or both; tests
//! inspect the buffer.

use serde::{Deserialize, Serialize};
use std::cell::{Ref, RefCell};
use std::ops::Deref;

/// How much the simulation says while it runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum VerbosityLevel {
    /// Silent - no output
    Silent = 0,
    /// Minimal - round summaries and warnings
    Minimal = 1,
    /// Normal - rounds, purchases, combines and sales (default)
    #[default]
    Normal = 2,
    /// Verbose - every posted message and ignored command
    Verbose = 3,
}

/// Output destination for log messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OutputMode {
    /// Output only to stdout (default)
    #[default]
    Stdout,
    /// Capture only to in-memory buffer (no stdout)
    Memory,
    /// Both stdout and in-memory buffer
    Both,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: VerbosityLevel,
    pub message: String,
    /// Optional category (e.g. "warning", "query")
    pub category: Option<String>,
}

/// Read-only access to captured log entries
pub struct LogGuard<'a> {
    guard: Ref<'a, Vec<LogEntry>>,
}

impl<'a> LogGuard<'a> {
    pub fn iter(&self) -> std::slice::Iter<'_, LogEntry> {
        self.guard.iter()
    }

    pub fn len(&self) -> usize {
        self.guard.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guard.is_empty()
    }
}

impl<'a> Deref for LogGuard<'a> {
    type Target = [LogEntry];

    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

pub struct GameLogger {
    verbosity: VerbosityLevel,
    output_mode: OutputMode,
    /// Prefix every line with the replica name (lockstep runs)
    tag: Option<String>,
    log_buffer: RefCell<Vec<LogEntry>>,
}

impl GameLogger {
    pub fn new() -> Self {
        Self::with_verbosity(VerbosityLevel::default())
    }

    pub fn with_verbosity(verbosity: VerbosityLevel) -> Self {
        GameLogger {
            verbosity,
            output_mode: OutputMode::default(),
            tag: None,
            log_buffer: RefCell::new(Vec::new()),
        }
    }

    pub fn set_output_mode(&mut self, mode: OutputMode) {
        self.output_mode = mode;
    }

    pub fn output_mode(&self) -> OutputMode {
        self.output_mode
    }

    /// Capture to memory only, suppressing stdout
    pub fn enable_capture(&mut self) {
        self.output_mode = OutputMode::Memory;
    }

    pub fn disable_capture(&mut self) {
        self.output_mode = OutputMode::Stdout;
    }

    pub fn is_capturing(&self) -> bool {
        matches!(self.output_mode, OutputMode::Memory | OutputMode::Both)
    }

    pub fn verbosity(&self) -> VerbosityLevel {
        self.verbosity
    }

    pub fn set_verbosity(&mut self, verbosity: VerbosityLevel) {
        self.verbosity = verbosity;
    }

    pub fn set_tag(&mut self, tag: impl Into<String>) {
        self.tag = Some(tag.into());
    }

    pub fn logs(&self) -> LogGuard<'_> {
        LogGuard {
            guard: self.log_buffer.borrow(),
        }
    }

    pub fn clear_logs(&mut self) {
        self.log_buffer.borrow_mut().clear();
    }

    fn log_to_stdout(&self, entry: &LogEntry) {
        let indent = if entry.level == VerbosityLevel::Minimal { "" } else { "  " };
        let warning = if entry.category.as_deref() == Some("warning") { "warning: " } else { "" };
        match &self.tag {
            Some(tag) => println!("{}[{}] {}{}", indent, tag, warning, entry.message),
            None => println!("{}{}{}", indent, warning, entry.message),
        }
    }

    fn record(&self, level: VerbosityLevel, message: &str, category: Option<&str>) {
        let should_capture = self.is_capturing();
        let should_output = matches!(self.output_mode, OutputMode::Stdout | OutputMode::Both);

        if level > self.verbosity && !should_capture {
            return;
        }

        let entry = LogEntry {
            level,
            message: message.to_string(),
            category: category.map(str::to_string),
        };
        if should_output && level <= self.verbosity {
            self.log_to_stdout(&entry);
        }
        if should_capture {
            self.log_buffer.borrow_mut().push(entry);
        }
    }

    #[inline]
    pub fn minimal(&self, message: &str) {
        self.record(VerbosityLevel::Minimal, message, None);
    }

    #[inline]
    pub fn normal(&self, message: &str) {
        self.record(VerbosityLevel::Normal, message, None);
    }

    #[inline]
    pub fn verbose(&self, message: &str) {
        self.record(VerbosityLevel::Verbose, message, None);
    }

    /// Data-authoring problems: merge-policy conflicts, missing catalog entries
    #[inline]
    pub fn warn(&self, message: &str) {
        self.record(VerbosityLevel::Minimal, message, Some("warning"));
    }

    /// A controller decision; the controller's name is not part of the line
    #[inline]
    pub fn choice(&self, message: &str) {
        self.record(VerbosityLevel::Verbose, message, Some("choice"));
    }
}

impl Default for GameLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for GameLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameLogger")
            .field("verbosity", &self.verbosity)
            .field("output_mode", &self.output_mode)
            .field("log_count", &self.log_buffer.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_defaults() {
        let logger = GameLogger::new();
        assert_eq!(logger.verbosity(), VerbosityLevel::Normal);
        assert!(!logger.is_capturing());
    }

    #[test]
    fn test_capture_keeps_levels_above_verbosity() {
        let mut logger = GameLogger::with_verbosity(VerbosityLevel::Minimal);
        logger.enable_capture();

        logger.normal("round 1");
        logger.verbose("posted card-entered");
        logger.warn("no descriptors for supply-depot");

        let logs = logger.logs();
        assert_eq!(logs.len(), 3);
        assert_eq!(logs[2].category.as_deref(), Some("warning"));
        assert_eq!(logs[2].level, VerbosityLevel::Minimal);
    }

    #[test]
    fn test_clear_logs_empties_buffer() {
        let mut logger = GameLogger::new();
        logger.enable_capture();
        logger.normal("a");
        logger.choice("P0 -> $done");
        assert_eq!(logger.logs()[1].category.as_deref(), Some("choice"));
        logger.clear_logs();
        assert!(logger.logs().is_empty());
    }

    #[test]
    fn test_silent_stdout_mode_records_nothing() {
        let logger = GameLogger::with_verbosity(VerbosityLevel::Silent);
        logger.warn("dropped");
        assert!(logger.logs().is_empty());
    }
}
