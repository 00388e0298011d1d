//! Logging and lifecycle port.
//!
//! Every component that narrates a run receives a `&dyn Reporter` instead of
//! reaching for a global logger. The binary provides the timestamped
//! stdout/file implementation; tests use [`MemoryReporter`].

use std::cell::RefCell;
use std::fmt;

/// Severity channel of a job log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Info,
    Debug,
    Warning,
    Failed,
    Success,
}

impl Level {
    pub fn label(self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
            Level::Warning => "WARNING",
            Level::Failed => "FAILED",
            Level::Success => "SUCCESS",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Sink for human-readable job progress.
pub trait Reporter {
    fn emit(&self, level: Level, msg: &str);

    fn info(&self, msg: &str) {
        self.emit(Level::Info, msg);
    }

    fn debug(&self, msg: &str) {
        self.emit(Level::Debug, msg);
    }

    fn warning(&self, msg: &str) {
        self.emit(Level::Warning, msg);
    }

    fn fail(&self, msg: &str) {
        self.emit(Level::Failed, msg);
    }

    fn succeed(&self, msg: &str) {
        self.emit(Level::Success, msg);
    }
}

/// Reporter that keeps every line in memory.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    lines: RefCell<Vec<(Level, String)>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<(Level, String)> {
        self.lines.borrow().clone()
    }

    /// Messages logged at `level`, in order.
    pub fn messages(&self, level: Level) -> Vec<String> {
        self.lines
            .borrow()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn count(&self, level: Level) -> usize {
        self.lines.borrow().iter().filter(|(l, _)| *l == level).count()
    }
}

impl Reporter for MemoryReporter {
    fn emit(&self, level: Level, msg: &str) {
        self.lines.borrow_mut().push((level, msg.to_string()));
    }
}
