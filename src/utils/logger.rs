//! Diagnostics and logging
//!
//! Recoverable problems found while reading or writing a file are reported
//! through a [`DiagnosticSink`] owned by the session. The default sink
//! forwards to the `log` facade; [`Logger`] writes to a file and
//! [`CollectingSink`] keeps messages in memory for inspection.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;
use log::{Log, Record, Level, Metadata, LevelFilter};

/// Severity of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// A single recorded diagnostic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub file: Option<String>,
    pub module: String,
    pub message: String,
}

/// Receiver of warnings and errors raised by a session
pub trait DiagnosticSink: Send + Sync {
    fn warning(&self, file: Option<&str>, module: &str, message: &str);

    fn error(&self, file: Option<&str>, module: &str, message: &str);
}

fn format_diagnostic(file: Option<&str>, module: &str, message: &str) -> String {
    match file {
        Some(file) => format!("{}: {}: {}", file, module, message),
        None => format!("{}: {}", module, message),
    }
}

/// Sink forwarding to the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn warning(&self, file: Option<&str>, module: &str, message: &str) {
        log::warn!("{}", format_diagnostic(file, module, message));
    }

    fn error(&self, file: Option<&str>, module: &str, message: &str) {
        log::error!("{}", format_diagnostic(file, module, message));
    }
}

/// Sink that records every diagnostic in memory
#[derive(Debug, Default)]
pub struct CollectingSink {
    entries: Mutex<Vec<Diagnostic>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, severity: Severity, file: Option<&str>, module: &str, message: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(Diagnostic {
                severity,
                file: file.map(str::to_string),
                module: module.to_string(),
                message: message.to_string(),
            });
        }
    }

    /// All diagnostics recorded so far
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Messages of recorded warnings
    pub fn warnings(&self) -> Vec<String> {
        self.diagnostics()
            .into_iter()
            .filter(|d| d.severity == Severity::Warning)
            .map(|d| d.message)
            .collect()
    }

    /// True if any recorded warning contains `needle`
    pub fn has_warning(&self, needle: &str) -> bool {
        self.warnings().iter().any(|w| w.contains(needle))
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }
}

impl DiagnosticSink for CollectingSink {
    fn warning(&self, file: Option<&str>, module: &str, message: &str) {
        self.push(Severity::Warning, file, module, message);
    }

    fn error(&self, file: Option<&str>, module: &str, message: &str) {
        self.push(Severity::Error, file, module, message);
    }
}

/// File logger
pub struct Logger {
    /// File handle for log output
    file: Mutex<Option<File>>,
}

impl Logger {
    /// Creates a new logger appending to `log_file`
    ///
    /// # Arguments
    ///
    /// * `log_file` - Path to the log file, created if missing
    ///
    /// # Returns
    ///
    /// A new Logger instance or an error if the file cannot be opened
    pub fn new(log_file: &str) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(Path::new(log_file))?;
        Ok(Logger {
            file: Mutex::new(Some(file)),
        })
    }

    /// Logs a message to the log file
    ///
    /// # Arguments
    ///
    /// * `message` - The message to log
    pub fn log(&self, message: &str) -> io::Result<()> {
        let mut guard = self
            .file
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log file lock poisoned"))?;
        if let Some(file) = guard.as_mut() {
            writeln!(file, "{}", message)?;
            file.flush()?;
        }
        Ok(())
    }

    /// Installs a file logger as the global `log` backend
    pub fn init_global_logger(log_file: &str) -> io::Result<()> {
        let global_logger = Logger::new(log_file)?;

        // Only called once at startup
        if log::set_boxed_logger(Box::new(global_logger)).is_err() {
            eprintln!("Warning: Global logger was already initialized");
        }

        log::set_max_level(LevelFilter::Debug);
        Ok(())
    }
}

impl DiagnosticSink for Logger {
    fn warning(&self, file: Option<&str>, module: &str, message: &str) {
        let _ = self.log(&format!("[WARN] {}", format_diagnostic(file, module, message)));
    }

    fn error(&self, file: Option<&str>, module: &str, message: &str) {
        let _ = self.log(&format!("[ERROR] {}", format_diagnostic(file, module, message)));
    }
}

// Implement the Log trait to make our Logger work with the log crate
impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Debug
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let message = format!("[{}] {}", record.level(), record.args());
            let _ = Logger::log(self, &message);
        }
    }

    fn flush(&self) {
        // Already flushing in the log method
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collecting_sink_records_severity() {
        let sink = CollectingSink::new();
        sink.warning(Some("a.tif"), "read_directory", "unknown field");
        sink.error(None, "write_directory", "boom");

        let all = sink.diagnostics();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].severity, Severity::Warning);
        assert_eq!(all[0].file.as_deref(), Some("a.tif"));
        assert_eq!(sink.warnings(), vec!["unknown field".to_string()]);
        assert!(sink.has_warning("unknown"));

        sink.clear();
        assert!(sink.diagnostics().is_empty());
    }

    #[test]
    fn test_file_logger_writes_messages() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiffkit.log");
        let logger = Logger::new(path.to_str().unwrap()).unwrap();
        logger.warning(Some("x.tif"), "module", "something odd");

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("[WARN] x.tif: module: something odd"));
    }
}
