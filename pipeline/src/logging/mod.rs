//! Stage-tagged logging for the ETL pipeline.
//!
//! A [`Logger`] is built once at startup and passed by reference to every
//! stage. Each record is fanned out to all configured sinks:
//!
//! - file: `YYYY-MM-DD HH:MM:SS - LEVEL - [ETL] - ETAPA: <STAGE> - message`
//! - console: `HH:MM:SS - LEVEL - [ETL] - ETAPA: <STAGE> - message`, colored by level
//!
//! # Example
//!
//! ```rust,ignore
//! use agro_etl::logging::{Logger, stage};
//!
//! let logger = Logger::from_config(&Default::default());
//! logger.info(stage::EXTRACT, "Starting extraction");
//! logger.error(stage::TRANSFORM, "Column 'price' could not be parsed");
//! ```

mod sink;

pub use sink::{ConsoleSink, FileSink, LogSink, MemorySink};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::LoggingConfig;
use crate::error::ConfigError;

/// Name shown between brackets on every line.
pub const LOGGER_NAME: &str = "ETL";

/// Stage tags used by the pipeline.
pub mod stage {
    pub const CONFIG: &str = "CONFIG";
    pub const EXTRACT: &str = "EXTRACT";
    pub const TRANSFORM: &str = "TRANSFORM";
    pub const PIPELINE: &str = "PIPELINE";
}

// =============================================================================
// Levels
// =============================================================================

/// Severity of a log record, ordered from least to most severe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum Level {
    #[default]
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
            Level::Critical => "CRITICAL",
        }
    }

    /// ANSI color for this level.
    pub fn color(&self) -> &'static str {
        LEVEL_COLORS[*self as usize]
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "DEBUG" => Ok(Level::Debug),
            "INFO" => Ok(Level::Info),
            "WARNING" | "WARN" => Ok(Level::Warning),
            "ERROR" => Ok(Level::Error),
            "CRITICAL" => Ok(Level::Critical),
            _ => Err(ConfigError::InvalidLevel(s.to_string())),
        }
    }
}

impl TryFrom<String> for Level {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, ConfigError> {
        s.parse()
    }
}

// =============================================================================
// Console colors
// =============================================================================

pub mod ansi {
    pub const CYAN: &str = "\x1b[36m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const RED: &str = "\x1b[31m";
    pub const MAGENTA_BOLD: &str = "\x1b[1;35m";
    pub const RESET: &str = "\x1b[0m";
}

/// Indexed by `Level as usize`.
const LEVEL_COLORS: [&str; 5] = [
    ansi::CYAN,
    ansi::GREEN,
    ansi::YELLOW,
    ansi::RED,
    ansi::MAGENTA_BOLD,
];

// =============================================================================
// Records and formatting
// =============================================================================

/// A single log record.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub timestamp: DateTime<Local>,
    pub level: Level,
    /// Upper-cased stage tag.
    pub stage: String,
    pub message: String,
}

impl LogRecord {
    pub fn new(stage: &str, level: Level, message: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            level,
            stage: stage.to_uppercase(),
            message: message.into(),
        }
    }

    fn body(&self) -> String {
        format!(
            "{} - [{}] - ETAPA: {} - {}",
            self.level, LOGGER_NAME, self.stage, self.message
        )
    }
}

/// Format a record for the log file.
pub fn format_file_line(record: &LogRecord) -> String {
    format!(
        "{} - {}",
        record.timestamp.format("%Y-%m-%d %H:%M:%S"),
        record.body()
    )
}

/// Format a record for the terminal. With `colored`, the line is wrapped in
/// the level color and always ends with a reset.
pub fn format_console_line(record: &LogRecord, colored: bool) -> String {
    let line = format!("{} - {}", record.timestamp.format("%H:%M:%S"), record.body());
    if colored {
        format!("{}{}{}", record.level.color(), line, ansi::RESET)
    } else {
        line
    }
}

// =============================================================================
// Logger
// =============================================================================

/// Logging context shared by all pipeline stages.
///
/// Logging never fails from the caller's point of view: a sink that cannot
/// write is skipped and the remaining sinks still receive the record.
pub struct Logger {
    threshold: Level,
    sinks: Vec<Box<dyn LogSink>>,
}

impl Logger {
    /// Build a logger with explicit sinks.
    pub fn new(threshold: Level, sinks: Vec<Box<dyn LogSink>>) -> Self {
        Self { threshold, sinks }
    }

    /// Build the console and file sinks described by `config`.
    ///
    /// If the log file cannot be opened the logger keeps the console sink and
    /// records a warning instead of failing.
    pub fn from_config(config: &LoggingConfig) -> Self {
        let mut sinks: Vec<Box<dyn LogSink>> = Vec::new();
        if config.console {
            sinks.push(Box::new(ConsoleSink::stderr(config.colored)));
        }

        let file_error = match FileSink::open(&config.file) {
            Ok(file_sink) => {
                sinks.push(Box::new(file_sink));
                None
            }
            Err(e) => Some(e),
        };

        let logger = Self::new(config.min_level, sinks);
        if let Some(e) = file_error {
            logger.warning(
                stage::PIPELINE,
                format!(
                    "Cannot open log file {}: {}. Logging to console only.",
                    config.file.display(),
                    e
                ),
            );
        }
        logger
    }

    /// Add a sink after construction.
    pub fn with_sink(mut self, sink: impl LogSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn threshold(&self) -> Level {
        self.threshold
    }

    pub fn enabled(&self, level: Level) -> bool {
        level >= self.threshold
    }

    /// Emit a record tagged with `stage`.
    pub fn log(&self, stage: &str, level: Level, message: impl Into<String>) {
        if !self.enabled(level) {
            return;
        }
        let record = LogRecord::new(stage, level, message);
        for sink in &self.sinks {
            // A broken sink must not starve the others
            let _ = sink.write(&record);
        }
    }

    pub fn debug(&self, stage: &str, message: impl Into<String>) {
        self.log(stage, Level::Debug, message);
    }

    pub fn info(&self, stage: &str, message: impl Into<String>) {
        self.log(stage, Level::Info, message);
    }

    pub fn warning(&self, stage: &str, message: impl Into<String>) {
        self.log(stage, Level::Warning, message);
    }

    pub fn error(&self, stage: &str, message: impl Into<String>) {
        self.log(stage, Level::Error, message);
    }

    pub fn critical(&self, stage: &str, message: impl Into<String>) {
        self.log(stage, Level::Critical, message);
    }

    pub fn flush(&self) {
        for sink in &self.sinks {
            let _ = sink.flush();
        }
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        self.flush();
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("threshold", &self.threshold)
            .field("sinks", &self.sinks.len())
            .finish()
    }
}
