//! Log output destinations.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use super::{format_console_line, format_file_line, LogRecord};

/// A destination for log records.
pub trait LogSink: Send + Sync {
    /// Write one record.
    fn write(&self, record: &LogRecord) -> io::Result<()>;

    /// Flush buffered output.
    fn flush(&self) -> io::Result<()> {
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> io::Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| io::Error::other("log sink lock poisoned"))
}

// =============================================================================
// Console
// =============================================================================

/// Terminal sink with optional level coloring.
pub struct ConsoleSink {
    colored: bool,
    writer: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleSink {
    pub fn stderr(colored: bool) -> Self {
        Self::with_writer(io::stderr(), colored)
    }

    pub fn with_writer(writer: impl Write + Send + 'static, colored: bool) -> Self {
        Self {
            colored,
            writer: Mutex::new(Box::new(writer)),
        }
    }
}

impl LogSink for ConsoleSink {
    fn write(&self, record: &LogRecord) -> io::Result<()> {
        let line = format_console_line(record, self.colored);
        let mut writer = lock(&self.writer)?;
        writeln!(writer, "{}", line)
    }

    fn flush(&self) -> io::Result<()> {
        lock(&self.writer)?.flush()
    }
}

// =============================================================================
// File
// =============================================================================

/// Append-only file sink. Writes are serialized through a mutex.
pub struct FileSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileSink {
    /// Open `path` for appending, creating it and its parent directory.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogSink for FileSink {
    fn write(&self, record: &LogRecord) -> io::Result<()> {
        let mut file = lock(&self.file)?;
        writeln!(file, "{}", format_file_line(record))?;
        file.flush()
    }

    fn flush(&self) -> io::Result<()> {
        lock(&self.file)?.flush()
    }
}

// =============================================================================
// Memory
// =============================================================================

/// Captures records in memory. Clones share the same buffer, so a handle can
/// be kept while the logger owns another.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<LogRecord>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all captured records, in emission order.
    pub fn records(&self) -> Vec<LogRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    /// Captured records rendered in the file format.
    pub fn lines(&self) -> Vec<String> {
        self.records().iter().map(format_file_line).collect()
    }

    pub fn clear(&self) {
        if let Ok(mut records) = self.records.lock() {
            records.clear();
        }
    }
}

impl LogSink for MemorySink {
    fn write(&self, record: &LogRecord) -> io::Result<()> {
        lock(&self.records)?.push(record.clone());
        Ok(())
    }
}
