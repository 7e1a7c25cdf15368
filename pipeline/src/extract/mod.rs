//! Extract stage: read a raw CSV file into a [`Dataset`].
//!
//! ```text
//! path ─▶ exists? ─▶ read bytes ─▶ detect encoding ─▶ csv reader ─▶ Dataset
//!          │NotFound    │Io                              │EmptyInput / MalformedInput
//! ```
//!
//! Every failure is logged once at ERROR under the `EXTRACT` stage and then
//! returned unchanged. There are no retries.

mod encoding;

pub use encoding::{decode_content, detect_encoding};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::error::{ExtractError, ExtractResult};
use crate::logging::{stage, Logger};
use crate::models::{CellValue, Dataset};

/// Options for the Extract stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractOptions {
    /// Field delimiter (single ASCII character)
    pub delimiter: char,

    /// Fail with `EmptyInput` when the file has a header but no data rows.
    /// When false such a file yields a zero-row dataset and a warning.
    pub require_rows: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            delimiter: ',',
            require_rows: false,
        }
    }
}

/// CSV content error, before a file path is attached.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("no columns to parse")]
    Empty,

    #[error("line {line}: {message}")]
    Malformed { line: u64, message: String },
}

impl ParseError {
    fn malformed(line: u64, message: impl Into<String>) -> Self {
        ParseError::Malformed {
            line,
            message: message.into(),
        }
    }

    fn with_path(self, path: &Path) -> ExtractError {
        match self {
            ParseError::Empty => ExtractError::EmptyInput {
                path: path.to_path_buf(),
            },
            ParseError::Malformed { line, message } => ExtractError::MalformedInput {
                path: path.to_path_buf(),
                line,
                message,
            },
        }
    }
}

/// Extract a CSV file with default options.
pub fn extract(path: impl AsRef<Path>, logger: &Logger) -> ExtractResult<Dataset> {
    extract_with(path, &ExtractOptions::default(), logger)
}

/// Extract a CSV file into a [`Dataset`].
///
/// Logs the start of the read, then either the row/column counts or exactly
/// one ERROR record describing the failure.
pub fn extract_with(
    path: impl AsRef<Path>,
    options: &ExtractOptions,
    logger: &Logger,
) -> ExtractResult<Dataset> {
    let path = path.as_ref();
    logger.info(
        stage::EXTRACT,
        format!("Starting extraction from file: {}", resolved(path).display()),
    );

    match read_dataset(path, options, logger) {
        Ok(dataset) => {
            logger.info(
                stage::EXTRACT,
                format!(
                    "Extraction succeeded. Total rows: {}, columns: {}",
                    dataset.row_count(),
                    dataset.column_count()
                ),
            );
            Ok(dataset)
        }
        Err(e) => {
            logger.error(stage::EXTRACT, failure_message(&e));
            Err(e)
        }
    }
}

/// Absolute form of `path` for logging; the path as given if it cannot be resolved.
fn resolved(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn failure_message(err: &ExtractError) -> String {
    match err {
        ExtractError::NotFound { path } => format!("File not found: {}", path.display()),
        ExtractError::EmptyInput { path } => format!("The file {} is empty.", path.display()),
        ExtractError::MalformedInput { path, line, message } => format!(
            "Error parsing CSV file {} at line {}: {}",
            path.display(),
            line,
            message
        ),
        ExtractError::Io { path, source } => format!(
            "Unexpected error reading {}: {}",
            path.display(),
            source
        ),
    }
}

fn read_dataset(path: &Path, options: &ExtractOptions, logger: &Logger) -> ExtractResult<Dataset> {
    // Checked up front so a missing file is never reported as a generic I/O error
    if !path.exists() {
        return Err(ExtractError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let bytes = fs::read(path).map_err(|source| ExtractError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let encoding = detect_encoding(&bytes);
    logger.debug(stage::EXTRACT, format!("Detected encoding: {}", encoding));
    let content = decode_content(&bytes, &encoding);

    let dataset = parse_csv(&content, options.delimiter).map_err(|e| e.with_path(path))?;

    if dataset.is_empty() {
        if options.require_rows {
            return Err(ExtractError::EmptyInput {
                path: path.to_path_buf(),
            });
        }
        logger.warning(
            stage::EXTRACT,
            format!("File {} has a header but no data rows", path.display()),
        );
    }

    Ok(dataset)
}

/// Parse CSV text into a [`Dataset`]. The first record is the header.
///
/// Blank lines are skipped. Every data row must have exactly as many fields
/// as the header, and every quoted field must be closed.
///
/// # Example
/// ```ignore
/// use agro_etl::extract::parse_csv;
///
/// let data = parse_csv("a,b\n1,2\n3,4\n", ',').unwrap();
/// assert_eq!(data.row_count(), 2);
/// assert_eq!(data.columns(), ["a", "b"]);
/// ```
pub fn parse_csv(content: &str, delimiter: char) -> Result<Dataset, ParseError> {
    if !delimiter.is_ascii() {
        return Err(ParseError::malformed(
            0,
            format!("delimiter '{}' is not a single ASCII character", delimiter),
        ));
    }
    if content.trim().is_empty() {
        return Err(ParseError::Empty);
    }
    if let Some(line) = unterminated_quote_line(content.as_bytes(), delimiter as u8) {
        return Err(ParseError::malformed(
            line,
            "unterminated quoted field reaches end of file",
        ));
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .has_headers(true)
        .flexible(false)
        .from_reader(content.as_bytes());

    let header = reader.headers().map_err(csv_error)?;
    let columns = column_names(header.iter());

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(csv_error)?;
        rows.push(record.iter().map(CellValue::parse).collect());
    }

    Ok(Dataset::new(columns, rows))
}

/// Header names, trimmed. Blank names become `Unnamed: <index>` and repeated
/// names get a `.<n>` suffix.
fn column_names<'a>(header: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    header
        .enumerate()
        .map(|(i, name)| {
            let name = name.trim();
            let base = if name.is_empty() {
                format!("Unnamed: {}", i)
            } else {
                name.to_string()
            };
            let mut candidate = base.clone();
            let mut n = 1;
            while !seen.insert(candidate.clone()) {
                candidate = format!("{}.{}", base, n);
                n += 1;
            }
            candidate
        })
        .collect()
}

/// Line on which a quoted field opens without ever being closed.
///
/// The csv reader would swallow the rest of the file into that field, so
/// quoting is tracked here the same way: a quote only opens a field at its
/// start, and `""` inside a quoted field is an escaped quote.
fn unterminated_quote_line(bytes: &[u8], delimiter: u8) -> Option<u64> {
    #[derive(Clone, Copy, PartialEq)]
    enum State {
        FieldStart,
        Unquoted,
        Quoted,
        QuoteInQuoted,
    }

    let mut state = State::FieldStart;
    let mut line = 1u64;
    let mut open_line = 0u64;

    for &b in bytes {
        let ends_field = b == delimiter || b == b'\n';
        state = match state {
            State::FieldStart if b == b'"' => {
                open_line = line;
                State::Quoted
            }
            State::FieldStart | State::Unquoted | State::QuoteInQuoted if ends_field => {
                State::FieldStart
            }
            State::FieldStart | State::Unquoted => State::Unquoted,
            State::Quoted if b == b'"' => State::QuoteInQuoted,
            State::Quoted => State::Quoted,
            State::QuoteInQuoted if b == b'"' => State::Quoted,
            State::QuoteInQuoted => State::Unquoted,
        };
        if b == b'\n' {
            line += 1;
        }
    }

    (state == State::Quoted).then_some(open_line)
}

fn csv_error(err: csv::Error) -> ParseError {
    let line = err.position().map(|p| p.line()).unwrap_or(0);
    match err.kind() {
        csv::ErrorKind::UnequalLengths { expected_len, len, .. } => ParseError::malformed(
            line,
            format!("expected {} fields, found {}", expected_len, len),
        ),
        _ => ParseError::malformed(line, err.to_string()),
    }
}
