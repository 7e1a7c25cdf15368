//! Error types for the agricultural ETL pipeline.
//!
//! One error enum per pipeline concern:
//!
//! - [`ExtractError`] - reading and parsing the raw CSV file
//! - [`TransformError`] - validating and cleaning the extracted dataset
//! - [`ConfigError`] - loading the optional pipeline configuration
//! - [`PipelineError`] - top-level orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across stage boundaries.

use std::path::PathBuf;
use thiserror::Error;

// =============================================================================
// Extraction Errors
// =============================================================================

/// Errors raised by the Extract stage.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Input file does not exist.
    #[error("File not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// File exists but holds no data.
    #[error("File {} is empty", path.display())]
    EmptyInput { path: PathBuf },

    /// Rows cannot be parsed against the header.
    #[error("Malformed CSV in {} at line {line}: {message}", path.display())]
    MalformedInput {
        path: PathBuf,
        line: u64,
        message: String,
    },

    /// Any other failure while reading the file.
    #[error("Cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// =============================================================================
// Transformation Errors
// =============================================================================

/// Errors raised by the Transform stage.
#[derive(Debug, Error)]
pub enum TransformError {
    /// Dataset reaching the stage has no rows.
    #[error("The dataset is empty. Nothing to transform.")]
    EmptyDataset,

    /// A rule references a column the dataset does not have.
    #[error("Rule '{rule}' references unknown column '{column}'")]
    MissingColumn { rule: String, column: String },

    /// A rule definition cannot be applied (bad regex, no date formats...).
    #[error("Invalid rule '{rule}': {message}")]
    InvalidRule { rule: String, message: String },
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while loading the pipeline configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the file.
    #[error("Failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File is not valid configuration JSON.
    #[error("Invalid config {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Unknown log level name.
    #[error("Unknown log level: {0}")]
    InvalidLevel(String),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the error type returned by [`crate::pipeline::run`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Configuration error.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Extract stage error.
    #[error("Extract error: {0}")]
    Extract(#[from] ExtractError),

    /// Transform stage error.
    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),
}

impl PipelineError {
    /// Name of the stage that failed, as used in log records.
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::Config(_) => "CONFIG",
            PipelineError::Extract(_) => "EXTRACT",
            PipelineError::Transform(_) => "TRANSFORM",
        }
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for extraction.
pub type ExtractResult<T> = Result<T, ExtractError>;

/// Result type for transformation.
pub type TransformResult<T> = Result<T, TransformError>;

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for pipeline runs.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        let extract_err = ExtractError::EmptyInput {
            path: PathBuf::from("data/raw/prices.csv"),
        };
        let pipeline_err: PipelineError = extract_err.into();
        assert_eq!(pipeline_err.stage(), "EXTRACT");
        assert!(pipeline_err.to_string().contains("empty"));

        let pipeline_err: PipelineError = TransformError::EmptyDataset.into();
        assert_eq!(pipeline_err.stage(), "TRANSFORM");
        assert!(pipeline_err.to_string().contains("Nothing to transform"));
    }

    #[test]
    fn test_malformed_error_format() {
        let err = ExtractError::MalformedInput {
            path: PathBuf::from("prices.csv"),
            line: 4,
            message: "found record with 3 fields, but the previous record has 2 fields".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("prices.csv"));
        assert!(msg.contains("line 4"));
    }

    #[test]
    fn test_missing_column_format() {
        let err = TransformError::MissingColumn {
            rule: "coerce_numeric".into(),
            column: "Coarse wool Price".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("coerce_numeric"));
        assert!(msg.contains("Coarse wool Price"));
    }
}
