//! # agro-etl - Agricultural raw material price ETL
//!
//! Reads a CSV file of agricultural commodity prices into an in-memory
//! [`Dataset`], validates it, applies configured cleaning rules, and logs
//! every stage to the terminal and an append-only log file.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   CSV File  │────▶│   Extract   │────▶│  Transform  │────▶ Dataset
//! │  (raw data) │     │ (auto-enc)  │     │ (rule set)  │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                            │                   │
//!                            └──── Logger ───────┘
//!                         (console + logs/etl_pipeline.log)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use agro_etl::{extract, transform, Logger, LoggingConfig, RuleSet};
//!
//! let logger = Logger::from_config(&LoggingConfig::default());
//! let data = extract("data/raw/agricultural_raw_material.csv", &logger)?;
//! let data = transform(data, &RuleSet::default(), &logger)?;
//! println!("{}", data.head(5));
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types per stage
//! - [`models`] - Dataset, cell values and column types
//! - [`extract`] - CSV reading with encoding detection
//! - [`transform`] - Validation and transformation rules
//! - [`logging`] - Stage-tagged console and file logging
//! - [`config`] - Pipeline settings
//! - [`pipeline`] - Extract → Transform orchestration

// Core modules
pub mod error;
pub mod models;

// Stages
pub mod extract;
pub mod transform;

// Ambient
pub mod config;
pub mod logging;

// Orchestration
pub mod pipeline;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError,
    ExtractError,
    PipelineError,
    TransformError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{CellValue, DType, Dataset, Row};

// =============================================================================
// Re-exports - Stages
// =============================================================================

pub use extract::{extract, extract_with, parse_csv, ExtractOptions};
pub use transform::{transform, Rule, RuleSet};

// =============================================================================
// Re-exports - Logging & config
// =============================================================================

pub use logging::{Level, LogRecord, LogSink, Logger, MemorySink};
pub use config::{LoggingConfig, PipelineConfig};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use pipeline::{run, PipelineReport};
