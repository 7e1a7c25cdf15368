//! Pipeline configuration.
//!
//! Every setting has a hardcoded default so the pipeline runs with no
//! configuration at all. An optional JSON file at [`DEFAULT_CONFIG_PATH`] can
//! override any subset of fields:
//!
//! ```json
//! {
//!   "input": "data/raw/agricultural_raw_material.csv",
//!   "extract": { "delimiter": ",", "require_rows": false },
//!   "logging": { "file": "logs/etl_pipeline.log", "min_level": "INFO" },
//!   "rules": [
//!     { "type": "trim_whitespace" },
//!     { "type": "coerce_numeric", "columns": ["Cotton Price"] }
//!   ],
//!   "preview_rows": 5
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, ConfigResult};
use crate::extract::ExtractOptions;
use crate::logging::Level;
use crate::transform::RuleSet;

/// Location of the optional configuration file (relative to current dir)
pub const DEFAULT_CONFIG_PATH: &str = "config/pipeline.json";

/// Raw input file read by the Extract stage
pub const DEFAULT_INPUT_PATH: &str = "data/raw/agricultural_raw_material.csv";

/// Append-only log file
pub const DEFAULT_LOG_FILE: &str = "logs/etl_pipeline.log";

/// Top-level pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// CSV file to extract
    pub input: PathBuf,

    /// Extract stage options
    pub extract: ExtractOptions,

    /// Logger settings
    pub logging: LoggingConfig,

    /// Ordered transformation rules (empty = identity)
    pub rules: RuleSet,

    /// Rows printed as a preview once the pipeline succeeds
    pub preview_rows: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT_PATH),
            extract: ExtractOptions::default(),
            logging: LoggingConfig::default(),
            rules: RuleSet::default(),
            preview_rows: 5,
        }
    }
}

impl PipelineConfig {
    /// Load a configuration file. Missing fields keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `path` if it exists, otherwise fall back to the defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Logger settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Append-only log file
    pub file: PathBuf,

    /// Records below this level are dropped
    pub min_level: Level,

    /// Write records to the terminal
    pub console: bool,

    /// Color terminal output by level
    pub colored: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from(DEFAULT_LOG_FILE),
            min_level: Level::Debug,
            console: true,
            colored: true,
        }
    }
}
