//! Pipeline orchestration: Extract → Transform.
//!
//! # Example
//!
//! ```rust,ignore
//! use agro_etl::{pipeline, Logger, PipelineConfig};
//!
//! let config = PipelineConfig::default();
//! let logger = Logger::from_config(&config.logging);
//! let report = pipeline::run(&config, &logger)?;
//! println!("Final row count: {}", report.dataset.row_count());
//! ```

use std::path::PathBuf;

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::extract::extract_with;
use crate::logging::{stage, Logger};
use crate::models::Dataset;
use crate::transform::transform;

/// Result of a successful pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// File the data was extracted from
    pub input: PathBuf,
    /// Rows read by the Extract stage
    pub rows_extracted: usize,
    /// Final dataset after the Transform stage
    pub dataset: Dataset,
}

impl PipelineReport {
    pub fn row_count(&self) -> usize {
        self.dataset.row_count()
    }

    /// Rows removed by transformation rules.
    pub fn rows_dropped(&self) -> usize {
        self.rows_extracted - self.dataset.row_count()
    }
}

/// Run Extract then Transform.
///
/// Stage failures are already logged by the stage; this adds one CRITICAL
/// record under `PIPELINE` and returns the error. There is no partial success.
pub fn run(config: &PipelineConfig, logger: &Logger) -> PipelineResult<PipelineReport> {
    logger.info(stage::PIPELINE, "Starting ETL pipeline");

    match run_stages(config, logger) {
        Ok(report) => {
            logger.info(
                stage::PIPELINE,
                format!(
                    "Pipeline finished. Final row count: {} ({} extracted, {} dropped)",
                    report.row_count(),
                    report.rows_extracted,
                    report.rows_dropped()
                ),
            );
            Ok(report)
        }
        Err(e) => {
            report_failure(logger, &e);
            Err(e)
        }
    }
}

fn run_stages(config: &PipelineConfig, logger: &Logger) -> PipelineResult<PipelineReport> {
    let extracted = extract_with(&config.input, &config.extract, logger)?;
    let rows_extracted = extracted.row_count();

    let dataset = transform(extracted, &config.rules, logger)?;

    Ok(PipelineReport {
        input: config.input.clone(),
        rows_extracted,
        dataset,
    })
}

/// Log the pipeline-level abort record.
pub fn report_failure(logger: &Logger, err: &PipelineError) {
    logger.critical(
        stage::PIPELINE,
        format!("Pipeline aborted at stage {}: {}", err.stage(), err),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ExtractError, TransformError};
    use crate::extract::ExtractOptions;
    use crate::logging::{Level, MemorySink};
    use crate::transform::{Rule, RuleSet};
    use std::fs;

    fn memory_logger() -> (Logger, MemorySink) {
        let sink = MemorySink::new();
        (Logger::new(Level::Debug, vec![]).with_sink(sink.clone()), sink)
    }

    fn config_for(input: PathBuf) -> PipelineConfig {
        PipelineConfig {
            input,
            ..Default::default()
        }
    }

    fn errors_by_stage(sink: &MemorySink) -> Vec<(Level, String)> {
        sink.records()
            .into_iter()
            .filter(|r| r.level >= Level::Error)
            .map(|r| (r.level, r.stage))
            .collect()
    }

    #[test]
    fn test_two_row_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("prices.csv");
        fs::write(&input, "a,b\n1,2\n3,4\n").unwrap();
        let (logger, sink) = memory_logger();

        let report = run(&config_for(input), &logger).unwrap();

        assert_eq!(report.row_count(), 2);
        assert_eq!(report.rows_extracted, 2);
        assert_eq!(report.rows_dropped(), 0);
        assert_eq!(report.dataset.columns(), ["a", "b"]);
        assert!(errors_by_stage(&sink).is_empty());
    }

    #[test]
    fn test_header_only_fails_in_transform() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("prices.csv");
        fs::write(&input, "a,b\n").unwrap();
        let (logger, sink) = memory_logger();

        let err = run(&config_for(input), &logger).unwrap_err();

        assert!(matches!(err, PipelineError::Transform(TransformError::EmptyDataset)));
        assert_eq!(
            errors_by_stage(&sink),
            vec![
                (Level::Error, "TRANSFORM".to_string()),
                (Level::Critical, "PIPELINE".to_string()),
            ]
        );
    }

    #[test]
    fn test_header_only_fails_in_extract_when_rows_required() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("prices.csv");
        fs::write(&input, "a,b\n").unwrap();
        let config = PipelineConfig {
            extract: ExtractOptions {
                require_rows: true,
                ..Default::default()
            },
            ..config_for(input)
        };
        let (logger, _sink) = memory_logger();

        let err = run(&config, &logger).unwrap_err();
        assert!(matches!(err, PipelineError::Extract(ExtractError::EmptyInput { .. })));
    }

    #[test]
    fn test_missing_input_aborts_before_transform() {
        let (logger, sink) = memory_logger();

        let err = run(&config_for(PathBuf::from("does/not/exist.csv")), &logger).unwrap_err();

        assert_eq!(err.stage(), "EXTRACT");
        assert!(!sink.records().iter().any(|r| r.stage == "TRANSFORM"));
        assert_eq!(
            errors_by_stage(&sink),
            vec![
                (Level::Error, "EXTRACT".to_string()),
                (Level::Critical, "PIPELINE".to_string()),
            ]
        );
    }

    #[test]
    fn test_rows_dropped_reported() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("prices.csv");
        fs::write(&input, "Month,Price\nApr-90,1.0\nMay-90,\n").unwrap();
        let config = PipelineConfig {
            rules: RuleSet::new(vec![Rule::DropMissing {
                columns: vec!["Price".into()],
            }]),
            ..config_for(input)
        };
        let (logger, sink) = memory_logger();

        let report = run(&config, &logger).unwrap();

        assert_eq!(report.rows_extracted, 2);
        assert_eq!(report.rows_dropped(), 1);
        let last = sink.records().pop().unwrap();
        assert_eq!(
            last.message,
            "Pipeline finished. Final row count: 1 (2 extracted, 1 dropped)"
        );
    }
}
