//! agro-etl - Extract and transform agricultural raw material prices
//!
//! ```bash
//! agro-etl    # reads data/raw/agricultural_raw_material.csv
//! ```
//!
//! Settings can be overridden with `config/pipeline.json`. Logs go to the
//! terminal and are appended to `logs/etl_pipeline.log`.

use std::process::ExitCode;

use agro_etl::config::DEFAULT_CONFIG_PATH;
use agro_etl::logging::stage;
use agro_etl::{pipeline, Logger, PipelineConfig, PipelineError};

fn main() -> ExitCode {
    let (config, config_error) = match PipelineConfig::load_or_default(DEFAULT_CONFIG_PATH) {
        Ok(config) => (config, None),
        Err(e) => (PipelineConfig::default(), Some(e)),
    };

    let logger = Logger::from_config(&config.logging);

    if let Some(e) = config_error {
        logger.error(stage::CONFIG, e.to_string());
        pipeline::report_failure(&logger, &PipelineError::from(e));
        return ExitCode::FAILURE;
    }

    match pipeline::run(&config, &logger) {
        Ok(report) => {
            println!("{}", report.dataset.head(config.preview_rows));
            println!();
            println!("Final row count: {}", report.row_count());
            ExitCode::SUCCESS
        }
        Err(_) => ExitCode::FAILURE,
    }
}
