//! Transform stage.
//!
//! Validates the extracted dataset and applies the configured [`RuleSet`]:
//!
//! 1. log a structural summary of the input
//! 2. reject a dataset with no rows
//! 3. apply each rule in configuration order
//!
//! With the default (empty) rule set the dataset is returned unchanged.

pub mod rules;

pub use rules::{Rule, RuleOutcome, RuleSet, ISO_DATE_FORMAT};

use crate::error::{TransformError, TransformResult};
use crate::logging::{stage, Logger};
use crate::models::Dataset;

/// Validate and clean an extracted dataset.
///
/// Fails with [`TransformError::EmptyDataset`] when there are no rows. Every
/// failure is logged once at ERROR under the `TRANSFORM` stage.
pub fn transform(dataset: Dataset, rules: &RuleSet, logger: &Logger) -> TransformResult<Dataset> {
    logger.info(stage::TRANSFORM, "Starting data transformation...");
    logger.info(stage::TRANSFORM, "Initial data summary:");
    for line in dataset.summary() {
        logger.info(stage::TRANSFORM, line);
    }

    match apply_rules(dataset, rules, logger) {
        Ok(dataset) => {
            logger.info(
                stage::TRANSFORM,
                format!("Transformation succeeded. Total rows: {}", dataset.row_count()),
            );
            Ok(dataset)
        }
        Err(e) => {
            logger.error(stage::TRANSFORM, e.to_string());
            Err(e)
        }
    }
}

fn apply_rules(mut dataset: Dataset, rules: &RuleSet, logger: &Logger) -> TransformResult<Dataset> {
    if dataset.is_empty() {
        return Err(TransformError::EmptyDataset);
    }

    if rules.is_empty() {
        logger.debug(stage::TRANSFORM, "No transformation rules configured");
        return Ok(dataset);
    }

    for (i, rule) in rules.iter().enumerate() {
        let outcome = rule.apply(&mut dataset)?;
        logger.debug(
            stage::TRANSFORM,
            format!("Rule {}/{} {}: {}", i + 1, rules.len(), rule, outcome),
        );
    }

    if dataset.is_empty() {
        logger.warning(stage::TRANSFORM, "All rows were dropped by the transformation rules");
    }

    Ok(dataset)
}
