//! Transformation rules.
//!
//! A [`RuleSet`] is an ordered list of [`Rule`]s applied one after another.
//! Rules are generic cleaning mechanics; which columns they touch comes from
//! configuration. The default rule set is empty, which leaves the dataset
//! untouched.
//!
//! Rules are deserialized from JSON with a `type` tag:
//!
//! ```json
//! [
//!   { "type": "trim_whitespace" },
//!   { "type": "coerce_numeric", "columns": ["Cotton Price"], "thousands": "," },
//!   { "type": "normalize_dates", "columns": ["Month"], "formats": ["%b-%y"] },
//!   { "type": "replace", "columns": ["Rubber Price"], "pattern": "[$ ]", "value": "" },
//!   { "type": "drop_missing", "columns": ["Month"] }
//! ]
//! ```

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{TransformError, TransformResult};
use crate::models::{CellValue, Dataset};

/// Output format of `normalize_dates`.
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// A single transformation rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Rule {
    /// Strip leading and trailing whitespace from text cells, then re-read
    /// them as field values (so `" 12 "` becomes `12` and `"  "` missing).
    /// Applies to every column when `columns` is omitted.
    TrimWhitespace {
        #[serde(default)]
        columns: Option<Vec<String>>,
    },

    /// Convert text cells to numbers. Unparseable cells become missing.
    CoerceNumeric {
        columns: Vec<String>,
        /// Thousands separator removed before parsing
        #[serde(default)]
        thousands: Option<char>,
    },

    /// Parse text cells with the first matching `chrono` format and rewrite
    /// them as `YYYY-MM-DD`. Formats without a day (e.g. `%b-%y`) resolve to
    /// the first of the month. Unparseable cells become missing.
    NormalizeDates {
        columns: Vec<String>,
        formats: Vec<String>,
    },

    /// Regex replacement on text cells; the result is re-read as a field value.
    Replace {
        columns: Vec<String>,
        pattern: String,
        #[serde(default)]
        value: String,
    },

    /// Drop rows where any of `columns` is missing (any column when empty).
    DropMissing {
        #[serde(default)]
        columns: Vec<String>,
    },
}

/// What a rule did to the dataset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuleOutcome {
    /// Cells whose value changed
    pub cells_changed: usize,
    /// Cells that could not be converted and became missing
    pub cells_invalidated: usize,
    /// Rows removed
    pub rows_dropped: usize,
}

impl fmt::Display for RuleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} cells changed, {} invalidated, {} rows dropped",
            self.cells_changed, self.cells_invalidated, self.rows_dropped
        )
    }
}

impl Rule {
    /// Rule name as written in configuration.
    pub fn name(&self) -> &'static str {
        match self {
            Rule::TrimWhitespace { .. } => "trim_whitespace",
            Rule::CoerceNumeric { .. } => "coerce_numeric",
            Rule::NormalizeDates { .. } => "normalize_dates",
            Rule::Replace { .. } => "replace",
            Rule::DropMissing { .. } => "drop_missing",
        }
    }

    /// Apply this rule in place and refresh column types.
    pub fn apply(&self, dataset: &mut Dataset) -> TransformResult<RuleOutcome> {
        let outcome = match self {
            Rule::TrimWhitespace { columns } => {
                let indices = match columns {
                    Some(columns) => self.resolve(dataset, columns)?,
                    None => (0..dataset.column_count()).collect(),
                };
                map_cells(dataset, &indices, |cell| {
                    let text = cell.as_text()?;
                    Some(Converted::Value(CellValue::parse(text.trim())))
                })
            }
            Rule::CoerceNumeric { columns, thousands } => {
                let indices = self.resolve(dataset, columns)?;
                map_cells(dataset, &indices, |cell| {
                    let text = cell.as_text()?;
                    Some(coerce_number(text, *thousands))
                })
            }
            Rule::NormalizeDates { columns, formats } => {
                if formats.is_empty() {
                    return Err(self.invalid("at least one date format is required"));
                }
                let indices = self.resolve(dataset, columns)?;
                map_cells(dataset, &indices, |cell| {
                    if cell.is_missing() {
                        return None;
                    }
                    let text = cell.to_string();
                    Some(match parse_date(text.trim(), formats) {
                        Some(date) => Converted::Value(CellValue::Text(
                            date.format(ISO_DATE_FORMAT).to_string(),
                        )),
                        None => Converted::Invalid,
                    })
                })
            }
            Rule::Replace {
                columns,
                pattern,
                value,
            } => {
                let re = Regex::new(pattern).map_err(|e| self.invalid(e.to_string()))?;
                let indices = self.resolve(dataset, columns)?;
                map_cells(dataset, &indices, |cell| {
                    let text = cell.as_text()?;
                    let replaced = re.replace_all(text, value.as_str());
                    Some(Converted::Value(CellValue::parse(&replaced)))
                })
            }
            Rule::DropMissing { columns } => {
                let indices = if columns.is_empty() {
                    (0..dataset.column_count()).collect()
                } else {
                    self.resolve(dataset, columns)?
                };
                let before = dataset.row_count();
                dataset.retain_rows(|row| {
                    indices
                        .iter()
                        .all(|&i| row.get(i).is_some_and(|v| !v.is_missing()))
                });
                RuleOutcome {
                    rows_dropped: before - dataset.row_count(),
                    ..Default::default()
                }
            }
        };

        dataset.refresh_dtypes();
        Ok(outcome)
    }

    fn resolve(&self, dataset: &Dataset, columns: &[String]) -> TransformResult<Vec<usize>> {
        columns
            .iter()
            .map(|column| {
                dataset
                    .column_index(column)
                    .ok_or_else(|| TransformError::MissingColumn {
                        rule: self.name().to_string(),
                        column: column.clone(),
                    })
            })
            .collect()
    }

    fn invalid(&self, message: impl Into<String>) -> TransformError {
        TransformError::InvalidRule {
            rule: self.name().to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::TrimWhitespace { columns: None } => write!(f, "trim_whitespace (all columns)"),
            Rule::TrimWhitespace { columns: Some(c) } => write!(f, "trim_whitespace [{}]", c.join(", ")),
            Rule::CoerceNumeric { columns, .. } => write!(f, "coerce_numeric [{}]", columns.join(", ")),
            Rule::NormalizeDates { columns, formats } => write!(
                f,
                "normalize_dates [{}] using {}",
                columns.join(", "),
                formats.join(" | ")
            ),
            Rule::Replace { columns, pattern, value } => write!(
                f,
                "replace /{}/ with '{}' in [{}]",
                pattern,
                value,
                columns.join(", ")
            ),
            Rule::DropMissing { columns } if columns.is_empty() => write!(f, "drop_missing (any column)"),
            Rule::DropMissing { columns } => write!(f, "drop_missing [{}]", columns.join(", ")),
        }
    }
}

/// Result of converting one cell.
enum Converted {
    Value(CellValue),
    Invalid,
}

/// Rewrite the cells of `indices` with `convert`. `None` leaves a cell as is.
fn map_cells(
    dataset: &mut Dataset,
    indices: &[usize],
    mut convert: impl FnMut(&CellValue) -> Option<Converted>,
) -> RuleOutcome {
    let mut outcome = RuleOutcome::default();
    for &index in indices {
        for cell in dataset.column_cells_mut(index) {
            let new_value = match convert(cell) {
                None => continue,
                Some(Converted::Value(v)) => v,
                Some(Converted::Invalid) => {
                    outcome.cells_invalidated += 1;
                    CellValue::Missing
                }
            };
            if *cell != new_value {
                outcome.cells_changed += 1;
                *cell = new_value;
            }
        }
    }
    outcome
}

fn coerce_number(text: &str, thousands: Option<char>) -> Converted {
    let cleaned: String = match thousands {
        Some(sep) => text.trim().chars().filter(|c| *c != sep).collect(),
        None => text.trim().to_string(),
    };
    if let Ok(i) = cleaned.parse::<i64>() {
        return Converted::Value(CellValue::Integer(i));
    }
    match cleaned.parse::<f64>() {
        Ok(f) if f.is_finite() => Converted::Value(CellValue::Float(f)),
        _ => Converted::Invalid,
    }
}

fn parse_date(text: &str, formats: &[String]) -> Option<NaiveDate> {
    formats.iter().find_map(|format| {
        NaiveDate::parse_from_str(text, format).ok().or_else(|| {
            // Month-only formats need a day to build a date
            NaiveDate::parse_from_str(&format!("{}-01", text), &format!("{}-%d", format)).ok()
        })
    })
}

/// Ordered list of rules.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSet(Vec<Rule>);

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self(rules)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, rule: Rule) {
        self.0.push(rule);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.0.iter()
    }
}

impl From<Vec<Rule>> for RuleSet {
    fn from(rules: Vec<Rule>) -> Self {
        Self(rules)
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DType;

    fn raw_prices() -> Dataset {
        Dataset::from_strings(
            &["Month", "Cotton Price", "Rubber Price"],
            &[
                vec![" Apr-90 ", " 1.07 ", "$0.96"],
                vec!["May-90", "1,103", "$0.92"],
                vec!["", "n/a", "$0.90"],
                vec!["bad", "abc", "$0.89"],
            ],
        )
    }

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_rule_from_json() {
        let json = r#"[
            { "type": "trim_whitespace" },
            { "type": "coerce_numeric", "columns": ["Cotton Price"], "thousands": "," },
            { "type": "normalize_dates", "columns": ["Month"], "formats": ["%b-%y"] },
            { "type": "replace", "columns": ["Rubber Price"], "pattern": "\\$" },
            { "type": "drop_missing" }
        ]"#;
        let rules: RuleSet = serde_json::from_str(json).unwrap();

        assert_eq!(rules.len(), 5);
        assert_eq!(rules.rules()[0], Rule::TrimWhitespace { columns: None });
        assert_eq!(
            rules.rules()[1],
            Rule::CoerceNumeric {
                columns: cols(&["Cotton Price"]),
                thousands: Some(','),
            }
        );
        let names: Vec<&str> = rules.iter().map(Rule::name).collect();
        assert_eq!(
            names,
            ["trim_whitespace", "coerce_numeric", "normalize_dates", "replace", "drop_missing"]
        );
    }

    #[test]
    fn test_trim_whitespace_rereads_values() {
        let mut data = raw_prices();
        let outcome = Rule::TrimWhitespace { columns: None }.apply(&mut data).unwrap();

        assert_eq!(data.get(0, "Month"), Some(&CellValue::Text("Apr-90".into())));
        assert_eq!(data.get(0, "Cotton Price"), Some(&CellValue::Float(1.07)));
        assert_eq!(outcome.cells_changed, 1);
        assert_eq!(data.row_count(), 4);
    }

    #[test]
    fn test_coerce_numeric() {
        let mut data = raw_prices();
        let rule = Rule::CoerceNumeric {
            columns: cols(&["Cotton Price"]),
            thousands: Some(','),
        };
        let outcome = rule.apply(&mut data).unwrap();

        assert_eq!(data.get(0, "Cotton Price"), Some(&CellValue::Float(1.07)));
        assert_eq!(data.get(1, "Cotton Price"), Some(&CellValue::Integer(1103)));
        assert_eq!(data.get(2, "Cotton Price"), Some(&CellValue::Missing));
        assert_eq!(data.get(3, "Cotton Price"), Some(&CellValue::Missing));
        assert_eq!(outcome.cells_invalidated, 1);
        assert_eq!(data.dtype("Cotton Price"), Some(DType::Float64));
    }

    #[test]
    fn test_normalize_month_dates() {
        let mut data = raw_prices();
        let rule = Rule::NormalizeDates {
            columns: cols(&["Month"]),
            formats: vec!["%b-%y".to_string()],
        };
        let outcome = rule.apply(&mut data).unwrap();

        assert_eq!(data.get(0, "Month"), Some(&CellValue::Text("1990-04-01".into())));
        assert_eq!(data.get(1, "Month"), Some(&CellValue::Text("1990-05-01".into())));
        assert_eq!(data.get(2, "Month"), Some(&CellValue::Missing));
        assert_eq!(data.get(3, "Month"), Some(&CellValue::Missing));
        assert_eq!(outcome.cells_invalidated, 1);
    }

    #[test]
    fn test_normalize_dates_full_format() {
        let mut data = Dataset::from_strings(&["date"], &[vec!["27/10/2025"]]);
        Rule::NormalizeDates {
            columns: cols(&["date"]),
            formats: vec!["%Y-%m-%d".to_string(), "%d/%m/%Y".to_string()],
        }
        .apply(&mut data)
        .unwrap();
        assert_eq!(data.get(0, "date"), Some(&CellValue::Text("2025-10-27".into())));
    }

    #[test]
    fn test_normalize_dates_requires_format() {
        let mut data = raw_prices();
        let err = Rule::NormalizeDates {
            columns: cols(&["Month"]),
            formats: vec![],
        }
        .apply(&mut data)
        .unwrap_err();
        assert!(matches!(err, TransformError::InvalidRule { .. }));
    }

    #[test]
    fn test_replace() {
        let mut data = raw_prices();
        Rule::Replace {
            columns: cols(&["Rubber Price"]),
            pattern: r"\$".to_string(),
            value: String::new(),
        }
        .apply(&mut data)
        .unwrap();

        assert_eq!(data.get(0, "Rubber Price"), Some(&CellValue::Float(0.96)));
        assert_eq!(data.dtype("Rubber Price"), Some(DType::Float64));
    }

    #[test]
    fn test_replace_invalid_regex() {
        let mut data = raw_prices();
        let err = Rule::Replace {
            columns: cols(&["Rubber Price"]),
            pattern: "(".to_string(),
            value: String::new(),
        }
        .apply(&mut data)
        .unwrap_err();
        assert!(matches!(err, TransformError::InvalidRule { ref rule, .. } if rule == "replace"));
    }

    #[test]
    fn test_drop_missing() {
        let mut data = raw_prices();
        let outcome = Rule::DropMissing {
            columns: cols(&["Month"]),
        }
        .apply(&mut data)
        .unwrap();

        assert_eq!(outcome.rows_dropped, 1);
        assert_eq!(data.row_count(), 3);
    }

    #[test]
    fn test_drop_missing_any_column() {
        let mut data = raw_prices();
        let outcome = Rule::DropMissing { columns: vec![] }.apply(&mut data).unwrap();
        // Row 2 has both an empty Month and "n/a"
        assert_eq!(outcome.rows_dropped, 1);
    }

    #[test]
    fn test_unknown_column() {
        let mut data = raw_prices();
        let err = Rule::CoerceNumeric {
            columns: cols(&["Wheat Price"]),
            thousands: None,
        }
        .apply(&mut data)
        .unwrap_err();

        match err {
            TransformError::MissingColumn { rule, column } => {
                assert_eq!(rule, "coerce_numeric");
                assert_eq!(column, "Wheat Price");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_rule_display() {
        let rule = Rule::NormalizeDates {
            columns: cols(&["Month"]),
            formats: vec!["%b-%y".to_string()],
        };
        assert_eq!(rule.to_string(), "normalize_dates [Month] using %b-%y");
        assert_eq!(
            Rule::DropMissing { columns: vec![] }.to_string(),
            "drop_missing (any column)"
        );
    }
}
