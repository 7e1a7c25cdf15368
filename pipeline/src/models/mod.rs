//! In-memory tabular data.
//!
//! - [`Dataset`] - ordered rows with named, typed columns
//! - [`CellValue`] - a single scalar (integer, float, text or missing)
//! - [`DType`] - column type inferred from the cell values

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

// =============================================================================
// Cell values
// =============================================================================

/// Field contents read as missing values.
pub const NA_VALUES: &[&str] = &[
    "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "NULL", "null", "None", "#N/A", "<NA>",
];

/// A single typed scalar.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Missing,
    Integer(i64),
    Float(f64),
    Text(String),
}

impl CellValue {
    /// Infer the value of a raw CSV field. Empty fields, the usual
    /// not-available markers and non-finite numbers are missing.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if raw.is_empty() || NA_VALUES.contains(&trimmed) {
            return CellValue::Missing;
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return CellValue::Integer(i);
        }
        match trimmed.parse::<f64>() {
            Ok(f) if f.is_finite() => CellValue::Float(f),
            Ok(_) => CellValue::Missing,
            Err(_) => CellValue::Text(raw.to_string()),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    fn to_json(&self) -> Value {
        match self {
            CellValue::Missing => Value::Null,
            CellValue::Integer(i) => Value::from(*i),
            CellValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            CellValue::Text(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Missing => f.write_str("NaN"),
            CellValue::Integer(i) => write!(f, "{}", i),
            CellValue::Float(v) => write!(f, "{}", v),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

// =============================================================================
// Column types
// =============================================================================

/// Column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    Int64,
    Float64,
    Object,
}

impl DType {
    /// Infer a column type from its values.
    ///
    /// All integers → `Int64`; all numeric → `Float64`; any text → `Object`.
    /// A column with no values at all is `Float64`.
    pub fn infer<'a>(values: impl IntoIterator<Item = &'a CellValue>) -> Self {
        let mut dtype = DType::Int64;
        let mut seen_value = false;
        let mut seen_missing = false;

        for value in values {
            match value {
                CellValue::Missing => seen_missing = true,
                CellValue::Integer(_) => seen_value = true,
                CellValue::Float(_) => {
                    seen_value = true;
                    dtype = DType::Float64;
                }
                CellValue::Text(_) => return DType::Object,
            }
        }

        // Missing integers cannot be represented in an Int64 column
        if !seen_value || seen_missing {
            return DType::Float64;
        }
        dtype
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DType::Int64 => "int64",
            DType::Float64 => "float64",
            DType::Object => "object",
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Dataset
// =============================================================================

/// One row, positionally aligned with [`Dataset::columns`].
pub type Row = Vec<CellValue>;

/// Ordered rows with named, typed columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    columns: Vec<String>,
    dtypes: Vec<DType>,
    rows: Vec<Row>,
}

impl Dataset {
    /// Build a dataset, padding or truncating rows to the column count and
    /// inferring dtypes.
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, CellValue::Missing);
                row
            })
            .collect();
        let mut dataset = Self {
            columns,
            dtypes: Vec::new(),
            rows,
        };
        dataset.refresh_dtypes();
        dataset
    }

    /// Build a dataset from raw string fields.
    pub fn from_strings<S: AsRef<str>>(columns: &[S], rows: &[Vec<S>]) -> Self {
        let columns = columns.iter().map(|c| c.as_ref().to_string()).collect();
        let rows = rows
            .iter()
            .map(|row| row.iter().map(|v| CellValue::parse(v.as_ref())).collect())
            .collect();
        Self::new(columns, rows)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn dtypes(&self) -> &[DType] {
        &self.dtypes
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn dtype(&self, name: &str) -> Option<DType> {
        self.column_index(name).map(|i| self.dtypes[i])
    }

    /// Value at `row` in the column named `column`.
    pub fn get(&self, row: usize, column: &str) -> Option<&CellValue> {
        let col = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Non-missing value count for column `index`.
    pub fn non_null_count(&self, index: usize) -> usize {
        self.rows
            .iter()
            .filter(|row| row.get(index).is_some_and(|v| !v.is_missing()))
            .count()
    }

    /// Mutable access to every cell of column `index`.
    pub(crate) fn column_cells_mut(&mut self, index: usize) -> impl Iterator<Item = &mut CellValue> {
        self.rows.iter_mut().filter_map(move |row| row.get_mut(index))
    }

    /// Keep rows matching `keep`.
    pub(crate) fn retain_rows(&mut self, keep: impl FnMut(&Row) -> bool) {
        self.rows.retain(keep);
    }

    /// Re-infer every column type after values changed.
    pub(crate) fn refresh_dtypes(&mut self) {
        self.dtypes = (0..self.columns.len())
            .map(|i| DType::infer(self.rows.iter().filter_map(|row| row.get(i))))
            .collect();
    }

    /// First `n` rows.
    pub fn head(&self, n: usize) -> Dataset {
        Dataset {
            columns: self.columns.clone(),
            dtypes: self.dtypes.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    /// Structural summary: row and column counts plus one line per column.
    pub fn summary(&self) -> Vec<String> {
        let mut lines = vec![
            format!("Rows: {}", self.row_count()),
            format!("Columns: {}", self.column_count()),
        ];
        for (i, (name, dtype)) in self.columns.iter().zip(&self.dtypes).enumerate() {
            lines.push(format!(
                "[{:2}] {} - {} non-null - {}",
                i,
                name,
                self.non_null_count(i),
                dtype
            ));
        }
        lines
    }

    /// Rows as JSON objects keyed by column name.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl Serialize for Dataset {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeSeq;

        struct RowRef<'a>(&'a [String], &'a Row);

        impl Serialize for RowRef<'_> {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let mut map = serializer.serialize_map(Some(self.0.len()))?;
                for (name, value) in self.0.iter().zip(self.1) {
                    map.serialize_entry(name, value)?;
                }
                map.end()
            }
        }

        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for row in &self.rows {
            seq.serialize_element(&RowRef(&self.columns, row))?;
        }
        seq.end()
    }
}

impl fmt::Display for Dataset {
    /// Plain-text table with a leading row index.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(|v| v.to_string()).collect())
            .collect();

        let index_width = self.rows.len().saturating_sub(1).to_string().len();
        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, name)| {
                cells
                    .iter()
                    .map(|row| row[i].chars().count())
                    .chain(std::iter::once(name.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        write!(f, "{:width$}", "", width = index_width)?;
        for (name, width) in self.columns.iter().zip(&widths) {
            write!(f, "  {:>width$}", name, width = *width)?;
        }
        for (i, row) in cells.iter().enumerate() {
            writeln!(f)?;
            write!(f, "{:>width$}", i, width = index_width)?;
            for (value, width) in row.iter().zip(&widths) {
                write!(f, "  {:>width$}", value, width = *width)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prices() -> Dataset {
        Dataset::from_strings(
            &["Month", "Coarse wool Price", "Copra Price"],
            &[
                vec!["Apr-90", "482.34", "236"],
                vec!["May-90", "447.26", "234"],
                vec!["Jun-90", "", "216"],
            ],
        )
    }

    #[test]
    fn test_cell_parse() {
        assert_eq!(CellValue::parse(""), CellValue::Missing);
        assert_eq!(CellValue::parse("42"), CellValue::Integer(42));
        assert_eq!(CellValue::parse("-1.5"), CellValue::Float(-1.5));
        assert_eq!(CellValue::parse("Apr-90"), CellValue::Text("Apr-90".into()));
        assert_eq!(CellValue::parse(" 7 "), CellValue::Integer(7));
        assert_eq!(CellValue::parse("   "), CellValue::Text("   ".into()));
        assert_eq!(CellValue::parse("NaN"), CellValue::Missing);
        assert_eq!(CellValue::parse("N/A"), CellValue::Missing);
    }

    #[test]
    fn test_cell_parse_nan_spellings_missing() {
        assert_eq!(CellValue::parse("NAN"), CellValue::Missing);
        assert_eq!(CellValue::parse(" NaN "), CellValue::Missing);
        assert_eq!(CellValue::parse(" N/A "), CellValue::Missing);
        assert_eq!(CellValue::parse("inf"), CellValue::Missing);
        assert_eq!(CellValue::parse("-Infinity"), CellValue::Missing);
    }

    #[test]
    fn test_dataset_with_nan_markers_equals_clone() {
        let data = Dataset::from_strings(&["Price"], &[vec!["NAN"], vec!["1.5"], vec!["inf"]]);
        assert_eq!(data, data.clone());
        assert_eq!(data.non_null_count(0), 1);
        assert!(prices().summary()[3].contains("2 non-null"));
    }

    #[test]
    fn test_dtype_inference() {
        let data = prices();
        assert_eq!(data.dtype("Month"), Some(DType::Object));
        assert_eq!(data.dtype("Coarse wool Price"), Some(DType::Float64));
        assert_eq!(data.dtype("Copra Price"), Some(DType::Int64));
    }

    #[test]
    fn test_dtype_int_with_missing_is_float() {
        let values = [CellValue::Integer(1), CellValue::Missing];
        assert_eq!(DType::infer(&values), DType::Float64);
        assert_eq!(DType::infer(&[CellValue::Missing]), DType::Float64);
        assert_eq!(DType::infer(std::iter::empty()), DType::Float64);
    }

    #[test]
    fn test_get_and_counts() {
        let data = prices();
        assert_eq!(data.row_count(), 3);
        assert_eq!(data.column_count(), 3);
        assert_eq!(data.get(1, "Copra Price"), Some(&CellValue::Integer(234)));
        assert_eq!(data.get(2, "Coarse wool Price"), Some(&CellValue::Missing));
        assert_eq!(data.get(0, "Unknown"), None);
        assert_eq!(data.non_null_count(1), 2);
    }

    #[test]
    fn test_short_rows_padded() {
        let data = Dataset::new(
            vec!["a".into(), "b".into()],
            vec![vec![CellValue::Integer(1)]],
        );
        assert_eq!(data.get(0, "b"), Some(&CellValue::Missing));
    }

    #[test]
    fn test_head() {
        let data = prices();
        let head = data.head(2);
        assert_eq!(head.row_count(), 2);
        assert_eq!(head.columns(), data.columns());
        assert_eq!(data.head(10).row_count(), 3);
    }

    #[test]
    fn test_summary() {
        let summary = prices().summary();
        assert_eq!(summary[0], "Rows: 3");
        assert_eq!(summary[1], "Columns: 3");
        assert!(summary[3].contains("Coarse wool Price - 2 non-null - float64"));
    }

    #[test]
    fn test_to_json() {
        let json = prices().head(1).to_json().unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["Month"], "Apr-90");
        assert_eq!(value[0]["Copra Price"], 236);
    }

    #[test]
    fn test_display_table() {
        let text = prices().head(2).to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("Month"));
        assert!(lines[1].starts_with('0'));
        assert!(lines[2].contains("May-90"));
    }
}
