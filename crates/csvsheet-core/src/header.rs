use serde::{Deserialize, Serialize};

use crate::range::col_to_label;

/// Column labels shown above the grid
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "labels")]
pub enum ColumnHeaders {
    /// Spreadsheet letters (A, B, C, ...)
    #[default]
    Positional,
    /// The first row of the file, kept verbatim
    Labels(Vec<String>),
}

impl ColumnHeaders {
    /// Whether a row of the file is used as column labels
    pub fn is_labels(&self) -> bool {
        matches!(self, ColumnHeaders::Labels(_))
    }

    /// Label displayed for a column. Columns past the end of the label row
    /// fall back to their positional letter.
    pub fn label(&self, col: usize) -> String {
        match self {
            ColumnHeaders::Labels(labels) => labels
                .get(col)
                .cloned()
                .unwrap_or_else(|| col_to_label(col)),
            ColumnHeaders::Positional => col_to_label(col),
        }
    }

    /// Labels for the first `count` columns
    pub fn labels(&self, count: usize) -> Vec<String> {
        (0..count).map(|col| self.label(col)).collect()
    }

    /// Number of columns the label row spans (0 when positional)
    pub fn width(&self) -> usize {
        match self {
            ColumnHeaders::Labels(labels) => labels.len(),
            ColumnHeaders::Positional => 0,
        }
    }

    /// Value of the grid widget's `colHeaders` setting
    pub fn to_setting(&self) -> serde_json::Value {
        match self {
            ColumnHeaders::Positional => serde_json::Value::Bool(true),
            ColumnHeaders::Labels(labels) => serde_json::json!(labels),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_labels() {
        let headers = ColumnHeaders::Positional;
        assert!(!headers.is_labels());
        assert_eq!(headers.labels(3), vec!["A", "B", "C"]);
        assert_eq!(headers.width(), 0);
        assert_eq!(headers.to_setting(), serde_json::json!(true));
    }

    #[test]
    fn test_short_label_row_falls_back() {
        let headers = ColumnHeaders::Labels(vec!["name".into(), "age".into()]);
        assert!(headers.is_labels());
        assert_eq!(headers.labels(4), vec!["name", "age", "C", "D"]);
        assert_eq!(headers.width(), 2);
        assert_eq!(headers.to_setting(), serde_json::json!(["name", "age"]));
    }
}
