use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// A condition restricting which rows are displayed for one column.
/// Filters change the view only; saved data always includes every row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ColumnFilter {
    /// Keep rows whose cell is one of the listed values
    #[serde(rename_all = "camelCase")]
    Values { values: BTreeSet<String> },
    /// Keep rows whose cell contains the text
    #[serde(rename_all = "camelCase")]
    Contains {
        text: String,
        #[serde(default)]
        match_case: bool,
    },
}

impl ColumnFilter {
    pub fn values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ColumnFilter::Values {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(text: impl Into<String>) -> Self {
        ColumnFilter::Contains {
            text: text.into(),
            match_case: false,
        }
    }

    /// Check whether a cell value passes the filter (missing cells are "")
    pub fn matches(&self, value: &str) -> bool {
        match self {
            ColumnFilter::Values { values } => values.contains(value),
            ColumnFilter::Contains { text, match_case } => {
                if *match_case {
                    value.contains(text.as_str())
                } else {
                    value.to_lowercase().contains(&text.to_lowercase())
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Single-column sort applied to the displayed rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSort {
    pub column: usize,
    #[serde(default)]
    pub order: SortOrder,
}

impl ColumnSort {
    pub fn new(column: usize, order: SortOrder) -> Self {
        Self { column, order }
    }

    /// Compare two cell values. Finite numbers sort before text and compare
    /// numerically; text compares lexically. Empty cells always sort last
    /// regardless of order.
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        match (a.is_empty(), b.is_empty()) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Greater,
            (false, true) => return Ordering::Less,
            (false, false) => {}
        }

        let ordering = match (numeric_key(a), numeric_key(b)) {
            (Some(x), Some(y)) => x.total_cmp(&y).then_with(|| a.cmp(b)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.cmp(b),
        };

        match self.order {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    }
}

/// Numeric value of a cell; NaN and infinities count as text
fn numeric_key(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
}
