use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::grid::Grid;

/// Options for searching the displayed cells of a grid
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOptions {
    /// The search query (literal string or regex pattern)
    pub query: String,
    /// Whether to match case-sensitively
    #[serde(default)]
    pub match_case: bool,
    /// Whether the entire cell value must match (vs. partial match)
    #[serde(default)]
    pub match_entire_cell: bool,
    /// Whether to interpret query as a regex pattern
    #[serde(default)]
    pub use_regex: bool,
}

impl SearchOptions {
    pub fn literal(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }
}

/// A single search hit, addressed in visual grid coordinates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub row: usize,
    pub col: usize,
    /// The matched portion of text
    pub matched_text: String,
    /// The full cell value (for context)
    pub cell_value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("Invalid regex pattern: {0}")]
    InvalidRegex(String),
}

/// Compile the options into a single regex. Literal queries are escaped so
/// both modes share case folding and whole-cell anchoring.
fn build_matcher(options: &SearchOptions) -> Result<Regex, SearchError> {
    let pattern = if options.use_regex {
        options.query.clone()
    } else {
        regex::escape(&options.query)
    };
    let pattern = if options.match_entire_cell {
        format!("^(?:{})$", pattern)
    } else {
        pattern
    };

    RegexBuilder::new(&pattern)
        .case_insensitive(!options.match_case)
        .build()
        .map_err(|e| SearchError::InvalidRegex(e.to_string()))
}

/// Search the displayed rows of the grid, in display order, row by row.
/// An empty query matches nothing.
pub fn search(grid: &Grid, options: &SearchOptions) -> Result<Vec<SearchResult>, SearchError> {
    if options.query.is_empty() {
        return Ok(Vec::new());
    }
    let matcher = build_matcher(options)?;

    let mut results = Vec::new();
    for (visual_row, &physical_row) in grid.visible_rows().iter().enumerate() {
        for (col, value) in grid.source_data()[physical_row].iter().enumerate() {
            if let Some(found) = matcher.find(value) {
                results.push(SearchResult {
                    row: visual_row,
                    col,
                    matched_text: found.as_str().to_string(),
                    cell_value: value.clone(),
                });
            }
        }
    }

    Ok(results)
}
