use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Category of a CSV parse problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseIssueKind {
    /// Quote structure is broken
    Quotes,
    /// The tokenizer rejected the input
    Tokenizer,
}

/// A single structured parse error reported to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseIssue {
    #[serde(rename = "type")]
    pub kind: ParseIssueKind,
    /// Stable identifier ("MissingQuotes", "InvalidQuotes", "Malformed")
    pub code: String,
    /// Human readable message, shown as-is in a notification
    pub message: String,
    /// Zero-based record index where the problem was found
    pub row: usize,
}

impl ParseIssue {
    pub fn missing_quotes(row: usize) -> Self {
        Self {
            kind: ParseIssueKind::Quotes,
            code: "MissingQuotes".to_string(),
            message: "Quoted field unterminated".to_string(),
            row,
        }
    }

    pub fn invalid_quotes(row: usize) -> Self {
        Self {
            kind: ParseIssueKind::Quotes,
            code: "InvalidQuotes".to_string(),
            message: "Trailing quote on quoted field is malformed".to_string(),
            row,
        }
    }

    pub fn malformed(row: usize, message: impl Into<String>) -> Self {
        Self {
            kind: ParseIssueKind::Tokenizer,
            code: "Malformed".to_string(),
            message: message.into(),
            row,
        }
    }
}

/// Errors raised while reading or writing CSV text
#[derive(Debug, Error)]
pub enum CsvError {
    #[error("CSV parse failed with {} error(s)", .0.len())]
    Parse(Vec<ParseIssue>),

    #[error("Delimiter must be a single ASCII character, got {0:?}")]
    InvalidDelimiter(char),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialized CSV is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Errors raised by grid edits addressed outside the data
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("Row {0} is out of range")]
    RowOutOfRange(usize),

    #[error("Column {0} is out of range")]
    ColumnOutOfRange(usize),
}

/// Errors raised by the per-file settings store
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Settings serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Settings could not be persisted: {0}")]
    Persist(String),
}

/// Error reported by a host integration point (vault, notices, saving)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Host error: {0}")]
pub struct HostError(pub String);

/// Errors raised by the view controller
#[derive(Debug, Error)]
pub enum ViewError {
    #[error(transparent)]
    Csv(#[from] CsvError),

    #[error(transparent)]
    Grid(#[from] GridError),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Host(#[from] HostError),

    #[error("No file is bound to this view")]
    NoFile,
}

impl ViewError {
    /// Short machine readable code for the bindings layer
    pub fn code(&self) -> &'static str {
        match self {
            ViewError::Csv(CsvError::Parse(_)) => "PARSE_ERROR",
            ViewError::Csv(_) => "CSV_ERROR",
            ViewError::Grid(_) => "GRID_ERROR",
            ViewError::Settings(_) => "SETTINGS_ERROR",
            ViewError::Host(_) => "HOST_ERROR",
            ViewError::NoFile => "NO_FILE",
        }
    }

    /// Messages to surface as notifications, one per notice
    pub fn notices(&self) -> Vec<String> {
        match self {
            ViewError::Csv(CsvError::Parse(issues)) => {
                issues.iter().map(|issue| issue.message.clone()).collect()
            }
            other => vec![other.to_string()],
        }
    }
}

/// Errors raised while reading the plugin configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
}
