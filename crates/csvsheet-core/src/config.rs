use serde::{Deserialize, Serialize};

use crate::codec::CsvDialect;
use crate::error::ConfigError;
use crate::header::ColumnHeaders;

/// Plugin configuration, read from the host's plugin data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewConfig {
    /// Initial state of the autosave toggle for new views
    pub autosave: bool,
    /// Delay before a deferred load parses the file text
    pub load_delay_ms: u32,
    /// Fields per line of a new file's template
    pub new_file_rows: usize,
    /// Lines of a new file's template
    pub new_file_cols: usize,
    pub dialect: CsvDialect,
    pub grid: GridOptions,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            autosave: true,
            load_delay_ms: 50,
            new_file_rows: 4,
            new_file_cols: 4,
            dialect: CsvDialect::default(),
            grid: GridOptions::default(),
        }
    }
}

impl ViewConfig {
    /// Parse configuration JSON; missing keys take their defaults and empty
    /// input yields the default configuration
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(json)?)
    }
}

/// Settings handed to the grid widget, named as the widget expects them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GridOptions {
    pub row_headers: bool,
    pub auto_column_size: bool,
    pub auto_row_size: bool,
    pub renderer: String,
    pub editor: String,
    pub class_name: String,
    pub context_menu: bool,
    pub current_row_class_name: String,
    pub current_col_class_name: String,
    pub column_sorting: bool,
    pub dropdown_menu: bool,
    pub filters: bool,
    pub manual_column_freeze: bool,
    pub manual_column_resize: bool,
    pub manual_row_resize: bool,
    pub search: bool,
    pub height: String,
    pub width: String,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            row_headers: true,
            auto_column_size: true,
            auto_row_size: true,
            renderer: "markdown".to_string(),
            editor: "markdown".to_string(),
            class_name: "csv-table".to_string(),
            context_menu: true,
            current_row_class_name: "active-row".to_string(),
            current_col_class_name: "active-col".to_string(),
            column_sorting: true,
            dropdown_menu: true,
            filters: true,
            manual_column_freeze: true,
            manual_column_resize: true,
            manual_row_resize: true,
            search: true,
            height: "100%".to_string(),
            width: "100%".to_string(),
        }
    }
}

impl GridOptions {
    /// Full widget settings for the current label state. Row and column
    /// moving are always off: the grid model has no reorder operations.
    pub fn to_widget_settings(&self, headers: &ColumnHeaders) -> serde_json::Value {
        let mut settings = serde_json::to_value(self).unwrap_or_else(|_| serde_json::json!({}));
        if let Some(map) = settings.as_object_mut() {
            map.insert("colHeaders".to_string(), headers.to_setting());
            map.insert("manualColumnMove".to_string(), false.into());
            map.insert("manualRowMove".to_string(), false.into());
        }
        settings
    }
}
