use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::SettingsError;
use crate::filter::{ColumnFilter, ColumnSort};

/// Presentation state remembered for one file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileSettings {
    /// Whether the first row is used as column labels
    pub has_headings: bool,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub column_widths: BTreeMap<usize, f64>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub filters: BTreeMap<usize, ColumnFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<ColumnSort>,
}

/// Key-value store of [`FileSettings`], keyed by file path
pub trait SettingsStore {
    /// Settings stored for `path`, if the file was opened before
    fn load(&self, path: &str) -> Option<FileSettings>;

    /// Store the settings for `path`, replacing any previous entry
    fn save(&mut self, path: &str, settings: FileSettings) -> Result<(), SettingsError>;

    /// Read-modify-write helper; a missing entry starts from the defaults
    fn update<F>(&mut self, path: &str, apply: F) -> Result<FileSettings, SettingsError>
    where
        F: FnOnce(&mut FileSettings),
        Self: Sized,
    {
        let mut settings = self.load(path).unwrap_or_default();
        apply(&mut settings);
        self.save(path, settings.clone())?;
        Ok(settings)
    }
}

/// In-memory settings store that serializes to a single JSON object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemorySettingsStore {
    files: BTreeMap<String, FileSettings>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a store from JSON; empty input yields an empty store
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        if json.trim().is_empty() {
            return Ok(Self::new());
        }
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self, path: &str) -> Option<FileSettings> {
        self.files.get(path).cloned()
    }

    fn save(&mut self, path: &str, settings: FileSettings) -> Result<(), SettingsError> {
        self.files.insert(path.to_string(), settings);
        Ok(())
    }
}
