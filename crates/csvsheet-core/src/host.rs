//! Seams to the host application. The core never talks to the host
//! directly; the bindings layer (or a test double) implements these.

use serde::{Deserialize, Serialize};

use crate::error::HostError;

/// User-visible toast notifications
pub trait Notify {
    fn notify(&mut self, message: &str);
}

/// What an open CSV view needs from the host
pub trait ViewHost: Notify {
    /// Hand serialized file contents to the host's save mechanism
    fn save(&mut self, contents: &str);

    /// Close the view (detach its leaf)
    fn close_view(&mut self);

    /// Show or hide the loading indicator
    fn set_loading(&mut self, visible: bool);
}

/// File creation in the host's vault
pub trait Vault: Notify {
    fn create(&mut self, path: &str, contents: &str) -> Result<(), HostError>;
}

/// A child of a vault folder, as listed by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderEntry {
    pub basename: String,
    /// Extension without the dot; empty for folders
    #[serde(default)]
    pub extension: String,
}

impl FolderEntry {
    pub fn new(basename: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            basename: basename.into(),
            extension: extension.into(),
        }
    }
}

/// Vault path of the file shown by a view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    pub path: String,
}

impl FileRef {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// File name with extension
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// File name without its extension
    pub fn basename(&self) -> &str {
        let name = self.name();
        match name.rfind('.') {
            Some(dot) if dot > 0 => &name[..dot],
            _ => name,
        }
    }

    /// Extension without the dot
    pub fn extension(&self) -> &str {
        let name = self.name();
        match name.rfind('.') {
            Some(dot) if dot > 0 => &name[dot + 1..],
            _ => "",
        }
    }
}
