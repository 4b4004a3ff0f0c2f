//! JavaScript side of the host seams.
//!
//! The plugin shell passes in plain JS objects; the bridges below adapt them
//! to the core's `ViewHost`, `SettingsStore`, `Vault` and `RichTextEditor`
//! traits.

use csvsheet_core::{
    FileSettings, HostError, MemorySettingsStore, Notify, RichTextEditor, SettingsError,
    SettingsStore, Vault, ViewHost,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

#[wasm_bindgen]
extern "C" {
    /// The view object owned by the plugin shell
    #[derive(Clone)]
    pub type JsViewHost;

    #[wasm_bindgen(method)]
    fn notify(this: &JsViewHost, message: &str);

    #[wasm_bindgen(method, js_name = saveData)]
    fn save_data(this: &JsViewHost, contents: &str);

    #[wasm_bindgen(method, js_name = closeView)]
    fn close_view(this: &JsViewHost);

    #[wasm_bindgen(method, js_name = setLoading)]
    fn set_loading(this: &JsViewHost, visible: bool);

    /// Write the whole settings object to the plugin's data file
    #[wasm_bindgen(method, catch, js_name = persistSettings)]
    fn persist_settings(this: &JsViewHost, json: &str) -> Result<(), JsValue>;

    /// The vault API, narrowed to file creation and notices
    pub type JsVault;

    #[wasm_bindgen(method, catch)]
    fn create(this: &JsVault, path: &str, contents: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(method)]
    fn notify(this: &JsVault, message: &str);

    /// The markdown editor mounted in the cell editor container
    pub type JsRichTextEditor;

    #[wasm_bindgen(method, js_name = getValue)]
    fn get_value(this: &JsRichTextEditor) -> String;

    #[wasm_bindgen(method, js_name = setValue)]
    fn set_value(this: &JsRichTextEditor, value: &str);

    #[wasm_bindgen(method)]
    fn focus(this: &JsRichTextEditor);

    #[wasm_bindgen(method)]
    fn refresh(this: &JsRichTextEditor);
}

/// Best-effort text of a thrown JS value
pub(crate) fn js_message(err: &JsValue) -> String {
    if let Some(text) = err.as_string() {
        return text;
    }
    match err.dyn_ref::<js_sys::Error>() {
        Some(error) => String::from(error.message()),
        None => format!("{:?}", err),
    }
}

pub struct HostBridge {
    host: JsViewHost,
}

impl HostBridge {
    pub fn new(host: JsViewHost) -> Self {
        Self { host }
    }
}

impl Notify for HostBridge {
    fn notify(&mut self, message: &str) {
        self.host.notify(message);
    }
}

impl ViewHost for HostBridge {
    fn save(&mut self, contents: &str) {
        self.host.save_data(contents);
    }

    fn close_view(&mut self) {
        self.host.close_view();
    }

    fn set_loading(&mut self, visible: bool) {
        self.host.set_loading(visible);
    }
}

/// Settings kept in memory and written through to the plugin data on save
pub struct JsSettingsStore {
    store: MemorySettingsStore,
    host: JsViewHost,
}

impl JsSettingsStore {
    pub fn new(store: MemorySettingsStore, host: JsViewHost) -> Self {
        Self { store, host }
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        self.store.to_json()
    }
}

impl SettingsStore for JsSettingsStore {
    fn load(&self, path: &str) -> Option<FileSettings> {
        self.store.load(path)
    }

    fn save(&mut self, path: &str, settings: FileSettings) -> Result<(), SettingsError> {
        self.store.save(path, settings)?;
        let json = self.store.to_json()?;
        self.host
            .persist_settings(&json)
            .map_err(|err| SettingsError::Persist(js_message(&err)))
    }
}

pub struct VaultBridge {
    vault: JsVault,
}

impl VaultBridge {
    pub fn new(vault: JsVault) -> Self {
        Self { vault }
    }
}

impl Notify for VaultBridge {
    fn notify(&mut self, message: &str) {
        self.vault.notify(message);
    }
}

impl Vault for VaultBridge {
    fn create(&mut self, path: &str, contents: &str) -> Result<(), HostError> {
        self.vault
            .create(path, contents)
            .map_err(|err| HostError(js_message(&err)))
    }
}

pub struct EditorBridge {
    editor: JsRichTextEditor,
}

impl EditorBridge {
    pub fn new(editor: JsRichTextEditor) -> Self {
        Self { editor }
    }
}

impl RichTextEditor for EditorBridge {
    fn value(&self) -> String {
        self.editor.get_value()
    }

    fn set_value(&mut self, value: &str) {
        self.editor.set_value(value);
    }

    fn focus(&mut self) {
        self.editor.focus();
    }

    fn refresh(&mut self) {
        self.editor.refresh();
    }
}
