use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use csvsheet_core::{
    create_csv_file, empty_csv, untitled_name, CellCoord, ChangeSource, ColumnFilter, ColumnSort,
    ConfigError, CsvView, EditorPlacement, FolderEntry, GridMeasurement, HostError,
    MarkdownCellEditor, MemorySettingsStore, SearchError, SearchOptions, SettingsError, ViewConfig,
    SettingsStore, ViewError, ViewHost, EXTENSION, VIEW_ICON, VIEW_TYPE,
};
use serde::Serialize;
use tracing::{debug, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::host::{
    js_message, EditorBridge, HostBridge, JsRichTextEditor, JsSettingsStore, JsVault, JsViewHost,
    VaultBridge,
};

type View = CsvView<HostBridge, JsSettingsStore>;

/// Structured error object for JavaScript
#[derive(Debug, Serialize, PartialEq)]
pub struct JsCsvError {
    code: String,
    message: String,
}

impl JsCsvError {
    fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

impl From<ViewError> for JsCsvError {
    fn from(err: ViewError) -> Self {
        Self::new(err.code(), err.to_string())
    }
}

impl From<SearchError> for JsCsvError {
    fn from(err: SearchError) -> Self {
        Self::new("SEARCH_ERROR", err.to_string())
    }
}

impl From<ConfigError> for JsCsvError {
    fn from(err: ConfigError) -> Self {
        Self::new("CONFIG_ERROR", err.to_string())
    }
}

impl From<SettingsError> for JsCsvError {
    fn from(err: SettingsError) -> Self {
        Self::new("SETTINGS_ERROR", err.to_string())
    }
}

impl From<HostError> for JsCsvError {
    fn from(err: HostError) -> Self {
        Self::new("HOST_ERROR", err.to_string())
    }
}

impl From<serde_wasm_bindgen::Error> for JsCsvError {
    fn from(err: serde_wasm_bindgen::Error) -> Self {
        Self::new("INVALID_ARGUMENT", err.to_string())
    }
}

fn to_js_error(err: impl Into<JsCsvError>) -> JsValue {
    let js_error = err.into();
    serde_wasm_bindgen::to_value(&js_error).unwrap_or(JsValue::NULL)
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(to_js_error)
}

/// `null`/`undefined` become `None`, anything else is deserialized
fn from_js_optional<T: serde::de::DeserializeOwned>(value: JsValue) -> Result<Option<T>, JsValue> {
    if value.is_null() || value.is_undefined() {
        return Ok(None);
    }
    serde_wasm_bindgen::from_value(value)
        .map(Some)
        .map_err(to_js_error)
}

/// Complete a pending load unless the view is borrowed elsewhere.
/// Returns false when the view was busy and nothing ran.
fn try_complete_load<H: ViewHost, S: SettingsStore>(view: &RefCell<CsvView<H, S>>) -> bool {
    match view.try_borrow_mut() {
        Ok(mut view) => {
            if let Err(err) = view.complete_load() {
                debug!(code = err.code(), "deferred load failed");
            }
            true
        }
        Err(_) => false,
    }
}

/// Run the view's pending load after `delay` ms. A view that is borrowed
/// when the timer fires (a JS call is still on the stack) is tried again.
fn schedule_load(pending: Rc<RefCell<View>>, delay: u32) -> Result<(), JsValue> {
    let window = web_sys::window()
        .ok_or_else(|| to_js_error(HostError("no window available".to_string())))?;

    let callback = Closure::once_into_js(move || {
        if !try_complete_load(&pending) {
            debug!("view busy, retrying deferred load");
            if let Err(err) = schedule_load(pending, delay) {
                warn!(error = %js_message(&err), "could not retry deferred load");
            }
        }
    });

    window.set_timeout_with_callback_and_timeout_and_arguments_0(
        callback.unchecked_ref(),
        i32::try_from(delay).unwrap_or(i32::MAX),
    )?;
    Ok(())
}

/// A CSV file opened in a grid view
#[wasm_bindgen]
pub struct CsvSheetView {
    inner: Rc<RefCell<View>>,
}

#[wasm_bindgen]
impl CsvSheetView {
    /// `config_json` is the plugin configuration, `settings_json` the
    /// per-file settings saved by earlier sessions (both may be empty)
    #[wasm_bindgen(constructor)]
    pub fn new(
        host: JsViewHost,
        config_json: &str,
        settings_json: &str,
    ) -> Result<CsvSheetView, JsValue> {
        let config = ViewConfig::from_json(config_json).map_err(to_js_error)?;
        let store = MemorySettingsStore::from_json(settings_json).map_err(to_js_error)?;
        let settings = JsSettingsStore::new(store, host.clone());
        let view = CsvView::new(HostBridge::new(host), settings, config);

        Ok(Self {
            inner: Rc::new(RefCell::new(view)),
        })
    }

    #[wasm_bindgen(js_name = getViewType)]
    pub fn view_type() -> String {
        VIEW_TYPE.to_string()
    }

    #[wasm_bindgen(js_name = getIcon)]
    pub fn icon() -> String {
        VIEW_ICON.to_string()
    }

    #[wasm_bindgen(js_name = getExtension)]
    pub fn extension() -> String {
        EXTENSION.to_string()
    }

    #[wasm_bindgen(js_name = canAcceptExtension)]
    pub fn can_accept_extension(extension: &str) -> bool {
        View::can_accept_extension(extension)
    }

    #[wasm_bindgen(js_name = setFile)]
    pub fn set_file(&self, path: &str) {
        self.inner.borrow_mut().set_file(path);
    }

    #[wasm_bindgen(js_name = unloadFile)]
    pub fn unload_file(&self) {
        self.inner.borrow_mut().unload_file();
    }

    #[wasm_bindgen(js_name = getDisplayText)]
    pub fn display_text(&self) -> String {
        self.inner.borrow().display_text()
    }

    /// Receive file contents. The loading indicator shows at once; parsing
    /// runs after the configured delay so the indicator can paint.
    #[wasm_bindgen(js_name = setViewData)]
    pub fn set_view_data(&self, data: String) -> Result<(), JsValue> {
        let delay = {
            let mut view = self.inner.borrow_mut();
            view.set_view_data(data);
            view.config().load_delay_ms
        };

        schedule_load(Rc::clone(&self.inner), delay)
    }

    /// Run a pending load right away
    #[wasm_bindgen(js_name = completeLoad)]
    pub fn complete_load(&self) -> Result<(), JsValue> {
        self.inner.borrow_mut().complete_load().map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = isLoading)]
    pub fn is_loading(&self) -> bool {
        self.inner.borrow().is_loading()
    }

    #[wasm_bindgen(js_name = getViewData)]
    pub fn view_data(&self) -> Result<String, JsValue> {
        self.inner.borrow().view_data().map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = toggleHeaders)]
    pub fn toggle_headers(&self, enabled: bool) -> Result<(), JsValue> {
        self.inner
            .borrow_mut()
            .toggle_headers(enabled)
            .map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = hasHeaders)]
    pub fn has_headers(&self) -> bool {
        self.inner.borrow().has_headers()
    }

    #[wasm_bindgen(js_name = setAutoSave)]
    pub fn set_autosave(&self, enabled: bool) {
        self.inner.borrow_mut().set_autosave(enabled);
    }

    #[wasm_bindgen(js_name = isAutoSave)]
    pub fn autosave(&self) -> bool {
        self.inner.borrow().autosave()
    }

    #[wasm_bindgen(js_name = isSaveEnabled)]
    pub fn save_enabled(&self) -> bool {
        self.inner.borrow().save_enabled()
    }

    /// Manual save; returns false when autosave is on
    #[wasm_bindgen]
    pub fn save(&self) -> Result<bool, JsValue> {
        self.inner.borrow_mut().save().map_err(to_js_error)
    }

    /// Forward the widget's afterChange hook
    #[wasm_bindgen(js_name = onChange)]
    pub fn on_change(&self, source: &str) -> Result<bool, JsValue> {
        self.inner
            .borrow_mut()
            .on_change(ChangeSource::from_widget(source))
            .map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = getCell)]
    pub fn cell(&self, row: usize, col: usize) -> Option<String> {
        self.inner.borrow().grid().cell(row, col).map(str::to_string)
    }

    #[wasm_bindgen(js_name = setCell)]
    pub fn set_cell(&self, row: usize, col: usize, value: &str, source: &str) -> Result<bool, JsValue> {
        self.inner
            .borrow_mut()
            .set_cell(row, col, value, ChangeSource::from_widget(source))
            .map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = insertRow)]
    pub fn insert_row(&self, row: usize) -> Result<bool, JsValue> {
        self.inner.borrow_mut().insert_row(row).map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = removeRow)]
    pub fn remove_row(&self, row: usize) -> Result<bool, JsValue> {
        self.inner.borrow_mut().remove_row(row).map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = insertCol)]
    pub fn insert_col(&self, col: usize) -> Result<bool, JsValue> {
        self.inner.borrow_mut().insert_col(col).map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = removeCol)]
    pub fn remove_col(&self, col: usize) -> Result<bool, JsValue> {
        self.inner.borrow_mut().remove_col(col).map_err(to_js_error)
    }

    /// `sort` is `{column, order}` or null to clear
    #[wasm_bindgen(js_name = sortBy)]
    pub fn sort_by(&self, sort: JsValue) -> Result<bool, JsValue> {
        let sort: Option<ColumnSort> = from_js_optional(sort)?;
        self.inner.borrow_mut().sort_by(sort).map_err(to_js_error)
    }

    /// `filter` is a column filter object or null to clear
    #[wasm_bindgen(js_name = setFilter)]
    pub fn set_filter(&self, col: usize, filter: JsValue) -> Result<(), JsValue> {
        let filter: Option<ColumnFilter> = from_js_optional(filter)?;
        self.inner
            .borrow_mut()
            .set_filter(col, filter)
            .map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = resizeColumn)]
    pub fn resize_column(&self, col: usize, width: f64) -> Result<(), JsValue> {
        self.inner
            .borrow_mut()
            .resize_column(col, width)
            .map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = columnWidths)]
    pub fn column_widths(&self) -> Result<JsValue, JsValue> {
        let widths: BTreeMap<String, f64> = self
            .inner
            .borrow()
            .grid()
            .col_widths()
            .iter()
            .map(|(col, width)| (col.to_string(), *width))
            .collect();
        to_js(&widths)
    }

    #[wasm_bindgen]
    pub fn search(&self, options: JsValue) -> Result<JsValue, JsValue> {
        let options: SearchOptions = serde_wasm_bindgen::from_value(options).map_err(to_js_error)?;
        let results = self.inner.borrow().search(&options).map_err(to_js_error)?;
        to_js(&results)
    }

    /// Settings object for the grid widget
    #[wasm_bindgen(js_name = gridSettings)]
    pub fn grid_settings(&self) -> Result<JsValue, JsValue> {
        to_js(&self.inner.borrow().widget_settings())
    }

    /// Rows as displayed: filtered and sorted, labels excluded
    #[wasm_bindgen(js_name = displayedData)]
    pub fn displayed_data(&self) -> Result<JsValue, JsValue> {
        to_js(&self.inner.borrow().grid().displayed_data())
    }

    #[wasm_bindgen(js_name = sourceData)]
    pub fn source_data(&self) -> Result<JsValue, JsValue> {
        to_js(self.inner.borrow().grid().source_data())
    }

    #[wasm_bindgen(js_name = settingsJson)]
    pub fn settings_json(&self) -> Result<String, JsValue> {
        self.inner.borrow().settings().to_json().map_err(to_js_error)
    }

    #[wasm_bindgen]
    pub fn clear(&self) {
        self.inner.borrow_mut().clear();
    }
}

/// Markdown editor overlay for grid cells
#[wasm_bindgen]
pub struct CellEditor {
    inner: MarkdownCellEditor<EditorBridge>,
}

#[derive(Serialize)]
struct FinishedEdit {
    row: usize,
    col: usize,
    value: String,
}

fn placement_to_js(placement: Option<&EditorPlacement>) -> Result<JsValue, JsValue> {
    match placement {
        Some(placement) => to_js(placement),
        None => Ok(JsValue::NULL),
    }
}

#[wasm_bindgen]
impl CellEditor {
    #[wasm_bindgen(constructor)]
    pub fn new(editor: JsRichTextEditor) -> CellEditor {
        Self {
            inner: MarkdownCellEditor::new(EditorBridge::new(editor)),
        }
    }

    /// Load `value` and open over the measured cell. Returns the container
    /// placement, or null when the cell is not rendered.
    #[wasm_bindgen(js_name = beginEditing)]
    pub fn begin_editing(
        &mut self,
        measurement: JsValue,
        row: usize,
        col: usize,
        value: &str,
    ) -> Result<JsValue, JsValue> {
        let grid: GridMeasurement = serde_wasm_bindgen::from_value(measurement).map_err(to_js_error)?;
        self.inner.begin_editing(&grid, CellCoord::new(row, col), value);
        placement_to_js(self.inner.placement())
    }

    #[wasm_bindgen]
    pub fn open(&mut self, measurement: JsValue, row: usize, col: usize) -> Result<JsValue, JsValue> {
        let grid: GridMeasurement = serde_wasm_bindgen::from_value(measurement).map_err(to_js_error)?;
        self.inner.open(&grid, CellCoord::new(row, col));
        placement_to_js(self.inner.placement())
    }

    #[wasm_bindgen(js_name = refreshDimensions)]
    pub fn refresh_dimensions(&mut self, measurement: JsValue) -> Result<JsValue, JsValue> {
        let grid: GridMeasurement = serde_wasm_bindgen::from_value(measurement).map_err(to_js_error)?;
        self.inner.refresh_dimensions(&grid);
        placement_to_js(self.inner.placement())
    }

    #[wasm_bindgen]
    pub fn focus(&mut self) {
        self.inner.focus();
    }

    #[wasm_bindgen]
    pub fn close(&mut self) {
        self.inner.close();
    }

    #[wasm_bindgen(js_name = isOpen)]
    pub fn is_open(&self) -> bool {
        self.inner.is_open()
    }

    #[wasm_bindgen(js_name = getValue)]
    pub fn value(&self) -> String {
        self.inner.value()
    }

    #[wasm_bindgen(js_name = setValue)]
    pub fn set_value(&mut self, value: &str) {
        self.inner.set_value(value);
    }

    /// Close and return `{row, col, value}`, or null when nothing was open
    #[wasm_bindgen(js_name = finishEditing)]
    pub fn finish_editing(&mut self) -> Result<JsValue, JsValue> {
        match self.inner.finish_editing() {
            Some((cell, value)) => to_js(&FinishedEdit {
                row: cell.row,
                col: cell.col,
                value,
            }),
            None => Ok(JsValue::NULL),
        }
    }
}

/// Contents of a new file: `cols` lines of `rows` empty quoted fields
#[wasm_bindgen(js_name = createEmptyCsv)]
pub fn create_empty_csv(rows: usize, cols: usize) -> String {
    empty_csv(rows, cols)
}

#[wasm_bindgen(js_name = untitledName)]
pub fn next_untitled_name(children: JsValue) -> Result<String, JsValue> {
    let children: Vec<FolderEntry> = serde_wasm_bindgen::from_value(children).map_err(to_js_error)?;
    Ok(untitled_name(&children))
}

/// Folder context menu action. Returns the created file's path.
#[wasm_bindgen(js_name = createCsvFile)]
pub fn create_file(
    vault: JsVault,
    folder: &str,
    children: JsValue,
    config_json: &str,
) -> Result<String, JsValue> {
    let children: Vec<FolderEntry> = serde_wasm_bindgen::from_value(children).map_err(to_js_error)?;
    let config = ViewConfig::from_json(config_json).map_err(to_js_error)?;
    let mut vault = VaultBridge::new(vault);
    create_csv_file(&mut vault, folder, &children, &config).map_err(|err| {
        warn!(folder, error = %err, "could not create CSV file");
        to_js_error(err)
    })
}

/// Placement of the editor container for a measured cell, or null
#[wasm_bindgen(js_name = placeEditor)]
pub fn place_editor(measurement: JsValue, row: usize, col: usize) -> Result<JsValue, JsValue> {
    let grid: GridMeasurement = serde_wasm_bindgen::from_value(measurement).map_err(to_js_error)?;
    placement_to_js(EditorPlacement::compute(&grid, CellCoord::new(row, col)).as_ref())
}

/// Human readable form of a thrown value, for the shell's own notices
#[wasm_bindgen(js_name = errorMessage)]
pub fn error_message(err: JsValue) -> String {
    js_message(&err)
}


#[cfg(all(test, target_arch = "wasm32"))]
mod web_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn fake_host() -> JsViewHost {
        let host = js_sys::Object::new();
        for name in ["notify", "saveData", "closeView", "setLoading", "persistSettings"] {
            js_sys::Reflect::set(&host, &JsValue::from_str(name), &js_sys::Function::new_no_args(""))
                .unwrap();
        }
        host.unchecked_into()
    }

    #[wasm_bindgen_test]
    fn test_load_toggle_and_save_in_browser() {
        let view = CsvSheetView::new(fake_host(), "", "").unwrap();
        view.set_file("tables/data.csv");
        view.set_view_data("\"a\",\"b\"\n\"1\",\"2\"\n".to_string()).unwrap();
        assert!(view.is_loading());

        view.complete_load().unwrap();
        view.toggle_headers(true).unwrap();
        assert!(view.has_headers());
        assert!(!view.is_loading());
        assert_eq!(view.cell(0, 1), Some("2".to_string()));
        assert_eq!(view.view_data().unwrap(), "\"a\",\"b\"\n\"1\",\"2\"\n");
        assert!(view.settings_json().unwrap().contains("\"hasHeadings\":true"));
    }
}
