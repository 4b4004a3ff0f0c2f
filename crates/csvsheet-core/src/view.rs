//! View controller binding one CSV file to a grid.
//!
//! Owns the load pipeline (BOM strip, parse, populate, restore per-file
//! settings, apply header state), the save pipeline (source data plus label
//! row, serialized with the configured dialect), and the autosave policy.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::codec;
use crate::config::ViewConfig;
use crate::error::ViewError;
use crate::filter::{ColumnFilter, ColumnSort};
use crate::grid::Grid;
use crate::host::{FileRef, ViewHost};
use crate::search::{self, SearchError, SearchOptions, SearchResult};
use crate::settings::{FileSettings, SettingsStore};

/// View type registered with the host
pub const VIEW_TYPE: &str = "csv";
/// File extension handled by the view
pub const EXTENSION: &str = "csv";
/// Icon id registered for the view
pub const VIEW_ICON: &str = "document-csv";

/// Where a cell change came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChangeSource {
    /// The grid was (re)filled from file contents
    LoadData,
    /// Anything the user did: typing, paste, autofill, undo
    User,
}

impl ChangeSource {
    /// Classify the widget's change-source string
    pub fn from_widget(source: &str) -> Self {
        match source {
            "loadData" | "updateData" => ChangeSource::LoadData,
            _ => ChangeSource::User,
        }
    }
}

pub struct CsvView<H, S> {
    host: H,
    settings: S,
    config: ViewConfig,
    file: Option<FileRef>,
    grid: Grid,
    autosave: bool,
    loading: bool,
    pending: Option<String>,
}

impl<H: ViewHost, S: SettingsStore> CsvView<H, S> {
    pub fn new(host: H, settings: S, config: ViewConfig) -> Self {
        Self {
            host,
            settings,
            autosave: config.autosave,
            config,
            file: None,
            grid: Grid::new(),
            loading: false,
            pending: None,
        }
    }

    pub fn set_file(&mut self, path: impl Into<String>) {
        self.file = Some(FileRef::new(path));
    }

    pub fn file(&self) -> Option<&FileRef> {
        self.file.as_ref()
    }

    /// Forget the bound file
    pub fn unload_file(&mut self) {
        if let Some(file) = self.file.take() {
            debug!(path = %file.path, "unloading file");
        }
    }

    /// Tab title: the file's basename
    pub fn display_text(&self) -> String {
        match &self.file {
            Some(file) => file.basename().to_string(),
            None => "csv (no file)".to_string(),
        }
    }

    pub fn can_accept_extension(extension: &str) -> bool {
        extension == EXTENSION
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn settings(&self) -> &S {
        &self.settings
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    /// Receive new file contents. Parsing is deferred: the loading indicator
    /// is shown now and [`CsvView::complete_load`] does the work later.
    pub fn set_view_data(&mut self, data: String) {
        debug!(bytes = data.len(), "view data received");
        self.loading = true;
        self.pending = Some(data);
        self.host.set_loading(true);
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Run a pending load. On failure every error message becomes a notice
    /// and the view is closed.
    pub fn complete_load(&mut self) -> Result<(), ViewError> {
        let Some(data) = self.pending.take() else {
            return Ok(());
        };

        let result = self.load_data(&data);
        self.loading = false;
        self.host.set_loading(false);

        if let Err(err) = &result {
            warn!(error = %err, "failed to load CSV");
            for notice in err.notices() {
                self.host.notify(&notice);
            }
            self.host.close_view();
        }
        result
    }

    /// Parse `data` into the grid and apply the file's persisted settings.
    /// The grid is untouched when parsing fails.
    pub fn load_data(&mut self, data: &str) -> Result<(), ViewError> {
        let path = self.file_path()?.to_string();
        let rows = codec::parse(data, &self.config.dialect)?;
        debug!(rows = rows.len(), path = %path, "parsed CSV");

        self.grid.reset_headers();
        self.grid.load_data(rows);

        let saved = self.settings.load(&path).unwrap_or_default();
        self.grid.set_col_widths(saved.column_widths);
        self.grid.set_filters(saved.filters);
        self.grid.set_sort(saved.sort);

        self.toggle_headers(saved.has_headings)
    }

    /// Use the first row as column labels, or put the labels back as data.
    /// The choice is remembered for the file either way.
    pub fn toggle_headers(&mut self, enabled: bool) -> Result<(), ViewError> {
        if self.grid.set_header_row(enabled) {
            debug!(enabled, "header row toggled");
        }
        self.update_settings(|s| s.has_headings = enabled)
    }

    pub fn has_headers(&self) -> bool {
        self.grid.has_header_row()
    }

    /// Serialize the full source data, label row first when headers are on
    pub fn view_data(&self) -> Result<String, ViewError> {
        Ok(codec::serialize(&self.grid.data_with_header(), &self.config.dialect)?)
    }

    pub fn set_autosave(&mut self, enabled: bool) {
        self.autosave = enabled;
    }

    pub fn autosave(&self) -> bool {
        self.autosave
    }

    /// The manual save button is only usable while autosave is off
    pub fn save_enabled(&self) -> bool {
        !self.autosave
    }

    /// Manual save. Ignored (returns false) while autosave is on.
    pub fn save(&mut self) -> Result<bool, ViewError> {
        if !self.save_enabled() {
            return Ok(false);
        }
        let name = self.file_ref()?.name().to_string();
        self.host.notify(&format!("Saving {}...", name));
        self.persist()?;
        Ok(true)
    }

    /// Save if autosave is on. Returns whether a save happened.
    pub fn request_autosave(&mut self) -> Result<bool, ViewError> {
        if !self.autosave {
            return Ok(false);
        }
        self.host.notify("Auto saving...");
        self.persist()?;
        Ok(true)
    }

    /// React to a cell change reported by the widget
    pub fn on_change(&mut self, source: ChangeSource) -> Result<bool, ViewError> {
        match source {
            ChangeSource::LoadData => Ok(false),
            ChangeSource::User => self.request_autosave(),
        }
    }

    /// Write a cell (visual coordinates) and apply the autosave policy
    pub fn set_cell(
        &mut self,
        row: usize,
        col: usize,
        value: impl Into<String>,
        source: ChangeSource,
    ) -> Result<bool, ViewError> {
        self.grid.set_cell(row, col, value)?;
        self.on_change(source)
    }

    pub fn insert_row(&mut self, row: usize) -> Result<bool, ViewError> {
        self.grid.insert_row(row)?;
        self.request_autosave()
    }

    pub fn remove_row(&mut self, row: usize) -> Result<bool, ViewError> {
        self.grid.remove_row(row)?;
        self.request_autosave()
    }

    pub fn insert_col(&mut self, col: usize) -> Result<bool, ViewError> {
        self.grid.insert_col(col)?;
        self.store_view_state()?;
        self.request_autosave()
    }

    pub fn remove_col(&mut self, col: usize) -> Result<bool, ViewError> {
        self.grid.remove_col(col)?;
        self.store_view_state()?;
        self.request_autosave()
    }

    /// Sort the displayed rows (or clear the sort). Saved text keeps the
    /// source order.
    pub fn sort_by(&mut self, sort: Option<ColumnSort>) -> Result<bool, ViewError> {
        self.grid.set_sort(sort);
        self.update_settings(|s| s.sort = sort)?;
        self.request_autosave()
    }

    pub fn set_filter(&mut self, col: usize, filter: Option<ColumnFilter>) -> Result<(), ViewError> {
        self.grid.set_filter(col, filter);
        let filters = self.grid.filters().clone();
        self.update_settings(|s| s.filters = filters)
    }

    pub fn resize_column(&mut self, col: usize, width: f64) -> Result<(), ViewError> {
        self.grid.set_col_width(col, width);
        self.update_settings(|s| {
            s.column_widths.insert(col, width);
        })
    }

    pub fn search(&self, options: &SearchOptions) -> Result<Vec<SearchResult>, SearchError> {
        search::search(&self.grid, options)
    }

    /// Settings object for the grid widget, reflecting the label state
    pub fn widget_settings(&self) -> serde_json::Value {
        self.config.grid.to_widget_settings(self.grid.headers())
    }

    /// Empty the grid's cells
    pub fn clear(&mut self) {
        self.grid.clear();
        debug!("view content cleared");
    }

    fn persist(&mut self) -> Result<(), ViewError> {
        let contents = self.view_data()?;
        info!(bytes = contents.len(), "saving CSV");
        self.host.save(&contents);
        Ok(())
    }

    fn store_view_state(&mut self) -> Result<(), ViewError> {
        let widths = self.grid.col_widths().clone();
        let filters = self.grid.filters().clone();
        let sort = self.grid.sort();
        self.update_settings(|s| {
            s.column_widths = widths;
            s.filters = filters;
            s.sort = sort;
        })
    }

    fn update_settings<F>(&mut self, apply: F) -> Result<(), ViewError>
    where
        F: FnOnce(&mut FileSettings),
    {
        let path = self.file_path()?.to_string();
        self.settings.update(&path, apply)?;
        Ok(())
    }

    fn file_ref(&self) -> Result<&FileRef, ViewError> {
        self.file.as_ref().ok_or(ViewError::NoFile)
    }

    fn file_path(&self) -> Result<&str, ViewError> {
        Ok(&self.file_ref()?.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::BYTE_ORDER_MARK;
    use crate::filter::SortOrder;
    use crate::header::ColumnHeaders;
    use crate::host::Notify;
    use crate::settings::MemorySettingsStore;

    #[derive(Debug, Default)]
    struct RecordingHost {
        notices: Vec<String>,
        saved: Vec<String>,
        closed: bool,
        loading: Vec<bool>,
    }

    impl Notify for RecordingHost {
        fn notify(&mut self, message: &str) {
            self.notices.push(message.to_string());
        }
    }

    impl ViewHost for RecordingHost {
        fn save(&mut self, contents: &str) {
            self.saved.push(contents.to_string());
        }

        fn close_view(&mut self) {
            self.closed = true;
        }

        fn set_loading(&mut self, visible: bool) {
            self.loading.push(visible);
        }
    }

    type TestView = CsvView<RecordingHost, MemorySettingsStore>;

    const EXAMPLE: &str = "\"a\",\"b\"\n\"1\",\"2\"\n";

    fn view_with(store: MemorySettingsStore) -> TestView {
        let mut view = CsvView::new(RecordingHost::default(), store, ViewConfig::default());
        view.set_file("tables/data.csv");
        view
    }

    fn view() -> TestView {
        view_with(MemorySettingsStore::new())
    }

    #[test]
    fn test_headers_example_round_trip() {
        let mut view = view();
        view.load_data(EXAMPLE).unwrap();
        view.toggle_headers(true).unwrap();

        assert_eq!(
            view.grid().headers(),
            &ColumnHeaders::Labels(vec!["a".into(), "b".into()])
        );
        assert_eq!(view.grid().source_data(), &[vec!["1".to_string(), "2".to_string()]]);
        assert_eq!(view.view_data().unwrap(), EXAMPLE);
    }

    #[test]
    fn test_load_restores_persisted_header_flag() {
        let mut store = MemorySettingsStore::new();
        store
            .update("tables/data.csv", |s| s.has_headings = true)
            .unwrap();

        let mut view = view_with(store);
        view.load_data(EXAMPLE).unwrap();
        assert!(view.has_headers());
        assert_eq!(view.grid().row_count(), 1);
    }

    #[test]
    fn test_toggle_persists_choice() {
        let mut view = view();
        view.load_data(EXAMPLE).unwrap();
        assert!(!view.has_headers());
        assert_eq!(view.settings().load("tables/data.csv").map(|s| s.has_headings), Some(false));

        view.toggle_headers(true).unwrap();
        assert!(view.settings().load("tables/data.csv").unwrap().has_headings);

        view.toggle_headers(false).unwrap();
        assert!(!view.settings().load("tables/data.csv").unwrap().has_headings);
        assert_eq!(view.grid().row_count(), 2);
    }

    #[test]
    fn test_reload_resets_labels_before_applying_settings() {
        let mut view = view();
        view.load_data(EXAMPLE).unwrap();
        view.toggle_headers(true).unwrap();

        view.load_data("\"x\",\"y\"\n\"3\",\"4\"\n").unwrap();
        assert_eq!(
            view.grid().headers(),
            &ColumnHeaders::Labels(vec!["x".into(), "y".into()])
        );
        assert_eq!(view.grid().row_count(), 1);
    }

    #[test]
    fn test_bom_file_loads_like_plain_file() {
        let mut plain = view();
        plain.load_data(EXAMPLE).unwrap();

        let mut bom = view();
        bom.load_data(&format!("{}{}", BYTE_ORDER_MARK, EXAMPLE)).unwrap();

        assert_eq!(plain.grid().source_data(), bom.grid().source_data());
        assert_eq!(bom.view_data().unwrap(), EXAMPLE);
    }

    #[test]
    fn test_deferred_load_success() {
        let mut view = view();
        view.set_view_data(EXAMPLE.to_string());
        assert!(view.is_loading());
        assert_eq!(view.grid().row_count(), 0);

        view.complete_load().unwrap();
        assert!(!view.is_loading());
        assert_eq!(view.grid().row_count(), 2);
        assert_eq!(view.host().loading, vec![true, false]);
        assert!(view.host().notices.is_empty());
        assert!(!view.host().closed);

        // nothing pending any more
        view.complete_load().unwrap();
        assert_eq!(view.host().loading, vec![true, false]);
    }

    #[test]
    fn test_malformed_file_notifies_and_closes() {
        let mut view = view();
        view.set_view_data("\"a\",\"b\n\"1\",\"2\"\n".to_string());
        let err = view.complete_load().unwrap_err();

        assert_eq!(err.code(), "PARSE_ERROR");
        assert!(!view.host().notices.is_empty());
        assert!(view.host().closed);
        assert_eq!(view.host().loading, vec![true, false]);
        assert_eq!(view.grid().row_count(), 0);
        assert!(view.settings().is_empty());
    }

    #[test]
    fn test_load_without_file_is_reported() {
        let mut view = CsvView::new(
            RecordingHost::default(),
            MemorySettingsStore::new(),
            ViewConfig::default(),
        );
        view.set_view_data(EXAMPLE.to_string());
        assert!(matches!(view.complete_load(), Err(ViewError::NoFile)));
        assert_eq!(view.host().notices, vec!["No file is bound to this view".to_string()]);
        assert!(view.host().closed);
    }

    #[test]
    fn test_autosave_on_user_edit() {
        let mut view = view();
        view.load_data(EXAMPLE).unwrap();

        assert!(!view.on_change(ChangeSource::LoadData).unwrap());
        assert!(view.host().saved.is_empty());

        assert!(view.set_cell(1, 0, "one", ChangeSource::User).unwrap());
        assert_eq!(view.host().saved, vec!["\"a\",\"b\"\n\"one\",\"2\"\n".to_string()]);
        assert_eq!(view.host().notices, vec!["Auto saving...".to_string()]);
    }

    #[test]
    fn test_manual_save_when_autosave_off() {
        let mut view = view();
        view.load_data(EXAMPLE).unwrap();
        assert!(!view.save_enabled());
        assert!(!view.save().unwrap());

        view.set_autosave(false);
        assert!(view.save_enabled());
        assert!(!view.set_cell(0, 0, "z", ChangeSource::User).unwrap());
        assert!(!view.insert_row(2).unwrap());
        assert!(view.host().saved.is_empty());

        assert!(view.save().unwrap());
        assert_eq!(view.host().notices, vec!["Saving data.csv...".to_string()]);
        assert_eq!(view.host().saved.len(), 1);
        assert!(view.host().saved[0].starts_with("\"z\",\"b\"\n"));
    }

    #[test]
    fn test_structural_edits_autosave() {
        let mut view = view();
        view.load_data(EXAMPLE).unwrap();
        view.toggle_headers(true).unwrap();

        assert!(view.insert_row(1).unwrap());
        assert!(view.insert_col(2).unwrap());
        assert!(view.remove_col(2).unwrap());
        assert!(view.remove_row(1).unwrap());
        assert_eq!(view.host().saved.len(), 4);
        assert_eq!(view.host().saved.last().map(String::as_str), Some(EXAMPLE));
    }

    #[test]
    fn test_sort_and_filter_never_reach_saved_text() {
        let mut view = view();
        view.load_data("\"n\"\n\"3\"\n\"1\"\n\"2\"\n").unwrap();
        view.toggle_headers(true).unwrap();

        view.set_filter(0, Some(ColumnFilter::values(["1"]))).unwrap();
        assert!(view.sort_by(Some(ColumnSort::new(0, SortOrder::Ascending))).unwrap());
        assert_eq!(view.grid().displayed_data(), vec![vec!["1".to_string()]]);
        assert_eq!(
            view.host().saved.last().map(String::as_str),
            Some("\"n\"\n\"3\"\n\"1\"\n\"2\"\n")
        );

        let settings = view.settings().load("tables/data.csv").unwrap();
        assert_eq!(settings.filters.len(), 1);
        assert_eq!(settings.sort, Some(ColumnSort::new(0, SortOrder::Ascending)));
    }

    #[test]
    fn test_view_state_survives_reopen() {
        let mut first = view();
        first.load_data(EXAMPLE).unwrap();
        first.resize_column(1, 120.0).unwrap();
        first.set_filter(0, Some(ColumnFilter::contains("1"))).unwrap();
        let store = first.settings().clone();

        let mut second = view_with(store);
        second.load_data(EXAMPLE).unwrap();
        assert_eq!(second.grid().col_width(1), Some(120.0));
        assert_eq!(second.grid().visible_rows(), vec![1]);
    }

    #[test]
    fn test_search_and_widget_settings() {
        let mut view = view();
        view.load_data(EXAMPLE).unwrap();
        view.toggle_headers(true).unwrap();

        let results = view.search(&SearchOptions::literal("2")).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!((results[0].row, results[0].col), (0, 1));

        assert_eq!(view.widget_settings()["colHeaders"], serde_json::json!(["a", "b"]));
    }

    #[test]
    fn test_display_text_and_metadata() {
        let mut view = view();
        assert_eq!(view.display_text(), "data");
        view.unload_file();
        assert_eq!(view.display_text(), "csv (no file)");
        assert!(TestView::can_accept_extension("csv"));
        assert!(!TestView::can_accept_extension("md"));
    }

    #[test]
    fn test_clear_empties_cells() {
        let mut view = view();
        view.load_data(EXAMPLE).unwrap();
        view.clear();
        assert_eq!(view.view_data().unwrap(), "\"\",\"\"\n\"\",\"\"\n");
    }

    #[test]
    fn test_change_source_from_widget() {
        assert_eq!(ChangeSource::from_widget("loadData"), ChangeSource::LoadData);
        assert_eq!(ChangeSource::from_widget("updateData"), ChangeSource::LoadData);
        assert_eq!(ChangeSource::from_widget("edit"), ChangeSource::User);
        assert_eq!(ChangeSource::from_widget("CopyPaste.paste"), ChangeSource::User);
    }
}
