use std::collections::BTreeMap;
use std::mem;

use tracing::debug;

use crate::error::GridError;
use crate::filter::{ColumnFilter, ColumnSort};
use crate::header::ColumnHeaders;

/// In-memory grid backing an open CSV view.
///
/// `source` holds the rows exactly as they will be saved (minus the label
/// row while headers are on). Filters and sort are view state: they decide
/// which source rows are displayed, and in which order, but never reorder or
/// drop source rows. Edits address cells by visual row and are mapped back to
/// the physical source row through a cached display order that is rebuilt
/// whenever rows, filters or sort change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grid {
    source: Vec<Vec<String>>,
    headers: ColumnHeaders,
    filters: BTreeMap<usize, ColumnFilter>,
    sort: Option<ColumnSort>,
    col_widths: BTreeMap<usize, f64>,
    /// Physical row indices in display order
    order: Vec<usize>,
}

impl Grid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the source rows. Labels and view state are left untouched.
    pub fn load_data(&mut self, rows: Vec<Vec<String>>) {
        self.source = rows;
        self.refresh_order();
    }

    /// Go back to positional column labels without touching the rows
    pub fn reset_headers(&mut self) {
        self.headers = ColumnHeaders::Positional;
    }

    /// The unfiltered, unsorted rows
    pub fn source_data(&self) -> &[Vec<String>] {
        &self.source
    }

    pub fn row_count(&self) -> usize {
        self.source.len()
    }

    /// Widest row, or the label row if it is wider
    pub fn column_count(&self) -> usize {
        self.source
            .iter()
            .map(Vec::len)
            .max()
            .unwrap_or(0)
            .max(self.headers.width())
    }

    pub fn headers(&self) -> &ColumnHeaders {
        &self.headers
    }

    pub fn has_header_row(&self) -> bool {
        self.headers.is_labels()
    }

    /// Move the first row into the label row (`true`) or back into the data
    /// (`false`). Returns whether anything changed.
    pub fn set_header_row(&mut self, enabled: bool) -> bool {
        match (enabled, self.headers.is_labels()) {
            (true, false) => {
                let labels = if self.source.is_empty() {
                    Vec::new()
                } else {
                    self.source.remove(0)
                };
                debug!(columns = labels.len(), "first row moved into column labels");
                self.headers = ColumnHeaders::Labels(labels);
                self.refresh_order();
                true
            }
            (false, true) => {
                if let ColumnHeaders::Labels(labels) = mem::take(&mut self.headers) {
                    // an empty label row only exists when headers were enabled on an empty grid
                    if !labels.is_empty() {
                        self.source.insert(0, labels);
                    }
                }
                debug!("column labels moved back into the first row");
                self.refresh_order();
                true
            }
            _ => false,
        }
    }

    /// Rows to serialize: the label row (if any) followed by the source rows
    pub fn data_with_header(&self) -> Vec<Vec<String>> {
        let mut data = Vec::with_capacity(self.source.len() + 1);
        if let ColumnHeaders::Labels(labels) = &self.headers {
            data.push(labels.clone());
        }
        data.extend(self.source.iter().cloned());
        data
    }

    /// Value of a physical cell; missing cells of ragged rows read as ""
    pub fn value(&self, physical_row: usize, col: usize) -> &str {
        self.source
            .get(physical_row)
            .and_then(|row| row.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Physical row indices in display order, after filters then sort
    pub fn visible_rows(&self) -> &[usize] {
        &self.order
    }

    /// Map a visual row to its source row
    pub fn physical_row(&self, visual_row: usize) -> Option<usize> {
        self.order.get(visual_row).copied()
    }

    /// Displayed rows, in display order
    pub fn displayed_data(&self) -> Vec<Vec<String>> {
        self.order
            .iter()
            .map(|&row| self.source[row].clone())
            .collect()
    }

    fn refresh_order(&mut self) {
        let mut rows: Vec<usize> = (0..self.source.len())
            .filter(|&row| {
                self.filters
                    .iter()
                    .all(|(&col, filter)| filter.matches(self.value(row, col)))
            })
            .collect();

        if let Some(sort) = self.sort {
            rows.sort_by(|&a, &b| sort.compare(self.value(a, sort.column), self.value(b, sort.column)));
        }

        self.order = rows;
    }

    /// Whether a value in `col` decides which rows show, or in which order
    fn affects_order(&self, col: usize) -> bool {
        self.filters.contains_key(&col) || self.sort.is_some_and(|sort| sort.column == col)
    }

    /// Read a cell by visual row
    pub fn cell(&self, visual_row: usize, col: usize) -> Option<&str> {
        let row = self.physical_row(visual_row)?;
        (col < self.column_count()).then(|| self.value(row, col))
    }

    /// Write a cell by visual row. Short rows are padded with empty cells.
    pub fn set_cell(&mut self, visual_row: usize, col: usize, value: impl Into<String>) -> Result<(), GridError> {
        let physical = self
            .physical_row(visual_row)
            .ok_or(GridError::RowOutOfRange(visual_row))?;
        if col >= self.column_count() {
            return Err(GridError::ColumnOutOfRange(col));
        }

        let row = &mut self.source[physical];
        if col >= row.len() {
            row.resize(col + 1, String::new());
        }
        row[col] = value.into();
        if self.affects_order(col) {
            self.refresh_order();
        }
        Ok(())
    }

    /// Insert an empty row before `visual_row` (or append when it equals the
    /// number of displayed rows). Returns the physical index of the new row.
    pub fn insert_row(&mut self, visual_row: usize) -> Result<usize, GridError> {
        let physical = match self.order.get(visual_row) {
            Some(&row) => row,
            None if visual_row == self.order.len() => self.source.len(),
            None => return Err(GridError::RowOutOfRange(visual_row)),
        };

        let width = self.column_count();
        self.source.insert(physical, vec![String::new(); width]);
        self.refresh_order();
        Ok(physical)
    }

    /// Remove a displayed row and return its cells
    pub fn remove_row(&mut self, visual_row: usize) -> Result<Vec<String>, GridError> {
        let physical = self
            .physical_row(visual_row)
            .ok_or(GridError::RowOutOfRange(visual_row))?;
        let removed = self.source.remove(physical);
        self.refresh_order();
        Ok(removed)
    }

    /// Insert an empty column before `col`. Rows too short to reach `col`
    /// are left as they are.
    pub fn insert_col(&mut self, col: usize) -> Result<(), GridError> {
        if col > self.column_count() {
            return Err(GridError::ColumnOutOfRange(col));
        }

        for row in &mut self.source {
            if col <= row.len() {
                row.insert(col, String::new());
            }
        }
        if let ColumnHeaders::Labels(labels) = &mut self.headers {
            if col <= labels.len() {
                labels.insert(col, String::new());
            }
        }

        shift_columns(&mut self.filters, col, true);
        shift_columns(&mut self.col_widths, col, true);
        if let Some(sort) = &mut self.sort {
            if sort.column >= col {
                sort.column += 1;
            }
        }
        self.refresh_order();
        Ok(())
    }

    /// Remove a column from every row that has it
    pub fn remove_col(&mut self, col: usize) -> Result<(), GridError> {
        if col >= self.column_count() {
            return Err(GridError::ColumnOutOfRange(col));
        }

        for row in &mut self.source {
            if col < row.len() {
                row.remove(col);
            }
        }
        if let ColumnHeaders::Labels(labels) = &mut self.headers {
            if col < labels.len() {
                labels.remove(col);
            }
        }

        shift_columns(&mut self.filters, col, false);
        shift_columns(&mut self.col_widths, col, false);
        self.sort = match self.sort {
            Some(sort) if sort.column == col => None,
            Some(mut sort) if sort.column > col => {
                sort.column -= 1;
                Some(sort)
            }
            other => other,
        };
        self.refresh_order();
        Ok(())
    }

    /// Empty every cell, keeping the grid's shape
    pub fn clear(&mut self) {
        for cell in self.source.iter_mut().flatten() {
            cell.clear();
        }
        self.refresh_order();
    }

    pub fn set_col_width(&mut self, col: usize, width: f64) {
        self.col_widths.insert(col, width);
    }

    pub fn col_width(&self, col: usize) -> Option<f64> {
        self.col_widths.get(&col).copied()
    }

    pub fn col_widths(&self) -> &BTreeMap<usize, f64> {
        &self.col_widths
    }

    pub fn set_col_widths(&mut self, widths: BTreeMap<usize, f64>) {
        self.col_widths = widths;
    }

    /// Set (`Some`) or clear (`None`) the filter of one column
    pub fn set_filter(&mut self, col: usize, filter: Option<ColumnFilter>) {
        match filter {
            Some(filter) => {
                self.filters.insert(col, filter);
            }
            None => {
                self.filters.remove(&col);
            }
        }
        self.refresh_order();
    }

    pub fn filters(&self) -> &BTreeMap<usize, ColumnFilter> {
        &self.filters
    }

    pub fn set_filters(&mut self, filters: BTreeMap<usize, ColumnFilter>) {
        self.filters = filters;
        self.refresh_order();
    }

    pub fn set_sort(&mut self, sort: Option<ColumnSort>) {
        self.sort = sort;
        self.refresh_order();
    }

    pub fn sort(&self) -> Option<ColumnSort> {
        self.sort
    }
}

/// Re-key column-indexed view state after a column insert or removal at `at`
fn shift_columns<V>(map: &mut BTreeMap<usize, V>, at: usize, inserted: bool) {
    let tail = map.split_off(&at);
    for (col, value) in tail {
        if inserted {
            map.insert(col + 1, value);
        } else if col > at {
            map.insert(col - 1, value);
        }
    }
}
