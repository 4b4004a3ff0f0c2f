pub mod placement;

pub use placement::{
    CellBox, CellScreenRect, CssTransform, EditorPlacement, EditorSection, GridMeasurement,
    Offset,
};

use crate::range::CellCoord;

/// The host's rich text (markdown) editor mounted inside the overlay
pub trait RichTextEditor {
    fn value(&self) -> String;
    fn set_value(&mut self, value: &str);
    fn focus(&mut self);
    fn refresh(&mut self);
}

#[derive(Debug, Clone, PartialEq)]
enum EditorState {
    Closed,
    Open {
        cell: CellCoord,
        placement: EditorPlacement,
    },
}

/// Cell editor that overlays a markdown editor on the edited cell
#[derive(Debug)]
pub struct MarkdownCellEditor<E> {
    editor: E,
    state: EditorState,
}

impl<E: RichTextEditor> MarkdownCellEditor<E> {
    pub fn new(editor: E) -> Self {
        Self {
            editor,
            state: EditorState::Closed,
        }
    }

    /// Load the cell's current value and show the editor over it.
    /// Returns false when the cell is off screen (the editor stays closed).
    pub fn begin_editing(
        &mut self,
        grid: &impl CellScreenRect,
        cell: CellCoord,
        value: &str,
    ) -> bool {
        self.editor.set_value(value);
        self.open(grid, cell)
    }

    /// Position the container over `cell`, then focus the editor
    pub fn open(&mut self, grid: &impl CellScreenRect, cell: CellCoord) -> bool {
        match EditorPlacement::compute(grid, cell) {
            Some(placement) => {
                self.state = EditorState::Open { cell, placement };
                self.focus();
                true
            }
            None => {
                self.close();
                false
            }
        }
    }

    /// Recompute the placement of an open editor after a scroll or resize
    pub fn refresh_dimensions(&mut self, grid: &impl CellScreenRect) -> bool {
        match self.editing_cell() {
            Some(cell) => self.open(grid, cell),
            None => false,
        }
    }

    pub fn close(&mut self) {
        self.state = EditorState::Closed;
    }

    pub fn focus(&mut self) {
        self.editor.focus();
        self.editor.refresh();
    }

    pub fn value(&self) -> String {
        self.editor.value()
    }

    pub fn set_value(&mut self, value: &str) {
        self.editor.set_value(value);
    }

    /// Close the editor and hand back the edited cell with its new value
    pub fn finish_editing(&mut self) -> Option<(CellCoord, String)> {
        let cell = self.editing_cell()?;
        let value = self.editor.value();
        self.close();
        Some((cell, value))
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, EditorState::Open { .. })
    }

    pub fn editing_cell(&self) -> Option<CellCoord> {
        match &self.state {
            EditorState::Open { cell, .. } => Some(*cell),
            EditorState::Closed => None,
        }
    }

    pub fn placement(&self) -> Option<&EditorPlacement> {
        match &self.state {
            EditorState::Open { placement, .. } => Some(placement),
            EditorState::Closed => None,
        }
    }

    pub fn inner(&self) -> &E {
        &self.editor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct FakeEditor {
        text: String,
        focused: usize,
        refreshed: usize,
    }

    impl RichTextEditor for FakeEditor {
        fn value(&self) -> String {
            self.text.clone()
        }

        fn set_value(&mut self, value: &str) {
            self.text = value.to_string();
        }

        fn focus(&mut self) {
            self.focused += 1;
        }

        fn refresh(&mut self) {
            self.refreshed += 1;
        }
    }

    fn visible_grid() -> GridMeasurement {
        GridMeasurement {
            section: EditorSection::Main,
            cell: Some(CellBox {
                offset: Offset::new(60.0, 80.0),
                outer_width: 120.0,
                outer_height: 30.0,
                ..CellBox::default()
            }),
            root: Offset::new(10.0, 10.0),
            ..GridMeasurement::default()
        }
    }

    #[test]
    fn test_edit_cycle() {
        let mut editor = MarkdownCellEditor::new(FakeEditor::default());
        assert!(!editor.is_open());

        assert!(editor.begin_editing(&visible_grid(), CellCoord::new(2, 1), "**bold**"));
        assert!(editor.is_open());
        assert_eq!(editor.editing_cell(), Some(CellCoord::new(2, 1)));
        assert_eq!(editor.value(), "**bold**");
        assert_eq!(editor.inner().focused, 1);
        assert_eq!(editor.inner().refreshed, 1);

        let placement = editor.placement().unwrap();
        assert_eq!((placement.top, placement.left), (49.0, 69.0));
        assert_eq!((placement.width, placement.height), (121.0, 31.0));

        editor.set_value("_italic_");
        assert_eq!(
            editor.finish_editing(),
            Some((CellCoord::new(2, 1), "_italic_".to_string()))
        );
        assert!(!editor.is_open());
        assert_eq!(editor.finish_editing(), None);
    }

    #[test]
    fn test_offscreen_cell_closes_editor() {
        let mut editor = MarkdownCellEditor::new(FakeEditor::default());
        editor.open(&visible_grid(), CellCoord::new(1, 1));
        assert!(editor.is_open());

        let hidden = GridMeasurement {
            cell: None,
            ..visible_grid()
        };
        assert!(!editor.refresh_dimensions(&hidden));
        assert!(!editor.is_open());
        assert_eq!(editor.placement(), None);
        assert!(!editor.refresh_dimensions(&visible_grid()));
    }
}
