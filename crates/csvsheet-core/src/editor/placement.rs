//! Screen geometry of the cell editor overlay.
//!
//! The grid widget renders frozen rows/columns in cloned overlay tables, each
//! with its own CSS transform. To cover a cell exactly, the editor container
//! has to be measured against the clone that actually renders the cell.

use serde::{Deserialize, Serialize};

use crate::range::CellCoord;

/// Which part of the grid renders a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EditorSection {
    /// Scrollable body
    #[default]
    Main,
    /// Frozen rows
    Top,
    /// Frozen columns
    Left,
    TopLeftCorner,
    BottomLeftCorner,
    /// Frozen bottom rows
    Bottom,
}

impl EditorSection {
    /// Stacking order of the editor so it sits above the overlay it covers
    pub fn z_index(self) -> Option<u32> {
        match self {
            EditorSection::Top => Some(101),
            EditorSection::Left => Some(102),
            EditorSection::TopLeftCorner | EditorSection::BottomLeftCorner => Some(103),
            EditorSection::Main | EditorSection::Bottom => None,
        }
    }

    /// Overlay that holds the rendered cell. Both corner sections are looked
    /// up in the top-left clone; bottom rows are read from the main table.
    pub fn cell_source(self) -> EditorSection {
        match self {
            EditorSection::Top => EditorSection::Top,
            EditorSection::Left => EditorSection::Left,
            EditorSection::TopLeftCorner | EditorSection::BottomLeftCorner => {
                EditorSection::TopLeftCorner
            }
            EditorSection::Main | EditorSection::Bottom => EditorSection::Main,
        }
    }
}

/// Page offset of an element
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Offset {
    pub top: f64,
    pub left: f64,
}

impl Offset {
    pub fn new(top: f64, left: f64) -> Self {
        Self { top, left }
    }
}

/// Measured box of a rendered cell
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellBox {
    pub offset: Offset,
    pub outer_width: f64,
    pub outer_height: f64,
    #[serde(default)]
    pub border_top_width: f64,
    #[serde(default)]
    pub border_left_width: f64,
}

/// CSS transform copied from an overlay onto the editor container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CssTransform {
    pub property: String,
    pub value: String,
}

/// What the editor needs to know about the grid's layout
pub trait CellScreenRect {
    /// Section the cell is displayed in
    fn section_of(&self, cell: CellCoord) -> EditorSection;

    /// Box of the cell as rendered by `source`, `None` when not rendered
    fn rendered_cell(&self, source: EditorSection, cell: CellCoord) -> Option<CellBox>;

    /// Page offset of the grid's root element
    fn root_offset(&self) -> Offset;

    /// Scroll position of the scrollable body
    fn scroll_offset(&self) -> Offset;

    /// Transform applied to the overlay of `section`, if any
    fn section_transform(&self, section: EditorSection) -> Option<CssTransform>;
}

/// Where to draw the editor container, relative to the grid root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorPlacement {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
    pub z_index: Option<u32>,
    /// `None` means any previous transform must be reset
    pub transform: Option<CssTransform>,
}

impl EditorPlacement {
    /// Compute the container rectangle for `cell`. Returns `None` when the
    /// cell is not rendered (scrolled out of the viewport).
    pub fn compute(grid: &impl CellScreenRect, cell: CellCoord) -> Option<Self> {
        let section = grid.section_of(cell);
        let cell_box = grid.rendered_cell(section.cell_source(), cell)?;
        let root = grid.root_offset();
        let scroll = grid.scroll_offset();

        let mut width = cell_box.outer_width + 1.0;
        let mut height = cell_box.outer_height + 1.0;
        let mut top = cell_box.offset.top - root.top - 1.0 - scroll.top;
        let mut left = cell_box.offset.left - root.left - 1.0 - scroll.left;

        let (first_row, first_col) = cell.is_on_edge();
        if first_row {
            top += 1.0;
        }
        if first_col {
            left += 1.0;
        }
        if cell_box.border_top_width > 0.0 {
            height -= 1.0;
        }
        if cell_box.border_left_width > 0.0 {
            width -= 1.0;
        }

        let transform = match section {
            EditorSection::Main => None,
            other => grid.section_transform(other),
        };

        Some(Self {
            top,
            left,
            width,
            height,
            z_index: section.z_index(),
            transform,
        })
    }
}

/// A one-shot measurement of the grid taken by the bindings layer for a
/// single cell. Lets the geometry run on numbers captured from the DOM.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridMeasurement {
    #[serde(default)]
    pub section: EditorSection,
    /// `None` when the widget could not find the rendered cell
    pub cell: Option<CellBox>,
    pub root: Offset,
    #[serde(default)]
    pub scroll: Offset,
    #[serde(default)]
    pub transform: Option<CssTransform>,
}

impl CellScreenRect for GridMeasurement {
    fn section_of(&self, _cell: CellCoord) -> EditorSection {
        self.section
    }

    fn rendered_cell(&self, _source: EditorSection, _cell: CellCoord) -> Option<CellBox> {
        self.cell
    }

    fn root_offset(&self) -> Offset {
        self.root
    }

    fn scroll_offset(&self) -> Offset {
        self.scroll
    }

    fn section_transform(&self, _section: EditorSection) -> Option<CssTransform> {
        self.transform.clone()
    }
}
