pub mod codec;
pub mod config;
pub mod editor;
pub mod error;
pub mod filter;
pub mod grid;
pub mod header;
pub mod host;
pub mod new_file;
pub mod range;
pub mod search;
pub mod settings;
pub mod view;

pub use codec::{empty_csv, parse, serialize, strip_bom, CsvDialect, LineEnding, QuoteMode};
pub use config::{GridOptions, ViewConfig};
pub use editor::{
    CellBox, CellScreenRect, CssTransform, EditorPlacement, EditorSection, GridMeasurement,
    MarkdownCellEditor, Offset, RichTextEditor,
};
pub use error::{
    ConfigError, CsvError, GridError, HostError, ParseIssue, ParseIssueKind, SettingsError,
    ViewError,
};
pub use filter::{ColumnFilter, ColumnSort, SortOrder};
pub use grid::Grid;
pub use header::ColumnHeaders;
pub use host::{FileRef, FolderEntry, Notify, Vault, ViewHost};
pub use new_file::{create_csv_file, untitled_name};
pub use range::{col_to_label, CellCoord};
pub use search::{search, SearchError, SearchOptions, SearchResult};
pub use settings::{FileSettings, MemorySettingsStore, SettingsStore};
pub use view::{ChangeSource, CsvView, EXTENSION, VIEW_ICON, VIEW_TYPE};
