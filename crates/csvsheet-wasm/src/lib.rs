mod api;
mod host;
mod logging;

pub use api::{CellEditor, CsvSheetView};
pub use host::{JsRichTextEditor, JsVault, JsViewHost};

use wasm_bindgen::prelude::*;

/// Install the panic hook and console logging
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    logging::init();
}
