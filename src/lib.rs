//! sheetpix - spreadsheet data and image extraction
//!
//! Reads XLSX packages into a serializable structure of worksheets, rows and
//! cells, and resolves the pictures they carry:
//! - named cell images referenced by `DISPIMG("id", ...)` formulas
//! - floating pictures anchored to cells in drawing parts
//!
//! Both kinds end up in one id-keyed image map; every row reports the images
//! anchored in it.
//!
//! # Usage
//!
//! ```no_run
//! use sheetpix::{ParseOptions, SpreadsheetReader};
//!
//! let mut reader = SpreadsheetReader::new(ParseOptions::default());
//! let result = reader.parse_file("report.xlsx");
//! for sheet in &result.worksheets {
//!     println!("{}: {} image(s)", sheet.name, sheet.total_images);
//! }
//! ```

pub mod cell_images;
pub mod cell_ref;
pub mod drawings;
pub mod error;
pub mod export;
pub mod floating;
pub mod media;
pub mod namespaces;
pub mod package;
pub mod parser;
pub mod reader;
pub mod relationships;
pub mod types;
pub mod walker;
pub mod xml_helpers;

use std::path::Path;

use wasm_bindgen::prelude::*;

pub use error::{Result, SheetpixError};
pub use reader::SpreadsheetReader;
pub use types::*;

/// Parse a package held in memory with the given options.
pub fn parse_buffer(data: &[u8], options: ParseOptions) -> ParseResult {
    SpreadsheetReader::new(options).parse_buffer(data)
}

/// Read and parse a package from disk with the given options.
pub fn parse_file(path: impl AsRef<Path>, options: ParseOptions) -> ParseResult {
    SpreadsheetReader::new(options).parse_file(path)
}

/// Parse a package and return the result as a JSON string
///
/// # Arguments
/// * `data` - The raw bytes of the XLSX file
/// * `options_json` - Optional options object, e.g. `{"includeEmptyRows": true}`
///
/// # Errors
/// Returns an error if the options are not valid JSON or the result cannot
/// be serialized. Problems with the package itself are reported in the
/// result's `errors` list.
#[wasm_bindgen]
pub fn parse_spreadsheet(
    data: &[u8],
    options_json: Option<String>,
) -> std::result::Result<String, JsValue> {
    let options = match options_json.as_deref().map(str::trim) {
        Some(json) if !json.is_empty() => ParseOptions::from_json(json)?,
        _ => ParseOptions::default(),
    };
    let result = parse_buffer(data, options);

    serde_json::to_string(&result)
        .map_err(|e| JsValue::from_str(&format!("JSON serialization error: {e}")))
}

/// Get the library version
#[must_use]
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
