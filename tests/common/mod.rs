//! Common test utilities and assertion helpers.
//!
//! Wraps the public parse entry points and checks the invariants every
//! result must hold regardless of the package it came from.
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use sheetpix::{CellKind, ParseOptions, ParseResult, WorksheetRecord};

// Re-export fixtures for convenience
pub use super::fixtures::*;

/// Parse with default options and check the result invariants.
#[must_use]
pub fn parse(data: &[u8]) -> ParseResult {
    parse_with(data, ParseOptions::default())
}

/// Parse with `options` and check the result invariants.
#[must_use]
pub fn parse_with(data: &[u8], options: ParseOptions) -> ParseResult {
    let result = sheetpix::parse_buffer(data, options);
    assert_result_consistent(&result);
    result
}

/// Look up a worksheet by name, panicking with the available names.
pub fn sheet<'a>(result: &'a ParseResult, name: &str) -> &'a WorksheetRecord {
    result.worksheet(name).unwrap_or_else(|| {
        let names: Vec<_> = result.worksheets.iter().map(|ws| ws.name.as_str()).collect();
        panic!("no worksheet {name:?}, have {names:?}")
    })
}

/// Decoded byte length of a resolved image.
pub fn decoded_len(result: &ParseResult, id: &str) -> usize {
    let image = result.images.get(id).expect("image not registered");
    BASE64.decode(image.base64_payload()).expect("invalid base64").len()
}

/// Diagnostics starting with `[skip] reason=<reason>`.
pub fn skips<'a>(result: &'a ParseResult, reason: &str) -> Vec<&'a str> {
    let prefix = format!("[skip] reason={reason} ");
    result
        .errors
        .iter()
        .filter(|e| e.starts_with(&prefix))
        .map(String::as_str)
        .collect()
}

/// Invariants that hold for every result:
/// - every image is keyed by its own id and carries a data URI of its MIME type
/// - every image-typed cell and every cell image link resolves
/// - row counts match their `imageCells` and the sheet totals
pub fn assert_result_consistent(result: &ParseResult) {
    for (key, image) in &result.images {
        assert_eq!(key, &image.id);
        assert!(
            image
                .base64_data_uri
                .starts_with(&format!("data:{};base64,", image.mime_type)),
            "bad data URI prefix for {key}"
        );
        assert!(BASE64.decode(image.base64_payload()).is_ok(), "bad payload for {key}");
    }

    for ws in &result.worksheets {
        let mut total = 0;
        let mut with_images = 0;
        for row in &ws.rows {
            assert_eq!(row.image_count as usize, row.image_cells.len());
            total += row.image_count;
            if row.image_count > 0 {
                with_images += 1;
            }
            for cell in &row.cells {
                assert_eq!(cell.row, row.row_number);
                if cell.kind == CellKind::Image {
                    let link = cell.image.as_ref().expect("image cell without link");
                    assert!(result.images.contains_key(&link.id));
                }
                if let Some(link) = &cell.image {
                    assert!(
                        result.images.contains_key(&link.id),
                        "{} links unknown image {}",
                        cell.reference,
                        link.id
                    );
                }
            }
        }
        assert_eq!(ws.total_images, total, "sheet {}", ws.name);
        assert_eq!(ws.rows_with_images, with_images, "sheet {}", ws.name);
    }
}
