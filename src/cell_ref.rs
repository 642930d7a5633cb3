//! Utilities for encoding and decoding Excel-style cell references and ranges.

use crate::error::{Result, SheetpixError};

/// Last addressable column (`XFD`), 0-indexed.
pub const MAX_COL: u32 = 16_383;

/// Last addressable row (1048576), 0-indexed.
pub const MAX_ROW: u32 = 1_048_575;

/// Parse a cell reference like "A1" into (col, row) where col and row are 0-indexed.
pub fn parse_cell_ref(cell_ref: &str) -> Option<(u32, u32)> {
    let mut col: u32 = 0;
    let mut row: u32 = 0;
    let mut saw_col = false;
    let mut saw_row = false;

    for ch in cell_ref.trim().chars() {
        if ch == '$' {
            continue;
        }
        if ch.is_ascii_alphabetic() {
            // Letters after digits ("1A") are not a cell reference.
            if saw_row {
                return None;
            }
            let upper = ch.to_ascii_uppercase();
            col = col.checked_mul(26)?.checked_add(upper as u32 - 'A' as u32 + 1)?;
            saw_col = true;
        } else if ch.is_ascii_digit() {
            row = row.checked_mul(10)?.checked_add(ch as u32 - '0' as u32)?;
            saw_row = true;
        } else {
            return None;
        }
    }

    if !saw_col || !saw_row || row == 0 {
        return None;
    }

    Some((col - 1, row - 1))
}

/// Like [`parse_cell_ref`] but reports the offending text as an error.
pub fn decode_cell_ref(cell_ref: &str) -> Result<(u32, u32)> {
    parse_cell_ref(cell_ref).ok_or_else(|| SheetpixError::CellRef(cell_ref.to_string()))
}

/// Parse a cell range like "A1:B10" or "A1" into (start_row, start_col, end_row, end_col).
///
/// The corners are normalized so that start <= end on both axes.
pub fn parse_cell_range(range: &str) -> Option<(u32, u32, u32, u32)> {
    if let Some((start, end)) = range.split_once(':') {
        let (start_col, start_row) = parse_cell_ref(start)?;
        let (end_col, end_row) = parse_cell_ref(end)?;
        Some((
            start_row.min(end_row),
            start_col.min(end_col),
            start_row.max(end_row),
            start_col.max(end_col),
        ))
    } else {
        let (start_col, start_row) = parse_cell_ref(range)?;
        Some((start_row, start_col, start_row, start_col))
    }
}

/// Convert a 0-indexed column number into its letters ("A", "Z", "AA", ...).
pub fn column_letters(col: u32) -> String {
    let mut n = u64::from(col) + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        // rem < 26, so the narrowing is lossless
        #[allow(clippy::cast_possible_truncation)]
        letters.push(char::from(b'A' + rem as u8));
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Encode a 0-indexed (col, row) pair as an A1-style reference.
pub fn cell_ref(col: u32, row: u32) -> String {
    format!("{}{}", column_letters(col), u64::from(row) + 1)
}
