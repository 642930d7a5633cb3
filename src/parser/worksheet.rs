//! Worksheet parsing - one sheet part into a [`SheetModel`].
//!
//! Only what the walker consumes is kept: the declared dimension, cell
//! values with their type tag and formula, explicit row heights and column
//! widths. Styles, merges and the rest of the sheet are skipped.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;

use crate::cell_ref::{parse_cell_range, parse_cell_ref};
use crate::error::Result;
use crate::types::{CellKind, CellValue};
use crate::xml_helpers::{attr_bool, attr_f64, attr_string, attr_u32};

/// Cell type tag from the `t` attribute of a `<c>` element.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum CellTypeTag {
    Shared,
    Inline,
    Str,
    Bool,
    Error,
    Date,
    Number,
}

pub(crate) fn parse_cell_type_tag(value: &str) -> CellTypeTag {
    match value {
        "s" => CellTypeTag::Shared,
        "b" => CellTypeTag::Bool,
        "e" => CellTypeTag::Error,
        "str" => CellTypeTag::Str,
        "inlineStr" => CellTypeTag::Inline,
        "d" => CellTypeTag::Date,
        _ => CellTypeTag::Number,
    }
}

/// One cell as stored in the sheet part.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelCell {
    /// Column index (0-indexed)
    pub col: u32,
    /// Row index (0-indexed)
    pub row: u32,
    pub value: Option<CellValue>,
    pub kind: CellKind,
    /// Text of `<v>` (or the inline string) before type resolution
    pub raw: Option<String>,
    /// Formula text without the leading `=`
    pub formula: Option<String>,
}

/// A `<col>` span (0-indexed, inclusive).
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSpec {
    pub min: u32,
    pub max: u32,
    pub width: Option<f64>,
    pub hidden: bool,
}

/// Parsed contents of one worksheet part.
#[derive(Debug, Clone, Default)]
pub struct SheetModel {
    /// `<dimension ref>` as (start_row, start_col, end_row, end_col), 0-indexed
    pub dimension: Option<(u32, u32, u32, u32)>,
    cells: HashMap<(u32, u32), ModelCell>,
    row_heights: HashMap<u32, f64>,
    columns: Vec<ColumnSpec>,
}

impl SheetModel {
    /// Cell at 0-indexed (row, col), if the sheet stores one.
    pub fn cell(&self, row: u32, col: u32) -> Option<&ModelCell> {
        self.cells.get(&(row, col))
    }

    /// Explicit height of a 0-indexed row, in points.
    pub fn row_height(&self, row: u32) -> Option<f64> {
        self.row_heights.get(&row).copied()
    }

    /// Column span covering a 0-indexed column.
    pub fn column(&self, col: u32) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.min <= col && col <= c.max)
    }

    /// The declared dimension, or the bounding box of the stored cells when
    /// the sheet declares none. `None` for a sheet with neither.
    pub fn used_range(&self) -> Option<(u32, u32, u32, u32)> {
        if self.dimension.is_some() {
            return self.dimension;
        }
        self.cells.keys().fold(None, |acc, &(row, col)| {
            Some(match acc {
                None => (row, col, row, col),
                Some((r0, c0, r1, c1)) => (r0.min(row), c0.min(col), r1.max(row), c1.max(col)),
            })
        })
    }
}

/// Cell being read between `<c>` and `</c>`.
#[derive(Debug)]
struct CellBuilder {
    col: u32,
    row: u32,
    tag: CellTypeTag,
    value: Option<String>,
    formula: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextTarget {
    Value,
    Formula,
    Inline,
}

impl CellBuilder {
    fn push_text(&mut self, target: TextTarget, text: &str) {
        let slot = match target {
            TextTarget::Value | TextTarget::Inline => &mut self.value,
            TextTarget::Formula => &mut self.formula,
        };
        slot.get_or_insert_with(String::new).push_str(text);
    }

    fn finish(self, shared_strings: &[String]) -> ModelCell {
        let (value, kind) = resolve_cell_value(self.value.as_deref(), self.tag, shared_strings);
        let formula = self
            .formula
            .map(|f| f.strip_prefix('=').map(ToString::to_string).unwrap_or(f))
            .filter(|f| !f.is_empty());
        ModelCell {
            col: self.col,
            row: self.row,
            value,
            kind,
            raw: self.value,
            formula,
        }
    }
}

/// Turn a stored value and its type tag into a typed value.
pub(crate) fn resolve_cell_value(
    raw: Option<&str>,
    tag: CellTypeTag,
    shared_strings: &[String],
) -> (Option<CellValue>, CellKind) {
    let Some(raw) = raw else {
        return (None, CellKind::Empty);
    };

    match tag {
        CellTypeTag::Shared => {
            let text = raw
                .trim()
                .parse::<usize>()
                .ok()
                .and_then(|i| shared_strings.get(i))
                .cloned()
                .unwrap_or_default();
            (Some(CellValue::Text(text)), CellKind::String)
        }
        CellTypeTag::Str | CellTypeTag::Inline | CellTypeTag::Date => {
            (Some(CellValue::Text(raw.to_string())), CellKind::String)
        }
        CellTypeTag::Bool => (Some(CellValue::Bool(raw.trim() == "1")), CellKind::Boolean),
        CellTypeTag::Error => (Some(CellValue::Text(raw.to_string())), CellKind::Error),
        CellTypeTag::Number => match raw.trim().parse::<f64>() {
            Ok(n) => (Some(CellValue::Number(n)), CellKind::Number),
            Err(_) => (Some(CellValue::Text(raw.to_string())), CellKind::String),
        },
    }
}

fn parse_col_spec(e: &BytesStart) -> Option<ColumnSpec> {
    let min = attr_u32(e, b"min")?;
    let max = attr_u32(e, b"max").unwrap_or(min);
    if min == 0 || max < min {
        return None;
    }
    Some(ColumnSpec {
        min: min - 1,
        max: max - 1,
        width: attr_f64(e, b"width"),
        hidden: attr_bool(e, b"hidden").unwrap_or(false),
    })
}

/// Parse one worksheet part.
///
/// # Errors
/// Returns an error if the sheet XML is malformed.
pub fn parse_sheet(xml_text: &str, shared_strings: &[String]) -> Result<SheetModel> {
    let mut xml = Reader::from_str(xml_text);
    xml.trim_text(false);

    let mut sheet = SheetModel::default();
    // 1-indexed, as written in <row r>; 0 before the first row
    let mut current_row: u32 = 0;
    let mut next_col: u32 = 0;
    let mut cell: Option<CellBuilder> = None;
    let mut text_target: Option<TextTarget> = None;
    let mut in_inline = false;

    loop {
        match xml.read_event()? {
            ref event @ (Event::Start(_) | Event::Empty(_)) => {
                let (Event::Start(e) | Event::Empty(e)) = event else {
                    continue;
                };
                let is_start_event = matches!(event, Event::Start(_));

                match e.local_name().as_ref() {
                    b"dimension" => {
                        sheet.dimension =
                            attr_string(e, b"ref").and_then(|r| parse_cell_range(&r));
                    }
                    b"row" => {
                        current_row = attr_u32(e, b"r")
                            .filter(|r| *r > 0)
                            .unwrap_or(current_row.saturating_add(1));
                        next_col = 0;
                        if let Some(ht) = attr_f64(e, b"ht") {
                            sheet.row_heights.insert(current_row.saturating_sub(1), ht);
                        }
                    }
                    b"c" => {
                        // Cells may omit `r`; they then follow the previous cell
                        let (col, row) = attr_string(e, b"r")
                            .and_then(|r| parse_cell_ref(&r))
                            .unwrap_or((next_col, current_row.saturating_sub(1)));
                        next_col = col.saturating_add(1);

                        let builder = CellBuilder {
                            col,
                            row,
                            tag: attr_string(e, b"t")
                                .map_or(CellTypeTag::Number, |t| parse_cell_type_tag(&t)),
                            value: None,
                            formula: None,
                        };
                        if is_start_event {
                            cell = Some(builder);
                        } else {
                            let finished = builder.finish(&[]);
                            sheet.cells.insert((finished.row, finished.col), finished);
                        }
                    }
                    b"v" if is_start_event && cell.is_some() => {
                        text_target = Some(TextTarget::Value);
                    }
                    b"f" if is_start_event && cell.is_some() => {
                        text_target = Some(TextTarget::Formula);
                    }
                    b"is" if is_start_event && cell.is_some() => in_inline = true,
                    b"rPh" => in_inline = false,
                    b"t" if is_start_event && in_inline => {
                        text_target = Some(TextTarget::Inline);
                    }
                    b"col" => {
                        if let Some(spec) = parse_col_spec(e) {
                            sheet.columns.push(spec);
                        }
                    }
                    _ => {}
                }
            }
            Event::Text(ref t) => {
                if let (Some(target), Some(c)) = (text_target, cell.as_mut()) {
                    c.push_text(target, &t.unescape()?);
                }
            }
            Event::CData(ref t) => {
                if let (Some(target), Some(c)) = (text_target, cell.as_mut()) {
                    c.push_text(target, &String::from_utf8_lossy(t));
                }
            }
            Event::End(ref e) => match e.local_name().as_ref() {
                b"v" | b"f" | b"t" => text_target = None,
                b"is" => in_inline = false,
                b"c" => {
                    text_target = None;
                    in_inline = false;
                    if let Some(builder) = cell.take() {
                        let finished = builder.finish(shared_strings);
                        sheet.cells.insert((finished.row, finished.col), finished);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(sheet)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp
)]
mod tests {
    use super::*;
    use test_case::test_case;

    const SHEET: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<dimension ref="A1:D3"/>
<cols><col min="1" max="2" width="12.5" customWidth="1"/><col min="4" max="4" width="3" hidden="1"/></cols>
<sheetData>
<row r="1" ht="30" customHeight="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c><c r="C1"/></row>
<row r="2"><c r="A2"><v>42.5</v></c><c r="B2" t="b"><v>1</v></c><c r="C2" t="e"><v>#DIV/0!</v></c><c r="D2"><f>SUM(A2,1)</f><v>43.5</v></c></row>
<row r="3"><c r="A3" t="inlineStr"><is><t>inline &amp; text</t></is></c><c r="B3" t="str"><f>_xlfn.DISPIMG("ID_1",1)</f><v>=DISPIMG("ID_1",1)</v></c></row>
</sheetData>
</worksheet>"#;

    fn shared() -> Vec<String> {
        vec!["Name".to_string(), "Photo".to_string()]
    }

    #[test]
    fn test_parse_sheet_values() {
        let sheet = parse_sheet(SHEET, &shared()).unwrap();
        assert_eq!(sheet.dimension, Some((0, 0, 2, 3)));
        assert_eq!(sheet.cells.len(), 9);

        let a1 = sheet.cell(0, 0).unwrap();
        assert_eq!(a1.value, Some(CellValue::Text("Name".to_string())));
        assert_eq!(a1.kind, CellKind::String);
        assert_eq!(a1.raw.as_deref(), Some("0"));

        let c1 = sheet.cell(0, 2).unwrap();
        assert_eq!(c1.value, None);
        assert_eq!(c1.kind, CellKind::Empty);

        assert_eq!(sheet.cell(1, 0).unwrap().value, Some(CellValue::Number(42.5)));
        assert_eq!(sheet.cell(1, 1).unwrap().value, Some(CellValue::Bool(true)));
        assert_eq!(sheet.cell(1, 2).unwrap().kind, CellKind::Error);

        let d2 = sheet.cell(1, 3).unwrap();
        assert_eq!(d2.formula.as_deref(), Some("SUM(A2,1)"));
        assert_eq!(d2.value, Some(CellValue::Number(43.5)));

        let a3 = sheet.cell(2, 0).unwrap();
        assert_eq!(a3.value, Some(CellValue::Text("inline & text".to_string())));

        let b3 = sheet.cell(2, 1).unwrap();
        assert_eq!(b3.formula.as_deref(), Some("_xlfn.DISPIMG(\"ID_1\",1)"));
        assert_eq!(b3.raw.as_deref(), Some("=DISPIMG(\"ID_1\",1)"));
    }

    #[test]
    fn test_row_and_column_metadata() {
        let sheet = parse_sheet(SHEET, &shared()).unwrap();
        assert_eq!(sheet.row_height(0), Some(30.0));
        assert_eq!(sheet.row_height(1), None);

        let b = sheet.column(1).unwrap();
        assert_eq!(b.width, Some(12.5));
        assert!(!b.hidden);
        assert!(sheet.column(2).is_none());
        assert!(sheet.column(3).unwrap().hidden);
    }

    #[test]
    fn test_used_range_without_dimension() {
        let xml = r#"<worksheet><sheetData>
<row r="4"><c r="C4"><v>1</v></c></row>
<row><c><v>2</v></c><c><v>3</v></c></row>
</sheetData></worksheet>"#;
        let sheet = parse_sheet(xml, &[]).unwrap();
        assert_eq!(sheet.dimension, None);
        // Row 5 follows row 4; its cells fill A5 and B5
        assert_eq!(sheet.cell(4, 1).unwrap().value, Some(CellValue::Number(3.0)));
        assert_eq!(sheet.used_range(), Some((3, 0, 4, 2)));

        let empty = parse_sheet("<worksheet><sheetData/></worksheet>", &[]).unwrap();
        assert_eq!(empty.used_range(), None);
    }

    #[test]
    fn test_malformed_sheet_is_an_error() {
        assert!(parse_sheet("<worksheet><sheetData></worksheet>", &[]).is_err());
    }

    #[test_case(Some("7"), CellTypeTag::Shared, None, CellKind::String ; "shared index out of range")]
    #[test_case(Some("abc"), CellTypeTag::Number, Some(CellValue::Text("abc".to_string())), CellKind::String ; "non numeric number")]
    #[test_case(Some("0"), CellTypeTag::Bool, Some(CellValue::Bool(false)), CellKind::Boolean ; "false boolean")]
    #[test_case(None, CellTypeTag::Str, None, CellKind::Empty ; "no value")]
    fn test_resolve_cell_value(
        raw: Option<&str>,
        tag: CellTypeTag,
        expected: Option<CellValue>,
        kind: CellKind,
    ) {
        let (value, resolved_kind) = resolve_cell_value(raw, tag, &[]);
        assert_eq!(resolved_kind, kind);
        match expected {
            Some(v) => assert_eq!(value, Some(v)),
            None if kind == CellKind::String => {
                assert_eq!(value, Some(CellValue::Text(String::new())));
            }
            None => assert_eq!(value, None),
        }
    }
}
