//! Sheet walking - reconciles cell values with both kinds of image binding.
//!
//! For every worksheet the scan covers the declared dimension grown to
//! include every floating-image anchor, so pictures anchored outside the
//! populated area still surface. Within a row, each image id is counted
//! once; the sheet total is the plain sum of the row counts.

use std::collections::HashSet;

use crate::cell_images::extract_dispimg_id;
use crate::cell_ref::{cell_ref, column_letters, decode_cell_ref};
use crate::error::Result;
use crate::floating::{FloatingImageCoordinator, SheetBindings};
use crate::package::Package;
use crate::parser::{SheetModel, Workbook};
use crate::types::{
    CellImageLink, CellKind, CellRecord, CellValue, ColumnMeta, ImageMap, ImageSource,
    ParseOptions, ParseResult, RowRecord, WorksheetRecord,
};

/// Inclusive cell range as (start_row, start_col, end_row, end_col), 0-indexed.
pub type CellRange = (u32, u32, u32, u32);

/// Grow `declared` to cover every bound anchor cell.
///
/// # Errors
/// Fails if a binding key is not a valid A1 reference.
pub fn effective_range(
    declared: Option<CellRange>,
    bindings: &SheetBindings,
) -> Result<Option<CellRange>> {
    let mut range = declared;
    for reference in bindings.keys() {
        let (col, row) = decode_cell_ref(reference)?;
        range = Some(match range {
            None => (row, col, row, col),
            Some((r0, c0, r1, c1)) => (r0.min(row), c0.min(col), r1.max(row), c1.max(col)),
        });
    }
    Ok(range)
}

/// Id of the named cell image a cell displays, if it resolves.
///
/// The formula is checked first, then the cached value, then the decoded
/// text (a shared-string cell caches only the string index). Only ids
/// registered from the cell-image part count.
fn named_image_id(model: &SheetModel, row: u32, col: u32, images: &ImageMap) -> Option<String> {
    let cell = model.cell(row, col)?;
    cell.formula
        .as_deref()
        .and_then(extract_dispimg_id)
        .or_else(|| cell.raw.as_deref().and_then(extract_dispimg_id))
        .or_else(|| match &cell.value {
            Some(CellValue::Text(text)) => extract_dispimg_id(text),
            _ => None,
        })
        .filter(|id| {
            images
                .get(id)
                .is_some_and(|image| image.source == ImageSource::CellImage)
        })
}

fn image_link(id: &str, images: &ImageMap, default_source: ImageSource) -> CellImageLink {
    CellImageLink {
        id: id.to_string(),
        source: images.get(id).map_or(default_source, |image| image.source),
    }
}

/// Build the record of one worksheet.
///
/// `bindings` are the sheet's floating-image anchors; `images` is the
/// registry every binding and `DISPIMG` id must resolve against.
///
/// # Errors
/// Fails if a binding key is not a valid A1 reference.
pub fn walk_sheet(
    name: &str,
    model: &SheetModel,
    bindings: &SheetBindings,
    images: &ImageMap,
    options: &ParseOptions,
) -> Result<WorksheetRecord> {
    let mut record = WorksheetRecord {
        name: name.to_string(),
        data_range_start: cell_ref(0, 0),
        data_range_end: cell_ref(0, 0),
        rows: Vec::new(),
        column_meta: Vec::new(),
        total_images: 0,
        rows_with_images: 0,
    };

    let range = effective_range(model.used_range(), bindings)?;
    let Some((start_row, start_col, end_row, end_col)) = range else {
        return Ok(record);
    };
    record.data_range_start = cell_ref(start_col, start_row);
    record.data_range_end = cell_ref(end_col, end_row);

    record.column_meta = (start_col..=end_col)
        .map(|col| {
            let spec = model.column(col);
            ColumnMeta {
                index: col,
                letter: column_letters(col),
                width: spec.and_then(|s| s.width),
                hidden: spec.is_some_and(|s| s.hidden),
            }
        })
        .collect();

    for row in start_row..=end_row {
        let mut row_record = RowRecord {
            row_number: row + 1,
            height: model.row_height(row),
            cells: Vec::new(),
            image_count: 0,
            image_cells: Vec::new(),
        };
        let mut seen: HashSet<&str> = HashSet::new();
        let mut has_value = false;
        let mut has_image = false;

        for col in start_col..=end_col {
            let reference = cell_ref(col, row);
            let bound = bindings.get(&reference).map_or(&[][..], Vec::as_slice);

            for id in bound {
                if seen.insert(id.as_str()) {
                    row_record.image_count += 1;
                    record.total_images += 1;
                    row_record.image_cells.push(reference.clone());
                }
            }

            let model_cell = model.cell(row, col);
            let mut cell = CellRecord {
                reference,
                row: row + 1,
                col,
                value: model_cell.and_then(|c| c.value.clone()),
                kind: model_cell.map_or(CellKind::Empty, |c| c.kind),
                formula: model_cell.and_then(|c| c.formula.clone()),
                image: None,
            };

            if options.include_images {
                if let Some(id) = named_image_id(model, row, col, images) {
                    cell.kind = CellKind::Image;
                    cell.image = Some(image_link(&id, images, ImageSource::CellImage));
                } else if let Some(first) = bound.first() {
                    cell.image = Some(image_link(first, images, ImageSource::Floating));
                }
            }

            has_value |= cell.has_value();
            has_image |= cell.image.is_some();
            if model_cell.is_some() || options.include_empty_columns || cell.image.is_some() {
                row_record.cells.push(cell);
            }
        }

        if row_record.image_count > 0 {
            record.rows_with_images += 1;
        }
        if options.include_empty_rows || has_value || has_image || row_record.image_count > 0 {
            record.rows.push(row_record);
        }
    }

    Ok(record)
}

/// Walk every sheet of the workbook into `result.worksheets`.
///
/// A sheet that cannot be read is reported in `result.errors` and left out;
/// the remaining sheets are still walked.
pub fn walk_workbook(
    package: &mut Package<'_>,
    workbook: &Workbook,
    coordinator: &FloatingImageCoordinator,
    options: &ParseOptions,
    result: &mut ParseResult,
) {
    for sheet in &workbook.sheets {
        let walked = workbook.load_sheet(package, sheet).and_then(|model| {
            let bindings = coordinator.get_sheet_floating_images(&sheet.name);
            walk_sheet(&sheet.name, &model, bindings, &result.images, options)
        });

        match walked {
            Ok(record) => {
                log::debug!(
                    "sheet {}: {} row(s), {} image(s) in {}:{}",
                    record.name,
                    record.rows.len(),
                    record.total_images,
                    record.data_range_start,
                    record.data_range_end
                );
                result.worksheets.push(record);
            }
            Err(e) => result.errors.push(format!("sheet {}: {e}", sheet.name)),
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use crate::parser::parse_sheet;
    use crate::types::{register_image, ImagePosition, ResolvedImage};

    fn image(id: &str, source: ImageSource) -> ResolvedImage {
        ResolvedImage {
            id: id.to_string(),
            description: String::new(),
            base64_data_uri: "data:image/png;base64,iVBORw==".to_string(),
            mime_type: "image/png".to_string(),
            position: ImagePosition::default(),
            relationship_id: "rId1".to_string(),
            source,
            media_path: "media/image1.png".to_string(),
        }
    }

    fn bindings(entries: &[(&str, &[&str])]) -> SheetBindings {
        entries
            .iter()
            .map(|(cell, ids)| {
                (
                    (*cell).to_string(),
                    ids.iter().map(|id| (*id).to_string()).collect(),
                )
            })
            .collect()
    }

    const SHEET: &str = r#"<worksheet><dimension ref="A1:C3"/><sheetData>
<row r="1"><c r="A1" t="str"><v>Name</v></c><c r="B1" t="str"><v>Photo</v></c></row>
<row r="2"><c r="A2" t="str"><v>Widget</v></c><c r="B2" t="str"><f>_xlfn.DISPIMG("ID_W",1)</f><v>=DISPIMG("ID_W",1)</v></c></row>
<row r="3"><c r="A3" t="str"><v>Gadget</v></c><c r="B3" t="str"><v>=DISPIMG("ID_UNKNOWN",1)</v></c></row>
</sheetData></worksheet>"#;

    #[test]
    fn test_named_cell_image_overrides_type() {
        let model = parse_sheet(SHEET, &[]).unwrap();
        let mut images = ImageMap::new();
        register_image(&mut images, image("ID_W", ImageSource::CellImage));

        let no_bindings = SheetBindings::new();
        let ws = walk_sheet("Items", &model, &no_bindings, &images, &ParseOptions::default()).unwrap();

        let b2 = ws.cell("B2").unwrap();
        assert_eq!(b2.kind, CellKind::Image);
        assert_eq!(b2.image.as_ref().unwrap().id, "ID_W");
        assert_eq!(b2.formula.as_deref(), Some("_xlfn.DISPIMG(\"ID_W\",1)"));

        // Unresolved ids leave the cell as a plain string
        let b3 = ws.cell("B3").unwrap();
        assert_eq!(b3.kind, CellKind::String);
        assert!(b3.image.is_none());

        // Named images do not count as row images
        assert_eq!(ws.total_images, 0);
        assert_eq!((ws.data_range_start.as_str(), ws.data_range_end.as_str()), ("A1", "C3"));
    }

    #[test]
    fn test_dispimg_in_shared_string_is_detected() {
        let xml = r#"<worksheet><sheetData>
<row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c></row>
</sheetData></worksheet>"#;
        let strings = vec!["=DISPIMG(\"ID_W\",1)".to_string(), "caption".to_string()];
        let model = parse_sheet(xml, &strings).unwrap();
        let mut images = ImageMap::new();
        register_image(&mut images, image("ID_W", ImageSource::CellImage));

        let ws = walk_sheet("S", &model, &SheetBindings::new(), &images, &ParseOptions::default()).unwrap();
        let a1 = ws.cell("A1").unwrap();
        assert_eq!(a1.kind, CellKind::Image);
        assert_eq!(a1.image.as_ref().unwrap().source, ImageSource::CellImage);
        assert_eq!(ws.cell("B1").unwrap().kind, CellKind::String);
    }

    #[test]
    fn test_dispimg_naming_floating_image_stays_plain() {
        let model = parse_sheet(SHEET, &[]).unwrap();
        let mut images = ImageMap::new();
        register_image(&mut images, image("ID_W", ImageSource::Floating));

        let ws = walk_sheet("S", &model, &SheetBindings::new(), &images, &ParseOptions::default()).unwrap();
        let b2 = ws.cell("B2").unwrap();
        assert_eq!(b2.kind, CellKind::String);
        assert!(b2.image.is_none());
    }

    #[test]
    fn test_per_row_dedup_and_plain_sheet_sum() {
        let model = parse_sheet(SHEET, &[]).unwrap();
        let mut images = ImageMap::new();
        register_image(&mut images, image("Logo", ImageSource::Floating));
        register_image(&mut images, image("Stamp", ImageSource::Floating));

        // Logo is anchored in two cells of row 1 and once more in row 3
        let binds = bindings(&[
            ("A1", &["Logo"][..]),
            ("C1", &["Logo", "Stamp"][..]),
            ("C3", &["Logo"][..]),
        ]);
        let ws = walk_sheet("Items", &model, &binds, &images, &ParseOptions::default()).unwrap();

        let row1 = ws.row(1).unwrap();
        assert_eq!(row1.image_count, 2);
        assert_eq!(row1.image_cells, vec!["A1", "C1"]);
        let row3 = ws.row(3).unwrap();
        assert_eq!(row3.image_count, 1);

        // Logo counted once in row 1 and again in row 3
        assert_eq!(ws.total_images, 3);
        assert_eq!(ws.total_images, ws.rows.iter().map(|r| r.image_count).sum::<u32>());
        assert_eq!(ws.rows_with_images, 2);

        // Representative image is the first binding; C1 exists only because of it
        let c1 = ws.cell("C1").unwrap();
        assert_eq!(c1.image.as_ref().unwrap().id, "Logo");
        assert_eq!(c1.kind, CellKind::Empty);
    }

    #[test]
    fn test_anchor_outside_dimension_extends_range() {
        let model = parse_sheet(SHEET, &[]).unwrap();
        let mut images = ImageMap::new();
        register_image(&mut images, image("Far", ImageSource::Floating));
        let binds = bindings(&[("E101", &["Far"][..])]);

        let ws = walk_sheet("Items", &model, &binds, &images, &ParseOptions::default()).unwrap();

        assert_eq!(ws.data_range_end, "E101");
        assert_eq!(ws.column_meta.len(), 5);
        assert_eq!(ws.column_meta[4].letter, "E");
        let row = ws.row(101).unwrap();
        assert_eq!(row.image_cells, vec!["E101"]);
        assert_eq!(row.cells.len(), 1);
        // Empty rows in between are not emitted
        assert!(ws.row(50).is_none());
    }

    #[test]
    fn test_empty_rows_and_columns_options() {
        let model = parse_sheet(SHEET, &[]).unwrap();
        let images = ImageMap::new();

        let no_bindings = SheetBindings::new();
        let compact = walk_sheet("S", &model, &no_bindings, &images, &ParseOptions::default()).unwrap();
        assert_eq!(compact.row(1).unwrap().cells.len(), 2);

        let options = ParseOptions::default()
            .include_empty_rows(true)
            .include_empty_columns(true);
        let full = walk_sheet("S", &model, &no_bindings, &images, &options).unwrap();
        assert_eq!(full.rows.len(), 3);
        assert_eq!(full.row(1).unwrap().cells.len(), 3);
        assert_eq!(full.cell("C1").unwrap().value, None);
        assert_eq!(
            full.cell("A2").unwrap().value,
            Some(CellValue::Text("Widget".to_string()))
        );
    }

    #[test]
    fn test_images_disabled_leaves_cells_plain() {
        let model = parse_sheet(SHEET, &[]).unwrap();
        let mut images = ImageMap::new();
        register_image(&mut images, image("ID_W", ImageSource::CellImage));
        let options = ParseOptions::default().include_images(false);

        let ws = walk_sheet("S", &model, &SheetBindings::new(), &images, &options).unwrap();
        assert_eq!(ws.cell("B2").unwrap().kind, CellKind::String);
    }

    #[test]
    fn test_empty_sheet() {
        let model = parse_sheet("<worksheet><sheetData/></worksheet>", &[]).unwrap();
        let no_bindings = SheetBindings::new();
        let options = ParseOptions::default();
        let ws = walk_sheet("Blank", &model, &no_bindings, &ImageMap::new(), &options).unwrap();
        assert!(ws.rows.is_empty());
        assert!(ws.column_meta.is_empty());
        assert_eq!(ws.data_range_start, "A1");
    }

    #[test]
    fn test_invalid_binding_key_is_an_error() {
        let binds = bindings(&[("not-a-cell", &["x"][..])]);
        assert!(effective_range(None, &binds).is_err());
        let declared = Some((1, 1, 2, 2));
        assert_eq!(effective_range(declared, &SheetBindings::new()).unwrap(), declared);
    }
}
