//! Test fixtures for generating XLSX packages in memory.
//!
//! Builders cover what the image resolver cares about: cells (including
//! `DISPIMG` formulas), sheet dimensions, drawings with anchored pictures,
//! the named cell-image part, and media files.
//!
//! # Example
//!
//! ```rust
//! use fixtures::{SheetBuilder, XlsxBuilder, PNG_BYTES};
//!
//! let xlsx = XlsxBuilder::new()
//!     .media("image1.png", PNG_BYTES)
//!     .sheet(
//!         SheetBuilder::new("Sheet1")
//!             .cell("A1", "Hello")
//!             .picture(0, 5, "Logo", "../media/image1.png"),
//!     )
//!     .build();
//!
//! let result = sheetpix::parse_buffer(&xlsx, Default::default());
//! ```
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic,
    clippy::cast_possible_truncation
)]

use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::ZipWriter;

/// A valid 1x1 transparent PNG.
pub const PNG_BYTES: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F, 0x15, 0xC4,
    0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00, 0x01, 0x00, 0x00,
    0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE,
    0x42, 0x60, 0x82,
];

/// JPEG start/end markers around a few filler bytes.
pub const JPEG_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46, 0xFF, 0xD9];

const REL_IMAGE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
const REL_DRAWING: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/drawing";
const REL_WORKSHEET: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
const REL_SHARED_STRINGS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings";
const REL_CELL_IMAGE: &str = "http://www.wps.cn/officeDocument/2020/cellImage";

const NS_DRAWING: &str = r#"xmlns:xdr="http://schemas.openxmlformats.org/drawingml/2006/spreadsheetDrawing" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships""#;

// ============================================================================
// Cell values
// ============================================================================

/// Cell value types.
#[derive(Debug, Clone)]
pub enum CellValue {
    String(String),
    Number(f64),
    Bool(bool),
    /// Formula with its cached string result
    Formula { formula: String, cached: String },
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        CellValue::Number(f64::from(n))
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

/// `_xlfn.DISPIMG` formula referencing a named cell image.
pub fn dispimg(id: &str) -> CellValue {
    CellValue::Formula {
        formula: format!("_xlfn.DISPIMG(\"{id}\",1)"),
        cached: format!("=DISPIMG(\"{id}\",1)"),
    }
}

// ============================================================================
// Pictures
// ============================================================================

/// How a picture's relationship is written into the drawing's `.rels`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PictureLink {
    /// Internal target relative to the drawing folder
    Internal(String),
    /// `TargetMode="External"` URL
    External(String),
    /// No relationship at all for the embed id
    Dangling,
}

/// A picture anchored in a sheet's drawing.
#[derive(Debug, Clone)]
pub struct Picture {
    /// 0-indexed anchor column
    pub col: u32,
    /// 0-indexed anchor row
    pub row: u32,
    pub name: String,
    pub description: String,
    pub link: PictureLink,
    pub one_cell: bool,
}

// ============================================================================
// Sheet Builder
// ============================================================================

/// A cell in the sheet.
#[derive(Debug, Clone)]
pub struct CellEntry {
    pub cell_ref: String,
    pub value: CellValue,
}

/// A column width definition.
#[derive(Debug, Clone)]
pub struct ColumnWidth {
    pub min: u32,
    pub max: u32,
    pub width: f64,
    pub hidden: bool,
}

/// Builder for a single worksheet.
#[derive(Debug, Clone, Default)]
pub struct SheetBuilder {
    pub name: String,
    pub cells: Vec<CellEntry>,
    pub dimension: Option<String>,
    pub col_widths: Vec<ColumnWidth>,
    pub row_heights: Vec<(u32, f64)>,
    pub pictures: Vec<Picture>,
    /// Raw drawing XML replacing the generated one
    pub drawing_xml: Option<String>,
}

impl SheetBuilder {
    /// Create a new sheet builder with the given name.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Add a cell with a value.
    #[must_use]
    pub fn cell<V: Into<CellValue>>(mut self, cell_ref: &str, value: V) -> Self {
        self.cells.push(CellEntry {
            cell_ref: cell_ref.to_string(),
            value: value.into(),
        });
        self
    }

    /// Override the `<dimension ref>` written for the sheet.
    #[must_use]
    pub fn dimension(mut self, range: &str) -> Self {
        self.dimension = Some(range.to_string());
        self
    }

    /// Set column width (1-indexed `min`/`max` as in the file format).
    #[must_use]
    pub fn col_width(mut self, min: u32, max: u32, width: f64) -> Self {
        self.col_widths.push(ColumnWidth {
            min,
            max,
            width,
            hidden: false,
        });
        self
    }

    /// Hide columns (1-indexed).
    #[must_use]
    pub fn hide_cols(mut self, min: u32, max: u32) -> Self {
        self.col_widths.push(ColumnWidth {
            min,
            max,
            width: 0.0,
            hidden: true,
        });
        self
    }

    /// Set row height in points (1-indexed row).
    #[must_use]
    pub fn row_height(mut self, row: u32, height: f64) -> Self {
        self.row_heights.push((row, height));
        self
    }

    fn push_picture(mut self, col: u32, row: u32, name: &str, link: PictureLink) -> Self {
        self.pictures.push(Picture {
            col,
            row,
            name: name.to_string(),
            description: format!("{name} description"),
            link,
            one_cell: false,
        });
        self
    }

    /// Anchor a picture at 0-indexed (col, row), linked to `target`
    /// relative to the drawing folder (e.g. `../media/image1.png`).
    #[must_use]
    pub fn picture(self, col: u32, row: u32, name: &str, target: &str) -> Self {
        self.push_picture(col, row, name, PictureLink::Internal(target.to_string()))
    }

    /// Like [`Self::picture`] but with a `oneCellAnchor`.
    #[must_use]
    pub fn one_cell_picture(mut self, col: u32, row: u32, name: &str, target: &str) -> Self {
        self = self.picture(col, row, name, target);
        if let Some(last) = self.pictures.last_mut() {
            last.one_cell = true;
        }
        self
    }

    /// Anchor a picture whose relationship points outside the package.
    #[must_use]
    pub fn external_picture(self, col: u32, row: u32, name: &str, url: &str) -> Self {
        self.push_picture(col, row, name, PictureLink::External(url.to_string()))
    }

    /// Anchor a picture whose embed id has no relationship.
    #[must_use]
    pub fn dangling_picture(self, col: u32, row: u32, name: &str) -> Self {
        self.push_picture(col, row, name, PictureLink::Dangling)
    }

    /// Use this drawing XML verbatim instead of generating one.
    #[must_use]
    pub fn raw_drawing(mut self, xml: &str) -> Self {
        self.drawing_xml = Some(xml.to_string());
        self
    }

    fn has_drawing(&self) -> bool {
        !self.pictures.is_empty() || self.drawing_xml.is_some()
    }
}

// ============================================================================
// Named cell images
// ============================================================================

/// A picture declared in `xl/cellimages.xml`.
#[derive(Debug, Clone)]
pub struct CellImageEntry {
    pub id: String,
    pub description: String,
    /// Target relative to `xl/` (e.g. `media/image1.png`)
    pub target: String,
}

// ============================================================================
// XLSX Builder
// ============================================================================

/// Builder for complete XLSX packages.
#[derive(Debug, Default)]
pub struct XlsxBuilder {
    sheets: Vec<SheetBuilder>,
    media: Vec<(String, Vec<u8>)>,
    cell_images: Vec<CellImageEntry>,
    declare_cell_images: bool,
}

impl XlsxBuilder {
    /// Create a new XLSX builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a worksheet.
    #[must_use]
    pub fn sheet(mut self, sheet: SheetBuilder) -> Self {
        self.sheets.push(sheet);
        self
    }

    /// Store a media file at `xl/media/<name>`.
    #[must_use]
    pub fn media(mut self, name: &str, bytes: &[u8]) -> Self {
        self.media.push((format!("xl/media/{name}"), bytes.to_vec()));
        self
    }

    /// Declare a named cell image in `xl/cellimages.xml`.
    #[must_use]
    pub fn cell_image(mut self, id: &str, description: &str, target: &str) -> Self {
        self.cell_images.push(CellImageEntry {
            id: id.to_string(),
            description: description.to_string(),
            target: target.to_string(),
        });
        self
    }

    /// Also declare the cell-image part through a workbook relationship.
    #[must_use]
    pub fn declare_cell_images(mut self) -> Self {
        self.declare_cell_images = true;
        self
    }

    /// Build the XLSX file as bytes.
    #[must_use]
    pub fn build(self) -> Vec<u8> {
        let cursor = Cursor::new(Vec::new());
        let mut zip = ZipWriter::new(cursor);
        let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        let mut shared_strings: Vec<String> = Vec::new();
        for sheet in &self.sheets {
            for cell in &sheet.cells {
                if let CellValue::String(ref s) = cell.value {
                    if !shared_strings.contains(s) {
                        shared_strings.push(s.clone());
                    }
                }
            }
        }

        let mut write = |path: &str, data: &[u8]| {
            zip.start_file(path, options).unwrap();
            zip.write_all(data).unwrap();
        };

        write("[Content_Types].xml", generate_content_types().as_bytes());
        write("xl/workbook.xml", generate_workbook(&self.sheets).as_bytes());
        write(
            "xl/_rels/workbook.xml.rels",
            generate_workbook_rels(self.sheets.len(), self.declare_cell_images).as_bytes(),
        );
        if !shared_strings.is_empty() {
            write(
                "xl/sharedStrings.xml",
                generate_shared_strings(&shared_strings).as_bytes(),
            );
        }

        let mut drawing_index = 0;
        for (i, sheet) in self.sheets.iter().enumerate() {
            let sheet_number = i + 1;
            write(
                &format!("xl/worksheets/sheet{sheet_number}.xml"),
                generate_sheet_xml(sheet, &shared_strings).as_bytes(),
            );
            if !sheet.has_drawing() {
                continue;
            }

            drawing_index += 1;
            write(
                &format!("xl/worksheets/_rels/sheet{sheet_number}.xml.rels"),
                relationships(&[(
                    "rId1".to_string(),
                    REL_DRAWING.to_string(),
                    format!("../drawings/drawing{drawing_index}.xml"),
                    false,
                )])
                .as_bytes(),
            );
            let drawing = sheet
                .drawing_xml
                .clone()
                .unwrap_or_else(|| generate_drawing(&sheet.pictures));
            write(
                &format!("xl/drawings/drawing{drawing_index}.xml"),
                drawing.as_bytes(),
            );
            write(
                &format!("xl/drawings/_rels/drawing{drawing_index}.xml.rels"),
                generate_drawing_rels(&sheet.pictures).as_bytes(),
            );
        }

        if !self.cell_images.is_empty() {
            write("xl/cellimages.xml", generate_cell_images(&self.cell_images).as_bytes());
            let rels: Vec<_> = self
                .cell_images
                .iter()
                .enumerate()
                .map(|(i, image)| (format!("rId{}", i + 1), REL_IMAGE.to_string(), image.target.clone(), false))
                .collect();
            write("xl/_rels/cellimages.xml.rels", relationships(&rels).as_bytes());
        }

        for (path, bytes) in &self.media {
            write(path, bytes);
        }

        let cursor = zip.finish().expect("Failed to finish ZIP");
        cursor.into_inner()
    }
}

/// Build a package from raw `(path, content)` parts.
pub fn build_raw_package(parts: &[(&str, &[u8])]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    for (name, data) in parts {
        zip.start_file(*name, options).unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().expect("Failed to finish ZIP").into_inner()
}

// ============================================================================
// XML generators
// ============================================================================

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn generate_content_types() -> String {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Default Extension="png" ContentType="image/png"/>
<Default Extension="jpeg" ContentType="image/jpeg"/>
</Types>"#
        .to_string()
}

fn generate_workbook(sheets: &[SheetBuilder]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>"#,
    );
    for (i, sheet) in sheets.iter().enumerate() {
        xml.push_str(&format!(
            r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
            xml_escape(&sheet.name),
            i + 1,
            i + 1
        ));
    }
    xml.push_str("</sheets></workbook>");
    xml
}

/// (id, type, target, external)
fn relationships(rels: &[(String, String, String, bool)]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for (id, rel_type, target, external) in rels {
        let mode = if *external { r#" TargetMode="External""# } else { "" };
        xml.push_str(&format!(
            r#"<Relationship Id="{id}" Type="{rel_type}" Target="{}"{mode}/>"#,
            xml_escape(target)
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

fn generate_workbook_rels(sheet_count: usize, declare_cell_images: bool) -> String {
    let mut rels: Vec<_> = (1..=sheet_count)
        .map(|i| {
            (
                format!("rId{i}"),
                REL_WORKSHEET.to_string(),
                format!("worksheets/sheet{i}.xml"),
                false,
            )
        })
        .collect();
    rels.push((
        format!("rId{}", sheet_count + 1),
        REL_SHARED_STRINGS.to_string(),
        "sharedStrings.xml".to_string(),
        false,
    ));
    if declare_cell_images {
        rels.push((
            format!("rId{}", sheet_count + 2),
            REL_CELL_IMAGE.to_string(),
            "cellimages.xml".to_string(),
            false,
        ));
    }
    relationships(&rels)
}

fn generate_shared_strings(strings: &[String]) -> String {
    let mut xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{0}" uniqueCount="{0}">"#,
        strings.len()
    );
    for s in strings {
        xml.push_str(&format!("<si><t>{}</t></si>", xml_escape(s)));
    }
    xml.push_str("</sst>");
    xml
}

/// Split "B12" into ("B", 12).
fn split_ref(cell_ref: &str) -> (String, u32) {
    let letters: String = cell_ref.chars().take_while(char::is_ascii_alphabetic).collect();
    let row = cell_ref[letters.len()..].parse().unwrap();
    (letters, row)
}

fn column_index(letters: &str) -> u32 {
    letters
        .bytes()
        .fold(0, |acc, b| acc * 26 + u32::from(b.to_ascii_uppercase() - b'A' + 1))
        - 1
}

fn column_name(mut col: u32) -> String {
    let mut name = Vec::new();
    col += 1;
    while col > 0 {
        name.push(b'A' + ((col - 1) % 26) as u8);
        col = (col - 1) / 26;
    }
    name.reverse();
    String::from_utf8(name).unwrap()
}

fn generate_sheet_xml(sheet: &SheetBuilder, shared_strings: &[String]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
    );

    let dimension = sheet.dimension.clone().unwrap_or_else(|| {
        let refs: Vec<_> = sheet.cells.iter().map(|c| split_ref(&c.cell_ref)).collect();
        if refs.is_empty() {
            return "A1".to_string();
        }
        let min_col = refs.iter().map(|(l, _)| column_index(l)).min().unwrap();
        let max_col = refs.iter().map(|(l, _)| column_index(l)).max().unwrap();
        let min_row = refs.iter().map(|(_, r)| *r).min().unwrap();
        let max_row = refs.iter().map(|(_, r)| *r).max().unwrap();
        format!(
            "{}{min_row}:{}{max_row}",
            column_name(min_col),
            column_name(max_col)
        )
    });
    xml.push_str(&format!(r#"<dimension ref="{dimension}"/>"#));

    if !sheet.col_widths.is_empty() {
        xml.push_str("<cols>");
        for cw in &sheet.col_widths {
            let hidden = if cw.hidden { r#" hidden="1""# } else { "" };
            xml.push_str(&format!(
                r#"<col min="{}" max="{}" width="{}" customWidth="1"{hidden}/>"#,
                cw.min, cw.max, cw.width
            ));
        }
        xml.push_str("</cols>");
    }

    xml.push_str("<sheetData>");
    let mut rows: Vec<u32> = sheet
        .cells
        .iter()
        .map(|c| split_ref(&c.cell_ref).1)
        .chain(sheet.row_heights.iter().map(|(r, _)| *r))
        .collect();
    rows.sort_unstable();
    rows.dedup();

    for row in rows {
        let height = sheet
            .row_heights
            .iter()
            .find(|(r, _)| *r == row)
            .map(|(_, h)| format!(r#" ht="{h}" customHeight="1""#))
            .unwrap_or_default();
        xml.push_str(&format!(r#"<row r="{row}"{height}>"#));

        let mut cells: Vec<_> = sheet
            .cells
            .iter()
            .filter(|c| split_ref(&c.cell_ref).1 == row)
            .collect();
        cells.sort_by_key(|c| column_index(&split_ref(&c.cell_ref).0));

        for cell in cells {
            let r = &cell.cell_ref;
            match &cell.value {
                CellValue::String(s) => {
                    let idx = shared_strings.iter().position(|x| x == s).unwrap();
                    xml.push_str(&format!(r#"<c r="{r}" t="s"><v>{idx}</v></c>"#));
                }
                CellValue::Number(n) => xml.push_str(&format!(r#"<c r="{r}"><v>{n}</v></c>"#)),
                CellValue::Bool(b) => {
                    xml.push_str(&format!(r#"<c r="{r}" t="b"><v>{}</v></c>"#, u8::from(*b)));
                }
                CellValue::Formula { formula, cached } => xml.push_str(&format!(
                    r#"<c r="{r}" t="str"><f>{}</f><v>{}</v></c>"#,
                    xml_escape(formula),
                    xml_escape(cached)
                )),
            }
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData>");

    if sheet.has_drawing() {
        xml.push_str(r#"<drawing r:id="rId1"/>"#);
    }
    xml.push_str("</worksheet>");
    xml
}

fn pic_xml(index: usize, picture: &Picture) -> String {
    format!(
        r#"<xdr:pic><xdr:nvPicPr><xdr:cNvPr id="{}" name="{}" descr="{}"/><xdr:cNvPicPr><a:picLocks noChangeAspect="1"/></xdr:cNvPicPr></xdr:nvPicPr><xdr:blipFill><a:blip r:embed="rId{}"/><a:stretch><a:fillRect/></a:stretch></xdr:blipFill><xdr:spPr><a:xfrm><a:off x="{}" y="{}"/><a:ext cx="952500" cy="952500"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></xdr:spPr></xdr:pic>"#,
        index + 2,
        xml_escape(&picture.name),
        xml_escape(&picture.description),
        index + 1,
        u64::from(picture.col) * 609_600,
        u64::from(picture.row) * 190_500,
    )
}

fn generate_drawing(pictures: &[Picture]) -> String {
    let mut xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><xdr:wsDr {NS_DRAWING}>"#
    );
    for (i, picture) in pictures.iter().enumerate() {
        let from = format!(
            "<xdr:from><xdr:col>{}</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>{}</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:from>",
            picture.col, picture.row
        );
        if picture.one_cell {
            xml.push_str(&format!(
                r#"<xdr:oneCellAnchor>{from}<xdr:ext cx="952500" cy="952500"/>{}<xdr:clientData/></xdr:oneCellAnchor>"#,
                pic_xml(i, picture)
            ));
        } else {
            xml.push_str(&format!(
                r#"<xdr:twoCellAnchor editAs="oneCell">{from}<xdr:to><xdr:col>{}</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>{}</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:to>{}<xdr:clientData/></xdr:twoCellAnchor>"#,
                picture.col + 2,
                picture.row + 4,
                pic_xml(i, picture)
            ));
        }
    }
    xml.push_str("</xdr:wsDr>");
    xml
}

fn generate_drawing_rels(pictures: &[Picture]) -> String {
    let rels: Vec<_> = pictures
        .iter()
        .enumerate()
        .filter_map(|(i, picture)| {
            let (target, external) = match &picture.link {
                PictureLink::Internal(target) => (target.clone(), false),
                PictureLink::External(url) => (url.clone(), true),
                PictureLink::Dangling => return None,
            };
            Some((format!("rId{}", i + 1), REL_IMAGE.to_string(), target, external))
        })
        .collect();
    relationships(&rels)
}

fn generate_cell_images(images: &[CellImageEntry]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<etc:cellImages xmlns:xdr="http://schemas.openxmlformats.org/drawingml/2006/spreadsheetDrawing" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:etc="http://www.wps.cn/officeDocument/2017/etCustomData">"#,
    );
    for (i, image) in images.iter().enumerate() {
        xml.push_str(&format!(
            r#"<etc:cellImage><xdr:pic><xdr:nvPicPr><xdr:cNvPr id="{}" name="{}" descr="{}"/><xdr:cNvPicPr/></xdr:nvPicPr><xdr:blipFill><a:blip r:embed="rId{}"/><a:stretch><a:fillRect/></a:stretch></xdr:blipFill><xdr:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="1270000" cy="635000"/></a:xfrm></xdr:spPr></xdr:pic></etc:cellImage>"#,
            i + 2,
            xml_escape(&image.id),
            xml_escape(&image.description),
            i + 1
        ));
    }
    xml.push_str("</etc:cellImages>");
    xml
}
