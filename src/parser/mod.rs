//! Spreadsheet model - workbook sheet list, shared strings, sheet contents.
//!
//! This is the value-decoding side of a parse: it knows nothing about images.
//! The walker combines it with the image bindings.

mod shared_strings;
mod worksheet;

pub use worksheet::{parse_sheet, ColumnSpec, ModelCell, SheetModel};

use crate::error::{Result, SheetpixError};
use crate::namespaces::{
    is_shared_strings_relationship, is_worksheet_relationship, SHARED_STRINGS_PART,
    WORKBOOK_PART, WORKBOOK_RELS_PART, XL_ROOT,
};
use crate::package::Package;
use crate::relationships::{
    normalize_target_path, parse_relationships, parse_sheet_declarations, sheet_target_path,
    Relationships,
};

use shared_strings::parse_shared_strings;

/// A sheet declared by the workbook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetEntry {
    pub name: String,
    /// Worksheet part path relative to `xl/`; `None` when the declaration
    /// does not resolve to a worksheet part
    pub path: Option<String>,
}

/// Workbook-level state shared by every sheet of one package.
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    pub sheets: Vec<SheetEntry>,
    shared_strings: Vec<String>,
    relationships: Relationships,
}

impl Workbook {
    /// Read the workbook part, its relationships and the shared string table.
    ///
    /// # Errors
    /// Fails when the workbook part is missing or malformed; the package is
    /// then not a spreadsheet this crate can read.
    pub fn load(package: &mut Package<'_>) -> Result<Self> {
        let workbook_xml = package
            .read_text(WORKBOOK_PART)?
            .ok_or_else(|| SheetpixError::MissingPart(WORKBOOK_PART.to_string()))?;
        let declarations = parse_sheet_declarations(&workbook_xml)?;

        let relationships = package
            .read_optional_text(WORKBOOK_RELS_PART)
            .map(|text| parse_relationships(&text))
            .unwrap_or_default();

        let sheets: Vec<SheetEntry> = declarations
            .into_iter()
            .map(|decl| {
                let path = relationships
                    .get(&decl.relationship_id)
                    .filter(|rel| !rel.external && is_worksheet_relationship(&rel.rel_type))
                    .map(|rel| sheet_target_path(&rel.target));
                SheetEntry {
                    name: decl.name,
                    path,
                }
            })
            .collect();

        let shared_strings_part = relationships
            .values()
            .find(|rel| !rel.external && is_shared_strings_relationship(&rel.rel_type))
            .map_or_else(
                || SHARED_STRINGS_PART.to_string(),
                |rel| format!("{XL_ROOT}/{}", normalize_target_path("", &rel.target)),
            );
        let shared_strings = package
            .read_optional_text(&shared_strings_part)
            .map(|text| parse_shared_strings(&text))
            .unwrap_or_default();

        log::debug!(
            "workbook: {} sheet(s), {} shared string(s)",
            sheets.len(),
            shared_strings.len()
        );

        Ok(Self {
            sheets,
            shared_strings,
            relationships,
        })
    }

    /// Workbook relationships (`xl/_rels/workbook.xml.rels`).
    pub fn relationships(&self) -> &Relationships {
        &self.relationships
    }

    pub fn shared_strings(&self) -> &[String] {
        &self.shared_strings
    }

    /// Parse the contents of one sheet.
    ///
    /// # Errors
    /// Fails when the sheet has no worksheet part or its XML is malformed.
    pub fn load_sheet(&self, package: &mut Package<'_>, sheet: &SheetEntry) -> Result<SheetModel> {
        let path = sheet.path.as_deref().ok_or_else(|| {
            SheetpixError::MissingPart(format!("worksheet for sheet {}", sheet.name))
        })?;
        let part = format!("{XL_ROOT}/{path}");
        let xml_text = package
            .read_text(&part)?
            .ok_or_else(|| SheetpixError::MissingPart(part.clone()))?;
        parse_sheet(&xml_text, &self.shared_strings)
    }
}
