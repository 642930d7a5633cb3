use serde::{Deserialize, Serialize};

use super::{ImageMap, ImageSource};

/// Cell type as reported in the result.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum CellKind {
    String,
    Number,
    Boolean,
    Error,
    /// Cell displays a named cell image; overrides the value's own type
    Image,
    Empty,
}

/// A decoded cell value.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Bool(bool),
    Text(String),
}

impl CellValue {
    /// Empty strings count as no value.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Text(s) if s.is_empty())
    }
}

/// Image shown in a cell.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CellImageLink {
    /// Key into [`ParseResult::images`]
    pub id: String,
    pub source: ImageSource,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CellRecord {
    /// A1-style reference
    #[serde(rename = "ref")]
    pub reference: String,
    /// Row number (1-indexed)
    pub row: u32,
    /// Column index (0-indexed)
    pub col: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<CellValue>,
    #[serde(rename = "type")]
    pub kind: CellKind,
    /// Formula text without the leading `=`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<CellImageLink>,
}

impl CellRecord {
    pub fn has_value(&self) -> bool {
        self.value.as_ref().is_some_and(|v| !v.is_empty())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RowRecord {
    /// Row number (1-indexed)
    pub row_number: u32,
    /// Explicit row height in points
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    pub cells: Vec<CellRecord>,
    /// Distinct floating image ids bound to this row
    pub image_count: u32,
    /// Cells that first introduced each counted image, left to right
    pub image_cells: Vec<String>,
}

/// Width metadata for one column of the scanned range.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ColumnMeta {
    /// Column index (0-indexed)
    pub index: u32,
    pub letter: String,
    /// Explicit width in character units
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    pub hidden: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorksheetRecord {
    pub name: String,
    /// Top-left cell of the scanned range
    pub data_range_start: String,
    /// Bottom-right cell of the scanned range
    pub data_range_end: String,
    pub rows: Vec<RowRecord>,
    pub column_meta: Vec<ColumnMeta>,
    /// Sum of the rows' image counts; an image spanning rows counts once per row
    pub total_images: u32,
    /// Number of scanned rows with at least one image
    pub rows_with_images: u32,
}

/// Everything extracted from one package.
#[derive(Debug, Serialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ParseResult {
    pub worksheets: Vec<WorksheetRecord>,
    pub images: ImageMap,
    /// Diagnostics for everything that was skipped or failed
    pub errors: Vec<String>,
}

impl ParseResult {
    pub fn worksheet(&self, name: &str) -> Option<&WorksheetRecord> {
        self.worksheets.iter().find(|ws| ws.name == name)
    }
}

impl WorksheetRecord {
    pub fn row(&self, row_number: u32) -> Option<&RowRecord> {
        self.rows.iter().find(|row| row.row_number == row_number)
    }

    pub fn cell(&self, reference: &str) -> Option<&CellRecord> {
        self.rows
            .iter()
            .flat_map(|row| row.cells.iter())
            .find(|cell| cell.reference == reference)
    }
}
