//! Package path and relationship-type constants.
//!
//! Spreadsheet packages come in transitional and strict OOXML flavors, and
//! some producers (WPS in particular) add their own relationship types. The
//! helpers here classify relationship types without caring which flavor
//! produced them.

// =============================================================================
// Fixed package parts
// =============================================================================

/// Folder holding every spreadsheet part; relationship targets resolve below it.
pub const XL_ROOT: &str = "xl";

/// Workbook part.
pub const WORKBOOK_PART: &str = "xl/workbook.xml";

/// Workbook relationships part.
pub const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";

/// Default location of the named cell-image part when no relationship declares it.
pub const CELL_IMAGES_PART: &str = "xl/cellimages.xml";

/// Default shared strings part.
pub const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";

/// Folder names a relationship target may already start with.
pub const KNOWN_FOLDERS: [&str; 3] = ["worksheets/", "drawings/", "media/"];

// =============================================================================
// Office document relationship types
// =============================================================================

/// Relationship type for worksheets
pub const REL_WORKSHEET: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";

/// Relationship type for shared strings
pub const REL_SHARED_STRINGS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings";

/// Relationship type for drawings (sheet -> drawing part)
pub const REL_DRAWING: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/drawing";

/// Relationship type for images (drawing/cellimages -> media part)
pub const REL_IMAGE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

/// Strict relationship type for worksheets
pub const REL_WORKSHEET_STRICT: &str =
    "http://purl.oclc.org/ooxml/officeDocument/relationships/worksheet";

/// Strict relationship type for shared strings
pub const REL_SHARED_STRINGS_STRICT: &str =
    "http://purl.oclc.org/ooxml/officeDocument/relationships/sharedStrings";

/// Strict relationship type for drawings
pub const REL_DRAWING_STRICT: &str =
    "http://purl.oclc.org/ooxml/officeDocument/relationships/drawing";

/// Marker every drawing relationship type ends with. `vmlDrawing` does not match.
pub const DRAWING_REL_MARKER: &str = "/drawing";

/// Value of `TargetMode` for relationships pointing outside the package.
pub const TARGET_MODE_EXTERNAL: &str = "External";

// =============================================================================
// Classification helpers
// =============================================================================

/// Check if a relationship type points at a worksheet part.
pub fn is_worksheet_relationship(rel_type: &str) -> bool {
    rel_type == REL_WORKSHEET || rel_type == REL_WORKSHEET_STRICT || rel_type.ends_with("/worksheet")
}

/// Check if a relationship type points at the shared strings part.
pub fn is_shared_strings_relationship(rel_type: &str) -> bool {
    rel_type == REL_SHARED_STRINGS
        || rel_type == REL_SHARED_STRINGS_STRICT
        || rel_type.ends_with("/sharedStrings")
}

/// Check if a relationship type points at a drawing part.
pub fn is_drawing_relationship(rel_type: &str) -> bool {
    rel_type == REL_DRAWING || rel_type == REL_DRAWING_STRICT || rel_type.contains(DRAWING_REL_MARKER)
}
