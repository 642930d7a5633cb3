//! Structured error types for sheetpix.
//!
//! Only fatal conditions travel as errors. Per-sheet and per-image failures are
//! recorded as strings in [`crate::types::ParseResult::errors`] instead.

/// All errors that can occur while opening and reading a spreadsheet package.
#[derive(Debug, thiserror::Error)]
pub enum SheetpixError {
    /// XML parsing error from quick-xml.
    #[error("XML parsing: {0}")]
    Xml(#[from] quick_xml::Error),

    /// ZIP archive error.
    #[error("ZIP archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Invalid cell reference.
    #[error("Invalid cell reference: {0}")]
    CellRef(String),

    /// A part the package format requires is absent.
    #[error("Missing package part: {0}")]
    MissingPart(String),

    /// General parse error.
    #[error("Parse error: {0}")]
    Parse(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SheetpixError>;

impl From<SheetpixError> for wasm_bindgen::JsValue {
    fn from(e: SheetpixError) -> Self {
        wasm_bindgen::JsValue::from_str(&e.to_string())
    }
}

/// Why an image was skipped during resolution.
///
/// Skips are recoverable: they become `[skip] reason=...` diagnostics in the
/// parse result and processing moves on to the next image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The picture's `r:embed` has no matching relationship
    MissingRelationship,
    /// The relationship targets something outside the package
    External,
    /// The media part could not be read
    ExtractFailed,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingRelationship => "missing_relationship",
            Self::External => "external",
            Self::ExtractFailed => "extract_failed",
        }
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Format a skip diagnostic.
///
/// `scope` names where the image was declared, e.g. `sheet=Sheet1` or
/// `source=cellimages`.
pub fn skip_diagnostic(
    reason: SkipReason,
    scope: &str,
    image_id: &str,
    relationship_id: &str,
    target: &str,
) -> String {
    format!("[skip] reason={reason} {scope} image={image_id} rid={relationship_id} target={target}")
}
