use serde::{Deserialize, Serialize};

/// Options recognized by a parse call.
///
/// Deserializes from camelCase JSON; missing fields take their defaults.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ParseOptions {
    /// Resolve named cell images and floating images
    pub include_images: bool,
    /// Keep rows that have no values
    pub include_empty_rows: bool,
    /// Emit cells that do not exist in the sheet
    pub include_empty_columns: bool,
    /// Accepted for compatibility; images are never re-encoded
    pub image_quality: f64,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            include_images: true,
            include_empty_rows: false,
            include_empty_columns: false,
            image_quality: 1.0,
        }
    }
}

impl ParseOptions {
    #[must_use]
    pub fn include_images(mut self, yes: bool) -> Self {
        self.include_images = yes;
        self
    }

    #[must_use]
    pub fn include_empty_rows(mut self, yes: bool) -> Self {
        self.include_empty_rows = yes;
        self
    }

    #[must_use]
    pub fn include_empty_columns(mut self, yes: bool) -> Self {
        self.include_empty_columns = yes;
        self
    }

    /// Clamped to `0.0..=1.0`; NaN falls back to `1.0`.
    #[must_use]
    pub fn image_quality(mut self, quality: f64) -> Self {
        self.image_quality = if quality.is_nan() {
            1.0
        } else {
            quality.clamp(0.0, 1.0)
        };
        self
    }

    /// Parse options from a JSON object such as `{"includeEmptyRows": true}`.
    ///
    /// # Errors
    /// Returns an error if the text is not a valid options object.
    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        Ok(options.image_quality(options.image_quality))
    }
}
