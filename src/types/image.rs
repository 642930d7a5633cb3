use indexmap::map::Entry;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Offset and extent of an image in EMUs (English Metric Units).
///
/// Values are copied from the shape transform as-is; converting to pixels
/// is left to whatever renders the result.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ImagePosition {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

/// An image declared in the package-level cell-image part and referenced
/// from cell formulas by name.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NamedCellImage {
    /// Stable name used by `DISPIMG("<id>", ...)`
    pub id: String,
    pub description: String,
    /// Relationship id (`r:embed`) into the cell-image part's relationships
    pub relationship_id: String,
    pub position: ImagePosition,
}

/// A picture anchored to a worksheet cell through a drawing part.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FloatingImage {
    pub id: String,
    pub description: String,
    /// Relationship id (`r:embed`) into the drawing part's relationships
    pub relationship_id: String,
    pub position: ImagePosition,
    /// A1-style reference of the anchor's starting cell
    pub anchor_cell: String,
    /// Starting row (0-indexed)
    pub anchor_row: u32,
    /// Starting column (0-indexed)
    pub anchor_col: u32,
}

/// Which embedding mechanism an image came from.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ImageSource {
    /// Named cell image referenced by a `DISPIMG` formula
    CellImage,
    /// Picture anchored through a drawing part
    Floating,
}

/// An image whose binary data has been pulled out of the package.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedImage {
    pub id: String,
    pub description: String,
    /// `data:<mime>;base64,<payload>`
    pub base64_data_uri: String,
    pub mime_type: String,
    pub position: ImagePosition,
    pub relationship_id: String,
    pub source: ImageSource,
    /// Media part the bytes were read from, relative to `xl/`
    pub media_path: String,
}

impl ResolvedImage {
    /// The base64 payload without the `data:...;base64,` prefix.
    pub fn base64_payload(&self) -> &str {
        self.base64_data_uri
            .split_once(";base64,")
            .map_or(self.base64_data_uri.as_str(), |(_, payload)| payload)
    }
}

/// Resolved images keyed by id, in discovery order.
///
/// Serializes as a plain JSON object.
pub type ImageMap = IndexMap<String, ResolvedImage>;

/// Register an image unless its id is already taken.
///
/// The first image registered under an id wins. Returns `true` when the
/// image was stored.
pub fn register_image(images: &mut ImageMap, image: ResolvedImage) -> bool {
    match images.entry(image.id.clone()) {
        Entry::Occupied(_) => false,
        Entry::Vacant(slot) => {
            slot.insert(image);
            true
        }
    }
}
