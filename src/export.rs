//! Compact output - image metadata with file references instead of inline
//! data URIs, and the image bytes written next to the JSON.

use std::fs;
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use indexmap::IndexMap;
use serde::Serialize;

use crate::error::{Result, SheetpixError};
use crate::media::ImageFormat;
use crate::types::{ImagePosition, ImageSource, ParseResult, ResolvedImage, WorksheetRecord};

/// Image metadata pointing at an extracted file.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompactImage {
    pub id: String,
    pub description: String,
    pub mime_type: String,
    pub position: ImagePosition,
    pub relationship_id: String,
    pub source: ImageSource,
    /// Path of the image file, relative to the JSON output
    pub file: String,
}

/// [`ParseResult`] with compact images; serializes with the same shape.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct CompactResult<'a> {
    pub worksheets: &'a [WorksheetRecord],
    pub images: IndexMap<String, CompactImage>,
    pub errors: &'a [String],
}

/// File name for the `index`-th image: a filesystem-safe form of its id
/// with the extension implied by its MIME type.
///
/// The index prefix keeps names unique when two ids sanitize alike.
pub fn image_file_name(index: usize, image: &ResolvedImage) -> String {
    let stem: String = image
        .id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    let extension = ImageFormat::from_mime_type(&image.mime_type).extension();
    format!("{:03}_{stem}.{extension}", index + 1)
}

/// Build the compact form of `result`, with file references under `images_dir`.
pub fn compact_result<'a>(result: &'a ParseResult, images_dir: &str) -> CompactResult<'a> {
    let images_dir = images_dir.trim_end_matches('/');
    let images = result
        .images
        .values()
        .enumerate()
        .map(|(index, image)| {
            let name = image_file_name(index, image);
            let compact = CompactImage {
                id: image.id.clone(),
                description: image.description.clone(),
                mime_type: image.mime_type.clone(),
                position: image.position,
                relationship_id: image.relationship_id.clone(),
                source: image.source,
                file: if images_dir.is_empty() {
                    name
                } else {
                    format!("{images_dir}/{name}")
                },
            };
            (image.id.clone(), compact)
        })
        .collect();

    CompactResult {
        worksheets: &result.worksheets,
        images,
        errors: &result.errors,
    }
}

/// Decode every resolved image and write it into `dir`, creating the
/// directory if needed. Files are named by [`image_file_name`].
///
/// # Errors
/// Fails on the first payload that is not valid base64 or file that cannot
/// be written.
pub fn write_image_files(result: &ParseResult, dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;

    let mut written = Vec::with_capacity(result.images.len());
    for (index, image) in result.images.values().enumerate() {
        let bytes = BASE64
            .decode(image.base64_payload())
            .map_err(|e| SheetpixError::Parse(format!("image {}: {e}", image.id)))?;
        let path = dir.join(image_file_name(index, image));
        fs::write(&path, bytes)?;
        log::debug!("wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}
