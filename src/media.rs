//! Image binary extraction from `xl/media/`.
//!
//! The MIME type is inferred from the file extension only. The bytes are
//! never sniffed: consumers rely on the extension-derived value, even for
//! files whose extension lies about their content.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

use crate::namespaces::XL_ROOT;
use crate::package::Package;

/// Image format as implied by a media file's extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Bmp,
    Webp,
    /// Any other extension; reported as JPEG
    Unknown,
}

impl ImageFormat {
    /// Detect image format from file extension
    #[must_use]
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Self::Png,
            "jpg" | "jpeg" => Self::Jpeg,
            "gif" => Self::Gif,
            "bmp" => Self::Bmp,
            "webp" => Self::Webp,
            _ => Self::Unknown,
        }
    }

    /// Detect image format from the extension of a part path.
    #[must_use]
    pub fn from_path(path: &str) -> Self {
        let filename = path.rsplit('/').next().unwrap_or(path);
        match filename.rsplit_once('.') {
            Some((_, ext)) => Self::from_extension(ext),
            None => Self::Unknown,
        }
    }

    #[must_use]
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg | Self::Unknown => "image/jpeg",
            Self::Gif => "image/gif",
            Self::Bmp => "image/bmp",
            Self::Webp => "image/webp",
        }
    }

    /// Canonical file extension for writing the image back out.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg | Self::Unknown => "jpg",
            Self::Gif => "gif",
            Self::Bmp => "bmp",
            Self::Webp => "webp",
        }
    }

    /// Reverse of [`Self::mime_type`].
    #[must_use]
    pub fn from_mime_type(mime: &str) -> Self {
        match mime {
            "image/png" => Self::Png,
            "image/jpeg" => Self::Jpeg,
            "image/gif" => Self::Gif,
            "image/bmp" => Self::Bmp,
            "image/webp" => Self::Webp,
            _ => Self::Unknown,
        }
    }
}

/// Bytes of one media part plus its data-URI encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedImage {
    /// `data:<mime>;base64,<payload>`
    pub data_uri: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Build a data URI for `bytes`.
pub fn data_uri(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{mime_type};base64,{}", BASE64.encode(bytes))
}

/// Read `xl/<media_path>` and encode it as a data URI.
///
/// A missing or unreadable part yields `None`: a relationship pointing
/// nowhere is a degraded but legitimate package state.
pub fn extract_image_data(package: &mut Package<'_>, media_path: &str) -> Option<ExtractedImage> {
    let media_path = media_path.trim_start_matches('/');
    let part_path = format!("{XL_ROOT}/{media_path}");

    let bytes = match package.read_binary(&part_path) {
        Ok(Some(bytes)) => bytes,
        Ok(None) => {
            log::debug!("media part {part_path} not found");
            return None;
        }
        Err(e) => {
            log::warn!("media part {part_path} unreadable: {e}");
            return None;
        }
    };

    let mime_type = ImageFormat::from_path(media_path).mime_type();
    Some(ExtractedImage {
        data_uri: data_uri(mime_type, &bytes),
        mime_type,
        bytes,
    })
}
