//! Package access - the opened ZIP container of one spreadsheet.
//!
//! A [`Package`] is created per parse call and owns the archive index for the
//! duration of that call. Part lookups distinguish "absent" (`Ok(None)`) from
//! "present but unreadable" (`Err`), so callers can treat missing optional
//! parts as "feature not present".

use std::io::{Cursor, Read};

use zip::result::ZipError;
use zip::ZipArchive;

use crate::error::Result;

/// An opened spreadsheet package.
pub struct Package<'a> {
    archive: ZipArchive<Cursor<&'a [u8]>>,
}

impl<'a> Package<'a> {
    /// Open a package from an in-memory buffer.
    ///
    /// # Errors
    /// Returns an error if the buffer is not a readable ZIP archive.
    pub fn open(data: &'a [u8]) -> Result<Self> {
        let archive = ZipArchive::new(Cursor::new(data))?;
        Ok(Self { archive })
    }

    /// Whether a part exists at `path` (leading slashes ignored).
    pub fn has_part(&self, path: &str) -> bool {
        let path = path.trim_start_matches('/');
        self.archive.file_names().any(|name| name == path)
    }

    /// Read a part as raw bytes. Returns `Ok(None)` if the part is absent.
    ///
    /// # Errors
    /// Returns an error if the part exists but cannot be decompressed.
    pub fn read_binary(&mut self, path: &str) -> Result<Option<Vec<u8>>> {
        let path = path.trim_start_matches('/');
        let mut file = match self.archive.by_name(path) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        Ok(Some(data))
    }

    /// Read a part as UTF-8 text. Returns `Ok(None)` if the part is absent.
    ///
    /// A leading byte-order mark is dropped and invalid UTF-8 sequences are
    /// replaced rather than rejected.
    ///
    /// # Errors
    /// Returns an error if the part exists but cannot be decompressed.
    pub fn read_text(&mut self, path: &str) -> Result<Option<String>> {
        let Some(data) = self.read_binary(path)? else {
            return Ok(None);
        };
        let bytes = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(&data);
        Ok(Some(String::from_utf8_lossy(bytes).into_owned()))
    }

    /// Read an optional text part, folding read failures into "absent".
    ///
    /// Used for parts whose absence or corruption only means a feature is
    /// missing (relationship files, drawings, the cell-image part).
    pub fn read_optional_text(&mut self, path: &str) -> Option<String> {
        match self.read_text(path) {
            Ok(text) => text,
            Err(e) => {
                log::warn!("unreadable part {path}: {e}");
                None
            }
        }
    }
}

/// Relationship part for a given part path.
///
/// e.g. "xl/drawings/drawing1.xml" -> "xl/drawings/_rels/drawing1.xml.rels"
pub fn rels_path_for(part_path: &str) -> String {
    let part_path = part_path.trim_start_matches('/');
    if let Some((dir, filename)) = part_path.rsplit_once('/') {
        format!("{dir}/_rels/{filename}.rels")
    } else {
        format!("_rels/{part_path}.rels")
    }
}
