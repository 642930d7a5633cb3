//! Top-level parse entry point.
//!
//! A [`SpreadsheetReader`] runs one parse per call:
//!
//! 1. open the package and read the workbook (fatal on failure)
//! 2. resolve named cell images, then floating images
//! 3. walk every sheet, reconciling values with image bindings
//!
//! Failures never escape as errors: a result is always returned, with
//! diagnostics in [`ParseResult::errors`].

use std::path::Path;

use crate::cell_images::load_named_cell_images;
use crate::floating::FloatingImageCoordinator;
use crate::package::Package;
use crate::parser::Workbook;
use crate::types::{ParseOptions, ParseResult};
use crate::walker::walk_workbook;

/// Reusable reader; each call starts from a clean state.
///
/// Not meant to be shared between concurrent parses: the binding table
/// belongs to the call in flight.
#[derive(Debug, Default)]
pub struct SpreadsheetReader {
    options: ParseOptions,
    coordinator: FloatingImageCoordinator,
}

impl SpreadsheetReader {
    pub fn new(options: ParseOptions) -> Self {
        Self {
            options,
            coordinator: FloatingImageCoordinator::new(),
        }
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Parse a package held in memory.
    pub fn parse_buffer(&mut self, data: &[u8]) -> ParseResult {
        self.coordinator.clear();
        let mut result = ParseResult::default();

        let mut package = match Package::open(data) {
            Ok(package) => package,
            Err(e) => {
                log::warn!("cannot open package: {e}");
                result.errors.push(format!("Failed to open package: {e}"));
                return result;
            }
        };

        let workbook = match Workbook::load(&mut package) {
            Ok(workbook) => workbook,
            Err(e) => {
                log::warn!("cannot read workbook: {e}");
                result.errors.push(format!("Failed to read workbook: {e}"));
                return result;
            }
        };

        if self.options.include_images {
            load_named_cell_images(&mut package, workbook.relationships(), &mut result);
            self.coordinator.parse_floating_images(&mut package, &mut result);
        }

        walk_workbook(
            &mut package,
            &workbook,
            &self.coordinator,
            &self.options,
            &mut result,
        );

        log::info!(
            "parsed {} sheet(s), {} image(s), {} diagnostic(s)",
            result.worksheets.len(),
            result.images.len(),
            result.errors.len()
        );
        result
    }

    /// Read and parse a package from disk.
    pub fn parse_file(&mut self, path: impl AsRef<Path>) -> ParseResult {
        let path = path.as_ref();
        match std::fs::read(path) {
            Ok(data) => self.parse_buffer(&data),
            Err(e) => {
                self.coordinator.clear();
                log::warn!("cannot read {}: {e}", path.display());
                ParseResult {
                    errors: vec![format!("Failed to read {}: {e}", path.display())],
                    ..ParseResult::default()
                }
            }
        }
    }
}
