//! Data types produced by sheetpix.

mod image;
mod options;
mod workbook;

pub use image::*;
pub use options::*;
pub use workbook::*;
