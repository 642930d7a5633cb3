//! Floating image coordination - from worksheets to drawings to media.
//!
//! For each worksheet the chain is:
//!
//! ```text
//! xl/workbook.xml ──rels──▶ xl/worksheets/sheetN.xml
//!                  ──rels──▶ xl/drawings/drawingM.xml
//!                  ──rels──▶ xl/media/imageK.png
//! ```
//!
//! Each resolved picture is registered in the parse result's image map and
//! bound to its anchor cell. The binding table is the only state kept between
//! calls and is reset by [`FloatingImageCoordinator::clear`].

use std::collections::{BTreeMap, HashMap};

use crate::error::{skip_diagnostic, Result, SkipReason};
use crate::media::extract_image_data;
use crate::namespaces::{WORKBOOK_PART, WORKBOOK_RELS_PART, XL_ROOT};
use crate::package::{rels_path_for, Package};
use crate::relationships::{
    find_drawing_relationship, map_sheet_names_to_paths, normalize_target_path,
    parse_relationships, SheetPart,
};
use crate::types::{register_image, ImageSource, ParseResult, ResolvedImage};

/// Anchor cell reference to the ids of the images anchored there, in
/// drawing order.
pub type SheetBindings = BTreeMap<String, Vec<String>>;

static NO_BINDINGS: SheetBindings = BTreeMap::new();

/// Owns the sheet -> cell -> image id binding table of one parse.
#[derive(Debug, Default)]
pub struct FloatingImageCoordinator {
    bindings: HashMap<String, SheetBindings>,
}

impl FloatingImageCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every binding from a previous parse.
    pub fn clear(&mut self) {
        self.bindings.clear();
    }

    /// Bindings of one sheet. Sheets without drawings have none.
    pub fn get_sheet_floating_images(&self, sheet_name: &str) -> &SheetBindings {
        self.bindings.get(sheet_name).unwrap_or(&NO_BINDINGS)
    }

    /// Resolve the floating images of every worksheet in the package.
    ///
    /// Registers images into `result.images` (first registration wins) and
    /// records skip diagnostics in `result.errors`. A sheet whose drawing
    /// cannot be read is reported and skipped; the other sheets continue.
    pub fn parse_floating_images(&mut self, package: &mut Package<'_>, result: &mut ParseResult) {
        let (Some(workbook_xml), Some(workbook_rels_xml)) = (
            package.read_optional_text(WORKBOOK_PART),
            package.read_optional_text(WORKBOOK_RELS_PART),
        ) else {
            return;
        };

        for sheet in map_sheet_names_to_paths(&workbook_xml, &workbook_rels_xml) {
            match self.bind_sheet(package, &sheet, result) {
                Ok(0) => {}
                Ok(bound) => log::debug!("sheet {}: {bound} floating image(s) bound", sheet.name),
                Err(e) => result
                    .errors
                    .push(format!("sheet {}: floating images unavailable: {e}", sheet.name)),
            }
        }
    }

    /// Resolve one sheet's drawing. Returns the number of bindings added.
    fn bind_sheet(
        &mut self,
        package: &mut Package<'_>,
        sheet: &SheetPart,
        result: &mut ParseResult,
    ) -> Result<usize> {
        let sheet_part = format!("{XL_ROOT}/{}", sheet.path);
        let Some(sheet_rels_xml) = package.read_optional_text(&rels_path_for(&sheet_part)) else {
            return Ok(0);
        };
        let sheet_rels = parse_relationships(&sheet_rels_xml);
        let Some(drawing_rel) = find_drawing_relationship(&sheet_rels) else {
            return Ok(0);
        };
        if drawing_rel.external {
            return Ok(0);
        }

        let drawing_path = normalize_target_path("worksheets", &drawing_rel.target);
        let drawing_part = format!("{XL_ROOT}/{drawing_path}");
        let Some(drawing_xml) = package.read_text(&drawing_part)? else {
            log::debug!("sheet {}: drawing {drawing_part} not in package", sheet.name);
            return Ok(0);
        };
        let drawing_rels = package
            .read_optional_text(&rels_path_for(&drawing_part))
            .map(|text| parse_relationships(&text))
            .unwrap_or_default();

        let scope = format!("sheet={}", sheet.name);
        let mut bound = 0;

        for image in crate::drawings::parse_drawing_xml(&drawing_xml) {
            let skip = |reason: SkipReason, target: &str| {
                let line = skip_diagnostic(reason, &scope, &image.id, &image.relationship_id, target);
                log::debug!("{line}");
                line
            };

            let Some(rel) = drawing_rels.get(&image.relationship_id) else {
                result.errors.push(skip(SkipReason::MissingRelationship, ""));
                continue;
            };
            if rel.external {
                result.errors.push(skip(SkipReason::External, &rel.target));
                continue;
            }

            let media_path = normalize_target_path("drawings", &rel.target);
            let Some(extracted) = extract_image_data(package, &media_path) else {
                result.errors.push(skip(SkipReason::ExtractFailed, &media_path));
                continue;
            };

            register_image(&mut result.images, ResolvedImage {
                id: image.id.clone(),
                description: image.description.clone(),
                base64_data_uri: extracted.data_uri,
                mime_type: extracted.mime_type.to_string(),
                position: image.position,
                relationship_id: image.relationship_id.clone(),
                source: ImageSource::Floating,
                media_path,
            });

            self.bindings
                .entry(sheet.name.clone())
                .or_default()
                .entry(image.anchor_cell)
                .or_default()
                .push(image.id);
            bound += 1;
        }

        Ok(bound)
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::FileOptions;
    use zip::ZipWriter;

    const PNG: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 1, 2, 3];

    fn build_zip(parts: &[(&str, &[u8])]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in parts {
            zip.start_file(*name, FileOptions::default()).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    const WORKBOOK: &str = r#"<workbook xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>
<sheet name="Photos" sheetId="1" r:id="rId1"/><sheet name="Plain" sheetId="2" r:id="rId2"/></sheets></workbook>"#;

    const WORKBOOK_RELS: &str = r#"<Relationships>
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet2.xml"/>
</Relationships>"#;

    const SHEET_RELS: &str = r#"<Relationships>
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/drawing" Target="../drawings/drawing1.xml"/>
</Relationships>"#;

    fn anchor(col: u32, row: u32, name: &str, embed: &str) -> String {
        format!(
            r#"<xdr:oneCellAnchor><xdr:from><xdr:col>{col}</xdr:col><xdr:row>{row}</xdr:row></xdr:from><xdr:ext cx="10" cy="20"/>
<xdr:pic><xdr:nvPicPr><xdr:cNvPr id="1" name="{name}"/></xdr:nvPicPr><xdr:blipFill><a:blip r:embed="{embed}"/></xdr:blipFill></xdr:pic></xdr:oneCellAnchor>"#
        )
    }

    fn package_with_drawing(anchors: &str, drawing_rels: &str) -> Vec<u8> {
        let drawing = format!(
            r#"<xdr:wsDr xmlns:xdr="x" xmlns:a="a" xmlns:r="r">{anchors}</xdr:wsDr>"#
        );
        build_zip(&[
            ("xl/workbook.xml", WORKBOOK.as_bytes()),
            ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS.as_bytes()),
            ("xl/worksheets/sheet1.xml", b"<worksheet/>"),
            ("xl/worksheets/sheet2.xml", b"<worksheet/>"),
            ("xl/worksheets/_rels/sheet1.xml.rels", SHEET_RELS.as_bytes()),
            ("xl/drawings/drawing1.xml", drawing.as_bytes()),
            ("xl/drawings/_rels/drawing1.xml.rels", drawing_rels.as_bytes()),
            ("xl/media/image1.png", PNG),
        ])
    }

    #[test]
    fn test_binds_anchor_cells_and_registers_images() {
        let data = package_with_drawing(
            &format!("{}{}", anchor(0, 5, "Logo", "rId1"), anchor(0, 5, "Stamp", "rId1")),
            r#"<Relationships><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="../media/image1.png"/></Relationships>"#,
        );
        let mut package = Package::open(&data).unwrap();
        let mut result = ParseResult::default();
        let mut coordinator = FloatingImageCoordinator::new();

        coordinator.parse_floating_images(&mut package, &mut result);

        assert!(result.errors.is_empty(), "{:?}", result.errors);
        assert_eq!(result.images.keys().collect::<Vec<_>>(), vec!["Logo", "Stamp"]);
        let logo = result.images.get("Logo").unwrap();
        assert_eq!(logo.media_path, "media/image1.png");
        assert_eq!(logo.mime_type, "image/png");
        assert_eq!(logo.source, ImageSource::Floating);
        assert_eq!((logo.position.width, logo.position.height), (10, 20));

        let photos = coordinator.get_sheet_floating_images("Photos");
        assert_eq!(photos.get("A6").unwrap(), &vec!["Logo".to_string(), "Stamp".to_string()]);
        assert!(coordinator.get_sheet_floating_images("Plain").is_empty());
        assert!(coordinator.get_sheet_floating_images("Nope").is_empty());

        coordinator.clear();
        assert!(coordinator.get_sheet_floating_images("Photos").is_empty());
    }

    #[test]
    fn test_skips_are_reported_and_do_not_stop_the_sheet() {
        let data = package_with_drawing(
            &format!(
                "{}{}{}{}",
                anchor(1, 0, "Remote", "rId2"),
                anchor(1, 1, "Dangling", "rId9"),
                anchor(1, 2, "Gone", "rId3"),
                anchor(1, 3, "Fine", "rId1"),
            ),
            r#"<Relationships>
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="../media/image1.png"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="https://example.com/x.png" TargetMode="External"/>
<Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="../media/missing.png"/>
</Relationships>"#,
        );
        let mut package = Package::open(&data).unwrap();
        let mut result = ParseResult::default();
        let mut coordinator = FloatingImageCoordinator::new();
        coordinator.parse_floating_images(&mut package, &mut result);

        assert_eq!(
            result.errors,
            vec![
                "[skip] reason=external sheet=Photos image=Remote rid=rId2 target=https://example.com/x.png",
                "[skip] reason=missing_relationship sheet=Photos image=Dangling rid=rId9 target=",
                "[skip] reason=extract_failed sheet=Photos image=Gone rid=rId3 target=media/missing.png",
            ]
        );
        assert_eq!(result.images.len(), 1);
        let photos = coordinator.get_sheet_floating_images("Photos");
        assert_eq!(photos.len(), 1);
        assert!(photos.contains_key("B4"));
    }

    #[test]
    fn test_existing_image_id_is_not_overwritten() {
        let data = package_with_drawing(
            &anchor(2, 2, "Logo", "rId1"),
            r#"<Relationships><Relationship Id="rId1" Type="t" Target="../media/image1.png"/></Relationships>"#,
        );
        let mut package = Package::open(&data).unwrap();
        let mut result = ParseResult::default();
        register_image(&mut result.images, ResolvedImage {
            id: "Logo".to_string(),
            description: "named".to_string(),
            base64_data_uri: "data:image/png;base64,AA==".to_string(),
            mime_type: "image/png".to_string(),
            position: Default::default(),
            relationship_id: "rId7".to_string(),
            source: ImageSource::CellImage,
            media_path: "media/other.png".to_string(),
        });

        let mut coordinator = FloatingImageCoordinator::new();
        coordinator.parse_floating_images(&mut package, &mut result);

        assert_eq!(result.images.len(), 1);
        assert_eq!(result.images.get("Logo").unwrap().source, ImageSource::CellImage);
        // The anchor is still bound to the existing id
        assert!(coordinator.get_sheet_floating_images("Photos").contains_key("C3"));
    }
}
