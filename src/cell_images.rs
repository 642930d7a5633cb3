//! Named cell images - pictures that live in a cell rather than float over it.
//!
//! WPS and newer Excel builds store these in a package-level part
//! (`xl/cellimages.xml`), one `<pic>` per image, and refer to them from cell
//! formulas such as `=_xlfn.DISPIMG("ID_2F1C...",1)`. The picture's
//! `cNvPr/@name` is the stable id the formula uses.
//!
//! ```xml
//! <etc:cellImages>
//!   <etc:cellImage>
//!     <xdr:pic>
//!       <xdr:nvPicPr><xdr:cNvPr id="2" name="ID_2F1C" descr="logo"/></xdr:nvPicPr>
//!       <xdr:blipFill><a:blip r:embed="rId1"/></xdr:blipFill>
//!       <xdr:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="952500" cy="952500"/></a:xfrm></xdr:spPr>
//!     </xdr:pic>
//!   </etc:cellImage>
//! </etc:cellImages>
//! ```

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::drawings::PicBuilder;
use crate::error::{skip_diagnostic, SkipReason};
use crate::media::extract_image_data;
use crate::namespaces::{CELL_IMAGES_PART, XL_ROOT};
use crate::package::{rels_path_for, Package};
use crate::relationships::{normalize_target_path, parse_relationships, Relationships};
use crate::types::{register_image, ImageSource, NamedCellImage, ParseResult, ResolvedImage};

const DISPIMG_CALL: &str = "DISPIMG(";

/// Parse the cell-image part into its declared images, in document order.
///
/// Declarations without a name or without an `r:embed` are skipped.
pub fn parse_cell_images_xml(xml_text: &str) -> Vec<NamedCellImage> {
    let mut xml = Reader::from_str(xml_text);
    xml.trim_text(true);

    let mut images = Vec::new();
    let mut pic: Option<PicBuilder> = None;
    let mut in_xfrm = false;

    loop {
        match xml.read_event() {
            Ok(ref event @ (Event::Start(_) | Event::Empty(_))) => {
                let (Event::Start(ref e) | Event::Empty(ref e)) = event else {
                    continue;
                };
                let is_start = matches!(event, Event::Start(_));
                let local_name = e.local_name();

                match local_name.as_ref() {
                    b"pic" if is_start => pic = Some(PicBuilder::default()),
                    b"xfrm" if is_start && pic.is_some() => in_xfrm = true,
                    name => {
                        if let Some(ref mut p) = pic {
                            p.apply(name, e, in_xfrm);
                        }
                    }
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"xfrm" => in_xfrm = false,
                b"pic" => {
                    in_xfrm = false;
                    if let Some(image) = pic.take().and_then(build_named_image) {
                        images.push(image);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                log::warn!("cell image XML truncated at error: {e}");
                break;
            }
            _ => {}
        }
    }

    images
}

fn build_named_image(pic: PicBuilder) -> Option<NamedCellImage> {
    let id = pic
        .name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())?
        .to_string();
    let relationship_id = pic.embed()?.to_string();
    Some(NamedCellImage {
        id,
        description: pic.description.clone().unwrap_or_default(),
        position: pic.position(None),
        relationship_id,
    })
}

/// Pull the image id out of a `DISPIMG("<id>", ...)` call.
///
/// Matches `_xlfn.DISPIMG` and bare `DISPIMG`, case-insensitively, with
/// either quote style.
pub fn extract_dispimg_id(text: &str) -> Option<String> {
    // ASCII uppercasing keeps byte offsets intact
    let upper = text.to_ascii_uppercase();
    let start = upper.find(DISPIMG_CALL)? + DISPIMG_CALL.len();
    let args = text.get(start..)?.trim_start();

    let quote = args.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let inner = args.get(quote.len_utf8()..)?;
    let end = inner.find(quote)?;
    let id = inner.get(..end)?.trim();

    (!id.is_empty()).then(|| id.to_string())
}

/// Locate the cell-image part.
///
/// Prefers a workbook relationship whose target ends with `cellimages.xml`,
/// falling back to the conventional `xl/cellimages.xml`. Returns `None` when
/// the package has no such part.
pub fn find_cell_images_part(package: &Package<'_>, workbook_rels: &Relationships) -> Option<String> {
    let declared = workbook_rels
        .values()
        .filter(|rel| !rel.external)
        .find(|rel| rel.target.to_ascii_lowercase().ends_with("cellimages.xml"))
        .map(|rel| format!("{XL_ROOT}/{}", normalize_target_path("", &rel.target)));

    declared
        .filter(|path| package.has_part(path))
        .or_else(|| package.has_part(CELL_IMAGES_PART).then(|| CELL_IMAGES_PART.to_string()))
}

/// Resolve every named cell image into `result.images`.
///
/// A package without a cell-image part simply has none. Images that cannot
/// be resolved are reported in `result.errors` and skipped. Returns the
/// number of images newly registered.
pub fn load_named_cell_images(
    package: &mut Package<'_>,
    workbook_rels: &Relationships,
    result: &mut ParseResult,
) -> usize {
    let Some(part_path) = find_cell_images_part(package, workbook_rels) else {
        return 0;
    };
    let Some(xml_text) = package.read_optional_text(&part_path) else {
        return 0;
    };

    let declarations = parse_cell_images_xml(&xml_text);
    if declarations.is_empty() {
        return 0;
    }

    let rels = package
        .read_optional_text(&rels_path_for(&part_path))
        .map(|text| parse_relationships(&text))
        .unwrap_or_default();

    // Folder of the part below xl/ ("" for xl/cellimages.xml)
    let folder = part_path
        .strip_prefix(XL_ROOT)
        .map(|p| p.trim_start_matches('/'))
        .and_then(|p| p.rsplit_once('/'))
        .map_or("", |(dir, _)| dir);

    let mut registered = 0;
    for image in declarations {
        let skip = |reason: SkipReason, target: &str| {
            skip_diagnostic(
                reason,
                "source=cellimages",
                &image.id,
                &image.relationship_id,
                target,
            )
        };

        let Some(rel) = rels.get(&image.relationship_id) else {
            result.errors.push(skip(SkipReason::MissingRelationship, ""));
            continue;
        };
        if rel.external {
            result.errors.push(skip(SkipReason::External, &rel.target));
            continue;
        }

        let media_path = normalize_target_path(folder, &rel.target);
        let Some(extracted) = extract_image_data(package, &media_path) else {
            result.errors.push(skip(SkipReason::ExtractFailed, &media_path));
            continue;
        };

        let inserted = register_image(&mut result.images, ResolvedImage {
            id: image.id.clone(),
            description: image.description.clone(),
            base64_data_uri: extracted.data_uri,
            mime_type: extracted.mime_type.to_string(),
            position: image.position,
            relationship_id: image.relationship_id.clone(),
            source: ImageSource::CellImage,
            media_path,
        });
        if inserted {
            registered += 1;
        } else {
            log::debug!("cell image {} already registered", image.id);
        }
    }

    log::debug!("registered {registered} named cell image(s) from {part_path}");
    registered
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
    use crate::types::ImagePosition;
    use test_case::test_case;

    const WPS_CELL_IMAGES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<etc:cellImages xmlns:xdr="http://schemas.openxmlformats.org/drawingml/2006/spreadsheetDrawing" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:etc="http://www.wps.cn/officeDocument/2017/etCustomData">
<etc:cellImage>
<xdr:pic>
<xdr:nvPicPr><xdr:cNvPr id="2" name="ID_2F1C8A" descr="company logo"/><xdr:cNvPicPr><a:picLocks noChangeAspect="1"/></xdr:cNvPicPr></xdr:nvPicPr>
<xdr:blipFill><a:blip r:embed="rId1"/><a:stretch><a:fillRect/></a:stretch></xdr:blipFill>
<xdr:spPr><a:xfrm><a:off x="12" y="34"/><a:ext cx="952500" cy="476250"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></xdr:spPr>
</xdr:pic>
</etc:cellImage>
<etc:cellImage>
<xdr:pic>
<xdr:nvPicPr><xdr:cNvPr id="3" name="ID_NOEMBED"/></xdr:nvPicPr>
<xdr:blipFill><a:blip/></xdr:blipFill>
</xdr:pic>
</etc:cellImage>
<etc:cellImage>
<xdr:pic>
<xdr:nvPicPr><xdr:cNvPr id="4" name=""/></xdr:nvPicPr>
<xdr:blipFill><a:blip r:embed="rId3"/></xdr:blipFill>
</xdr:pic>
</etc:cellImage>
<etc:cellImage>
<xdr:pic>
<xdr:nvPicPr><xdr:cNvPr id="5" name="ID_SECOND"/></xdr:nvPicPr>
<xdr:blipFill><a:blip r:embed="rId2"/></xdr:blipFill>
</xdr:pic>
</etc:cellImage>
</etc:cellImages>"#;

    #[test]
    fn test_parse_wps_cell_images() {
        let images = parse_cell_images_xml(WPS_CELL_IMAGES);
        assert_eq!(images.len(), 2);

        assert_eq!(
            images[0],
            NamedCellImage {
                id: "ID_2F1C8A".to_string(),
                description: "company logo".to_string(),
                relationship_id: "rId1".to_string(),
                position: ImagePosition {
                    x: 12,
                    y: 34,
                    width: 952_500,
                    height: 476_250
                },
            }
        );
        assert_eq!(images[1].id, "ID_SECOND");
        assert_eq!(images[1].description, "");
        assert_eq!(images[1].position, ImagePosition::default());
    }

    #[test]
    fn test_parse_bare_cell_images_layout() {
        let xml = r#"<cx:cellImages xmlns:cx="http://schemas.microsoft.com/office/spreadsheetml/2019/cellimages" xmlns:xdr="x" xmlns:a="a" xmlns:r="r">
<xdr:pic><xdr:nvPicPr><xdr:cNvPr id="1" name="Picture 1"/></xdr:nvPicPr><xdr:blipFill><a:blip r:embed="rId1"/></xdr:blipFill></xdr:pic>
</cx:cellImages>"#;
        let images = parse_cell_images_xml(xml);
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].id, "Picture 1");
    }

    #[test]
    fn test_parse_garbage_yields_nothing() {
        assert!(parse_cell_images_xml("not xml at all").is_empty());
        assert!(parse_cell_images_xml("").is_empty());
    }

    #[test_case(r#"=_xlfn.DISPIMG("ID_2F1C8A",1)"#, Some("ID_2F1C8A"))]
    #[test_case(r#"_xlfn.DISPIMG("img1","...")"#, Some("img1"))]
    #[test_case(r#"DISPIMG( 'ID_X', 1)"#, Some("ID_X"))]
    #[test_case(r#"=dispimg("lower",1)"#, Some("lower"))]
    #[test_case(r#"=IF(A1,_xlfn.DISPIMG("nested",1),"")"#, Some("nested"))]
    #[test_case(r#"=DISPIMG(A1,1)"#, None)]
    #[test_case(r#"=DISPIMG("",1)"#, None)]
    #[test_case(r#"=DISPIMG("unterminated"#, None)]
    #[test_case("=SUM(A1:A3)", None)]
    fn test_extract_dispimg_id(text: &str, expected: Option<&str>) {
        assert_eq!(extract_dispimg_id(text).as_deref(), expected);
    }
}
