//! Drawing part parsing - floating pictures anchored to worksheet cells.
//!
//! Drawings are stored in `xl/drawings/drawing*.xml`, referenced from a
//! worksheet via `xl/worksheets/_rels/sheet*.xml.rels`. Each anchor element
//! positions one object:
//! - `twoCellAnchor`: anchored to two cells (resizes with cells)
//! - `oneCellAnchor`: anchored to one cell with absolute size
//!
//! Only pictures (`pic`) are of interest. A picture references its bytes via
//! `<a:blip r:embed="rIdN">`, resolved through the drawing's own `.rels`.
//!
//! Some producers wrap anchors (or the picture inside an anchor) in
//! `mc:AlternateContent`. The `Choice` branch is preferred; the `Fallback`
//! branch is used when the choice carries no picture.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::cell_ref::{cell_ref, MAX_COL, MAX_ROW};
use crate::types::{FloatingImage, ImagePosition};
use crate::xml_helpers::{attr_i64, attr_string, attr_string_local};

/// Picture properties collected from `<pic>` and its children.
///
/// Shared with the cell-image part, which declares pictures the same way.
#[derive(Debug, Default, Clone)]
pub(crate) struct PicBuilder {
    pub name: Option<String>,
    /// `cNvPr/@id`
    pub numeric_id: Option<String>,
    pub description: Option<String>,
    pub embed: Option<String>,
    pub offset: Option<(i64, i64)>,
    pub extent: Option<(i64, i64)>,
}

impl PicBuilder {
    /// Apply one start/empty element found inside `<pic>`.
    pub fn apply(&mut self, local_name: &[u8], e: &BytesStart, in_xfrm: bool) {
        match local_name {
            b"cNvPr" => {
                self.name = attr_string(e, b"name");
                self.numeric_id = attr_string(e, b"id");
                self.description = attr_string(e, b"descr");
            }
            b"blip" => {
                if let Some(embed) = attr_string_local(e, b"embed") {
                    self.embed = Some(embed);
                }
            }
            b"off" if in_xfrm => {
                self.offset = Some((
                    attr_i64(e, b"x").unwrap_or(0),
                    attr_i64(e, b"y").unwrap_or(0),
                ));
            }
            b"ext" if in_xfrm => {
                if let (Some(cx), Some(cy)) = (attr_i64(e, b"cx"), attr_i64(e, b"cy")) {
                    self.extent = Some((cx, cy));
                }
            }
            _ => {}
        }
    }

    /// Relationship id of the picture's bytes, if non-empty.
    pub fn embed(&self) -> Option<&str> {
        self.embed.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn has_image(&self) -> bool {
        self.embed().is_some()
    }

    /// Offset/extent from the shape transform, with `fallback_extent` used
    /// when the transform has no extent.
    pub fn position(&self, fallback_extent: Option<(i64, i64)>) -> ImagePosition {
        let (x, y) = self.offset.unwrap_or((0, 0));
        let (width, height) = self.extent.or(fallback_extent).unwrap_or((0, 0));
        ImagePosition {
            x,
            y,
            width,
            height,
        }
    }
}

/// Pick the image id for a floating picture.
///
/// Priority: picture name, numeric shape id, relationship id, and finally a
/// synthesized `floating_<cellRef>`.
pub fn derive_image_id(
    name: Option<&str>,
    numeric_id: Option<&str>,
    relationship_id: Option<&str>,
    anchor_cell: &str,
) -> String {
    [name, numeric_id, relationship_id]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map_or_else(|| format!("floating_{anchor_cell}"), ToString::to_string)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Branch {
    Choice,
    Fallback,
}

#[derive(Debug, Clone, Copy)]
enum AnchorField {
    Col,
    Row,
}

/// Builder for one anchor element.
#[derive(Debug, Default)]
struct AnchorBuilder {
    from_col: Option<u32>,
    from_row: Option<u32>,
    /// Anchor-level `<xdr:ext>` (oneCellAnchor)
    extent: Option<(i64, i64)>,
    /// Picture outside any alternate-content block
    pic: Option<PicBuilder>,
    choice_pic: Option<PicBuilder>,
    fallback_pic: Option<PicBuilder>,
}

impl AnchorBuilder {
    fn slot(&mut self, branch: Option<Branch>) -> &mut Option<PicBuilder> {
        match branch {
            Some(Branch::Choice) => &mut self.choice_pic,
            Some(Branch::Fallback) => &mut self.fallback_pic,
            None => &mut self.pic,
        }
    }

    fn build(self) -> Option<FloatingImage> {
        let col = self.from_col?;
        let row = self.from_row?;
        if col > MAX_COL || row > MAX_ROW {
            log::debug!("anchor at col {col}, row {row} is off the sheet; dropped");
            return None;
        }

        let pic = [self.pic, self.choice_pic, self.fallback_pic]
            .into_iter()
            .flatten()
            .find(PicBuilder::has_image)?;
        let relationship_id = pic.embed()?.to_string();

        let anchor_cell = cell_ref(col, row);
        let id = derive_image_id(
            pic.name.as_deref(),
            pic.numeric_id.as_deref(),
            Some(&relationship_id),
            &anchor_cell,
        );

        Some(FloatingImage {
            id,
            description: pic.description.clone().unwrap_or_default(),
            position: pic.position(self.extent),
            relationship_id,
            anchor_cell,
            anchor_row: row,
            anchor_col: col,
        })
    }
}

/// An open `mc:AlternateContent` element.
#[derive(Debug)]
struct AltFrame {
    /// Opened inside an anchor: branches hold pictures, not anchors
    inside_anchor: bool,
    branch: Option<Branch>,
    choice: Vec<FloatingImage>,
    fallback: Vec<FloatingImage>,
}

/// Hand a finished image to the innermost anchor-level alternate branch, or
/// to the output when it is not inside one.
fn deliver(frames: &mut [AltFrame], out: &mut Vec<FloatingImage>, image: FloatingImage) {
    match frames.last_mut() {
        Some(frame) if !frame.inside_anchor => match frame.branch {
            Some(Branch::Choice) => frame.choice.push(image),
            Some(Branch::Fallback) => frame.fallback.push(image),
            None => out.push(image),
        },
        _ => out.push(image),
    }
}

/// Parse a drawing part into its floating pictures, in document order.
///
/// Anchors without a picture, without an `r:embed`, or without a start
/// cell are dropped. Malformed XML ends the scan; anchors completed before
/// the error are kept.
#[allow(clippy::too_many_lines)]
pub fn parse_drawing_xml(xml_text: &str) -> Vec<FloatingImage> {
    let mut xml = Reader::from_str(xml_text);
    xml.trim_text(true);

    let mut images = Vec::new();

    let mut anchor: Option<AnchorBuilder> = None;
    let mut pic: Option<PicBuilder> = None;
    let mut frames: Vec<AltFrame> = Vec::new();
    let mut in_from = false;
    let mut in_xfrm = false;
    let mut field: Option<AnchorField> = None;

    loop {
        match xml.read_event() {
            Ok(ref event @ (Event::Start(_) | Event::Empty(_))) => {
                let (Event::Start(ref e) | Event::Empty(ref e)) = event else {
                    continue;
                };
                let is_start = matches!(event, Event::Start(_));
                let local_name = e.local_name();
                let name = local_name.as_ref();

                match name {
                    b"AlternateContent" if is_start => frames.push(AltFrame {
                        inside_anchor: anchor.is_some(),
                        branch: None,
                        choice: Vec::new(),
                        fallback: Vec::new(),
                    }),
                    b"Choice" if is_start => {
                        if let Some(frame) = frames.last_mut() {
                            frame.branch = Some(Branch::Choice);
                        }
                    }
                    b"Fallback" if is_start => {
                        if let Some(frame) = frames.last_mut() {
                            frame.branch = Some(Branch::Fallback);
                        }
                    }
                    b"twoCellAnchor" | b"oneCellAnchor" if is_start => {
                        anchor = Some(AnchorBuilder::default());
                    }
                    b"from" if is_start && anchor.is_some() && pic.is_none() => in_from = true,
                    b"col" if in_from && is_start => field = Some(AnchorField::Col),
                    b"row" if in_from && is_start => field = Some(AnchorField::Row),
                    b"pic" if is_start && anchor.is_some() => pic = Some(PicBuilder::default()),
                    b"xfrm" if is_start && pic.is_some() => in_xfrm = true,
                    b"ext" if pic.is_none() => {
                        // Anchor-level extent of a oneCellAnchor
                        if let Some(ref mut a) = anchor {
                            if let (Some(cx), Some(cy)) = (attr_i64(e, b"cx"), attr_i64(e, b"cy"))
                            {
                                a.extent = Some((cx, cy));
                            }
                        }
                    }
                    _ => {
                        if let Some(ref mut p) = pic {
                            p.apply(name, e, in_xfrm);
                        }
                    }
                }
            }
            Ok(Event::Text(ref t)) => {
                if let (Some(f), Some(a)) = (field, anchor.as_mut()) {
                    let value = t.unescape().ok().and_then(|s| s.trim().parse::<u32>().ok());
                    match f {
                        AnchorField::Col => a.from_col = value,
                        AnchorField::Row => a.from_row = value,
                    }
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"col" | b"row" => field = None,
                b"from" => in_from = false,
                b"xfrm" => in_xfrm = false,
                b"pic" => {
                    if let (Some(p), Some(a)) = (pic.take(), anchor.as_mut()) {
                        // Innermost picture-level branch, if any
                        let branch = frames
                            .last()
                            .filter(|frame| frame.inside_anchor)
                            .and_then(|frame| frame.branch);
                        let slot = a.slot(branch);
                        // A group may hold several pictures; keep the first usable one
                        if slot.as_ref().map_or(true, |s| !s.has_image()) {
                            *slot = Some(p);
                        }
                    }
                    in_xfrm = false;
                }
                b"Choice" | b"Fallback" => {
                    if let Some(frame) = frames.last_mut() {
                        frame.branch = None;
                    }
                }
                b"twoCellAnchor" | b"oneCellAnchor" => {
                    if let Some(image) = anchor.take().and_then(AnchorBuilder::build) {
                        deliver(&mut frames, &mut images, image);
                    }
                    pic = None;
                    in_from = false;
                    field = None;
                }
                b"AlternateContent" => {
                    if let Some(frame) = frames.pop() {
                        if !frame.inside_anchor {
                            let chosen = if frame.choice.is_empty() {
                                frame.fallback
                            } else {
                                frame.choice
                            };
                            for image in chosen {
                                deliver(&mut frames, &mut images, image);
                            }
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                log::warn!("drawing XML truncated at error: {e}");
                break;
            }
            _ => {}
        }
    }

    images
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

    const NS: &str = r#"xmlns:xdr="http://schemas.openxmlformats.org/drawingml/2006/spreadsheetDrawing" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:mc="http://schemas.openxmlformats.org/markup-compatibility/2006""#;

    fn pic_xml(id: u32, name: &str, descr: &str, embed: &str) -> String {
        format!(
            r#"<xdr:pic>
<xdr:nvPicPr><xdr:cNvPr id="{id}" name="{name}" descr="{descr}"/><xdr:cNvPicPr/></xdr:nvPicPr>
<xdr:blipFill><a:blip r:embed="{embed}"><a:extLst><a:ext uri="{{28A0092B-C50C-407E-A947-70E740481C1C}}"/></a:extLst></a:blip><a:stretch><a:fillRect/></a:stretch></xdr:blipFill>
<xdr:spPr><a:xfrm><a:off x="609600" y="190500"/><a:ext cx="1905000" cy="952500"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></xdr:spPr>
</xdr:pic>"#
        )
    }

    fn two_cell(col: u32, row: u32, body: &str) -> String {
        format!(
            r#"<xdr:twoCellAnchor editAs="oneCell">
<xdr:from><xdr:col>{col}</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>{row}</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:from>
<xdr:to><xdr:col>{}</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>{}</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:to>
{body}<xdr:clientData/></xdr:twoCellAnchor>"#,
            col + 3,
            row + 5
        )
    }

    fn drawing(anchors: &str) -> String {
        format!(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><xdr:wsDr {NS}>{anchors}</xdr:wsDr>"#)
    }

    #[test]
    fn test_two_cell_anchor_picture() {
        let xml = drawing(&two_cell(0, 5, &pic_xml(2, "Picture 1", "A red square", "rId1")));
        let images = parse_drawing_xml(&xml);

        assert_eq!(images.len(), 1);
        let image = &images[0];
        assert_eq!(image.id, "Picture 1");
        assert_eq!(image.description, "A red square");
        assert_eq!(image.relationship_id, "rId1");
        assert_eq!(image.anchor_cell, "A6");
        assert_eq!((image.anchor_col, image.anchor_row), (0, 5));
        assert_eq!(
            image.position,
            ImagePosition {
                x: 609_600,
                y: 190_500,
                width: 1_905_000,
                height: 952_500
            }
        );
    }

    #[test]
    fn test_one_cell_anchor_uses_anchor_extent_without_xfrm() {
        let xml = drawing(
            r#"<xdr:oneCellAnchor>
<xdr:from><xdr:col>2</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>9</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:from>
<xdr:ext cx="400000" cy="300000"/>
<xdr:pic><xdr:nvPicPr><xdr:cNvPr id="7" name=""/><xdr:cNvPicPr/></xdr:nvPicPr>
<xdr:blipFill><a:blip r:embed="rId4"/></xdr:blipFill><xdr:spPr/></xdr:pic>
<xdr:clientData/></xdr:oneCellAnchor>"#,
        );
        let images = parse_drawing_xml(&xml);

        assert_eq!(images.len(), 1);
        // Empty name falls through to the numeric id
        assert_eq!(images[0].id, "7");
        assert_eq!(images[0].anchor_cell, "C10");
        assert_eq!(images[0].position.width, 400_000);
        assert_eq!(images[0].position.height, 300_000);
        assert_eq!(images[0].position.x, 0);
    }

    #[test]
    fn test_anchors_without_picture_or_embed_are_dropped() {
        let shape = r#"<xdr:sp><xdr:nvSpPr><xdr:cNvPr id="3" name="Rectangle 2"/><xdr:cNvSpPr/></xdr:nvSpPr><xdr:spPr/></xdr:sp>"#;
        let no_embed = r#"<xdr:pic><xdr:nvPicPr><xdr:cNvPr id="4" name="Broken"/></xdr:nvPicPr><xdr:blipFill><a:blip/></xdr:blipFill></xdr:pic>"#;
        let no_row = r#"<xdr:oneCellAnchor><xdr:from><xdr:col>1</xdr:col><xdr:row>x</xdr:row></xdr:from><xdr:pic><xdr:nvPicPr><xdr:cNvPr id="5" name="NoRow"/></xdr:nvPicPr><xdr:blipFill><a:blip r:embed="rId9"/></xdr:blipFill></xdr:pic></xdr:oneCellAnchor>"#;
        let xml = drawing(&format!(
            "{}{}{}{}",
            two_cell(0, 0, shape),
            two_cell(1, 1, no_embed),
            no_row,
            two_cell(4, 4, &pic_xml(6, "Kept", "", "rId2"))
        ));

        let images = parse_drawing_xml(&xml);
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].id, "Kept");
        assert_eq!(images[0].anchor_cell, "E5");
    }

    #[test]
    fn test_anchor_past_sheet_limits_is_dropped() {
        let xml = drawing(&format!(
            "{}{}{}",
            two_cell(1, 1, &pic_xml(1, "Kept", "", "rId1")),
            two_cell(0, 4_294_967_290, &pic_xml(2, "FarDown", "", "rId2")),
            two_cell(16_384, 0, &pic_xml(3, "FarRight", "", "rId3")),
        ));
        let images = parse_drawing_xml(&xml);
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].id, "Kept");

        let edge = drawing(&two_cell(MAX_COL, MAX_ROW, &pic_xml(4, "Edge", "", "rId4")));
        let images = parse_drawing_xml(&edge);
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].anchor_cell, "XFD1048576");
    }

    #[test]
    fn test_alternate_content_prefers_choice() {
        let xml = drawing(&format!(
            r#"<mc:AlternateContent><mc:Choice Requires="a14">{}</mc:Choice><mc:Fallback>{}</mc:Fallback></mc:AlternateContent>"#,
            two_cell(1, 1, &pic_xml(2, "Choice Pic", "", "rId1")),
            two_cell(1, 1, &pic_xml(3, "Fallback Pic", "", "rId2")),
        ));
        let images = parse_drawing_xml(&xml);
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].id, "Choice Pic");
    }

    #[test]
    fn test_alternate_content_falls_back_when_choice_has_no_picture() {
        let shape = r#"<xdr:sp><xdr:nvSpPr><xdr:cNvPr id="3" name="Ink"/></xdr:nvSpPr></xdr:sp>"#;
        let xml = drawing(&format!(
            r#"<mc:AlternateContent><mc:Choice Requires="a14">{}</mc:Choice><mc:Fallback>{}</mc:Fallback></mc:AlternateContent>"#,
            two_cell(1, 1, shape),
            two_cell(1, 1, &pic_xml(3, "Fallback Pic", "", "rId2")),
        ));
        let images = parse_drawing_xml(&xml);
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].id, "Fallback Pic");
        assert_eq!(images[0].relationship_id, "rId2");
    }

    #[test]
    fn test_alternate_content_inside_anchor() {
        let body = format!(
            r#"<mc:AlternateContent><mc:Choice Requires="a14"><xdr:sp><xdr:nvSpPr><xdr:cNvPr id="9" name="Ink"/></xdr:nvSpPr></xdr:sp></mc:Choice><mc:Fallback>{}</mc:Fallback></mc:AlternateContent>"#,
            pic_xml(10, "Inner Fallback", "alt", "rId3")
        );
        let images = parse_drawing_xml(&drawing(&two_cell(3, 7, &body)));
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].id, "Inner Fallback");
        assert_eq!(images[0].anchor_cell, "D8");
    }

    #[test]
    fn test_multiple_anchors_keep_document_order() {
        let xml = drawing(&format!(
            "{}{}",
            two_cell(2, 0, &pic_xml(2, "First", "", "rId1")),
            two_cell(0, 3, &pic_xml(3, "Second", "", "rId1")),
        ));
        let ids: Vec<_> = parse_drawing_xml(&xml).into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["First", "Second"]);
    }

    #[test]
    fn test_malformed_xml_keeps_completed_anchors() {
        let xml = format!(
            "{}<xdr:twoCellAnchor><xdr:from></xdr:wrong>",
            drawing(&two_cell(0, 0, &pic_xml(2, "Done", "", "rId1"))).replace("</xdr:wsDr>", "")
        );
        let images = parse_drawing_xml(&xml);
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].id, "Done");
    }

    #[test]
    fn test_derive_image_id_priority() {
        assert_eq!(derive_image_id(Some("Pic"), Some("3"), Some("rId1"), "A1"), "Pic");
        assert_eq!(derive_image_id(Some("  "), Some("3"), Some("rId1"), "A1"), "3");
        assert_eq!(derive_image_id(None, None, Some("rId1"), "A1"), "rId1");
        assert_eq!(derive_image_id(None, Some(""), None, "B7"), "floating_B7");
    }
}
