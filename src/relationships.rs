//! Relationship parsing - `.rels` documents, sheet part lookup, target paths.
//!
//! Every cross-part reference in a spreadsheet package goes through a
//! relationship: workbook -> worksheet, worksheet -> drawing,
//! drawing -> media, cell-image part -> media. Targets are relative to the
//! folder of the part that declares them.
//!
//! Paths returned from this module are relative to the package's `xl/`
//! folder (e.g. `worksheets/sheet1.xml`, `media/image1.png`).

use quick_xml::events::Event;
use quick_xml::Reader;
use indexmap::IndexMap;

use crate::error::Result;
use crate::namespaces::{is_drawing_relationship, KNOWN_FOLDERS, TARGET_MODE_EXTERNAL, XL_ROOT};
use crate::xml_helpers::{attr_string, attr_string_local};

/// One `<Relationship>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    /// Relationship type URI
    pub rel_type: String,
    /// Raw target as written; relative to the declaring part's folder
    pub target: String,
    /// `TargetMode="External"`; the target is a URL, not a part
    pub external: bool,
}

/// Relationships of one `.rels` document, keyed by id in document order.
///
/// A duplicated id replaces the earlier record in place.
pub type Relationships = IndexMap<String, Relationship>;

/// Parse a `.rels` document, failing on malformed XML.
///
/// # Errors
/// Returns the underlying XML error.
pub fn try_parse_relationships(xml_text: &str) -> Result<Relationships> {
    let mut xml = Reader::from_str(xml_text);
    xml.trim_text(true);

    let mut rels = Relationships::default();

    loop {
        match xml.read_event()? {
            Event::Empty(ref e) | Event::Start(ref e) => {
                if e.local_name().as_ref() != b"Relationship" {
                    continue;
                }
                let Some(id) = attr_string(e, b"Id") else {
                    continue;
                };
                let target = attr_string(e, b"Target").unwrap_or_default();
                let rel_type = attr_string(e, b"Type").unwrap_or_default();
                let external = attr_string(e, b"TargetMode")
                    .is_some_and(|mode| mode.eq_ignore_ascii_case(TARGET_MODE_EXTERNAL));

                rels.insert(
                    id.clone(),
                    Relationship {
                        id,
                        rel_type,
                        target,
                        external,
                    },
                );
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(rels)
}

/// Parse a `.rels` document. Malformed input yields an empty map.
pub fn parse_relationships(xml_text: &str) -> Relationships {
    try_parse_relationships(xml_text).unwrap_or_else(|e| {
        log::warn!("malformed relationships document ignored: {e}");
        Relationships::default()
    })
}

/// A `<sheet>` declaration from the workbook part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetDeclaration {
    pub name: String,
    /// `r:id` pointing into the workbook relationships
    pub relationship_id: String,
}

/// Read the ordered `<sheet>` declarations from the workbook part.
///
/// # Errors
/// Returns an error if the workbook XML is malformed.
pub fn parse_sheet_declarations(workbook_xml: &str) -> Result<Vec<SheetDeclaration>> {
    let mut xml = Reader::from_str(workbook_xml);
    xml.trim_text(true);

    let mut sheets = Vec::new();

    loop {
        match xml.read_event()? {
            Event::Empty(ref e) | Event::Start(ref e) => {
                if e.local_name().as_ref() != b"sheet" {
                    continue;
                }
                let Some(name) = attr_string(e, b"name") else {
                    continue;
                };
                // r:id, or any other prefix bound to the relationships namespace
                let relationship_id = attr_string_local(e, b"id").unwrap_or_default();
                sheets.push(SheetDeclaration {
                    name,
                    relationship_id,
                });
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(sheets)
}

/// A worksheet name with its part path (relative to `xl/`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetPart {
    pub name: String,
    pub path: String,
}

/// Map sheet names to worksheet part paths, in workbook order.
///
/// Sheets whose relationship cannot be resolved are left out.
pub fn map_sheet_names_to_paths(workbook_xml: &str, workbook_rels_xml: &str) -> Vec<SheetPart> {
    let declarations = match parse_sheet_declarations(workbook_xml) {
        Ok(declarations) => declarations,
        Err(e) => {
            log::warn!("malformed workbook part: {e}");
            return Vec::new();
        }
    };
    let rels = parse_relationships(workbook_rels_xml);

    declarations
        .into_iter()
        .filter_map(|decl| {
            let rel = rels.get(&decl.relationship_id)?;
            if rel.external || rel.target.is_empty() {
                return None;
            }
            Some(SheetPart {
                name: decl.name,
                path: sheet_target_path(&rel.target),
            })
        })
        .collect()
}

/// Worksheet part path (relative to `xl/`) for a workbook relationship target.
///
/// A leading `./` means the worksheets folder.
pub fn sheet_target_path(target: &str) -> String {
    match target.trim().strip_prefix("./") {
        Some(rest) => format!("worksheets/{rest}"),
        None => normalize_target_path("", target),
    }
}

/// Resolve a relationship target against the folder of the declaring part.
///
/// `from_folder` is the declaring part's folder below `xl/` (`"drawings"`,
/// `"worksheets"`, or `""` for parts directly in `xl/`).
///
/// - `../x` climbs to the `xl/` root: `x`
/// - `/xl/x` is package-absolute: `x`
/// - targets already under a known folder are kept
/// - anything else is placed in `from_folder`
///
/// Package folders are at most one level below `xl/`, which is what makes
/// this shortcut sufficient.
pub fn normalize_target_path(from_folder: &str, target: &str) -> String {
    let target = target.trim();

    if target.starts_with("../") {
        let mut rest = target;
        while let Some(stripped) = rest.strip_prefix("../") {
            rest = stripped;
        }
        return rest.to_string();
    }

    if target.starts_with('/') {
        let rest = target.trim_start_matches('/');
        return rest
            .strip_prefix(XL_ROOT)
            .and_then(|r| r.strip_prefix('/'))
            .unwrap_or(rest)
            .to_string();
    }

    let target = target.strip_prefix("./").unwrap_or(target);
    let folder = from_folder.trim_matches('/');
    if folder.is_empty() || KNOWN_FOLDERS.iter().any(|known| target.starts_with(known)) {
        target.to_string()
    } else {
        format!("{folder}/{target}")
    }
}

/// First relationship (in document order) that points at a drawing part.
pub fn find_drawing_relationship(rels: &Relationships) -> Option<&Relationship> {
    rels.values().find(|rel| is_drawing_relationship(&rel.rel_type))
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
    use test_case::test_case;

    const SHEET_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/vmlDrawing" Target="../drawings/vmlDrawing1.vml"/>
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/drawing" Target="../drawings/drawing1.xml"/>
<Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.com/a?b=1&amp;c=2" TargetMode="External"/>
</Relationships>"#;

    #[test]
    fn test_parse_relationships() {
        let rels = parse_relationships(SHEET_RELS);
        assert_eq!(rels.len(), 3);

        let drawing = rels.get("rId1").unwrap();
        assert_eq!(drawing.target, "../drawings/drawing1.xml");
        assert!(!drawing.external);

        let link = rels.get("rId3").unwrap();
        assert!(link.external);
        assert_eq!(link.target, "https://example.com/a?b=1&c=2");
    }

    #[test]
    fn test_duplicate_id_last_wins() {
        let xml = r#"<Relationships>
<Relationship Id="rId1" Type="t" Target="media/a.png"/>
<Relationship Id="rId2" Type="t" Target="media/c.png"/>
<Relationship Id="rId1" Type="t" Target="media/b.png"/>
</Relationships>"#;
        let rels = parse_relationships(xml);
        assert_eq!(rels.len(), 2);
        assert_eq!(rels.get("rId1").unwrap().target, "media/b.png");
        assert_eq!(rels.keys().collect::<Vec<_>>(), vec!["rId1", "rId2"]);
    }

    #[test]
    fn test_malformed_relationships_yield_empty_map() {
        let xml = r#"<Relationships><Relationship Id="rId1" Type="t" Target="a"/></Wrong>"#;
        assert!(try_parse_relationships(xml).is_err());
        assert!(parse_relationships(xml).is_empty());
    }

    #[test]
    fn test_find_drawing_relationship_skips_vml() {
        let rels = parse_relationships(SHEET_RELS);
        let drawing = find_drawing_relationship(&rels).unwrap();
        assert_eq!(drawing.id, "rId1");

        let no_drawing = parse_relationships(
            r#"<Relationships><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/comments" Target="../comments1.xml"/></Relationships>"#,
        );
        assert!(find_drawing_relationship(&no_drawing).is_none());
    }

    #[test_case("drawings", "../media/image1.png", "media/image1.png")]
    #[test_case("drawings", "../../media/image1.png", "media/image1.png")]
    #[test_case("drawings", "/xl/media/image1.png", "media/image1.png")]
    #[test_case("drawings", "//media/image1.png", "media/image1.png")]
    #[test_case("drawings", "image1.png", "drawings/image1.png")]
    #[test_case("drawings", "./image1.png", "drawings/image1.png")]
    #[test_case("drawings", "media/image1.png", "media/image1.png")]
    #[test_case("worksheets", "drawings/drawing1.xml", "drawings/drawing1.xml")]
    #[test_case("", "media/image3.jpeg", "media/image3.jpeg")]
    #[test_case("", "worksheets/sheet2.xml", "worksheets/sheet2.xml")]
    fn test_normalize_target_path(folder: &str, target: &str, expected: &str) {
        assert_eq!(normalize_target_path(folder, target), expected);
    }

    #[test]
    fn test_map_sheet_names_to_paths() {
        let workbook = r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheets>
<sheet name="Summary" sheetId="1" r:id="rId1"/>
<sheet name="Data &amp; Notes" sheetId="2" r:id="rId2"/>
<sheet name="Orphan" sheetId="3" r:id="rId9"/>
<sheet name="Absolute" sheetId="4" r:id="rId4"/>
</sheets>
</workbook>"#;
        let rels = r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="./sheet2.xml"/>
<Relationship Id="rId4" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="/xl/worksheets/sheet4.xml"/>
</Relationships>"#;

        let parts = map_sheet_names_to_paths(workbook, rels);
        assert_eq!(
            parts,
            vec![
                SheetPart {
                    name: "Summary".to_string(),
                    path: "worksheets/sheet1.xml".to_string()
                },
                SheetPart {
                    name: "Data & Notes".to_string(),
                    path: "worksheets/sheet2.xml".to_string()
                },
                SheetPart {
                    name: "Absolute".to_string(),
                    path: "worksheets/sheet4.xml".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_sheet_declarations_keep_unresolved() {
        let workbook = r#"<workbook><sheets><sheet name="A" r:id="rId1"/><sheet name="B"/></sheets></workbook>"#;
        let decls = parse_sheet_declarations(workbook).unwrap();
        assert_eq!(decls.len(), 2);
        assert_eq!(decls[0].relationship_id, "rId1");
        assert_eq!(decls[1].relationship_id, "");
    }
}
