//! Shared string table (`xl/sharedStrings.xml`).

use quick_xml::events::Event;
use quick_xml::Reader;

/// Parse the shared string table.
///
/// Rich-text runs (`<r><t>..</t></r>`) are concatenated into one string.
/// Phonetic guides (`<rPh>`) are not part of the displayed text and are
/// dropped. A malformed table keeps the strings read before the error.
pub(crate) fn parse_shared_strings(xml_text: &str) -> Vec<String> {
    let mut xml = Reader::from_str(xml_text);
    xml.trim_text(false);

    let mut strings = Vec::new();
    let mut current_string = String::new();
    let mut in_si = false;
    let mut in_t = false;
    let mut in_phonetic = false;

    loop {
        match xml.read_event() {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"si" => {
                    in_si = true;
                    current_string.clear();
                }
                b"rPh" => in_phonetic = true,
                b"t" if in_si && !in_phonetic => in_t = true,
                _ => {}
            },
            Ok(Event::Empty(ref e)) => {
                // <si/> is an empty string, still occupying an index
                if e.local_name().as_ref() == b"si" {
                    strings.push(String::new());
                }
            }
            Ok(Event::Text(ref e)) if in_t => {
                if let Ok(text) = e.unescape() {
                    current_string.push_str(&text);
                }
            }
            Ok(Event::CData(ref e)) if in_t => {
                current_string.push_str(&String::from_utf8_lossy(e));
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"si" => {
                    strings.push(std::mem::take(&mut current_string));
                    in_si = false;
                }
                b"rPh" => in_phonetic = false,
                b"t" => in_t = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                log::warn!("shared strings truncated after {} entries: {e}", strings.len());
                break;
            }
            _ => {}
        }
    }

    strings
}
