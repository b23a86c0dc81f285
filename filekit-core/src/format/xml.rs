use crate::{FilekitError, Result};
use quick_xml::events::Event;
use quick_xml::{Reader, Writer};
use std::io::Cursor;

const INDENT: usize = 2;

/// Re-indent XML by two spaces per level. Whitespace-only text between
/// elements is dropped; comments, CDATA and declarations are kept.
pub fn format_xml(text: &str) -> Result<String> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', INDENT);
    let mut depth: usize = 0;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| {
                FilekitError::invalid(format!(
                    "invalid XML at byte {}: {e}",
                    reader.buffer_position()
                ))
            })?;
        match &event {
            Event::Eof => break,
            Event::Start(_) => depth += 1,
            Event::End(_) => depth = depth.saturating_sub(1),
            _ => {}
        }
        writer
            .write_event(event)
            .map_err(|e| FilekitError::Xml(e.to_string()))?;
    }

    if depth != 0 {
        return Err(FilekitError::invalid("invalid XML: unclosed element"));
    }

    String::from_utf8(writer.into_inner().into_inner())
        .map_err(|e| FilekitError::Xml(e.to_string()))
}
