//! Plain-text extraction from Office Open XML word-processing documents.

use crate::{FilekitError, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};
use zip::result::ZipError;
use zip::ZipArchive;

const MAIN_PART: &str = "word/document.xml";

/// Paragraph texts of the main document part, in document order.
///
/// Run text is concatenated; `w:tab` becomes a tab and `w:br`/`w:cr` a line
/// break. Formatting, tables and headers are not interpreted.
pub fn extract_paragraphs(bytes: &[u8]) -> Result<Vec<String>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|_| FilekitError::invalid("file is not a valid .docx document"))?;

    let mut xml = String::new();
    match archive.by_name(MAIN_PART) {
        Ok(mut part) => {
            part.read_to_string(&mut xml)?;
        }
        Err(ZipError::FileNotFound) => {
            return Err(FilekitError::invalid(
                "file is not a valid .docx document (missing word/document.xml)",
            ))
        }
        Err(err) => return Err(err.into()),
    }

    parse_document_xml(&xml)
}

fn parse_document_xml(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut current: Option<String> = None;
    let mut in_run = false;
    let mut in_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.name().as_ref() {
                b"w:p" => current = Some(String::new()),
                b"w:r" => in_run = true,
                b"w:t" => in_text = true,
                _ => {}
            },
            Event::End(e) => match e.name().as_ref() {
                b"w:p" => paragraphs.extend(current.take()),
                b"w:r" => in_run = false,
                b"w:t" => in_text = false,
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:p" => paragraphs.push(String::new()),
                b"w:tab" if in_run => push_char(&mut current, '\t'),
                b"w:br" | b"w:cr" if in_run => push_char(&mut current, '\n'),
                _ => {}
            },
            Event::Text(t) if in_text => {
                let text = t
                    .unescape()
                    .map_err(|e| FilekitError::Document(e.to_string()))?;
                if let Some(paragraph) = current.as_mut() {
                    paragraph.push_str(&text);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs)
}

fn push_char(current: &mut Option<String>, c: char) {
    if let Some(paragraph) = current.as_mut() {
        paragraph.push(c);
    }
}
