//! Composition of new PDFs from plain text and raster images.
//!
//! Text pages use the standard Helvetica font, so no font program is
//! embedded; glyph widths are estimated at half the font size.

use crate::pdf::PdfError;
use crate::FilekitError;
use image::codecs::jpeg::JpegEncoder;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use tracing::debug;

const JPEG_QUALITY: u8 = 90;

/// Page geometry for flowed text, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextLayout {
    pub page_width: f32,
    pub page_height: f32,
    pub margin: f32,
    pub font_size: f32,
    pub leading: f32,
}

impl Default for TextLayout {
    /// A4 portrait with Helvetica 11/14.
    fn default() -> Self {
        Self {
            page_width: 595.0,
            page_height: 842.0,
            margin: 50.0,
            font_size: 11.0,
            leading: 14.0,
        }
    }
}

impl TextLayout {
    pub fn chars_per_line(&self) -> usize {
        let printable = self.page_width - 2.0 * self.margin;
        ((printable / (0.5 * self.font_size)).floor() as usize).max(1)
    }

    pub fn lines_per_page(&self) -> usize {
        let printable = self.page_height - 2.0 * self.margin;
        ((printable / self.leading).floor() as usize).max(1)
    }
}

/// Greedy word wrap. Embedded newlines force a break, tabs expand to four
/// spaces and words longer than `width` are split.
pub fn wrap_paragraph(paragraph: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();

    for raw in paragraph.replace('\t', "    ").split('\n') {
        let mut current = String::new();
        let mut current_len = 0;

        for word in raw.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();

            let needed = if current_len == 0 { word.len() } else { current_len + 1 + word.len() };
            if needed <= width {
                if current_len > 0 {
                    current.push(' ');
                    current_len += 1;
                }
                current.extend(word.iter());
                current_len += word.len();
                continue;
            }

            if current_len > 0 {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            while word.len() > width {
                let rest = word.split_off(width);
                lines.push(word.into_iter().collect());
                word = rest;
            }
            current_len = word.len();
            current = word.into_iter().collect();
        }

        lines.push(current);
    }

    lines
}

/// Lay out `paragraphs` on as many pages as needed.
pub fn text_to_pdf(paragraphs: &[String], layout: TextLayout) -> Result<Vec<u8>, PdfError> {
    let lines: Vec<String> = paragraphs
        .iter()
        .flat_map(|p| wrap_paragraph(p, layout.chars_per_line()))
        .collect();

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });

    let mut chunks: Vec<&[String]> = lines.chunks(layout.lines_per_page()).collect();
    if chunks.is_empty() {
        chunks.push(&[]);
    }

    let mut kids = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        let content = text_page_content(chunk, &layout)?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));
        kids.push(doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => media_box(layout.page_width, layout.page_height),
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
            "Contents" => content_id,
        }));
    }

    debug!(lines = lines.len(), pages = kids.len(), "composed text pdf");
    finish(doc, pages_id, kids)
}

fn text_page_content(lines: &[String], layout: &TextLayout) -> Result<Vec<u8>, PdfError> {
    let mut operations = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), Object::Real(layout.font_size)]),
        Operation::new("TL", vec![Object::Real(layout.leading)]),
        Operation::new(
            "Td",
            vec![
                Object::Real(layout.margin),
                Object::Real(layout.page_height - layout.margin - layout.font_size),
            ],
        ),
    ];
    for line in lines {
        operations.push(Operation::new("Tj", vec![Object::string_literal(latin1(line))]));
        operations.push(Operation::new("T*", vec![]));
    }
    operations.push(Operation::new("ET", vec![]));

    Content { operations }.encode().map_err(crate::pdf::malformed)
}

/// One page per image, sized to the image's pixel dimensions.
pub fn images_to_pdf(images: &[Vec<u8>]) -> crate::Result<Vec<u8>> {
    if images.is_empty() {
        return Err(FilekitError::invalid("at least one image is required"));
    }

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids = Vec::with_capacity(images.len());

    for bytes in images {
        let rgb = image::load_from_memory(bytes)?.to_rgb8();
        let (width, height) = rgb.dimensions();

        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY).encode_image(&rgb)?;

        let image_id = doc.add_object(
            Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => width as i64,
                    "Height" => height as i64,
                    "ColorSpace" => "DeviceRGB",
                    "BitsPerComponent" => 8,
                    "Filter" => "DCTDecode",
                },
                jpeg,
            )
            .with_compression(false),
        );

        let (w, h) = (width as f32, height as f32);
        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        Object::Real(w),
                        0.into(),
                        0.into(),
                        Object::Real(h),
                        0.into(),
                        0.into(),
                    ],
                ),
                Operation::new("Do", vec!["Im1".into()]),
                Operation::new("Q", vec![]),
            ],
        }
        .encode()
        .map_err(crate::pdf::malformed)?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));

        kids.push(doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => media_box(w, h),
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im1" => image_id },
            },
            "Contents" => content_id,
        }));
    }

    debug!(pages = kids.len(), "composed image pdf");
    Ok(finish(doc, pages_id, kids)?)
}

/// Encode `text` for a simple font: Latin-1 passes through, anything else
/// becomes `?`.
pub(crate) fn latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

fn media_box(width: f32, height: f32) -> Vec<Object> {
    vec![0.into(), 0.into(), Object::Real(width), Object::Real(height)]
}

fn finish(mut doc: Document, pages_id: ObjectId, kids: Vec<ObjectId>) -> Result<Vec<u8>, PdfError> {
    let count = kids.len() as i64;
    let kids: Vec<Object> = kids.into_iter().map(Object::Reference).collect();
    let pages: Dictionary = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    crate::pdf::save(&mut doc)
}
