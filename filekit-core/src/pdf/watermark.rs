use super::document::{flattened_page, save};
use super::{malformed, PdfError, PdfFile};
use crate::compose::latin1;
use crate::FilekitError;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::str::FromStr;

const FONT_NAME: &str = "FkWatermark";
const STATE_NAME: &str = "FkWatermarkGs";

/// Average Helvetica glyph width as a fraction of the font size.
const GLYPH_WIDTH: f32 = 0.5;

/// Cell of the 3x3 placement grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatermarkPosition {
    TopLeft,
    TopCenter,
    TopRight,
    MiddleLeft,
    Center,
    MiddleRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl FromStr for WatermarkPosition {
    type Err = FilekitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let position = match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "top-left" => WatermarkPosition::TopLeft,
            "top-center" => WatermarkPosition::TopCenter,
            "top-right" => WatermarkPosition::TopRight,
            "middle-left" => WatermarkPosition::MiddleLeft,
            "center" | "middle-center" => WatermarkPosition::Center,
            "middle-right" => WatermarkPosition::MiddleRight,
            "bottom-left" => WatermarkPosition::BottomLeft,
            "bottom-center" => WatermarkPosition::BottomCenter,
            "bottom-right" => WatermarkPosition::BottomRight,
            other => {
                return Err(FilekitError::invalid(format!(
                    "invalid watermark position '{other}'"
                )))
            }
        };
        Ok(position)
    }
}

/// Lower-left corner of an `item` box placed at `position` on a `page`,
/// in PDF user space (origin bottom-left).
pub fn placement(
    position: WatermarkPosition,
    page: (f32, f32),
    item: (f32, f32),
    margin: f32,
) -> (f32, f32) {
    use WatermarkPosition::*;

    let (page_w, page_h) = page;
    let (item_w, item_h) = item;

    let x = match position {
        TopLeft | MiddleLeft | BottomLeft => margin,
        TopCenter | Center | BottomCenter => (page_w - item_w) / 2.0,
        TopRight | MiddleRight | BottomRight => page_w - item_w - margin,
    };
    let y = match position {
        TopLeft | TopCenter | TopRight => page_h - item_h - margin,
        MiddleLeft | Center | MiddleRight => (page_h - item_h) / 2.0,
        BottomLeft | BottomCenter | BottomRight => margin,
    };
    (x, y)
}

#[derive(Debug, Clone)]
pub struct WatermarkOptions {
    pub text: String,
    pub position: WatermarkPosition,
    pub font_size: f32,
    pub opacity: f32,
    pub margin: f32,
}

impl WatermarkOptions {
    pub fn new(text: impl Into<String>, position: WatermarkPosition) -> Self {
        Self {
            text: text.into(),
            position,
            font_size: 48.0,
            opacity: 0.3,
            margin: 36.0,
        }
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.text.trim().is_empty() {
            return Err(FilekitError::invalid("text is required"));
        }
        if !(self.font_size > 0.0 && self.font_size <= 400.0) {
            return Err(FilekitError::invalid("fontSize must be between 0 and 400"));
        }
        if !(self.opacity > 0.0 && self.opacity <= 1.0) {
            return Err(FilekitError::invalid("opacity must be in (0, 1]"));
        }
        Ok(())
    }

    fn text_box(&self) -> (f32, f32) {
        let chars = self.text.chars().count() as f32;
        (GLYPH_WIDTH * self.font_size * chars, self.font_size)
    }
}

impl PdfFile {
    /// Stamp `options.text` on every page.
    pub fn watermark(&self, options: &WatermarkOptions) -> Result<Vec<u8>, PdfError> {
        let mut doc = self.document().clone();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let state_id = doc.add_object(dictionary! {
            "Type" => "ExtGState",
            "ca" => Object::Real(options.opacity),
            "CA" => Object::Real(options.opacity),
        });
        let save_id = doc.add_object(Stream::new(dictionary! {}, b"q\n".to_vec()));

        for &page_id in self.page_ids() {
            let mut page = flattened_page(&doc, page_id)?;
            let (llx, lly, urx, ury) = media_box(&page);
            let (x, y) = placement(
                options.position,
                (urx - llx, ury - lly),
                options.text_box(),
                options.margin,
            );

            let stamp = stamp_content(options, llx + x, lly + y)?;
            let stamp_id = doc.add_object(Stream::new(dictionary! {}, stamp));

            let mut resources = resolve_dictionary(&doc, page.get(b"Resources").ok());
            add_resource(&doc, &mut resources, b"Font", FONT_NAME, font_id);
            add_resource(&doc, &mut resources, b"ExtGState", STATE_NAME, state_id);
            page.set("Resources", resources);

            let mut contents = vec![Object::Reference(save_id)];
            match page.get(b"Contents") {
                Ok(Object::Array(existing)) => contents.extend(existing.iter().cloned()),
                Ok(existing) => contents.push(existing.clone()),
                Err(_) => {}
            }
            contents.push(Object::Reference(stamp_id));
            page.set("Contents", contents);

            doc.objects.insert(page_id, Object::Dictionary(page));
        }

        save(&mut doc)
    }
}

fn stamp_content(options: &WatermarkOptions, x: f32, y: f32) -> Result<Vec<u8>, PdfError> {
    let content = Content {
        operations: vec![
            Operation::new("Q", vec![]),
            Operation::new("q", vec![]),
            Operation::new("gs", vec![Object::Name(STATE_NAME.as_bytes().to_vec())]),
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![
                    Object::Name(FONT_NAME.as_bytes().to_vec()),
                    Object::Real(options.font_size),
                ],
            ),
            Operation::new(
                "rg",
                vec![Object::Real(0.5), Object::Real(0.5), Object::Real(0.5)],
            ),
            Operation::new("Td", vec![Object::Real(x), Object::Real(y)]),
            Operation::new("Tj", vec![Object::string_literal(latin1(&options.text))]),
            Operation::new("ET", vec![]),
            Operation::new("Q", vec![]),
        ],
    };
    content.encode().map_err(malformed)
}

fn media_box(page: &Dictionary) -> (f32, f32, f32, f32) {
    let values: Vec<f32> = page
        .get(b"MediaBox")
        .and_then(Object::as_array)
        .map(|items| items.iter().filter_map(number).collect())
        .unwrap_or_default();

    match values.as_slice() {
        [llx, lly, urx, ury] => (*llx, *lly, *urx, *ury),
        _ => (0.0, 0.0, 612.0, 792.0),
    }
}

fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Owned copy of a dictionary that may be stored inline or by reference.
fn resolve_dictionary(doc: &Document, object: Option<&Object>) -> Dictionary {
    match object {
        Some(Object::Dictionary(dict)) => dict.clone(),
        Some(Object::Reference(id)) => doc.get_dictionary(*id).cloned().unwrap_or_default(),
        _ => Dictionary::new(),
    }
}

fn add_resource(doc: &Document, resources: &mut Dictionary, category: &[u8], name: &str, id: ObjectId) {
    let mut entries = resolve_dictionary(doc, resources.get(category).ok());
    entries.set(name, id);
    resources.set(category.to_vec(), entries);
}
