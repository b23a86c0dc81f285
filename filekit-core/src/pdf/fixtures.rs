//! In-memory PDFs for unit tests.

use super::PdfFile;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

/// `pages` A4 pages, each showing `Page <n>`.
pub fn numbered_pdf(pages: usize) -> Vec<u8> {
    numbered_pdf_with(pages, |_| 0)
}

/// Like [`numbered_pdf`], with an explicit `/Rotate` per page.
pub fn numbered_pdf_with(pages: usize, rotation: impl Fn(usize) -> i64) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let resources_id = helvetica_resources(&mut doc);

    let mut kids: Vec<Object> = Vec::new();
    for i in 0..pages {
        let mut page = labelled_page(&mut doc, pages_id, i + 1);
        let degrees = rotation(i);
        if degrees != 0 {
            page.set("Rotate", degrees);
        }
        kids.push(doc.add_object(page).into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    finish(doc, pages_id)
}

/// Two pages below an intermediate node that carries `/Rotate 90` and the resources.
pub fn nested_pdf() -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let root_id = doc.new_object_id();
    let middle_id = doc.new_object_id();
    let resources_id = helvetica_resources(&mut doc);

    let first = labelled_page(&mut doc, middle_id, 1);
    let second = labelled_page(&mut doc, middle_id, 2);
    let kids: Vec<Object> = vec![doc.add_object(first).into(), doc.add_object(second).into()];

    doc.objects.insert(
        middle_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Parent" => root_id,
            "Kids" => kids,
            "Count" => 2,
            "Rotate" => 90,
            "Resources" => resources_id,
        }),
    );
    doc.objects.insert(
        root_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(middle_id)],
            "Count" => 2,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    finish(doc, root_id)
}

/// A one-page document whose trailer points at a standard security handler
/// dictionary with a non-empty user password.
pub fn encrypted_pdf() -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let resources_id = helvetica_resources(&mut doc);
    let page = labelled_page(&mut doc, pages_id, 1);
    let page_id = doc.add_object(page);
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );

    let encrypt_id = doc.add_object(dictionary! {
        "Filter" => "Standard",
        "V" => 1,
        "R" => 2,
        "Length" => 40,
        "P" => -4,
        "O" => Object::String(vec![0x5a; 32], lopdf::StringFormat::Hexadecimal),
        "U" => Object::String(vec![0xa5; 32], lopdf::StringFormat::Hexadecimal),
    });
    doc.trailer.set("Encrypt", encrypt_id);
    let file_id = Object::String(vec![0x11; 16], lopdf::StringFormat::Hexadecimal);
    doc.trailer.set("ID", vec![file_id.clone(), file_id]);
    finish(doc, pages_id)
}

/// The `Page <n>` label drawn on every page, in page order.
pub fn page_labels(pdf: &PdfFile) -> Vec<String> {
    pdf.page_ids()
        .iter()
        .map(|id| {
            let content = pdf.document().get_page_content(*id).unwrap();
            let text = String::from_utf8_lossy(&content);
            let start = text.find("(Page ").unwrap() + 1;
            let end = start + text[start..].find(')').unwrap();
            text[start..end].to_string()
        })
        .collect()
}

pub fn rotations(pdf: &PdfFile) -> Vec<i64> {
    (0..pdf.page_count())
        .map(|i| pdf.page_rotation(i).unwrap())
        .collect()
}

fn helvetica_resources(doc: &mut Document) -> ObjectId {
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    })
}

fn labelled_page(doc: &mut Document, parent: ObjectId, number: usize) -> lopdf::Dictionary {
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 24.into()]),
            Operation::new("Td", vec![72.into(), 720.into()]),
            Operation::new("Tj", vec![Object::string_literal(format!("Page {number}"))]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    dictionary! {
        "Type" => "Page",
        "Parent" => parent,
        "Contents" => content_id,
    }
}

fn finish(mut doc: Document, pages_id: ObjectId) -> Vec<u8> {
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}
