use super::document::{flattened_page, save};
use super::{malformed, PdfError, PdfFile};
use lopdf::{dictionary, Document, Object, ObjectId};
use tracing::debug;

/// Concatenate the pages of `files`, in order, into one document.
pub fn merge(files: Vec<PdfFile>) -> Result<Vec<u8>, PdfError> {
    if files.is_empty() {
        return Err(PdfError::NoPages);
    }

    let mut merged = Document::with_version("1.5");
    let mut next_id = 1;
    let mut kids: Vec<ObjectId> = Vec::new();

    for file in files {
        let mut doc = file.into_document();

        // Pages are re-parented below a fresh root, so inherited attributes
        // must live on the pages themselves.
        let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
        for id in page_ids {
            let page = flattened_page(&doc, id)?;
            doc.objects.insert(id, Object::Dictionary(page));
        }

        doc.renumber_objects_with(next_id);
        next_id = doc.max_id + 1;
        kids.extend(doc.get_pages().into_values());
        merged.objects.extend(doc.objects);
    }

    merged.max_id = next_id - 1;
    let pages_id = merged.new_object_id();
    for kid in &kids {
        merged
            .get_dictionary_mut(*kid)
            .map_err(malformed)?
            .set("Parent", pages_id);
    }

    let count = kids.len() as i64;
    let kids: Vec<Object> = kids.into_iter().map(Object::Reference).collect();
    merged.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = merged.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    merged.trailer.set("Root", catalog_id);
    merged.prune_objects();

    debug!(pages = count, "merged pdfs");
    save(&mut merged)
}
