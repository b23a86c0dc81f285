use super::rotation::{apply_rotation, validate_quarter_turn};
use super::{malformed, PdfError};
use lopdf::{Dictionary, Document, Object, ObjectId};
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// Attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against cyclic `Parent` chains in damaged files.
const MAX_TREE_DEPTH: usize = 64;

/// One page of an assembled output: a source page and a rotation delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PageSpec {
    pub index: usize,
    #[serde(default)]
    pub rotation: i64,
}

impl PageSpec {
    pub fn new(index: usize, rotation: i64) -> Self {
        Self { index, rotation }
    }
}

/// A parsed PDF held in memory.
#[derive(Debug, Clone)]
pub struct PdfFile {
    doc: Document,
    page_ids: Vec<ObjectId>,
}

impl PdfFile {
    pub fn load(bytes: &[u8]) -> Result<Self, PdfError> {
        let doc = Document::load_mem(bytes).map_err(|err| {
            // A failed decryption attempt surfaces as a parse error.
            if declares_encryption(bytes) {
                PdfError::Encrypted
            } else {
                malformed(err)
            }
        })?;
        if doc.trailer.get(b"Encrypt").is_ok() {
            return Err(PdfError::Encrypted);
        }

        let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
        if page_ids.is_empty() {
            return Err(PdfError::NoPages);
        }
        Ok(Self { doc, page_ids })
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Effective rotation of the page at `index`, including inherited values.
    pub fn page_rotation(&self, index: usize) -> Result<i64, PdfError> {
        let page = self.flattened_page(self.page_id(index)?)?;
        Ok(rotation_of(&page))
    }

    /// Build a new document from `specs`, in order.
    ///
    /// A source page may be listed several times; every occurrence becomes an
    /// independent page carrying its own rotation.
    pub fn assemble(&self, specs: &[PageSpec]) -> Result<Vec<u8>, PdfError> {
        if specs.is_empty() {
            return Err(PdfError::NoPages);
        }

        let mut pages = Vec::with_capacity(specs.len());
        for spec in specs {
            validate_quarter_turn(spec.rotation)?;
            let source = self.page_id(spec.index)?;
            let mut page = self.flattened_page(source)?;
            let rotation = apply_rotation(rotation_of(&page), spec.rotation);
            page.set("Rotate", rotation);
            pages.push((source, page));
        }

        let mut doc = self.doc.clone();
        let root = pages_root(&doc)?;
        let mut placed = HashSet::new();
        let mut kids = Vec::with_capacity(pages.len());
        for (source, mut page) in pages {
            page.set("Parent", root);
            let id = if placed.insert(source) {
                doc.objects.insert(source, Object::Dictionary(page));
                source
            } else {
                doc.add_object(page)
            };
            kids.push(Object::Reference(id));
        }

        let count = kids.len() as i64;
        let root_dict = doc.get_dictionary_mut(root).map_err(malformed)?;
        root_dict.set("Kids", kids);
        root_dict.set("Count", count);

        doc.prune_objects();
        debug!(pages = count, "assembled pdf");
        save(&mut doc)
    }

    /// Copy the pages at `indices` (0-based) into a new document.
    pub fn extract_pages(&self, indices: &[usize]) -> Result<Vec<u8>, PdfError> {
        let specs: Vec<PageSpec> = indices.iter().map(|&i| PageSpec::new(i, 0)).collect();
        self.assemble(&specs)
    }

    /// Keep every page in order, adding the delta from `rotations` to the
    /// pages it names. Indices past the end are ignored.
    pub fn rotate(&self, rotations: &BTreeMap<usize, i64>) -> Result<Vec<u8>, PdfError> {
        let specs: Vec<PageSpec> = (0..self.page_count())
            .map(|i| PageSpec::new(i, rotations.get(&i).copied().unwrap_or(0)))
            .collect();
        for delta in rotations.values() {
            validate_quarter_turn(*delta)?;
        }
        self.assemble(&specs)
    }

    pub(crate) fn page_id(&self, index: usize) -> Result<ObjectId, PdfError> {
        self.page_ids
            .get(index)
            .copied()
            .ok_or(PdfError::PageOutOfBounds {
                index,
                total: self.page_ids.len(),
            })
    }

    pub(crate) fn page_ids(&self) -> &[ObjectId] {
        &self.page_ids
    }

    /// Page dictionary with inherited attributes copied onto it.
    pub(crate) fn flattened_page(&self, page_id: ObjectId) -> Result<Dictionary, PdfError> {
        flattened_page(&self.doc, page_id)
    }

    pub(crate) fn into_document(self) -> Document {
        self.doc
    }
}

pub(crate) fn flattened_page(doc: &Document, page_id: ObjectId) -> Result<Dictionary, PdfError> {
    let mut page = doc.get_dictionary(page_id).map_err(malformed)?.clone();
    for key in INHERITABLE {
        if page.has(key) {
            continue;
        }
        if let Some(value) = inherited_attribute(doc, &page, key) {
            page.set(key.to_vec(), value);
        }
    }
    Ok(page)
}

fn inherited_attribute(doc: &Document, page: &Dictionary, key: &[u8]) -> Option<Object> {
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok()?;
    for _ in 0..MAX_TREE_DEPTH {
        let node = doc.get_dictionary(parent).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok()?;
    }
    None
}

pub(crate) fn rotation_of(page: &Dictionary) -> i64 {
    match page.get(b"Rotate") {
        Ok(Object::Integer(value)) => *value,
        Ok(Object::Real(value)) => *value as i64,
        _ => 0,
    }
}

pub(crate) fn pages_root(doc: &Document) -> Result<ObjectId, PdfError> {
    let catalog = doc
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(malformed)?;
    doc.get_dictionary(catalog)
        .and_then(|catalog| catalog.get(b"Pages"))
        .and_then(Object::as_reference)
        .map_err(malformed)
}

pub(crate) fn save(doc: &mut Document) -> Result<Vec<u8>, PdfError> {
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).map_err(malformed)?;
    Ok(buffer)
}

fn declares_encryption(bytes: &[u8]) -> bool {
    bytes.windows(8).any(|window| window == b"/Encrypt")
}
