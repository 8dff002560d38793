//! lopdf-backed implementation of the pagemark document reader.
//!
//! This crate is the only place the pipeline touches the PDF object
//! model directly; everything above it consumes the
//! [`pagemark_core::backend`] traits. Keeping the dependency isolated
//! here means the extraction semantics stay testable against the mock
//! reader, and a different PDF library would slot in behind the same
//! traits.

use std::collections::HashSet;
use std::collections::BTreeMap;
use std::path::Path;

use lopdf::{Dictionary, Document, Object, ObjectId};

use pagemark_core::backend::{
    AnnotationProps, DocumentReader, DocumentSource, PageSource, ReaderError, TextBlock,
};
use pagemark_core::records::OutlineEntry;

mod annots;
mod strings;
mod text;

/// Document reader over [`lopdf::Document`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfReader;

impl LopdfReader {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentReader for LopdfReader {
    fn open(&self, path: &Path) -> Result<Box<dyn DocumentSource>, ReaderError> {
        let doc = Document::load(path).map_err(|e| ReaderError::OpenError(e.to_string()))?;
        // get_pages keys are 1-based page numbers in document order.
        let page_ids: Vec<ObjectId> = doc.get_pages().values().copied().collect();
        Ok(Box::new(LopdfSource { doc, page_ids }))
    }
}

struct LopdfSource {
    doc: Document,
    page_ids: Vec<ObjectId>,
}

impl DocumentSource for LopdfSource {
    fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    fn format(&self) -> Option<String> {
        Some(format!("PDF {}", self.doc.version))
    }

    fn producer(&self) -> Option<String> {
        let info = info_dictionary(&self.doc)?;
        strings::dict_string(&self.doc, info, b"Producer")
    }

    fn outline(&self) -> Vec<OutlineEntry> {
        collect_outline(&self.doc)
    }

    fn page<'a>(&'a self, index: usize) -> Result<Box<dyn PageSource + 'a>, ReaderError> {
        let page_id = self.page_ids.get(index).copied().ok_or_else(|| {
            ReaderError::PageError(format!(
                "page index {index} out of range (0..{})",
                self.page_ids.len()
            ))
        })?;
        Ok(Box::new(LopdfPage {
            doc: &self.doc,
            page_id,
        }))
    }
}

struct LopdfPage<'a> {
    doc: &'a Document,
    page_id: ObjectId,
}

impl PageSource for LopdfPage<'_> {
    fn plain_text(&self) -> Result<String, ReaderError> {
        text::page_plain_text(self.doc, self.page_id)
    }

    fn annotations(&self) -> Result<Vec<AnnotationProps>, ReaderError> {
        annots::annotation_properties(self.doc, self.page_id)
    }

    fn text_blocks(&self) -> Result<Vec<TextBlock>, ReaderError> {
        text::page_text_blocks(self.doc, self.page_id)
    }
}

/// The trailer `/Info` dictionary, if the document has one.
fn info_dictionary(doc: &Document) -> Option<&Dictionary> {
    let info = doc.trailer.get(b"Info").ok()?;
    strings::resolve(doc, info).as_dict().ok()
}

/// The catalog dictionary from the trailer `/Root`.
fn catalog(doc: &Document) -> Option<&Dictionary> {
    let root = doc.trailer.get(b"Root").ok()?;
    strings::resolve(doc, root).as_dict().ok()
}

/// Walk the `/Outlines` tree into a flat, depth-annotated list.
fn collect_outline(doc: &Document) -> Vec<OutlineEntry> {
    let mut entries = Vec::new();
    let Some(catalog) = catalog(doc) else {
        return entries;
    };
    let Some(outlines) = catalog
        .get(b"Outlines")
        .ok()
        .and_then(|o| strings::resolve(doc, o).as_dict().ok())
    else {
        return entries;
    };
    let Ok(Object::Reference(first)) = outlines.get(b"First") else {
        return entries;
    };

    let pages_map = doc.get_pages();
    walk_outline(doc, *first, 1, &pages_map, &mut entries);
    entries
}

/// Siblings via `/Next`, children via `/First`. Guarded against
/// reference cycles and runaway depth.
fn walk_outline(
    doc: &Document,
    item_id: ObjectId,
    level: i64,
    pages_map: &BTreeMap<u32, ObjectId>,
    entries: &mut Vec<OutlineEntry>,
) {
    const MAX_DEPTH: i64 = 64;
    if level > MAX_DEPTH {
        return;
    }

    let mut visited = HashSet::new();
    let mut current = Some(item_id);
    while let Some(node_id) = current {
        if !visited.insert(node_id) {
            break;
        }
        let Ok(node) = doc.get_object(node_id).and_then(|o| o.as_dict()) else {
            break;
        };

        let title = strings::dict_string(doc, node, b"Title").unwrap_or_default();
        let page = outline_target_page(doc, node, pages_map).unwrap_or(0);
        entries.push(OutlineEntry { level, title, page });

        if let Ok(Object::Reference(child)) = node.get(b"First") {
            walk_outline(doc, *child, level + 1, pages_map, entries);
        }
        current = match node.get(b"Next") {
            Ok(Object::Reference(next)) => Some(*next),
            _ => None,
        };
    }
}

/// Resolve an outline node's destination to a 1-based page number.
/// Checks `/Dest` first, then a GoTo `/A` action. Named destinations
/// are not chased; they resolve to no page.
fn outline_target_page(
    doc: &Document,
    node: &Dictionary,
    pages_map: &BTreeMap<u32, ObjectId>,
) -> Option<i64> {
    if let Ok(dest) = node.get(b"Dest") {
        if let Some(page) = dest_array_page(doc, dest, pages_map) {
            return Some(page);
        }
    }
    if let Ok(action) = node.get(b"A") {
        let action = strings::resolve(doc, action).as_dict().ok()?;
        let is_goto = matches!(action.get(b"S"), Ok(Object::Name(kind)) if kind == b"GoTo");
        if is_goto {
            if let Ok(dest) = action.get(b"D") {
                return dest_array_page(doc, dest, pages_map);
            }
        }
    }
    None
}

/// An explicit destination array `[page_ref, /type, ...]` resolved
/// against the page map.
fn dest_array_page(
    doc: &Document,
    dest: &Object,
    pages_map: &BTreeMap<u32, ObjectId>,
) -> Option<i64> {
    let array = strings::resolve(doc, dest).as_array().ok()?;
    let Object::Reference(page_ref) = array.first()? else {
        return None;
    };
    pages_map.iter().find_map(|(&page_number, &page_id)| {
        if page_id == *page_ref {
            Some(i64::from(page_number))
        } else {
            None
        }
    })
}
