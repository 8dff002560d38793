use std::path::Path;

use thiserror::Error;

use crate::records::OutlineEntry;

#[derive(Error, Debug)]
pub enum ReaderError {
    #[error("failed to open document: {0}")]
    OpenError(String),
    #[error("failed to read page content: {0}")]
    PageError(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for document reading backends.
///
/// Implementors provide the low-level document access step; the
/// extraction pipeline (record building, color/date normalization,
/// pruning) lives in [`crate::extract`].
pub trait DocumentReader {
    /// Open a document for reading. Fails only when the file cannot be
    /// parsed at all; a structurally odd but openable document is the
    /// extractor's problem, not the reader's.
    fn open(&self, path: &Path) -> Result<Box<dyn DocumentSource>, ReaderError>;
}

/// An open document.
pub trait DocumentSource {
    fn page_count(&self) -> usize;

    /// Document format identifier (e.g. "PDF 1.7"). Diagnostics only.
    fn format(&self) -> Option<String>;

    /// Producer string from the document metadata. Diagnostics only.
    fn producer(&self) -> Option<String>;

    /// The document outline (bookmarks). A document without an outline
    /// yields an empty list, not an error.
    fn outline(&self) -> Vec<OutlineEntry>;

    /// Access a single page by 0-based index.
    fn page<'a>(&'a self, index: usize) -> Result<Box<dyn PageSource + 'a>, ReaderError>;
}

/// A single page of an open document.
pub trait PageSource {
    /// Plain text content of the page, untrimmed.
    fn plain_text(&self) -> Result<String, ReaderError>;

    /// Property snapshots for every annotation on the page.
    fn annotations(&self) -> Result<Vec<AnnotationProps>, ReaderError>;

    /// Structured text content: blocks of lines of styled spans.
    fn text_blocks(&self) -> Result<Vec<TextBlock>, ReaderError>;
}

/// Raw properties of one annotation, as the document model provides
/// them. Every attribute is optional: a reader that cannot supply a
/// field leaves it `None`, and absence of one field never prevents the
/// others from being read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationProps {
    /// Annotation subtype tag, e.g. "Highlight", "FreeText".
    pub subtype: Option<String>,
    /// Bounding rectangle `[x0, y0, x1, y1]`.
    pub rect: Option<[f64; 4]>,
    /// Annotation flag bitmask.
    pub flags: Option<i64>,
    /// The annotation's own contents string.
    pub contents: Option<String>,
    /// Text extracted from the annotated region, where the reader
    /// supports it.
    pub text: Option<String>,
    /// Stroke color components, normalized to 0–1.
    pub stroke_components: Option<Vec<f64>>,
    /// Interior (fill) color components, normalized to 0–1.
    pub fill_components: Option<Vec<f64>>,
    pub opacity: Option<f64>,
    pub border_width: Option<f64>,
    pub border_dashes: Option<Vec<i64>>,
    pub border_style: Option<String>,
    /// Cloud-border intensity.
    pub border_clouds: Option<i64>,
    /// Rectangle of the associated popup annotation.
    pub popup_rect: Option<[f64; 4]>,
    pub vertices: Option<Vec<[f64; 2]>>,
    pub line_endpoints: Option<Vec<[f64; 2]>>,
    pub rotation: Option<i64>,
    pub quad_points: Option<Vec<[f64; 2]>>,
    pub is_open: Option<bool>,
    pub info: Option<AnnotationInfo>,
}

/// The annotation's embedded info dictionary. Unknown keys are dropped
/// by the reader; each known key has an explicit slot here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationInfo {
    pub title: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub content: Option<String>,
    pub name: Option<String>,
    pub state: Option<String>,
    pub state_model: Option<String>,
    /// Raw creation date string, in whatever form the document carries.
    pub creation_date: Option<String>,
    /// Raw modification date string.
    pub modification_date: Option<String>,
    /// Default-appearance string for FreeText annotations.
    pub default_appearance: Option<String>,
}

/// Kind discriminator for structured-text blocks. Only text blocks
/// contribute styled spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Text,
    Image,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub kind: BlockKind,
    pub lines: Vec<TextLine>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub spans: Vec<SpanProps>,
}

/// One styled run of text within a line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpanProps {
    pub text: Option<String>,
    /// Font family name.
    pub font: Option<String>,
    /// Font size in points.
    pub size: Option<f64>,
    /// Packed RGB color: red in bits 16–23, green in 8–15, blue in 0–7.
    pub color: Option<u32>,
    /// Bounding box `[x0, y0, x1, y1]`.
    pub bbox: Option<[f64; 4]>,
}
