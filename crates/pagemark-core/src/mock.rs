//! Mock document reader for testing.

use std::path::Path;

use crate::backend::{
    AnnotationProps, DocumentReader, DocumentSource, PageSource, ReaderError, TextBlock,
};
use crate::records::OutlineEntry;

/// A hand-rolled mock implementing [`DocumentReader`] for tests.
///
/// Supports:
/// - Scripted pages with text, annotations and text blocks.
/// - A scripted outline and metadata strings.
/// - Failure injection at the open, page, text, annotation and
///   styled-text levels, so every recovery path in the extractor is
///   reachable without fixture files.
#[derive(Debug, Clone, Default)]
pub struct MockReader {
    source: MockSource,
    fail_open: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MockSource {
    pub format: Option<String>,
    pub producer: Option<String>,
    pub outline: Vec<OutlineEntry>,
    pub pages: Vec<MockPage>,
}

#[derive(Debug, Clone, Default)]
pub struct MockPage {
    pub text: String,
    pub annotations: Vec<AnnotationProps>,
    pub blocks: Vec<TextBlock>,
    pub fail_text: bool,
    pub fail_annotations: bool,
    pub fail_blocks: bool,
}

impl MockReader {
    /// Create a mock over the given pages.
    pub fn new(pages: Vec<MockPage>) -> Self {
        Self {
            source: MockSource {
                pages,
                ..Default::default()
            },
            fail_open: false,
        }
    }

    /// Create a mock whose `open` always fails.
    pub fn failing() -> Self {
        Self {
            source: MockSource::default(),
            fail_open: true,
        }
    }

    pub fn with_outline(mut self, outline: Vec<OutlineEntry>) -> Self {
        self.source.outline = outline;
        self
    }

    pub fn with_metadata(mut self, format: &str, producer: &str) -> Self {
        self.source.format = Some(format.to_string());
        self.source.producer = Some(producer.to_string());
        self
    }
}

impl MockPage {
    pub fn with_text(text: &str) -> Self {
        Self {
            text: text.to_string(),
            ..Default::default()
        }
    }

    pub fn with_annotations(mut self, annotations: Vec<AnnotationProps>) -> Self {
        self.annotations = annotations;
        self
    }

    pub fn with_blocks(mut self, blocks: Vec<TextBlock>) -> Self {
        self.blocks = blocks;
        self
    }
}

impl DocumentReader for MockReader {
    fn open(&self, _path: &Path) -> Result<Box<dyn DocumentSource>, ReaderError> {
        if self.fail_open {
            return Err(ReaderError::OpenError("scripted open failure".to_string()));
        }
        Ok(Box::new(self.source.clone()))
    }
}

impl DocumentSource for MockSource {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn format(&self) -> Option<String> {
        self.format.clone()
    }

    fn producer(&self) -> Option<String> {
        self.producer.clone()
    }

    fn outline(&self) -> Vec<OutlineEntry> {
        self.outline.clone()
    }

    fn page<'a>(&'a self, index: usize) -> Result<Box<dyn PageSource + 'a>, ReaderError> {
        match self.pages.get(index) {
            Some(page) => Ok(Box::new(page.clone())),
            None => Err(ReaderError::PageError(format!(
                "page index {index} out of range"
            ))),
        }
    }
}

impl PageSource for MockPage {
    fn plain_text(&self) -> Result<String, ReaderError> {
        if self.fail_text {
            return Err(ReaderError::PageError("scripted text failure".to_string()));
        }
        Ok(self.text.clone())
    }

    fn annotations(&self) -> Result<Vec<AnnotationProps>, ReaderError> {
        if self.fail_annotations {
            return Err(ReaderError::PageError(
                "scripted annotation failure".to_string(),
            ));
        }
        Ok(self.annotations.clone())
    }

    fn text_blocks(&self) -> Result<Vec<TextBlock>, ReaderError> {
        if self.fail_blocks {
            return Err(ReaderError::PageError(
                "scripted styled-text failure".to_string(),
            ));
        }
        Ok(self.blocks.clone())
    }
}
