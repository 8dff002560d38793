use std::path::{Path, PathBuf};

pub mod appearance;
pub mod backend;
pub mod color;
pub mod dates;
pub mod extract;
pub mod json;
pub mod mock;
pub mod normalize;
pub mod records;
pub mod tabular;

// Re-export for convenience
pub use backend::{DocumentReader, DocumentSource, PageSource, ReaderError};
pub use extract::extract_document;
pub use json::{load_json, save_json, JsonError};
pub use normalize::normalize;
pub use records::RawDocument;
pub use tabular::TabularDocument;

/// Process-wide configuration for one pipeline run.
///
/// Output filenames derive from the source file's base name unless
/// overridden; the output directory defaults to the source file's
/// directory.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub source: PathBuf,
    pub output_dir: Option<PathBuf>,
    /// Cap on the number of pages to process; clamped to the actual
    /// page count during extraction.
    pub max_pages: Option<usize>,
    pub raw_json_name: Option<String>,
    pub tabular_json_name: Option<String>,
    pub report_name: Option<String>,
}

impl RunConfig {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            output_dir: None,
            max_pages: None,
            raw_json_name: None,
            tabular_json_name: None,
            report_name: None,
        }
    }

    pub fn output_dir(&self) -> PathBuf {
        match &self.output_dir {
            Some(dir) => dir.clone(),
            None => self
                .source
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        }
    }

    fn base_name(&self) -> String {
        self.source
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string())
    }

    pub fn raw_json_path(&self) -> PathBuf {
        let name = match &self.raw_json_name {
            Some(name) => name.clone(),
            None => format!("{}_raw.json", self.base_name()),
        };
        self.output_dir().join(name)
    }

    pub fn tabular_json_path(&self) -> PathBuf {
        let name = match &self.tabular_json_name {
            Some(name) => name.clone(),
            None => format!("{}_tabular.json", self.base_name()),
        };
        self.output_dir().join(name)
    }

    pub fn report_path(&self) -> PathBuf {
        let name = match &self.report_name {
            Some(name) => name.clone(),
            None => format!("{}_report.xlsx", self.base_name()),
        };
        self.output_dir().join(name)
    }
}
