//! The three-stage pipeline: extract, normalize, report.
//!
//! Each stage persists its output, and the later stages read their
//! input back from disk, so a stage can be re-run on its own from a
//! previous run's files.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;

use pagemark_core::{
    extract_document, load_json, normalize, save_json, RawDocument, RunConfig, TabularDocument,
};
use pagemark_pdf_lopdf::LopdfReader;
use pagemark_reporting::write_report;

/// Paths of the three artifacts a completed run leaves behind.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub raw_json: PathBuf,
    pub tabular_json: PathBuf,
    pub report: PathBuf,
}

/// Run the full pipeline. Returns `Ok(None)` when extraction produced
/// nothing (missing or unopenable source); in that case the later
/// stages are skipped and no files are written.
pub fn run(config: &RunConfig) -> anyhow::Result<Option<RunOutcome>> {
    tracing::info!("step 1: extracting document content");
    let Some(raw_json) = extract_stage(config)? else {
        return Ok(None);
    };
    tracing::info!(path = %raw_json.display(), "step 1 complete");

    tracing::info!("step 2: normalizing for tabular output");
    let tabular_json = config.tabular_json_path();
    let tabular = normalize_stage(&raw_json, &tabular_json)?;
    tracing::info!(path = %tabular_json.display(), "step 2 complete");

    tracing::info!("step 3: writing spreadsheet report");
    let report = config.report_path();
    report_stage(&tabular, &report)?;
    tracing::info!(path = %report.display(), "step 3 complete");

    Ok(Some(RunOutcome {
        raw_json,
        tabular_json,
        report,
    }))
}

/// Stage 1: extract the raw record set and persist it. `Ok(None)`
/// means extraction yielded nothing; the failure is already logged.
pub fn extract_stage(config: &RunConfig) -> anyhow::Result<Option<PathBuf>> {
    let output_dir = config.output_dir();
    fs::create_dir_all(&output_dir).with_context(|| {
        format!(
            "failed to create output directory {}",
            output_dir.display()
        )
    })?;

    let Some(raw) = extract_document(&LopdfReader::new(), &config.source, config.max_pages)
    else {
        tracing::error!("failed to extract document content");
        return Ok(None);
    };

    let path = config.raw_json_path();
    save_json(&raw, &path).context("failed to save raw JSON")?;
    Ok(Some(path))
}

/// Stage 2: read the raw JSON back and persist the normalized form.
pub fn normalize_stage(raw_json: &Path, output: &Path) -> anyhow::Result<TabularDocument> {
    let raw: RawDocument = load_json(raw_json)
        .with_context(|| format!("failed to read raw JSON {}", raw_json.display()))?;
    let tabular = normalize(&raw);
    save_json(&tabular, output).context("failed to save tabular JSON")?;
    Ok(tabular)
}

/// Stage 3: write the spreadsheet report.
pub fn report_stage(tabular: &TabularDocument, output: &Path) -> anyhow::Result<()> {
    write_report(tabular, output).context("failed to write spreadsheet report")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};
    use std::io::Write;

    fn literal(text: &str) -> Object {
        Object::String(text.as_bytes().to_vec(), StringFormat::Literal)
    }

    fn build_single_page_pdf() -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id: ObjectId = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let content = b"BT /F1 11 Tf 72 700 Td (Visit Date) Tj ET";
        let content_id = doc.add_object(Object::Stream(Stream::new(
            lopdf::Dictionary::new(),
            content.to_vec(),
        )));
        let annot_id = doc.add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Highlight",
            "Rect" => vec![
                Object::Real(10.0),
                Object::Real(20.0),
                Object::Real(110.0),
                Object::Real(40.0),
            ],
            "C" => vec![Object::Real(1.0), Object::Real(0.0), Object::Real(0.0)],
            "Contents" => literal("confirm visit window"),
        });
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => Object::Dictionary(dictionary! {
                "Font" => Object::Dictionary(dictionary! {
                    "F1" => font_id,
                }),
            }),
            "Annots" => vec![annot_id.into()],
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::from(page_id)],
                "Count" => 1i64,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).unwrap();
        buffer
    }

    #[test]
    fn full_run_writes_all_three_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("visit.pdf");
        let mut file = std::fs::File::create(&source).unwrap();
        file.write_all(&build_single_page_pdf()).unwrap();
        drop(file);

        let mut config = RunConfig::new(&source);
        config.output_dir = Some(dir.path().join("out"));

        let outcome = run(&config).unwrap().expect("pipeline completed");
        assert!(outcome.raw_json.exists());
        assert!(outcome.tabular_json.exists());
        assert!(outcome.report.exists());

        // The persisted artifacts agree with each other.
        let raw: RawDocument = load_json(&outcome.raw_json).unwrap();
        assert_eq!(raw.annotations.len(), 1);
        let tabular: TabularDocument = load_json(&outcome.tabular_json).unwrap();
        assert_eq!(tabular.sheets.annotations.len(), 1);
        assert_eq!(tabular.sheets.annotations[0].stroke_color, "#FF0000");
    }

    #[test]
    fn missing_source_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = RunConfig::new(dir.path().join("absent.pdf"));
        config.output_dir = Some(dir.path().join("out"));

        let outcome = run(&config).unwrap();
        assert!(outcome.is_none());

        let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("out"))
            .unwrap()
            .collect();
        assert!(leftovers.is_empty(), "no artifacts on a failed extraction");
    }

    #[test]
    fn normalize_stage_rejects_unreadable_input() {
        let dir = tempfile::tempdir().unwrap();
        let result = normalize_stage(
            &dir.path().join("absent_raw.json"),
            &dir.path().join("tabular.json"),
        );
        assert!(result.is_err());
    }

    #[test]
    fn stages_rerun_from_persisted_files() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("visit.pdf");
        std::fs::write(&source, build_single_page_pdf()).unwrap();

        let mut config = RunConfig::new(&source);
        config.output_dir = Some(dir.path().to_path_buf());

        let raw_json = extract_stage(&config).unwrap().unwrap();

        // Re-run stage 2 and 3 from the files alone.
        let tabular_json = dir.path().join("again_tabular.json");
        let tabular = normalize_stage(&raw_json, &tabular_json).unwrap();
        let report = dir.path().join("again_report.xlsx");
        report_stage(&tabular, &report).unwrap();
        assert!(report.exists());
    }
}
