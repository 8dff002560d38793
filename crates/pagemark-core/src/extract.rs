//! The extraction stage: walk an open document and build the raw
//! record set.
//!
//! Failure policy: a missing or unopenable document aborts the stage
//! and yields `None`. Anything below that (a page, an annotation, a
//! single field, a date parse) is caught at the narrowest scope,
//! logged, and skipped so the rest of the document still comes
//! through.

use std::path::Path;

use crate::backend::{AnnotationProps, BlockKind, DocumentReader, PageSource, TextBlock};
use crate::records::{
    AnnotationRecord, BorderStyle, ColorPair, PageRecord, RawDocument, SpanRecord,
};
use crate::{appearance, color, dates};

/// Extract the raw record set from the document at `path`.
///
/// `max_pages` caps the number of pages walked; it is clamped to the
/// actual page count. Returns `None` when the file is missing or the
/// document cannot be opened, which is distinct from an empty document
/// (a record set of empty lists).
pub fn extract_document(
    reader: &dyn DocumentReader,
    path: &Path,
    max_pages: Option<usize>,
) -> Option<RawDocument> {
    tracing::info!(path = %path.display(), "starting document extraction");

    if !path.exists() {
        tracing::error!(path = %path.display(), "document not found");
        return None;
    }

    let source = match reader.open(path) {
        Ok(source) => source,
        Err(err) => {
            tracing::error!(path = %path.display(), error = %err, "failed to open document");
            return None;
        }
    };

    let total_pages = source.page_count();
    tracing::info!(pages = total_pages, "opened document");
    tracing::info!(
        format = source.format().as_deref().unwrap_or("Unknown"),
        producer = source.producer().as_deref().unwrap_or("Unknown"),
        "document metadata"
    );

    let page_cap = max_pages.map_or(total_pages, |cap| cap.min(total_pages));

    let bookmarks = source.outline();
    if bookmarks.is_empty() {
        tracing::info!("no bookmarks found in the document");
    }

    let mut pages = Vec::with_capacity(page_cap);
    let mut annotations = Vec::new();
    let mut styled_text = Vec::new();

    for index in 0..page_cap {
        let page_number = (index + 1) as u32;
        tracing::info!(page = page_number, "processing page");

        let page = match source.page(index) {
            Ok(page) => page,
            Err(err) => {
                tracing::error!(page = page_number, error = %err, "failed to read page");
                // Keep the pages list aligned with the page count.
                pages.push(PageRecord {
                    page_number,
                    text: String::new(),
                });
                continue;
            }
        };

        let text = match page.plain_text() {
            Ok(text) => text.trim().to_string(),
            Err(err) => {
                tracing::error!(page = page_number, error = %err, "failed to extract page text");
                String::new()
            }
        };
        pages.push(PageRecord { page_number, text });

        annotations.extend(collect_annotations(page.as_ref(), page_number));

        match page.text_blocks() {
            Ok(blocks) => styled_text.extend(collect_spans(&blocks, page_number)),
            Err(err) => {
                tracing::error!(page = page_number, error = %err, "failed to extract styled text");
            }
        }
    }

    tracing::info!(
        annotations = annotations.len(),
        pages = page_cap,
        "extraction complete"
    );

    Some(RawDocument {
        bookmarks,
        pages,
        annotations,
        styled_text,
    })
}

/// Collect the annotation records of one page. A failure to enumerate
/// the page's annotations yields an empty list for that page only.
pub fn collect_annotations(page: &dyn PageSource, page_number: u32) -> Vec<AnnotationRecord> {
    let props = match page.annotations() {
        Ok(props) => props,
        Err(err) => {
            tracing::error!(page = page_number, error = %err, "failed to enumerate annotations");
            return Vec::new();
        }
    };

    let mut records = Vec::with_capacity(props.len());
    for annot in props {
        let record = build_annotation(annot, page_number);
        tracing::debug!(page = page_number, kind = %record.kind, "extracted annotation");
        records.push(record);
    }
    records
}

/// Build one sparse annotation record from the reader's property
/// snapshot. Every attribute is handled independently; a missing or
/// unconvertible field never costs the record its other fields.
fn build_annotation(props: AnnotationProps, page_number: u32) -> AnnotationRecord {
    let kind = props.subtype.unwrap_or_else(|| "Unknown".to_string());

    let colors = ColorPair {
        stroke: non_empty_vec(props.stroke_components),
        fill: non_empty_vec(props.fill_components),
    };
    let stroke_color = hex_or_log(colors.stroke.as_deref(), page_number, "stroke");
    let fill_color = hex_or_log(colors.fill.as_deref(), page_number, "fill");

    let border = BorderStyle {
        width: props.border_width,
        dashes: non_empty_vec(props.border_dashes),
        style: non_empty(props.border_style),
        clouds: props.border_clouds,
    };

    let info = props.info.unwrap_or_default();
    let creation_date = info.creation_date.as_deref().and_then(normalize_date);
    let modification_date = info.modification_date.as_deref().and_then(normalize_date);

    let mut font_name = None;
    let mut font_size = None;
    let mut font_color = None;
    if kind == "FreeText" {
        if let Some(da) = info.default_appearance.as_deref() {
            let style = appearance::parse_appearance(da);
            font_name = style.font_name;
            font_size = style.font_size;
            font_color = style.font_color;
        }
    }

    AnnotationRecord {
        page_number,
        kind,
        rect: props.rect.map(round_rect2),
        flags: props.flags,
        contents: non_empty(props.contents.map(|c| c.trim().to_string())),
        text: non_empty(props.text),
        colors: if colors.is_empty() { None } else { Some(colors) },
        stroke_color,
        fill_color,
        opacity: props.opacity,
        border: if border.is_empty() { None } else { Some(border) },
        popup_rect: props.popup_rect.map(round_rect2),
        vertices: non_empty_vec(props.vertices),
        line_endpoints: non_empty_vec(props.line_endpoints),
        rotation: props.rotation,
        quad_points: non_empty_vec(props.quad_points),
        is_open: props.is_open,
        title: non_empty(info.title),
        subject: non_empty(info.subject),
        creator: non_empty(info.creator),
        content: non_empty(info.content),
        name: non_empty(info.name),
        state: non_empty(info.state),
        state_model: non_empty(info.state_model),
        creation_date,
        modification_date,
        font_name,
        font_size,
        font_color,
    }
}

/// Collect styled spans from a page's structured text. Only text
/// blocks contribute; spans with no text, font or size left after
/// pruning are dropped.
pub fn collect_spans(blocks: &[TextBlock], page_number: u32) -> Vec<SpanRecord> {
    let mut spans = Vec::new();
    for block in blocks {
        if block.kind != BlockKind::Text {
            continue;
        }
        for line in &block.lines {
            for props in &line.spans {
                let text = non_empty(props.text.as_deref().map(|t| t.trim().to_string()));
                let font = non_empty(props.font.clone());
                let font_size = props.size;
                if text.is_none() && font.is_none() && font_size.is_none() {
                    continue;
                }
                let font_color = color::rgb_to_hex(color::unpack_rgb(props.color.unwrap_or(0)));
                spans.push(SpanRecord {
                    page_number,
                    text,
                    font,
                    font_size,
                    font_color: Some(font_color),
                    bbox: props.bbox.map(|bbox| bbox.map(round3)),
                });
            }
        }
    }
    spans
}

fn normalize_date(raw: &str) -> Option<String> {
    dates::parse_pdf_date(raw).map(|parsed| dates::format_date(&parsed))
}

fn hex_or_log(components: Option<&[f64]>, page_number: u32, role: &str) -> Option<String> {
    let components = components?;
    let hex = color::hex_from_components(components);
    if hex.is_none() {
        tracing::debug!(page = page_number, role, "could not convert color components");
    }
    hex
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn non_empty_vec<T>(value: Option<Vec<T>>) -> Option<Vec<T>> {
    value.filter(|v| !v.is_empty())
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

fn round_rect2(rect: [f64; 4]) -> [f64; 4] {
    rect.map(round2)
}
