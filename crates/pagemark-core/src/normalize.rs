//! The normalization stage: reshape the raw record set into the
//! spreadsheet-ready form.
//!
//! Pure and total: the only failure mode of this stage is the raw
//! JSON read, which belongs to the caller. Nested values are flattened
//! here into display strings; summary counts are taken from the raw
//! lists before any filtering, so an empty-text page that never
//! reaches the pages sheet is still counted.

use crate::records::RawDocument;
use crate::tabular::{
    AnnotationRow, BookmarkRow, ComponentCount, PageRow, SheetSet, SpanRow, Summary,
    TabularDocument,
};

/// Reshape a raw record set into the normalized record set.
pub fn normalize(raw: &RawDocument) -> TabularDocument {
    let summary = Summary {
        components: vec![
            ComponentCount::new("Total Pages", raw.pages.len()),
            ComponentCount::new("Annotations", raw.annotations.len()),
            ComponentCount::new("Bookmarks", raw.bookmarks.len()),
            ComponentCount::new("Styled Text Elements", raw.styled_text.len()),
        ],
    };

    let annotations = raw.annotations.iter().map(annotation_row).collect();

    let bookmarks = raw
        .bookmarks
        .iter()
        .map(|entry| BookmarkRow {
            level: entry.level,
            title: clean_display(&entry.title),
            page: entry.page,
        })
        .collect();

    // Pages with no text are left off the sheet; the summary count
    // above already reflects the raw total.
    let pages = raw
        .pages
        .iter()
        .filter_map(|page| {
            let text = clean_display(&page.text);
            if text.is_empty() {
                None
            } else {
                Some(PageRow {
                    page_number: page.page_number,
                    text,
                })
            }
        })
        .collect();

    let styled_text = raw
        .styled_text
        .iter()
        .map(|span| SpanRow {
            page_number: span.page_number,
            text: clean_display(span.text.as_deref().unwrap_or_default()),
            font: span.font.clone().unwrap_or_default(),
            font_size: span.font_size.map(fmt_number).unwrap_or_default(),
            font_color: span.font_color.clone().unwrap_or_default(),
            position: span.bbox.as_ref().map(|b| number_list(b)).unwrap_or_default(),
        })
        .collect();

    TabularDocument {
        summary,
        sheets: SheetSet {
            annotations,
            bookmarks,
            pages,
            styled_text,
        },
    }
}

fn annotation_row(record: &crate::records::AnnotationRecord) -> AnnotationRow {
    let flags = record.flags.map(|f| f.to_string()).unwrap_or_default();
    let border = record.border.as_ref();
    let colors = record.colors.as_ref();

    AnnotationRow {
        page_number: record.page_number,
        kind: record.kind.clone(),
        content: record.content.clone().unwrap_or_default(),
        position: record
            .rect
            .as_ref()
            .map(|r| clean_display(&number_list(r)))
            .unwrap_or_default(),
        flags_lower: flags.clone(),
        colors_stroke: colors
            .and_then(|c| c.stroke.as_deref())
            .map(|c| clean_display(&number_list(c)))
            .unwrap_or_default(),
        colors_fill: colors
            .and_then(|c| c.fill.as_deref())
            .map(|c| clean_display(&number_list(c)))
            .unwrap_or_default(),
        stroke_color: record.stroke_color.clone().unwrap_or_default(),
        opacity: record.opacity.map(fmt_number).unwrap_or_default(),
        border_width: border
            .and_then(|b| b.width)
            .map(fmt_number)
            .unwrap_or_default(),
        border_dashes: border
            .and_then(|b| b.dashes.as_deref())
            .map(|d| clean_display(&int_list(d)))
            .unwrap_or_default(),
        border_style: border
            .and_then(|b| b.style.clone())
            .unwrap_or_default(),
        border_clouds: border
            .and_then(|b| b.clouds)
            .map(|c| c.to_string())
            .unwrap_or_default(),
        rotation: record.rotation.map(|r| r.to_string()).unwrap_or_default(),
        flags,
        is_open: record.is_open.map(|o| o.to_string()).unwrap_or_default(),
        popup_rect: record
            .popup_rect
            .as_ref()
            .map(|r| clean_display(&number_list(r)))
            .unwrap_or_default(),
    }
}

/// Canonical display form for a numeric list: `[1, 0.5, 20.25]`.
/// Integral values print without a decimal point.
pub fn number_list(values: &[f64]) -> String {
    let parts: Vec<String> = values.iter().map(|v| fmt_number(*v)).collect();
    format!("[{}]", parts.join(", "))
}

fn int_list(values: &[i64]) -> String {
    let parts: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    format!("[{}]", parts.join(", "))
}

fn fmt_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Strip the characters that corrupt tabular storage. The reporter
/// re-cleans defensively before writing cells; stripping here keeps
/// the persisted tabular JSON printable too.
fn clean_display(value: &str) -> String {
    value.chars().filter(|c| *c != '\u{0}' && *c != '\r').collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{
        AnnotationRecord, BorderStyle, ColorPair, OutlineEntry, PageRecord, SpanRecord,
    };

    fn sample_raw() -> RawDocument {
        RawDocument {
            bookmarks: vec![OutlineEntry {
                level: 1,
                title: "Demographics".to_string(),
                page: 2,
            }],
            pages: vec![
                PageRecord {
                    page_number: 1,
                    text: "Subject ID".to_string(),
                },
                PageRecord {
                    page_number: 2,
                    text: String::new(),
                },
            ],
            annotations: vec![AnnotationRecord {
                page_number: 1,
                kind: "Highlight".to_string(),
                rect: Some([10.0, 20.0, 110.5, 40.25]),
                flags: Some(4),
                colors: Some(ColorPair {
                    stroke: Some(vec![1.0, 0.0, 0.0]),
                    fill: None,
                }),
                stroke_color: Some("#FF0000".to_string()),
                opacity: Some(0.5),
                border: Some(BorderStyle {
                    width: Some(1.0),
                    dashes: Some(vec![3, 2]),
                    style: Some("D".to_string()),
                    clouds: None,
                }),
                rotation: Some(0),
                is_open: Some(false),
                content: Some("AE term\r checked".to_string()),
                ..Default::default()
            }],
            styled_text: vec![SpanRecord {
                page_number: 1,
                text: Some("Visit 1".to_string()),
                font: Some("Helvetica".to_string()),
                font_size: Some(9.5),
                font_color: Some("#000000".to_string()),
                bbox: Some([72.0, 700.123, 140.5, 712.0]),
            }],
        }
    }

    #[test]
    fn summary_counts_reflect_raw_totals() {
        let tabular = normalize(&sample_raw());
        let counts: Vec<(&str, usize)> = tabular
            .summary
            .components
            .iter()
            .map(|c| (c.component.as_str(), c.count))
            .collect();
        assert_eq!(
            counts,
            vec![
                ("Total Pages", 2),
                ("Annotations", 1),
                ("Bookmarks", 1),
                ("Styled Text Elements", 1),
            ]
        );
    }

    #[test]
    fn empty_text_pages_are_filtered_but_counted() {
        let tabular = normalize(&sample_raw());
        assert_eq!(tabular.sheets.pages.len(), 1);
        assert_eq!(tabular.sheets.pages[0].page_number, 1);
        assert_eq!(tabular.summary.components[0].count, 2);
    }

    #[test]
    fn annotation_flattening() {
        let tabular = normalize(&sample_raw());
        let row = &tabular.sheets.annotations[0];
        assert_eq!(row.position, "[10, 20, 110.5, 40.25]");
        assert_eq!(row.colors_stroke, "[1, 0, 0]");
        assert_eq!(row.colors_fill, "");
        assert_eq!(row.stroke_color, "#FF0000");
        assert_eq!(row.opacity, "0.5");
        assert_eq!(row.border_width, "1");
        assert_eq!(row.border_dashes, "[3, 2]");
        assert_eq!(row.border_style, "D");
        assert_eq!(row.border_clouds, "");
        assert_eq!(row.is_open, "false");
        // Scalars pass through; the reporter's defensive clean handles
        // stray control characters at write time.
        assert_eq!(row.content, "AE term\r checked");
    }

    #[test]
    fn flag_columns_are_duplicated() {
        let tabular = normalize(&sample_raw());
        let row = &tabular.sheets.annotations[0];
        assert_eq!(row.flags_lower, "4");
        assert_eq!(row.flags, "4");
    }

    #[test]
    fn absent_scalars_default_to_empty_strings() {
        let raw = RawDocument {
            annotations: vec![AnnotationRecord {
                page_number: 3,
                kind: "Text".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let tabular = normalize(&raw);
        let row = &tabular.sheets.annotations[0];
        assert_eq!(row.page_number, 3);
        assert_eq!(row.kind, "Text");
        assert_eq!(row.position, "");
        assert_eq!(row.flags, "");
        assert_eq!(row.opacity, "");
        assert_eq!(row.popup_rect, "");
    }

    #[test]
    fn styled_text_rows() {
        let tabular = normalize(&sample_raw());
        let row = &tabular.sheets.styled_text[0];
        assert_eq!(row.page_number, 1);
        assert_eq!(row.text, "Visit 1");
        assert_eq!(row.font, "Helvetica");
        assert_eq!(row.font_size, "9.5");
        assert_eq!(row.font_color, "#000000");
        assert_eq!(row.position, "[72, 700.123, 140.5, 712]");
    }

    #[test]
    fn bookmark_rows_pass_through() {
        let tabular = normalize(&sample_raw());
        let row = &tabular.sheets.bookmarks[0];
        assert_eq!(row.level, 1);
        assert_eq!(row.title, "Demographics");
        assert_eq!(row.page, 2);
    }

    #[test]
    fn normalize_is_pure() {
        let raw = sample_raw();
        assert_eq!(normalize(&raw), normalize(&raw));
    }

    #[test]
    fn number_list_formats() {
        assert_eq!(number_list(&[1.0, 0.0, 0.0]), "[1, 0, 0]");
        assert_eq!(number_list(&[0.25, 2.5]), "[0.25, 2.5]");
        assert_eq!(number_list(&[]), "[]");
    }
}
