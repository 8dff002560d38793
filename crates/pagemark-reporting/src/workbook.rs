//! Multi-sheet spreadsheet report.
//!
//! Every populated sheet gets the same treatment: bold white-on-blue
//! header row, wrapped and centered cells, thin borders, an autofilter
//! over the used range, a frozen header row, auto-sized column widths
//! capped at 50 characters, and a fixed zoom level.

use std::path::Path;

use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, XlsxError};
use thiserror::Error;

use pagemark_core::tabular::{
    TabularDocument, ANNOTATION_HEADERS, BOOKMARK_HEADERS, PAGE_HEADERS, STYLED_TEXT_HEADERS,
    SUMMARY_HEADERS,
};

use crate::clean::sanitize_cell;

const HEADER_FILL: u32 = 0x1F4E78;
const MAX_COLUMN_WIDTH: usize = 50;
const SHEET_ZOOM: u16 = 85;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("spreadsheet error: {0}")]
    Xlsx(#[from] XlsxError),
}

/// One sheet's worth of report content, in creation order.
struct SheetPlan {
    name: &'static str,
    headers: &'static [&'static str],
    rows: Vec<Vec<String>>,
}

/// Lay out the sheets for a normalized record set. Summary is always
/// present; the data sheets appear only when they have rows.
fn plan_sheets(tabular: &TabularDocument) -> Vec<SheetPlan> {
    let mut plans = vec![SheetPlan {
        name: "Summary",
        headers: &SUMMARY_HEADERS,
        rows: tabular
            .summary
            .components
            .iter()
            .map(|c| vec![c.component.clone(), c.count.to_string()])
            .collect(),
    }];

    if !tabular.sheets.annotations.is_empty() {
        plans.push(SheetPlan {
            name: "Annotations",
            headers: &ANNOTATION_HEADERS,
            rows: tabular.sheets.annotations.iter().map(|r| r.cells()).collect(),
        });
    }
    if !tabular.sheets.bookmarks.is_empty() {
        plans.push(SheetPlan {
            name: "Bookmarks",
            headers: &BOOKMARK_HEADERS,
            rows: tabular.sheets.bookmarks.iter().map(|r| r.cells()).collect(),
        });
    }
    if !tabular.sheets.pages.is_empty() {
        plans.push(SheetPlan {
            name: "Pages",
            headers: &PAGE_HEADERS,
            rows: tabular.sheets.pages.iter().map(|r| r.cells()).collect(),
        });
    }
    if !tabular.sheets.styled_text.is_empty() {
        plans.push(SheetPlan {
            name: "Styled Text",
            headers: &STYLED_TEXT_HEADERS,
            rows: tabular.sheets.styled_text.iter().map(|r| r.cells()).collect(),
        });
    }

    plans
}

/// Column widths: the longest cell (headers included) plus padding,
/// capped at [`MAX_COLUMN_WIDTH`].
fn column_widths(headers: &[&str], rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (col, value) in row.iter().enumerate() {
            if col < widths.len() {
                widths[col] = widths[col].max(value.chars().count());
            }
        }
    }
    widths
        .into_iter()
        .map(|w| (w + 2).min(MAX_COLUMN_WIDTH))
        .collect()
}

/// Write the report workbook to `path`. A write failure is logged and
/// propagated; this is the one stage failure the pipeline re-signals.
pub fn write_report(tabular: &TabularDocument, path: &Path) -> Result<(), ReportError> {
    let header_format = Format::new()
        .set_bold()
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(HEADER_FILL))
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
        .set_text_wrap()
        .set_border(FormatBorder::Thin);
    let data_format = Format::new()
        .set_align(FormatAlign::VerticalCenter)
        .set_text_wrap()
        .set_border(FormatBorder::Thin);

    let mut workbook = Workbook::new();

    for plan in plan_sheets(tabular) {
        let sheet = workbook.add_worksheet();
        sheet.set_name(plan.name)?;

        for (col, header) in plan.headers.iter().enumerate() {
            sheet.write_string_with_format(0, col as u16, *header, &header_format)?;
        }

        // Defensive re-clean of every cell on the way out.
        let rows: Vec<Vec<String>> = plan
            .rows
            .iter()
            .map(|row| row.iter().map(|value| sanitize_cell(value)).collect())
            .collect();
        for (row_index, row) in rows.iter().enumerate() {
            for (col, value) in row.iter().enumerate() {
                sheet.write_string_with_format(
                    row_index as u32 + 1,
                    col as u16,
                    value,
                    &data_format,
                )?;
            }
        }

        for (col, width) in column_widths(plan.headers, &rows).iter().enumerate() {
            sheet.set_column_width(col as u16, *width as f64)?;
        }

        let last_row = rows.len() as u32;
        let last_col = (plan.headers.len() - 1) as u16;
        sheet.autofilter(0, 0, last_row, last_col)?;
        sheet.set_freeze_panes(1, 0)?;
        sheet.set_zoom(SHEET_ZOOM);
    }

    match workbook.save(path) {
        Ok(()) => {
            tracing::info!(path = %path.display(), "saved spreadsheet report");
            Ok(())
        }
        Err(err) => {
            tracing::error!(path = %path.display(), error = %err, "failed to save spreadsheet");
            Err(err.into())
        }
    }
}
