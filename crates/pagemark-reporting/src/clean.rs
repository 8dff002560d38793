//! Cell sanitization for spreadsheet output.

/// Clean one cell value for safe tabular storage: strip null bytes and
/// carriage returns, and drop any leading `=` so the receiving
/// spreadsheet application cannot evaluate the cell as a formula.
///
/// The guard applies to every string cell on every sheet, not just
/// position-like columns.
pub fn sanitize_cell(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .filter(|c| *c != '\u{0}' && *c != '\r')
        .collect();
    cleaned.trim_start_matches('=').to_string()
}
