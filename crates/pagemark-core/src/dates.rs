//! PDF date normalization.
//!
//! Documents carry dates in the PDF form `D:YYYYMMDDHHmmSS` with an
//! optional timezone suffix, but annotation tools produce plenty of
//! variants, including stray quote-escaped two-digit tokens. Parsing
//! here is best-effort: strict grammar first, a relaxed multi-format
//! pass second, `None` on total failure. This function never errors
//! out of the caller.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

/// Display format for normalized dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The PDF convention for "no date set".
const ZERO_SENTINELS: [&str; 2] = ["00000000000000Z", "D:00000000000000Z"];

static QUOTED_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"'(\d{2})'").unwrap());
static TZ_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[Zz+\-](\d{2}('\d{2}'?)?)?$").unwrap());

/// Parse a PDF-native date string into a calendar date-time.
///
/// Empty input and the all-zero sentinel mean "no date" and return
/// `None` without logging; unparseable input is logged at debug level
/// and also returns `None`.
pub fn parse_pdf_date(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || ZERO_SENTINELS.contains(&trimmed) {
        return None;
    }

    if let Some(parsed) = parse_strict(trimmed) {
        return Some(parsed);
    }

    let stripped = trimmed.strip_prefix("D:").unwrap_or(trimmed);
    let rewritten = QUOTED_TOKEN.replace_all(stripped, "$1");
    match parse_relaxed(&rewritten) {
        Some(parsed) => Some(parsed),
        None => {
            tracing::debug!(date = raw, "failed to parse date");
            None
        }
    }
}

/// Format a parsed date for record storage.
pub fn format_date(date: &NaiveDateTime) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// The strict PDF date grammar: `D:` prefix optional, then `YYYY` and
/// up to five two-digit fields (month and day default to 1, the time
/// fields to 0), then an optional timezone suffix. The offset is
/// validated but not applied; the recorded date keeps the components
/// as written.
fn parse_strict(value: &str) -> Option<NaiveDateTime> {
    let body = value.strip_prefix("D:").unwrap_or(value);
    let digits: String = body.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.len() < 4 || digits.len() > 14 || digits.len() % 2 != 0 {
        return None;
    }
    let rest = &body[digits.len()..];
    if !(rest.is_empty() || TZ_SUFFIX.is_match(rest)) {
        return None;
    }

    let field = |from: usize, to: usize, default: u32| -> Option<u32> {
        match digits.get(from..to) {
            Some(part) => part.parse().ok(),
            None => Some(default),
        }
    };
    let year: i32 = digits[0..4].parse().ok()?;
    let month = field(4, 6, 1)?;
    let day = field(6, 8, 1)?;
    let hour = field(8, 10, 0)?;
    let minute = field(10, 12, 0)?;
    let second = field(12, 14, 0)?;

    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)
}

/// Fallback for the malformed variants annotation tools emit. Tried in
/// order: offset-bearing datetimes, plain datetimes, plain dates.
fn parse_relaxed(value: &str) -> Option<NaiveDateTime> {
    for format in ["%Y%m%d%H%M%S%z", "%Y-%m-%dT%H:%M:%S%z"] {
        if let Ok(parsed) = DateTime::parse_from_str(value, format) {
            return Some(parsed.naive_local());
        }
    }

    let bare = value.trim_end_matches(|c| c == 'Z' || c == 'z');
    for format in [
        "%Y%m%d%H%M%S",
        "%Y%m%d%H%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
    ] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(bare, format) {
            return Some(parsed);
        }
    }
    for format in ["%Y%m%d", "%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%B %d, %Y"] {
        if let Ok(parsed) = NaiveDate::parse_from_str(bare, format) {
            return parsed.and_hms_opt(0, 0, 0);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn formatted(raw: &str) -> Option<String> {
        parse_pdf_date(raw).map(|d| format_date(&d))
    }

    #[test]
    fn empty_and_sentinel_are_no_date() {
        assert_eq!(parse_pdf_date(""), None);
        assert_eq!(parse_pdf_date("   "), None);
        assert_eq!(parse_pdf_date("00000000000000Z"), None);
        assert_eq!(parse_pdf_date("D:00000000000000Z"), None);
    }

    #[test]
    fn strict_grammar_full_timestamp() {
        assert_eq!(
            formatted("D:20240115103000Z").as_deref(),
            Some("2024-01-15 10:30:00")
        );
        assert_eq!(
            formatted("20240115103000").as_deref(),
            Some("2024-01-15 10:30:00")
        );
    }

    #[test]
    fn strict_grammar_offset_suffix() {
        assert_eq!(
            formatted("D:20240115103000+05'30'").as_deref(),
            Some("2024-01-15 10:30:00")
        );
        assert_eq!(
            formatted("D:20240115103000-08'00").as_deref(),
            Some("2024-01-15 10:30:00")
        );
    }

    #[test]
    fn strict_grammar_truncated_fields_default() {
        assert_eq!(formatted("D:2024").as_deref(), Some("2024-01-01 00:00:00"));
        assert_eq!(
            formatted("D:202406").as_deref(),
            Some("2024-06-01 00:00:00")
        );
        assert_eq!(
            formatted("D:20240607").as_deref(),
            Some("2024-06-07 00:00:00")
        );
    }

    #[test]
    fn quoted_tokens_are_rewritten_for_fallback() {
        // Bare offset digits only parse once '05'30'' becomes '0530'.
        assert_eq!(
            formatted("garbage").as_deref(),
            None,
        );
        assert_eq!(
            formatted("D:20240115T103000").as_deref(),
            None,
        );
        assert_eq!(
            formatted("2024-01-15T10:30:00+05'30'").as_deref(),
            Some("2024-01-15 10:30:00")
        );
    }

    #[test]
    fn relaxed_formats_cover_common_variants() {
        assert_eq!(
            formatted("2024-01-15 10:30:00").as_deref(),
            Some("2024-01-15 10:30:00")
        );
        assert_eq!(
            formatted("2024/01/15 10:30:00").as_deref(),
            Some("2024-01-15 10:30:00")
        );
        assert_eq!(
            formatted("2024-01-15").as_deref(),
            Some("2024-01-15 00:00:00")
        );
        assert_eq!(
            formatted("15/01/2024").as_deref(),
            Some("2024-01-15 00:00:00")
        );
    }

    #[test]
    fn invalid_calendar_values_fail_quietly() {
        assert_eq!(parse_pdf_date("D:20241345000000"), None);
        assert_eq!(parse_pdf_date("D:20240230103000"), None);
        assert_eq!(parse_pdf_date("not a date"), None);
    }
}
