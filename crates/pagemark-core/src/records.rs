//! The raw record set produced by the extraction stage.
//!
//! Records are sparse: optional attributes that were absent, empty, or
//! unconvertible are `None` and are skipped during serialization, so
//! the persisted JSON carries only the fields a given annotation
//! actually had.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The extraction stage's sole output.
///
/// Invariant: `pages` has one entry per extracted page (empty-text
/// pages included) and every record's page number lies in
/// `[1, page_count]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawDocument {
    #[serde(default, deserialize_with = "lenient_outline_entries")]
    pub bookmarks: Vec<OutlineEntry>,
    #[serde(default)]
    pub pages: Vec<PageRecord>,
    #[serde(default)]
    pub annotations: Vec<AnnotationRecord>,
    #[serde(default)]
    pub styled_text: Vec<SpanRecord>,
}

/// One outline (bookmark) entry. Serialized as the ordered sequence
/// `[level, title, page]`, the shape document readers report the
/// table of contents in.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlineEntry {
    /// Nesting depth, 1-based.
    pub level: i64,
    pub title: String,
    /// Target page, 1-based. 0 when the destination did not resolve.
    pub page: i64,
}

impl Serialize for OutlineEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeSeq;
        let mut seq = serializer.serialize_seq(Some(3))?;
        seq.serialize_element(&self.level)?;
        seq.serialize_element(&self.title)?;
        seq.serialize_element(&self.page)?;
        seq.end()
    }
}

/// Accept only well-formed `[level, title, page, ...]` sequences;
/// shorter or differently-shaped entries are silently skipped. Expected
/// variability in document structure, not an error.
fn lenient_outline_entries<'de, D>(deserializer: D) -> Result<Vec<OutlineEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<serde_json::Value> = Vec::deserialize(deserializer)?;
    Ok(raw.iter().filter_map(outline_entry_from_value).collect())
}

fn outline_entry_from_value(value: &serde_json::Value) -> Option<OutlineEntry> {
    let items = value.as_array()?;
    if items.len() < 3 {
        return None;
    }
    Some(OutlineEntry {
        level: items[0].as_i64()?,
        title: items[1].as_str()?.to_string(),
        page: items[2].as_i64()?,
    })
}

/// Plain text of one page. Pages with no text stay in the raw set; the
/// normalizer filters them out of the sheet view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    pub page_number: u32,
    #[serde(default)]
    pub text: String,
}

/// One annotation, collected attribute by attribute.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationRecord {
    pub page_number: u32,
    /// Annotation subtype tag ("Highlight", "FreeText", ...).
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rect: Option<[f64; 4]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contents: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colors: Option<ColorPair>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border: Option<BorderStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub popup_rect: Option<[f64; 4]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vertices: Option<Vec<[f64; 2]>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_endpoints: Option<Vec<[f64; 2]>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quad_points: Option<Vec<[f64; 2]>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_open: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_model: Option<String>,
    /// Normalized to `YYYY-MM-DD HH:MM:SS`; absent if unparseable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modification_date: Option<String>,
    /// FreeText only, parsed from the default-appearance string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_color: Option<String>,
}

/// Stroke/fill color components as the reader supplied them (0–1
/// floats). A pair with neither side set is pruned from the record as
/// a unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorPair {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<Vec<f64>>,
}

impl ColorPair {
    pub fn is_empty(&self) -> bool {
        self.stroke.is_none() && self.fill.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BorderStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dashes: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clouds: Option<i64>,
}

impl BorderStyle {
    pub fn is_empty(&self) -> bool {
        self.width.is_none() && self.dashes.is_none() && self.style.is_none() && self.clouds.is_none()
    }
}

/// One styled run of text from a text block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpanRecord {
    pub page_number: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_color: Option<String>,
    /// `[x0, y0, x1, y1]`, rounded to 3 decimals.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbox: Option<[f64; 4]>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outline_entry_serializes_as_sequence() {
        let entry = OutlineEntry {
            level: 1,
            title: "Introduction".to_string(),
            page: 3,
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(json, r#"[1,"Introduction",3]"#);
    }

    #[test]
    fn malformed_outline_entries_are_skipped() {
        let json = r#"{
            "bookmarks": [[1, "Good", 2], [1], "bad", [2, 7, 3], [3, "Deep", 9, "extra"]],
            "pages": [], "annotations": [], "styled_text": []
        }"#;
        let raw: RawDocument = serde_json::from_str(json).unwrap();
        assert_eq!(raw.bookmarks.len(), 2);
        assert_eq!(raw.bookmarks[0].title, "Good");
        assert_eq!(raw.bookmarks[1].title, "Deep");
        assert_eq!(raw.bookmarks[1].page, 9);
    }

    #[test]
    fn sparse_annotation_omits_absent_fields() {
        let record = AnnotationRecord {
            page_number: 1,
            kind: "Highlight".to_string(),
            rect: Some([1.0, 2.0, 3.0, 4.0]),
            ..Default::default()
        };
        let json = serde_json::to_value(&record).unwrap();
        let object = json.as_object().unwrap();
        assert!(object.contains_key("rect"));
        assert!(!object.contains_key("colors"));
        assert!(!object.contains_key("opacity"));
        assert_eq!(object["type"], "Highlight");
    }

    #[test]
    fn raw_document_round_trips() {
        let raw = RawDocument {
            bookmarks: vec![OutlineEntry {
                level: 1,
                title: "Chapter".to_string(),
                page: 1,
            }],
            pages: vec![PageRecord {
                page_number: 1,
                text: "héllo — unicode".to_string(),
            }],
            annotations: vec![AnnotationRecord {
                page_number: 1,
                kind: "Square".to_string(),
                colors: Some(ColorPair {
                    stroke: Some(vec![1.0, 0.0, 0.0]),
                    fill: None,
                }),
                stroke_color: Some("#FF0000".to_string()),
                ..Default::default()
            }],
            styled_text: vec![SpanRecord {
                page_number: 1,
                text: Some("span".to_string()),
                font_color: Some("#000000".to_string()),
                ..Default::default()
            }],
        };
        let json = serde_json::to_string_pretty(&raw).unwrap();
        let back: RawDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(raw, back);
    }
}
