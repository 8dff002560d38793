//! The spreadsheet-ready record set produced by the normalization
//! stage.
//!
//! Row structs serialize under the exact column-header names the
//! report sheets use. Apart from the guaranteed integers (page
//! numbers, outline levels, counts) every field is a presentational
//! string with `""` standing in for an absent value.

use serde::{Deserialize, Serialize};

pub const SUMMARY_HEADERS: [&str; 2] = ["Component", "Count"];

/// The 17 fixed annotation columns. `flags` and `Flags` both exist and
/// carry the same value; the report format inherited the pair and
/// downstream consumers key on both.
pub const ANNOTATION_HEADERS: [&str; 17] = [
    "Page Number",
    "Annotation Type",
    "Content",
    "Position",
    "flags",
    "colors stroke",
    "colors fill",
    "Stroke Color",
    "Opacity",
    "Border Width",
    "Border Dashes",
    "Border Style",
    "Border Clouds",
    "Rotation",
    "Flags",
    "Is Open",
    "Popup Rectangle",
];

pub const BOOKMARK_HEADERS: [&str; 3] = ["Level", "Title", "Page"];

pub const PAGE_HEADERS: [&str; 2] = ["Page Number", "Text"];

pub const STYLED_TEXT_HEADERS: [&str; 6] = [
    "Page Number",
    "Text",
    "Font",
    "Font Size",
    "Font Color",
    "Position",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TabularDocument {
    pub summary: Summary,
    pub sheets: SheetSet,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub components: Vec<ComponentCount>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentCount {
    #[serde(rename = "Component")]
    pub component: String,
    #[serde(rename = "Count")]
    pub count: usize,
}

impl ComponentCount {
    pub fn new(component: &str, count: usize) -> Self {
        Self {
            component: component.to_string(),
            count,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SheetSet {
    #[serde(default)]
    pub annotations: Vec<AnnotationRow>,
    #[serde(default)]
    pub bookmarks: Vec<BookmarkRow>,
    #[serde(default)]
    pub pages: Vec<PageRow>,
    #[serde(default)]
    pub styled_text: Vec<SpanRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationRow {
    #[serde(rename = "Page Number")]
    pub page_number: u32,
    #[serde(rename = "Annotation Type")]
    pub kind: String,
    #[serde(rename = "Content")]
    pub content: String,
    #[serde(rename = "Position")]
    pub position: String,
    #[serde(rename = "flags")]
    pub flags_lower: String,
    #[serde(rename = "colors stroke")]
    pub colors_stroke: String,
    #[serde(rename = "colors fill")]
    pub colors_fill: String,
    #[serde(rename = "Stroke Color")]
    pub stroke_color: String,
    #[serde(rename = "Opacity")]
    pub opacity: String,
    #[serde(rename = "Border Width")]
    pub border_width: String,
    #[serde(rename = "Border Dashes")]
    pub border_dashes: String,
    #[serde(rename = "Border Style")]
    pub border_style: String,
    #[serde(rename = "Border Clouds")]
    pub border_clouds: String,
    #[serde(rename = "Rotation")]
    pub rotation: String,
    #[serde(rename = "Flags")]
    pub flags: String,
    #[serde(rename = "Is Open")]
    pub is_open: String,
    #[serde(rename = "Popup Rectangle")]
    pub popup_rect: String,
}

impl AnnotationRow {
    /// Cell values in [`ANNOTATION_HEADERS`] order.
    pub fn cells(&self) -> Vec<String> {
        vec![
            self.page_number.to_string(),
            self.kind.clone(),
            self.content.clone(),
            self.position.clone(),
            self.flags_lower.clone(),
            self.colors_stroke.clone(),
            self.colors_fill.clone(),
            self.stroke_color.clone(),
            self.opacity.clone(),
            self.border_width.clone(),
            self.border_dashes.clone(),
            self.border_style.clone(),
            self.border_clouds.clone(),
            self.rotation.clone(),
            self.flags.clone(),
            self.is_open.clone(),
            self.popup_rect.clone(),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookmarkRow {
    #[serde(rename = "Level")]
    pub level: i64,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Page")]
    pub page: i64,
}

impl BookmarkRow {
    pub fn cells(&self) -> Vec<String> {
        vec![
            self.level.to_string(),
            self.title.clone(),
            self.page.to_string(),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageRow {
    #[serde(rename = "Page Number")]
    pub page_number: u32,
    #[serde(rename = "Text")]
    pub text: String,
}

impl PageRow {
    pub fn cells(&self) -> Vec<String> {
        vec![self.page_number.to_string(), self.text.clone()]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpanRow {
    #[serde(rename = "Page Number")]
    pub page_number: u32,
    #[serde(rename = "Text")]
    pub text: String,
    #[serde(rename = "Font")]
    pub font: String,
    #[serde(rename = "Font Size")]
    pub font_size: String,
    #[serde(rename = "Font Color")]
    pub font_color: String,
    #[serde(rename = "Position")]
    pub position: String,
}

impl SpanRow {
    pub fn cells(&self) -> Vec<String> {
        vec![
            self.page_number.to_string(),
            self.text.clone(),
            self.font.clone(),
            self.font_size.clone(),
            self.font_color.clone(),
            self.position.clone(),
        ]
    }
}
