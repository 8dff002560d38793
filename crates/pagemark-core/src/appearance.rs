//! Default-appearance string parsing for FreeText annotations.
//!
//! The appearance string is a content-stream fragment. Only two
//! directives matter here:
//!
//! ```text
//! /Name Size Tf     font name and size
//! r g b rg          fill color, components in 0–1
//! ```
//!
//! Either directive may be absent independently.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::color;

static FONT_DIRECTIVE: Lazy<Regex> = Lazy::new(|| Regex::new(r"/(\S+)\s+(\d+)\s+Tf").unwrap());
static FILL_DIRECTIVE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d*\.?\d+)\s+(\d*\.?\d+)\s+(\d*\.?\d+)\s+rg").unwrap());

/// Text styling recovered from a default-appearance string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextStyle {
    pub font_name: Option<String>,
    pub font_size: Option<u32>,
    pub font_color: Option<String>,
}

/// Parse an appearance string. Pure; unrecognized input yields a style
/// with every field unset.
pub fn parse_appearance(appearance: &str) -> TextStyle {
    let mut style = TextStyle::default();

    if let Some(caps) = FONT_DIRECTIVE.captures(appearance) {
        style.font_name = Some(caps[1].to_string());
        style.font_size = caps[2].parse().ok();
    }

    if let Some(caps) = FILL_DIRECTIVE.captures(appearance) {
        let components: Vec<f64> = (1..=3).filter_map(|i| caps[i].parse().ok()).collect();
        style.font_color = color::hex_from_components(&components);
    }

    style
}
