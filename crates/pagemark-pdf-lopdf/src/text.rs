//! Text and styled-span extraction from page content streams.
//!
//! A conservative operator walk, not a full renderer: it tracks the
//! text object state (`BT`/`ET`), the selected font and size (`Tf`),
//! the fill color (`rg`/`g`/`k`) and the text cursor (`Td`/`TD`/`Tm`/
//! `T*`), and collects the strings shown by `Tj`/`TJ`/`'`/`"`. Span
//! bounding boxes are estimated from the cursor and font size.

use std::collections::HashMap;

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId};

use pagemark_core::backend::{BlockKind, ReaderError, SpanProps, TextBlock, TextLine};

use crate::strings;

/// Structured text: one block per `BT`..`ET` text object.
pub(crate) fn page_text_blocks(
    doc: &Document,
    page_id: ObjectId,
) -> Result<Vec<TextBlock>, ReaderError> {
    let content_bytes = doc
        .get_page_content(page_id)
        .map_err(|e| ReaderError::PageError(format!("failed to read page content: {e}")))?;
    let content = Content::decode(&content_bytes)
        .map_err(|e| ReaderError::PageError(format!("invalid content stream: {e}")))?;
    let fonts = page_fonts(doc, page_id);
    Ok(walk_operations(&content.operations, &fonts))
}

/// Plain text: the same walk flattened to newline-joined lines.
pub(crate) fn page_plain_text(doc: &Document, page_id: ObjectId) -> Result<String, ReaderError> {
    let blocks = page_text_blocks(doc, page_id)?;
    let mut lines = Vec::new();
    for block in &blocks {
        for line in &block.lines {
            let text: String = line
                .spans
                .iter()
                .filter_map(|span| span.text.as_deref())
                .collect::<Vec<_>>()
                .join(" ");
            lines.push(text);
        }
    }
    Ok(lines.join("\n"))
}

#[derive(Default)]
struct TextCursor {
    font: Option<String>,
    size: Option<f64>,
    color: u32,
    x: f64,
    y: f64,
    leading: f64,
}

struct Walker<'a> {
    fonts: &'a HashMap<String, String>,
    blocks: Vec<TextBlock>,
    lines: Vec<TextLine>,
    spans: Vec<SpanProps>,
    cursor: TextCursor,
    in_text: bool,
}

pub(crate) fn walk_operations(
    operations: &[Operation],
    fonts: &HashMap<String, String>,
) -> Vec<TextBlock> {
    let mut walker = Walker {
        fonts,
        blocks: Vec::new(),
        lines: Vec::new(),
        spans: Vec::new(),
        cursor: TextCursor::default(),
        in_text: false,
    };
    for operation in operations {
        walker.handle(operation);
    }
    // Tolerate a stream that ends without a closing ET.
    walker.flush_block();
    walker.blocks
}

impl Walker<'_> {
    fn handle(&mut self, operation: &Operation) {
        let operands = &operation.operands;
        match operation.operator.as_str() {
            "BT" => {
                self.in_text = true;
                self.cursor.x = 0.0;
                self.cursor.y = 0.0;
            }
            "ET" => {
                self.flush_block();
                self.in_text = false;
            }
            "Tf" => {
                if let Some(Object::Name(resource)) = operands.first() {
                    let key = String::from_utf8_lossy(resource).into_owned();
                    self.cursor.font =
                        Some(self.fonts.get(&key).cloned().unwrap_or(key));
                }
                self.cursor.size = operands.get(1).and_then(strings::number_value);
            }
            "TL" => {
                if let Some(leading) = operands.first().and_then(strings::number_value) {
                    self.cursor.leading = leading;
                }
            }
            "Tm" => {
                let x = operands.get(4).and_then(strings::number_value);
                let y = operands.get(5).and_then(strings::number_value);
                if let (Some(x), Some(y)) = (x, y) {
                    if y != self.cursor.y {
                        self.flush_line();
                    }
                    self.cursor.x = x;
                    self.cursor.y = y;
                }
            }
            "Td" | "TD" => {
                let tx = operands.first().and_then(strings::number_value).unwrap_or(0.0);
                let ty = operands.get(1).and_then(strings::number_value).unwrap_or(0.0);
                if operation.operator == "TD" {
                    self.cursor.leading = -ty;
                }
                if ty != 0.0 {
                    self.flush_line();
                }
                self.cursor.x += tx;
                self.cursor.y += ty;
            }
            "T*" => {
                self.flush_line();
                self.cursor.y -= self.cursor.leading;
            }
            "Tj" => {
                if let Some(Object::String(bytes, _)) = operands.first() {
                    self.show_text(strings::decode_string(bytes));
                }
            }
            "'" => {
                self.flush_line();
                self.cursor.y -= self.cursor.leading;
                if let Some(Object::String(bytes, _)) = operands.first() {
                    self.show_text(strings::decode_string(bytes));
                }
            }
            "\"" => {
                self.flush_line();
                self.cursor.y -= self.cursor.leading;
                if let Some(Object::String(bytes, _)) = operands.get(2) {
                    self.show_text(strings::decode_string(bytes));
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operands.first() {
                    let mut run = String::new();
                    for item in items {
                        match item {
                            Object::String(bytes, _) => run.push_str(&strings::decode_string(bytes)),
                            // Kerning adjustment, thousandths of an em.
                            other => {
                                if let Some(kern) = strings::number_value(other) {
                                    let size = self.cursor.size.unwrap_or(0.0);
                                    self.cursor.x -= kern / 1000.0 * size;
                                }
                            }
                        }
                    }
                    self.show_text(run);
                }
            }
            "rg" => {
                let components: Vec<f64> = operands
                    .iter()
                    .filter_map(strings::number_value)
                    .collect();
                if components.len() == 3 {
                    self.cursor.color =
                        pack_rgb(components[0], components[1], components[2]);
                }
            }
            "g" => {
                if let Some(gray) = operands.first().and_then(strings::number_value) {
                    self.cursor.color = pack_rgb(gray, gray, gray);
                }
            }
            "k" => {
                let parts: Vec<f64> = operands
                    .iter()
                    .filter_map(strings::number_value)
                    .collect();
                if parts.len() == 4 {
                    let (c, m, y, k) = (parts[0], parts[1], parts[2], parts[3]);
                    self.cursor.color = pack_rgb(
                        (1.0 - c) * (1.0 - k),
                        (1.0 - m) * (1.0 - k),
                        (1.0 - y) * (1.0 - k),
                    );
                }
            }
            _ => {}
        }
    }

    fn show_text(&mut self, text: String) {
        if !self.in_text || text.is_empty() {
            return;
        }
        let size = self.cursor.size.unwrap_or(0.0);
        // Rough advance: half an em per character.
        let width = text.chars().count() as f64 * size * 0.5;
        let bbox = [
            self.cursor.x,
            self.cursor.y,
            self.cursor.x + width,
            self.cursor.y + size,
        ];
        self.spans.push(SpanProps {
            text: Some(text),
            font: self.cursor.font.clone(),
            size: self.cursor.size,
            color: Some(self.cursor.color),
            bbox: Some(bbox),
        });
        self.cursor.x += width;
    }

    fn flush_line(&mut self) {
        if !self.spans.is_empty() {
            let spans = std::mem::take(&mut self.spans);
            self.lines.push(TextLine { spans });
        }
    }

    fn flush_block(&mut self) {
        self.flush_line();
        if !self.lines.is_empty() {
            let lines = std::mem::take(&mut self.lines);
            self.blocks.push(TextBlock {
                kind: BlockKind::Text,
                lines,
            });
        }
    }
}

fn pack_rgb(r: f64, g: f64, b: f64) -> u32 {
    let channel = |c: f64| -> u32 { (c * 255.0).clamp(0.0, 255.0) as u32 };
    (channel(r) << 16) | (channel(g) << 8) | channel(b)
}

/// Map font resource names (e.g. "F1") to base font names, resources
/// inherited through the page tree, subset prefixes stripped.
fn page_fonts(doc: &Document, page_id: ObjectId) -> HashMap<String, String> {
    let mut fonts = HashMap::new();
    let Some(resources_obj) = resolve_inherited(doc, page_id, b"Resources") else {
        return fonts;
    };
    let Ok(resources) = strings::resolve(doc, resources_obj).as_dict() else {
        return fonts;
    };
    let Ok(font_dict_obj) = resources.get(b"Font") else {
        return fonts;
    };
    let Ok(font_dict) = strings::resolve(doc, font_dict_obj).as_dict() else {
        return fonts;
    };
    for (key, value) in font_dict.iter() {
        let resource = String::from_utf8_lossy(key.as_ref()).into_owned();
        if let Ok(font) = strings::resolve(doc, value).as_dict() {
            if let Some(base) = base_font_name(doc, font) {
                fonts.insert(resource, base);
            }
        }
    }
    fonts
}

fn base_font_name(doc: &Document, font: &Dictionary) -> Option<String> {
    match strings::resolve(doc, font.get(b"BaseFont").ok()?) {
        Object::Name(name) => {
            let name = String::from_utf8_lossy(name).into_owned();
            Some(strip_subset_prefix(&name).to_string())
        }
        _ => None,
    }
}

/// Subsetted fonts carry an "ABCDEF+" tag before the real name.
fn strip_subset_prefix(name: &str) -> &str {
    match name.split_once('+') {
        Some((prefix, rest))
            if prefix.len() == 6 && prefix.chars().all(|c| c.is_ascii_uppercase()) =>
        {
            rest
        }
        _ => name,
    }
}

/// Walk up the page tree through `/Parent` for an inheritable key.
fn resolve_inherited<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Option<&'a Object> {
    let mut current = page_id;
    // Depth guard against cyclic page trees.
    for _ in 0..32 {
        let dict = doc.get_object(current).and_then(|o| o.as_dict()).ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(value);
        }
        match dict.get(b"Parent") {
            Ok(Object::Reference(parent)) => current = *parent,
            _ => return None,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::StringFormat;

    fn op(operator: &str, operands: Vec<Object>) -> Operation {
        Operation::new(operator, operands)
    }

    fn literal(text: &str) -> Object {
        Object::String(text.as_bytes().to_vec(), StringFormat::Literal)
    }

    fn helvetica_fonts() -> HashMap<String, String> {
        let mut fonts = HashMap::new();
        fonts.insert("F1".to_string(), "Helvetica".to_string());
        fonts
    }

    #[test]
    fn simple_text_object() {
        let fonts = helvetica_fonts();
        let operations = vec![
            op("BT", vec![]),
            op("Tf", vec![Object::Name(b"F1".to_vec()), 12.into()]),
            op("rg", vec![Object::Real(1.0), Object::Real(0.0), Object::Real(0.0)]),
            op("Td", vec![72.into(), 700.into()]),
            op("Tj", vec![literal("Subject ID")]),
            op("ET", vec![]),
        ];
        let blocks = walk_operations(&operations, &fonts);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].kind, BlockKind::Text);
        let span = &blocks[0].lines[0].spans[0];
        assert_eq!(span.text.as_deref(), Some("Subject ID"));
        assert_eq!(span.font.as_deref(), Some("Helvetica"));
        assert_eq!(span.size, Some(12.0));
        assert_eq!(span.color, Some(0xFF0000));
        let bbox = span.bbox.unwrap();
        assert_eq!(bbox[0], 72.0);
        assert_eq!(bbox[1], 700.0);
    }

    #[test]
    fn vertical_moves_split_lines() {
        let fonts = helvetica_fonts();
        let operations = vec![
            op("BT", vec![]),
            op("Tf", vec![Object::Name(b"F1".to_vec()), 10.into()]),
            op("Tj", vec![literal("first")]),
            op("Td", vec![0.into(), Object::Integer(-12)]),
            op("Tj", vec![literal("second")]),
            op("ET", vec![]),
        ];
        let blocks = walk_operations(&operations, &fonts);
        assert_eq!(blocks[0].lines.len(), 2);
    }

    #[test]
    fn tj_array_concatenates_strings() {
        let fonts = HashMap::new();
        let operations = vec![
            op("BT", vec![]),
            op(
                "TJ",
                vec![Object::Array(vec![
                    literal("Vis"),
                    Object::Integer(-20),
                    literal("it 1"),
                ])],
            ),
            op("ET", vec![]),
        ];
        let blocks = walk_operations(&operations, &fonts);
        let span = &blocks[0].lines[0].spans[0];
        assert_eq!(span.text.as_deref(), Some("Visit 1"));
    }

    #[test]
    fn unknown_font_resource_keeps_its_key() {
        let fonts = HashMap::new();
        let operations = vec![
            op("BT", vec![]),
            op("Tf", vec![Object::Name(b"F9".to_vec()), 8.into()]),
            op("Tj", vec![literal("x")]),
            op("ET", vec![]),
        ];
        let blocks = walk_operations(&operations, &fonts);
        assert_eq!(blocks[0].lines[0].spans[0].font.as_deref(), Some("F9"));
    }

    #[test]
    fn text_outside_bt_is_ignored_and_missing_et_tolerated() {
        let fonts = HashMap::new();
        let operations = vec![
            op("Tj", vec![literal("stray")]),
            op("BT", vec![]),
            op("Tj", vec![literal("kept")]),
        ];
        let blocks = walk_operations(&operations, &fonts);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].lines[0].spans[0].text.as_deref(), Some("kept"));
    }

    #[test]
    fn gray_and_cmyk_colors_pack() {
        let fonts = HashMap::new();
        let operations = vec![
            op("BT", vec![]),
            op("g", vec![Object::Real(0.0)]),
            op("Tj", vec![literal("black")]),
            op("k", vec![
                Object::Real(1.0),
                Object::Real(0.0),
                Object::Real(0.0),
                Object::Real(0.0),
            ]),
            op("Tj", vec![literal("cyan")]),
            op("ET", vec![]),
        ];
        let blocks = walk_operations(&operations, &fonts);
        let spans = &blocks[0].lines[0].spans;
        assert_eq!(spans[0].color, Some(0x000000));
        assert_eq!(spans[1].color, Some(0x00FFFF));
    }

    #[test]
    fn subset_prefixes_strip() {
        assert_eq!(strip_subset_prefix("ABCDEF+Calibri"), "Calibri");
        assert_eq!(strip_subset_prefix("Calibri"), "Calibri");
        assert_eq!(strip_subset_prefix("AB+Calibri"), "AB+Calibri");
    }
}
