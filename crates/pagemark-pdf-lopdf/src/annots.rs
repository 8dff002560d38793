//! Annotation extraction from the page `/Annots` array.
//!
//! Every dictionary key is read independently: annotations in the wild
//! carry arbitrary subsets of the optional entries, and a missing or
//! oddly-typed key must cost the record nothing but that one field.

use lopdf::{Dictionary, Document, Object, ObjectId};

use pagemark_core::backend::{AnnotationInfo, AnnotationProps, ReaderError};

use crate::strings;

pub(crate) fn annotation_properties(
    doc: &Document,
    page_id: ObjectId,
) -> Result<Vec<AnnotationProps>, ReaderError> {
    let page_dict = doc
        .get_object(page_id)
        .and_then(|object| object.as_dict())
        .map_err(|e| ReaderError::PageError(format!("failed to read page dictionary: {e}")))?;

    // No /Annots key means no annotations, not an error.
    let annots = match page_dict.get(b"Annots") {
        Ok(object) => strings::resolve(doc, object),
        Err(_) => return Ok(Vec::new()),
    };
    let entries = annots
        .as_array()
        .map_err(|e| ReaderError::PageError(format!("/Annots is not an array: {e}")))?;

    let mut properties = Vec::with_capacity(entries.len());
    for entry in entries {
        let Ok(dict) = strings::resolve(doc, entry).as_dict() else {
            continue;
        };
        properties.push(read_annotation(doc, dict));
    }
    Ok(properties)
}

fn read_annotation(doc: &Document, dict: &Dictionary) -> AnnotationProps {
    let (border_width, border_dashes, border_style) = border_entries(doc, dict);

    AnnotationProps {
        subtype: name_entry(doc, dict, b"Subtype"),
        rect: rect_entry(doc, dict.get(b"Rect").ok()),
        flags: int_entry(doc, dict, b"F"),
        contents: strings::dict_string(doc, dict, b"Contents"),
        // The object model keeps no extracted-text mirror of the
        // annotated region.
        text: None,
        stroke_components: float_array(doc, dict.get(b"C").ok()),
        fill_components: float_array(doc, dict.get(b"IC").ok()),
        opacity: number_entry(doc, dict, b"CA"),
        border_width,
        border_dashes,
        border_style,
        border_clouds: cloud_intensity(doc, dict),
        popup_rect: popup_rect(doc, dict),
        vertices: point_pairs(doc, dict.get(b"Vertices").ok()),
        line_endpoints: point_pairs(doc, dict.get(b"L").ok()),
        rotation: int_entry(doc, dict, b"Rotate"),
        quad_points: point_pairs(doc, dict.get(b"QuadPoints").ok()),
        is_open: bool_entry(doc, dict, b"Open"),
        info: Some(AnnotationInfo {
            title: strings::dict_string(doc, dict, b"T"),
            subject: strings::dict_string(doc, dict, b"Subj"),
            creator: strings::dict_string(doc, dict, b"Creator"),
            content: strings::dict_string(doc, dict, b"Contents"),
            name: name_entry(doc, dict, b"Name"),
            state: strings::dict_string(doc, dict, b"State"),
            state_model: strings::dict_string(doc, dict, b"StateModel"),
            creation_date: strings::dict_string(doc, dict, b"CreationDate"),
            modification_date: strings::dict_string(doc, dict, b"M"),
            default_appearance: strings::dict_string(doc, dict, b"DA"),
        }),
    }
}

fn name_entry(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<String> {
    match dict.get(key).ok().map(|object| strings::resolve(doc, object)) {
        Some(Object::Name(name)) => Some(String::from_utf8_lossy(name).into_owned()),
        _ => None,
    }
}

fn int_entry(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<i64> {
    dict.get(key)
        .ok()
        .and_then(|object| strings::int_value(strings::resolve(doc, object)))
}

fn number_entry(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<f64> {
    dict.get(key)
        .ok()
        .and_then(|object| strings::number_value(strings::resolve(doc, object)))
}

fn bool_entry(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<bool> {
    match dict.get(key).ok().map(|object| strings::resolve(doc, object)) {
        Some(Object::Boolean(value)) => Some(*value),
        _ => None,
    }
}

fn float_array(doc: &Document, object: Option<&Object>) -> Option<Vec<f64>> {
    let array = strings::resolve(doc, object?).as_array().ok()?;
    let values: Vec<f64> = array
        .iter()
        .filter_map(|item| strings::number_value(strings::resolve(doc, item)))
        .collect();
    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}

fn int_array(doc: &Document, object: Option<&Object>) -> Option<Vec<i64>> {
    let array = strings::resolve(doc, object?).as_array().ok()?;
    let values: Vec<i64> = array
        .iter()
        .filter_map(|item| strings::int_value(strings::resolve(doc, item)))
        .collect();
    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}

fn rect_entry(doc: &Document, object: Option<&Object>) -> Option<[f64; 4]> {
    let values = float_array(doc, object)?;
    if values.len() != 4 {
        return None;
    }
    Some([values[0], values[1], values[2], values[3]])
}

fn point_pairs(doc: &Document, object: Option<&Object>) -> Option<Vec<[f64; 2]>> {
    let values = float_array(doc, object)?;
    if values.len() < 2 {
        return None;
    }
    Some(values.chunks_exact(2).map(|pair| [pair[0], pair[1]]).collect())
}

/// `/BS` border-style dictionary: `/W` width, `/D` dash array, `/S`
/// style name.
fn border_entries(
    doc: &Document,
    dict: &Dictionary,
) -> (Option<f64>, Option<Vec<i64>>, Option<String>) {
    let style_dict = match dict.get(b"BS").ok().map(|object| strings::resolve(doc, object)) {
        Some(object) => match object.as_dict() {
            Ok(style) => style,
            Err(_) => return (None, None, None),
        },
        None => return (None, None, None),
    };
    (
        number_entry(doc, style_dict, b"W"),
        int_array(doc, style_dict.get(b"D").ok()),
        name_entry(doc, style_dict, b"S"),
    )
}

/// `/BE` border-effect dictionary: `/I` cloud intensity.
fn cloud_intensity(doc: &Document, dict: &Dictionary) -> Option<i64> {
    let effect = strings::resolve(doc, dict.get(b"BE").ok()?).as_dict().ok()?;
    int_entry(doc, effect, b"I")
}

/// Rectangle of the annotation's popup, resolved through `/Popup`.
fn popup_rect(doc: &Document, dict: &Dictionary) -> Option<[f64; 4]> {
    let popup = strings::resolve(doc, dict.get(b"Popup").ok()?).as_dict().ok()?;
    rect_entry(doc, popup.get(b"Rect").ok())
}
