//! Shared helpers for walking lopdf objects.

use lopdf::{Dictionary, Document, Object};

/// Follow an indirect reference to its target object. An unresolvable
/// reference falls back to the reference object itself, which then
/// fails the caller's type check instead of panicking.
pub(crate) fn resolve<'a>(doc: &'a Document, object: &'a Object) -> &'a Object {
    match object {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(object),
        other => other,
    }
}

/// Decode a PDF string: UTF-16BE when BOM-prefixed, otherwise UTF-8
/// with a Latin-1 fallback for odd bytes.
pub(crate) fn decode_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks(2)
            .filter(|chunk| chunk.len() == 2)
            .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        match std::str::from_utf8(bytes) {
            Ok(text) => text.to_string(),
            Err(_) => bytes.iter().map(|&b| b as char).collect(),
        }
    }
}

/// A string-or-name value from an object, reference-resolved.
pub(crate) fn string_value(doc: &Document, object: &Object) -> Option<String> {
    match resolve(doc, object) {
        Object::String(bytes, _) => Some(decode_string(bytes)),
        Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
        _ => None,
    }
}

/// Look up a string-valued key in a dictionary.
pub(crate) fn dict_string(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<String> {
    dict.get(key).ok().and_then(|object| string_value(doc, object))
}

pub(crate) fn number_value(object: &Object) -> Option<f64> {
    match object {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(f) => Some(f64::from(*f)),
        _ => None,
    }
}

pub(crate) fn int_value(object: &Object) -> Option<i64> {
    match object {
        Object::Integer(i) => Some(*i),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf16_bom_strings_decode() {
        // "Ab" in UTF-16BE with BOM
        let bytes = [0xFE, 0xFF, 0x00, 0x41, 0x00, 0x62];
        assert_eq!(decode_string(&bytes), "Ab");
    }

    #[test]
    fn utf8_passes_through() {
        assert_eq!(decode_string("héllo".as_bytes()), "héllo");
    }

    #[test]
    fn invalid_utf8_falls_back_to_latin1() {
        assert_eq!(decode_string(&[0x41, 0xE9, 0x42]), "AéB");
    }

    #[test]
    fn numbers_from_either_numeric_kind() {
        assert_eq!(number_value(&Object::Integer(3)), Some(3.0));
        assert_eq!(number_value(&Object::Real(2.5)), Some(2.5));
        assert_eq!(number_value(&Object::Null), None);
    }
}
