use serde_json::Value;

use crate::store::Document;
use crate::store::path::get_path;

/// Fields tried when none of the configured text fields hold any text.
pub const FALLBACK_TEXT_FIELDS: &[&str] = &["name", "remarks", "notes"];

/// Text used to embed a document.
///
/// Trimmed, non-empty string values of `text_fields` in order, one per line.
/// When none are present the [`FALLBACK_TEXT_FIELDS`] are used instead. May
/// return an empty string.
#[inline]
pub fn build_rag_text<S: AsRef<str>>(doc: &Document, text_fields: &[S]) -> String {
    let parts = text_parts(doc, text_fields.iter().map(AsRef::as_ref));
    if parts.is_empty() {
        text_parts(doc, FALLBACK_TEXT_FIELDS.iter().copied()).join("\n")
    } else {
        parts.join("\n")
    }
}

fn text_parts<'d, 'f>(doc: &'d Document, fields: impl Iterator<Item = &'f str>) -> Vec<&'d str> {
    fields
        .filter_map(|field| match get_path(doc, field) {
            Some(Value::String(text)) => Some(text.trim()),
            _ => None,
        })
        .filter(|text| !text.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TEXT_FIELDS: &[&str] = &["notes", "remarks", "description", "content"];

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("test documents must be objects"),
        }
    }

    #[test]
    fn joins_text_fields_in_configured_order() {
        let document = doc(json!({
            "content": "Wants a demo",
            "notes": "  Called twice  ",
            "remarks": "",
            "name": "Asha"
        }));
        assert_eq!(
            build_rag_text(&document, TEXT_FIELDS),
            "Called twice\nWants a demo"
        );
    }

    #[test]
    fn falls_back_to_name_when_no_text() {
        let document = doc(json!({"name": " Asha ", "description": 42, "notes": "   "}));
        assert_eq!(build_rag_text(&document, TEXT_FIELDS), "Asha");
    }

    #[test]
    fn dotted_text_fields_and_empty_result() {
        let document = doc(json!({"meta": {"summary": "Follow up Friday"}}));
        assert_eq!(build_rag_text(&document, &["meta.summary"]), "Follow up Friday");
        assert_eq!(build_rag_text(&doc(json!({"phone": "123"})), TEXT_FIELDS), "");
    }
}
