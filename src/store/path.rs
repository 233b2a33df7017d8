//! Dotted-path access into nested documents.

use serde_json::{Map, Value};

use super::{Document, ID_FIELD};

pub const PATH_SEPARATOR: char = '.';

/// Resolve a dotted field path against a document.
///
/// A key that literally contains the separator wins over descending into
/// nested mappings. Numeric segments index into arrays.
#[inline]
pub fn get_path<'a>(document: &'a Document, path: &str) -> Option<&'a Value> {
    if let Some(value) = document.get(path) {
        return Some(value);
    }

    let (head, rest) = path.split_once(PATH_SEPARATOR)?;
    let mut current = document.get(head)?;
    for segment in rest.split(PATH_SEPARATOR) {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Write `value` at a dotted path, creating intermediate mappings.
///
/// An intermediate that exists but is not a mapping is replaced.
#[inline]
pub fn set_path(document: &mut Document, path: &str, value: Value) {
    let mut segments = path.split(PATH_SEPARATOR).peekable();
    let mut current = document;

    while let Some(segment) = segments.next() {
        if segments.peek().is_none() {
            current.insert(segment.to_string(), value);
            return;
        }

        let slot = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        current = match slot {
            Value::Object(map) => map,
            _ => return,
        };
    }
}

/// Keep only the projected paths, in document order. The identifier is
/// always kept.
#[inline]
pub fn project<S: AsRef<str>>(document: &Document, paths: &[S]) -> Document {
    project_level(document, paths, true)
}

fn project_level<S: AsRef<str>>(document: &Document, paths: &[S], top_level: bool) -> Document {
    let mut projected = Map::new();

    for (key, value) in document {
        if (top_level && key == ID_FIELD) || paths.iter().any(|path| path.as_ref() == key.as_str())
        {
            projected.insert(key.clone(), value.clone());
            continue;
        }

        let Value::Object(nested) = value else {
            continue;
        };
        let sub_paths: Vec<&str> = paths
            .iter()
            .filter_map(|path| {
                path.as_ref()
                    .strip_prefix(key.as_str())
                    .and_then(|rest| rest.strip_prefix(PATH_SEPARATOR))
            })
            .collect();
        if sub_paths.is_empty() {
            continue;
        }

        let nested = project_level(nested, &sub_paths, false);
        if !nested.is_empty() {
            projected.insert(key.clone(), Value::Object(nested));
        }
    }

    projected
}
