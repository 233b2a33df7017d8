use serde_json::Value;

use super::FlatRow;
use crate::store::Document;
use crate::store::path::{PATH_SEPARATOR, set_path};

/// Flatten nested mappings into dotted keys.
///
/// Only mappings are expanded; sequences (including sequences of mappings)
/// stay as a single leaf value. A nested mapping with no keys contributes no
/// columns. The input is left untouched.
#[inline]
pub fn flatten(document: &Document) -> FlatRow {
    let mut row = FlatRow::with_capacity(document.len());
    flatten_into(&mut row, None, document);
    row
}

fn flatten_into(row: &mut FlatRow, prefix: Option<&str>, document: &Document) {
    for (key, value) in document {
        let column = match prefix {
            Some(prefix) => format!("{}{}{}", prefix, PATH_SEPARATOR, key),
            None => key.clone(),
        };

        match value {
            Value::Object(nested) => flatten_into(row, Some(&column), nested),
            leaf => {
                row.insert(column, leaf.clone());
            }
        }
    }
}

/// Split dotted keys back into nested mappings.
#[inline]
pub fn unflatten(row: &FlatRow) -> Document {
    let mut document = Document::new();
    for (column, value) in row {
        set_path(&mut document, column, value.clone());
    }
    document
}
