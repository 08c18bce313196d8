//! Pads the known repeating sections of an extracted document with empty
//! placeholder rows, one per customer sector, so multi-site templates
//! always render a full block per sector.

use serde_json::{Map, Value};

/// Array fields subject to sector padding. Fixed set; padding never touches
/// any other key of the document.
pub const SECTOR_ARRAY_FIELDS: &[&str] = &[
    "lignes_mobiles",
    "lignes_fixes",
    "lignes_internet",
    "materiels",
];

/// Ensures each known array field holds at least `count` elements by
/// appending empty objects. Existing elements are never removed or
/// reordered; a present non-array value is wrapped, not replaced. No-op for
/// counts of 0 or 1 and for non-object documents.
pub fn pad_sector_arrays(document: &mut Value, count: usize) {
    if count <= 1 {
        return;
    }
    let map = match document.as_object_mut() {
        Some(map) => map,
        None => return,
    };

    for field in SECTOR_ARRAY_FIELDS {
        let entry = map.entry(*field).or_insert(Value::Null);

        if !entry.is_array() {
            let wrapped = match entry.take() {
                Value::Null => Vec::new(),
                existing => vec![existing],
            };
            *entry = Value::Array(wrapped);
        }

        if let Value::Array(items) = entry {
            while items.len() < count {
                items.push(Value::Object(Map::new()));
            }
        }
    }
}
