//! Keeps the example output skeleton embedded in an extraction instruction
//! in sync with the configured field list.
//!
//! Two independent operations share the allowed-tree semantics:
//! ensure-present inserts missing paths with placeholder values, prune
//! removes everything the configuration no longer mentions. Both mutate the
//! skeleton only; the surrounding instruction text passes through untouched.

use crate::allowed_tree::{build_allowed_tree, AllowedNode};
use crate::field_path::{FieldPath, FieldSegment};
use log::warn;
use serde_json::{json, Value};

/// Literal marker preceding the embedded skeleton in the instruction.
pub const STRUCTURE_HEADER: &str = "Structure de sortie attendue";

/// Literal marker that must appear after the skeleton. The skeleton span
/// ends at the last `}` before it.
pub const FIELDS_HEADER: &str = "Champs à extraire";

/// Ordered key-name hints for placeholder example values. First match wins;
/// matching is a case-insensitive substring test.
const PLACEHOLDER_HINTS: &[(&[&str], &str)] = &[
    (&["email"], "exemple@mail.fr"),
    (&["mobile"], "06 00 00 00 00"),
    (&["fixe", "telephone"], "01 00 00 00 00"),
    (&["date"], "01/01/2024"),
    (&["tarif", "prix", "montant"], "10.00"),
    (&["quantite", "qty"], "1"),
    (&["numero"], "0612345678"),
];

/// Example value for a leaf key, chosen by matching the key name against
/// the hint table. Falls back to `"..."`.
pub fn placeholder_for(key: &str) -> &'static str {
    let lower = key.to_lowercase();
    for (hints, value) in PLACEHOLDER_HINTS {
        if hints.iter().any(|hint| lower.contains(hint)) {
            return value;
        }
    }
    "..."
}

/// Ensures one field path exists in the skeleton, creating intermediate
/// containers as needed: objects for plain segments, one-element arrays
/// (with an object element) for `[]` segments.
///
/// A scalar leaf is only written when the key is absent; present values,
/// including explicit `null`, are never overwritten. An array leaf becomes
/// `[{}]` unless the key already holds an array. Idempotent.
pub fn apply_field_path(skeleton: &mut Value, path: &FieldPath) {
    if path.is_empty() {
        return;
    }
    if !skeleton.is_object() {
        *skeleton = json!({});
    }

    let mut current = skeleton;
    let last = path.segments.len() - 1;

    for (i, segment) in path.segments.iter().enumerate() {
        if i == last {
            apply_leaf_segment(current, segment);
            return;
        }
        current = descend_segment(current, segment);
    }
}

fn apply_leaf_segment(container: &mut Value, segment: &FieldSegment) {
    let map = match container.as_object_mut() {
        Some(map) => map,
        None => return,
    };

    if segment.is_array {
        let entry = map.entry(segment.key.clone()).or_insert(Value::Null);
        if !entry.is_array() {
            *entry = json!([{}]);
        }
    } else if !map.contains_key(&segment.key) {
        map.insert(
            segment.key.clone(),
            Value::String(placeholder_for(&segment.key).to_string()),
        );
    }
}

fn descend_segment<'a>(container: &'a mut Value, segment: &FieldSegment) -> &'a mut Value {
    let map = container.as_object_mut().expect("container is an object");
    let entry = map.entry(segment.key.clone()).or_insert(Value::Null);

    if segment.is_array {
        if !entry.is_array() {
            *entry = json!([{}]);
        }
        let items = entry.as_array_mut().expect("entry is an array");
        if items.is_empty() {
            items.push(json!({}));
        }
        let first = &mut items[0];
        if !first.is_object() {
            *first = json!({});
        }
        first
    } else {
        if !entry.is_object() {
            *entry = json!({});
        }
        entry
    }
}

/// Applies [`apply_field_path`] for every non-empty path in the list.
pub fn ensure_fields(skeleton: &mut Value, paths: &[FieldPath]) {
    for path in paths {
        if !path.is_empty() {
            apply_field_path(skeleton, path);
        }
    }
}

/// Removes from the skeleton every key the allowed tree does not mention,
/// collapsing arrays to one representative element. Containers that end up
/// empty are dropped unless the tree marks them as leaves; leaf values are
/// preserved verbatim.
pub fn prune_structure(skeleton: &mut Value, node: &AllowedNode) {
    let map = match skeleton.as_object_mut() {
        Some(map) => map,
        None => return,
    };

    let keys: Vec<String> = map.keys().cloned().collect();
    for key in keys {
        let keep = match node.children.get(&key) {
            None => false,
            Some(child) => {
                let entry = map.get_mut(&key).expect("key was just listed");
                prune_entry(entry, child)
            }
        };
        if !keep {
            map.remove(&key);
        }
    }
}

fn prune_entry(entry: &mut Value, node: &AllowedNode) -> bool {
    // A pure scalar leaf has no subtree to prune against; keep it as-is.
    if node.children.is_empty() && node.item.is_none() {
        return true;
    }

    match entry {
        Value::Array(items) => {
            items.truncate(1);
            if let Some(first) = items.first_mut() {
                let item_node = node.item.as_deref().unwrap_or(node);
                prune_structure(first, item_node);
            }
            if !node.is_leaf {
                let effectively_empty = match items.first() {
                    None => true,
                    Some(Value::Object(map)) => map.is_empty(),
                    Some(_) => false,
                };
                if effectively_empty {
                    return false;
                }
            }
            true
        }
        Value::Object(_) => {
            prune_structure(entry, node);
            let emptied = entry.as_object().map(|m| m.is_empty()).unwrap_or(false);
            !(emptied && !node.is_leaf)
        }
        _ => true,
    }
}

/// Synchronizes the skeleton embedded in `instruction` with the configured
/// field paths: ensure-present for every path, then an optional prune down
/// to exactly the configured paths.
///
/// The skeleton is located as the span from the first `{` after
/// [`STRUCTURE_HEADER`] to the last `}` before [`FIELDS_HEADER`]. If either
/// marker is missing, no balanced span exists, or the span is not valid
/// JSON, the instruction is returned unchanged.
pub fn sync_instruction(instruction: &str, paths: &[FieldPath], prune: bool) -> String {
    let span = match locate_skeleton(instruction) {
        Some(span) => span,
        None => {
            warn!("Instruction has no recognizable skeleton span; leaving it unchanged");
            return instruction.to_string();
        }
    };

    let mut skeleton: Value = match serde_json::from_str(&instruction[span.0..span.1]) {
        Ok(value) => value,
        Err(e) => {
            warn!("Embedded skeleton is not valid JSON ({e}); leaving instruction unchanged");
            return instruction.to_string();
        }
    };

    ensure_fields(&mut skeleton, paths);

    if prune {
        let non_empty: Vec<FieldPath> = paths.iter().filter(|p| !p.is_empty()).cloned().collect();
        let tree = build_allowed_tree(&non_empty);
        prune_structure(&mut skeleton, &tree);
    }

    let rendered = match serde_json::to_string_pretty(&skeleton) {
        Ok(rendered) => rendered,
        Err(e) => {
            warn!("Failed to re-render skeleton ({e}); leaving instruction unchanged");
            return instruction.to_string();
        }
    };

    format!(
        "{}{}{}",
        &instruction[..span.0],
        rendered,
        &instruction[span.1..]
    )
}

/// Byte range `[start, end)` of the embedded skeleton, markers excluded.
fn locate_skeleton(instruction: &str) -> Option<(usize, usize)> {
    let header = instruction.find(STRUCTURE_HEADER)?;
    let start = header + instruction[header..].find('{')?;
    let fields = start + instruction[start..].find(FIELDS_HEADER)?;
    let end = start + instruction[start..fields].rfind('}')? + 1;
    Some((start, end))
}
