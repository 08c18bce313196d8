//! Prefix tree compiled from a field-path list.
//!
//! The tree answers, per node, whether a key terminates a configured path
//! (`is_leaf`) and whether it introduces a repeating subtree (`is_array`).
//! An array node owns an `item` subtree that subsequent segments attach
//! to; its `children` map stays empty.

use crate::field_path::FieldPath;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AllowedNode {
    pub is_leaf: bool,
    pub is_array: bool,
    pub children: BTreeMap<String, AllowedNode>,
    pub item: Option<Box<AllowedNode>>,
}

impl AllowedNode {
    /// The subtree that a segment's successors attach to: the `item` node
    /// for arrays, the node itself otherwise.
    fn descend_mut(&mut self) -> &mut AllowedNode {
        if self.is_array {
            self.item.get_or_insert_with(Default::default)
        } else {
            self
        }
    }
}

/// Compiles a field-path list into an [`AllowedNode`] prefix tree.
///
/// An empty list allows nothing; "no restriction" must be special-cased by
/// the caller, never encoded as an empty tree. When two paths disagree on
/// whether a segment is an array, the array flag wins (permissive merge;
/// production configurations rely on it).
pub fn build_allowed_tree(paths: &[FieldPath]) -> AllowedNode {
    let mut root = AllowedNode::default();

    for path in paths {
        let mut current = &mut root;
        let last = path.segments.len().saturating_sub(1);

        for (i, segment) in path.segments.iter().enumerate() {
            let child = current.children.entry(segment.key.clone()).or_default();

            if segment.is_array {
                child.is_array = true;
                if child.item.is_none() {
                    child.item = Some(Box::default());
                }
            }
            if i == last {
                child.is_leaf = true;
            }

            current = child.descend_mut();
        }
    }

    root
}
