//! Dotted field paths with repeating-segment markers.
//!
//! A path like `lignes[].forfait` names the `forfait` key of every element
//! of the `lignes` array. Only one representative item is modeled: the
//! marker flags the segment as repeating, it never carries an index.

/// One segment of a [`FieldPath`]. `is_array` is set when the textual
/// segment carried the trailing `[]` marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSegment {
    pub key: String,
    pub is_array: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    pub segments: Vec<FieldSegment>,
}

pub const ARRAY_MARKER: &str = "[]";

impl FieldPath {
    /// Parses a textual path into segments. Segments ending in `[]` are
    /// flagged repeating and have the marker stripped. No character-set
    /// validation is done here; callers skip empty/whitespace-only paths.
    pub fn parse(raw: &str) -> FieldPath {
        let segments = raw
            .split('.')
            .filter(|part| !part.is_empty())
            .map(|part| {
                if let Some(key) = part.strip_suffix(ARRAY_MARKER) {
                    FieldSegment {
                        key: key.to_string(),
                        is_array: true,
                    }
                } else {
                    FieldSegment {
                        key: part.to_string(),
                        is_array: false,
                    }
                }
            })
            .collect();

        FieldPath { segments }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, seg) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{}", seg.key)?;
            if seg.is_array {
                write!(f, "{}", ARRAY_MARKER)?;
            }
        }
        Ok(())
    }
}
