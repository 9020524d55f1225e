//! # Field Paths
//!
//! Dot-delimited locations inside a tree document. Object keys and
//! sequence indices are both rendered as path segments, so the second
//! item's `name` under `tags` is `tags.1.name`. The empty path is the
//! document root.

use std::fmt;

/// One segment of a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// A mapping key.
    Key(String),
    /// A sequence index.
    Index(usize),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(k) => f.write_str(k),
            Self::Index(i) => write!(f, "{i}"),
        }
    }
}

/// A location inside a tree document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<Segment>,
}

impl FieldPath {
    /// The document root.
    pub fn root() -> Self {
        Self::default()
    }

    /// Return a new path extended by a mapping key.
    pub fn key(&self, key: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.segments.push(Segment::Key(key.into()));
        next
    }

    /// Return a new path extended by a sequence index.
    pub fn index(&self, index: usize) -> Self {
        let mut next = self.clone();
        next.segments.push(Segment::Index(index));
        next
    }

    /// True for the document root.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of segments.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// The path segments, outermost first.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Build a path from a JSON Pointer (RFC 6901), e.g. `/tags/0/name`.
    ///
    /// All-digit segments become indices. `~1` and `~0` escapes are decoded.
    pub fn from_json_pointer(pointer: &str) -> Self {
        let segments = pointer
            .split('/')
            .skip(1)
            .map(|raw| {
                let decoded = raw.replace("~1", "/").replace("~0", "~");
                match decoded.parse::<usize>() {
                    Ok(i) if !decoded.is_empty() && decoded.bytes().all(|b| b.is_ascii_digit()) => {
                        Segment::Index(i)
                    }
                    _ => Segment::Key(decoded),
                }
            })
            .collect();
        Self { segments }
    }

    /// The dot-delimited form; empty for the root.
    pub fn dotted(&self) -> String {
        self.segments
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            f.write_str("(root)")
        } else {
            f.write_str(&self.dotted())
        }
    }
}
