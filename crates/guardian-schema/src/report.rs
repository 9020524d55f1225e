//! # Validation Reports
//!
//! A [`ValidationReport`] is the value every validation mode returns. It is
//! an ordered list of [`ErrorEntry`] in evaluation order; an empty report
//! means the document passed.

use std::fmt;

use guardian_core::FieldPath;
use serde::{Deserialize, Serialize};

/// Category of a report entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A required field is absent.
    Missing,
    /// A prohibited field is present.
    Prohibited,
    /// A value does not match the declared kind.
    TypeMismatch,
    /// One or more custom predicates rejected the value.
    CustomRule,
    /// A `uses_common` field has no common definition.
    DefinitionMissing,
    /// The constraint validator rejected the document.
    Constraint,
}

/// One validation error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEntry {
    /// Dot-delimited location of the field; `(root)` for the whole document.
    pub field_path: String,
    /// Human-readable message naming the field.
    pub message: String,
    /// Error category.
    #[serde(skip)]
    pub kind: Option<ErrorKind>,
}

impl ErrorEntry {
    /// Build an entry at `path`.
    pub fn new(path: &FieldPath, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            field_path: path.to_string(),
            message: message.into(),
            kind: Some(kind),
        }
    }
}

impl fmt::Display for ErrorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field_path, self.message)
    }
}

/// Ordered validation errors. Empty means success.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationReport {
    errors: Vec<ErrorEntry>,
}

impl ValidationReport {
    /// An empty (passing) report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn push(&mut self, entry: ErrorEntry) {
        self.errors.push(entry);
    }

    /// True when no errors were recorded.
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of errors.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// True when no errors were recorded.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// The entries in evaluation order.
    pub fn errors(&self) -> &[ErrorEntry] {
        &self.errors
    }

    /// Entries at a given dotted path.
    pub fn at<'a>(&'a self, field_path: &'a str) -> impl Iterator<Item = &'a ErrorEntry> + 'a {
        self.errors.iter().filter(move |e| e.field_path == field_path)
    }
}

impl FromIterator<ErrorEntry> for ValidationReport {
    fn from_iter<I: IntoIterator<Item = ErrorEntry>>(iter: I) -> Self {
        Self {
            errors: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for ValidationReport {
    /// One `path: message` line per entry.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{entry}")?;
        }
        Ok(())
    }
}
