//! # Constraint Schemas
//!
//! The standards-based schema form: a JSON Schema (draft-07) document with
//! `properties`, `required`, `items` and `$defs`. Documents are validated
//! with the `jsonschema` crate; violations become report entries with the
//! same dot-delimited paths the rule engine uses.
//!
//! A [`ConstraintSchema`] handed to [`ConstraintSchema::compile`] is
//! expected to be fully dereferenced (see
//! [`resolve_references`](crate::convert::resolve_references)).

use std::fmt;

use guardian_core::FieldPath;
use jsonschema::{Draft, Validator};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SchemaError;
use crate::report::{ErrorEntry, ErrorKind, ValidationReport};

/// `$schema` URI emitted on generated documents.
pub const DRAFT_07_URI: &str = "http://json-schema.org/draft-07/schema#";

/// A constraint-form schema document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConstraintSchema {
    document: Value,
}

impl ConstraintSchema {
    /// Wrap a schema document.
    pub fn new(document: Value) -> Self {
        Self { document }
    }

    /// The document's `title`, if any.
    pub fn title(&self) -> Option<&str> {
        self.document.get("title").and_then(Value::as_str)
    }

    /// The raw document.
    pub fn as_value(&self) -> &Value {
        &self.document
    }

    /// Consume into the raw document.
    pub fn into_value(self) -> Value {
        self.document
    }

    /// True when the document still holds a `$ref` anywhere.
    pub fn has_references(&self) -> bool {
        contains_ref(&self.document)
    }

    /// Compile a draft-07 validator for this document.
    pub fn compile(&self) -> Result<ConstraintValidator, SchemaError> {
        let name = self.title().unwrap_or("constraint").to_string();
        let mut opts = jsonschema::options();
        opts.with_draft(Draft::Draft7);
        let inner = opts
            .build(&self.document)
            .map_err(|e| SchemaError::ConstraintCompile {
                name: name.clone(),
                reason: e.to_string(),
            })?;
        Ok(ConstraintValidator { name, inner })
    }
}

fn contains_ref(value: &Value) -> bool {
    match value {
        Value::Object(map) => {
            map.get("$ref").is_some_and(Value::is_string) || map.values().any(contains_ref)
        }
        Value::Array(items) => items.iter().any(contains_ref),
        _ => false,
    }
}

/// A compiled constraint validator. Safe to share across threads.
pub struct ConstraintValidator {
    name: String,
    inner: Validator,
}

impl ConstraintValidator {
    /// The schema title the validator was compiled from.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Validate `data`, collecting every violation.
    pub fn validate(&self, data: &Value) -> ValidationReport {
        self.inner
            .iter_errors(data)
            .map(|e| {
                let path = FieldPath::from_json_pointer(&e.instance_path.to_string());
                ErrorEntry::new(&path, ErrorKind::Constraint, e.to_string())
            })
            .collect()
    }

    /// True when `data` has no violations.
    pub fn is_valid(&self, data: &Value) -> bool {
        self.inner.is_valid(data)
    }
}

impl fmt::Debug for ConstraintValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstraintValidator")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn person() -> ConstraintSchema {
        ConstraintSchema::new(json!({
            "$schema": DRAFT_07_URI,
            "title": "person",
            "type": "object",
            "properties": {
                "name": {"type": "string"},
                "age": {"type": "integer"},
                "tags": {"type": "array", "items": {"type": "string"}}
            },
            "required": ["name", "age"]
        }))
    }

    #[test]
    fn valid_document_passes() {
        let validator = person().compile().unwrap();
        assert_eq!(validator.name(), "person");
        let report = validator.validate(&json!({"name": "John", "age": 30, "tags": ["a"]}));
        assert!(report.is_success(), "{report}");
    }

    #[test]
    fn violations_use_dotted_paths() {
        let validator = person().compile().unwrap();
        let report = validator.validate(&json!({"name": "John", "age": "30", "tags": ["a", 2]}));
        assert_eq!(report.len(), 2);
        assert_eq!(report.at("age").count(), 1);
        assert_eq!(report.at("tags.1").count(), 1);
    }

    #[test]
    fn missing_required_reports_at_root() {
        let validator = person().compile().unwrap();
        let report = validator.validate(&json!({"name": "John"}));
        assert_eq!(report.len(), 1);
        assert_eq!(report.errors()[0].field_path, "(root)");
        assert!(report.errors()[0].message.contains("age"));
    }

    #[test]
    fn invalid_schema_fails_to_compile() {
        let err = ConstraintSchema::new(json!({"title": "bad", "type": 12}))
            .compile()
            .unwrap_err();
        assert!(matches!(err, SchemaError::ConstraintCompile { ref name, .. } if name == "bad"));
    }

    #[test]
    fn detects_remaining_references() {
        assert!(!person().has_references());
        let with_ref = ConstraintSchema::new(json!({"properties": {"a": {"$ref": "#/$defs/a"}}}));
        assert!(with_ref.has_references());
    }
}
