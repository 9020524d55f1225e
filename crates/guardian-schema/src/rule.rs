//! # Rule Form
//!
//! The rule-based schema form: fragments hold an ordered `root_element`
//! sequence of field rules, each naming a field, its kind, presence
//! requirements, and optional nested rules.
//!
//! ```yaml
//! root_element:
//!   - name: age
//!     type: integer
//!     required: true
//!     description: Age
//!   - name: address
//!     type: object
//!     elements:
//!       - name: city
//!         type: string
//!         required: true
//! ```
//!
//! Common definitions use the same rule objects under `common_elements`
//! and are matched by `name`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use guardian_core::FieldPath;
use serde_json::{Map, Value};

use crate::error::SchemaError;

/// Top-level key holding a fragment's field rules.
pub const ROOT_ELEMENT_KEY: &str = "root_element";
/// Top-level key holding shared field rules.
pub const COMMON_ELEMENTS_KEY: &str = "common_elements";
/// Rule key holding nested field rules.
pub const NESTED_ELEMENTS_KEY: &str = "elements";

/// The value kind a field rule expects.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Text.
    String,
    /// Whole number.
    Integer,
    /// Ordered sequence.
    List,
    /// Mapping.
    Object,
    /// A form element type (`form`, `label`, `radio`, ...). Not type-checked.
    Element(String),
    /// No declared type. Not type-checked.
    FreeForm,
}

impl FieldKind {
    /// Parse the `type` key of a rule. A missing type is free-form.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            None | Some("free-form") | Some("free_form") | Some("any") => Self::FreeForm,
            Some("string") => Self::String,
            Some("integer") => Self::Integer,
            Some("list") => Self::List,
            Some("object") => Self::Object,
            Some(other) => Self::Element(other.to_string()),
        }
    }

    /// The `type` spelling of this kind.
    pub fn as_str(&self) -> &str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::List => "list",
            Self::Object => "object",
            Self::Element(name) => name,
            Self::FreeForm => "free-form",
        }
    }

    /// Whether the rule engine checks values against this kind.
    pub fn is_checked(&self) -> bool {
        matches!(self, Self::String | Self::Integer | Self::List | Self::Object)
    }
}

/// One validation rule.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRule {
    /// Field name, unique within its containing rule list.
    pub name: String,
    /// Expected value kind.
    pub kind: FieldKind,
    /// The field must be present.
    pub required: bool,
    /// The field must be absent.
    pub prohibited: bool,
    /// User-facing label used in report messages.
    pub description: String,
    /// Identifiers of registered predicates applied to the value.
    pub custom_rules: Vec<String>,
    /// The field must resolve against the common definitions.
    pub uses_common: bool,
    /// Rules for the fields of an object value, or of each mapping item of
    /// a list value.
    pub nested: Vec<FieldRule>,
    /// Free-form attributes, carried uninterpreted.
    pub attributes: Option<Value>,
    /// Relational checks (`every`, `first_only`, ...), carried uninterpreted.
    pub check: Option<Value>,
}

impl FieldRule {
    /// A rule for `name` with every flag off.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            prohibited: false,
            description: String::new(),
            custom_rules: Vec::new(),
            uses_common: false,
            nested: Vec::new(),
            attributes: None,
            check: None,
        }
    }

    /// Mark the field required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Mark the field prohibited.
    pub fn prohibited(mut self) -> Self {
        self.prohibited = true;
        self
    }

    /// Set the user-facing description.
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Append a predicate identifier.
    pub fn with_predicate(mut self, id: impl Into<String>) -> Self {
        self.custom_rules.push(id.into());
        self
    }

    /// Require the field to exist in the common definitions.
    pub fn using_common(mut self) -> Self {
        self.uses_common = true;
        self
    }

    /// Set the nested rules.
    pub fn with_nested(mut self, nested: Vec<FieldRule>) -> Self {
        self.nested = nested;
        self
    }

    /// Label for report messages: the description, or the name when no
    /// description is set.
    pub fn label(&self) -> &str {
        if self.description.is_empty() {
            &self.name
        } else {
            &self.description
        }
    }

    /// Parse one rule object. `path` locates the rule for error messages.
    pub fn from_value(value: &Value, path: &FieldPath) -> Result<Self, SchemaError> {
        let obj = value.as_object().ok_or_else(|| invalid(path, "field rule must be a mapping"))?;

        let name = match obj.get("name") {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => return Err(invalid(path, "field rule requires a non-empty 'name'")),
        };
        let here = path.key(&name);

        let kind = match obj.get("type") {
            None | Some(Value::Null) => FieldKind::FreeForm,
            Some(Value::String(s)) => FieldKind::parse(Some(s)),
            Some(_) => return Err(invalid(&here, "'type' must be a string")),
        };

        let description = match obj.get("description") {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(_) => return Err(invalid(&here, "'description' must be a string")),
        };

        let custom_rules = match obj.get("custom_rules") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| invalid(&here, "'custom_rules' must list predicate identifiers"))
                })
                .collect::<Result<_, _>>()?,
            Some(_) => return Err(invalid(&here, "'custom_rules' must be a sequence")),
        };

        let nested = match obj.get(NESTED_ELEMENTS_KEY) {
            None | Some(Value::Null) => Vec::new(),
            Some(elements) => rules_from_value(elements, &here)?,
        };

        Ok(Self {
            name,
            kind,
            required: flag(obj, "required", &here)?,
            prohibited: flag(obj, "prohibited", &here)?,
            description,
            custom_rules,
            uses_common: flag(obj, "uses_common", &here)?,
            nested,
            attributes: obj.get("attributes").filter(|v| !v.is_null()).cloned(),
            check: obj.get("check").filter(|v| !v.is_null()).cloned(),
        })
    }
}

fn flag(obj: &Map<String, Value>, key: &str, path: &FieldPath) -> Result<bool, SchemaError> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(_) => Err(invalid(path, &format!("'{key}' must be a boolean"))),
    }
}

fn invalid(path: &FieldPath, reason: &str) -> SchemaError {
    SchemaError::InvalidFragment {
        name: path.to_string(),
        reason: reason.to_string(),
    }
}

/// Parse a rule list. A sequence yields one rule per item; a single
/// mapping is accepted as a one-rule list.
pub fn rules_from_value(value: &Value, path: &FieldPath) -> Result<Vec<FieldRule>, SchemaError> {
    match value {
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| FieldRule::from_value(item, &path.index(i)))
            .collect(),
        Value::Object(_) => Ok(vec![FieldRule::from_value(value, path)?]),
        _ => Err(invalid(path, "rules must be a sequence of field-rule mappings")),
    }
}

/// Extract the `root_element` rules of a fragment tree.
///
/// An empty document or a mapping without `root_element` has no rules.
pub fn root_elements(tree: &Value, name: &str) -> Result<Vec<FieldRule>, SchemaError> {
    match tree {
        Value::Null => Ok(Vec::new()),
        Value::Object(obj) => match obj.get(ROOT_ELEMENT_KEY) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(rules) => rules_from_value(rules, &FieldPath::root().key(ROOT_ELEMENT_KEY)),
        },
        _ => Err(SchemaError::InvalidFragment {
            name: name.to_string(),
            reason: "fragment must be a mapping".to_string(),
        }),
    }
}

/// Derive a fragment name from its source path: the file stem.
pub fn fragment_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string()
}

/// A named, loaded schema unit.
#[derive(Debug, Clone)]
pub struct SchemaFragment {
    /// Name derived from the source identifier.
    pub name: String,
    /// The fragment's field rules, in document order.
    pub root_elements: Vec<FieldRule>,
    /// The raw parsed tree.
    pub tree: Value,
    /// Where the fragment was loaded from, if it came from disk.
    pub source_path: Option<PathBuf>,
    /// On-disk modification time at load.
    pub last_modified: Option<SystemTime>,
}

impl SchemaFragment {
    /// Build a fragment from an in-memory tree.
    pub fn from_tree(name: impl Into<String>, tree: Value) -> Result<Self, SchemaError> {
        let name = name.into();
        let root_elements = root_elements(&tree, &name)?;
        Ok(Self {
            name,
            root_elements,
            tree,
            source_path: None,
            last_modified: None,
        })
    }

    /// Attach source metadata.
    pub fn with_source(mut self, path: impl Into<PathBuf>, modified: SystemTime) -> Self {
        self.source_path = Some(path.into());
        self.last_modified = Some(modified);
        self
    }
}

/// Shared field rules, looked up by name from rules marked `uses_common`.
#[derive(Debug, Clone, Default)]
pub struct CommonDefinitions {
    rules: BTreeMap<String, FieldRule>,
}

impl CommonDefinitions {
    /// No common definitions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the `common_elements` sequence of a document.
    pub fn from_tree(tree: &Value) -> Result<Self, SchemaError> {
        let mut defs = Self::new();
        let elements = match tree {
            Value::Null => return Ok(defs),
            Value::Object(obj) => obj.get(COMMON_ELEMENTS_KEY),
            _ => {
                return Err(SchemaError::InvalidFragment {
                    name: COMMON_ELEMENTS_KEY.to_string(),
                    reason: "common definitions must be a mapping".to_string(),
                })
            }
        };
        if let Some(elements) = elements.filter(|v| !v.is_null()) {
            for rule in rules_from_value(elements, &FieldPath::root().key(COMMON_ELEMENTS_KEY))? {
                defs.insert(rule);
            }
        }
        Ok(defs)
    }

    /// Load and parse a common-definitions file.
    pub fn load(path: &Path) -> Result<Self, SchemaError> {
        let tree = guardian_core::load_document(path)
            .map_err(|e| SchemaError::from_document(path, e))?;
        let defs = Self::from_tree(&tree)?;
        tracing::debug!(path = %path.display(), count = defs.len(), "loaded common definitions");
        Ok(defs)
    }

    /// Add or replace a definition.
    pub fn insert(&mut self, rule: FieldRule) {
        self.rules.insert(rule.name.clone(), rule);
    }

    /// Look up a definition by field name.
    pub fn get(&self, name: &str) -> Option<&FieldRule> {
        self.rules.get(name)
    }

    /// Number of definitions.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// True when no definitions are loaded.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
