//! # Schema Converter
//!
//! Translation between the rule form and the constraint form.
//!
//! ## Inference (`to_constraint_form`)
//!
//! Builds a constraint schema from an example tree. Mappings become
//! `object` constraints, sequences become `array` constraints, scalars map
//! to their primitive type. Array items are inferred from the first element
//! only: a mapping first element supplies the item schema, anything else
//! (or an empty sequence) yields `{"type": "string"}` items. This is a
//! heuristic, not type inference over every element. Every observed field
//! is marked required unless [`InferOptions::require_all`] is off.
//!
//! ## Lossless translation (`rules_to_constraint`, `constraint_to_rules`)
//!
//! A rule set renders to a constraint schema and back to an equal rule set.
//! Rule data with no JSON Schema keyword travels in extension keywords:
//!
//! | Rule | Constraint |
//! |---|---|
//! | `type: string/integer/list/object` | `type: string/integer/array/object` |
//! | other `type` | `x-kind` |
//! | `required` | parent's `required` list |
//! | `prohibited` | `not: {}` |
//! | `uses_common` | `x-uses-common` |
//! | `custom_rules` | `x-custom-rules` |
//! | `attributes` / `check` | `x-attributes` / `x-check` |
//!
//! ## Composition (`merge_and_resolve`)
//!
//! Named fragments are registered under `$defs`, each exposed as a
//! top-level property `{"$ref": "#/$defs/<name>"}`, and every reference is
//! then replaced in memory by its target. Cycles fail with
//! [`SchemaError::CircularReference`].

use std::collections::BTreeMap;

use guardian_core::FieldPath;
use serde_json::{json, Map, Value};

use crate::constraint::{ConstraintSchema, DRAFT_07_URI};
use crate::error::SchemaError;
use crate::rule::{root_elements, FieldKind, FieldRule, ROOT_ELEMENT_KEY};

/// Definitions namespace key.
pub const DEFS_KEY: &str = "$defs";
const REF_KEY: &str = "$ref";

const X_KIND: &str = "x-kind";
const X_USES_COMMON: &str = "x-uses-common";
const X_CUSTOM_RULES: &str = "x-custom-rules";
const X_ATTRIBUTES: &str = "x-attributes";
const X_CHECK: &str = "x-check";

/// Options for constraint inference.
#[derive(Debug, Clone, Copy)]
pub struct InferOptions {
    /// Mark every observed field required at its level.
    pub require_all: bool,
}

impl Default for InferOptions {
    fn default() -> Self {
        Self { require_all: true }
    }
}

/// Infer a constraint schema titled `name` from an example tree.
pub fn to_constraint_form(tree: &Value, name: &str) -> Result<ConstraintSchema, SchemaError> {
    to_constraint_form_with(tree, name, InferOptions::default())
}

/// [`to_constraint_form`] with explicit options.
pub fn to_constraint_form_with(
    tree: &Value,
    name: &str,
    options: InferOptions,
) -> Result<ConstraintSchema, SchemaError> {
    let map = tree.as_object().ok_or_else(|| SchemaError::InvalidFragment {
        name: name.to_string(),
        reason: "constraint inference needs a mapping at the root".to_string(),
    })?;
    let mut document = Map::new();
    document.insert("$schema".into(), Value::from(DRAFT_07_URI));
    document.insert("title".into(), Value::from(name));
    if let Value::Object(body) = infer_object(map, options) {
        document.extend(body);
    }
    Ok(ConstraintSchema::new(Value::Object(document)))
}

fn infer_object(map: &Map<String, Value>, options: InferOptions) -> Value {
    let properties: Map<String, Value> = map
        .iter()
        .map(|(key, value)| (key.clone(), infer_value(value, options)))
        .collect();
    let mut schema = Map::new();
    schema.insert("type".into(), Value::from("object"));
    schema.insert("properties".into(), Value::Object(properties));
    if options.require_all {
        let required: Vec<Value> = map.keys().cloned().map(Value::from).collect();
        schema.insert("required".into(), Value::Array(required));
    }
    Value::Object(schema)
}

fn infer_value(value: &Value, options: InferOptions) -> Value {
    match value {
        Value::Object(map) => infer_object(map, options),
        Value::Array(items) => {
            let item_schema = match items.first() {
                Some(Value::Object(first)) => infer_object(first, options),
                _ => json!({"type": "string"}),
            };
            json!({"type": "array", "items": item_schema})
        }
        Value::Number(n) if n.is_i64() || n.is_u64() => json!({"type": "integer"}),
        Value::Number(_) => json!({"type": "number"}),
        Value::Bool(_) => json!({"type": "boolean"}),
        Value::String(_) => json!({"type": "string"}),
        Value::Null => json!({"type": "null"}),
    }
}

/// Render a rule set as a constraint schema titled `name`.
///
/// # Errors
///
/// [`SchemaError::ConflictingRule`] if a rule is both required and
/// prohibited.
pub fn rules_to_constraint(name: &str, rules: &[FieldRule]) -> Result<ConstraintSchema, SchemaError> {
    let mut document = Map::new();
    document.insert("$schema".into(), Value::from(DRAFT_07_URI));
    document.insert("title".into(), Value::from(name));
    document.insert("type".into(), Value::from("object"));
    let (properties, required) = render_rules(rules, &FieldPath::root())?;
    document.insert("properties".into(), Value::Object(properties));
    document.insert("required".into(), Value::Array(required));
    Ok(ConstraintSchema::new(Value::Object(document)))
}

fn render_rules(
    rules: &[FieldRule],
    parent: &FieldPath,
) -> Result<(Map<String, Value>, Vec<Value>), SchemaError> {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for rule in rules {
        let path = parent.key(&rule.name);
        if rule.required && rule.prohibited {
            return Err(SchemaError::ConflictingRule {
                field: path.to_string(),
            });
        }
        if rule.required && !required.iter().any(|r| r == rule.name.as_str()) {
            required.push(Value::from(rule.name.clone()));
        }
        properties.insert(rule.name.clone(), render_rule(rule, &path)?);
    }
    Ok((properties, required))
}

fn render_rule(rule: &FieldRule, path: &FieldPath) -> Result<Value, SchemaError> {
    let mut prop = Map::new();
    match &rule.kind {
        FieldKind::String => {
            prop.insert("type".into(), Value::from("string"));
        }
        FieldKind::Integer => {
            prop.insert("type".into(), Value::from("integer"));
        }
        FieldKind::List => {
            prop.insert("type".into(), Value::from("array"));
        }
        FieldKind::Object => {
            prop.insert("type".into(), Value::from("object"));
        }
        FieldKind::Element(kind) => {
            prop.insert(X_KIND.into(), Value::from(kind.clone()));
        }
        FieldKind::FreeForm => {}
    }
    if !rule.description.is_empty() {
        prop.insert("description".into(), Value::from(rule.description.clone()));
    }
    if rule.prohibited {
        prop.insert("not".into(), json!({}));
    }

    if !rule.nested.is_empty() {
        let (properties, required) = render_rules(&rule.nested, path)?;
        let body = json!({"properties": properties, "required": required});
        match rule.kind {
            FieldKind::Object => merge_body(&mut prop, body),
            FieldKind::List => {
                let mut items = Map::new();
                items.insert("type".into(), Value::from("object"));
                merge_body(&mut items, body);
                prop.insert("items".into(), Value::Object(items));
            }
            // Unchecked kinds apply nested rules to a mapping value or to
            // each item of a sequence value.
            _ => {
                prop.insert("items".into(), body.clone());
                merge_body(&mut prop, body);
            }
        }
    }

    if rule.uses_common {
        prop.insert(X_USES_COMMON.into(), Value::Bool(true));
    }
    if !rule.custom_rules.is_empty() {
        prop.insert(X_CUSTOM_RULES.into(), json!(rule.custom_rules));
    }
    if let Some(attributes) = &rule.attributes {
        prop.insert(X_ATTRIBUTES.into(), attributes.clone());
    }
    if let Some(check) = &rule.check {
        prop.insert(X_CHECK.into(), check.clone());
    }
    Ok(Value::Object(prop))
}

fn merge_body(target: &mut Map<String, Value>, body: Value) {
    if let Value::Object(body) = body {
        target.extend(body);
    }
}

/// Read a rule set back from a constraint schema's top-level
/// `properties` and `required`.
///
/// # Errors
///
/// [`SchemaError::UnresolvedReference`] if a property is still a `$ref`;
/// [`SchemaError::InvalidFragment`] if `properties` is not a mapping.
pub fn constraint_to_rules(schema: &ConstraintSchema) -> Result<Vec<FieldRule>, SchemaError> {
    read_rules(schema.as_value(), &FieldPath::root())
}

fn read_rules(level: &Value, path: &FieldPath) -> Result<Vec<FieldRule>, SchemaError> {
    let properties = match level.get("properties") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Object(map)) => map,
        Some(_) => {
            return Err(SchemaError::InvalidFragment {
                name: path.to_string(),
                reason: "'properties' must be a mapping".to_string(),
            })
        }
    };
    let required: Vec<&str> = level
        .get("required")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    properties
        .iter()
        .map(|(name, prop)| read_rule(name, prop, required.contains(&name.as_str()), &path.key(name)))
        .collect()
}

fn read_rule(name: &str, prop: &Value, required: bool, path: &FieldPath) -> Result<FieldRule, SchemaError> {
    if let Some(reference) = prop.get(REF_KEY).and_then(Value::as_str) {
        return Err(SchemaError::UnresolvedReference {
            reference: reference.to_string(),
        });
    }

    let kind = match prop.get("type").and_then(Value::as_str) {
        Some("string") => FieldKind::String,
        Some("integer") => FieldKind::Integer,
        Some("array") => FieldKind::List,
        Some("object") => FieldKind::Object,
        Some(other) => FieldKind::Element(other.to_string()),
        None => FieldKind::parse(prop.get(X_KIND).and_then(Value::as_str)),
    };

    let nested = match kind {
        FieldKind::List => match prop.get("items") {
            Some(items) => read_rules(items, path)?,
            None => Vec::new(),
        },
        _ => read_rules(prop, path)?,
    };

    let mut rule = FieldRule::new(name, kind).with_nested(nested);
    rule.required = required;
    rule.prohibited = prop.get("not").is_some_and(|n| n.as_object().is_some_and(Map::is_empty));
    rule.description = prop
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    rule.uses_common = prop.get(X_USES_COMMON).and_then(Value::as_bool).unwrap_or(false);
    rule.custom_rules = prop
        .get(X_CUSTOM_RULES)
        .and_then(Value::as_array)
        .map(|ids| ids.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default();
    rule.attributes = prop.get(X_ATTRIBUTES).cloned();
    rule.check = prop.get(X_CHECK).cloned();
    Ok(rule)
}

/// Convert one fragment tree to constraint form. Trees with a
/// `root_element` key are rule-form fragments and translate losslessly;
/// any other tree is treated as an example document and inferred.
pub fn fragment_to_constraint(
    name: &str,
    tree: &Value,
    options: InferOptions,
) -> Result<ConstraintSchema, SchemaError> {
    if tree.get(ROOT_ELEMENT_KEY).is_some() {
        rules_to_constraint(name, &root_elements(tree, name)?)
    } else {
        to_constraint_form_with(tree, name, options)
    }
}

/// Combine named fragments under `$defs`, expose each as a top-level
/// reference property, and dereference the result.
pub fn merge_and_resolve(
    title: &str,
    fragments: &BTreeMap<String, Value>,
    options: InferOptions,
) -> Result<ConstraintSchema, SchemaError> {
    let mut defs = Map::new();
    let mut properties = Map::new();
    for (name, tree) in fragments {
        let mut definition = fragment_to_constraint(name, tree, options)?.into_value();
        if let Value::Object(map) = &mut definition {
            map.remove("$schema");
        }
        defs.insert(name.clone(), definition);
        let reference = format!("#/{DEFS_KEY}/{}", pointer_token(name));
        properties.insert(name.clone(), json!({ REF_KEY: reference }));
    }

    let combined = json!({
        "$schema": DRAFT_07_URI,
        "title": title,
        "type": "object",
        "properties": properties,
        DEFS_KEY: defs,
    });
    let resolved = resolve_references(&combined)?;
    tracing::debug!(title, fragments = fragments.len(), "merged and resolved constraint schema");
    Ok(ConstraintSchema::new(resolved))
}

/// Escape a key for use as one JSON pointer token (RFC 6901).
fn pointer_token(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}

/// Replace every internal `$ref` (`#`, `#/pointer`) with a copy of its
/// target, recursively.
///
/// Keywords beside a `$ref` are kept when the target does not define them.
///
/// # Errors
///
/// [`SchemaError::CircularReference`] when a reference is reached again
/// while it is still being expanded; [`SchemaError::UnresolvedReference`]
/// for external or dangling pointers.
pub fn resolve_references(document: &Value) -> Result<Value, SchemaError> {
    let mut stack = Vec::new();
    resolve_node(document, document, &mut stack)
}

fn resolve_node(node: &Value, root: &Value, stack: &mut Vec<String>) -> Result<Value, SchemaError> {
    match node {
        Value::Object(map) => {
            if let Some(Value::String(reference)) = map.get(REF_KEY) {
                if stack.contains(reference) {
                    let mut chain = stack.clone();
                    chain.push(reference.clone());
                    return Err(SchemaError::CircularReference { chain });
                }
                let target = lookup(root, reference)?;
                stack.push(reference.clone());
                let resolved = resolve_node(target, root, stack)?;
                stack.pop();

                return Ok(match resolved {
                    Value::Object(mut target_map) => {
                        for (key, value) in map {
                            if key != REF_KEY && !target_map.contains_key(key) {
                                target_map.insert(key.clone(), resolve_node(value, root, stack)?);
                            }
                        }
                        Value::Object(target_map)
                    }
                    other => other,
                });
            }
            let mut out = Map::with_capacity(map.len());
            for (key, value) in map {
                out.insert(key.clone(), resolve_node(value, root, stack)?);
            }
            Ok(Value::Object(out))
        }
        Value::Array(items) => items
            .iter()
            .map(|item| resolve_node(item, root, stack))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        other => Ok(other.clone()),
    }
}

fn lookup<'a>(root: &'a Value, reference: &str) -> Result<&'a Value, SchemaError> {
    let unresolved = || SchemaError::UnresolvedReference {
        reference: reference.to_string(),
    };
    let pointer = reference.strip_prefix('#').ok_or_else(unresolved)?;
    if pointer.is_empty() {
        return Ok(root);
    }
    root.pointer(pointer).ok_or_else(unresolved)
}
