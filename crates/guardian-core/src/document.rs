//! # Tree Documents
//!
//! Loads YAML and JSON documents into the [`serde_json::Value`] tree model
//! and renders trees back to text.
//!
//! YAML has a richer type system than JSON (tags, anchors, non-string
//! keys), but schema fragments and configuration data use only the
//! JSON-compatible subset. [`yaml_to_json_value`] converts a YAML tree into
//! the equivalent JSON tree: tags are dropped, scalar mapping keys are
//! stringified, and anything without a JSON representation is rejected.

use std::path::Path;

use serde_json::Value;

use crate::error::DocumentError;
use crate::path::FieldPath;

const INLINE_ORIGIN: &str = "<inline>";

/// Text format of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// YAML 1.2 (a superset of JSON for parsing purposes).
    Yaml,
    /// JSON.
    Json,
}

impl DocumentFormat {
    /// Pick the format from a file extension. `.json` is JSON; everything
    /// else is parsed as YAML, which also accepts JSON text.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Yaml,
        }
    }

    /// The other format, used when transcoding.
    pub fn opposite(self) -> Self {
        match self {
            Self::Yaml => Self::Json,
            Self::Json => Self::Yaml,
        }
    }
}

/// Read and parse the document at `path`.
///
/// # Errors
///
/// [`DocumentError::NotFound`] if the path does not exist,
/// [`DocumentError::Io`] if it cannot be read, and a parse variant if the
/// content is malformed. Partial content is never returned.
pub fn load_document(path: &Path) -> Result<Value, DocumentError> {
    if !path.exists() {
        return Err(DocumentError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let text = std::fs::read_to_string(path).map_err(|source| DocumentError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_with_origin(&text, DocumentFormat::from_path(path), &path.display().to_string())
}

/// Parse in-memory document text.
pub fn parse_document(text: &str, format: DocumentFormat) -> Result<Value, DocumentError> {
    parse_with_origin(text, format, INLINE_ORIGIN)
}

fn parse_with_origin(
    text: &str,
    format: DocumentFormat,
    origin: &str,
) -> Result<Value, DocumentError> {
    match format {
        DocumentFormat::Json => serde_json::from_str(text).map_err(|source| DocumentError::Json {
            origin: origin.to_string(),
            source,
        }),
        DocumentFormat::Yaml => {
            let yaml: serde_yaml::Value =
                serde_yaml::from_str(text).map_err(|source| DocumentError::Yaml {
                    origin: origin.to_string(),
                    source,
                })?;
            yaml_to_json_value(&yaml).map_err(|reason| DocumentError::Unsupported {
                origin: origin.to_string(),
                reason,
            })
        }
    }
}

/// Render a tree as pretty-printed JSON. Non-ASCII text is kept as-is.
pub fn to_json_string(value: &Value) -> Result<String, DocumentError> {
    serde_json::to_string_pretty(value).map_err(|e| DocumentError::Serialize(e.to_string()))
}

/// Render a tree as YAML.
pub fn to_yaml_string(value: &Value) -> Result<String, DocumentError> {
    serde_yaml::to_string(value).map_err(|e| DocumentError::Serialize(e.to_string()))
}

/// Render a tree in `format` and write it to `path`, creating missing
/// parent directories.
pub fn write_document(
    path: &Path,
    value: &Value,
    format: DocumentFormat,
) -> Result<(), DocumentError> {
    let text = match format {
        DocumentFormat::Json => to_json_string(value)?,
        DocumentFormat::Yaml => to_yaml_string(value)?,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| DocumentError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, text).map_err(|source| DocumentError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Convert a parsed YAML tree to the workspace tree model.
///
/// Tags are dropped. Number and boolean mapping keys become their text;
/// any other key kind, a key that collides with another after that
/// conversion, or a non-finite float is rejected with the dotted location
/// of the offending node.
pub fn yaml_to_json_value(yaml: &serde_yaml::Value) -> Result<Value, String> {
    convert_node(yaml, &FieldPath::root())
}

fn convert_node(yaml: &serde_yaml::Value, at: &FieldPath) -> Result<Value, String> {
    use serde_yaml::Value as Yaml;

    Ok(match yaml {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(*b),
        Yaml::String(s) => Value::String(s.clone()),
        Yaml::Number(n) => convert_number(n).ok_or_else(|| format!("{at}: number {n} has no JSON form"))?,
        Yaml::Sequence(items) => Value::Array(
            items
                .iter()
                .enumerate()
                .map(|(i, item)| convert_node(item, &at.index(i)))
                .collect::<Result<_, _>>()?,
        ),
        Yaml::Mapping(map) => {
            let mut fields = serde_json::Map::with_capacity(map.len());
            for (key, value) in map {
                let key = match key {
                    Yaml::String(s) => s.clone(),
                    Yaml::Number(n) => n.to_string(),
                    Yaml::Bool(b) => b.to_string(),
                    _ => return Err(format!("{at}: mapping keys must be scalars")),
                };
                let child = at.key(key.clone());
                if fields.contains_key(&key) {
                    return Err(format!("{child}: key appears twice once keys are stringified"));
                }
                let value = convert_node(value, &child)?;
                fields.insert(key, value);
            }
            Value::Object(fields)
        }
        Yaml::Tagged(tagged) => convert_node(&tagged.value, at)?,
    })
}

fn convert_number(n: &serde_yaml::Number) -> Option<Value> {
    if let Some(i) = n.as_i64() {
        Some(Value::from(i))
    } else if let Some(u) = n.as_u64() {
        Some(Value::from(u))
    } else {
        n.as_f64().and_then(serde_json::Number::from_f64).map(Value::Number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn yaml_scalars_and_collections_convert() {
        let yaml_str = r#"
name: John
age: 30
ratio: 0.5
active: true
nothing:
tags:
  - one
  - two
address:
  city: Tokyo
"#;
        let value = parse_document(yaml_str, DocumentFormat::Yaml).unwrap();
        assert_eq!(value["name"], "John");
        assert_eq!(value["age"], 30);
        assert_eq!(value["ratio"], 0.5);
        assert_eq!(value["active"], true);
        assert!(value["nothing"].is_null());
        assert_eq!(value["tags"][1], "two");
        assert_eq!(value["address"]["city"], "Tokyo");
    }

    #[test]
    fn yaml_keys_preserve_document_order() {
        let value = parse_document("zeta: 1\nalpha: 2\nmid: 3\n", DocumentFormat::Yaml).unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn numeric_and_bool_keys_are_stringified() {
        let value = parse_document("1: one\ntrue: yes\n", DocumentFormat::Yaml).unwrap();
        assert_eq!(value["1"], "one");
        assert_eq!(value["true"], "yes");
    }

    #[test]
    fn infinite_float_is_rejected() {
        let err = parse_document("x: .inf\n", DocumentFormat::Yaml).unwrap_err();
        assert!(matches!(err, DocumentError::Unsupported { .. }));
    }

    #[test]
    fn unsupported_nodes_name_their_location() {
        let err = parse_document("limits:\n  - max: .nan\n", DocumentFormat::Yaml).unwrap_err();
        assert!(err.to_string().contains("limits.0.max"), "{err}");

        let err = parse_document("address:\n  ? [a, b]\n  : x\n", DocumentFormat::Yaml).unwrap_err();
        assert!(err.to_string().contains("address: mapping keys must be scalars"), "{err}");
    }

    #[test]
    fn colliding_stringified_keys_are_rejected() {
        let err = parse_document("1: one\n\"1\": also one\n", DocumentFormat::Yaml).unwrap_err();
        assert!(matches!(err, DocumentError::Unsupported { .. }));
        assert!(err.to_string().contains("key appears twice"), "{err}");
    }

    #[test]
    fn tags_are_ignored() {
        let value = parse_document("when: !date 2024-01-01\n", DocumentFormat::Yaml).unwrap();
        assert_eq!(value["when"], "2024-01-01");
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        let err = parse_document("a: [1, 2\n", DocumentFormat::Yaml).unwrap_err();
        assert!(err.is_parse_error());
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = parse_document("{\"a\": }", DocumentFormat::Json).unwrap_err();
        assert!(matches!(err, DocumentError::Json { .. }));
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(DocumentFormat::from_path(Path::new("a/b.json")), DocumentFormat::Json);
        assert_eq!(DocumentFormat::from_path(Path::new("a/b.JSON")), DocumentFormat::Json);
        assert_eq!(DocumentFormat::from_path(Path::new("a/b.yaml")), DocumentFormat::Yaml);
        assert_eq!(DocumentFormat::from_path(Path::new("a/b")), DocumentFormat::Yaml);
    }

    #[test]
    fn load_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_document(&dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, DocumentError::NotFound { .. }));
    }

    #[test]
    fn write_then_load_json_and_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let value = json!({"name": "テスト", "items": [1, 2, {"k": "v"}]});

        let json_path = dir.path().join("out/nested/doc.json");
        write_document(&json_path, &value, DocumentFormat::Json).unwrap();
        let text = std::fs::read_to_string(&json_path).unwrap();
        assert!(text.contains("テスト"), "non-ASCII text must not be escaped");
        assert_eq!(load_document(&json_path).unwrap(), value);

        let yaml_path = dir.path().join("doc.yaml");
        write_document(&yaml_path, &value, DocumentFormat::Yaml).unwrap();
        assert_eq!(load_document(&yaml_path).unwrap(), value);
    }

    #[test]
    fn empty_yaml_document_is_null() {
        let value = parse_document("", DocumentFormat::Yaml).unwrap();
        assert!(value.is_null());
    }
}
