//! # Rule Engine
//!
//! Evaluates a document against a rule set. Every rule is evaluated and
//! every error collected in one pass; within a single field the checks run
//! in this order:
//!
//! 1. presence (`required` and absent)
//! 2. prohibition (`prohibited` and present)
//! 3. kind check (present values of checked kinds only)
//! 4. custom predicates (present values only; one combined error)
//! 5. common definition lookup (`uses_common`)
//! 6. nested rules (present values of the right shape)
//!
//! Data problems are report entries. A rule set that cannot be evaluated
//! (required and prohibited together, an unregistered predicate) is a
//! [`SchemaError`] raised before any data is looked at.

use guardian_core::FieldPath;
use serde_json::{Map, Value};

use crate::error::SchemaError;
use crate::logical::LogicalSchema;
use crate::predicate::PredicateRegistry;
use crate::report::{ErrorEntry, ErrorKind, ValidationReport};
use crate::rule::{CommonDefinitions, FieldKind, FieldRule};

/// Rule-form validator bound to a predicate registry and common
/// definitions.
#[derive(Debug, Clone, Copy)]
pub struct RuleEngine<'a> {
    predicates: &'a PredicateRegistry,
    common: &'a CommonDefinitions,
}

impl<'a> RuleEngine<'a> {
    /// Bind an engine to its lookup tables.
    pub fn new(predicates: &'a PredicateRegistry, common: &'a CommonDefinitions) -> Self {
        Self { predicates, common }
    }

    /// Validate `data` against a logical schema's rules.
    pub fn validate(&self, schema: &LogicalSchema, data: &Value) -> Result<ValidationReport, SchemaError> {
        self.validate_rules(schema.rules(), data)
    }

    /// Validate `data` against a rule set.
    pub fn validate_rules(&self, rules: &[FieldRule], data: &Value) -> Result<ValidationReport, SchemaError> {
        self.check_rules(rules, &FieldPath::root())?;

        let mut report = ValidationReport::new();
        match data {
            Value::Object(map) => self.evaluate_level(rules, map, &FieldPath::root(), &mut report),
            _ if rules.is_empty() => {}
            _ => report.push(ErrorEntry::new(
                &FieldPath::root(),
                ErrorKind::TypeMismatch,
                "document must be a mapping",
            )),
        }
        Ok(report)
    }

    fn check_rules(&self, rules: &[FieldRule], parent: &FieldPath) -> Result<(), SchemaError> {
        for rule in rules {
            let path = parent.key(&rule.name);
            if rule.required && rule.prohibited {
                return Err(SchemaError::ConflictingRule {
                    field: path.to_string(),
                });
            }
            if let Some(unknown) = rule.custom_rules.iter().find(|id| !self.predicates.contains(id)) {
                return Err(SchemaError::UnknownPredicate {
                    field: path.to_string(),
                    predicate: unknown.clone(),
                });
            }
            self.check_rules(&rule.nested, &path)?;
        }
        Ok(())
    }

    fn evaluate_level(
        &self,
        rules: &[FieldRule],
        data: &Map<String, Value>,
        parent: &FieldPath,
        report: &mut ValidationReport,
    ) {
        for rule in rules {
            self.evaluate_field(rule, data.get(&rule.name), &parent.key(&rule.name), report);
        }
    }

    fn evaluate_field(
        &self,
        rule: &FieldRule,
        value: Option<&Value>,
        path: &FieldPath,
        report: &mut ValidationReport,
    ) {
        let common = if rule.uses_common {
            self.common.get(&rule.name)
        } else {
            None
        };
        let kind = match (&rule.kind, common) {
            (FieldKind::FreeForm, Some(def)) => &def.kind,
            (own, _) => own,
        };
        let label = match common {
            Some(def) if rule.description.is_empty() && !def.description.is_empty() => {
                def.description.as_str()
            }
            _ => rule.label(),
        };

        if rule.required && value.is_none() {
            report.push(ErrorEntry::new(path, ErrorKind::Missing, format!("{label} is required")));
        }
        if rule.prohibited && value.is_some() {
            report.push(ErrorEntry::new(
                path,
                ErrorKind::Prohibited,
                format!("{label} is not allowed"),
            ));
        }

        let mut shape_ok = true;
        if let Some(value) = value {
            if let Some(expected) = kind_mismatch(kind, value) {
                shape_ok = false;
                report.push(ErrorEntry::new(
                    path,
                    ErrorKind::TypeMismatch,
                    format!("{label} must be {expected}"),
                ));
            }

            let failing: Vec<&str> = rule
                .custom_rules
                .iter()
                .filter(|id| {
                    self.predicates
                        .get(id)
                        .is_some_and(|predicate| !predicate.evaluate(value))
                })
                .map(String::as_str)
                .collect();
            if !failing.is_empty() {
                report.push(ErrorEntry::new(
                    path,
                    ErrorKind::CustomRule,
                    format!("{label} failed custom rules: {}", failing.join(", ")),
                ));
            }
        }

        if rule.uses_common && common.is_none() {
            report.push(ErrorEntry::new(
                path,
                ErrorKind::DefinitionMissing,
                format!("{label} is not defined in the common definitions"),
            ));
        }

        if let (Some(value), true) = (value, shape_ok && !rule.nested.is_empty()) {
            self.evaluate_nested(rule, kind, value, path, report);
        }
    }

    fn evaluate_nested(
        &self,
        rule: &FieldRule,
        kind: &FieldKind,
        value: &Value,
        path: &FieldPath,
        report: &mut ValidationReport,
    ) {
        match value {
            Value::Object(map) => self.evaluate_level(&rule.nested, map, path, report),
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    let item_path = path.index(i);
                    match item {
                        Value::Object(map) => self.evaluate_level(&rule.nested, map, &item_path, report),
                        _ if *kind == FieldKind::List => report.push(ErrorEntry::new(
                            &item_path,
                            ErrorKind::TypeMismatch,
                            format!("{} items must be mappings", rule.label()),
                        )),
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }
}

/// The expected-kind phrase when `value` does not match `kind`.
fn kind_mismatch(kind: &FieldKind, value: &Value) -> Option<&'static str> {
    let ok = match kind {
        FieldKind::String => value.is_string(),
        FieldKind::Integer => is_whole_number(value),
        FieldKind::List => value.is_array(),
        FieldKind::Object => value.is_object(),
        FieldKind::Element(_) | FieldKind::FreeForm => true,
    };
    if ok {
        return None;
    }
    Some(match kind {
        FieldKind::String => "a string",
        FieldKind::Integer => "an integer",
        FieldKind::List => "a list",
        _ => "an object",
    })
}

fn is_whole_number(value: &Value) -> bool {
    match value {
        Value::Number(n) if n.is_i64() || n.is_u64() => true,
        Value::Number(n) => n.as_f64().is_some_and(|f| f.is_finite() && f.fract() == 0.0),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn validate(rules: &[FieldRule], data: Value) -> ValidationReport {
        let predicates = PredicateRegistry::with_builtins();
        let common = CommonDefinitions::new();
        RuleEngine::new(&predicates, &common)
            .validate_rules(rules, &data)
            .unwrap()
    }

    fn age_rule() -> FieldRule {
        FieldRule::new("age", FieldKind::Integer).required().describe("Age")
    }

    #[test]
    fn matching_document_passes() {
        assert!(validate(&[age_rule()], json!({"age": 30})).is_success());
    }

    #[test]
    fn type_mismatch_names_the_field() {
        let report = validate(&[age_rule()], json!({"age": "30"}));
        assert_eq!(report.len(), 1);
        let entry = &report.errors()[0];
        assert_eq!(entry.field_path, "age");
        assert_eq!(entry.kind, Some(ErrorKind::TypeMismatch));
        assert!(entry.message.contains("Age"));
    }

    #[test]
    fn missing_required_field_skips_type_check() {
        let report = validate(&[age_rule()], json!({}));
        assert_eq!(report.len(), 1);
        assert_eq!(report.errors()[0].kind, Some(ErrorKind::Missing));
        assert_eq!(report.errors()[0].message, "Age is required");
    }

    #[test]
    fn all_fields_are_checked_in_rule_order() {
        let rules = vec![
            FieldRule::new("name", FieldKind::String).required(),
            age_rule(),
            FieldRule::new("tags", FieldKind::List),
        ];
        let report = validate(&rules, json!({"age": true, "tags": "x"}));
        let paths: Vec<&str> = report.errors().iter().map(|e| e.field_path.as_str()).collect();
        assert_eq!(paths, vec!["name", "age", "tags"]);
    }

    #[test]
    fn integer_accepts_whole_floats_but_not_bools() {
        let rules = [FieldRule::new("n", FieldKind::Integer)];
        assert!(validate(&rules, json!({"n": 3.0})).is_success());
        assert!(!validate(&rules, json!({"n": 3.5})).is_success());
        assert!(!validate(&rules, json!({"n": false})).is_success());
    }

    #[test]
    fn prohibited_field_present() {
        let rules = [FieldRule::new("legacy", FieldKind::String).prohibited()];
        let report = validate(&rules, json!({"legacy": "x"}));
        assert_eq!(report.errors()[0].kind, Some(ErrorKind::Prohibited));
        assert!(validate(&rules, json!({})).is_success());
    }

    #[test]
    fn failing_predicates_combine_into_one_error() {
        let rules = [FieldRule::new("code", FieldKind::FreeForm)
            .with_predicate("non_empty")
            .with_predicate("positive")
            .with_predicate("no_whitespace")];
        let report = validate(&rules, json!({"code": "  "}));
        assert_eq!(report.len(), 1);
        assert_eq!(report.errors()[0].kind, Some(ErrorKind::CustomRule));
        assert_eq!(
            report.errors()[0].message,
            "code failed custom rules: non_empty, positive, no_whitespace"
        );
    }

    #[test]
    fn predicates_skip_absent_values() {
        let rules = [FieldRule::new("code", FieldKind::String).with_predicate("non_empty")];
        assert!(validate(&rules, json!({})).is_success());
    }

    #[test]
    fn missing_common_definition_is_reported_regardless_of_type() {
        let rules = [FieldRule::new("commonLabel", FieldKind::String).using_common()];
        let report = validate(&rules, json!({"commonLabel": "ok"}));
        assert_eq!(report.len(), 1);
        assert_eq!(report.errors()[0].kind, Some(ErrorKind::DefinitionMissing));
    }

    #[test]
    fn missing_common_definition_is_reported_alongside_type_mismatch() {
        let rules = [FieldRule::new("commonLabel", FieldKind::String).using_common()];
        let report = validate(&rules, json!({"commonLabel": 5}));
        let kinds: Vec<Option<ErrorKind>> = report.errors().iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![Some(ErrorKind::TypeMismatch), Some(ErrorKind::DefinitionMissing)]
        );
        assert!(report.errors().iter().all(|e| e.field_path == "commonLabel"));
    }

    #[test]
    fn common_definition_supplies_kind_and_description() {
        let predicates = PredicateRegistry::new();
        let mut common = CommonDefinitions::new();
        common.insert(FieldRule::new("shared", FieldKind::Integer).describe("Shared value"));
        let engine = RuleEngine::new(&predicates, &common);
        let rules = [FieldRule::new("shared", FieldKind::FreeForm).using_common()];

        assert!(engine.validate_rules(&rules, &json!({"shared": 1})).unwrap().is_success());
        let report = engine.validate_rules(&rules, &json!({"shared": "x"})).unwrap();
        assert_eq!(report.errors()[0].message, "Shared value must be an integer");
    }

    #[test]
    fn nested_object_rules_use_dotted_paths() {
        let rules = [FieldRule::new("address", FieldKind::Object)
            .with_nested(vec![FieldRule::new("city", FieldKind::String).required()])];
        let report = validate(&rules, json!({"address": {}}));
        assert_eq!(report.errors()[0].field_path, "address.city");
    }

    #[test]
    fn nested_list_rules_apply_per_item() {
        let rules = [FieldRule::new("tags", FieldKind::List)
            .with_nested(vec![FieldRule::new("name", FieldKind::String).required()])];
        let report = validate(&rules, json!({"tags": [{"name": "a"}, {}, 3]}));
        let paths: Vec<&str> = report.errors().iter().map(|e| e.field_path.as_str()).collect();
        assert_eq!(paths, vec!["tags.1.name", "tags.2"]);
    }

    #[test]
    fn nested_rules_skip_mismatched_values() {
        let rules = [FieldRule::new("address", FieldKind::Object)
            .with_nested(vec![FieldRule::new("city", FieldKind::String).required()])];
        let report = validate(&rules, json!({"address": "Tokyo"}));
        assert_eq!(report.len(), 1);
        assert_eq!(report.errors()[0].field_path, "address");
    }

    #[test]
    fn element_kinds_walk_nested_mappings() {
        let rules = [FieldRule::new("FormA", FieldKind::Element("form".into())).with_nested(vec![
            FieldRule::new("AAA", FieldKind::Element("label".into())).required(),
        ])];
        let report = validate(&rules, json!({"FormA": {"BBB": "x"}}));
        assert_eq!(report.errors()[0].field_path, "FormA.AAA");
    }

    #[test]
    fn non_mapping_document_is_a_root_error() {
        let report = validate(&[age_rule()], json!([1, 2]));
        assert_eq!(report.errors()[0].field_path, "(root)");
    }

    #[test]
    fn conflicting_rule_is_an_error_not_a_report() {
        let predicates = PredicateRegistry::new();
        let common = CommonDefinitions::new();
        let rules = [FieldRule::new("a", FieldKind::Object).with_nested(vec![
            FieldRule::new("b", FieldKind::String).required().prohibited(),
        ])];
        let err = RuleEngine::new(&predicates, &common)
            .validate_rules(&rules, &json!({}))
            .unwrap_err();
        assert!(matches!(err, SchemaError::ConflictingRule { ref field } if field == "a.b"));
    }

    #[test]
    fn unknown_predicate_is_an_error() {
        let predicates = PredicateRegistry::new();
        let common = CommonDefinitions::new();
        let rules = [FieldRule::new("a", FieldKind::String).with_predicate("nope")];
        let err = RuleEngine::new(&predicates, &common)
            .validate_rules(&rules, &json!({}))
            .unwrap_err();
        assert!(matches!(err, SchemaError::UnknownPredicate { ref predicate, .. } if predicate == "nope"));
    }
}
