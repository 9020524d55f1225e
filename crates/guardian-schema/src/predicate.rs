//! # Custom Predicates
//!
//! Field rules reference custom checks by identifier (`custom_rules:
//! [non_empty]`). The identifiers resolve against a [`PredicateRegistry`]
//! owned by the validation context, so schema files stay pure data.
//!
//! Any `Fn(&Value) -> bool + Send + Sync` is a [`Predicate`]:
//!
//! ```
//! use guardian_schema::predicate::PredicateRegistry;
//!
//! let mut registry = PredicateRegistry::with_builtins();
//! registry.register("even", |v: &serde_json::Value| {
//!     v.as_i64().is_some_and(|n| n % 2 == 0)
//! });
//! assert!(registry.contains("even"));
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

/// A single-argument check applied to a present field value.
pub trait Predicate: Send + Sync {
    /// True when the value passes.
    fn evaluate(&self, value: &Value) -> bool;
}

impl<F> Predicate for F
where
    F: Fn(&Value) -> bool + Send + Sync,
{
    fn evaluate(&self, value: &Value) -> bool {
        self(value)
    }
}

/// Identifier-keyed predicate lookup table.
#[derive(Clone, Default)]
pub struct PredicateRegistry {
    predicates: BTreeMap<String, Arc<dyn Predicate>>,
}

impl PredicateRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in predicates: `non_empty`,
    /// `non_negative`, `positive`, `email_like`, `no_whitespace`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("non_empty", non_empty);
        registry.register("non_negative", |v: &Value| {
            v.as_f64().is_some_and(|n| n >= 0.0)
        });
        registry.register("positive", |v: &Value| v.as_f64().is_some_and(|n| n > 0.0));
        registry.register("email_like", email_like);
        registry.register("no_whitespace", |v: &Value| {
            v.as_str().is_some_and(|s| !s.chars().any(char::is_whitespace))
        });
        registry
    }

    /// Register `predicate` under `id`, replacing any previous entry.
    pub fn register(&mut self, id: impl Into<String>, predicate: impl Predicate + 'static) {
        self.predicates.insert(id.into(), Arc::new(predicate));
    }

    /// Look up a predicate.
    pub fn get(&self, id: &str) -> Option<&Arc<dyn Predicate>> {
        self.predicates.get(id)
    }

    /// Whether `id` is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.predicates.contains_key(id)
    }

    /// Registered identifiers, sorted.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.predicates.keys().map(String::as_str)
    }
}

impl fmt::Debug for PredicateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.predicates.keys()).finish()
    }
}

fn non_empty(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
    }
}

fn email_like(value: &Value) -> bool {
    let Some(s) = value.as_str() else {
        return false;
    };
    match s.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.split('.').count() >= 2
                && domain.split('.').all(|part| !part.is_empty())
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn check(id: &str, value: Value) -> bool {
        PredicateRegistry::with_builtins()
            .get(id)
            .unwrap()
            .evaluate(&value)
    }

    #[test]
    fn builtins_are_registered() {
        let registry = PredicateRegistry::with_builtins();
        let ids: Vec<&str> = registry.ids().collect();
        assert_eq!(
            ids,
            vec!["email_like", "no_whitespace", "non_empty", "non_negative", "positive"]
        );
    }

    #[test]
    fn non_empty_rejects_blank_values() {
        assert!(check("non_empty", json!("x")));
        assert!(check("non_empty", json!(0)));
        assert!(!check("non_empty", json!("  ")));
        assert!(!check("non_empty", json!([])));
        assert!(!check("non_empty", json!({})));
        assert!(!check("non_empty", Value::Null));
    }

    #[test]
    fn numeric_predicates() {
        assert!(check("non_negative", json!(0)));
        assert!(!check("non_negative", json!(-1)));
        assert!(!check("positive", json!(0)));
        assert!(check("positive", json!(0.5)));
        assert!(!check("positive", json!("5")));
    }

    #[test]
    fn email_like_shape() {
        assert!(check("email_like", json!("a@example.com")));
        assert!(!check("email_like", json!("a@example")));
        assert!(!check("email_like", json!("@example.com")));
        assert!(!check("email_like", json!("a@b@c.com")));
        assert!(!check("email_like", json!("a@example..com")));
    }

    #[test]
    fn no_whitespace() {
        assert!(check("no_whitespace", json!("abc")));
        assert!(!check("no_whitespace", json!("a b")));
        assert!(!check("no_whitespace", json!(3)));
    }

    #[test]
    fn closures_register_and_replace() {
        let mut registry = PredicateRegistry::new();
        registry.register("always", |_: &Value| true);
        assert!(registry.get("always").unwrap().evaluate(&Value::Null));
        registry.register("always", |_: &Value| false);
        assert!(!registry.get("always").unwrap().evaluate(&Value::Null));
        assert_eq!(format!("{registry:?}"), "{\"always\"}");
    }
}
