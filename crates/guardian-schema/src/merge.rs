//! # Hierarchy Merger
//!
//! Deep-merges schema fragment trees left to right. Later fragments have
//! higher precedence:
//!
//! - mapping + mapping: recurse key by key
//! - sequence + sequence: concatenate, earlier items first, duplicates kept
//! - anything else: the later value replaces the earlier one
//!
//! Keys present on only one side are copied through. Merging is neither
//! commutative nor safe to regroup, so callers supply fragments in
//! precedence order.

use serde_json::{Map, Value};

/// Merge `incoming` into `acc` in place.
pub fn merge_into(acc: &mut Value, incoming: &Value) {
    match (acc, incoming) {
        (Value::Object(acc_map), Value::Object(in_map)) => {
            for (key, in_val) in in_map {
                match acc_map.get_mut(key) {
                    Some(acc_val) => merge_into(acc_val, in_val),
                    None => {
                        acc_map.insert(key.clone(), in_val.clone());
                    }
                }
            }
        }
        (Value::Array(acc_items), Value::Array(in_items)) => {
            acc_items.extend(in_items.iter().cloned());
        }
        (acc, incoming) => *acc = incoming.clone(),
    }
}

/// Merge a sequence of fragment trees in order. An empty sequence yields an
/// empty mapping.
pub fn merge<'a, I>(fragments: I) -> Value
where
    I: IntoIterator<Item = &'a Value>,
{
    let mut iter = fragments.into_iter();
    let Some(first) = iter.next() else {
        return Value::Object(Map::new());
    };
    let mut acc = first.clone();
    for fragment in iter {
        merge_into(&mut acc, fragment);
    }
    acc
}
