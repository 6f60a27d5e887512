//! Value helpers
//!
//! Documents are plain `serde_json::Value`s. This module holds the few
//! transformations the store applies to them on the way in.

use serde_json::{Map, Value};

/// Replace every integer in `value` with its decimal string, recursively.
///
/// Floats and booleans are left alone. Object keys are already strings.
pub fn coerce_integers(value: Value) -> Value {
    match value {
        Value::Number(n) if n.is_i64() || n.is_u64() => Value::String(n.to_string()),
        Value::Array(items) => Value::Array(items.into_iter().map(coerce_integers).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, coerce_integers(v)))
                .collect(),
        ),
        other => other,
    }
}

/// Merge `incoming` into `existing`.
///
/// Only when both sides are objects are keys merged (recursively);
/// otherwise `incoming` replaces `existing` wholesale.
pub fn merge_document(existing: Value, incoming: Value) -> Value {
    match (existing, incoming) {
        (Value::Object(mut base), Value::Object(update)) => {
            deep_merge(&mut base, update);
            Value::Object(base)
        }
        (_, incoming) => incoming,
    }
}

/// Recursive union of two objects. Conflicting keys take the incoming
/// value unless both sides hold objects, in which case they merge.
pub fn deep_merge(base: &mut Map<String, Value>, update: Map<String, Value>) {
    for (key, incoming) in update {
        match incoming {
            Value::Object(nested) => match base.get_mut(&key) {
                Some(Value::Object(existing)) => deep_merge(existing, nested),
                _ => {
                    base.insert(key, Value::Object(nested));
                }
            },
            other => {
                base.insert(key, other);
            }
        }
    }
}

/// Whether a document counts as "nothing stored" for whole-document reads
pub fn is_empty_document(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}
