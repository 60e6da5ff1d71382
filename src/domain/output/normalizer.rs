//! Schema smoothing of heterogeneous tool results.
//!
//! Source tools wrap their payloads inconsistently (`data`, `result`,
//! `response`, …) and sometimes return a single object where a batch would
//! be an array. Normalization promotes wrapped fields to the root while
//! keeping the originals, so template paths written against a normalized
//! view stay stable regardless of the source envelope.

use serde_json::{Map, Value};

/// Envelope keys whose contents are promoted to the root.
const WRAPPER_KEYS: [&str; 5] = ["data", "summary", "result", "response", "output"];

/// Keys kept in place while their primitive fields are copied to the root.
const FLATTEN_KEEP_KEYS: [&str; 4] = ["contributors", "user", "author", "goals"];

/// Normalizes a tool result document.
///
/// Mappings are processed key-by-key per the wrapper and flatten-and-keep
/// rules; a non-mapping becomes `{"value": v}` (or `{}` for null). Root
/// keys always win over promoted keys, and copying never descends into
/// nested structures beyond the documented `user.profile` case.
pub fn normalize_output(value: &Value) -> Value {
    let map = match value {
        Value::Object(map) => map,
        Value::Null => return Value::Object(Map::new()),
        other => {
            let mut wrapped = Map::new();
            wrapped.insert("value".to_string(), other.clone());
            return Value::Object(wrapped);
        }
    };

    let mut result = map.clone();

    for key in WRAPPER_KEYS {
        let Some(wrapped) = map.get(key) else {
            continue;
        };
        match wrapped {
            Value::Object(inner) => {
                for (k, v) in inner {
                    result.entry(k.clone()).or_insert_with(|| v.clone());
                }
            }
            Value::Array(items) => {
                if let Some(Value::Object(first)) = items.first() {
                    for (k, v) in first {
                        if is_primitive(v) {
                            result.entry(k.clone()).or_insert_with(|| v.clone());
                        }
                    }
                }
            }
            _ => {}
        }
    }

    // Runs after wrapper promotion so keys hoisted out of an envelope get
    // flattened too.
    for key in FLATTEN_KEEP_KEYS {
        let inner = match result.get(key) {
            Some(Value::Object(inner)) => inner.clone(),
            _ => continue,
        };
        for (k, v) in &inner {
            if is_primitive(v) {
                result.entry(k.clone()).or_insert_with(|| v.clone());
            }
        }
        if key == "user" {
            if let Some(Value::Object(profile)) = inner.get("profile") {
                for (k, v) in profile {
                    if is_primitive(v) {
                        result.entry(k.clone()).or_insert_with(|| v.clone());
                    }
                }
            }
        }
    }

    Value::Object(result)
}

fn is_primitive(value: &Value) -> bool {
    !matches!(value, Value::Object(_) | Value::Array(_))
}
