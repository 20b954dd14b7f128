//! Merging incoming data onto a snapshot, and diffing the result back.

use serde_json::{Map, Value};
use tracing::warn;

use crate::types::value::{loose_eq, type_name};

/// Clone `snapshot` and overlay the values of `data` onto it.
///
/// Only keys already present in the snapshot whose value has the same type
/// are taken from `data`; nested objects are merged recursively, everything
/// else (arrays included) is replaced whole. Keys absent from the snapshot
/// are never added.
#[must_use]
pub fn merge_into_snapshot(data: &Value, snapshot: &Value) -> Value {
    let mut merged = snapshot.clone();
    overlay(&mut merged, data);
    merged
}

fn overlay(target: &mut Value, source: &Value) {
    let (Value::Object(target), Value::Object(source)) = (target, source) else {
        return;
    };
    for (key, incoming) in source {
        let Some(existing) = target.get_mut(key) else {
            continue;
        };
        if type_name(existing) != type_name(incoming) {
            continue;
        }
        if incoming.is_object() {
            overlay(existing, incoming);
        } else {
            existing.clone_from(incoming);
        }
    }
}

/// Values in `current` that differ from `original`, restricted to the
/// structure of `original`.
///
/// Only keys present in `original` are reported. Keys missing from
/// `current` and keys whose value changed type are skipped with a warning.
/// Arrays are compared as a whole and reported whole. Numbers compare
/// numerically. An unchanged tree yields an empty object.
#[must_use]
pub fn diff(current: &Value, original: &Value) -> Value {
    if loose_eq(current, original) {
        return Value::Object(Map::new());
    }
    match (current, original) {
        (Value::Object(current), Value::Object(original)) => Value::Object(diff_maps(current, original)),
        _ if type_name(current) != type_name(original)
            && (is_container(current) || is_container(original)) =>
        {
            warn!(
                from = type_name(original),
                to = type_name(current),
                "ignoring structural change at the root"
            );
            Value::Object(Map::new())
        }
        _ => current.clone(),
    }
}

fn is_container(value: &Value) -> bool {
    value.is_object() || value.is_array()
}

fn diff_maps(current: &Map<String, Value>, original: &Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::new();
    for (key, before) in original {
        let Some(after) = current.get(key) else {
            warn!(key = %key, "ignoring removed key");
            continue;
        };
        if loose_eq(after, before) {
            continue;
        }
        if type_name(after) != type_name(before) {
            warn!(
                key = %key,
                from = type_name(before),
                to = type_name(after),
                "ignoring type change"
            );
            continue;
        }
        match (after, before) {
            (Value::Object(a), Value::Object(b)) => {
                let nested = diff_maps(a, b);
                if !nested.is_empty() {
                    out.insert(key.clone(), Value::Object(nested));
                }
            }
            _ => {
                out.insert(key.clone(), after.clone());
            }
        }
    }
    out
}
