//! Dotted-path access into the state tree.

use serde_json::{Map, Value};

/// Split a dotted path into segments.
pub(crate) fn segments(path: &str) -> Vec<&str> {
    if path.is_empty() {
        return Vec::new();
    }
    path.split('.').collect()
}

fn child<'a>(node: &'a Value, key: &str) -> Option<&'a Value> {
    match node {
        Value::Object(map) => map.get(key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

/// Resolve `segments` from `root`. `None` means the path is undefined;
/// an explicit JSON `null` is defined.
pub(crate) fn get<'a, S: AsRef<str>>(root: &'a Value, segments: &[S]) -> Option<&'a Value> {
    segments
        .iter()
        .try_fold(root, |node, key| child(node, key.as_ref()))
}

/// Convenience wrapper over [`get`] taking a dotted path.
pub(crate) fn get_dotted<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    get(root, &segments(path))
}

/// Own keys of a container, in order. Arrays yield their indices.
pub(crate) fn keys(node: &Value) -> Vec<String> {
    match node {
        Value::Object(map) => map.keys().cloned().collect(),
        Value::Array(items) => (0..items.len()).map(|i| i.to_string()).collect(),
        _ => Vec::new(),
    }
}

/// Whether `key` is an own key of `node`.
pub(crate) fn has_key(node: &Value, key: &str) -> bool {
    child(node, key).is_some()
}

/// Write `value` at `segments`, creating intermediate objects. Intermediate
/// nodes that are not containers are replaced by empty objects so the path
/// always connects. Writing into a non-container root is a no-op.
pub(crate) fn set<S: AsRef<str>>(root: &mut Value, segments: &[S], value: Value) {
    let Some((last, parents)) = segments.split_last() else {
        return;
    };
    if !(root.is_object() || root.is_array()) {
        return;
    }
    let mut node = root;
    for key in parents {
        node = child_mut_or_insert(node, key.as_ref());
    }
    put(node, last.as_ref(), value);
}

/// Convenience wrapper over [`set`] taking a dotted path.
pub(crate) fn set_dotted(root: &mut Value, path: &str, value: Value) {
    set(root, &segments(path), value);
}

fn child_mut_or_insert<'a>(node: &'a mut Value, key: &str) -> &'a mut Value {
    let index = match node {
        Value::Array(items) => key.parse::<usize>().ok().filter(|&i| i < items.len()),
        _ => None,
    };
    if index.is_none() && !node.is_object() {
        *node = Value::Object(Map::new());
    }
    let slot = match index {
        Some(i) => &mut node[i],
        None => &mut node[key],
    };
    if !(slot.is_object() || slot.is_array()) {
        *slot = Value::Object(Map::new());
    }
    slot
}

fn put(node: &mut Value, key: &str, value: Value) {
    match node {
        Value::Object(map) => {
            map.insert(key.to_owned(), value);
        }
        Value::Array(items) => match key.parse::<usize>() {
            Ok(i) if i < items.len() => items[i] = value,
            Ok(i) if i == items.len() => items.push(value),
            _ => {}
        },
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn get_nested_and_array() {
        let data = json!({"a": {"b": [10, {"c": null}]}});
        assert_eq!(get_dotted(&data, "a.b.0"), Some(&json!(10)));
        assert_eq!(get_dotted(&data, "a.b.1.c"), Some(&Value::Null));
        assert_eq!(get_dotted(&data, "a.b.2"), None);
        assert_eq!(get_dotted(&data, "a.x"), None);
        assert_eq!(get_dotted(&data, "a.b.0.deeper"), None);
    }

    #[test]
    fn set_creates_intermediates() {
        let mut data = json!({});
        set_dotted(&mut data, "a.b.c", json!(1));
        assert_eq!(data, json!({"a": {"b": {"c": 1}}}));
    }

    #[test]
    fn set_replaces_scalar_intermediate() {
        let mut data = json!({"a": 5});
        set_dotted(&mut data, "a.b", json!(true));
        assert_eq!(data, json!({"a": {"b": true}}));
    }

    #[test]
    fn set_into_array_element() {
        let mut data = json!({"list": [{"v": 1}, {"v": 2}]});
        set_dotted(&mut data, "list.1.v", json!(9));
        assert_eq!(data, json!({"list": [{"v": 1}, {"v": 9}]}));
    }

    #[test]
    fn set_on_scalar_root_is_noop() {
        let mut data = json!(3);
        set_dotted(&mut data, "a", json!(1));
        assert_eq!(data, json!(3));
    }

    #[test]
    fn keys_in_insertion_order() {
        let data = json!({"z": 1, "a": 2, "m": 3});
        assert_eq!(keys(&data), vec!["z", "a", "m"]);
        assert_eq!(keys(&json!([7, 8])), vec!["0", "1"]);
        assert!(keys(&json!("s")).is_empty());
        assert!(has_key(&data, "a"));
        assert!(!has_key(&data, "q"));
    }
}
