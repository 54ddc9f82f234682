//! Dotted-path access into JSON documents
//!
//! Paths are dot-separated; numeric segments index into arrays. `set_path`
//! creates missing intermediates (objects, or arrays when the next segment
//! is numeric), which is what extension restoration relies on.

use serde_json::Value;

fn parse_index(segment: &str) -> Option<usize> {
    segment.parse::<usize>().ok()
}

/// Read the value at a dotted path
pub fn get_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(parse_index(segment)?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Write a value at a dotted path, creating intermediate containers
///
/// Existing values along the path are overwritten only when they are not
/// containers of the required kind. Idempotent: setting the same value
/// twice leaves the document unchanged.
pub fn set_path(target: &mut Value, path: &str, new_value: Value) {
    let segments: Vec<&str> = path.split('.').collect();
    set_segments(target, &segments, new_value);
}

fn set_segments(target: &mut Value, segments: &[&str], new_value: Value) {
    let Some((head, rest)) = segments.split_first() else {
        *target = new_value;
        return;
    };

    match parse_index(head) {
        Some(index) => {
            if !target.is_array() {
                *target = Value::Array(Vec::new());
            }
            if let Value::Array(items) = target {
                while items.len() <= index {
                    items.push(Value::Null);
                }
                set_segments(&mut items[index], rest, new_value);
            }
        }
        None => {
            if !target.is_object() {
                *target = Value::Object(serde_json::Map::new());
            }
            if let Value::Object(map) = target {
                let entry = map.entry(head.to_string()).or_insert(Value::Null);
                set_segments(entry, rest, new_value);
            }
        }
    }
}

/// Remove the value at a dotted path; returns it when present
pub fn remove_path(target: &mut Value, path: &str) -> Option<Value> {
    let segments: Vec<&str> = path.split('.').collect();
    let (last, prefix) = segments.split_last()?;

    let mut current = target;
    for segment in prefix {
        current = match current {
            Value::Object(map) => map.get_mut(*segment)?,
            Value::Array(items) => items.get_mut(parse_index(segment)?)?,
            _ => return None,
        };
    }
    match current {
        Value::Object(map) => map.remove(*last),
        Value::Array(items) => {
            let index = parse_index(last)?;
            (index < items.len()).then(|| items.remove(index))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn get_walks_objects_and_arrays() {
        let doc = json!({"a": {"b": [{"c": 1}, {"c": 2}]}});
        assert_eq!(get_path(&doc, "a.b.1.c"), Some(&json!(2)));
        assert_eq!(get_path(&doc, "a.b.2.c"), None);
        assert_eq!(get_path(&doc, "a.missing"), None);
    }

    #[test]
    fn set_creates_intermediate_objects() {
        let mut doc = json!({});
        set_path(&mut doc, "a.b.c", json!(7));
        assert_eq!(doc, json!({"a": {"b": {"c": 7}}}));
    }

    #[test]
    fn set_creates_arrays_for_numeric_segments() {
        let mut doc = json!({});
        set_path(&mut doc, "tools.1.name", json!("search"));
        assert_eq!(doc, json!({"tools": [null, {"name": "search"}]}));
    }

    #[test]
    fn set_is_idempotent() {
        let mut doc = json!({"a": 1});
        set_path(&mut doc, "b.c", json!("x"));
        let once = doc.clone();
        set_path(&mut doc, "b.c", json!("x"));
        assert_eq!(doc, once);
    }

    #[test]
    fn remove_returns_the_value() {
        let mut doc = json!({"a": {"b": 3}, "keep": true});
        assert_eq!(remove_path(&mut doc, "a.b"), Some(json!(3)));
        assert_eq!(doc, json!({"a": {}, "keep": true}));
        assert_eq!(remove_path(&mut doc, "a.b"), None);
    }
}
