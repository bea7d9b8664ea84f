//! Dotted-path lookup and recursive merge over JSON values.

use serde_json::{Map, Value};

/// Descends `root` following a dotted `path` (`a.b.c`).
///
/// Object segments are looked up by key; numeric segments index arrays.
#[must_use]
pub fn lookup<'a>(root: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = root.get(first)?;

    for segment in segments {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    Some(current)
}

/// Merges `incoming` into `stable`.
///
/// When both sides hold an object under the same key the merge recurses;
/// otherwise the incoming value replaces the stored one.
pub fn merge(stable: &mut Value, incoming: Value) {
    match (stable, incoming) {
        (Value::Object(stable_map), Value::Object(incoming_map)) => {
            for (key, value) in incoming_map {
                match stable_map.get_mut(&key) {
                    Some(existing) if existing.is_object() && value.is_object() => {
                        merge(existing, value);
                    }
                    _ => {
                        stable_map.insert(key, value);
                    }
                }
            }
        }
        (stable, incoming) => *stable = incoming,
    }
}

/// Writes `value` at the dotted `path` inside `root`, creating intermediate
/// objects and merging with whatever already lives under the root key.
pub fn write(root: &mut Map<String, Value>, path: &str, value: Value) {
    let segments: Vec<&str> = path.split('.').collect();

    let (head, tail) = match segments.split_first() {
        Some((head, tail)) if !tail.is_empty() => (*head, tail),
        _ => {
            root.insert(path.to_string(), value);
            return;
        }
    };

    let nested = tail.iter().rev().fold(value, |acc, segment| {
        let mut map = Map::new();
        map.insert((*segment).to_string(), acc);
        Value::Object(map)
    });

    match root.get_mut(head) {
        Some(existing) if existing.is_object() => merge(existing, nested),
        _ => {
            root.insert(head.to_string(), nested);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_lookup_nested_and_indexed() {
        let root = map(json!({"a": {"b": {"c": 3}}, "items": [{"id": "x"}, {"id": "y"}]}));

        assert_eq!(lookup(&root, "a.b.c"), Some(&json!(3)));
        assert_eq!(lookup(&root, "items.1.id"), Some(&json!("y")));
        assert_eq!(lookup(&root, "a.missing"), None);
        assert_eq!(lookup(&root, "a.b.c.d"), None);
        assert_eq!(lookup(&root, "items.9"), None);
    }

    #[test]
    fn test_write_creates_intermediate_objects() {
        let mut root = Map::new();
        write(&mut root, "a.b.c", json!(1));

        assert_eq!(Value::Object(root), json!({"a": {"b": {"c": 1}}}));
    }

    #[test]
    fn test_write_merges_siblings() {
        let mut root = Map::new();
        write(&mut root, "a.b", json!(1));
        write(&mut root, "a.c", json!(2));

        assert_eq!(Value::Object(root), json!({"a": {"b": 1, "c": 2}}));
    }

    #[test]
    fn test_write_overwrites_leaf_and_scalar_root() {
        let mut root = map(json!({"a": {"b": {"keep": true}}, "s": 5}));
        write(&mut root, "a.b", json!("leaf"));
        write(&mut root, "s.t", json!(1));

        assert_eq!(Value::Object(root), json!({"a": {"b": "leaf"}, "s": {"t": 1}}));
    }

    #[test]
    fn test_merge_recurses() {
        let mut stable = json!({"a": {"x": 1, "y": {"z": 1}}});
        merge(&mut stable, json!({"a": {"y": {"w": 2}}, "b": 3}));

        assert_eq!(stable, json!({"a": {"x": 1, "y": {"z": 1, "w": 2}}, "b": 3}));
    }
}
