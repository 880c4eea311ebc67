use crate::value::Value;
use std::collections::BTreeMap;

/// The flattened form of a tree: flat path keys to scalar leaf values.
pub type FlatMap = BTreeMap<String, Value>;

/// Flattens a tree into a single-level map by pre-order traversal.
///
/// Mapping keys are joined with `.`, sequence indices are rendered `[i]`,
/// so `{"users": [{"name": "a"}]}` yields `{"users.[0].name": "a"}`.
/// A scalar root flattens to the empty key. Empty arrays and objects
/// produce no entries at all; flattening is lossy for them.
#[must_use]
pub fn flatten(tree: &Value) -> FlatMap {
    let mut flat = FlatMap::new();
    flatten_into(tree, None, &mut flat);
    log::trace!("flattened tree into {} leaf entries", flat.len());
    flat
}

fn flatten_into(value: &Value, parent: Option<&str>, out: &mut FlatMap) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = join(parent, key);
                flatten_into(child, Some(&path), out);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                let path = join(parent, &format!("[{index}]"));
                flatten_into(child, Some(&path), out);
            }
        }
        scalar => {
            out.insert(parent.unwrap_or("").to_string(), scalar.clone());
        }
    }
}

fn join(parent: Option<&str>, key: &str) -> String {
    match parent {
        Some(parent) => format!("{parent}.{key}"),
        None => key.to_string(),
    }
}

/// Rebuilds a nested tree from a flattened map; the inverse of [`flatten`]
/// for trees of scalars, sequences and string-keyed mappings.
///
/// Each flat key is re-split on `.` and re-inserted into a fresh tree:
/// `[n]` segments create or grow sequences (gaps are null-padded), other
/// segments create mappings. When two keys collide, or a segment's kind
/// disagrees with the node already in place, the later write wins.
#[must_use]
pub fn rebuild(flat: &FlatMap) -> Value {
    let mut root = Value::Object(BTreeMap::new());
    for (key, value) in flat {
        if key.is_empty() {
            // A scalar root flattened to the empty key.
            root = value.clone();
            continue;
        }
        let segments: Vec<&str> = key.split('.').collect();
        insert_path(&mut root, &segments, value);
    }
    root
}

fn insert_path(node: &mut Value, segments: &[&str], value: &Value) {
    let segment = segments[0];
    let rest = &segments[1..];

    match parse_index(segment) {
        Some(index) => {
            if !matches!(node, Value::Array(_)) {
                *node = Value::Array(Vec::new());
            }
            if let Value::Array(items) = node {
                while items.len() <= index {
                    items.push(Value::Null);
                }
                if rest.is_empty() {
                    items[index] = value.clone();
                } else {
                    insert_path(&mut items[index], rest, value);
                }
            }
        }
        None => {
            if !matches!(node, Value::Object(_)) {
                *node = Value::Object(BTreeMap::new());
            }
            if let Value::Object(map) = node {
                if rest.is_empty() {
                    map.insert(segment.to_string(), value.clone());
                } else {
                    let child = map
                        .entry(segment.to_string())
                        .or_insert(Value::Null);
                    insert_path(child, rest, value);
                }
            }
        }
    }
}

fn parse_index(segment: &str) -> Option<usize> {
    segment
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .and_then(|s| s.parse::<usize>().ok())
}

/// Turns a flat key into the user-facing path spelling by stripping index
/// brackets: `users.[0].name` becomes `users.0.name`.
#[must_use]
pub fn clean_path(flat_key: &str) -> String {
    flat_key
        .split('.')
        .map(|segment| match parse_index(segment) {
            Some(index) => index.to_string(),
            None => segment.to_string(),
        })
        .collect::<Vec<String>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Value {
        let json = r#"{
            "name": "My App",
            "servers": [
                { "host": "a.example.com", "port": 8080.0 },
                { "host": "b.example.com", "port": 8081.0 }
            ]
        }"#;
        crate::json::parse(json).unwrap()
    }

    #[test]
    fn test_flatten_keys() {
        let flat = flatten(&sample());
        let keys: Vec<&String> = flat.keys().collect();
        assert_eq!(
            keys,
            vec![
                "name",
                "servers.[0].host",
                "servers.[0].port",
                "servers.[1].host",
                "servers.[1].port",
            ]
        );
        assert_eq!(
            flat.get("servers.[1].host"),
            Some(&Value::String("b.example.com".to_string()))
        );
    }

    #[test]
    fn test_rebuild_is_left_inverse_of_flatten() {
        let tree = sample();
        assert_eq!(rebuild(&flatten(&tree)), tree);
    }

    #[test]
    fn test_flatten_scalar_root() {
        let tree = Value::Number(42.0);
        let flat = flatten(&tree);
        assert_eq!(flat.get(""), Some(&Value::Number(42.0)));
        assert_eq!(rebuild(&flat), tree);
    }

    #[test]
    fn test_rebuild_pads_sparse_indices() {
        let mut flat = FlatMap::new();
        flat.insert("items.[2]".to_string(), Value::Boolean(true));
        let tree = rebuild(&flat);
        assert_eq!(
            tree,
            crate::json::parse(r#"{"items": [null, null, true]}"#).unwrap()
        );
    }

    #[test]
    fn test_rebuild_last_write_wins_on_kind_conflict() {
        let mut flat = FlatMap::new();
        flat.insert("a.b".to_string(), Value::Number(1.0));
        flat.insert("a.[0]".to_string(), Value::Number(2.0));
        // BTreeMap iterates "a.[0]" before "a.b" ("[" < "b"), so the
        // mapping write is the later one and wins.
        let tree = rebuild(&flat);
        assert_eq!(tree, crate::json::parse(r#"{"a": {"b": 1.0}}"#).unwrap());
    }

    #[test]
    fn test_clean_path() {
        assert_eq!(clean_path("users.[0].name"), "users.0.name");
        assert_eq!(clean_path("plain.key"), "plain.key");
    }
}
