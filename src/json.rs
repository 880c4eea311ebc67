//! JSON helpers over `serde_json`, working on the crate's [`Value`] tree.

use crate::error::FormatError;
use crate::value::Value;
use serde::Serialize;

/// Checks whether a string is well-formed JSON.
#[must_use]
pub fn is_valid(input: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(input).is_ok()
}

/// Parses a JSON document into a [`Value`] tree.
///
/// # Errors
///
/// Returns `json::invalid` when the document does not parse.
pub fn parse(input: &str) -> Result<Value, FormatError> {
    serde_json::from_str(input).map_err(|source| FormatError::InvalidJson { source })
}

/// Serializes anything `Serialize` into a compact JSON string.
///
/// # Errors
///
/// Returns `json::serialize` if serialization fails.
pub fn stringify<T: Serialize>(data: &T) -> Result<String, FormatError> {
    serde_json::to_string(data).map_err(|source| FormatError::JsonSerialize { source })
}

/// Serializes anything `Serialize` into pretty-printed JSON.
///
/// # Errors
///
/// Returns `json::serialize` if serialization fails.
pub fn stringify_pretty<T: Serialize>(data: &T) -> Result<String, FormatError> {
    serde_json::to_string_pretty(data).map_err(|source| FormatError::JsonSerialize { source })
}

/// Converts anything `Serialize` into a [`Value`] tree by a JSON
/// round-trip. This is the general "sanitize" entry point: structs,
/// maps and `serde_json::Value`s all normalize to the same shape.
///
/// # Errors
///
/// Returns `json::serialize` or `json::invalid` if the round-trip fails.
pub fn to_value<T: Serialize>(data: &T) -> Result<Value, FormatError> {
    parse(&stringify(data)?)
}

/// Adds top-level keys to a JSON document and returns the new document.
///
/// # Errors
///
/// Returns `json::key_exists` if any key is already present (adding never
/// overwrites) and `json::not_an_object` when the document's root is not
/// an object.
pub fn add(elements: &[(String, Value)], document: &str) -> Result<String, FormatError> {
    let mut tree = parse(document)?;
    let Value::Object(map) = &mut tree else {
        return Err(FormatError::NotAnObject {
            found: crate::text::kind_name(&tree).to_string(),
        });
    };
    for (key, value) in elements {
        if map.contains_key(key) {
            return Err(FormatError::KeyExists { key: key.clone() });
        }
        map.insert(key.clone(), value.clone());
    }
    stringify(&tree)
}

/// Removes top-level keys from a JSON document and returns the new
/// document.
///
/// # Errors
///
/// Returns `json::key_missing` if any key is absent and
/// `json::not_an_object` when the document's root is not an object.
pub fn remove(document: &str, keys: &[&str]) -> Result<String, FormatError> {
    let mut tree = parse(document)?;
    let Value::Object(map) = &mut tree else {
        return Err(FormatError::NotAnObject {
            found: crate::text::kind_name(&tree).to_string(),
        });
    };
    for key in keys {
        if map.remove(*key).is_none() {
            return Err(FormatError::KeyMissing {
                key: (*key).to_string(),
            });
        }
    }
    stringify(&tree)
}

/// Deep-merges several JSON documents, left to right, and returns the
/// merged document. Objects merge recursively, arrays concatenate, and
/// on a scalar collision the later document wins.
///
/// # Errors
///
/// Returns `json::invalid` if any document does not parse.
pub fn merge(documents: &[&str]) -> Result<String, FormatError> {
    let mut merged = Value::Object(Default::default());
    for document in documents {
        let next = parse(document)?;
        merged = merge_values(merged, next);
    }
    stringify(&merged)
}

fn merge_values(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_value) => merge_values(base_value, overlay_value),
                    None => overlay_value,
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (Value::Array(mut base_items), Value::Array(overlay_items)) => {
            base_items.extend(overlay_items);
            Value::Array(base_items)
        }
        (_, overlay) => overlay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_is_valid() {
        assert!(is_valid(r#"{"a": 1}"#));
        assert!(!is_valid(r#"{"a": }"#));
        assert!(matches!(
            parse(r#"{"a": }"#),
            Err(FormatError::InvalidJson { .. })
        ));
    }

    #[test]
    fn test_add_refuses_existing_key() {
        let document = r#"{"a":1.0}"#;
        let updated = add(&[("b".to_string(), Value::Boolean(true))], document).unwrap();
        assert_eq!(updated, r#"{"a":1.0,"b":true}"#);
        assert!(matches!(
            add(&[("a".to_string(), Value::Null)], document),
            Err(FormatError::KeyExists { .. })
        ));
    }

    #[test]
    fn test_remove_requires_key() {
        let document = r#"{"a":1.0,"b":2.0}"#;
        assert_eq!(remove(document, &["b"]).unwrap(), r#"{"a":1.0}"#);
        assert!(matches!(
            remove(document, &["c"]),
            Err(FormatError::KeyMissing { .. })
        ));
    }

    #[test]
    fn test_add_and_remove_require_object_root() {
        let document = r#"[1.0,2.0]"#;
        assert!(matches!(
            add(&[("a".to_string(), Value::Null)], document),
            Err(FormatError::NotAnObject { .. })
        ));
        assert!(matches!(
            remove(document, &["a"]),
            Err(FormatError::NotAnObject { .. })
        ));
    }

    #[test]
    fn test_merge_is_deep_and_last_wins() {
        let merged = merge(&[
            r#"{"a": {"x": 1.0}, "tags": ["one"]}"#,
            r#"{"a": {"y": 2.0}, "tags": ["two"], "b": 3.0}"#,
        ])
        .unwrap();
        assert_eq!(
            merged,
            r#"{"a":{"x":1.0,"y":2.0},"b":3.0,"tags":["one","two"]}"#
        );
    }
}
