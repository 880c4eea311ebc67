//! The dot-path query engine: every operation works by flattening the
//! tree, matching or editing flat keys, and rebuilding. Operations are
//! pure; the input tree is never mutated.

use crate::error::PathError;
use crate::flat::{clean_path, flatten, rebuild, FlatMap};
use crate::path::Query;
use crate::value::Value;
use miette::NamedSource;

/// Looks up a query in a tree.
///
/// Flat keys matched by the compiled query have the query's own literal
/// prefix stripped, so the result is rooted at the queried location. No
/// match returns `None`; a single match short-circuits to the leaf value
/// itself; multiple matches are rebuilt into a subtree. When wildcard
/// matches collide on a rebuilt key, the later write wins.
///
/// # Errors
///
/// Returns a `PathError` if the query does not parse.
pub fn get(query: &str, tree: &Value) -> Result<Option<Value>, PathError> {
    let query = Query::parse(query)?;
    let matched = matched_entries(&query, tree, true);

    if matched.is_empty() {
        return Ok(None);
    }
    if matched.len() == 1 {
        let (_, value) = matched.into_iter().next().unwrap();
        return Ok(Some(value));
    }
    Ok(Some(rebuild(&matched)))
}

/// Like [`get`], but returns the matched flat entries (full keys, no
/// prefix subtraction, no rebuild).
pub fn get_raw(query: &str, tree: &Value) -> Result<FlatMap, PathError> {
    let query = Query::parse(query)?;
    Ok(matched_entries(&query, tree, false))
}

/// Runs several queries and rebuilds the union of their raw matches into
/// one tree. Entries keep their full flat keys, so results from different
/// parents end up in their original positions.
pub fn get_multiple(queries: &[&str], tree: &Value) -> Result<Option<Value>, PathError> {
    let mut union = FlatMap::new();
    for query in queries {
        union.append(&mut get_raw(query, tree)?);
    }
    if union.is_empty() {
        return Ok(None);
    }
    Ok(Some(rebuild(&union)))
}

/// Where the value for one [`remap`] target path comes from.
#[derive(Debug, Clone)]
pub enum RemapSource {
    /// Look the value up at this path in the source tree.
    Path(String),
    /// Use this value as-is.
    Value(Value),
}

/// Builds a new tree from an old one through a `target path -> source`
/// mapping: each target path receives either a fixed value or the result
/// of a [`get`] on the source tree (a missing source path yields null).
///
/// # Errors
///
/// Returns a `PathError` when a target or source path does not parse, or
/// when a target path contains a wildcard.
pub fn remap(mapping: &[(String, RemapSource)], tree: &Value) -> Result<Value, PathError> {
    let mut flat = FlatMap::new();
    for (target, source) in mapping {
        let target = Query::parse(target)?;
        target.require_concrete()?;
        let value = match source {
            RemapSource::Value(value) => value.clone(),
            RemapSource::Path(path) => get(path, tree)?.unwrap_or(Value::Null),
        };
        splice(&mut flat, &target, &value);
    }
    Ok(rebuild(&flat))
}

/// Looks up the parent of the queried location. A single-segment query
/// has the root as its parent, so the whole tree comes back.
pub fn get_parent(query: &str, tree: &Value) -> Result<Option<Value>, PathError> {
    let parsed = Query::parse(query)?;
    match parsed.parent() {
        Some(parent) => get(parent.raw(), tree),
        None => Ok(Some(tree.clone())),
    }
}

/// Writes a value at a concrete path, overwriting anything already there
/// (including a whole subtree), and returns the new tree. Indices past
/// the end of a sequence null-pad the gap.
///
/// # Errors
///
/// Returns a `PathError` if the query does not parse or contains a
/// wildcard.
pub fn set(query: &str, value: &Value, tree: &Value) -> Result<Value, PathError> {
    let query = Query::parse(query)?;
    query.require_concrete()?;

    let mut flat = flatten(tree);
    splice(&mut flat, &query, value);
    Ok(rebuild(&flat))
}

/// Like [`set`], but refuses to touch a path that already holds a value.
///
/// # Errors
///
/// Returns `path::already_exists` when the path, anything beneath it, or
/// a leaf on the way down to it is occupied, plus the parse errors of
/// [`set`].
pub fn add(query: &str, value: &Value, tree: &Value) -> Result<Value, PathError> {
    let parsed = Query::parse(query)?;
    parsed.require_concrete()?;

    let mut flat = flatten(tree);
    let key = parsed.flat_key();
    let prefix = format!("{key}.");
    let occupied = flat.keys().any(|k| {
        // The path itself, a descendant, or a scalar ancestor the new
        // branch would have to overwrite.
        *k == key || k.starts_with(&prefix) || key.starts_with(&format!("{k}."))
    });
    if occupied {
        return Err(PathError::AlreadyExists {
            path: parsed.raw().to_string(),
        });
    }
    splice(&mut flat, &parsed, value);
    Ok(rebuild(&flat))
}

/// Deletes everything the query matches and returns the new tree.
/// Wildcards are allowed here; deleting several locations at once is
/// well-defined.
///
/// # Errors
///
/// Returns `path::not_found` when nothing matched.
pub fn remove(query: &str, tree: &Value) -> Result<Value, PathError> {
    let parsed = Query::parse(query)?;
    let regex = parsed.to_regex();

    let mut flat = flatten(tree);
    let before = flat.len();
    flat.retain(|key, _| !regex.is_match(key));

    if flat.len() == before {
        return Err(PathError::NotFound {
            path: parsed.raw().to_string(),
        });
    }
    log::debug!("remove '{}' dropped {} entries", parsed.raw(), before - flat.len());
    Ok(rebuild(&flat))
}

/// Finds the first leaf strictly equal to `needle` and returns its
/// cleaned path (`users.0.name` spelling).
#[must_use]
pub fn search(needle: &Value, tree: &Value) -> Option<String> {
    flatten(tree)
        .iter()
        .find(|(_, value)| *value == needle)
        .map(|(key, _)| clean_path(key))
}

/// Like [`search`], but with coercing equality (`"1"` finds `1.0`).
#[must_use]
pub fn search_loose(needle: &Value, tree: &Value) -> Option<String> {
    flatten(tree)
        .iter()
        .find(|(_, value)| value.loose_eq(needle))
        .map(|(key, _)| clean_path(key))
}

/// Evaluates a search expression of the form `<query> <op> <value>` and
/// returns the cleaned paths of all leaves that matched. `==` compares
/// loosely (string/number coercion), `===` strictly.
///
/// # Errors
///
/// Returns a span-carrying `PathError` for malformed expressions or
/// unsupported operators, plus any query parse error.
pub fn search_by_query(expression: &str, tree: &Value) -> Result<Vec<String>, PathError> {
    let tokens = tokenize(expression);
    if tokens.len() != 3 {
        return Err(PathError::MalformedSearch {
            src: NamedSource::new("expression", expression.to_string()),
            span: (0, expression.len()).into(),
        });
    }

    let (query_token, _, _) = tokens[0];
    let (operator, op_start, op_end) = tokens[1];
    let (literal_token, _, _) = tokens[2];

    let strict = match operator {
        "==" => false,
        "===" => true,
        other => {
            return Err(PathError::UnsupportedOperator {
                operator: other.to_string(),
                src: NamedSource::new("expression", expression.to_string()),
                span: (op_start, op_end - op_start).into(),
            })
        }
    };

    let query = Query::parse(query_token)?;
    let needle = parse_literal(literal_token);
    let regex = query.to_regex();

    let mut found = Vec::new();
    for (key, value) in &flatten(tree) {
        if !regex.is_match(key) {
            continue;
        }
        let hit = if strict {
            value == &needle
        } else {
            value.loose_eq(&needle)
        };
        if hit {
            found.push(clean_path(key));
        }
    }
    Ok(found)
}

/// Replaces the subtree at the query's flat key with the flattened form
/// of `value`.
fn splice(flat: &mut FlatMap, query: &Query, value: &Value) {
    let key = query.flat_key();
    let prefix = format!("{key}.");
    flat.retain(|k, _| *k != key && !k.starts_with(&prefix));

    for (sub_key, leaf) in flatten(value) {
        let full = if sub_key.is_empty() {
            key.clone()
        } else {
            format!("{key}.{sub_key}")
        };
        flat.insert(full, leaf);
    }
}

/// Whitespace-splits an expression, keeping byte ranges for diagnostics.
fn tokenize(expression: &str) -> Vec<(&str, usize, usize)> {
    let mut tokens = Vec::new();
    let mut start = None;
    for (i, c) in expression.char_indices() {
        if c.is_whitespace() {
            if let Some(s) = start.take() {
                tokens.push((&expression[s..i], s, i));
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        tokens.push((&expression[s..], s, expression.len()));
    }
    tokens
}

/// Interprets the value side of a search expression: `null`, booleans and
/// numbers become their scalar kinds, quoted text loses its quotes, and
/// everything else is a plain string.
fn parse_literal(token: &str) -> Value {
    match token {
        "null" => return Value::Null,
        "true" => return Value::Boolean(true),
        "false" => return Value::Boolean(false),
        _ => {}
    }
    if let Ok(number) = token.parse::<f64>() {
        return Value::Number(number);
    }
    let trimmed = token
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .or_else(|| token.strip_prefix('\'').and_then(|t| t.strip_suffix('\'')));
    Value::String(trimmed.unwrap_or(token).to_string())
}

/// Matches a query's compiled expression against a tree's flat keys,
/// optionally stripping the query's literal prefix from matched keys.
/// A wildcard query never finds its literal prefix, so those matches
/// keep their full keys.
fn matched_entries(query: &Query, tree: &Value, subtract: bool) -> FlatMap {
    let regex = query.to_regex();
    let prefix = query.flat_key();
    let nested_prefix = format!("{prefix}.");

    let mut matched = FlatMap::new();
    for (key, value) in &flatten(tree) {
        if !regex.is_match(key) {
            continue;
        }
        let new_key = if !subtract {
            key.clone()
        } else if *key == prefix {
            String::new()
        } else if let Some(rest) = key.strip_prefix(&nested_prefix) {
            rest.to_string()
        } else {
            key.clone()
        };
        matched.insert(new_key, value.clone());
    }
    matched
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json;

    fn sample() -> Value {
        json::parse(
            r#"{
                "name": "My App",
                "servers": [
                    { "host": "a.example.com", "port": 8080.0, "active": true },
                    { "host": "b.example.com", "port": 8081.0, "active": false }
                ],
                "owner": { "email": "ops@example.com" }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_get_scalar() {
        let tree = sample();
        assert_eq!(
            get("servers.0.host", &tree).unwrap(),
            Some(Value::String("a.example.com".to_string()))
        );
        assert_eq!(get("name", &tree).unwrap(), Some(Value::String("My App".to_string())));
    }

    #[test]
    fn test_get_subtree() {
        let tree = sample();
        let expected = json::parse(
            r#"{ "host": "b.example.com", "port": 8081.0, "active": false }"#,
        )
        .unwrap();
        assert_eq!(get("servers.1", &tree).unwrap(), Some(expected));
    }

    #[test]
    fn test_get_wildcard_collects_all() {
        let tree = sample();
        let result = get("servers.?.host", &tree).unwrap().unwrap();
        let expected = json::parse(
            r#"{ "servers": [ { "host": "a.example.com" }, { "host": "b.example.com" } ] }"#,
        )
        .unwrap();
        assert_eq!(result, expected);
    }

    #[test]
    fn test_get_missing_is_none() {
        assert_eq!(get("no.such.path", &sample()).unwrap(), None);
    }

    #[test]
    fn test_get_ignores_prefix_sharing_siblings() {
        let tree = json::parse(r#"{ "name": "x", "names": ["y"] }"#).unwrap();
        assert_eq!(get("name", &tree).unwrap(), Some(Value::String("x".to_string())));
        let names = get("names", &tree).unwrap();
        assert_eq!(names, Some(Value::String("y".to_string())));
    }

    #[test]
    fn test_get_multiple() {
        let tree = sample();
        let result = get_multiple(&["name", "owner.email"], &tree).unwrap().unwrap();
        let expected = json::parse(
            r#"{ "name": "My App", "owner": { "email": "ops@example.com" } }"#,
        )
        .unwrap();
        assert_eq!(result, expected);
    }

    #[test]
    fn test_remap_builds_new_shape() {
        let tree = sample();
        let mapping = vec![
            (
                "contact.address".to_string(),
                RemapSource::Path("owner.email".to_string()),
            ),
            (
                "primary.host".to_string(),
                RemapSource::Path("servers.0.host".to_string()),
            ),
            (
                "kind".to_string(),
                RemapSource::Value(Value::from("summary")),
            ),
            (
                "missing".to_string(),
                RemapSource::Path("no.such.path".to_string()),
            ),
        ];
        let remapped = remap(&mapping, &tree).unwrap();
        let expected = json::parse(
            r#"{
                "contact": { "address": "ops@example.com" },
                "primary": { "host": "a.example.com" },
                "kind": "summary",
                "missing": null
            }"#,
        )
        .unwrap();
        assert_eq!(remapped, expected);
    }

    #[test]
    fn test_remap_rejects_wildcard_targets() {
        let mapping = vec![(
            "a.?.b".to_string(),
            RemapSource::Value(Value::Null),
        )];
        assert!(matches!(
            remap(&mapping, &sample()),
            Err(PathError::WildcardInWrite { .. })
        ));
    }

    #[test]
    fn test_get_parent() {
        let tree = sample();
        let parent = get_parent("owner.email", &tree).unwrap().unwrap();
        assert_eq!(parent, Value::String("ops@example.com".to_string()));
        assert_eq!(get_parent("name", &tree).unwrap(), Some(tree.clone()));
    }

    #[test]
    fn test_set_overwrites_scalar() {
        let tree = sample();
        let updated = set("servers.0.port", &Value::Number(9090.0), &tree).unwrap();
        assert_eq!(get("servers.0.port", &updated).unwrap(), Some(Value::Number(9090.0)));
        // The original is untouched.
        assert_eq!(get("servers.0.port", &tree).unwrap(), Some(Value::Number(8080.0)));
    }

    #[test]
    fn test_set_replaces_subtree() {
        let tree = sample();
        let replacement = json::parse(r#"{ "email": "root@example.com" }"#).unwrap();
        let updated = set("owner", &replacement, &tree).unwrap();
        assert_eq!(
            get("owner.email", &updated).unwrap(),
            Some(Value::String("root@example.com".to_string()))
        );
    }

    #[test]
    fn test_set_pads_new_index() {
        let tree = json::parse(r#"{ "items": [1.0] }"#).unwrap();
        let updated = set("items.3", &Value::Number(4.0), &tree).unwrap();
        assert_eq!(
            updated,
            json::parse(r#"{ "items": [1.0, null, null, 4.0] }"#).unwrap()
        );
    }

    #[test]
    fn test_set_rejects_wildcards() {
        assert!(matches!(
            set("servers.?.port", &Value::Null, &sample()),
            Err(PathError::WildcardInWrite { .. })
        ));
    }

    #[test]
    fn test_add_refuses_existing() {
        let tree = sample();
        assert!(matches!(
            add("owner.email", &Value::Null, &tree),
            Err(PathError::AlreadyExists { .. })
        ));
        assert!(matches!(
            add("owner", &Value::Null, &tree),
            Err(PathError::AlreadyExists { .. })
        ));
        let updated = add("owner.name", &Value::from("Sam"), &tree).unwrap();
        assert_eq!(get("owner.name", &updated).unwrap(), Some(Value::from("Sam")));
    }

    #[test]
    fn test_add_refuses_scalar_ancestor() {
        // A branch under an existing leaf would silently destroy it.
        let tree = json::parse(r#"{ "a": 1.0 }"#).unwrap();
        assert!(matches!(
            add("a.b", &Value::Boolean(true), &tree),
            Err(PathError::AlreadyExists { .. })
        ));
    }

    #[test]
    fn test_remove() {
        let tree = sample();
        let updated = remove("servers.1", &tree).unwrap();
        assert_eq!(get("servers.1", &updated).unwrap(), None);
        assert!(matches!(
            remove("no.such.path", &tree),
            Err(PathError::NotFound { .. })
        ));
    }

    #[test]
    fn test_search() {
        let tree = sample();
        assert_eq!(
            search(&Value::Number(8081.0), &tree),
            Some("servers.1.port".to_string())
        );
        assert_eq!(search(&Value::String("8081".to_string()), &tree), None);
        assert_eq!(
            search_loose(&Value::String("8081".to_string()), &tree),
            Some("servers.1.port".to_string())
        );
    }

    #[test]
    fn test_search_by_query() {
        let tree = sample();
        let found = search_by_query("servers.?.active == true", &tree).unwrap();
        assert_eq!(found, vec!["servers.0.active".to_string()]);

        // Loose comparison coerces; strict does not.
        let loose = search_by_query("servers.?.port == 8080", &tree).unwrap();
        assert_eq!(loose, vec!["servers.0.port".to_string()]);
        let strict = search_by_query("servers.?.port === \"8080\"", &tree).unwrap();
        assert!(strict.is_empty());
    }

    #[test]
    fn test_search_by_query_errors() {
        let tree = sample();
        assert!(matches!(
            search_by_query("only-two tokens", &tree),
            Err(PathError::MalformedSearch { .. })
        ));
        assert!(matches!(
            search_by_query("a.b <> 1", &tree),
            Err(PathError::UnsupportedOperator { .. })
        ));
    }
}
