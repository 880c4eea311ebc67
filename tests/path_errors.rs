// Query parse error tests: every malformed query should come back as a
// diagnosable PathError, never a panic or a silent no-match.

use dotpath::engine;
use dotpath::error::PathError;
use dotpath::path::Query;
use dotpath::value::Value;

#[test]
fn test_empty_query() {
    assert!(matches!(Query::parse(""), Err(PathError::EmptyQuery)));
}

#[test]
fn test_consecutive_dots() {
    assert!(matches!(
        Query::parse("a..b"),
        Err(PathError::EmptySegment { .. })
    ));
}

#[test]
fn test_leading_and_trailing_dots() {
    assert!(matches!(
        Query::parse(".a"),
        Err(PathError::EmptySegment { .. })
    ));
    assert!(matches!(
        Query::parse("a."),
        Err(PathError::EmptySegment { .. })
    ));
}

#[test]
fn test_malformed_bracket_index() {
    assert!(matches!(
        Query::parse("a.[not-a-number]"),
        Err(PathError::MalformedIndex { .. })
    ));
    assert!(matches!(
        Query::parse("a.[]"),
        Err(PathError::MalformedIndex { .. })
    ));
}

#[test]
fn test_wildcard_writes_are_rejected() {
    let tree = Value::Object(Default::default());
    assert!(matches!(
        engine::set("a.?.b", &Value::Null, &tree),
        Err(PathError::WildcardInWrite { .. })
    ));
    assert!(matches!(
        engine::add("*.b", &Value::Null, &tree),
        Err(PathError::WildcardInWrite { .. })
    ));
}

#[test]
fn test_error_display_is_not_empty() {
    if let Err(err) = Query::parse("a..b") {
        let error_string = format!("{}", err);
        assert!(!error_string.is_empty());
    } else {
        panic!("Should have errored");
    }
}

#[test]
fn test_malformed_search_expressions() {
    let tree = Value::Object(Default::default());
    assert!(matches!(
        engine::search_by_query("a.b", &tree),
        Err(PathError::MalformedSearch { .. })
    ));
    assert!(matches!(
        engine::search_by_query("a.b == 1 extra", &tree),
        Err(PathError::MalformedSearch { .. })
    ));
    assert!(matches!(
        engine::search_by_query("a.b >= 1", &tree),
        Err(PathError::UnsupportedOperator { .. })
    ));
}
