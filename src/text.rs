//! String helpers: scalar stringification and camel-case splitting.

use crate::value::Value;
use regex::Regex;
use std::sync::LazyLock;

static CAMEL_CASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"((?:^|[A-Z])[a-z]+)").unwrap());

/// Canonical string form of a value. Whole numbers lose their trailing
/// `.0`, booleans and null use their JSON spellings, containers render as
/// compact JSON. Loose comparisons in the engine go through this.
#[must_use]
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => {
            // The `as i64` cast saturates past i64::MAX, which would make
            // distinct huge numbers stringify identically.
            if n.fract() == 0.0 && n.is_finite() && n.abs() < 2f64.powi(63) {
                format!("{}", *n as i64)
            } else {
                n.to_string()
            }
        }
        Value::Boolean(b) => b.to_string(),
        Value::Null => "null".to_string(),
        container => container.to_string(),
    }
}

/// Short kind name for diagnostics ("number", "array", ...).
#[must_use]
pub fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Boolean(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Splits a camel-cased word into its parts: `camelCaseString` becomes
/// `["camel", "Case", "String"]`. Runs of characters that fit neither a
/// leading lowercase run nor an uppercase-led word are dropped.
#[must_use]
pub fn explode_camel_case(input: &str) -> Vec<String> {
    CAMEL_CASE
        .find_iter(input)
        .map(|m| m.as_str().to_string())
        .collect()
}
