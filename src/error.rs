use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Top-level error type for the crate. Sub-errors stay diagnosable on
/// their own; this enum just fans them in for callers that want a single
/// error type out of the high-level `Tree` API.
#[derive(Error, Debug, Diagnostic)]
pub enum DotPathError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Format(#[from] FormatError),

    #[error("Could not read '{path}'")]
    #[diagnostic(
        code(dotpath::load_failed),
        help("Check that the file exists and is readable.")
    )]
    Load {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors produced while parsing or applying a dot-path query. Spans point
/// into the query string itself.
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum PathError {
    #[error("Empty query")]
    #[diagnostic(
        code(path::empty_query),
        help("A query needs at least one segment, e.g. `users.0.name`.")
    )]
    EmptyQuery,

    #[error("Empty path segment")]
    #[diagnostic(
        code(path::empty_segment),
        help("Two consecutive dots (or a leading/trailing dot) leave a segment empty.")
    )]
    EmptySegment {
        #[source_code]
        src: NamedSource<String>,
        #[label("this segment is empty")]
        span: SourceSpan,
    },

    #[error("Malformed index segment")]
    #[diagnostic(
        code(path::malformed_index),
        help("Bracketed segments must contain only digits, e.g. `[3]`.")
    )]
    MalformedIndex {
        #[source_code]
        src: NamedSource<String>,
        #[label("expected digits between the brackets")]
        span: SourceSpan,
    },

    #[error("Wildcard in a write path")]
    #[diagnostic(
        code(path::wildcard_in_write),
        help("set/add need a concrete path; wildcards only make sense for reads.")
    )]
    WildcardInWrite {
        #[source_code]
        src: NamedSource<String>,
        #[label("wildcards cannot address a single location")]
        span: SourceSpan,
    },

    #[error("Path '{path}' already holds a value")]
    #[diagnostic(
        code(path::already_exists),
        help("Use set to overwrite an existing value.")
    )]
    AlreadyExists { path: String },

    #[error("No value matched '{path}'")]
    #[diagnostic(code(path::not_found))]
    NotFound { path: String },

    #[error("Malformed search expression")]
    #[diagnostic(
        code(path::malformed_search),
        help("A search expression is `<query> <operator> <value>`, e.g. `users.?.role == admin`.")
    )]
    MalformedSearch {
        #[source_code]
        src: NamedSource<String>,
        #[label("expected `<query> <operator> <value>`")]
        span: SourceSpan,
    },

    #[error("Unsupported comparison operator '{operator}'")]
    #[diagnostic(
        code(path::unsupported_operator),
        help("Supported operators: `==` (loose) and `===` (strict).")
    )]
    UnsupportedOperator {
        operator: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("not a comparison operator")]
        span: SourceSpan,
    },
}

/// Errors from the format helpers (JSON, XML, CSV).
#[derive(Error, Debug, Diagnostic)]
pub enum FormatError {
    #[error("Invalid JSON: {source}")]
    #[diagnostic(code(json::invalid))]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error("JSON serialization failed: {source}")]
    #[diagnostic(code(json::serialize))]
    JsonSerialize {
        #[source]
        source: serde_json::Error,
    },

    #[error("Key '{key}' already exists")]
    #[diagnostic(
        code(json::key_exists),
        help("add refuses to overwrite; use the engine's set for that.")
    )]
    KeyExists { key: String },

    #[error("Key '{key}' does not exist")]
    #[diagnostic(code(json::key_missing))]
    KeyMissing { key: String },

    #[error("Document root is {found}, not an object")]
    #[diagnostic(
        code(json::not_an_object),
        help("Top-level add and remove only work on object documents.")
    )]
    NotAnObject { found: String },

    #[error("Invalid XML: {message}")]
    #[diagnostic(code(xml::invalid))]
    InvalidXml {
        message: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("the reader stopped here")]
        span: SourceSpan,
    },

    #[error("Unclosed quoted field")]
    #[diagnostic(
        code(csv::unclosed_quote),
        help("A `\"` opened a quoted field that never closes; escape literal quotes by doubling them.")
    )]
    UnclosedQuote {
        #[source_code]
        src: NamedSource<String>,
        #[label("quoted field starts here")]
        span: SourceSpan,
    },

    #[error("Row {row} has {found} fields, header has {expected}")]
    #[diagnostic(code(csv::uneven_row))]
    UnevenRow {
        row: usize,
        expected: usize,
        found: usize,
        #[source_code]
        src: NamedSource<String>,
        #[label("this row")]
        span: SourceSpan,
    },

    #[error("Cannot write '{found}' as CSV")]
    #[diagnostic(
        code(csv::unsupported_shape),
        help("CSV rows must be an array of objects or an array of arrays.")
    )]
    UnsupportedShape { found: String },

    #[error("No parser registered for '{extension}' files")]
    #[diagnostic(
        code(format::unknown_extension),
        help("Supported extensions: json, xml, csv.")
    )]
    UnknownExtension { extension: String },
}
