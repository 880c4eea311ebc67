use crate::error::PathError;
use miette::NamedSource;
use regex::Regex;

// Building blocks of the generated match expression. A compiled query is
// anchored at the start and open at the end past a segment boundary: a
// query matches its own flat key and every key beneath it, never a
// sibling that merely shares a literal prefix.
const EXPRESSION_OPENER: &str = "^";
const EXPRESSION_CLOSER: &str = r"(?:$|\.).*$";
const EXPRESSION_WILDCARD: &str = "(.*)";
const EXPRESSION_SEPARATOR: &str = r"\.";

/// One segment of a dot-path query.
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentKind {
    /// Matches an exact mapping key.
    Literal(String),
    /// Matches a sequence index (flattened as `[n]`).
    Index(usize),
    /// Matches any single segment value (`?` or `*`).
    Wildcard,
}

/// A segment together with its byte range in the original query string,
/// so diagnostics can point at the offending piece.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub kind: SegmentKind,
    pub pos_start: usize,
    pub pos_end: usize,
}

/// A parsed dot-path query.
///
/// Grammar: segments separated by `.`; a purely numeric segment (plain or
/// bracketed, `0` / `[0]`) addresses a sequence index, `?` and `*` are
/// wildcards, everything else is a literal mapping key.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    raw: String,
    segments: Vec<Segment>,
}

impl Query {
    /// Parses a query string into segments.
    ///
    /// # Errors
    ///
    /// Returns a `PathError` with a span into the query for empty queries,
    /// empty segments (consecutive or dangling dots) and malformed
    /// bracketed indices.
    pub fn parse(raw: &str) -> Result<Query, PathError> {
        if raw.is_empty() {
            return Err(PathError::EmptyQuery);
        }

        let mut segments = Vec::new();
        let mut offset = 0usize;

        for piece in raw.split('.') {
            let pos_start = offset;
            let pos_end = offset + piece.len();
            offset = pos_end + 1; // skip the separator

            let kind = Self::parse_segment(raw, piece, pos_start)?;
            segments.push(Segment {
                kind,
                pos_start,
                pos_end,
            });
        }

        Ok(Query {
            raw: raw.to_string(),
            segments,
        })
    }

    fn parse_segment(raw: &str, piece: &str, pos_start: usize) -> Result<SegmentKind, PathError> {
        if piece.is_empty() {
            return Err(PathError::EmptySegment {
                src: Self::named_source(raw),
                span: (pos_start, 0).into(),
            });
        }

        if piece == "?" || piece == "*" {
            return Ok(SegmentKind::Wildcard);
        }

        if let Some(inner) = piece.strip_prefix('[').and_then(|p| p.strip_suffix(']')) {
            return match inner.parse::<usize>() {
                Ok(index) => Ok(SegmentKind::Index(index)),
                Err(_) => Err(PathError::MalformedIndex {
                    src: Self::named_source(raw),
                    span: (pos_start, piece.len()).into(),
                }),
            };
        }

        if let Ok(index) = piece.parse::<usize>() {
            return Ok(SegmentKind::Index(index));
        }

        Ok(SegmentKind::Literal(piece.to_string()))
    }

    fn named_source(raw: &str) -> NamedSource<String> {
        NamedSource::new("query", raw.to_string())
    }

    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// True when the query contains no wildcards and therefore addresses
    /// exactly one location in a tree.
    #[must_use]
    pub fn is_concrete(&self) -> bool {
        !self
            .segments
            .iter()
            .any(|s| s.kind == SegmentKind::Wildcard)
    }

    /// Errors with a span on the first wildcard. Write operations use this
    /// to reject queries that cannot name a single location.
    pub fn require_concrete(&self) -> Result<(), PathError> {
        match self.segments.iter().find(|s| s.kind == SegmentKind::Wildcard) {
            None => Ok(()),
            Some(segment) => Err(PathError::WildcardInWrite {
                src: Self::named_source(&self.raw),
                span: (segment.pos_start, segment.pos_end - segment.pos_start).into(),
            }),
        }
    }

    /// The literal flat-map spelling of the query: indices rendered as
    /// `[n]`, segments joined with `.`. For a concrete query this is the
    /// flat key the query addresses; `get` strips it from matched keys.
    #[must_use]
    pub fn flat_key(&self) -> String {
        let mut key = String::new();
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                key.push('.');
            }
            match &segment.kind {
                SegmentKind::Literal(lit) => key.push_str(lit),
                SegmentKind::Index(n) => {
                    key.push('[');
                    key.push_str(&n.to_string());
                    key.push(']');
                }
                SegmentKind::Wildcard => key.push('?'),
            }
        }
        key
    }

    /// The generated match expression source, before compilation.
    #[must_use]
    pub fn pattern(&self) -> String {
        let mut expression = String::from(EXPRESSION_OPENER);
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                expression.push_str(EXPRESSION_SEPARATOR);
            }
            match &segment.kind {
                SegmentKind::Literal(lit) => {
                    expression.push('(');
                    expression.push_str(&regex::escape(lit));
                    expression.push(')');
                }
                SegmentKind::Index(n) => {
                    expression.push_str(r"(\[");
                    expression.push_str(&n.to_string());
                    expression.push_str(r"\])");
                }
                SegmentKind::Wildcard => expression.push_str(EXPRESSION_WILDCARD),
            }
        }
        expression.push_str(EXPRESSION_CLOSER);
        expression
    }

    /// Compiles the query into its anchored regular expression.
    #[must_use]
    pub fn to_regex(&self) -> Regex {
        let pattern = self.pattern();
        log::debug!("compiled query '{}' to pattern '{}'", self.raw, pattern);
        // Literals are regex-escaped, so the generated pattern is always
        // well-formed.
        Regex::new(&pattern).unwrap()
    }

    /// The query addressing this query's parent, if it has one.
    #[must_use]
    pub fn parent(&self) -> Option<Query> {
        if self.segments.len() < 2 {
            return None;
        }
        let cut = self.segments[self.segments.len() - 1].pos_start - 1;
        let raw = self.raw[..cut].to_string();
        let segments = self.segments[..self.segments.len() - 1].to_vec();
        Some(Query { raw, segments })
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}
