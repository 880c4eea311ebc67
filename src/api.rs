use crate::csv::{self, CsvOptions};
use crate::engine::{self, RemapSource};
use crate::error::{DotPathError, FormatError};
use crate::flat::{self, FlatMap};
use crate::json;
use crate::value::Value;
use crate::xml;
use serde::{Serialize, Serializer};
use std::path::Path;

/// An owned value tree together with the dot-path operations on it.
///
/// This is the primary entry point of the crate: load or parse a
/// document, then query and edit it by path. The free functions in
/// [`engine`](crate::engine) offer the same operations without the
/// wrapper.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    root: Value,
}

impl Serialize for Tree {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.root.serialize(serializer)
    }
}

impl From<Value> for Tree {
    fn from(root: Value) -> Self {
        Tree::new(root)
    }
}

impl Tree {
    #[must_use]
    pub fn new(root: Value) -> Self {
        Tree { root }
    }

    /// Parses a JSON document.
    ///
    /// # Errors
    ///
    /// Returns a `DotPathError` if the document does not parse.
    pub fn from_json(document: &str) -> Result<Self, DotPathError> {
        Ok(Tree::new(json::parse(document)?))
    }

    /// Parses an XML document.
    ///
    /// # Errors
    ///
    /// Returns a `DotPathError` if the document does not parse.
    pub fn from_xml(document: &str) -> Result<Self, DotPathError> {
        Ok(Tree::new(xml::parse(document)?))
    }

    /// Parses a CSV document.
    ///
    /// # Errors
    ///
    /// Returns a `DotPathError` if the document does not parse.
    pub fn from_csv(document: &str, options: &CsvOptions) -> Result<Self, DotPathError> {
        Ok(Tree::new(csv::parse(document, options)?))
    }

    /// Reads a file and parses it by extension (`json`, `xml` or `csv`;
    /// CSV with the default options).
    ///
    /// # Errors
    ///
    /// Returns `dotpath::load_failed` when the file cannot be read,
    /// `format::unknown_extension` for anything unrecognized, or the
    /// parser's own error.
    pub fn load(path: &Path) -> Result<Self, DotPathError> {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let document = std::fs::read_to_string(path).map_err(|source| DotPathError::Load {
            path: path.to_string_lossy().to_string(),
            source,
        })?;

        match extension.as_str() {
            "json" => Tree::from_json(&document),
            "xml" => Tree::from_xml(&document),
            "csv" => Tree::from_csv(&document, &CsvOptions::default()),
            other => Err(FormatError::UnknownExtension {
                extension: other.to_string(),
            }
            .into()),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Value {
        &self.root
    }

    #[must_use]
    pub fn into_root(self) -> Value {
        self.root
    }

    /// See [`engine::get`].
    pub fn get(&self, query: &str) -> Result<Option<Value>, DotPathError> {
        Ok(engine::get(query, &self.root)?)
    }

    /// See [`engine::get_multiple`].
    pub fn get_multiple(&self, queries: &[&str]) -> Result<Option<Value>, DotPathError> {
        Ok(engine::get_multiple(queries, &self.root)?)
    }

    /// See [`engine::get_parent`].
    pub fn get_parent(&self, query: &str) -> Result<Option<Value>, DotPathError> {
        Ok(engine::get_parent(query, &self.root)?)
    }

    /// Writes a value at a concrete path. See [`engine::set`].
    pub fn set(&mut self, query: &str, value: &Value) -> Result<(), DotPathError> {
        self.root = engine::set(query, value, &self.root)?;
        Ok(())
    }

    /// Writes a value at a previously-absent path. See [`engine::add`].
    pub fn add(&mut self, query: &str, value: &Value) -> Result<(), DotPathError> {
        self.root = engine::add(query, value, &self.root)?;
        Ok(())
    }

    /// Deletes everything a query matches. See [`engine::remove`].
    pub fn remove(&mut self, query: &str) -> Result<(), DotPathError> {
        self.root = engine::remove(query, &self.root)?;
        Ok(())
    }

    /// Builds a new tree shaped by `mapping`. See [`engine::remap`].
    pub fn remap(&self, mapping: &[(String, RemapSource)]) -> Result<Tree, DotPathError> {
        Ok(Tree::new(engine::remap(mapping, &self.root)?))
    }

    /// See [`engine::search`].
    #[must_use]
    pub fn search(&self, needle: &Value) -> Option<String> {
        engine::search(needle, &self.root)
    }

    /// See [`engine::search_by_query`].
    pub fn search_by_query(&self, expression: &str) -> Result<Vec<String>, DotPathError> {
        Ok(engine::search_by_query(expression, &self.root)?)
    }

    /// The flattened form of the tree.
    #[must_use]
    pub fn flatten(&self) -> FlatMap {
        flat::flatten(&self.root)
    }

    /// Serializes the tree into a compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns a `DotPathError` if serialization fails.
    pub fn to_json(&self) -> Result<String, DotPathError> {
        Ok(json::stringify(&self.root)?)
    }

    /// Serializes the tree into pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns a `DotPathError` if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, DotPathError> {
        Ok(json::stringify_pretty(&self.root)?)
    }

    /// Serializes the tree into a YAML string.
    ///
    /// # Errors
    ///
    /// Returns a `serde_yaml::Error` if serialization fails.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(&self.root)
    }
}
