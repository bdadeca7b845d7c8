use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

use crate::value::FormValue;

/// Structural kind of a path step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PathSchema {
    Array,
    Tuple,
    Set,
    Map,
    Object,
    Record,
}

impl PathSchema {
    /// Array, tuple and set steps index into sequences; the rest are keyed.
    pub fn is_sequence(self) -> bool {
        matches!(self, Self::Array | Self::Tuple | Self::Set)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum PathKey {
    Index(usize),
    Name(String),
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "{i}"),
            Self::Name(s) => f.write_str(s),
        }
    }
}

impl From<usize> for PathKey {
    fn from(i: usize) -> Self { Self::Index(i) }
}

impl From<&str> for PathKey {
    fn from(s: &str) -> Self { Self::Name(s.to_owned()) }
}

impl From<String> for PathKey {
    fn from(s: String) -> Self { Self::Name(s) }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathItem {
    pub schema: PathSchema,
    pub key: PathKey,
}

impl PathItem {
    pub fn new(schema: PathSchema, key: impl Into<PathKey>) -> Self {
        Self { schema, key: key.into() }
    }
}

/// One finding of the validator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    /// `"type"` for shape mismatches, otherwise the kind whose pipe failed.
    pub reason: &'static str,
    /// Schema kind or pipe action that rejected the input.
    pub validation: &'static str,
    pub message: String,
    pub input: FormValue,
    /// `None` for issues about the top-level value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<PathItem>>,
}

impl Issue {
    pub fn path(&self) -> &[PathItem] {
        self.path.as_deref().unwrap_or_default()
    }

    /// Keys joined with `.`, e.g. `user.tags.0`.
    pub fn dot_path(&self) -> Option<String> {
        self.path.as_ref().map(|path| {
            path.iter().map(|item| item.key.to_string()).collect::<Vec<_>>().join(".")
        })
    }
}

/// Messages grouped by dotted path.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FlatErrors {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub root: Vec<String>,
    pub nested: IndexMap<String, Vec<String>>,
}

pub fn flatten(issues: &[Issue]) -> FlatErrors {
    let mut flat = FlatErrors::default();
    for issue in issues {
        match issue.dot_path() {
            Some(path) => flat.nested.entry(path).or_default().push(issue.message.clone()),
            None => flat.root.push(issue.message.clone()),
        }
    }
    flat
}
