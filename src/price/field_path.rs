use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Dotted path into a JSON document, e.g. `data.0.quote.USD.price`.
///
/// A segment indexes an array when it is a number and the current node is an
/// array; otherwise it is looked up as an object key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FieldPathError {
    #[error("field path is empty")]
    Empty,
    #[error("field path `{0}` contains an empty segment")]
    EmptySegment(String),
}

impl FieldPath {
    /// Builds a path from already-split segments without validation.
    pub fn from_segments<'a>(segments: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            segments: segments.into_iter().map(str::to_string).collect(),
        }
    }

    pub fn resolve<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        self.segments
            .iter()
            .try_fold(root, |node, segment| match node {
                Value::Object(map) => map.get(segment),
                Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            })
    }
}

impl FromStr for FieldPath {
    type Err = FieldPathError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(FieldPathError::Empty);
        }

        let segments: Vec<String> = raw.split('.').map(|s| s.trim().to_string()).collect();
        if segments.iter().any(String::is_empty) {
            return Err(FieldPathError::EmptySegment(raw.to_string()));
        }

        Ok(Self { segments })
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}
