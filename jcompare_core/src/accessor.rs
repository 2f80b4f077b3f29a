use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

// Bracketed segment: ['key'] or [0]
static SEGMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[([^\]]+)\]").unwrap());

/// One step of an accessor path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathSegment {
    /// Object key
    Key(String),
    /// Sequence index
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => write!(f, "['{}']", key),
            PathSegment::Index(index) => write!(f, "[{}]", index),
        }
    }
}

/// Ordered root-to-leaf location inside a nested document.
///
/// The empty path addresses the document root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccessorPath(Vec<PathSegment>);

impl AccessorPath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Parse a bracketed accessor string like `['metadata']['tags'][0]`.
    ///
    /// Each bracket's content is tried as a base-10 index first, otherwise it
    /// is a string key with one layer of surrounding quotes stripped. Text
    /// outside brackets (such as a leading `root` marker) and malformed
    /// brackets are skipped rather than rejected, so an unparseable accessor
    /// yields a shorter path, never an error.
    pub fn parse(accessor: &str) -> Self {
        let segments = SEGMENT
            .captures_iter(accessor)
            .map(|caps| {
                let part = &caps[1];
                match part.parse::<usize>() {
                    Ok(index) => PathSegment::Index(index),
                    Err(_) => PathSegment::Key(strip_quotes(part).to_string()),
                }
            })
            .collect();
        Self(segments)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Split into parent segments and the final segment; `None` for the root.
    pub fn split_last(&self) -> Option<(&PathSegment, &[PathSegment])> {
        self.0.split_last()
    }
}

impl From<Vec<PathSegment>> for AccessorPath {
    fn from(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }
}

impl fmt::Display for AccessorPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.0 {
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

/// Strip one layer of surrounding quote characters, single or double
fn strip_quotes(part: &str) -> &str {
    let part = part.strip_prefix('\'').unwrap_or(part);
    let part = part.strip_suffix('\'').unwrap_or(part);
    let part = part.strip_prefix('"').unwrap_or(part);
    part.strip_suffix('"').unwrap_or(part)
}
