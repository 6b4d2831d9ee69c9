//! Field paths
//!
//! A rule path addresses a field with dots for nesting and brackets for list
//! elements: `users[0].addresses[3].street`. Rules are registered under the
//! wildcard form (`users[].addresses[].street`); [`normalize_path`] maps a
//! concrete path onto it at lookup time.

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use std::fmt;

/// Literal wildcard marker for "every element of this sequence"
pub const WILDCARD: &str = "[]";

static INDEX_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\d+\]").unwrap());

/// Collapse every `[<digits>]` index into the `[]` wildcard.
///
/// ```
/// use sval::normalize_path;
///
/// assert_eq!(
///     normalize_path("users[0].addresses[456].street"),
///     "users[].addresses[].street"
/// );
/// assert_eq!(normalize_path("users[].name"), "users[].name");
/// ```
pub fn normalize_path(path: &str) -> Cow<'_, str> {
    INDEX_REGEX.replace_all(path, WILDCARD)
}

// ============================================================================
// Path Segments
// ============================================================================

/// One step of a field path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Named record field (`.name`)
    Field(String),
    /// List element (`[3]`)
    Index(usize),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Field(name) => f.write_str(name),
            Segment::Index(i) => write!(f, "[{}]", i),
        }
    }
}

// ============================================================================
// Path Context
// ============================================================================

/// Tracks the current location while walking nested data
#[derive(Debug, Clone, Default)]
pub struct PathContext {
    segments: Vec<Segment>,
}

impl PathContext {
    /// Create an empty (root) context
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter a named field
    pub fn push_field(&mut self, name: &str) {
        self.segments.push(Segment::Field(name.to_string()));
    }

    /// Enter a list element
    pub fn push_index(&mut self, index: usize) {
        self.segments.push(Segment::Index(index));
    }

    /// Leave the innermost segment
    pub fn pop(&mut self) {
        self.segments.pop();
    }

    /// Nesting depth
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// True at the root
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Concrete path, e.g. `items[2].value`
    pub fn current_path(&self) -> String {
        let mut path = String::new();
        for segment in &self.segments {
            if let Segment::Field(_) = segment {
                if !path.is_empty() {
                    path.push('.');
                }
            }
            path.push_str(&segment.to_string());
        }
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("items[0].value"), "items[].value");
        assert_eq!(
            normalize_path("users[0].addresses[456].street"),
            "users[].addresses[].street"
        );
        assert_eq!(normalize_path("matrix[1][22]"), "matrix[][]");
        assert_eq!(normalize_path("plain.field"), "plain.field");
    }

    #[test]
    fn test_normalize_path_idempotent() {
        let once = normalize_path("a[1].b[2].c").into_owned();
        let twice = normalize_path(&once).into_owned();
        assert_eq!(once, twice);
        assert!(matches!(normalize_path("a[].b"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_normalize_leaves_non_numeric_brackets() {
        assert_eq!(normalize_path("map[key].x"), "map[key].x");
    }

    #[test]
    fn test_path_context() {
        let mut ctx = PathContext::new();
        assert!(ctx.is_root());
        assert_eq!(ctx.current_path(), "");

        ctx.push_field("users");
        ctx.push_index(2);
        ctx.push_field("addresses");
        ctx.push_index(0);
        ctx.push_field("street");
        assert_eq!(ctx.current_path(), "users[2].addresses[0].street");
        assert_eq!(
            normalize_path(&ctx.current_path()),
            "users[].addresses[].street"
        );

        ctx.pop();
        ctx.pop();
        assert_eq!(ctx.current_path(), "users[2].addresses");
        assert_eq!(ctx.depth(), 3);
    }

    #[test]
    fn test_root_list() {
        let mut ctx = PathContext::new();
        ctx.push_index(4);
        ctx.push_field("id");
        assert_eq!(ctx.current_path(), "[4].id");
        assert_eq!(normalize_path(&ctx.current_path()), "[].id");
    }
}
