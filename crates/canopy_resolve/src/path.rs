//! Path parsing.
//!
//! A path is a separator-delimited list of names, e.g. `"Workspace.Map.Spawn"`.
//! Parsing is a plain split: whitespace is kept, segment contents are not
//! checked, and empty segments (from an empty path or repeated separators)
//! are preserved as literal empty names.

use core::fmt;
use std::sync::Arc;

use crate::error::ValidationError;

/// Separator used when none is configured.
pub const DEFAULT_SEPARATOR: &str = ".";

/// Splits `path` on `separator`.
///
/// Mirrors [`str::split`] exactly, so `""` yields a single empty segment.
/// An empty separator is the caller's responsibility; see [`NodePath::parse`]
/// for the validating form.
#[must_use]
pub fn split_path(path: &str, separator: &str) -> Vec<String> {
    path.split(separator).map(str::to_owned).collect()
}

/// An ordered, immutable sequence of path segments.
///
/// Cloning is cheap: segments are shared.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodePath {
    segments: Arc<[String]>,
}

impl NodePath {
    /// Parses `path`, splitting on `separator`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptySeparator`] if `separator` is empty.
    pub fn parse(path: &str, separator: &str) -> Result<Self, ValidationError> {
        if separator.is_empty() {
            return Err(ValidationError::EmptySeparator);
        }
        Ok(Self::from_segments(split_path(path, separator)))
    }

    /// Builds a path from already-split segments.
    #[must_use]
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the segments in order.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns the segment at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.segments.get(index).map(String::as_str)
    }

    /// Returns the number of segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns `true` if the path has no segments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns `true` if any segment is the empty string.
    #[must_use]
    pub fn has_empty_segments(&self) -> bool {
        self.segments.iter().any(String::is_empty)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join(DEFAULT_SEPARATOR))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_default_separator() {
        let path = NodePath::parse("Workspace.Map.Spawn", DEFAULT_SEPARATOR).unwrap();
        assert_eq!(path.segments(), ["Workspace", "Map", "Spawn"]);
        assert_eq!(path.len(), 3);
    }

    #[test]
    fn custom_separator() {
        let path = NodePath::parse("a/b.c/d", "/").unwrap();
        assert_eq!(path.segments(), ["a", "b.c", "d"]);
    }

    #[test]
    fn multi_character_separator() {
        assert_eq!(split_path("a::b::c", "::"), ["a", "b", "c"]);
    }

    #[test]
    fn empty_path_is_one_empty_segment() {
        let path = NodePath::parse("", DEFAULT_SEPARATOR).unwrap();
        assert_eq!(path.segments(), [""]);
        assert!(path.has_empty_segments());
    }

    #[test]
    fn repeated_separators_preserve_empty_segments() {
        assert_eq!(split_path("a..b", "."), ["a", "", "b"]);
        assert_eq!(split_path(".a.", "."), ["", "a", ""]);
    }

    #[test]
    fn whitespace_is_not_trimmed() {
        assert_eq!(split_path(" a . b ", "."), [" a ", " b "]);
    }

    #[test]
    fn empty_separator_is_rejected() {
        assert_eq!(
            NodePath::parse("a.b", ""),
            Err(ValidationError::EmptySeparator)
        );
    }
}
