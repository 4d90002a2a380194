//! Error taxonomy for resolution operations.
//!
//! Every failure surfaces as a rejected [`Resolution`](crate::Resolution),
//! never as a panic. Variants carry structured fields so callers can match
//! on what went wrong rather than on message text.

use core::time::Duration;

use canopy_tree::NodeKind;

/// Argument errors, detected before any subscription is created.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The root is a scalar; only tree nodes and tables can be walked.
    #[error("root must be a tree node or a table, found a {found}")]
    UnsupportedRoot {
        /// Kind of the rejected root.
        found: NodeKind,
    },
    /// A timeout of zero was supplied.
    #[error("timeout must be a positive duration")]
    NonPositiveTimeout,
    /// The path separator is the empty string.
    #[error("path separator must not be empty")]
    EmptySeparator,
    /// A child or descendant name is the empty string.
    #[error("name must not be empty")]
    EmptyName,
}

/// Errors a resolution can be rejected with.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// The call's arguments were invalid.
    #[error("invalid argument: {0}")]
    Validation(#[from] ValidationError),

    /// The deadline elapsed before the target appeared.
    #[error("timed out after {elapsed:?} waiting for '{target}' (timeout {timeout:?})")]
    Timeout {
        /// The path or name being waited for.
        target: String,
        /// The configured timeout.
        timeout: Duration,
        /// Time actually spent in the wait that expired.
        elapsed: Duration,
    },

    /// The resolved node is not of the expected class.
    #[error("'{node}' is a {found}, expected a {expected}")]
    TypeMismatch {
        /// Label of the offending node.
        node: String,
        /// The class that was required.
        expected: String,
        /// The class (or kind) that was found.
        found: String,
    },

    /// One input of a bulk wait failed.
    #[error("bulk input {index} failed: {source}")]
    Aggregate {
        /// Position of the failed input.
        index: usize,
        /// The input's own error.
        source: Box<ResolveError>,
    },

    /// The resolution was cancelled before it settled.
    #[error("resolution was cancelled")]
    Cancelled,
}

impl ResolveError {
    /// Returns `true` for [`ResolveError::Timeout`].
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, ResolveError::Timeout { .. })
    }

    /// Returns `true` for [`ResolveError::Cancelled`].
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ResolveError::Cancelled)
    }

    /// Follows [`ResolveError::Aggregate`] wrappers down to the original cause.
    #[must_use]
    pub fn root_cause(&self) -> &ResolveError {
        match self {
            ResolveError::Aggregate { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
