//! Per-call configuration.

use core::time::Duration;

use crate::error::ValidationError;
use crate::path::DEFAULT_SEPARATOR;

/// Options accepted by every resolution entry point.
///
/// # Example
///
/// ```
/// use canopy_resolve::ResolveOptions;
/// use std::time::Duration;
///
/// let options = ResolveOptions::new()
///     .with_timeout(Duration::from_secs(5))
///     .with_separator("/");
/// assert_eq!(options.separator(), "/");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveOptions {
    timeout: Option<Duration>,
    separator: String,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            timeout: None,
            separator: DEFAULT_SEPARATOR.to_owned(),
        }
    }
}

impl ResolveOptions {
    /// Creates options with no timeout and the default separator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects the resolution if it has not settled within `timeout`.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the path separator.
    #[must_use]
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Returns the configured timeout.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Returns the path separator.
    #[must_use]
    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Checks the options, independent of any path or root.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::NonPositiveTimeout`] for a zero timeout
    /// - [`ValidationError::EmptySeparator`] for an empty separator
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.timeout.is_some_and(|timeout| timeout.is_zero()) {
            return Err(ValidationError::NonPositiveTimeout);
        }
        if self.separator.is_empty() {
            return Err(ValidationError::EmptySeparator);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = ResolveOptions::default();
        assert_eq!(options.timeout(), None);
        assert_eq!(options.separator(), ".");
        assert!(options.validate().is_ok());
    }

    #[test]
    fn zero_timeout_is_invalid() {
        let options = ResolveOptions::new().with_timeout(Duration::ZERO);
        assert_eq!(options.validate(), Err(ValidationError::NonPositiveTimeout));
    }

    #[test]
    fn empty_separator_is_invalid() {
        let options = ResolveOptions::new().with_separator("");
        assert_eq!(options.validate(), Err(ValidationError::EmptySeparator));
    }
}
