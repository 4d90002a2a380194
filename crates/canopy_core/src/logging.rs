//! Tracing subscriber setup.
//!
//! Canopy's libraries only emit `tracing` events; installing a subscriber is
//! the application's job. [`TracingConfig`] is a small builder that installs
//! a `tracing-subscriber` registry with an [`EnvFilter`] and one `fmt` layer.
//!
//! # Example
//!
//! ```
//! use canopy_core::{TracingConfig, TracingFormat};
//! use tracing::Level;
//!
//! // Development: pretty output, resolver steps visible.
//! let dev = TracingConfig::default()
//!     .with_level(Level::DEBUG)
//!     .with_format(TracingFormat::Pretty);
//!
//! // Production: JSON output, only warnings from the resolver.
//! let prod = TracingConfig::default()
//!     .with_format(TracingFormat::Json)
//!     .with_env_filter("info,canopy_resolve=warn");
//! # let _ = (dev, prod);
//! ```

use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

// ─────────────────────────────────────────────────────────────────────────────
// TracingFormat
// ─────────────────────────────────────────────────────────────────────────────

/// Tracing output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingFormat {
    /// Human-readable colored output (default).
    #[default]
    Pretty,
    /// Compact single-line output.
    Compact,
    /// JSON structured output for log aggregation.
    Json,
}

// ─────────────────────────────────────────────────────────────────────────────
// TracingConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Subscriber configuration.
///
/// # Filter precedence
///
/// 1. An explicit [`with_env_filter`](Self::with_env_filter) directive string
/// 2. The `RUST_LOG` environment variable
/// 3. The configured [`level`](Self::with_level) for every target
///
/// An unparsable directive string falls back to the configured level.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    level: Level,
    format: TracingFormat,
    env_filter: Option<String>,
    span_events: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: TracingFormat::Pretty,
            env_filter: None,
            span_events: false,
        }
    }
}

impl TracingConfig {
    /// Creates a config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum log level.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Sets the output format.
    #[must_use]
    pub fn with_format(mut self, format: TracingFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets a filter directive string.
    ///
    /// Format: `target=level,target=level,...`
    ///
    /// # Example
    ///
    /// ```
    /// use canopy_core::TracingConfig;
    ///
    /// TracingConfig::new()
    ///     .with_env_filter("canopy_resolve=trace,canopy_scope=info");
    /// ```
    #[must_use]
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Enables span enter/exit events in output.
    #[must_use]
    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.span_events = enabled;
        self
    }

    /// Returns the configured maximum level.
    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }

    /// Returns the configured output format.
    #[must_use]
    pub fn format(&self) -> TracingFormat {
        self.format
    }

    /// Builds the filter this config would install.
    #[must_use]
    pub fn build_filter(&self) -> EnvFilter {
        match &self.env_filter {
            Some(filter) => {
                EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(self.level.as_str()))
            }
            None => EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(self.level.as_str())),
        }
    }

    fn span_events(&self) -> FmtSpan {
        if self.span_events {
            FmtSpan::ENTER | FmtSpan::EXIT
        } else {
            FmtSpan::NONE
        }
    }

    /// Installs the global subscriber.
    ///
    /// Returns `false` if a global subscriber was already installed, in which
    /// case the existing one is left in place.
    pub fn init(&self) -> bool {
        let filter = self.build_filter();
        let span_events = self.span_events();

        let installed = match self.format {
            TracingFormat::Pretty => tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_span_events(span_events),
                )
                .try_init()
                .is_ok(),
            TracingFormat::Compact => tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .compact()
                        .with_span_events(span_events),
                )
                .try_init()
                .is_ok(),
            TracingFormat::Json => tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_span_events(span_events),
                )
                .try_init()
                .is_ok(),
        };

        if installed {
            tracing::debug!(
                level = %self.level,
                format = ?self.format,
                "tracing initialized"
            );
        }
        installed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracing_format_default_is_pretty() {
        assert_eq!(TracingFormat::default(), TracingFormat::Pretty);
    }

    #[test]
    fn default_level_is_info() {
        assert_eq!(TracingConfig::default().level(), Level::INFO);
    }

    #[test]
    fn builder_sets_fields() {
        let config = TracingConfig::new()
            .with_level(Level::TRACE)
            .with_format(TracingFormat::Compact)
            .with_env_filter("canopy_resolve=debug")
            .with_span_events(true);

        assert_eq!(config.level(), Level::TRACE);
        assert_eq!(config.format(), TracingFormat::Compact);
        assert_eq!(config.env_filter.as_deref(), Some("canopy_resolve=debug"));
        assert_eq!(config.span_events(), FmtSpan::ENTER | FmtSpan::EXIT);
    }

    #[test]
    fn explicit_filter_is_used() {
        let filter = TracingConfig::new()
            .with_env_filter("canopy_resolve=trace")
            .build_filter();
        assert!(filter.to_string().contains("canopy_resolve=trace"));
    }

    #[test]
    fn invalid_filter_falls_back_to_level() {
        let filter = TracingConfig::new()
            .with_level(Level::WARN)
            .with_env_filter("canopy_resolve=[")
            .build_filter();
        let rendered = filter.to_string();
        assert!(rendered.contains("warn"));
        assert!(!rendered.contains("canopy_resolve"));
    }

    #[test]
    fn second_init_is_rejected() {
        let config = TracingConfig::new().with_format(TracingFormat::Compact);
        let _ = config.init();
        assert!(!config.init());
    }
}
