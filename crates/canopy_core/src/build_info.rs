//! Build metadata.

/// Version and build mode of the Canopy libraries in use.
///
/// Applications usually log this once at startup so that log streams can be
/// matched to a build.
///
/// # Example
///
/// ```
/// use canopy_core::BuildInfo;
///
/// let info = BuildInfo::default();
/// tracing::info!(version = info.version, debug = info.debug, "canopy starting");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildInfo {
    /// Crate version string.
    pub version: &'static str,
    /// Whether the build has debug assertions enabled.
    pub debug: bool,
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            debug: cfg!(debug_assertions),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_info_default() {
        let info = BuildInfo::default();
        assert_eq!(info.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(info.debug, cfg!(debug_assertions));
    }
}
