//! Application infrastructure for Canopy.
//!
//! Canopy's libraries emit `tracing` events but never install a subscriber.
//! This crate provides what an application needs around them:
//!
//! - [`TracingConfig`] / [`TracingFormat`] - Subscriber setup (filter, format)
//! - [`BuildInfo`] - Library version and build mode, for startup logs
//!
//! # Example
//!
//! ```
//! use canopy_core::{BuildInfo, TracingConfig, TracingFormat};
//! use tracing::Level;
//!
//! TracingConfig::new()
//!     .with_level(Level::DEBUG)
//!     .with_format(TracingFormat::Compact)
//!     .init();
//!
//! let info = BuildInfo::default();
//! tracing::info!(version = info.version, "canopy ready");
//! ```

mod build_info;
mod logging;

pub use build_info::BuildInfo;
pub use logging::{TracingConfig, TracingFormat};
