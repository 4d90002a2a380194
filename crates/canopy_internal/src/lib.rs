//! # Canopy Internal Library
//!
//! Re-exports the core Canopy crates for convenience.

/// Layer 1: Disposable resource scopes.
pub use canopy_scope;

/// Layer 1: Observable tree, tables, and tick sources.
pub use canopy_tree;

/// Layer 2: Asynchronous resolution.
pub use canopy_resolve;

/// Application infrastructure (tracing setup).
pub use canopy_core;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use canopy_core::{BuildInfo, TracingConfig, TracingFormat};
    pub use canopy_resolve::prelude::*;
    pub use canopy_scope::{Disposable, Scope};
    pub use canopy_tree::prelude::*;
}
