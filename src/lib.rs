//! Asynchronous path resolution over live, mutating object trees.
//!
//! See [`canopy_resolve::Resolver`] for the entry points.

pub use canopy_internal::*;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use canopy_internal::prelude::*;
}
