//! Asynchronous resolution over live Canopy trees (Layer 2).
//!
//! `canopy_resolve` turns "the node at this path, once it exists" into a
//! future. Lookups subscribe to the tree's change notifications instead of
//! polling, settle synchronously when their target already exists, and
//! release every subscription the moment they settle, time out, or are
//! cancelled.
//!
//! # Core Concepts
//!
//! - [`Resolver`] - Entry point: path, anchor, descendant, and child lookups
//! - [`Resolution`] - The lookup future; cancel it or drop it to stop waiting
//! - [`Completer`] - Producer side of a resolution
//! - [`ResolveOptions`] - Per-call timeout and path separator
//! - [`bulk`] - Fail-fast wait over several resolutions
//! - [`ResolveError`] - Validation, timeout, type mismatch, aggregate,
//!   cancellation
//!
//! # Example
//!
//! ```
//! use canopy_resolve::{ResolveOptions, Resolver};
//! use canopy_tree::{ManualTicker, SceneNode};
//! use core::time::Duration;
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let resolver = Resolver::new(Arc::new(ManualTicker::new()));
//! let workspace = SceneNode::new("Folder", "Workspace");
//! let map = SceneNode::new_child(&workspace, "Model", "Map");
//! let spawn = SceneNode::new_child(&map, "Part", "Spawn");
//! map.set_reference("PrimaryPart", Some(&spawn));
//!
//! let options = ResolveOptions::new().with_timeout(Duration::from_secs(5));
//! let anchor = resolver.resolve_anchor(&workspace, "Map", &options).await.unwrap();
//! assert!(spawn.is(anchor.as_tree().unwrap()));
//! # });
//! ```
//!
//! # Architecture
//!
//! - **Layer 1** (`canopy_scope`, `canopy_tree`): disposal scopes, the
//!   observable tree, tick sources
//! - **Layer 2** (`canopy_resolve`): resolution operations (this crate)
//! - **Layer 3** (`canopy_core`): logging setup for applications

/// Anchor (primary part) resolution.
pub mod anchor;

/// Fail-fast waiting over several resolutions.
pub mod bulk;

/// Resolution error types.
pub mod error;

/// Per-call resolution options.
pub mod options;

/// Path parsing.
pub mod path;

/// The resolution future and its completer.
pub mod resolution;

/// Resolution entry points.
pub mod resolver;

mod descendant;
mod walk;

pub use anchor::AnchorSpec;
pub use bulk::bulk;
pub use error::{ResolveError, ValidationError};
pub use options::ResolveOptions;
pub use path::{DEFAULT_SEPARATOR, NodePath, split_path};
pub use resolution::{Completer, Resolution, ResolutionId, Status};
pub use resolver::Resolver;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::anchor::AnchorSpec;
    pub use crate::bulk::bulk;
    pub use crate::error::{ResolveError, ValidationError};
    pub use crate::options::ResolveOptions;
    pub use crate::path::{DEFAULT_SEPARATOR, NodePath, split_path};
    pub use crate::resolution::{Completer, Resolution, ResolutionId, Status};
    pub use crate::resolver::Resolver;
}
