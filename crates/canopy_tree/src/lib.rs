//! Live object tree primitives for Canopy (Layer 1).
//!
//! `canopy_tree` defines the tree that resolvers observe. It is deliberately
//! small: resolvers only need synchronous lookups plus a handful of change
//! notifications.
//!
//! # Core Concepts
//!
//! - [`Signal`] / [`Connection`] - Multi-listener event source and its
//!   disconnectable subscription handle
//! - [`TreeNode`] - The observable node interface (name, class, children,
//!   descendants, reference attributes, change notifications)
//! - [`SceneNode`] - Thread-safe in-memory [`TreeNode`] implementation
//! - [`Table`] - Plain nested key/value container without notifications
//! - [`Node`] - Closed kind enum over trees, tables, and scalar values
//! - [`Ticker`] - Injected scheduler tick source ([`ManualTicker`], [`Heartbeat`])
//!
//! # Example
//!
//! ```
//! use canopy_tree::{SceneNode, TreeNode};
//!
//! let workspace = SceneNode::new("Folder", "Workspace");
//! let map = SceneNode::new("Model", "Map");
//! map.set_parent(Some(&workspace)).unwrap();
//!
//! let found = workspace.tree().find_first_child("Map").unwrap();
//! assert!(map.is(&found));
//! assert_eq!(found.class_name(), "Model");
//! ```

/// Closed node kind enum and scalar values.
pub mod node;

/// In-memory scene tree.
pub mod scene;

/// Multi-listener event sources.
pub mod signal;

/// Plain nested key/value containers.
pub mod table;

/// Scheduler tick sources.
pub mod ticker;

/// Observable tree node interface.
pub mod tree;

pub use node::{Node, NodeKind, Scalar};
pub use scene::{SceneError, SceneNode};
pub use signal::{Connection, Signal};
pub use table::Table;
pub use ticker::{Heartbeat, ManualTicker, Ticker};
pub use tree::{NodeHandler, NotifyHandler, TreeNode, TreeRef, same_node};

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::node::{Node, NodeKind, Scalar};
    pub use crate::scene::{SceneError, SceneNode};
    pub use crate::signal::{Connection, Signal};
    pub use crate::table::Table;
    pub use crate::ticker::{Heartbeat, ManualTicker, Ticker};
    pub use crate::tree::{NodeHandler, NotifyHandler, TreeNode, TreeRef, same_node};
}
