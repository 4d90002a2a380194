//! The observable tree node interface.
//!
//! Resolvers never depend on a concrete tree. They consume [`TreeNode`]:
//! synchronous lookups plus change notifications, each subscription handing
//! back a [`Connection`].

use std::sync::Arc;

use crate::signal::Connection;

/// Shared, type-erased reference to a tree node.
pub type TreeRef = Arc<dyn TreeNode>;

/// Handler receiving a node delivered by a tree notification.
pub type NodeHandler = Box<dyn Fn(&TreeRef) + Send + Sync>;

/// Handler for notifications that carry no payload.
pub type NotifyHandler = Box<dyn Fn() + Send + Sync>;

/// A node in a live, mutating tree.
///
/// Implementations must be safe to observe from any thread. Notifications
/// are delivered synchronously by whoever mutates the tree.
pub trait TreeNode: Send + Sync + 'static {
    /// Returns the node's current name.
    fn name(&self) -> String;

    /// Returns the node's class (type tag).
    fn class_name(&self) -> String;

    /// Returns the first direct child with the given name.
    fn find_first_child(&self, name: &str) -> Option<TreeRef>;

    /// Returns a snapshot of the node's direct children.
    fn children(&self) -> Vec<TreeRef>;

    /// Returns a snapshot of every node below this one, in any order.
    fn descendants(&self) -> Vec<TreeRef>;

    /// Returns the node held by a reference-valued attribute, if assigned.
    fn reference(&self, attribute: &str) -> Option<TreeRef>;

    /// Subscribes to direct children being added.
    fn on_child_added(&self, handler: NodeHandler) -> Connection;

    /// Subscribes to nodes being added anywhere below this one.
    fn on_descendant_added(&self, handler: NodeHandler) -> Connection;

    /// Subscribes to this node being renamed.
    fn on_name_changed(&self, handler: NotifyHandler) -> Connection;

    /// Subscribes to a reference-valued attribute being assigned or cleared.
    fn on_attribute_changed(&self, attribute: &str, handler: NotifyHandler) -> Connection;

    /// Returns whether the node's class is `class`.
    fn is_a(&self, class: &str) -> bool {
        self.class_name() == class
    }
}

/// Returns `true` if both references point at the same node.
///
/// Compares data pointers only, so two `TreeRef`s produced through different
/// vtables still compare equal.
#[must_use]
pub fn same_node(a: &TreeRef, b: &TreeRef) -> bool {
    core::ptr::eq(Arc::as_ptr(a).cast::<()>(), Arc::as_ptr(b).cast::<()>())
}
