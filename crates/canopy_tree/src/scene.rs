//! In-memory scene tree.
//!
//! [`SceneNode`] is a thread-safe [`TreeNode`] implementation. It is what the
//! demo binary and the test suites drive, and a reasonable default for
//! applications that do not already own a tree.
//!
//! # Notifications
//!
//! | Mutation | Signals fired |
//! |----------|---------------|
//! | [`SceneNode::set_parent`] | old parent: child removed; new parent: child added; every new ancestor: descendant added (once per node in the moved subtree) |
//! | [`SceneNode::set_name`] | the node: name changed |
//! | [`SceneNode::set_reference`] | the node: attribute changed (for that attribute) |
//!
//! All signals fire after internal locks are released, so handlers may
//! freely read or mutate the tree.

use core::fmt;
use std::sync::{Arc, Weak};

use hashbrown::HashMap;
use parking_lot::{Mutex, RwLock};

use crate::signal::{Connection, Signal};
use crate::tree::{NodeHandler, NotifyHandler, TreeNode, TreeRef, same_node};

/// Errors raised by scene mutations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SceneError {
    /// The requested parent is the node itself or one of its descendants.
    #[error("cannot parent '{node}' under '{parent}': it would create a cycle")]
    Cycle {
        /// The node being moved.
        node: String,
        /// The rejected parent.
        parent: String,
    },
}

struct SceneData {
    class: String,
    name: RwLock<String>,
    parent: RwLock<Weak<SceneData>>,
    children: RwLock<Vec<Arc<SceneData>>>,
    references: RwLock<HashMap<String, Weak<SceneData>>>,
    child_added: Signal<TreeRef>,
    child_removed: Signal<TreeRef>,
    descendant_added: Signal<TreeRef>,
    name_changed: Signal<()>,
    attribute_changed: Mutex<HashMap<String, Signal<()>>>,
}

impl SceneData {
    fn collect_descendants(&self, out: &mut Vec<Arc<SceneData>>) {
        let children = self.children.read().clone();
        for child in children {
            out.push(Arc::clone(&child));
            child.collect_descendants(out);
        }
    }

    fn attribute_signal(&self, attribute: &str) -> Signal<()> {
        self.attribute_changed
            .lock()
            .entry(attribute.to_owned())
            .or_default()
            .clone()
    }
}

impl TreeNode for SceneData {
    fn name(&self) -> String {
        self.name.read().clone()
    }

    fn class_name(&self) -> String {
        self.class.clone()
    }

    fn find_first_child(&self, name: &str) -> Option<TreeRef> {
        self.children
            .read()
            .iter()
            .find(|child| *child.name.read() == name)
            .map(|child| Arc::clone(child) as TreeRef)
    }

    fn children(&self) -> Vec<TreeRef> {
        self.children
            .read()
            .iter()
            .map(|child| Arc::clone(child) as TreeRef)
            .collect()
    }

    fn descendants(&self) -> Vec<TreeRef> {
        let mut out = Vec::new();
        self.collect_descendants(&mut out);
        out.into_iter().map(|node| node as TreeRef).collect()
    }

    fn reference(&self, attribute: &str) -> Option<TreeRef> {
        self.references
            .read()
            .get(attribute)
            .and_then(Weak::upgrade)
            .map(|node| node as TreeRef)
    }

    fn on_child_added(&self, handler: NodeHandler) -> Connection {
        self.child_added.connect(move |node| handler(node))
    }

    fn on_descendant_added(&self, handler: NodeHandler) -> Connection {
        self.descendant_added.connect(move |node| handler(node))
    }

    fn on_name_changed(&self, handler: NotifyHandler) -> Connection {
        self.name_changed.connect(move |_: &()| handler())
    }

    fn on_attribute_changed(&self, attribute: &str, handler: NotifyHandler) -> Connection {
        self.attribute_signal(attribute)
            .connect(move |_: &()| handler())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SceneNode
// ─────────────────────────────────────────────────────────────────────────────

/// Handle to a node in an in-memory scene tree.
///
/// Cloning a handle is cheap and refers to the same node. A node is kept
/// alive by its handles and by its parent; parents are held weakly.
#[derive(Clone)]
pub struct SceneNode {
    inner: Arc<SceneData>,
}

impl SceneNode {
    /// Creates a detached node.
    #[must_use]
    pub fn new(class: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(SceneData {
                class: class.into(),
                name: RwLock::new(name.into()),
                parent: RwLock::new(Weak::new()),
                children: RwLock::new(Vec::new()),
                references: RwLock::new(HashMap::new()),
                child_added: Signal::new(),
                child_removed: Signal::new(),
                descendant_added: Signal::new(),
                name_changed: Signal::new(),
                attribute_changed: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Creates a node and parents it under `parent`.
    #[must_use]
    pub fn new_child(parent: &SceneNode, class: impl Into<String>, name: impl Into<String>) -> Self {
        let node = Self::new(class, name);
        // A fresh node has no descendants, so parenting it cannot cycle.
        let _ = node.set_parent(Some(parent));
        node
    }

    /// Returns the node as a type-erased tree reference.
    #[must_use]
    pub fn tree(&self) -> TreeRef {
        Arc::clone(&self.inner) as TreeRef
    }

    /// Returns `true` if `tree` refers to this node.
    #[must_use]
    pub fn is(&self, tree: &TreeRef) -> bool {
        same_node(&self.tree(), tree)
    }

    /// Returns the node's current name.
    #[must_use]
    pub fn name(&self) -> String {
        self.inner.name.read().clone()
    }

    /// Returns the node's class.
    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.inner.class
    }

    /// Renames the node. Renaming to the current name fires nothing.
    pub fn set_name(&self, name: impl Into<String>) {
        let name = name.into();
        {
            let mut current = self.inner.name.write();
            if *current == name {
                return;
            }
            *current = name;
        }
        self.inner.name_changed.fire(&());
    }

    /// Returns the node's parent.
    #[must_use]
    pub fn parent(&self) -> Option<SceneNode> {
        self.inner
            .parent
            .read()
            .upgrade()
            .map(|inner| SceneNode { inner })
    }

    /// Returns the node's direct children.
    #[must_use]
    pub fn children(&self) -> Vec<SceneNode> {
        self.inner
            .children
            .read()
            .iter()
            .map(|inner| SceneNode {
                inner: Arc::clone(inner),
            })
            .collect()
    }

    /// Returns the first direct child named `name`.
    #[must_use]
    pub fn find_first_child(&self, name: &str) -> Option<SceneNode> {
        self.inner
            .children
            .read()
            .iter()
            .find(|child| *child.name.read() == name)
            .map(|inner| SceneNode {
                inner: Arc::clone(inner),
            })
    }

    /// Moves the node under `parent`, or detaches it when `parent` is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::Cycle`] if `parent` is this node or one of its
    /// descendants. The tree is left unchanged.
    pub fn set_parent(&self, parent: Option<&SceneNode>) -> Result<(), SceneError> {
        if let Some(parent) = parent {
            let mut cursor = Some(Arc::clone(&parent.inner));
            while let Some(node) = cursor {
                if Arc::ptr_eq(&node, &self.inner) {
                    return Err(SceneError::Cycle {
                        node: self.name(),
                        parent: parent.name(),
                    });
                }
                cursor = node.parent.read().upgrade();
            }
        }

        let old = self.inner.parent.read().upgrade();
        if let (Some(old), Some(parent)) = (&old, parent) {
            if Arc::ptr_eq(old, &parent.inner) {
                return Ok(());
            }
        }

        if let Some(old) = &old {
            old.children
                .write()
                .retain(|child| !Arc::ptr_eq(child, &self.inner));
        }
        *self.inner.parent.write() = parent.map_or_else(Weak::new, |p| Arc::downgrade(&p.inner));

        let moved = self.tree();
        if let Some(old) = old {
            old.child_removed.fire(&moved);
        }

        let Some(parent) = parent else {
            return Ok(());
        };
        parent.inner.children.write().push(Arc::clone(&self.inner));

        tracing::trace!(
            node = %self.name(),
            parent = %parent.name(),
            "scene node parented"
        );

        parent.inner.child_added.fire(&moved);

        let mut subtree = vec![moved];
        subtree.extend(self.inner.descendants());

        let mut ancestor = Some(Arc::clone(&parent.inner));
        while let Some(node) = ancestor {
            for added in &subtree {
                node.descendant_added.fire(added);
            }
            ancestor = node.parent.read().upgrade();
        }

        Ok(())
    }

    /// Parents `child` under this node. See [`set_parent`](Self::set_parent).
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::Cycle`] if this node is `child` or lies below it.
    pub fn add_child(&self, child: &SceneNode) -> Result<(), SceneError> {
        child.set_parent(Some(self))
    }

    /// Detaches the node from its parent.
    pub fn remove(&self) {
        // Detaching never creates a cycle.
        let _ = self.set_parent(None);
    }

    /// Assigns (or clears) a reference-valued attribute.
    ///
    /// References are held weakly: a referenced node that is dropped
    /// everywhere else reads back as absent.
    pub fn set_reference(&self, attribute: &str, target: Option<&SceneNode>) {
        {
            let mut references = self.inner.references.write();
            match target {
                Some(target) => {
                    references.insert(attribute.to_owned(), Arc::downgrade(&target.inner));
                }
                None => {
                    references.remove(attribute);
                }
            }
        }
        self.inner.attribute_signal(attribute).fire(&());
    }

    /// Returns the node held by a reference-valued attribute.
    #[must_use]
    pub fn reference(&self, attribute: &str) -> Option<SceneNode> {
        self.inner
            .references
            .read()
            .get(attribute)
            .and_then(Weak::upgrade)
            .map(|inner| SceneNode { inner })
    }

    fn signals(&self) -> Vec<(usize, usize)> {
        let mut counts = vec![
            (
                self.inner.child_added.listener_count(),
                self.inner.child_added.deliveries(),
            ),
            (
                self.inner.child_removed.listener_count(),
                self.inner.child_removed.deliveries(),
            ),
            (
                self.inner.descendant_added.listener_count(),
                self.inner.descendant_added.deliveries(),
            ),
            (
                self.inner.name_changed.listener_count(),
                self.inner.name_changed.deliveries(),
            ),
        ];
        counts.extend(
            self.inner
                .attribute_changed
                .lock()
                .values()
                .map(|signal| (signal.listener_count(), signal.deliveries())),
        );
        counts
    }

    /// Returns the number of handlers connected to any of this node's signals.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.signals().iter().map(|(listeners, _)| listeners).sum()
    }

    /// Returns the number of handler invocations made by this node's signals.
    #[must_use]
    pub fn deliveries(&self) -> usize {
        self.signals().iter().map(|(_, deliveries)| deliveries).sum()
    }
}

impl fmt::Debug for SceneNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneNode")
            .field("class", &self.inner.class)
            .field("name", &self.name())
            .field("children", &self.inner.children.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn set_parent_fires_child_added() {
        let root = SceneNode::new("Folder", "root");
        let added = Arc::new(AtomicUsize::new(0));

        let seen = Arc::clone(&added);
        let _conn = root.tree().on_child_added(Box::new(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        }));

        let child = SceneNode::new("Part", "child");
        child.set_parent(Some(&root)).unwrap();

        assert_eq!(added.load(Ordering::SeqCst), 1);
        assert!(root.find_first_child("child").is_some());
    }

    #[test]
    fn descendant_added_covers_moved_subtree() {
        let root = SceneNode::new("Folder", "root");
        let middle = SceneNode::new_child(&root, "Folder", "middle");

        let names = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&names);
        let _conn = root.tree().on_descendant_added(Box::new(move |node| {
            seen.lock().push(node.name());
        }));

        let branch = SceneNode::new("Model", "branch");
        let _leaf = SceneNode::new_child(&branch, "Part", "leaf");
        branch.set_parent(Some(&middle)).unwrap();

        assert_eq!(*names.lock(), vec!["branch".to_owned(), "leaf".to_owned()]);
    }

    #[test]
    fn reparenting_into_own_subtree_is_rejected() {
        let root = SceneNode::new("Folder", "root");
        let child = SceneNode::new_child(&root, "Folder", "child");

        let err = root.set_parent(Some(&child)).unwrap_err();
        assert!(matches!(err, SceneError::Cycle { .. }));
        assert!(root.parent().is_none());
    }

    #[test]
    fn rename_fires_only_on_change() {
        let node = SceneNode::new("Part", "a");
        let renamed = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&renamed);
        let _conn = node.tree().on_name_changed(Box::new(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        }));

        node.set_name("a");
        node.set_name("b");
        assert_eq!(renamed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn remove_detaches_and_fires_child_removed() {
        let root = SceneNode::new("Folder", "root");
        let child = SceneNode::new_child(&root, "Part", "child");
        let _conn = root.inner.child_removed.connect(|_| {});
        child.remove();

        assert!(child.parent().is_none());
        assert!(root.children().is_empty());
        assert_eq!(root.inner.child_removed.deliveries(), 1);
    }

    #[test]
    fn references_are_weak_and_notify() {
        let model = SceneNode::new("Model", "Car");
        let changed = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&changed);
        let _conn = model.tree().on_attribute_changed(
            "PrimaryPart",
            Box::new(move || {
                seen.fetch_add(1, Ordering::SeqCst);
            }),
        );

        let part = SceneNode::new("Part", "Body");
        model.set_reference("PrimaryPart", Some(&part));
        assert_eq!(changed.load(Ordering::SeqCst), 1);
        assert!(model.reference("PrimaryPart").is_some());

        drop(part);
        assert!(model.reference("PrimaryPart").is_none());
    }

    #[test]
    fn listener_count_tracks_connections() {
        let node = SceneNode::new("Part", "a");
        let conn = node.tree().on_name_changed(Box::new(|| {}));
        let attr = node.tree().on_attribute_changed("X", Box::new(|| {}));
        assert_eq!(node.listener_count(), 2);

        conn.disconnect();
        drop(attr);
        assert_eq!(node.listener_count(), 0);
    }
}
