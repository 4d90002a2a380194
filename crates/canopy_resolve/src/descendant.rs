//! Descendant search.
//!
//! Unlike a path walk, a descendant search looks for a name anywhere below a
//! root: first in a snapshot of the existing subtree, then in every node
//! added to it afterwards.

use canopy_tree::{Node, TreeNode, TreeRef};

use crate::resolution::Completer;

/// Name and optional class a descendant must have.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DescendantQuery {
    pub(crate) name: String,
    pub(crate) class: Option<String>,
}

impl DescendantQuery {
    fn matches(&self, node: &TreeRef) -> bool {
        node.name() == self.name && self.class.as_deref().is_none_or(|class| node.is_a(class))
    }
}

/// Settles `completer` with the first descendant of `root` matching `query`.
pub(crate) fn find(root: &TreeRef, query: DescendantQuery, completer: &Completer<Node>) {
    if let Some(found) = root.descendants().into_iter().find(|node| query.matches(node)) {
        completer.resolve(Node::Tree(found));
        return;
    }

    tracing::trace!(
        resolution = %completer.id(),
        root = %root.name(),
        name = %query.name,
        class = ?query.class,
        "waiting for descendant"
    );

    let settle = completer.clone();
    let filter = query.clone();
    completer
        .scope()
        .add(root.on_descendant_added(Box::new(move |node| {
            if filter.matches(node) {
                settle.resolve(Node::Tree(node.clone()));
            }
        })));

    // A match may have been added between the scan and the subscription.
    if let Some(found) = root.descendants().into_iter().find(|node| query.matches(node)) {
        completer.resolve(Node::Tree(found));
    }
}
