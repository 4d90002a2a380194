//! Anchor resolution.
//!
//! Once a path has led to a composite node, the composite's anchor (a
//! reference-valued attribute such as `PrimaryPart` on a `Model`) may still
//! be unassigned. This stage waits for it, restarting the timeout so the
//! anchor wait gets its own window.

use std::sync::Arc;

use canopy_tree::{Node, TreeNode};

use crate::error::ResolveError;
use crate::resolution::Completer;

/// Which class counts as composite and which attribute holds its anchor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorSpec {
    /// Class the resolved node must have.
    pub kind: String,
    /// Reference-valued attribute holding the anchor.
    pub attribute: String,
}

impl Default for AnchorSpec {
    fn default() -> Self {
        Self {
            kind: "Model".to_owned(),
            attribute: "PrimaryPart".to_owned(),
        }
    }
}

/// Settles `completer` with the anchor of `node`, waiting for it if needed.
pub(crate) fn await_anchor(node: Node, spec: &AnchorSpec, completer: Completer<Node>) {
    let composite = match node {
        Node::Tree(tree) if tree.is_a(&spec.kind) => tree,
        Node::Tree(tree) => {
            completer.reject(ResolveError::TypeMismatch {
                node: tree.name(),
                expected: spec.kind.clone(),
                found: tree.class_name(),
            });
            return;
        }
        other => {
            completer.reject(ResolveError::TypeMismatch {
                node: other.label(),
                expected: spec.kind.clone(),
                found: other.kind().to_string(),
            });
            return;
        }
    };

    if let Some(anchor) = composite.reference(&spec.attribute) {
        completer.resolve(Node::Tree(anchor));
        return;
    }

    tracing::trace!(
        resolution = %completer.id(),
        composite = %composite.name(),
        attribute = %spec.attribute,
        "waiting for anchor"
    );
    completer.restart_deadline();

    let weak = Arc::downgrade(&composite);
    let attribute = spec.attribute.clone();
    let settle = completer.clone();
    completer.scope().add(composite.on_attribute_changed(
        &spec.attribute,
        Box::new(move || {
            if let Some(anchor) = weak.upgrade().and_then(|c| c.reference(&attribute)) {
                settle.resolve(Node::Tree(anchor));
            }
        }),
    ));

    // The anchor may have been assigned between the check and the subscription.
    if let Some(anchor) = composite.reference(&spec.attribute) {
        completer.resolve(Node::Tree(anchor));
    }
}
