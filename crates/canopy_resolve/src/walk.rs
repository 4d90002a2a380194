//! Incremental path matcher.
//!
//! A [`PathWalk`] advances one segment at a time from a root [`Node`]. Each
//! step either finds the next segment synchronously and moves on, or
//! subscribes to whatever can make the segment appear and suspends:
//!
//! - **Tree node**: child added on the parent, plus name changed on every
//!   current child and on every non-matching child added later.
//! - **Table**: one presence check per scheduler tick.
//! - **Scalar**: the walk ends on the scalar; remaining segments are ignored.
//!
//! Every subscription of a step lives in a child scope of the walk's scope.
//! The first event that satisfies the step disposes that child scope, which
//! both tears down its sibling subscriptions and guarantees the step
//! advances exactly once.

use std::sync::{Arc, Weak};

use canopy_scope::Scope;
use canopy_tree::{Node, Ticker, TreeNode, TreeRef, same_node};
use parking_lot::Mutex;

use crate::path::NodePath;
use crate::resolution::ResolutionId;

/// Called once with the node the path leads to.
pub(crate) type OnFound = Box<dyn FnOnce(Node) + Send>;

/// Where an in-flight walk currently stands.
///
/// Owned by exactly one walk step at a time; `cursor` only ever grows and
/// never exceeds the path length.
pub(crate) struct ResolutionState {
    pub(crate) current: Node,
    pub(crate) cursor: usize,
}

impl ResolutionState {
    fn descend(&mut self, next: Node) {
        self.current = next;
        self.cursor += 1;
    }
}

pub(crate) struct PathWalk {
    id: ResolutionId,
    path: NodePath,
    scope: Scope,
    ticker: Arc<dyn Ticker>,
    on_found: Mutex<Option<OnFound>>,
}

impl PathWalk {
    /// Starts walking `path` from `root`.
    ///
    /// All subscriptions are registered on `scope`; disposing it stops the
    /// walk for good. `on_found` runs at most once, possibly before this
    /// function returns.
    pub(crate) fn start(
        id: ResolutionId,
        root: Node,
        path: NodePath,
        scope: Scope,
        ticker: Arc<dyn Ticker>,
        on_found: OnFound,
    ) {
        let walk = Arc::new(PathWalk {
            id,
            path,
            scope,
            ticker,
            on_found: Mutex::new(Some(on_found)),
        });
        walk.advance(ResolutionState {
            current: root,
            cursor: 0,
        });
    }

    fn advance(self: &Arc<Self>, mut state: ResolutionState) {
        loop {
            if self.scope.is_disposed() {
                return;
            }

            let Some(segment) = self.path.get(state.cursor) else {
                self.finish(state.current);
                return;
            };

            let next = match &state.current {
                Node::Tree(tree) => match tree.find_first_child(segment) {
                    Some(child) => Some(Node::Tree(child)),
                    None => {
                        self.watch_tree(Arc::clone(tree), state.cursor);
                        return;
                    }
                },
                Node::Table(table) => match table.get(segment) {
                    Some(value) => Some(value),
                    None => {
                        self.poll_table(table.clone(), state.cursor);
                        return;
                    }
                },
                Node::Value(value) => {
                    tracing::warn!(
                        resolution = %self.id,
                        path = %self.path,
                        cursor = state.cursor,
                        value = ?value,
                        "path reached a scalar; remaining segments ignored"
                    );
                    None
                }
            };

            let Some(next) = next else {
                self.finish(state.current);
                return;
            };

            tracing::trace!(
                resolution = %self.id,
                segment = %segment,
                cursor = state.cursor,
                "segment found"
            );
            state.descend(next);
        }
    }

    fn finish(&self, node: Node) {
        let on_found = self.on_found.lock().take();
        if let Some(on_found) = on_found {
            on_found(node);
        }
    }

    /// Advances past the step owned by `step` if nobody has yet.
    fn complete_step(self: &Arc<Self>, step: &Scope, next: Node, cursor: usize) {
        if step.dispose() {
            tracing::trace!(
                resolution = %self.id,
                cursor,
                "segment appeared"
            );
            self.advance(ResolutionState {
                current: next,
                cursor: cursor + 1,
            });
        }
    }

    fn watch_tree(self: &Arc<Self>, parent: TreeRef, cursor: usize) {
        let Some(segment) = self.path.get(cursor).map(str::to_owned) else {
            return;
        };
        let step = self.scope.child();
        tracing::trace!(
            resolution = %self.id,
            segment = %segment,
            cursor,
            "waiting for child"
        );

        let watcher = Arc::new(StepWatcher {
            walk: Arc::clone(self),
            step: step.clone(),
            parent: Arc::downgrade(&parent),
            segment,
            cursor,
        });

        // Subscribe before taking the snapshot: a child added in between is
        // then seen by the handler, the snapshot, or both.
        let on_added = Arc::clone(&watcher);
        step.add(parent.on_child_added(Box::new(move |child| {
            if child.name() == on_added.segment {
                on_added.matched(Arc::clone(child));
            } else {
                on_added.watch_rename(child);
            }
        })));

        for child in parent.children() {
            watcher.watch_rename(&child);
        }

        // The child may have appeared between the lookup and the subscriptions.
        if let Some(child) = parent.find_first_child(&watcher.segment) {
            watcher.matched(child);
        }
    }

    fn poll_table(self: &Arc<Self>, table: canopy_tree::Table, cursor: usize) {
        let Some(segment) = self.path.get(cursor).map(str::to_owned) else {
            return;
        };
        let step = self.scope.child();
        tracing::trace!(
            resolution = %self.id,
            segment = %segment,
            cursor,
            "polling table"
        );

        let walk = Arc::clone(self);
        let handle = step.clone();
        step.add(self.ticker.on_tick(Box::new(move || {
            if let Some(value) = table.get(&segment) {
                walk.complete_step(&handle, value, cursor);
            }
        })));
    }
}

/// Shared state of the subscriptions for one tree step.
struct StepWatcher {
    walk: Arc<PathWalk>,
    step: Scope,
    parent: Weak<dyn TreeNode>,
    segment: String,
    cursor: usize,
}

impl StepWatcher {
    fn matched(&self, child: TreeRef) {
        self.walk
            .complete_step(&self.step, Node::Tree(child), self.cursor);
    }

    /// Subscribes to `child` being renamed into the awaited segment.
    fn watch_rename(self: &Arc<Self>, child: &TreeRef) {
        let watcher = Arc::clone(self);
        let weak_child = Arc::downgrade(child);
        self.step.add(child.on_name_changed(Box::new(move || {
            let Some(child) = weak_child.upgrade() else {
                return;
            };
            if child.name() != watcher.segment {
                return;
            }
            // Only a rename under the awaited parent counts.
            let still_child = watcher.parent.upgrade().is_some_and(|parent| {
                parent
                    .children()
                    .iter()
                    .any(|candidate| same_node(candidate, &child))
            });
            if still_child {
                watcher.matched(child);
            }
        })));
    }
}
