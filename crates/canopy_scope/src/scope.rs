//! The [`Scope`] type and the [`Disposable`] trait.

use core::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

// ─────────────────────────────────────────────────────────────────────────────
// Disposable
// ─────────────────────────────────────────────────────────────────────────────

/// Something that can be released exactly once.
///
/// Ownership of the item moves into the scope on registration, and back out
/// again when the scope releases it, so `dispose` consumes the box.
pub trait Disposable: Send + 'static {
    /// Releases the resource.
    fn dispose(self: Box<Self>);
}

/// A closure run on disposal.
struct Deferred<F>(F);

impl<F> Disposable for Deferred<F>
where
    F: FnOnce() + Send + 'static,
{
    fn dispose(self: Box<Self>) {
        (self.0)();
    }
}

impl Disposable for Scope {
    fn dispose(self: Box<Self>) {
        Scope::dispose(&self);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Scope
// ─────────────────────────────────────────────────────────────────────────────

/// Handle onto a disposable bag of cleanup actions.
///
/// Cloning a `Scope` yields another handle onto the *same* scope. Dropping a
/// handle never disposes anything: [`dispose`](Self::dispose) is the only
/// way to release what the scope holds.
#[derive(Clone)]
pub struct Scope {
    inner: Arc<ScopeInner>,
}

struct ScopeInner {
    state: Mutex<ScopeState>,
    /// Parent scope and this scope's key in the parent's entry list.
    parent: Option<(Weak<ScopeInner>, u64)>,
}

enum ScopeState {
    Open {
        next_key: u64,
        entries: Vec<(u64, Box<dyn Disposable>)>,
    },
    Disposed,
}

impl ScopeState {
    fn open() -> Self {
        ScopeState::Open {
            next_key: 0,
            entries: Vec::new(),
        }
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl Scope {
    /// Creates a new, empty root scope.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ScopeInner {
                state: Mutex::new(ScopeState::open()),
                parent: None,
            }),
        }
    }

    /// Creates a nested scope owned by this one.
    ///
    /// Disposing `self` disposes the child. Disposing the child early
    /// detaches it from `self`, so short-lived children do not accumulate.
    /// A child of an already-disposed scope is born disposed.
    #[must_use]
    pub fn child(&self) -> Scope {
        let mut state = self.inner.state.lock();
        let ScopeState::Open { next_key, entries } = &mut *state else {
            return Scope {
                inner: Arc::new(ScopeInner {
                    state: Mutex::new(ScopeState::Disposed),
                    parent: None,
                }),
            };
        };

        let key = *next_key;
        *next_key += 1;

        let child = Scope {
            inner: Arc::new(ScopeInner {
                state: Mutex::new(ScopeState::open()),
                parent: Some((Arc::downgrade(&self.inner), key)),
            }),
        };
        entries.push((key, Box::new(child.clone())));
        child
    }

    /// Registers an item to be released when this scope is disposed.
    ///
    /// If the scope is already disposed, the item is released immediately and
    /// `false` is returned.
    pub fn add(&self, item: impl Disposable) -> bool {
        self.add_boxed(Box::new(item))
    }

    /// Registers an already-boxed item. See [`add`](Self::add).
    pub fn add_boxed(&self, item: Box<dyn Disposable>) -> bool {
        let mut state = self.inner.state.lock();
        match &mut *state {
            ScopeState::Open { next_key, entries } => {
                let key = *next_key;
                *next_key += 1;
                entries.push((key, item));
                true
            }
            ScopeState::Disposed => {
                drop(state);
                item.dispose();
                false
            }
        }
    }

    /// Registers a closure to run when this scope is disposed.
    ///
    /// Runs the closure immediately if the scope is already disposed.
    pub fn defer(&self, cleanup: impl FnOnce() + Send + 'static) -> bool {
        self.add(Deferred(cleanup))
    }

    /// Disposes the scope, releasing every registered item newest-first.
    ///
    /// Returns `true` only for the call that performed the disposal; every
    /// later call is a no-op returning `false`.
    pub fn dispose(&self) -> bool {
        let entries = {
            let mut state = self.inner.state.lock();
            match core::mem::replace(&mut *state, ScopeState::Disposed) {
                ScopeState::Open { entries, .. } => entries,
                ScopeState::Disposed => return false,
            }
        };

        tracing::trace!(entries = entries.len(), "scope disposed");

        for (_, item) in entries.into_iter().rev() {
            item.dispose();
        }

        self.detach_from_parent();
        true
    }

    /// Returns whether the scope has been disposed.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        matches!(*self.inner.state.lock(), ScopeState::Disposed)
    }

    /// Returns the number of items currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        match &*self.inner.state.lock() {
            ScopeState::Open { entries, .. } => entries.len(),
            ScopeState::Disposed => 0,
        }
    }

    /// Returns `true` if the scope holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if both handles refer to the same scope.
    #[must_use]
    pub fn same_scope(&self, other: &Scope) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn detach_from_parent(&self) {
        let Some((parent, key)) = &self.inner.parent else {
            return;
        };
        let Some(parent) = parent.upgrade() else {
            return;
        };

        // The removed entry is our own handle; drop it after releasing the lock.
        let removed = {
            let mut state = parent.state.lock();
            match &mut *state {
                ScopeState::Open { entries, .. } => entries
                    .iter()
                    .position(|(k, _)| k == key)
                    .map(|index| entries.remove(index)),
                ScopeState::Disposed => None,
            }
        };
        drop(removed);
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("disposed", &self.is_disposed())
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, impl Fn() -> Box<dyn FnOnce() + Send>) {
        let count = Arc::new(AtomicUsize::new(0));
        let handle = Arc::clone(&count);
        let make = move || {
            let handle = Arc::clone(&handle);
            Box::new(move || {
                handle.fetch_add(1, Ordering::SeqCst);
            }) as Box<dyn FnOnce() + Send>
        };
        (count, make)
    }

    #[test]
    fn dispose_runs_every_cleanup_once() {
        let (count, make) = counter();
        let scope = Scope::new();
        scope.defer(make());
        scope.defer(make());
        scope.defer(make());

        assert_eq!(scope.len(), 3);
        assert!(scope.dispose());
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert!(scope.is_empty());
    }

    #[test]
    fn second_dispose_is_a_noop() {
        let (count, make) = counter();
        let scope = Scope::new();
        scope.defer(make());

        assert!(scope.dispose());
        assert!(!scope.dispose());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cleanups_run_newest_first() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let scope = Scope::new();
        for i in 0..3 {
            let order = Arc::clone(&order);
            scope.defer(move || order.lock().push(i));
        }
        scope.dispose();
        assert_eq!(*order.lock(), vec![2, 1, 0]);
    }

    #[test]
    fn add_after_dispose_releases_immediately() {
        let (count, make) = counter();
        let scope = Scope::new();
        scope.dispose();

        assert!(!scope.defer(make()));
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(scope.is_empty());
    }

    #[test]
    fn disposing_parent_disposes_children() {
        let (count, make) = counter();
        let root = Scope::new();
        let child = root.child();
        let grandchild = child.child();
        grandchild.defer(make());
        child.defer(make());

        root.dispose();
        assert!(child.is_disposed());
        assert!(grandchild.is_disposed());
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn disposed_child_detaches_from_parent() {
        let root = Scope::new();
        let child = root.child();
        assert_eq!(root.len(), 1);

        assert!(child.dispose());
        assert_eq!(root.len(), 0);
        assert!(!root.is_disposed());
    }

    #[test]
    fn child_of_disposed_scope_is_disposed() {
        let root = Scope::new();
        root.dispose();
        let child = root.child();
        assert!(child.is_disposed());
    }

    #[test]
    fn cleanup_may_dispose_its_own_scope() {
        let scope = Scope::new();
        let reentrant = scope.clone();
        scope.defer(move || {
            assert!(!reentrant.dispose());
        });
        assert!(scope.dispose());
    }

    #[test]
    fn clones_share_state() {
        let scope = Scope::new();
        let other = scope.clone();
        assert!(scope.same_scope(&other));
        other.dispose();
        assert!(scope.is_disposed());
    }
}
