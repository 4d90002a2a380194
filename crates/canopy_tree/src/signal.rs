//! Multi-listener event sources.
//!
//! A [`Signal`] fans a value out to every connected handler. Connecting
//! returns a [`Connection`], which disconnects the handler when
//! [`disconnect`](Connection::disconnect)ed or dropped.
//!
//! # Dispatch Semantics
//!
//! `fire` snapshots the handler list, releases the lock, then invokes each
//! handler in connection order. Before every invocation the handler's slot
//! is checked again, so a handler disconnected by an earlier handler in the
//! same pass is never called. Handlers may connect, disconnect, and fire
//! other signals (or this one) re-entrantly.

use core::fmt;
use core::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use canopy_scope::Disposable;
use parking_lot::Mutex;

type Handler<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Slots<T> {
    next_id: u64,
    handlers: Vec<(u64, Handler<T>)>,
}

struct SignalInner<T> {
    slots: Mutex<Slots<T>>,
    deliveries: AtomicUsize,
}

/// Removal side of a signal, erased over the payload type.
trait Detach: Send + Sync {
    fn detach(&self, id: u64);
    fn contains(&self, id: u64) -> bool;
}

impl<T: 'static> Detach for SignalInner<T> {
    fn detach(&self, id: u64) {
        // Drop the handler outside the lock; it may own other connections.
        let removed = {
            let mut slots = self.slots.lock();
            slots
                .handlers
                .iter()
                .position(|(slot, _)| *slot == id)
                .map(|index| slots.handlers.remove(index))
        };
        drop(removed);
    }

    fn contains(&self, id: u64) -> bool {
        self.slots.lock().handlers.iter().any(|(slot, _)| *slot == id)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Signal
// ─────────────────────────────────────────────────────────────────────────────

/// A multi-listener event source carrying values of type `T`.
///
/// Cloning a signal yields another handle onto the same listener list.
pub struct Signal<T> {
    inner: Arc<SignalInner<T>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: 'static> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> Signal<T> {
    /// Creates a signal with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SignalInner {
                slots: Mutex::new(Slots {
                    next_id: 0,
                    handlers: Vec::new(),
                }),
                deliveries: AtomicUsize::new(0),
            }),
        }
    }

    /// Connects a handler, returning the connection that controls it.
    #[must_use = "dropping the connection disconnects the handler"]
    pub fn connect(&self, handler: impl Fn(&T) + Send + Sync + 'static) -> Connection {
        let id = {
            let mut slots = self.inner.slots.lock();
            let id = slots.next_id;
            slots.next_id += 1;
            slots.handlers.push((id, Arc::new(handler)));
            id
        };

        let signal: Arc<dyn Detach> = self.inner.clone();
        Connection {
            signal: Some(Arc::downgrade(&signal)),
            id,
        }
    }

    /// Delivers `value` to every connected handler.
    pub fn fire(&self, value: &T) {
        let snapshot: Vec<(u64, Handler<T>)> = self.inner.slots.lock().handlers.clone();

        for (id, handler) in snapshot {
            if !self.inner.contains(id) {
                continue;
            }
            self.inner.deliveries.fetch_add(1, Ordering::SeqCst);
            handler(value);
        }
    }

    /// Returns the number of connected handlers.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.slots.lock().handlers.len()
    }

    /// Returns the total number of handler invocations made so far.
    #[must_use]
    pub fn deliveries(&self) -> usize {
        self.inner.deliveries.load(Ordering::SeqCst)
    }
}

impl<T: 'static> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("listeners", &self.listener_count())
            .field("deliveries", &self.deliveries())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Connection
// ─────────────────────────────────────────────────────────────────────────────

/// Handle to a connected signal handler.
///
/// The handler stays connected for as long as the `Connection` lives.
/// Dropping it, calling [`disconnect`](Self::disconnect), or disposing it
/// through a [`Scope`](canopy_scope::Scope) removes the handler.
pub struct Connection {
    signal: Option<Weak<dyn Detach>>,
    id: u64,
}

impl Connection {
    /// A connection that was never attached to anything.
    #[must_use]
    pub fn detached() -> Self {
        Self {
            signal: None,
            id: 0,
        }
    }

    /// Returns whether the handler is still connected.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.signal
            .as_ref()
            .and_then(Weak::upgrade)
            .is_some_and(|signal| signal.contains(self.id))
    }

    /// Disconnects the handler. Disconnecting twice is harmless.
    pub fn disconnect(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(signal) = self.signal.take().and_then(|weak| weak.upgrade()) {
            signal.detach(self.id);
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.release();
    }
}

impl Disposable for Connection {
    fn dispose(self: Box<Self>) {
        self.disconnect();
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("connected", &self.is_connected())
            .finish()
    }
}
