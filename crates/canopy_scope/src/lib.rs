//! Disposable resource scopes (Layer 1).
//!
//! A [`Scope`] is a bag of cleanup actions. Everything a long-running
//! operation acquires (event connections, nested scopes, deferred closures)
//! is registered on a scope, and a single call to [`Scope::dispose`] releases
//! all of it.
//!
//! # Guarantees
//!
//! - Disposal is idempotent: only the first call releases anything.
//! - Disposal cascades into nested scopes created with [`Scope::child`].
//! - Disposal is irreversible: anything registered on a disposed scope is
//!   released immediately instead of being stored.
//! - Cleanups run outside the scope's internal lock, so a cleanup may freely
//!   touch other scopes (or even the one being disposed).
//!
//! # Example
//!
//! ```
//! use canopy_scope::Scope;
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! let released = Arc::new(AtomicUsize::new(0));
//! let scope = Scope::new();
//!
//! let counter = Arc::clone(&released);
//! scope.defer(move || {
//!     counter.fetch_add(1, Ordering::SeqCst);
//! });
//!
//! let step = scope.child();
//! let counter = Arc::clone(&released);
//! step.defer(move || {
//!     counter.fetch_add(1, Ordering::SeqCst);
//! });
//!
//! assert!(scope.dispose());
//! assert!(!scope.dispose());
//! assert!(step.is_disposed());
//! assert_eq!(released.load(Ordering::SeqCst), 2);
//! ```

mod scope;

pub use scope::{Disposable, Scope};
