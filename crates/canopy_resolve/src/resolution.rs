//! The resolution future and its producer handle.
//!
//! A [`Resolution`] is the consumer side of an in-flight lookup; a
//! [`Completer`] is the producer side, held by whatever event handlers drive
//! the lookup. Both share one [`Scope`] which owns every subscription the
//! lookup creates.
//!
//! # Lifecycle
//!
//! ```text
//!             resolve(v)            ┌──────────┐
//!          ┌───────────────────────▶│ Resolved │
//!          │                        └──────────┘
//! ┌─────────┐  reject(e) / timer    ┌──────────┐
//! │ Pending │──────────────────────▶│ Rejected │
//! └─────────┘                       └──────────┘
//!          │  cancel() / drop       ┌───────────┐
//!          └───────────────────────▶│ Cancelled │
//!                                   └───────────┘
//! ```
//!
//! Every transition out of `Pending` disposes the scope, so no subscription
//! outlives the resolution's terminal state. The first transition wins;
//! later ones are ignored.
//!
//! # Timeouts
//!
//! A resolution created inside a tokio runtime races its deadline on a timer
//! task of its own, so it times out whether or not anyone is polling it. The
//! scope owns the task's abort handle and settling by any other route stops
//! it. Created outside a runtime, the deadline is only checked while the
//! resolution is polled from within one.

use core::fmt;
use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll, Waker};
use core::time::Duration;
use std::sync::Arc;

use canopy_scope::Scope;
use parking_lot::Mutex;
use tokio::time::{Instant, Sleep};

use crate::error::ResolveError;

// ─────────────────────────────────────────────────────────────────────────────
// ResolutionId
// ─────────────────────────────────────────────────────────────────────────────

/// Unique identifier of a resolution, used to correlate log lines.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolutionId(Arc<str>);

impl ResolutionId {
    /// Creates a new identifier with a unique nanoid.
    #[must_use]
    pub fn new() -> Self {
        Self(nanoid::nanoid!(10).into())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ResolutionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ResolutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "res_{}", self.0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Status
// ─────────────────────────────────────────────────────────────────────────────

/// Observable state of a [`Resolution`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Not settled yet.
    Pending,
    /// Settled with a value.
    Resolved,
    /// Settled with an error other than cancellation.
    Rejected,
    /// Cancelled before settling.
    Cancelled,
}

enum Slot<T> {
    Pending(Option<Waker>),
    Settled(Result<T, ResolveError>),
    Taken(Status),
}

fn status_of<T>(result: &Result<T, ResolveError>) -> Status {
    match result {
        Ok(_) => Status::Resolved,
        Err(ResolveError::Cancelled) => Status::Cancelled,
        Err(_) => Status::Rejected,
    }
}

/// Start and end of the wait currently racing the timer.
#[derive(Clone, Copy)]
struct Deadline {
    started: Instant,
    at: Instant,
}

struct Shared<T> {
    id: ResolutionId,
    target: String,
    slot: Mutex<Slot<T>>,
    timeout: Option<Duration>,
    deadline: Mutex<Option<Deadline>>,
}

impl<T> Shared<T> {
    /// Settles the slot if still pending. Returns whether this call settled it.
    fn settle(&self, scope: &Scope, result: Result<T, ResolveError>) -> bool {
        let waker = {
            let mut slot = self.slot.lock();
            let Slot::Pending(waker) = &mut *slot else {
                return false;
            };
            let waker = waker.take();
            *slot = Slot::Settled(result);
            waker
        };

        scope.dispose();
        if let Some(waker) = waker {
            waker.wake();
        }
        true
    }

    /// Settles with a timeout error for the wait that began at `started`.
    fn time_out(&self, scope: &Scope, started: Instant) -> bool {
        let elapsed = started.elapsed();
        let error = ResolveError::Timeout {
            target: self.target.clone(),
            timeout: self.timeout.unwrap_or(elapsed),
            elapsed,
        };
        let settled = self.settle(scope, Err(error));
        if settled {
            tracing::debug!(
                resolution = %self.id,
                target = %self.target,
                elapsed = ?elapsed,
                "resolution timed out"
            );
        }
        settled
    }

    fn status(&self) -> Status {
        match &*self.slot.lock() {
            Slot::Pending(_) => Status::Pending,
            Slot::Settled(result) => status_of(result),
            Slot::Taken(status) => *status,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Completer
// ─────────────────────────────────────────────────────────────────────────────

/// Producer side of a [`Resolution`].
///
/// Cloning a completer is cheap; all clones settle the same resolution.
pub struct Completer<T> {
    shared: Arc<Shared<T>>,
    scope: Scope,
}

impl<T> Clone for Completer<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            scope: self.scope.clone(),
        }
    }
}

impl<T> Completer<T> {
    /// Resolves with `value`. Returns `false` if already settled.
    pub fn resolve(&self, value: T) -> bool {
        let settled = self.shared.settle(&self.scope, Ok(value));
        if settled {
            tracing::trace!(resolution = %self.shared.id, "resolution resolved");
        }
        settled
    }

    /// Rejects with `error`. Returns `false` if already settled.
    pub fn reject(&self, error: ResolveError) -> bool {
        let message = error.to_string();
        let settled = self.shared.settle(&self.scope, Err(error));
        if settled {
            tracing::debug!(resolution = %self.shared.id, error = %message, "resolution rejected");
        }
        settled
    }

    /// Returns `true` while the resolution is unsettled.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.shared.status() == Status::Pending
    }

    /// The scope owning every subscription of this resolution.
    #[must_use]
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// The resolution's identifier.
    #[must_use]
    pub fn id(&self) -> &ResolutionId {
        &self.shared.id
    }

    /// Starts a fresh timeout window for a follow-up wait.
    ///
    /// Does nothing when the resolution has no timeout.
    pub fn restart_deadline(&self) {
        if let Some(timeout) = self.shared.timeout {
            let started = Instant::now();
            *self.shared.deadline.lock() = Some(Deadline {
                started,
                at: started + timeout,
            });
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Resolution
// ─────────────────────────────────────────────────────────────────────────────

/// A lookup that settles with a `T` or a [`ResolveError`].
///
/// `Resolution` is a [`Future`] and is [`Unpin`], so `&mut Resolution<T>`
/// can be awaited as well; this lets callers keep ownership while passing
/// it to combinators such as [`bulk`](crate::bulk).
///
/// Subscriptions are created eagerly when the resolution is created; a
/// resolution whose target already exists is settled before it is returned
/// and completes on its first poll.
///
/// Dropping a pending resolution cancels it.
pub struct Resolution<T> {
    shared: Arc<Shared<T>>,
    scope: Scope,
    /// Set when a timer task races the deadline; polling then never arms one.
    timer_task: bool,
    timer: Option<(Instant, Pin<Box<Sleep>>)>,
}

impl<T: Send + 'static> Resolution<T> {
    /// Creates a pending resolution and its completer.
    ///
    /// `target` names what is being waited for in timeout errors. When
    /// `timeout` is set the deadline starts now.
    #[must_use]
    pub fn pending(target: impl Into<String>, timeout: Option<Duration>) -> (Self, Completer<T>) {
        let deadline = timeout.map(|timeout| {
            let started = Instant::now();
            Deadline {
                started,
                at: started + timeout,
            }
        });

        let shared = Arc::new(Shared {
            id: ResolutionId::new(),
            target: target.into(),
            slot: Mutex::new(Slot::Pending(None)),
            timeout,
            deadline: Mutex::new(deadline),
        });
        let scope = Scope::new();

        let completer = Completer {
            shared: Arc::clone(&shared),
            scope: scope.clone(),
        };
        let timer_task = deadline.is_some() && spawn_timer(&shared, &scope);
        let resolution = Self {
            shared,
            scope,
            timer_task,
            timer: None,
        };
        (resolution, completer)
    }

    /// Creates an already-resolved resolution.
    #[must_use]
    pub fn resolved(value: T) -> Self {
        Self::settled(Ok(value))
    }

    /// Creates an already-rejected resolution.
    #[must_use]
    pub fn rejected(error: ResolveError) -> Self {
        Self::settled(Err(error))
    }

    fn settled(result: Result<T, ResolveError>) -> Self {
        let (resolution, completer) = Self::pending(String::new(), None);
        completer.shared.settle(&completer.scope, result);
        resolution
    }
}

/// Spawns the task that times `shared` out once its deadline passes.
///
/// Returns `false` when there is no runtime to spawn on.
fn spawn_timer<T: Send + 'static>(shared: &Arc<Shared<T>>, scope: &Scope) -> bool {
    let Ok(runtime) = tokio::runtime::Handle::try_current() else {
        return false;
    };

    let timed = Arc::clone(shared);
    let owner = scope.clone();
    let task = runtime.spawn(async move {
        // The deadline only moves forward, so re-read it after every wake.
        loop {
            let Some(deadline) = *timed.deadline.lock() else {
                return;
            };
            if Instant::now() >= deadline.at {
                timed.time_out(&owner, deadline.started);
                return;
            }
            tokio::time::sleep_until(deadline.at).await;
        }
    });

    let abort = task.abort_handle();
    scope.defer(move || abort.abort())
}

impl<T> Resolution<T> {
    /// The resolution's identifier.
    #[must_use]
    pub fn id(&self) -> &ResolutionId {
        &self.shared.id
    }

    /// Returns the current status.
    #[must_use]
    pub fn status(&self) -> Status {
        self.shared.status()
    }

    /// Returns `true` once the resolution has left [`Status::Pending`].
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.status() != Status::Pending
    }

    /// The scope owning this resolution's subscriptions.
    #[must_use]
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Cancels the resolution.
    ///
    /// Every subscription is torn down before this returns, so no handler
    /// registered by the lookup runs afterwards. Awaiting a cancelled
    /// resolution yields [`ResolveError::Cancelled`]. Returns `false` if the
    /// resolution had already settled.
    pub fn cancel(&self) -> bool {
        let cancelled = self.shared.settle(&self.scope, Err(ResolveError::Cancelled));
        if cancelled {
            tracing::debug!(
                resolution = %self.shared.id,
                target = %self.shared.target,
                "resolution cancelled"
            );
        }
        cancelled
    }

    fn take(&self) -> Option<Result<T, ResolveError>> {
        let mut slot = self.shared.slot.lock();
        match &*slot {
            Slot::Settled(result) => {
                let status = status_of(result);
                match core::mem::replace(&mut *slot, Slot::Taken(status)) {
                    Slot::Settled(result) => Some(result),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// Polls the lazily armed timer. Returns `true` if it has won the race.
    fn poll_timer(&mut self, cx: &mut Context<'_>) -> bool {
        if self.timer_task {
            return false;
        }
        let Some(deadline) = *self.shared.deadline.lock() else {
            return false;
        };
        if tokio::runtime::Handle::try_current().is_err() && self.timer.is_none() {
            // Outside a runtime there is no timer to race.
            return false;
        }

        match &mut self.timer {
            Some((armed, sleep)) => {
                if *armed != deadline.at {
                    sleep.as_mut().reset(deadline.at);
                    *armed = deadline.at;
                }
            }
            None => {
                self.timer = Some((deadline.at, Box::pin(tokio::time::sleep_until(deadline.at))));
            }
        }

        let Some((_, sleep)) = &mut self.timer else {
            return false;
        };
        if sleep.as_mut().poll(cx).is_pending() {
            return false;
        }

        self.shared.time_out(&self.scope, deadline.started);
        true
    }
}

impl<T> Future for Resolution<T> {
    type Output = Result<T, ResolveError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        let settled = {
            let mut slot = this.shared.slot.lock();
            match &mut *slot {
                Slot::Pending(waker) => {
                    if !waker.as_ref().is_some_and(|w| w.will_wake(cx.waker())) {
                        *waker = Some(cx.waker().clone());
                    }
                    false
                }
                Slot::Settled(_) => true,
                Slot::Taken(_) => panic!("`Resolution` polled after completion"),
            }
        };

        if settled || this.poll_timer(cx) {
            if let Some(result) = this.take() {
                return Poll::Ready(result);
            }
        }
        Poll::Pending
    }
}

impl<T> Unpin for Resolution<T> {}

impl<T> Drop for Resolution<T> {
    fn drop(&mut self) {
        if self.shared.status() == Status::Pending {
            self.cancel();
        }
        self.scope.dispose();
    }
}

impl<T> fmt::Debug for Resolution<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolution")
            .field("id", &self.shared.id)
            .field("target", &self.shared.target)
            .field("status", &self.status())
            .finish()
    }
}
