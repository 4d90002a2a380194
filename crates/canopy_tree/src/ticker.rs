//! Scheduler tick sources.
//!
//! Plain [`Table`](crate::Table)s cannot announce changes, so resolvers poll
//! them once per tick. The tick source is injected through the [`Ticker`]
//! trait:
//!
//! - [`ManualTicker`] - ticks only when told to; deterministic tests
//! - [`Heartbeat`] - ticks on a `tokio` interval, started lazily

use core::time::Duration;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

use crate::signal::{Connection, Signal};
use crate::tree::NotifyHandler;

/// A source of scheduler ticks.
pub trait Ticker: Send + Sync + 'static {
    /// Subscribes to ticks.
    fn on_tick(&self, handler: NotifyHandler) -> Connection;
}

// ─────────────────────────────────────────────────────────────────────────────
// ManualTicker
// ─────────────────────────────────────────────────────────────────────────────

/// A ticker driven by explicit [`tick`](Self::tick) calls.
///
/// # Example
///
/// ```
/// use canopy_tree::{ManualTicker, Ticker};
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// let ticker = ManualTicker::new();
/// let ticks = Arc::new(AtomicUsize::new(0));
/// let seen = Arc::clone(&ticks);
/// let _conn = ticker.on_tick(Box::new(move || {
///     seen.fetch_add(1, Ordering::SeqCst);
/// }));
///
/// ticker.tick();
/// ticker.tick();
/// assert_eq!(ticks.load(Ordering::SeqCst), 2);
/// ```
#[derive(Clone, Debug, Default)]
pub struct ManualTicker {
    signal: Signal<()>,
}

impl ManualTicker {
    /// Creates a ticker with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers one tick to every subscriber.
    pub fn tick(&self) {
        self.signal.fire(&());
    }

    /// Delivers `n` ticks.
    pub fn advance(&self, n: usize) {
        for _ in 0..n {
            self.tick();
        }
    }

    /// Returns the number of subscribers.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.signal.listener_count()
    }
}

impl Ticker for ManualTicker {
    fn on_tick(&self, handler: NotifyHandler) -> Connection {
        self.signal.connect(move |_: &()| handler())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Heartbeat
// ─────────────────────────────────────────────────────────────────────────────

/// A ticker driven by a `tokio` interval.
///
/// The interval task is spawned on the first subscription, on whatever
/// runtime is current at that moment, and aborted when the heartbeat is
/// dropped. It parks itself on the first tick that finds no subscribers and
/// is spawned again by the next subscription. Without a current runtime the heartbeat stays idle and logs a
/// warning; subscribers then never receive ticks.
#[derive(Debug)]
pub struct Heartbeat {
    period: Duration,
    signal: Signal<()>,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl Heartbeat {
    /// Default tick period (60 Hz).
    pub const DEFAULT_PERIOD: Duration = Duration::from_micros(16_667);

    /// Creates an idle heartbeat ticking every `period` once subscribed.
    #[must_use]
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            signal: Signal::new(),
            task: Arc::new(Mutex::new(None)),
        }
    }

    /// Creates a shareable heartbeat.
    #[must_use]
    pub fn shared(period: Duration) -> Arc<Self> {
        Arc::new(Self::new(period))
    }

    /// Returns the tick period.
    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Returns whether the interval task is currently running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task.lock().is_some()
    }

    fn ensure_started(&self) {
        let mut task = self.task.lock();
        if task.is_some() {
            return;
        }

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(
                period = ?self.period,
                "heartbeat subscribed outside a tokio runtime; ticks will not be delivered"
            );
            return;
        };

        let signal = self.signal.clone();
        let slot = Arc::clone(&self.task);
        let period = self.period;
        *task = Some(handle.spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                signal.fire(&());

                if signal.listener_count() == 0 {
                    // Re-checked under the slot lock so a concurrent subscriber
                    // either keeps this task alive or spawns a fresh one.
                    let mut task = slot.lock();
                    if signal.listener_count() == 0 {
                        *task = None;
                        tracing::debug!(period = ?period, "heartbeat parked");
                        return;
                    }
                }
            }
        }));
        tracing::debug!(period = ?period, "heartbeat started");
    }
}

impl Default for Heartbeat {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PERIOD)
    }
}

impl Ticker for Heartbeat {
    fn on_tick(&self, handler: NotifyHandler) -> Connection {
        let connection = self.signal.connect(move |_: &()| handler());
        self.ensure_started();
        connection
    }
}

impl Drop for Heartbeat {
    fn drop(&mut self) {
        if let Some(task) = self.task.lock().take() {
            task.abort();
        }
    }
}
