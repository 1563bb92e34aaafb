//! Per-session publish/subscribe fan-out for Livequiz.
//!
//! Every running session owns one [`Broadcaster`]. Each connected viewer
//! subscribes and gets a [`Listener`]; the session publishes a short event
//! string after every state change and each listener receives a copy.
//!
//! # Delivery
//!
//! Each listener has its own bounded channel. Publishing never waits on a
//! listener: if a listener's channel is full the event is dropped for that
//! listener only. Viewers re-fetch the full session state on every event,
//! so a missed event is repaired by the next one.
//!
//! # Locking
//!
//! ```text
//! subscribe / unsubscribe ──lock──▶ registry ◀──lock── publish (snapshot only)
//!                                                        │
//!                                            unlock, then try_send to each
//! ```
//!
//! The registry lock is never held while delivering, so a stalled viewer
//! can't block new subscriptions or other publishes.

mod listener;

pub use listener::{Listener, ListenerId};

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Default per-listener channel capacity.
pub const DEFAULT_LISTENER_CAPACITY: usize = 16;

/// Fans events out to every subscribed listener of one session.
///
/// Cheap to clone; clones share the same registry.
#[derive(Clone)]
pub struct Broadcaster {
    inner: Arc<Inner>,
}

pub(crate) struct Inner {
    /// Used only for log fields (the session code).
    topic: String,
    capacity: usize,
    next_id: AtomicU64,
    registry: Mutex<Registry>,
}

struct Registry {
    listeners: HashMap<ListenerId, mpsc::Sender<String>>,
    closed: bool,
}

impl Broadcaster {
    /// Creates a broadcaster whose listeners each buffer up to `capacity`
    /// undelivered events. A capacity of 0 is treated as 1.
    pub fn new(topic: impl Into<String>, capacity: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                topic: topic.into(),
                capacity: capacity.max(1),
                next_id: AtomicU64::new(1),
                registry: Mutex::new(Registry {
                    listeners: HashMap::new(),
                    closed: false,
                }),
            }),
        }
    }

    /// Registers a new listener.
    ///
    /// The returned [`Listener`] unsubscribes itself when dropped. After
    /// [`close`](Self::close) the listener is born closed: its `recv`
    /// returns `None` immediately.
    pub fn subscribe(&self) -> Listener {
        let id = ListenerId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::channel(self.inner.capacity);

        let mut registry = self.inner.registry.lock();
        if !registry.closed {
            registry.listeners.insert(id, tx);
            tracing::debug!(
                topic = %self.inner.topic,
                listener = %id,
                listeners = registry.listeners.len(),
                "listener subscribed"
            );
        }
        drop(registry);

        Listener::new(id, rx, Arc::downgrade(&self.inner))
    }

    /// Deregisters a listener. Returns `false` if it was already gone;
    /// that is not an error.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.inner.remove(id)
    }

    /// Delivers `event` to every currently subscribed listener.
    ///
    /// Returns how many listeners accepted the event. Listeners whose
    /// channel is full miss this event; listeners whose receiver is gone
    /// are pruned.
    pub fn publish(&self, event: &str) -> usize {
        let targets: Vec<(ListenerId, mpsc::Sender<String>)> = {
            let registry = self.inner.registry.lock();
            registry
                .listeners
                .iter()
                .map(|(id, tx)| (*id, tx.clone()))
                .collect()
        };

        let mut delivered = 0;
        let mut dead = Vec::new();
        for (id, tx) in targets {
            match tx.try_send(event.to_owned()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    tracing::debug!(
                        topic = %self.inner.topic,
                        listener = %id,
                        event,
                        "listener lagging, event dropped"
                    );
                }
                Err(TrySendError::Closed(_)) => dead.push(id),
            }
        }

        if !dead.is_empty() {
            let mut registry = self.inner.registry.lock();
            for id in dead {
                registry.listeners.remove(&id);
            }
        }

        tracing::trace!(topic = %self.inner.topic, event, delivered, "event published");
        delivered
    }

    /// Drops every listener's sender so their `recv` returns `None`, and
    /// refuses new subscriptions. Used when the session is torn down.
    pub fn close(&self) {
        let mut registry = self.inner.registry.lock();
        registry.closed = true;
        let dropped = registry.listeners.len();
        registry.listeners.clear();
        tracing::debug!(topic = %self.inner.topic, dropped, "broadcaster closed");
    }

    /// Number of currently subscribed listeners.
    pub fn listener_count(&self) -> usize {
        self.inner.registry.lock().listeners.len()
    }

    pub fn topic(&self) -> &str {
        &self.inner.topic
    }
}

impl std::fmt::Debug for Broadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broadcaster")
            .field("topic", &self.inner.topic)
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl Inner {
    pub(crate) fn remove(&self, id: ListenerId) -> bool {
        let removed = self.registry.lock().listeners.remove(&id).is_some();
        if removed {
            tracing::debug!(topic = %self.topic, listener = %id, "listener unsubscribed");
        }
        removed
    }
}
