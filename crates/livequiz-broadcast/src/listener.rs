//! Listener handles: one per connected viewer.

use std::fmt;
use std::sync::Weak;

use tokio::sync::mpsc;

use crate::Inner;

/// Identifies one listener within its broadcaster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L-{}", self.0)
    }
}

/// A subscription to a [`Broadcaster`](crate::Broadcaster).
///
/// Dropping the listener unsubscribes it. Because `Drop` runs on every
/// exit path (early return, `?`, panic unwinding, task cancellation) a
/// viewer's registration can't outlive its connection handler.
///
/// Holds only a weak reference to the broadcaster: a listener never keeps
/// a torn-down session alive.
pub struct Listener {
    id: ListenerId,
    rx: mpsc::Receiver<String>,
    broadcaster: Weak<Inner>,
}

impl Listener {
    pub(crate) fn new(id: ListenerId, rx: mpsc::Receiver<String>, broadcaster: Weak<Inner>) -> Self {
        Self {
            id,
            rx,
            broadcaster,
        }
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Waits for the next event. Returns `None` once the broadcaster is
    /// closed or dropped and every buffered event has been read.
    ///
    /// Cancel-safe, so it can sit in a `tokio::select!` branch.
    pub async fn recv(&mut self) -> Option<String> {
        self.rx.recv().await
    }

    /// Returns a buffered event without waiting.
    pub fn try_recv(&mut self) -> Option<String> {
        self.rx.try_recv().ok()
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        if let Some(inner) = self.broadcaster.upgrade() {
            inner.remove(self.id);
        }
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener").field("id", &self.id).finish_non_exhaustive()
    }
}
