//! Change notifications emitted by the record store.
//!
//! Subscribers hold a [`Subscription`], which owns the receiving end of an
//! unbounded channel. Dropping it (or calling [`Subscription::unsubscribe`])
//! detaches it from the bus.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::entities::{EntityId, TokenId};
use crate::store::WriteOrigin;

/// A change observed in the record store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    /// The store finished loading; fired once.
    Ready,

    /// A record was updated.
    RecordUpdated {
        record_id: EntityId,
        /// Dotted paths of the fields that changed.
        changed_paths: Vec<String>,
        origin: WriteOrigin,
    },

    /// A placed token changed (e.g. renamed).
    TokenUpdated { token_id: TokenId },

    /// The visible set of tokens was replaced in bulk (scene change).
    ViewChanged,
}

impl ChangeEvent {
    /// Check if a record update touched `path`, a parent of it, or a child of it.
    pub fn touches(&self, path: &str) -> bool {
        match self {
            ChangeEvent::RecordUpdated { changed_paths, .. } => {
                changed_paths.iter().any(|changed| paths_overlap(changed, path))
            }
            _ => false,
        }
    }
}

fn paths_overlap(a: &str, b: &str) -> bool {
    let is_prefix = |short: &str, long: &str| {
        long.starts_with(short) && long[short.len()..].starts_with('.')
    };
    a == b || is_prefix(a, b) || is_prefix(b, a)
}

#[derive(Debug, Default)]
struct BusInner {
    next_id: u64,
    senders: HashMap<u64, UnboundedSender<ChangeEvent>>,
}

/// Fan-out of change events to every live subscription.
#[derive(Debug, Clone, Default)]
pub struct ChangeBus {
    inner: Arc<Mutex<BusInner>>,
}

impl ChangeBus {
    /// Create a bus with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a new subscriber.
    pub fn subscribe(&self) -> Subscription {
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let id = inner.next_id;
        inner.next_id += 1;
        inner.senders.insert(id, sender);

        Subscription {
            id,
            receiver,
            bus: Arc::downgrade(&self.inner),
        }
    }

    /// Deliver an event to every subscriber. Closed subscribers are pruned.
    pub fn publish(&self, event: ChangeEvent) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner
            .senders
            .retain(|_, sender| sender.send(event.clone()).is_ok());
    }

    /// Get the number of attached subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .senders
            .len()
    }
}

/// A live attachment to a [`ChangeBus`].
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    receiver: UnboundedReceiver<ChangeEvent>,
    bus: Weak<Mutex<BusInner>>,
}

impl Subscription {
    /// Wait for the next event. Returns `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        self.receiver.recv().await
    }

    /// Take the next event if one is already queued.
    pub fn try_recv(&mut self) -> Option<ChangeEvent> {
        self.receiver.try_recv().ok()
    }

    /// Detach from the bus. Events already queued are discarded.
    pub fn unsubscribe(self) {
        // Detaching happens in Drop.
    }

    fn detach(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .senders
                .remove(&self.id);
        }
        self.receiver.close();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach();
    }
}
