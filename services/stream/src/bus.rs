//! Synchronous publish/subscribe topics
//!
//! The bus contract is small: `subscribe`, `unsubscribe`, `emit`. Emit
//! snapshots the subscriber list, so subscribing or unsubscribing from
//! inside a delivery never crashes (or deadlocks) the emit. A failing
//! subscriber is logged and skipped; the remaining subscribers still receive
//! the event and the emit succeeds from the producer's point of view.
//!
//! Each topic keeps an unbounded in-memory history of emitted payloads for
//! test introspection; a durable queue takes that role in larger
//! deployments.

use crate::events::{ErrorOrderPayload, ValidOrderPayload};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use tracing::{debug, error};

/// Error type subscribers may surface; it is logged, never propagated.
pub type SinkError = Box<dyn std::error::Error + Send + Sync>;

/// Handle for removing a subscriber from a topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback<E> = Arc<dyn Fn(&E) -> Result<(), SinkError> + Send + Sync>;

/// One event kind with its subscribers and emission history.
pub struct Topic<E> {
    label: &'static str,
    next_id: AtomicU64,
    subscribers: RwLock<Vec<(SubscriptionId, Callback<E>)>>,
    history: Mutex<Vec<E>>,
    // Serializes concurrent emits so no event overtakes an earlier one for
    // the same subscriber. Subscribers must not emit back into their own
    // topic.
    emit_serial: Mutex<()>,
}

impl<E: Clone> Topic<E> {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            next_id: AtomicU64::new(1),
            subscribers: RwLock::new(Vec::new()),
            history: Mutex::new(Vec::new()),
            emit_serial: Mutex::new(()),
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Register a subscriber. Deliveries arrive in subscription order,
    /// serialized per subscriber, in emit order.
    pub fn subscribe(
        &self,
        callback: impl Fn(&E) -> Result<(), SinkError> + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((id, Arc::new(callback)));
        id
    }

    /// Remove a subscriber. Returns false when the id is not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self
            .subscribers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let before = subscribers.len();
        subscribers.retain(|(sub_id, _)| *sub_id != id);
        subscribers.len() != before
    }

    /// Deliver a payload to every current subscriber, in subscription order.
    pub fn emit(&self, payload: E) {
        let _serial = self
            .emit_serial
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        // Snapshot so subscribe/unsubscribe during delivery cannot interfere.
        let snapshot: Vec<(SubscriptionId, Callback<E>)> = self
            .subscribers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();

        self.history
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(payload.clone());

        debug!(
            topic = self.label,
            subscribers = snapshot.len(),
            "emitting event"
        );

        for (id, callback) in snapshot {
            if let Err(err) = callback(&payload) {
                error!(
                    topic = self.label,
                    subscription = id.0,
                    error = %err,
                    "subscriber failed; continuing fan-out"
                );
            }
        }
    }

    /// All payloads emitted on this topic so far.
    pub fn history(&self) -> Vec<E> {
        self.history
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn history_len(&self) -> usize {
        self.history
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

/// The two feed topics, multiplexed behind one handle.
pub struct StreamBus {
    pub valid_orders: Topic<ValidOrderPayload>,
    pub error_orders: Topic<ErrorOrderPayload>,
}

impl StreamBus {
    pub fn new() -> Self {
        Self {
            valid_orders: Topic::new("VALID_ORDER"),
            error_orders: Topic::new("ERROR_ORDER"),
        }
    }
}

impl Default for StreamBus {
    fn default() -> Self {
        Self::new()
    }
}
