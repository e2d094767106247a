//! Event bus for session observers
//!
//! Two ways to listen: synchronous callbacks, invoked in publish order on
//! the publishing thread, and Tokio broadcast receivers for async hosts.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;
use tracing::debug;

use super::types::SessionEvent;

/// Channel capacity for broadcast
const CHANNEL_CAPACITY: usize = 256;

/// Handle returned by `subscribe`, used to unsubscribe
pub type SubscriptionId = u64;

/// Shared reference to EventBus
pub type SharedEventBus = Arc<EventBus>;

type Callback = Arc<dyn Fn(&SessionEvent) + Send + Sync>;

/// Fan-out of session events to callbacks and broadcast receivers
pub struct EventBus {
    sender: broadcast::Sender<SessionEvent>,
    callbacks: Mutex<Vec<(SubscriptionId, Callback)>>,
    next_id: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            sender,
            callbacks: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Create a shared reference to this event bus
    pub fn shared(self) -> SharedEventBus {
        Arc::new(self)
    }

    /// Deliver an event to every callback, then to channel receivers.
    pub fn publish(&self, event: &SessionEvent) {
        let callbacks: Vec<Callback> = self
            .callbacks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect();

        for callback in &callbacks {
            callback(event);
        }

        // No receivers is fine
        let receivers = self.sender.send(event.clone()).unwrap_or(0);
        debug!(
            event_type = event.event_type(),
            sequence = event.sequence,
            callbacks = callbacks.len(),
            receivers,
            "Session event published"
        );
    }

    /// Register a callback for every subsequent event.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&SessionEvent) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.callbacks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((id, Arc::new(callback)));
        id
    }

    /// Register a callback that only sees events passing `filter`.
    pub fn subscribe_filtered<F>(&self, filter: EventFilter, callback: F) -> SubscriptionId
    where
        F: Fn(&SessionEvent) + Send + Sync + 'static,
    {
        self.subscribe(move |event| {
            if filter.matches(event) {
                callback(event);
            }
        })
    }

    /// Remove a callback. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut callbacks = self.callbacks.lock().unwrap_or_else(|e| e.into_inner());
        let before = callbacks.len();
        callbacks.retain(|(existing, _)| *existing != id);
        callbacks.len() != before
    }

    /// Async receiver of every subsequent event.
    pub fn subscribe_channel(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    /// Callbacks plus live channel receivers
    pub fn subscriber_count(&self) -> usize {
        self.callbacks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
            + self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Event filter for selective subscription
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Only these event types (matches all when `None`)
    pub event_types: Option<Vec<String>>,
}

impl EventFilter {
    /// Create a new empty filter (matches all events)
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by event types
    pub fn types(mut self, event_types: Vec<&str>) -> Self {
        self.event_types = Some(event_types.into_iter().map(String::from).collect());
        self
    }

    /// Only phase changes (negotiation started, matched, ended)
    pub fn phase_changes() -> Self {
        Self::new().types(vec!["negotiation_started", "matched", "ended"])
    }

    /// Check if an event matches this filter
    pub fn matches(&self, event: &SessionEvent) -> bool {
        match &self.event_types {
            Some(types) => types.iter().any(|t| t == event.event_type()),
            None => true,
        }
    }
}
