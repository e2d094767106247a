//! Per-room message bus
//!
//! The session's transcript stays the authoritative order; the bus only
//! delivers. Each room stamps envelopes with its own sequence so receivers
//! can detect gaps.
//!
//! ```text
//! SessionHandle ──channel──▶ SessionRelay ──publish──▶ RoomBus ──▶ subscribers
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use talk_core::{EventKind, SessionEvent, SessionHandle, WeakSessionHandle};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const ROOM_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Error)]
pub enum BusError {
    #[error("Room closed: {0}")]
    RoomClosed(String),

    #[error("Subscriber lagged, {0} envelopes skipped")]
    Lagged(u64),

    #[error("Publish failed: {0}")]
    PublishFailed(String),
}

/// A session event as delivered to one room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomEnvelope {
    pub room_id: String,
    /// Per-room, starts at 1
    pub sequence: u64,
    pub event: SessionEvent,
}

/// Receiving end of a room subscription
pub struct RoomSubscription {
    room_id: String,
    rx: broadcast::Receiver<RoomEnvelope>,
}

impl RoomSubscription {
    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub async fn recv(&mut self) -> Result<RoomEnvelope, BusError> {
        self.rx.recv().await.map_err(|e| match e {
            broadcast::error::RecvError::Closed => BusError::RoomClosed(self.room_id.clone()),
            broadcast::error::RecvError::Lagged(n) => BusError::Lagged(n),
        })
    }
}

#[async_trait]
pub trait RoomBus: Send + Sync {
    /// Publish to a room, returning the envelope as sequenced.
    async fn publish(&self, room_id: &str, event: SessionEvent) -> Result<RoomEnvelope, BusError>;

    /// Receive everything published to `room_id` from now on.
    fn subscribe(&self, room_id: &str) -> RoomSubscription;

    /// Drop a room. Subscribers drain what was already delivered, then
    /// see `RoomClosed`.
    fn close_room(&self, room_id: &str) -> bool;
}

struct Room {
    sender: broadcast::Sender<RoomEnvelope>,
    next_sequence: u64,
}

impl Room {
    fn new() -> Self {
        let (sender, _) = broadcast::channel(ROOM_CHANNEL_CAPACITY);
        Self {
            sender,
            next_sequence: 1,
        }
    }
}

/// Bus for a single process: one broadcast channel per room
#[derive(Default)]
pub struct InProcessRoomBus {
    rooms: Mutex<HashMap<String, Room>>,
}

impl InProcessRoomBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait]
impl RoomBus for InProcessRoomBus {
    async fn publish(&self, room_id: &str, event: SessionEvent) -> Result<RoomEnvelope, BusError> {
        // Sequence and send under one lock so per-room order holds.
        let mut rooms = self.rooms.lock().unwrap_or_else(|e| e.into_inner());
        let room = rooms.entry(room_id.to_string()).or_insert_with(Room::new);

        let envelope = RoomEnvelope {
            room_id: room_id.to_string(),
            sequence: room.next_sequence,
            event,
        };
        room.next_sequence += 1;

        // No receivers is fine; the envelope is still sequenced.
        let _ = room.sender.send(envelope.clone());
        debug!(room_id, sequence = envelope.sequence, event_type = envelope.event.event_type(), "Room envelope published");
        Ok(envelope)
    }

    fn subscribe(&self, room_id: &str) -> RoomSubscription {
        let mut rooms = self.rooms.lock().unwrap_or_else(|e| e.into_inner());
        let room = rooms.entry(room_id.to_string()).or_insert_with(Room::new);
        RoomSubscription {
            room_id: room_id.to_string(),
            rx: room.sender.subscribe(),
        }
    }

    fn close_room(&self, room_id: &str) -> bool {
        self.rooms
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(room_id)
            .is_some()
    }
}

/// Forwards one session's events into a room.
pub struct SessionRelay {
    room_id: String,
    bus: Arc<dyn RoomBus>,
}

impl SessionRelay {
    pub fn new(room_id: impl Into<String>, bus: Arc<dyn RoomBus>) -> Self {
        Self {
            room_id: room_id.into(),
            bus,
        }
    }

    /// Start forwarding. The task ends after the session's `ended` event
    /// or when the session is dropped, closes the room, and returns how
    /// many events it sent.
    ///
    /// If the relay falls behind the session channel, the missed events are
    /// replayed from the session's journal, so the room still sees every
    /// event once and in order.
    pub fn spawn(self, handle: &SessionHandle) -> JoinHandle<usize> {
        let (rx, last_sequence) = handle.subscribe_channel_at();
        tokio::spawn(self.run(handle.downgrade(), rx, last_sequence))
    }

    async fn run(
        self,
        session: WeakSessionHandle,
        mut rx: broadcast::Receiver<SessionEvent>,
        mut last_sequence: u64,
    ) -> usize {
        let mut forwarded = 0;
        'relay: loop {
            let batch = match rx.recv().await {
                Ok(event) => vec![event],
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(room_id = %self.room_id, skipped = n, "Relay lagged, replaying from journal");
                    match session.upgrade() {
                        Some(handle) => handle.events_since(last_sequence),
                        None => continue,
                    }
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };

            for event in batch {
                // Already sent during a replay
                if event.sequence <= last_sequence {
                    continue;
                }
                last_sequence = event.sequence;

                let done = matches!(event.kind, EventKind::Ended { .. });
                match self.bus.publish(&self.room_id, event).await {
                    Ok(_) => forwarded += 1,
                    Err(e) => warn!(room_id = %self.room_id, error = %e, "Relay publish failed"),
                }
                if done {
                    break 'relay;
                }
            }
        }

        self.bus.close_room(&self.room_id);
        debug!(room_id = %self.room_id, forwarded, "Relay finished");
        forwarded
    }
}
