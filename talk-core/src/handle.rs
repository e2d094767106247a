//! Session handle, the host-facing API
//!
//! A cheap, cloneable handle around one `ChatSession` behind a mutex. All
//! calls (`send`, `tick`, `submit_decision`, `end_session`) go through the
//! same lock, so a ticker task and message handlers on other threads are
//! serialized into one writer.
//!
//! Events are published while the lock is held. Callbacks registered with
//! `subscribe` must not call back into the same handle; hand the event to
//! a channel or use `subscribe_channel` instead.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use tokio::sync::broadcast;

use crate::answers::{AnswerPool, Party};
use crate::config::SessionConfig;
use crate::error::SessionResult;
use crate::events::{EventBus, EventFilter, SessionEvent, SharedEventBus, SubscriptionId};
use crate::session::{
    save_snapshot, ChatSession, Decision, DecisionOutcome, SessionId, SessionPhase,
    SessionSnapshot, SessionStatus, TickOutcome,
};
use crate::transcript::Message;

/// Create a session with default reveal settings and the given timer length.
pub fn create_session(
    self_answers: AnswerPool,
    peer_answers: AnswerPool,
    active_duration_secs: u32,
) -> SessionResult<SessionHandle> {
    SessionHandle::with_config(
        SessionConfig::with_duration(active_duration_secs),
        self_answers,
        peer_answers,
    )
}

/// Thread-safe handle to a running session
#[derive(Clone)]
pub struct SessionHandle {
    id: SessionId,
    session: Arc<Mutex<ChatSession>>,
    bus: SharedEventBus,
}

impl SessionHandle {
    /// Wrap an existing session
    pub fn new(session: ChatSession) -> Self {
        Self {
            id: session.id(),
            session: Arc::new(Mutex::new(session)),
            bus: EventBus::new().shared(),
        }
    }

    pub fn with_config(
        config: SessionConfig,
        self_answers: AnswerPool,
        peer_answers: AnswerPool,
    ) -> SessionResult<Self> {
        Ok(Self::new(ChatSession::new(
            config,
            self_answers,
            peer_answers,
        )?))
    }

    /// Resume from a snapshot
    pub fn restore(snapshot: SessionSnapshot) -> SessionResult<Self> {
        Ok(Self::new(ChatSession::restore(snapshot)?))
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    // ── Operations ────────────────────────────────────────────────────

    pub fn send(&self, party: Party, text: impl Into<String>) -> SessionResult<Message> {
        self.apply(|s| s.send(party, text))
    }

    pub fn tick(&self) -> TickOutcome {
        self.apply(|s| s.tick())
    }

    pub fn submit_decision(
        &self,
        party: Party,
        decision: Decision,
    ) -> SessionResult<DecisionOutcome> {
        self.apply(|s| s.submit_decision(party, decision))
    }

    /// Valid from Matched only
    pub fn end_session(&self) -> SessionResult<()> {
        self.apply(|s| s.end_session())
    }

    pub fn abandon(&self) -> SessionResult<()> {
        self.apply(|s| s.abandon())
    }

    // ── Observation ───────────────────────────────────────────────────

    /// Invoke `callback` on every message append, reveal, reminder, and
    /// phase change.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&SessionEvent) + Send + Sync + 'static,
    {
        self.bus.subscribe(callback)
    }

    pub fn subscribe_filtered<F>(&self, filter: EventFilter, callback: F) -> SubscriptionId
    where
        F: Fn(&SessionEvent) + Send + Sync + 'static,
    {
        self.bus.subscribe_filtered(filter, callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    pub fn subscribe_channel(&self) -> broadcast::Receiver<SessionEvent> {
        self.bus.subscribe_channel()
    }

    /// Subscribe and report the last sequence already published, so the
    /// receiver's first event is exactly the one after it.
    pub fn subscribe_channel_at(&self) -> (broadcast::Receiver<SessionEvent>, u64) {
        let session = self.lock();
        (self.bus.subscribe_channel(), session.last_event_sequence())
    }

    // ── Queries ───────────────────────────────────────────────────────

    /// Run a read-only closure against the session
    pub fn read<T>(&self, f: impl FnOnce(&ChatSession) -> T) -> T {
        f(&self.lock())
    }

    pub fn phase(&self) -> SessionPhase {
        self.read(|s| s.phase())
    }

    pub fn remaining(&self) -> u32 {
        self.read(|s| s.remaining())
    }

    pub fn status(&self) -> SessionStatus {
        self.read(|s| s.status())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.read(|s| s.snapshot())
    }

    pub fn save_snapshot(&self, path: &Path) -> SessionResult<()> {
        save_snapshot(&self.snapshot(), path)
    }

    /// Events after `sequence`, for receivers that fell behind the channel.
    pub fn events_since(&self, sequence: u64) -> Vec<SessionEvent> {
        self.read(|s| s.events_since(sequence).to_vec())
    }

    /// A handle that does not keep the session alive.
    ///
    /// Background tasks hold one of these next to a channel receiver, so
    /// the channel closes once every strong handle is dropped.
    pub fn downgrade(&self) -> WeakSessionHandle {
        WeakSessionHandle {
            id: self.id,
            session: Arc::downgrade(&self.session),
            bus: Arc::downgrade(&self.bus),
        }
    }

    // ── Internals ─────────────────────────────────────────────────────

    fn lock(&self) -> MutexGuard<'_, ChatSession> {
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn apply<T>(&self, op: impl FnOnce(&mut ChatSession) -> T) -> T {
        let mut session = self.lock();
        let out = op(&mut session);
        for event in session.take_events() {
            self.bus.publish(&event);
        }
        out
    }
}

/// Non-owning counterpart of `SessionHandle`
#[derive(Clone)]
pub struct WeakSessionHandle {
    id: SessionId,
    session: Weak<Mutex<ChatSession>>,
    bus: Weak<EventBus>,
}

impl WeakSessionHandle {
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// `None` once every `SessionHandle` for the session is gone.
    pub fn upgrade(&self) -> Option<SessionHandle> {
        Some(SessionHandle {
            id: self.id,
            session: self.session.upgrade()?,
            bus: self.bus.upgrade()?,
        })
    }
}

impl std::fmt::Debug for WeakSessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeakSessionHandle")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}
