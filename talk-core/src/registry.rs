//! Registry of live sessions, keyed by session id.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::answers::AnswerPool;
use crate::config::SessionConfig;
use crate::error::SessionResult;
use crate::handle::SessionHandle;
use crate::session::{SessionId, SessionPhase};

/// Shared reference to a SessionRegistry
pub type SharedSessionRegistry = Arc<SessionRegistry>;

/// Live sessions for a host running many rooms
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, SessionHandle>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared(self) -> SharedSessionRegistry {
        Arc::new(self)
    }

    /// Create a session and register it.
    pub fn create(
        &self,
        config: SessionConfig,
        self_answers: AnswerPool,
        peer_answers: AnswerPool,
    ) -> SessionResult<SessionHandle> {
        let handle = SessionHandle::with_config(config, self_answers, peer_answers)?;
        self.insert(handle.clone());
        Ok(handle)
    }

    pub fn insert(&self, handle: SessionHandle) {
        self.sessions
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(handle.id(), handle);
    }

    pub fn get(&self, id: &SessionId) -> Option<SessionHandle> {
        self.sessions
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
            .cloned()
    }

    pub fn remove(&self, id: &SessionId) -> Option<SessionHandle> {
        self.sessions
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ids(&self) -> Vec<SessionId> {
        self.sessions
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .copied()
            .collect()
    }

    /// Drop every session that reached `Ended`. Returns how many were removed.
    pub fn prune_ended(&self) -> usize {
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        let before = sessions.len();
        sessions.retain(|_, handle| handle.phase() != SessionPhase::Ended);
        let removed = before - sessions.len();
        if removed > 0 {
            debug!(removed, "Pruned ended sessions");
        }
        removed
    }
}
