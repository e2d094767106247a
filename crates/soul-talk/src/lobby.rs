//! The lobby: voice gate in front of session creation, plus chat history
//! on match.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use talk_core::{
    AnswerPool, EventKind, SessionConfig, SessionError, SessionHandle, SessionPhase,
    SharedSessionRegistry,
};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::voice::{PhraseVerifier, VerifyError};

#[derive(Debug, Error)]
pub enum LobbyError {
    #[error("Voice phrase not verified (heard: {transcript:?})")]
    VoiceNotVerified { transcript: String },

    #[error(transparent)]
    Verify(#[from] VerifyError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// A recording of the user reading `phrase`
#[derive(Debug, Clone)]
pub struct VoiceSample {
    pub audio: Vec<u8>,
    pub phrase: String,
}

impl VoiceSample {
    pub fn new(audio: Vec<u8>, phrase: impl Into<String>) -> Self {
        Self {
            audio,
            phrase: phrase.into(),
        }
    }
}

pub struct Lobby {
    verifier: Arc<dyn PhraseVerifier>,
    registry: SharedSessionRegistry,
    config: SessionConfig,
    history_dir: Option<PathBuf>,
}

impl Lobby {
    pub fn new(
        verifier: Arc<dyn PhraseVerifier>,
        registry: SharedSessionRegistry,
        config: SessionConfig,
    ) -> Self {
        Self {
            verifier,
            registry,
            config,
            history_dir: None,
        }
    }

    /// Save a snapshot of every session that reaches Matched into `dir`.
    pub fn with_history_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.history_dir = Some(dir.into());
        self
    }

    pub fn registry(&self) -> &SharedSessionRegistry {
        &self.registry
    }

    /// Verify the voice sample, then create and register a session.
    ///
    /// Nothing is created unless the phrase verifies.
    pub async fn open_session(
        &self,
        sample: &VoiceSample,
        self_answers: AnswerPool,
        peer_answers: AnswerPool,
    ) -> Result<SessionHandle, LobbyError> {
        let result = self.verifier.verify(&sample.audio, &sample.phrase).await?;
        if !result.verified {
            warn!(transcript = %result.transcript, "Voice phrase rejected");
            return Err(LobbyError::VoiceNotVerified {
                transcript: result.transcript,
            });
        }

        let handle = self
            .registry
            .create(self.config.clone(), self_answers, peer_answers)?;
        info!(session_id = %handle.id(), "Session opened from lobby");

        if let Some(dir) = &self.history_dir {
            spawn_history_writer(&handle, dir.clone());
        }
        Ok(handle)
    }
}

/// Save the session to `dir/<session_id>.json` once it is matched.
///
/// Resolves to the written path, or `None` if the session ended without a
/// match or was dropped first. The task does not keep the session alive.
pub fn spawn_history_writer(handle: &SessionHandle, dir: PathBuf) -> JoinHandle<Option<PathBuf>> {
    let mut rx = handle.subscribe_channel();
    let session = handle.downgrade();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => match event.kind {
                    EventKind::Matched => return save_history(&session.upgrade()?, &dir),
                    EventKind::Ended { .. } => return None,
                    _ => {}
                },
                // Matched is a phase, so a missed event still shows in the session
                Err(broadcast::error::RecvError::Lagged(_)) => {
                    let handle = session.upgrade()?;
                    match handle.phase() {
                        SessionPhase::Matched => return save_history(&handle, &dir),
                        SessionPhase::Ended => return None,
                        _ => continue,
                    }
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!(session_id = %session.id(), "Session dropped before a match");
                    return None;
                }
            }
        }
    })
}

fn save_history(handle: &SessionHandle, dir: &Path) -> Option<PathBuf> {
    let path = dir.join(format!("{}.json", handle.id()));
    match handle.save_snapshot(&path) {
        Ok(()) => {
            info!(session_id = %handle.id(), path = %path.display(), "Chat history saved");
            Some(path)
        }
        Err(e) => {
            warn!(session_id = %handle.id(), error = %e, "Failed to save chat history");
            None
        }
    }
}
