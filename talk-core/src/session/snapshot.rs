//! Session snapshots for resume and chat history
//!
//! A snapshot is the whole session state as pretty JSON. Restoring it
//! yields a session that behaves exactly as the original would have.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::state::{Decisions, PhaseTransition, SessionId, SessionPhase};
use crate::answers::AnswerPools;
use crate::clock::CountdownClock;
use crate::config::SessionConfig;
use crate::error::{SessionError, SessionResult};
use crate::reveal::RevealScheduler;
use crate::transcript::TranscriptLog;

/// Bump when the snapshot layout changes.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Serializable capture of a `ChatSession`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub version: u32,
    pub session_id: SessionId,
    pub created_at: DateTime<Utc>,
    pub saved_at: DateTime<Utc>,
    pub config: SessionConfig,
    pub pools: AnswerPools,
    pub clock: CountdownClock,
    pub transcript: TranscriptLog,
    pub scheduler: RevealScheduler,
    pub phase: SessionPhase,
    pub decisions: Decisions,
    pub transitions: Vec<PhaseTransition>,
    pub reminder_sent: bool,
    pub next_event_sequence: u64,
}

/// Save a snapshot to a JSON file
pub fn save_snapshot(snapshot: &SessionSnapshot, path: &Path) -> SessionResult<()> {
    let json = serde_json::to_string_pretty(snapshot)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, json)?;
    debug!(
        session_id = %snapshot.session_id,
        path = %path.display(),
        "Snapshot saved"
    );
    Ok(())
}

/// Load a snapshot from a JSON file. `None` if the file does not exist.
pub fn load_snapshot(path: &Path) -> SessionResult<Option<SessionSnapshot>> {
    if !path.exists() {
        return Ok(None);
    }

    let json = std::fs::read_to_string(path)?;
    let snapshot: SessionSnapshot = serde_json::from_str(&json).map_err(|e| {
        SessionError::snapshot(format!("unreadable snapshot {}: {}", path.display(), e))
    })?;
    Ok(Some(snapshot))
}

/// Delete a persisted snapshot file
pub fn clear_snapshot(path: &Path) -> SessionResult<()> {
    if path.exists() {
        std::fs::remove_file(path)?;
    }
    Ok(())
}
