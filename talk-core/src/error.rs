//! Session error types
//!
//! Every rejected call on a session returns one of these. Nothing is
//! swallowed inside the state machine, so a caller can always tell a
//! re-promptable input problem from a stale UI or a programming error.

use thiserror::Error;

use crate::session::SessionPhase;

/// Result type alias for session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors that can occur while driving a chat session
#[derive(Error, Debug)]
pub enum SessionError {
    /// Empty or whitespace-only message text
    #[error("Invalid message: text must contain at least one non-whitespace character")]
    InvalidMessage,

    /// Operation not allowed in the current phase
    #[error("Session is not active (current phase: {phase})")]
    SessionNotActive { phase: SessionPhase },

    /// Operation attempted on a terminal session
    #[error("Session has ended")]
    SessionEnded,

    /// `end_session` called outside of the matched phase
    #[error("Session is not matched (current phase: {phase}); only a matched session can be ended explicitly")]
    NotMatched { phase: SessionPhase },

    /// A `Pending` decision was submitted
    #[error("Invalid decision: only continue or end can be submitted")]
    InvalidDecision,

    /// Guarded phase table violated
    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: SessionPhase, to: SessionPhase },

    /// Session configuration rejected by validation
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Snapshot could not be written or read back
    #[error("Snapshot error: {message}")]
    Snapshot { message: String },

    /// IO error wrapper
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SessionError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a snapshot error
    pub fn snapshot(message: impl Into<String>) -> Self {
        Self::Snapshot {
            message: message.into(),
        }
    }

    /// Machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidMessage => "INVALID_MESSAGE",
            Self::SessionNotActive { .. } => "SESSION_NOT_ACTIVE",
            Self::SessionEnded => "SESSION_ENDED",
            Self::NotMatched { .. } => "NOT_MATCHED",
            Self::InvalidDecision => "INVALID_DECISION",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::Config { .. } => "CONFIG_ERROR",
            Self::Snapshot { .. } => "SNAPSHOT_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Json(_) => "JSON_ERROR",
        }
    }

    /// Whether the caller should simply re-prompt the user.
    ///
    /// Everything else points at a stale UI or a caller bug.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::InvalidMessage | Self::InvalidDecision)
    }
}
