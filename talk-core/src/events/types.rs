//! Session event types
//!
//! Every message append, reveal, reminder, and phase change produces one
//! of these, in the order the state machine applied them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::answers::Party;
use crate::reveal::RevealEvent;
use crate::session::{Decision, Decisions, EndReason, SessionId, SessionPhase};
use crate::transcript::Message;

/// What happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// A message was appended to the transcript
    MessageAppended { message: Message },

    /// An onboarding answer became visible
    AnswerRevealed { reveal: RevealEvent },

    /// The countdown crossed the reminder threshold
    TimeRunningLow { remaining_seconds: u32 },

    /// Time is up; both parties must now choose continue or end
    NegotiationStarted { decisions: Decisions },

    /// One party submitted a decision
    DecisionRecorded { party: Party, decision: Decision },

    /// Both parties chose to continue
    Matched,

    /// The session reached its terminal phase
    Ended {
        prior_phase: SessionPhase,
        reason: EndReason,
    },
}

impl EventKind {
    /// Snake-case discriminator
    pub fn event_type(&self) -> &'static str {
        match self {
            EventKind::MessageAppended { .. } => "message_appended",
            EventKind::AnswerRevealed { .. } => "answer_revealed",
            EventKind::TimeRunningLow { .. } => "time_running_low",
            EventKind::NegotiationStarted { .. } => "negotiation_started",
            EventKind::DecisionRecorded { .. } => "decision_recorded",
            EventKind::Matched => "matched",
            EventKind::Ended { .. } => "ended",
        }
    }

    /// Whether this event reports a phase change
    pub fn is_phase_change(&self) -> bool {
        matches!(
            self,
            EventKind::NegotiationStarted { .. } | EventKind::Matched | EventKind::Ended { .. }
        )
    }
}

/// An event stamped with its session and per-session sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEvent {
    pub session_id: SessionId,
    /// 1-based, strictly increasing within a session
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub kind: EventKind,
}

impl SessionEvent {
    pub fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }
}
