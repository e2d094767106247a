//! Session phases, decisions, and the transition table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::answers::Party;

/// Unique session identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// First 8 characters, for log lines
    pub fn short(&self) -> String {
        self.0.to_string()[..8].to_string()
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for SessionId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

/// Phase of a chat session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Timed conversation, countdown running.
    Active,
    /// Time is up; collecting both parties' continue/end decision.
    Negotiating,
    /// Both chose to continue; unlimited follow-on conversation.
    Matched,
    /// Terminal.
    Ended,
}

impl SessionPhase {
    /// Whether this is a terminal phase.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Ended)
    }

    /// Whether messages can be sent in this phase.
    pub fn accepts_messages(self) -> bool {
        matches!(self, Self::Active | Self::Matched)
    }

    /// Valid transitions from this phase.
    ///
    /// Negotiating never returns to Active: a negotiation always resolves.
    pub fn valid_transitions(self) -> &'static [SessionPhase] {
        match self {
            Self::Active => &[Self::Negotiating, Self::Ended],
            Self::Negotiating => &[Self::Matched, Self::Ended],
            Self::Matched => &[Self::Ended],
            Self::Ended => &[],
        }
    }

    pub fn can_transition_to(self, to: SessionPhase) -> bool {
        self.valid_transitions().contains(&to)
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Negotiating => write!(f, "negotiating"),
            Self::Matched => write!(f, "matched"),
            Self::Ended => write!(f, "ended"),
        }
    }
}

/// A party's answer to "keep talking?".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    #[default]
    Pending,
    Continue,
    End,
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Continue => write!(f, "continue"),
            Self::End => write!(f, "end"),
        }
    }
}

impl std::str::FromStr for Decision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "continue" | "yes" => Ok(Self::Continue),
            "end" | "no" => Ok(Self::End),
            "pending" => Ok(Self::Pending),
            other => Err(format!("unknown decision '{}'", other)),
        }
    }
}

/// Both parties' decisions during negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Decisions {
    #[serde(rename = "self")]
    pub me: Decision,
    pub peer: Decision,
}

impl Decisions {
    pub fn get(&self, party: Party) -> Decision {
        match party {
            Party::Me => self.me,
            Party::Peer => self.peer,
        }
    }

    pub fn set(&mut self, party: Party, decision: Decision) {
        match party {
            Party::Me => self.me = decision,
            Party::Peer => self.peer = decision,
        }
    }

    /// Back to `Pending` for both.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn all_decided(&self) -> bool {
        self.me != Decision::Pending && self.peer != Decision::Pending
    }

    pub fn both_continue(&self) -> bool {
        self.me == Decision::Continue && self.peer == Decision::Continue
    }
}

/// Why a session ended. Lets callers tell "timed out unmatched" from
/// "ended after a match".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// Negotiation resolved with at least one `End`
    Rejected,
    /// Explicit end of a matched conversation
    EndedAfterMatch,
    /// A party left before the session resolved
    Abandoned,
}

impl std::fmt::Display for EndReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rejected => write!(f, "rejected"),
            Self::EndedAfterMatch => write!(f, "ended_after_match"),
            Self::Abandoned => write!(f, "abandoned"),
        }
    }
}

/// A phase transition record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTransition {
    pub from: SessionPhase,
    pub to: SessionPhase,
    pub timestamp: DateTime<Utc>,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_table() {
        assert!(SessionPhase::Active.can_transition_to(SessionPhase::Negotiating));
        assert!(SessionPhase::Negotiating.can_transition_to(SessionPhase::Matched));
        assert!(!SessionPhase::Negotiating.can_transition_to(SessionPhase::Active));
        assert!(!SessionPhase::Matched.can_transition_to(SessionPhase::Negotiating));
        assert!(SessionPhase::Ended.valid_transitions().is_empty());
        assert!(SessionPhase::Ended.is_terminal());
    }

    #[test]
    fn test_accepts_messages() {
        assert!(SessionPhase::Active.accepts_messages());
        assert!(SessionPhase::Matched.accepts_messages());
        assert!(!SessionPhase::Negotiating.accepts_messages());
        assert!(!SessionPhase::Ended.accepts_messages());
    }

    #[test]
    fn test_decisions() {
        let mut decisions = Decisions::default();
        assert!(!decisions.all_decided());
        decisions.set(Party::Me, Decision::Continue);
        assert_eq!(decisions.get(Party::Me), Decision::Continue);
        assert!(!decisions.all_decided());
        decisions.set(Party::Peer, Decision::Continue);
        assert!(decisions.all_decided());
        assert!(decisions.both_continue());
        decisions.reset();
        assert_eq!(decisions, Decisions::default());
    }

    #[test]
    fn test_decision_from_str() {
        assert_eq!("continue".parse::<Decision>().unwrap(), Decision::Continue);
        assert_eq!("END".parse::<Decision>().unwrap(), Decision::End);
        assert!("maybe".parse::<Decision>().is_err());
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(SessionPhase::Active.to_string(), "active");
        assert_eq!(SessionPhase::Negotiating.to_string(), "negotiating");
        assert_eq!(SessionPhase::Matched.to_string(), "matched");
        assert_eq!(SessionPhase::Ended.to_string(), "ended");
    }

    #[test]
    fn test_session_id_short() {
        let id = SessionId::new();
        assert_eq!(id.short().len(), 8);
        assert!(id.to_string().starts_with(&id.short()));
    }
}
