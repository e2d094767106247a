//! Append-only transcript of a two-party conversation.
//!
//! The sequence number is authoritative for ordering; `sent_at` is
//! informational only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::answers::Party;
use crate::error::{SessionError, SessionResult};

/// A message in the transcript. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Opaque unique token
    pub id: String,
    /// 1-based append position
    pub sequence: u64,
    pub party: Party,
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

/// Ordered message log for one session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptLog {
    messages: Vec<Message>,
}

impl TranscriptLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message.
    ///
    /// Fails with `InvalidMessage` if `text` is empty or whitespace only;
    /// the log is unchanged in that case.
    pub fn append(&mut self, party: Party, text: impl Into<String>) -> SessionResult<Message> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(SessionError::InvalidMessage);
        }

        let message = Message {
            id: Uuid::new_v4().to_string(),
            sequence: self.messages.len() as u64 + 1,
            party,
            text,
            sent_at: Utc::now(),
        };
        self.messages.push(message.clone());
        Ok(message)
    }

    /// Total messages appended.
    pub fn count(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Messages sent by one party.
    pub fn count_by(&self, party: Party) -> usize {
        self.messages.iter().filter(|m| m.party == party).count()
    }

    /// The first `n` messages in append order (all of them if `n` exceeds the count).
    pub fn messages_up_to(&self, n: usize) -> &[Message] {
        &self.messages[..n.min(self.messages.len())]
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }
}
