//! Parties and their onboarding answers.

use serde::{Deserialize, Serialize};

/// One of the two sides of a conversation.
///
/// `Me` is the local user ("self"), `Peer` the person on the other end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Party {
    #[serde(rename = "self")]
    Me,
    Peer,
}

impl Party {
    /// Both parties, peer first (the reveal order).
    pub const ALL: [Party; 2] = [Party::Peer, Party::Me];

    /// The other side of the conversation.
    pub fn other(self) -> Self {
        match self {
            Self::Me => Self::Peer,
            Self::Peer => Self::Me,
        }
    }
}

impl std::fmt::Display for Party {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Me => write!(f, "self"),
            Self::Peer => write!(f, "peer"),
        }
    }
}

/// A question from onboarding and the answer a party gave to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OnboardingAnswer {
    pub question: String,
    pub answer: String,
}

impl OnboardingAnswer {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// One party's answers, in reveal priority order.
///
/// Read-only once a session holds it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerPool {
    answers: Vec<OnboardingAnswer>,
}

impl AnswerPool {
    pub fn new(answers: Vec<OnboardingAnswer>) -> Self {
        Self { answers }
    }

    /// Build from `(question, answer)` pairs.
    pub fn from_pairs<Q, A>(pairs: impl IntoIterator<Item = (Q, A)>) -> Self
    where
        Q: Into<String>,
        A: Into<String>,
    {
        Self {
            answers: pairs
                .into_iter()
                .map(|(q, a)| OnboardingAnswer::new(q, a))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    /// Answer at a reveal ordinal (0 = revealed first).
    pub fn get(&self, ordinal: usize) -> Option<&OnboardingAnswer> {
        self.answers.get(ordinal)
    }

    pub fn iter(&self) -> impl Iterator<Item = &OnboardingAnswer> {
        self.answers.iter()
    }
}

impl FromIterator<OnboardingAnswer> for AnswerPool {
    fn from_iter<I: IntoIterator<Item = OnboardingAnswer>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Both parties' pools, looked up by party.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerPools {
    #[serde(rename = "self")]
    pub me: AnswerPool,
    pub peer: AnswerPool,
}

impl AnswerPools {
    pub fn new(me: AnswerPool, peer: AnswerPool) -> Self {
        Self { me, peer }
    }

    pub fn pool(&self, party: Party) -> &AnswerPool {
        match party {
            Party::Me => &self.me,
            Party::Peer => &self.peer,
        }
    }

    /// Look up one party's answer by ordinal.
    pub fn answer(&self, party: Party, ordinal: usize) -> Option<&OnboardingAnswer> {
        self.pool(party).get(ordinal)
    }

    /// Combined size of both pools; the reveal stop condition.
    pub fn total(&self) -> usize {
        self.me.len() + self.peer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_party_other() {
        assert_eq!(Party::Me.other(), Party::Peer);
        assert_eq!(Party::Peer.other(), Party::Me);
    }

    #[test]
    fn test_party_serde_names() {
        assert_eq!(serde_json::to_string(&Party::Me).unwrap(), "\"self\"");
        assert_eq!(serde_json::to_string(&Party::Peer).unwrap(), "\"peer\"");
        let parsed: Party = serde_json::from_str("\"self\"").unwrap();
        assert_eq!(parsed, Party::Me);
    }

    #[test]
    fn test_pool_lookup() {
        let pools = AnswerPools::new(
            AnswerPool::from_pairs([("Favorite season?", "Autumn")]),
            AnswerPool::from_pairs([("Morning or night?", "Night"), ("Tea or coffee?", "Tea")]),
        );
        assert_eq!(pools.total(), 3);
        assert_eq!(pools.answer(Party::Peer, 1).unwrap().answer, "Tea");
        assert!(pools.answer(Party::Me, 1).is_none());
    }
}
