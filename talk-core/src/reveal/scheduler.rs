//! Reveal scheduler: trigger evaluation and reveal bookkeeping.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::answers::{AnswerPools, OnboardingAnswer, Party};
use crate::config::SessionConfig;

/// Whether the pair has matched, which selects the reveal cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchState {
    /// Timed conversation: fixed message-count thresholds
    PreMatch,
    /// Unlimited follow-on conversation: every N messages since the last reveal
    PostMatch,
}

impl std::fmt::Display for MatchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PreMatch => write!(f, "pre_match"),
            Self::PostMatch => write!(f, "post_match"),
        }
    }
}

/// One answer made visible to both parties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealEvent {
    /// Transcript length that triggered the reveal (≥ 1)
    pub trigger_message_count: u32,
    /// The answer being revealed
    pub answer: OnboardingAnswer,
    /// Whose answer it is
    pub revealed_by: Party,
    /// Position of the answer in its party's pool
    pub ordinal: usize,
    /// Cadence that produced it
    pub match_state: MatchState,
}

/// Decides reveals and remembers every reveal already emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealScheduler {
    pre_match_interval: u32,
    post_match_interval: u32,
    reveals: Vec<RevealEvent>,
}

impl RevealScheduler {
    /// Intervals of zero are treated as one.
    pub fn new(pre_match_interval: u32, post_match_interval: u32) -> Self {
        Self {
            pre_match_interval: pre_match_interval.max(1),
            post_match_interval: post_match_interval.max(1),
            reveals: Vec::new(),
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(
            config.pre_match_reveal_interval,
            config.post_match_reveal_interval,
        )
    }

    /// Work out the reveal due at `message_count`, without recording it.
    pub fn plan(
        &self,
        message_count: u32,
        pools: &AnswerPools,
        match_state: MatchState,
    ) -> Option<RevealEvent> {
        if message_count == 0 || self.reveals.len() >= pools.total() {
            return None;
        }
        // One reveal per message count, whichever cadence is in force.
        if self
            .reveals
            .iter()
            .any(|r| r.trigger_message_count == message_count)
        {
            return None;
        }

        let party = match match_state {
            MatchState::PreMatch => self.pre_match_target(message_count, pools)?,
            MatchState::PostMatch => self.post_match_target(message_count, pools)?,
        };

        let ordinal = self.revealed_count(party);
        let answer = pools.answer(party, ordinal)?.clone();

        Some(RevealEvent {
            trigger_message_count: message_count,
            answer,
            revealed_by: party,
            ordinal,
            match_state,
        })
    }

    /// Evaluate at `message_count` and record the reveal, if one is due.
    ///
    /// Re-evaluating at the same count yields nothing.
    pub fn evaluate(
        &mut self,
        message_count: u32,
        pools: &AnswerPools,
        match_state: MatchState,
    ) -> Option<RevealEvent> {
        let reveal = self.plan(message_count, pools, match_state)?;
        debug!(
            message_count,
            party = %reveal.revealed_by,
            ordinal = reveal.ordinal,
            match_state = %match_state,
            "Reveal triggered"
        );
        self.reveals.push(reveal.clone());
        Some(reveal)
    }

    /// Threshold k (count = (k+1) × interval): even k → Peer, odd k → Self.
    fn pre_match_target(&self, message_count: u32, pools: &AnswerPools) -> Option<Party> {
        let interval = self.pre_match_interval.max(1);
        if message_count % interval != 0 {
            return None;
        }
        let threshold_index = message_count / interval - 1;
        let party = if threshold_index % 2 == 0 {
            Party::Peer
        } else {
            Party::Me
        };
        (self.revealed_count(party) < pools.pool(party).len()).then_some(party)
    }

    fn post_match_target(&self, message_count: u32, pools: &AnswerPools) -> Option<Party> {
        let last_trigger = self
            .reveals
            .last()
            .map(|r| r.trigger_message_count)
            .unwrap_or(0);
        if message_count.saturating_sub(last_trigger) < self.post_match_interval.max(1) {
            return None;
        }

        let preferred = if self.reveals.len() % 2 == 0 {
            Party::Peer
        } else {
            Party::Me
        };
        [preferred, preferred.other()]
            .into_iter()
            .find(|&party| self.revealed_count(party) < pools.pool(party).len())
    }

    /// All reveals emitted so far, in emission order.
    pub fn reveals(&self) -> &[RevealEvent] {
        &self.reveals
    }

    /// Reveals triggered by exactly the `message_count`-th message.
    pub fn reveals_at(&self, message_count: u32) -> impl Iterator<Item = &RevealEvent> {
        self.reveals
            .iter()
            .filter(move |r| r.trigger_message_count == message_count)
    }

    pub fn revealed_count(&self, party: Party) -> usize {
        self.reveals
            .iter()
            .filter(|r| r.revealed_by == party)
            .count()
    }

    /// Answers of `party` not yet revealed.
    pub fn remaining_for(&self, party: Party, pools: &AnswerPools) -> usize {
        pools
            .pool(party)
            .len()
            .saturating_sub(self.revealed_count(party))
    }

    /// Every answer from both pools has been revealed.
    pub fn is_exhausted(&self, pools: &AnswerPools) -> bool {
        self.reveals.len() >= pools.total()
    }

    pub fn pre_match_interval(&self) -> u32 {
        self.pre_match_interval
    }

    pub fn post_match_interval(&self) -> u32 {
        self.post_match_interval
    }
}

impl Default for RevealScheduler {
    fn default() -> Self {
        Self::from_config(&SessionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answers::AnswerPool;

    fn pools(me: usize, peer: usize) -> AnswerPools {
        AnswerPools::new(
            (0..me)
                .map(|i| OnboardingAnswer::new(format!("q{}", i), format!("self-{}", i)))
                .collect(),
            (0..peer)
                .map(|i| OnboardingAnswer::new(format!("q{}", i), format!("peer-{}", i)))
                .collect(),
        )
    }

    #[test]
    fn test_no_reveal_below_first_threshold() {
        let mut scheduler = RevealScheduler::default();
        let pools = pools(2, 2);
        for count in 1..5 {
            assert!(scheduler
                .evaluate(count, &pools, MatchState::PreMatch)
                .is_none());
        }
        assert!(scheduler.reveals().is_empty());
    }

    #[test]
    fn test_first_threshold_reveals_peer() {
        let mut scheduler = RevealScheduler::default();
        let pools = pools(2, 2);
        let reveal = scheduler.evaluate(5, &pools, MatchState::PreMatch).unwrap();
        assert_eq!(reveal.revealed_by, Party::Peer);
        assert_eq!(reveal.answer.answer, "peer-0");
        assert_eq!(reveal.trigger_message_count, 5);
        assert_eq!(reveal.ordinal, 0);
    }

    #[test]
    fn test_pre_match_alternates() {
        let mut scheduler = RevealScheduler::default();
        let pools = pools(2, 2);
        let parties: Vec<Party> = (1..=20)
            .filter_map(|c| scheduler.evaluate(c, &pools, MatchState::PreMatch))
            .map(|r| r.revealed_by)
            .collect();
        assert_eq!(parties, vec![Party::Peer, Party::Me, Party::Peer, Party::Me]);
        assert!(scheduler.is_exhausted(&pools));
        assert!(scheduler.evaluate(25, &pools, MatchState::PreMatch).is_none());
    }

    #[test]
    fn test_zero_interval_loaded_from_json_counts_as_one() {
        let mut value = serde_json::to_value(RevealScheduler::default()).unwrap();
        value["pre_match_interval"] = serde_json::json!(0);
        value["post_match_interval"] = serde_json::json!(0);
        let mut scheduler: RevealScheduler = serde_json::from_value(value).unwrap();
        let pools = pools(1, 1);

        let first = scheduler.evaluate(1, &pools, MatchState::PreMatch).unwrap();
        assert_eq!(first.revealed_by, Party::Peer);
        let second = scheduler.evaluate(2, &pools, MatchState::PostMatch).unwrap();
        assert_eq!(second.revealed_by, Party::Me);
    }

    #[test]
    fn test_same_count_is_idempotent() {
        let mut scheduler = RevealScheduler::default();
        let pools = pools(2, 2);
        assert!(scheduler.evaluate(5, &pools, MatchState::PreMatch).is_some());
        assert!(scheduler.evaluate(5, &pools, MatchState::PreMatch).is_none());
        assert!(scheduler.evaluate(5, &pools, MatchState::PostMatch).is_none());
        assert_eq!(scheduler.reveals().len(), 1);
    }

    #[test]
    fn test_pre_match_skips_exhausted_party() {
        let mut scheduler = RevealScheduler::default();
        let pools = pools(3, 1);
        let reveals: Vec<(u32, Party)> = (1..=30)
            .filter_map(|c| scheduler.evaluate(c, &pools, MatchState::PreMatch))
            .map(|r| (r.trigger_message_count, r.revealed_by))
            .collect();
        // Peer runs out after its first answer; Self keeps its odd thresholds.
        assert_eq!(
            reveals,
            vec![
                (5, Party::Peer),
                (10, Party::Me),
                (20, Party::Me),
                (30, Party::Me)
            ]
        );
    }

    #[test]
    fn test_post_match_every_interval_since_last() {
        let mut scheduler = RevealScheduler::default();
        let pools = pools(3, 3);
        assert!(scheduler.evaluate(5, &pools, MatchState::PreMatch).is_some());

        // Matched afterwards: next reveal six messages after the last one.
        for count in 6..11 {
            assert!(scheduler
                .evaluate(count, &pools, MatchState::PostMatch)
                .is_none());
        }
        let reveal = scheduler.evaluate(11, &pools, MatchState::PostMatch).unwrap();
        assert_eq!(reveal.revealed_by, Party::Me);
        assert_eq!(reveal.match_state, MatchState::PostMatch);

        let reveal = scheduler.evaluate(17, &pools, MatchState::PostMatch).unwrap();
        assert_eq!(reveal.revealed_by, Party::Peer);
        assert_eq!(reveal.ordinal, 1);
    }

    #[test]
    fn test_post_match_falls_through_to_remaining_pool() {
        let mut scheduler = RevealScheduler::new(5, 1);
        let pools = pools(0, 3);
        let parties: Vec<Party> = (1..=10)
            .filter_map(|c| scheduler.evaluate(c, &pools, MatchState::PostMatch))
            .map(|r| r.revealed_by)
            .collect();
        assert_eq!(parties, vec![Party::Peer, Party::Peer, Party::Peer]);
    }

    #[test]
    fn test_empty_pools_never_reveal() {
        let mut scheduler = RevealScheduler::default();
        let pools = AnswerPools::new(AnswerPool::default(), AnswerPool::default());
        for count in 1..50 {
            assert!(scheduler
                .evaluate(count, &pools, MatchState::PreMatch)
                .is_none());
            assert!(scheduler
                .evaluate(count, &pools, MatchState::PostMatch)
                .is_none());
        }
    }

    #[test]
    fn test_plan_does_not_record() {
        let scheduler = RevealScheduler::default();
        let pools = pools(1, 1);
        assert!(scheduler.plan(5, &pools, MatchState::PreMatch).is_some());
        assert!(scheduler.reveals().is_empty());
    }

    #[test]
    fn test_remaining_and_reveals_at() {
        let mut scheduler = RevealScheduler::default();
        let pools = pools(2, 2);
        scheduler.evaluate(5, &pools, MatchState::PreMatch);
        assert_eq!(scheduler.remaining_for(Party::Peer, &pools), 1);
        assert_eq!(scheduler.remaining_for(Party::Me, &pools), 2);
        assert_eq!(scheduler.reveals_at(5).count(), 1);
        assert_eq!(scheduler.reveals_at(4).count(), 0);
    }
}
