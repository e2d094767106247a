//! The chat session state machine.
//!
//! Owns the transcript, the countdown, the reveal scheduler, the phase and
//! the negotiation decisions. Every public method is a synchronous state
//! transition; events it causes are queued in an outbox that the caller
//! drains with `take_events`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::snapshot::{SessionSnapshot, SNAPSHOT_VERSION};
use super::state::{
    Decision, Decisions, EndReason, PhaseTransition, SessionId, SessionPhase,
};
use crate::answers::{AnswerPool, AnswerPools, Party};
use crate::clock::CountdownClock;
use crate::config::SessionConfig;
use crate::error::{SessionError, SessionResult};
use crate::events::{EventKind, SessionEvent};
use crate::reveal::{MatchState, RevealEvent, RevealScheduler};
use crate::transcript::{Message, TranscriptLog};

/// Result of a `tick()`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickOutcome {
    pub remaining_seconds: u32,
    /// True when this tick moved the session out of Active
    pub phase_changed: bool,
}

/// Result of a `submit_decision()`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionOutcome {
    pub phase_changed: bool,
    pub new_phase: SessionPhase,
}

/// Summary of where a session stands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub session_id: SessionId,
    pub phase: SessionPhase,
    pub remaining_seconds: u32,
    pub message_count: usize,
    pub reveal_count: usize,
    pub self_answers_remaining: usize,
    pub peer_answers_remaining: usize,
    pub decisions: Decisions,
}

impl SessionStatus {
    /// Compact status line.
    pub fn status_line(&self) -> String {
        format!(
            "[{}] {}s left | {} messages | {} reveals (self {} / peer {} hidden) | session={}",
            self.phase,
            self.remaining_seconds,
            self.message_count,
            self.reveal_count,
            self.self_answers_remaining,
            self.peer_answers_remaining,
            self.session_id.short()
        )
    }
}

/// A timed two-party chat session with progressive reveal.
#[derive(Debug)]
pub struct ChatSession {
    id: SessionId,
    config: SessionConfig,
    pools: Arc<AnswerPools>,
    clock: CountdownClock,
    transcript: TranscriptLog,
    scheduler: RevealScheduler,
    phase: SessionPhase,
    decisions: Decisions,
    transitions: Vec<PhaseTransition>,
    reminder_sent: bool,
    next_event_sequence: u64,
    created_at: DateTime<Utc>,
    outbox: Vec<SessionEvent>,
    /// Every event emitted by this instance, for catch-up after a lag
    journal: Vec<SessionEvent>,
}

impl ChatSession {
    /// Create a session in the Active phase with its countdown running.
    pub fn new(config: SessionConfig, me: AnswerPool, peer: AnswerPool) -> SessionResult<Self> {
        Self::with_shared_pools(config, Arc::new(AnswerPools::new(me, peer)))
    }

    /// Create a session over pools shared with other readers.
    pub fn with_shared_pools(
        config: SessionConfig,
        pools: Arc<AnswerPools>,
    ) -> SessionResult<Self> {
        config.validate()?;

        let session = Self {
            id: SessionId::new(),
            clock: CountdownClock::started(config.active_duration_secs),
            scheduler: RevealScheduler::from_config(&config),
            config,
            pools,
            transcript: TranscriptLog::new(),
            phase: SessionPhase::Active,
            decisions: Decisions::default(),
            transitions: Vec::new(),
            reminder_sent: false,
            next_event_sequence: 1,
            created_at: Utc::now(),
            outbox: Vec::new(),
            journal: Vec::new(),
        };

        info!(
            session_id = %session.id,
            duration = session.config.active_duration_secs,
            self_answers = session.pools.me.len(),
            peer_answers = session.pools.peer.len(),
            "Chat session created"
        );
        Ok(session)
    }

    // ── Operations ────────────────────────────────────────────────────

    /// Append a message and evaluate reveals.
    ///
    /// Accepted while Active (pre-match cadence) or Matched (post-match
    /// cadence).
    pub fn send(&mut self, party: Party, text: impl Into<String>) -> SessionResult<Message> {
        self.ensure_accepts_messages()?;

        let message = self.transcript.append(party, text).inspect_err(|_| {
            debug!(session_id = %self.id, party = %party, "Rejected blank message");
        })?;
        self.emit(EventKind::MessageAppended {
            message: message.clone(),
        });

        let match_state = if self.phase == SessionPhase::Matched {
            MatchState::PostMatch
        } else {
            MatchState::PreMatch
        };
        let count = u32::try_from(self.transcript.count()).unwrap_or(u32::MAX);
        if let Some(reveal) = self.scheduler.evaluate(count, &self.pools, match_state) {
            info!(
                session_id = %self.id,
                message_count = count,
                party = %reveal.revealed_by,
                ordinal = reveal.ordinal,
                "Answer revealed"
            );
            self.emit(EventKind::AnswerRevealed { reveal });
        }

        Ok(message)
    }

    /// Advance the countdown by one second.
    ///
    /// Outside of Active this changes nothing; late ticks are harmless.
    pub fn tick(&mut self) -> TickOutcome {
        if self.phase != SessionPhase::Active {
            return TickOutcome {
                remaining_seconds: self.clock.remaining(),
                phase_changed: false,
            };
        }

        let tick = self.clock.tick();
        if !tick.expired {
            self.maybe_remind(tick.remaining);
            return TickOutcome {
                remaining_seconds: tick.remaining,
                phase_changed: false,
            };
        }

        let phase_changed = self
            .transition(SessionPhase::Negotiating, "time limit reached")
            .is_ok();
        if phase_changed {
            self.decisions.reset();
            self.emit(EventKind::NegotiationStarted {
                decisions: self.decisions,
            });
        }

        TickOutcome {
            remaining_seconds: tick.remaining,
            phase_changed,
        }
    }

    /// Record one party's continue/end choice during negotiation.
    ///
    /// Once both have decided: both `Continue` → Matched, anything else →
    /// Ended with `EndReason::Rejected`.
    pub fn submit_decision(
        &mut self,
        party: Party,
        decision: Decision,
    ) -> SessionResult<DecisionOutcome> {
        match self.phase {
            SessionPhase::Negotiating => {}
            SessionPhase::Ended => return Err(SessionError::SessionEnded),
            phase => {
                warn!(session_id = %self.id, %phase, party = %party, "Decision outside negotiation");
                return Err(SessionError::SessionNotActive { phase });
            }
        }
        if decision == Decision::Pending {
            return Err(SessionError::InvalidDecision);
        }

        let previous = self.decisions.get(party);
        if previous != Decision::Pending && previous != decision {
            debug!(session_id = %self.id, party = %party, %previous, %decision, "Decision changed");
        }
        self.decisions.set(party, decision);
        self.emit(EventKind::DecisionRecorded { party, decision });

        if !self.decisions.all_decided() {
            return Ok(DecisionOutcome {
                phase_changed: false,
                new_phase: self.phase,
            });
        }

        if self.decisions.both_continue() {
            self.transition(SessionPhase::Matched, "both parties chose to continue")?;
            self.decisions.reset();
            self.emit(EventKind::Matched);
        } else {
            self.finish(EndReason::Rejected, "negotiation rejected")?;
        }

        Ok(DecisionOutcome {
            phase_changed: true,
            new_phase: self.phase,
        })
    }

    /// End a matched conversation.
    pub fn end_session(&mut self) -> SessionResult<()> {
        match self.phase {
            SessionPhase::Matched => self.finish(EndReason::EndedAfterMatch, "ended after match"),
            SessionPhase::Ended => Err(SessionError::SessionEnded),
            phase => Err(SessionError::NotMatched { phase }),
        }
    }

    /// Leave the session early from any non-terminal phase.
    pub fn abandon(&mut self) -> SessionResult<()> {
        if self.phase == SessionPhase::Ended {
            return Err(SessionError::SessionEnded);
        }
        self.clock.cancel();
        self.finish(EndReason::Abandoned, "abandoned")
    }

    // ── Queries ───────────────────────────────────────────────────────

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn pools(&self) -> &AnswerPools {
        &self.pools
    }

    pub fn clock(&self) -> &CountdownClock {
        &self.clock
    }

    pub fn remaining(&self) -> u32 {
        self.clock.remaining()
    }

    pub fn transcript(&self) -> &TranscriptLog {
        &self.transcript
    }

    /// The first `n` messages, in append order.
    pub fn messages_up_to(&self, n: usize) -> &[Message] {
        self.transcript.messages_up_to(n)
    }

    pub fn reveals(&self) -> &[RevealEvent] {
        self.scheduler.reveals()
    }

    /// Reveals to place right after the `n`-th message.
    pub fn reveals_after(&self, n: usize) -> Vec<&RevealEvent> {
        match u32::try_from(n) {
            Ok(count) => self.scheduler.reveals_at(count).collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn decisions(&self) -> Decisions {
        self.decisions
    }

    pub fn transitions(&self) -> &[PhaseTransition] {
        &self.transitions
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_complete(&self) -> bool {
        self.phase.is_terminal()
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            session_id: self.id,
            phase: self.phase,
            remaining_seconds: self.clock.remaining(),
            message_count: self.transcript.count(),
            reveal_count: self.scheduler.reveals().len(),
            self_answers_remaining: self.scheduler.remaining_for(Party::Me, &self.pools),
            peer_answers_remaining: self.scheduler.remaining_for(Party::Peer, &self.pools),
            decisions: self.decisions,
        }
    }

    /// Drain queued events in the order they were produced.
    pub fn take_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.outbox)
    }

    /// Sequence of the most recent event, or 0 before the first.
    pub fn last_event_sequence(&self) -> u64 {
        self.next_event_sequence.saturating_sub(1)
    }

    /// Events with a sequence greater than `sequence`, in order.
    ///
    /// Covers everything emitted since this instance was created or
    /// restored; a restored session starts with an empty journal.
    pub fn events_since(&self, sequence: u64) -> &[SessionEvent] {
        let start = self.journal.partition_point(|e| e.sequence <= sequence);
        &self.journal[start..]
    }

    // ── Snapshot / resume ─────────────────────────────────────────────

    /// Capture the full session state. Queued events are not included.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            version: SNAPSHOT_VERSION,
            session_id: self.id,
            created_at: self.created_at,
            saved_at: Utc::now(),
            config: self.config.clone(),
            pools: (*self.pools).clone(),
            clock: self.clock.clone(),
            transcript: self.transcript.clone(),
            scheduler: self.scheduler.clone(),
            phase: self.phase,
            decisions: self.decisions,
            transitions: self.transitions.clone(),
            reminder_sent: self.reminder_sent,
            next_event_sequence: self.next_event_sequence,
        }
    }

    /// Rebuild a session from a snapshot.
    pub fn restore(snapshot: SessionSnapshot) -> SessionResult<Self> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SessionError::snapshot(format!(
                "unsupported snapshot version {} (expected {})",
                snapshot.version, SNAPSHOT_VERSION
            )));
        }
        snapshot.config.validate()?;
        check_snapshot_consistency(&snapshot)?;

        info!(
            session_id = %snapshot.session_id,
            phase = %snapshot.phase,
            messages = snapshot.transcript.count(),
            "Chat session restored"
        );

        Ok(Self {
            id: snapshot.session_id,
            config: snapshot.config,
            pools: Arc::new(snapshot.pools),
            clock: snapshot.clock,
            transcript: snapshot.transcript,
            scheduler: snapshot.scheduler,
            phase: snapshot.phase,
            decisions: snapshot.decisions,
            transitions: snapshot.transitions,
            reminder_sent: snapshot.reminder_sent,
            next_event_sequence: snapshot.next_event_sequence,
            created_at: snapshot.created_at,
            outbox: Vec::new(),
            journal: Vec::new(),
        })
    }

    // ── Internals ─────────────────────────────────────────────────────

    fn ensure_accepts_messages(&self) -> SessionResult<()> {
        match self.phase {
            SessionPhase::Active | SessionPhase::Matched => Ok(()),
            SessionPhase::Ended => {
                debug!(session_id = %self.id, "Send on ended session");
                Err(SessionError::SessionEnded)
            }
            phase => {
                debug!(session_id = %self.id, %phase, "Send while not active");
                Err(SessionError::SessionNotActive { phase })
            }
        }
    }

    fn maybe_remind(&mut self, remaining: u32) {
        let threshold = self.config.reminder_threshold_secs();
        if self.reminder_sent || threshold == 0 || remaining == 0 || remaining > threshold {
            return;
        }
        self.reminder_sent = true;
        info!(session_id = %self.id, remaining, "Time running low");
        self.emit(EventKind::TimeRunningLow {
            remaining_seconds: remaining,
        });
    }

    fn finish(&mut self, reason: EndReason, why: &str) -> SessionResult<()> {
        let prior_phase = self.phase;
        self.transition(SessionPhase::Ended, why)?;
        self.emit(EventKind::Ended {
            prior_phase,
            reason,
        });
        Ok(())
    }

    fn transition(&mut self, to: SessionPhase, reason: &str) -> SessionResult<()> {
        let from = self.phase;
        if !from.can_transition_to(to) {
            warn!(session_id = %self.id, %from, %to, "Rejected phase transition");
            return Err(SessionError::InvalidTransition { from, to });
        }

        self.transitions.push(PhaseTransition {
            from,
            to,
            timestamp: Utc::now(),
            reason: reason.to_string(),
        });
        self.phase = to;
        info!(session_id = %self.id, %from, %to, reason, "Session phase changed");
        Ok(())
    }

    fn emit(&mut self, kind: EventKind) {
        let event = SessionEvent {
            session_id: self.id,
            sequence: self.next_event_sequence,
            timestamp: Utc::now(),
            kind,
        };
        self.next_event_sequence += 1;
        self.journal.push(event.clone());
        self.outbox.push(event);
    }
}

/// Reject snapshots whose clock or scheduler disagree with their config.
fn check_snapshot_consistency(snapshot: &SessionSnapshot) -> SessionResult<()> {
    let config = &snapshot.config;
    let scheduler = &snapshot.scheduler;
    if scheduler.pre_match_interval() != config.pre_match_reveal_interval
        || scheduler.post_match_interval() != config.post_match_reveal_interval
    {
        return Err(SessionError::snapshot(format!(
            "reveal intervals {}/{} do not match config {}/{}",
            scheduler.pre_match_interval(),
            scheduler.post_match_interval(),
            config.pre_match_reveal_interval,
            config.post_match_reveal_interval
        )));
    }

    let clock = &snapshot.clock;
    if clock.duration() != config.active_duration_secs || !clock.is_consistent() {
        return Err(SessionError::snapshot(format!(
            "clock {}s of {}s does not fit a {}s session",
            clock.remaining(),
            clock.duration(),
            config.active_duration_secs
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_each() -> (AnswerPool, AnswerPool) {
        (
            AnswerPool::from_pairs([
                ("What are you chasing lately?", "Quiet mornings"),
                ("A song on repeat?", "Holocene"),
            ]),
            AnswerPool::from_pairs([
                ("What are you chasing lately?", "A new city"),
                ("A song on repeat?", "Motion Sickness"),
            ]),
        )
    }

    fn session(duration: u32) -> ChatSession {
        let (me, peer) = two_each();
        ChatSession::new(SessionConfig::with_duration(duration), me, peer).unwrap()
    }

    fn event_types(session: &mut ChatSession) -> Vec<&'static str> {
        session
            .take_events()
            .iter()
            .map(|e| e.event_type())
            .collect()
    }

    #[test]
    fn test_new_session_is_active() {
        let session = session(30);
        assert_eq!(session.phase(), SessionPhase::Active);
        assert_eq!(session.remaining(), 30);
        assert!(session.clock().is_running());
        assert!(!session.is_complete());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let (me, peer) = two_each();
        let err = ChatSession::new(SessionConfig::with_duration(0), me, peer).unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_fifth_message_reveals_peer_answer() {
        let mut session = session(30);
        for i in 0..4 {
            let party = if i % 2 == 0 { Party::Me } else { Party::Peer };
            session.send(party, format!("msg {}", i)).unwrap();
        }
        assert!(session.reveals().is_empty());

        session.send(Party::Me, "fifth").unwrap();
        assert_eq!(session.reveals().len(), 1);
        assert_eq!(session.reveals()[0].revealed_by, Party::Peer);
        assert_eq!(session.reveals()[0].answer.answer, "A new city");
        assert_eq!(session.reveals_after(5).len(), 1);

        let types = event_types(&mut session);
        assert_eq!(types.last(), Some(&"answer_revealed"));
        assert_eq!(types.iter().filter(|t| **t == "message_appended").count(), 5);
    }

    #[test]
    fn test_blank_send_leaves_transcript_unchanged() {
        let mut session = session(30);
        session.send(Party::Me, "hello").unwrap();
        assert!(matches!(
            session.send(Party::Peer, "   "),
            Err(SessionError::InvalidMessage)
        ));
        assert_eq!(session.transcript().count(), 1);
    }

    #[test]
    fn test_expiry_moves_to_negotiating() {
        let mut session = session(3);
        assert!(!session.tick().phase_changed);
        assert!(!session.tick().phase_changed);
        let outcome = session.tick();
        assert!(outcome.phase_changed);
        assert_eq!(outcome.remaining_seconds, 0);
        assert_eq!(session.phase(), SessionPhase::Negotiating);

        // Extra ticks are no-ops
        assert!(!session.tick().phase_changed);
        assert_eq!(session.phase(), SessionPhase::Negotiating);

        // 15% of 3s rounds down to zero: no reminder for very short chats
        let types = event_types(&mut session);
        assert_eq!(types, vec!["negotiation_started"]);
    }

    #[test]
    fn test_send_rejected_while_negotiating() {
        let mut session = session(1);
        session.tick();
        let err = session.send(Party::Me, "wait").unwrap_err();
        assert!(matches!(
            err,
            SessionError::SessionNotActive {
                phase: SessionPhase::Negotiating
            }
        ));
        assert_eq!(session.transcript().count(), 0);
    }

    #[test]
    fn test_both_continue_matches() {
        let mut session = session(1);
        session.tick();
        session.take_events();

        let first = session.submit_decision(Party::Me, Decision::Continue).unwrap();
        assert!(!first.phase_changed);
        assert_eq!(first.new_phase, SessionPhase::Negotiating);

        let second = session
            .submit_decision(Party::Peer, Decision::Continue)
            .unwrap();
        assert!(second.phase_changed);
        assert_eq!(second.new_phase, SessionPhase::Matched);
        assert_eq!(session.decisions(), Decisions::default());

        let types = event_types(&mut session);
        assert_eq!(
            types,
            vec!["decision_recorded", "decision_recorded", "matched"]
        );
    }

    #[test]
    fn test_any_end_rejects() {
        for (me, peer) in [
            (Decision::Continue, Decision::End),
            (Decision::End, Decision::Continue),
            (Decision::End, Decision::End),
        ] {
            let mut session = session(1);
            session.tick();
            session.submit_decision(Party::Me, me).unwrap();
            let outcome = session.submit_decision(Party::Peer, peer).unwrap();
            assert_eq!(outcome.new_phase, SessionPhase::Ended);

            let events = session.take_events();
            assert!(!events.iter().any(|e| e.kind == EventKind::Matched));
            assert!(matches!(
                events.last().map(|e| &e.kind),
                Some(EventKind::Ended {
                    prior_phase: SessionPhase::Negotiating,
                    reason: EndReason::Rejected
                })
            ));
        }
    }

    #[test]
    fn test_pending_decision_rejected() {
        let mut session = session(1);
        session.tick();
        assert!(matches!(
            session.submit_decision(Party::Me, Decision::Pending),
            Err(SessionError::InvalidDecision)
        ));
    }

    #[test]
    fn test_decision_outside_negotiation() {
        let mut session = session(30);
        assert!(matches!(
            session.submit_decision(Party::Me, Decision::Continue),
            Err(SessionError::SessionNotActive {
                phase: SessionPhase::Active
            })
        ));
    }

    #[test]
    fn test_matched_ignores_ticks_and_uses_post_match_cadence() {
        let mut session = session(1);
        session.tick();
        session.submit_decision(Party::Me, Decision::Continue).unwrap();
        session.submit_decision(Party::Peer, Decision::Continue).unwrap();

        for _ in 0..100 {
            assert!(!session.tick().phase_changed);
        }
        assert_eq!(session.phase(), SessionPhase::Matched);

        for i in 0..6 {
            session.send(Party::Me, format!("after {}", i)).unwrap();
        }
        // Six messages since "last reveal" (none yet) → Peer first
        assert_eq!(session.reveals().len(), 1);
        assert_eq!(session.reveals()[0].match_state, MatchState::PostMatch);
        assert_eq!(session.reveals()[0].revealed_by, Party::Peer);
    }

    #[test]
    fn test_end_session_from_matched() {
        let mut session = session(1);
        session.tick();
        session.submit_decision(Party::Me, Decision::Continue).unwrap();
        session.submit_decision(Party::Peer, Decision::Continue).unwrap();
        session.take_events();

        session.end_session().unwrap();
        assert_eq!(session.phase(), SessionPhase::Ended);
        let events = session.take_events();
        assert!(matches!(
            events[0].kind,
            EventKind::Ended {
                prior_phase: SessionPhase::Matched,
                reason: EndReason::EndedAfterMatch
            }
        ));

        assert!(matches!(session.end_session(), Err(SessionError::SessionEnded)));
        assert!(matches!(
            session.send(Party::Me, "hello?"),
            Err(SessionError::SessionEnded)
        ));
    }

    #[test]
    fn test_end_session_requires_match() {
        let mut session = session(30);
        assert!(matches!(
            session.end_session(),
            Err(SessionError::NotMatched {
                phase: SessionPhase::Active
            })
        ));
        assert_eq!(session.phase(), SessionPhase::Active);
    }

    #[test]
    fn test_abandon_cancels_clock() {
        let mut session = session(30);
        session.abandon().unwrap();
        assert_eq!(session.phase(), SessionPhase::Ended);
        assert!(session.clock().is_cancelled());
        assert!(!session.tick().phase_changed);
        assert!(matches!(session.abandon(), Err(SessionError::SessionEnded)));
    }

    #[test]
    fn test_event_sequence_is_monotonic() {
        let mut session = session(2);
        session.send(Party::Me, "a").unwrap();
        session.tick();
        session.tick();
        let events = session.take_events();
        let sequences: Vec<u64> = events.iter().map(|e| e.sequence).collect();
        assert_eq!(sequences, (1..=events.len() as u64).collect::<Vec<_>>());
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut session = session(10);
        for i in 0..5 {
            session.send(Party::Peer, format!("m{}", i)).unwrap();
        }
        session.tick();

        let restored = ChatSession::restore(session.snapshot()).unwrap();
        assert_eq!(restored.id(), session.id());
        assert_eq!(restored.phase(), session.phase());
        assert_eq!(restored.remaining(), 9);
        assert_eq!(restored.transcript(), session.transcript());
        assert_eq!(restored.reveals(), session.reveals());
    }

    #[test]
    fn test_restore_rejects_unknown_version() {
        let mut snapshot = session(10).snapshot();
        snapshot.version = 99;
        let err = ChatSession::restore(snapshot).unwrap_err();
        assert_eq!(err.code(), "SNAPSHOT_ERROR");
    }

    fn tampered(session: &ChatSession, edit: impl FnOnce(&mut serde_json::Value)) -> SessionSnapshot {
        let mut value = serde_json::to_value(session.snapshot()).unwrap();
        edit(&mut value);
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_restore_rejects_zero_reveal_interval() {
        let session = session(30);
        let snapshot = tampered(&session, |v| {
            v["scheduler"]["pre_match_interval"] = serde_json::json!(0)
        });
        let err = ChatSession::restore(snapshot).unwrap_err();
        assert_eq!(err.code(), "SNAPSHOT_ERROR");

        let snapshot = tampered(&session, |v| {
            v["scheduler"]["post_match_interval"] = serde_json::json!(9)
        });
        assert!(ChatSession::restore(snapshot).is_err());
    }

    #[test]
    fn test_restore_rejects_clock_past_duration() {
        let session = session(30);
        let snapshot = tampered(&session, |v| v["clock"]["remaining"] = serde_json::json!(50));
        let err = ChatSession::restore(snapshot).unwrap_err();
        assert_eq!(err.code(), "SNAPSHOT_ERROR");

        let snapshot = tampered(&session, |v| {
            v["clock"]["duration"] = serde_json::json!(20);
            v["clock"]["remaining"] = serde_json::json!(20);
        });
        assert!(ChatSession::restore(snapshot).is_err());
    }

    #[test]
    fn test_reminder_at_default_duration() {
        let (me, peer) = two_each();
        let mut session = ChatSession::new(SessionConfig::default(), me, peer).unwrap();
        let mut reminded_at = Vec::new();
        for _ in 0..30 {
            session.tick();
            for event in session.take_events() {
                if let EventKind::TimeRunningLow { remaining_seconds } = event.kind {
                    reminded_at.push(remaining_seconds);
                }
            }
        }
        assert_eq!(reminded_at, vec![4]);
    }

    #[test]
    fn test_events_since_replays_in_order() {
        let mut session = session(30);
        for i in 0..6 {
            session.send(Party::Me, format!("m{}", i)).unwrap();
        }
        let drained = session.take_events();
        assert_eq!(session.events_since(0), drained.as_slice());

        let tail: Vec<u64> = session.events_since(4).iter().map(|e| e.sequence).collect();
        assert_eq!(tail, (5..=drained.len() as u64).collect::<Vec<_>>());
        assert!(session.events_since(drained.len() as u64).is_empty());
    }

    #[test]
    fn test_status_line() {
        let mut session = session(30);
        session.send(Party::Me, "hi").unwrap();
        let status = session.status();
        assert_eq!(status.message_count, 1);
        assert_eq!(status.peer_answers_remaining, 2);
        let line = status.status_line();
        assert!(line.contains("[active]"));
        assert!(line.contains("30s left"));
    }
}
