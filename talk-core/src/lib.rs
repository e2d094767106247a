//! Soul Talk session engine
//!
//! This library provides the deterministic core of a timed two-party chat:
//! - A countdown clock driven by external one-second ticks
//! - A progressive reveal scheduler for onboarding answers
//! - An append-only transcript
//! - A session state machine: Active → Negotiating → Matched / Ended
//!
//! Everything is synchronous and free of wall-clock reads beyond
//! informational timestamps. The host owns the ticker, the transport, and
//! any external services.
//!
//! # Usage
//!
//! ```
//! use talk_core::{create_session, AnswerPool, Decision, Party, SessionPhase};
//!
//! let handle = create_session(
//!     AnswerPool::from_pairs([("Favorite season?", "Autumn")]),
//!     AnswerPool::from_pairs([("Favorite season?", "Spring")]),
//!     3,
//! )
//! .unwrap();
//!
//! handle.send(Party::Me, "hey!").unwrap();
//! for _ in 0..3 {
//!     handle.tick();
//! }
//! assert_eq!(handle.phase(), SessionPhase::Negotiating);
//!
//! handle.submit_decision(Party::Me, Decision::Continue).unwrap();
//! handle.submit_decision(Party::Peer, Decision::Continue).unwrap();
//! assert_eq!(handle.phase(), SessionPhase::Matched);
//! ```

#![allow(clippy::uninlined_format_args)]

pub mod answers;
pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod handle;
pub mod registry;
pub mod reveal;
pub mod session;
pub mod transcript;

pub use answers::{AnswerPool, AnswerPools, OnboardingAnswer, Party};
pub use clock::{ClockTick, CountdownClock};
pub use config::SessionConfig;
pub use error::{SessionError, SessionResult};
pub use events::{EventBus, EventFilter, EventKind, SessionEvent, SharedEventBus, SubscriptionId};
pub use handle::{create_session, SessionHandle, WeakSessionHandle};
pub use registry::{SessionRegistry, SharedSessionRegistry};
pub use reveal::{MatchState, RevealEvent, RevealScheduler};
pub use session::{
    load_snapshot, save_snapshot, ChatSession, Decision, DecisionOutcome, Decisions, EndReason,
    PhaseTransition, SessionId, SessionPhase, SessionSnapshot, SessionStatus, TickOutcome,
};
pub use transcript::{Message, TranscriptLog};
