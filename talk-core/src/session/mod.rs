//! Timed chat session: phases, negotiation, and the reveal loop
//!
//! # Session Flow
//!
//! ```text
//! Active ──(countdown expires)──▶ Negotiating ──(both continue)──▶ Matched
//!   │                                 │                              │
//!   │                                 └──(any end)──▶ Ended ◀────────┘
//!   │                                               ▲   (end_session)
//!   └──────────────(abandon)────────────────────────┘
//! ```
//!
//! Messages are accepted in Active (pre-match reveal cadence) and Matched
//! (post-match cadence). Negotiating never falls back to Active.

pub mod machine;
pub mod snapshot;
pub mod state;

pub use machine::{ChatSession, DecisionOutcome, SessionStatus, TickOutcome};
pub use snapshot::{clear_snapshot, load_snapshot, save_snapshot, SessionSnapshot, SNAPSHOT_VERSION};
pub use state::{Decision, Decisions, EndReason, PhaseTransition, SessionId, SessionPhase};
