//! Progressive Reveal: which onboarding answer becomes visible, and when
//!
//! Evaluated after every appended message. Two cadences, selected by
//! whether the pair has matched yet:
//!
//! ```text
//! PreMatch   count = k × interval (k = 1, 2, ...)
//!            threshold k-1 even → Peer, odd → Self
//!
//! PostMatch  count − last_trigger ≥ interval
//!            reveals so far even → Peer, odd → Self
//!            (falls through to the other party once one pool is empty)
//! ```
//!
//! Each party's answers come out in pool order, at most once each, and
//! nothing is produced once both pools are exhausted.

pub mod scheduler;

pub use scheduler::{MatchState, RevealEvent, RevealScheduler};
