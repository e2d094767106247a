//! Session events and their fan-out
//!
//! ```text
//! ┌──────────────┐  take_events  ┌──────────────┐     ┌──────────────┐
//! │ ChatSession  │──────────────▶│  Event Bus   │────▶│  callbacks   │
//! │  (outbox)    │               │              │────▶│  receivers   │
//! └──────────────┘               └──────────────┘     └──────────────┘
//! ```
//!
//! The session only queues events; the handle drains and publishes them
//! while still holding the session lock, so observers see them in the
//! exact order the state machine produced them.

pub mod bus;
pub mod types;

pub use bus::{EventBus, EventFilter, SharedEventBus, SubscriptionId};
pub use types::{EventKind, SessionEvent};
