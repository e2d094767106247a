//! Soul Talk host runtime
//!
//! Everything around the `talk_core` session engine:
//! - `lobby`: voice-phrase gate in front of session creation
//! - `ticker`: one `tick()` per second from a tokio interval
//! - `room`: per-room delivery of session events
//! - `soul_color`: catalog plus Gemini classifier with a non-fatal fallback
//! - `voice`: ElevenLabs speech-to-text phrase verifier
//! - `users`: user records and soul-color assignment

#![allow(clippy::uninlined_format_args)]

pub mod config;
pub mod lobby;
pub mod room;
pub mod soul_color;
pub mod ticker;
pub mod users;
pub mod voice;

pub use config::AppConfig;
pub use lobby::{spawn_history_writer, Lobby, LobbyError, VoiceSample};
pub use room::{BusError, InProcessRoomBus, RoomBus, RoomEnvelope, RoomSubscription, SessionRelay};
pub use ticker::spawn_ticker;
pub use users::{
    assign_soul_color, set_soul_color, InMemoryUserRepository, RepositoryError, User,
    UserRepository, UserUpdate,
};
pub use voice::{phrase_matches, ElevenLabsVerifier, PhraseVerifier, VerificationResult, VerifyError};
