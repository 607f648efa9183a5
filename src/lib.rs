//! # rust-tabletop
//!
//! A rules engine for multiplayer turn-based tabletop games.
//!
//! ## Design Principles
//!
//! 1. **Pure**: Every operation is a function of `(state, action, actor)`.
//!    The engine performs no I/O and never mutates the caller's state.
//!
//! 2. **Pluggable**: Games implement one contract, [`rules::GamePlugin`],
//!    and share the session lifecycle, validation pipeline and view split.
//!
//! 3. **Deterministic**: Each state carries its own seeded RNG, so a session
//!    replays exactly from its seed and action log.
//!
//! ## Architecture
//!
//! - **Persistent Data Structures**: `im` vectors make the clone taken by
//!   every apply cheap.
//!
//! - **Closed Game Set**: [`session::Session`] dispatches over an enum of
//!   the hosted games with exhaustive matching.
//!
//! - **Distinct Views**: public and per-player views are separate types, so
//!   concealed information is absent rather than scrubbed.
//!
//! ## Modules
//!
//! - `core`: Actors, seats, actions, events, errors, RNG, configuration
//! - `rules`: The `GamePlugin` contract
//! - `games`: Settlers, hold'em and the two duels
//! - `session`: The host-facing driver and blob codecs

pub mod core;
pub mod games;
pub mod rules;
pub mod session;

// Re-export commonly used types
pub use crate::core::{
    Action, ActorId, EngineError, GameEvent, GameRng, GameRngState, Participant, RandomSource,
    Rejection, RejectionKind, Seat, SeatMap,
};

pub use crate::rules::{GameInfo, GamePlugin, Outcome, Transition};

pub use crate::session::{GameKind, PlayerView, PublicView, Session, SessionError, SessionState, Step};
