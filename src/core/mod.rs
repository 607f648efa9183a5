//! Core engine types: participants, actions, events, errors, RNG, configuration.
//!
//! This module contains the building blocks every ruleset shares. Nothing
//! here knows about boards, cards or weapons.

pub mod action;
pub mod config;
pub mod error;
pub mod event;
pub mod player;
pub mod rng;

pub use action::Action;
pub use config::{parse_config, seat_roster};
pub use error::{EngineError, Rejection, RejectionKind};
pub use event::GameEvent;
pub use player::{ActorId, Participant, Roster, Seat, SeatMap};
pub use rng::{GameRng, GameRngState, RandomSource, ScriptedSource};
