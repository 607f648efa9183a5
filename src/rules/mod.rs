//! Ruleset contract.
//!
//! Games implement [`GamePlugin`] to define:
//! - How a session starts
//! - Which actions are legal and what they change
//! - Turn ownership, win conditions and per-observer views
//!
//! The session driver calls into `GamePlugin` but never interprets
//! game-specific concepts directly.

pub mod plugin;

pub use plugin::{GameInfo, GamePlugin, Outcome, Transition};
