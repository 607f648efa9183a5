//! Hosted rulesets.
//!
//! - `settlers`: hex-board settlement and trading game, 3–4 players
//! - `holdem`: one hand of no-limit Texas hold'em, 2–8 players
//! - `duel`: two simultaneous-selection weapon duels

pub mod duel;
pub mod holdem;
pub mod settlers;
