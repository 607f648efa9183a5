//! Rejections and engine errors.
//!
//! A [`Rejection`] is a caller mistake reported by `validate`: wrong turn,
//! malformed payload, not enough resources. It never changes state and its
//! reason string is meant to be shown to the user verbatim.
//!
//! An [`EngineError`] is a contradiction inside the host integration, such as
//! applying an action that validation would have refused. Those abort the
//! operation instead of producing a coerced state.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Broad category of a rejected action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionKind {
    /// The session already reached a terminal state.
    GameOver,
    /// The actor is not seated in this session.
    NotParticipant,
    /// Someone else is entitled to act.
    NotYourTurn,
    /// The action exists but not in the current phase.
    WrongPhase,
    /// The discriminator names no action of this ruleset.
    UnknownAction,
    /// The payload is missing fields or has the wrong shape.
    Malformed,
    /// Not enough resources, chips, pieces or gauge.
    Insufficient,
    /// A placement, adjacency or ownership rule is violated.
    IllegalMove,
}

/// A refused action with a human-readable reason.
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{reason}")]
pub struct Rejection {
    pub kind: RejectionKind,
    pub reason: String,
}

impl Rejection {
    #[must_use]
    pub fn new(kind: RejectionKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn game_over() -> Self {
        Self::new(RejectionKind::GameOver, "game is over")
    }

    #[must_use]
    pub fn not_participant() -> Self {
        Self::new(RejectionKind::NotParticipant, "not a participant in this game")
    }

    #[must_use]
    pub fn not_your_turn() -> Self {
        Self::new(RejectionKind::NotYourTurn, "not your turn")
    }

    #[must_use]
    pub fn wrong_phase(reason: impl Into<String>) -> Self {
        Self::new(RejectionKind::WrongPhase, reason)
    }

    #[must_use]
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::new(RejectionKind::Malformed, reason)
    }

    #[must_use]
    pub fn insufficient(reason: impl Into<String>) -> Self {
        Self::new(RejectionKind::Insufficient, reason)
    }

    #[must_use]
    pub fn illegal(reason: impl Into<String>) -> Self {
        Self::new(RejectionKind::IllegalMove, reason)
    }
}

/// Failures that indicate a broken integration rather than a bad move.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("player count {count} outside {min}..={max}")]
    PlayerCount { count: usize, min: usize, max: usize },

    #[error("participant {0} listed twice")]
    DuplicateParticipant(String),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("invalid setting: {0}")]
    Setting(String),

    #[error("apply called with an action validation refuses: {0}")]
    Unvalidated(Rejection),

    #[error("state invariant violated: {0}")]
    Invariant(String),

    #[error("unknown game: {0}")]
    UnknownGame(String),

    #[error("state blob codec error: {0}")]
    Codec(#[from] bincode::Error),
}

impl EngineError {
    pub(crate) fn invariant(message: impl Into<String>) -> Self {
        EngineError::Invariant(message.into())
    }
}
