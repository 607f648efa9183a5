//! The contract every ruleset implements.
//!
//! A plugin is a stateless rules object. All session data lives in its
//! associated `State`, which the plugin creates in `initialize` and replaces
//! on every `apply`. The session layer calls into the plugin and never
//! interprets game-specific concepts directly.
//!
//! ## Implementation Notes
//!
//! - `validate` never mutates and reports caller mistakes as [`Rejection`]s
//! - `apply` takes the state by reference and returns a fresh one; it
//!   re-validates and fails with [`EngineError::Unvalidated`] when handed an
//!   action validation refuses
//! - `current_actor` returns `None` both for terminal states and for
//!   simultaneous-selection phases
//! - views are distinct types, so concealed fields are absent by construction

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::{Action, ActorId, EngineError, GameEvent, Participant, Rejection};

/// Registry metadata for a ruleset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub min_players: usize,
    pub max_players: usize,
}

/// Final result of a session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    /// Winning actors. Empty for a draw, several for a split.
    pub winners: Vec<ActorId>,
    /// Final scores keyed by actor, when the ruleset keeps score.
    pub scores: Option<BTreeMap<ActorId, i64>>,
    /// Human-readable summary.
    pub reason: String,
}

impl Outcome {
    #[must_use]
    pub fn winner(actor: ActorId, reason: impl Into<String>) -> Self {
        Self {
            winners: vec![actor],
            scores: None,
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn draw(reason: impl Into<String>) -> Self {
        Self {
            winners: Vec::new(),
            scores: None,
            reason: reason.into(),
        }
    }

    /// Attach final scores (builder pattern).
    #[must_use]
    pub fn with_scores(mut self, scores: BTreeMap<ActorId, i64>) -> Self {
        self.scores = Some(scores);
        self
    }

    #[must_use]
    pub fn is_winner(&self, actor: &ActorId) -> bool {
        self.winners.contains(actor)
    }

    #[must_use]
    pub fn is_draw(&self) -> bool {
        self.winners.is_empty()
    }
}

/// The new state and the events produced by one applied action.
#[derive(Clone, Debug)]
pub struct Transition<S> {
    pub state: S,
    pub events: Vec<GameEvent>,
}

impl<S> Transition<S> {
    #[must_use]
    pub fn new(state: S, events: Vec<GameEvent>) -> Self {
        Self { state, events }
    }
}

/// A turn-based ruleset.
pub trait GamePlugin {
    /// Complete session data, including the randomness source.
    type State: Clone + Serialize + DeserializeOwned;
    /// Broadcast-safe projection.
    type PublicView: Serialize;
    /// Projection for one actor: the public view plus their secrets.
    type PlayerView: Serialize;

    /// Registry metadata.
    fn info(&self) -> GameInfo;

    /// Build a fresh session. Deterministic for a given `seed`.
    fn initialize(
        &self,
        participants: &[Participant],
        config: &Value,
        seed: u64,
    ) -> Result<Self::State, EngineError>;

    /// Check an action without touching the state.
    fn validate(&self, state: &Self::State, action: &Action, actor: &ActorId) -> Result<(), Rejection>;

    /// Produce the next state and its events. The input state is left as is.
    fn apply(
        &self,
        state: &Self::State,
        action: &Action,
        actor: &ActorId,
    ) -> Result<Transition<Self::State>, EngineError>;

    /// Whose turn it is, or `None` when terminal or simultaneous.
    fn current_actor(&self, state: &Self::State) -> Option<ActorId>;

    fn is_terminal(&self, state: &Self::State) -> bool;

    /// The outcome once terminal.
    fn result(&self, state: &Self::State) -> Option<Outcome>;

    fn public_view(&self, state: &Self::State) -> Self::PublicView;

    fn player_view(&self, state: &Self::State, actor: &ActorId) -> Self::PlayerView;

    /// Action to submit on the actor's behalf when their clock runs out.
    fn timeout_action(&self, _state: &Self::State, _actor: &ActorId) -> Option<Action> {
        None
    }

    /// Move suggestion for a computer-controlled seat. No ruleset ships one.
    fn suggest_action(&self, _state: &Self::State, _actor: &ActorId) -> Option<Action> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_is_winner() {
        let a = ActorId::from("a");
        let b = ActorId::from("b");

        let outcome = Outcome::winner(b.clone(), "knockout");
        assert!(!outcome.is_winner(&a));
        assert!(outcome.is_winner(&b));
        assert!(!outcome.is_draw());

        let draw = Outcome::draw("double knockout");
        assert!(draw.is_draw());
        assert!(!draw.is_winner(&a));

        let split = Outcome {
            winners: vec![a.clone(), b.clone()],
            scores: None,
            reason: "split pot".into(),
        };
        assert!(split.is_winner(&a));
        assert!(split.is_winner(&b));
    }

    #[test]
    fn test_outcome_serialization() {
        let mut scores = BTreeMap::new();
        scores.insert(ActorId::from("a"), 1500);
        scores.insert(ActorId::from("b"), 500);
        let outcome = Outcome::winner(ActorId::from("a"), "hand complete").with_scores(scores);

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["scores"]["a"], 1500);
        assert_eq!(json["winners"][0], "a");
    }
}
