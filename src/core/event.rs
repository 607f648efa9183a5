//! Domain events returned alongside every applied action.
//!
//! Events are a notification log, not a source of truth: the state blob is
//! authoritative and events are never replayed to rebuild it. Rulesets emit
//! them with sequence number 0; the session stamps each one with a
//! monotonically increasing number so observers can poll by sequence.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::player::ActorId;

/// One observable consequence of an applied action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    /// Position in the session's event log.
    pub seq: u64,

    /// What happened, e.g. `"dice_rolled"` or `"round_resolved"`.
    #[serde(rename = "type")]
    pub kind: String,

    /// The actor the event is about, if any.
    pub actor: Option<ActorId>,

    /// Event-specific data.
    pub payload: Value,
}

impl GameEvent {
    /// Create a new event with just a kind.
    #[must_use]
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            seq: 0,
            kind: kind.into(),
            actor: None,
            payload: Value::Null,
        }
    }

    /// Set the actor (builder pattern).
    #[must_use]
    pub fn with_actor(mut self, actor: &ActorId) -> Self {
        self.actor = Some(actor.clone());
        self
    }

    /// Set the payload (builder pattern).
    #[must_use]
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    /// Check the event kind.
    #[must_use]
    pub fn is(&self, kind: &str) -> bool {
        self.kind == kind
    }
}
