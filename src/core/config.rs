//! Session configuration plumbing.
//!
//! Hosts pass a free-form JSON map to a ruleset's initializer. Each ruleset
//! declares a typed config struct with `#[serde(default)]` so every key is
//! optional, and reads it through [`parse_config`]. Participant lists are
//! checked against the ruleset's seat limits through [`seat_roster`].

use rustc_hash::FxHashSet;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::EngineError;
use super::player::{Participant, Roster};

/// Decode a ruleset config from the host's map. `null` means all defaults.
pub fn parse_config<T: DeserializeOwned + Default>(raw: &Value) -> Result<T, EngineError> {
    if raw.is_null() {
        return Ok(T::default());
    }
    Ok(T::deserialize(raw)?)
}

/// Seat participants in the given order after checking count and uniqueness.
pub fn seat_roster(
    participants: &[Participant],
    min: usize,
    max: usize,
) -> Result<Roster, EngineError> {
    let count = participants.len();
    if count < min || count > max {
        return Err(EngineError::PlayerCount { count, min, max });
    }

    let mut seen = FxHashSet::default();
    for participant in participants {
        if !seen.insert(participant.id.as_str()) {
            return Err(EngineError::DuplicateParticipant(participant.id.to_string()));
        }
    }

    Ok(Roster::new(participants.to_vec()))
}
