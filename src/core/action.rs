//! Action representation: discriminator + untyped payload.
//!
//! The host hands the engine a kind string (the "verb") and a JSON payload
//! (the arguments). Each ruleset decodes that pair into its own typed move
//! enum with [`Action::decode`], so everything past the boundary works on
//! Rust types.
//!
//! ```
//! use rust_tabletop::core::Action;
//! use serde::Deserialize;
//! use serde_json::json;
//!
//! #[derive(Deserialize, Debug, PartialEq)]
//! #[serde(tag = "type", rename_all = "snake_case")]
//! enum Move {
//!     Raise { amount: u32 },
//!     Fold,
//! }
//!
//! let raise = Action::new("raise").with_payload(json!({ "amount": 60 }));
//! assert_eq!(raise.decode::<Move>().unwrap(), Move::Raise { amount: 60 });
//! assert_eq!(Action::new("fold").decode::<Move>().unwrap(), Move::Fold);
//! assert!(Action::new("dance").decode::<Move>().is_err());
//! ```

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::{Rejection, RejectionKind};

/// A request submitted by one actor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Action discriminator, e.g. `"build_road"` or `"raise"`.
    #[serde(rename = "type")]
    pub kind: String,

    /// Arguments; `null` when the action takes none.
    #[serde(default)]
    pub payload: Value,
}

impl Action {
    /// Create an action with no payload.
    #[must_use]
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            payload: Value::Null,
        }
    }

    /// Attach a payload (builder pattern).
    #[must_use]
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    /// Encode a typed move (internally tagged on `"type"`) as an action.
    pub fn encode<T: Serialize>(mv: &T) -> Result<Self, serde_json::Error> {
        let mut fields = match serde_json::to_value(mv)? {
            Value::Object(map) => map,
            other => {
                return Ok(Self::new(other.as_str().unwrap_or_default()));
            }
        };
        let kind = match fields.remove("type") {
            Some(Value::String(kind)) => kind,
            _ => String::new(),
        };
        let payload = if fields.is_empty() {
            Value::Null
        } else {
            Value::Object(fields)
        };
        Ok(Self { kind, payload })
    }

    /// Decode into an internally tagged move enum keyed on `"type"`.
    ///
    /// The payload's fields are merged next to the tag, so a move variant's
    /// fields are read directly from the payload object.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, Rejection> {
        let mut fields = match &self.payload {
            Value::Null => Map::new(),
            Value::Object(map) => map.clone(),
            _ => return Err(Rejection::malformed("payload must be an object")),
        };
        fields.insert("type".to_owned(), Value::String(self.kind.clone()));

        serde_json::from_value(Value::Object(fields)).map_err(|err| {
            let message = err.to_string();
            if message.starts_with("unknown variant") {
                Rejection::new(
                    RejectionKind::UnknownAction,
                    format!("unknown action: {}", self.kind),
                )
            } else {
                Rejection::malformed(format!("invalid {} payload: {}", self.kind, message))
            }
        })
    }
}
