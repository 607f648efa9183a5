//! The generic session driver a host calls into.
//!
//! A [`Session`] wraps the state of exactly one hosted game together with
//! the event sequence counter. Hosts persist it as an opaque blob between
//! requests, either as bincode bytes or as JSON text.
//!
//! ## Flow
//!
//! ```text
//! blob ──from_bytes──> Session ──submit(action, actor)──> Step { session, events }
//!                                       │
//!                                       └──> SessionError::Rejected(reason)
//! ```
//!
//! The session owns no rules. Every call dispatches with an exhaustive match
//! over [`SessionState`] into the matching [`GamePlugin`].
//!
//! ```
//! use rust_tabletop::core::{Action, ActorId, Participant};
//! use rust_tabletop::session::{GameKind, Session};
//!
//! let players = vec![Participant::new("ann", "Ann"), Participant::new("bo", "Bo")];
//! let session = Session::start(GameKind::Holdem, &players, &serde_json::Value::Null, 7).unwrap();
//! assert_eq!(session.current_actor(), Some(ActorId::from("ann")));
//!
//! let step = session.submit(&Action::new("fold"), &ActorId::from("ann")).unwrap();
//! assert!(step.session.is_terminal());
//! assert!(step.events.iter().all(|e| e.seq > 0));
//! ```

pub mod registry;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::core::{Action, ActorId, EngineError, GameEvent, Participant, Rejection};
use crate::games::duel::enhance::{EnhancePlayerView, EnhancePublicView};
use crate::games::duel::weapon::{WeaponDuelPlayerView, WeaponDuelPublicView};
use crate::games::duel::{EnhanceDuel, EnhanceDuelState, WeaponDuel, WeaponDuelState};
use crate::games::holdem::{Holdem, HoldemPlayerView, HoldemPublicView, HoldemState};
use crate::games::settlers::{Settlers, SettlersPlayerView, SettlersPublicView, SettlersState};
use crate::rules::{GameInfo, GamePlugin, Outcome};

pub use registry::{catalog, GameKind};

/// Why a submitted action produced no new session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The caller's mistake; show the reason to the user.
    #[error("action rejected: {0}")]
    Rejected(Rejection),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl SessionError {
    #[must_use]
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            SessionError::Rejected(rejection) => Some(rejection),
            SessionError::Engine(_) => None,
        }
    }
}

/// State of the hosted game.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SessionState {
    Settlers(SettlersState),
    Holdem(HoldemState),
    WeaponDuel(WeaponDuelState),
    EnhanceDuel(EnhanceDuelState),
}

/// Broadcast-safe projection of any hosted game.
#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum PublicView {
    Settlers(SettlersPublicView),
    Holdem(HoldemPublicView),
    WeaponDuel(WeaponDuelPublicView),
    EnhanceDuel(EnhancePublicView),
}

/// Projection for one actor of any hosted game.
#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum PlayerView {
    Settlers(SettlersPlayerView),
    Holdem(HoldemPlayerView),
    WeaponDuel(WeaponDuelPlayerView),
    EnhanceDuel(EnhancePlayerView),
}

/// Run `$body` with `$plugin` bound to the ruleset and `$state` to its state.
macro_rules! dispatch {
    ($session_state:expr, $plugin:ident, $state:ident => $body:expr) => {
        match $session_state {
            SessionState::Settlers($state) => {
                let $plugin = Settlers;
                $body
            }
            SessionState::Holdem($state) => {
                let $plugin = Holdem;
                $body
            }
            SessionState::WeaponDuel($state) => {
                let $plugin = WeaponDuel;
                $body
            }
            SessionState::EnhanceDuel($state) => {
                let $plugin = EnhanceDuel;
                $body
            }
        }
    };
}

/// Result of a successfully applied action.
#[derive(Clone, Debug)]
pub struct Step {
    pub session: Session,
    /// Events stamped with their sequence numbers.
    pub events: Vec<GameEvent>,
}

/// One hosted game instance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    state: SessionState,
    /// Sequence number the next event receives.
    next_seq: u64,
}

impl Session {
    /// Create a session for `kind`. Deterministic for a given `seed`.
    pub fn start(
        kind: GameKind,
        participants: &[Participant],
        config: &Value,
        seed: u64,
    ) -> Result<Self, EngineError> {
        let state = match kind {
            GameKind::Settlers => SessionState::Settlers(Settlers.initialize(participants, config, seed)?),
            GameKind::Holdem => SessionState::Holdem(Holdem.initialize(participants, config, seed)?),
            GameKind::WeaponDuel => {
                SessionState::WeaponDuel(WeaponDuel.initialize(participants, config, seed)?)
            }
            GameKind::EnhanceDuel => {
                SessionState::EnhanceDuel(EnhanceDuel.initialize(participants, config, seed)?)
            }
        };
        info!(game = kind.info().id, players = participants.len(), seed, "session started");
        Ok(Self { state, next_seq: 1 })
    }

    /// Create a session from a registry id such as `"holdem"`.
    pub fn start_by_id(
        id: &str,
        participants: &[Participant],
        config: &Value,
        seed: u64,
    ) -> Result<Self, EngineError> {
        Self::start(GameKind::lookup(id)?, participants, config, seed)
    }

    #[must_use]
    pub fn kind(&self) -> GameKind {
        match self.state {
            SessionState::Settlers(_) => GameKind::Settlers,
            SessionState::Holdem(_) => GameKind::Holdem,
            SessionState::WeaponDuel(_) => GameKind::WeaponDuel,
            SessionState::EnhanceDuel(_) => GameKind::EnhanceDuel,
        }
    }

    #[must_use]
    pub fn info(&self) -> GameInfo {
        self.kind().info()
    }

    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    #[must_use]
    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }

    /// Check an action without applying it.
    pub fn validate(&self, action: &Action, actor: &ActorId) -> Result<(), Rejection> {
        dispatch!(&self.state, plugin, state => plugin.validate(state, action, actor))
    }

    /// Validate and apply an action, returning the next session.
    ///
    /// `self` is left untouched, so a rejected or failed action leaves the
    /// caller holding the previous session.
    pub fn submit(&self, action: &Action, actor: &ActorId) -> Result<Step, SessionError> {
        self.validate(action, actor).map_err(SessionError::Rejected)?;

        let (state, mut events) = match &self.state {
            SessionState::Settlers(state) => {
                let t = Settlers.apply(state, action, actor)?;
                (SessionState::Settlers(t.state), t.events)
            }
            SessionState::Holdem(state) => {
                let t = Holdem.apply(state, action, actor)?;
                (SessionState::Holdem(t.state), t.events)
            }
            SessionState::WeaponDuel(state) => {
                let t = WeaponDuel.apply(state, action, actor)?;
                (SessionState::WeaponDuel(t.state), t.events)
            }
            SessionState::EnhanceDuel(state) => {
                let t = EnhanceDuel.apply(state, action, actor)?;
                (SessionState::EnhanceDuel(t.state), t.events)
            }
        };

        let mut next_seq = self.next_seq;
        for event in &mut events {
            event.seq = next_seq;
            next_seq += 1;
        }
        debug!(%actor, kind = %action.kind, events = events.len(), next_seq, "session advanced");

        Ok(Step {
            session: Session { state, next_seq },
            events,
        })
    }

    #[must_use]
    pub fn current_actor(&self) -> Option<ActorId> {
        dispatch!(&self.state, plugin, state => plugin.current_actor(state))
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        dispatch!(&self.state, plugin, state => plugin.is_terminal(state))
    }

    #[must_use]
    pub fn result(&self) -> Option<Outcome> {
        dispatch!(&self.state, plugin, state => plugin.result(state))
    }

    #[must_use]
    pub fn public_view(&self) -> PublicView {
        match &self.state {
            SessionState::Settlers(state) => PublicView::Settlers(Settlers.public_view(state)),
            SessionState::Holdem(state) => PublicView::Holdem(Holdem.public_view(state)),
            SessionState::WeaponDuel(state) => PublicView::WeaponDuel(WeaponDuel.public_view(state)),
            SessionState::EnhanceDuel(state) => PublicView::EnhanceDuel(EnhanceDuel.public_view(state)),
        }
    }

    #[must_use]
    pub fn player_view(&self, actor: &ActorId) -> PlayerView {
        match &self.state {
            SessionState::Settlers(state) => PlayerView::Settlers(Settlers.player_view(state, actor)),
            SessionState::Holdem(state) => PlayerView::Holdem(Holdem.player_view(state, actor)),
            SessionState::WeaponDuel(state) => {
                PlayerView::WeaponDuel(WeaponDuel.player_view(state, actor))
            }
            SessionState::EnhanceDuel(state) => {
                PlayerView::EnhanceDuel(EnhanceDuel.player_view(state, actor))
            }
        }
    }

    /// Action to submit for `actor` when their clock runs out.
    #[must_use]
    pub fn timeout_action(&self, actor: &ActorId) -> Option<Action> {
        dispatch!(&self.state, plugin, state => plugin.timeout_action(state, actor))
    }

    /// Move suggestion for a computer-controlled seat.
    #[must_use]
    pub fn suggest_action(&self, actor: &ActorId) -> Option<Action> {
        dispatch!(&self.state, plugin, state => plugin.suggest_action(state, actor))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, EngineError> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EngineError> {
        Ok(bincode::deserialize(bytes)?)
    }

    pub fn to_json(&self) -> Result<String, EngineError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, EngineError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Decode a persisted blob, apply one action and re-encode.
pub fn handle(blob: &[u8], action: &Action, actor: &ActorId) -> Result<(Vec<u8>, Vec<GameEvent>), SessionError> {
    let session = Session::from_bytes(blob)?;
    let step = session.submit(action, actor)?;
    Ok((step.session.to_bytes()?, step.events))
}
