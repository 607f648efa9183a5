//! The closed set of games a session can host.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::EngineError;
use crate::games::duel::{EnhanceDuel, EnhanceDuelConfig, WeaponDuel, WeaponDuelConfig};
use crate::games::holdem::{Holdem, HoldemConfig};
use crate::games::settlers::{Settlers, SettlersConfig};
use crate::rules::{GameInfo, GamePlugin};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameKind {
    Settlers,
    Holdem,
    WeaponDuel,
    EnhanceDuel,
}

impl GameKind {
    pub const ALL: [GameKind; 4] = [
        GameKind::Settlers,
        GameKind::Holdem,
        GameKind::WeaponDuel,
        GameKind::EnhanceDuel,
    ];

    /// Look a game up by its registry id.
    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.info().id == id)
    }

    /// Like [`from_id`](Self::from_id), failing with [`EngineError::UnknownGame`].
    pub fn lookup(id: &str) -> Result<Self, EngineError> {
        Self::from_id(id).ok_or_else(|| EngineError::UnknownGame(id.to_owned()))
    }

    #[must_use]
    pub fn info(self) -> GameInfo {
        match self {
            GameKind::Settlers => Settlers.info(),
            GameKind::Holdem => Holdem.info(),
            GameKind::WeaponDuel => WeaponDuel.info(),
            GameKind::EnhanceDuel => EnhanceDuel.info(),
        }
    }

    /// Every configuration key with its default value.
    pub fn default_config(self) -> Result<Value, EngineError> {
        let config = match self {
            GameKind::Settlers => serde_json::to_value(SettlersConfig::default()),
            GameKind::Holdem => serde_json::to_value(HoldemConfig::default()),
            GameKind::WeaponDuel => serde_json::to_value(WeaponDuelConfig::default()),
            GameKind::EnhanceDuel => serde_json::to_value(EnhanceDuelConfig::default()),
        };
        Ok(config?)
    }
}

/// Metadata for every hosted game, in registry order.
#[must_use]
pub fn catalog() -> Vec<GameInfo> {
    GameKind::ALL.into_iter().map(GameKind::info).collect()
}
