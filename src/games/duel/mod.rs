//! Simultaneous-selection duels.
//!
//! - [`weapon`]: attack/defense/skill triangle with a rage gauge, ultimates
//!   and pattern reads. Round math lives in [`resolver`].
//! - [`enhance`]: stance duel between enhanced weapons with a hidden guard
//!   and counters, paying out the loser's sale price.
//!
//! Both share the attribute enums and element charts in [`combat`].

pub mod combat;
pub mod enhance;
pub mod resolver;
pub mod weapon;

pub use combat::{Element, ElementChart, Grade, LogEntry, LogKind, WeaponKind};
pub use enhance::{EnhanceDuel, EnhanceDuelConfig, EnhanceDuelState, EnhanceMove, EnhancedWeapon, Stance};
pub use resolver::{resolve, BaseAction, Choice, Combatant, Decision, DuelTuning, RoundReport, Ultimate};
pub use weapon::{DuelMove, WeaponDuel, WeaponDuelConfig, WeaponDuelState, WeaponSpec};
