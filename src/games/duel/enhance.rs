//! Stake duel between two enhanced weapons.
//!
//! Both sides pick a stance each round: strong beats quick, quick beats
//! precise, precise beats strong. Defending sits outside the cycle and
//! softens the incoming blow, sometimes arming a counter for the next
//! attack. Neither the committed stance nor an armed counter is ever shown
//! to the opponent.
//!
//! Weapon stats derive from type, grade and enhancement level. The winner
//! of a knockout is paid the loser's weapon sale price.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::combat::{trim_log, Element, ElementChart, Grade, LogEntry, LogKind, WeaponKind};
use crate::core::{
    parse_config, seat_roster, Action, ActorId, EngineError, GameEvent, GameRng, Participant,
    RandomSource, Rejection, Roster, Seat, SeatMap,
};
use crate::rules::{GameInfo, GamePlugin, Outcome, Transition};

const MATCHUP_ADVANTAGE: f64 = 1.3;
const MATCHUP_DISADVANTAGE: f64 = 0.7;
const ELEMENT_ADVANTAGE: f64 = 1.2;
const ELEMENT_DISADVANTAGE: f64 = 0.8;
/// Percent chance that a defensive stance fully guards and arms a counter.
const GUARD_CHANCE: u32 = 60;
const PARTIAL_GUARD: f64 = 0.75;
const COUNTER_CRIT_BONUS: u32 = 20;
const COUNTER_CRIT_CAP: u32 = 80;
const COUNTER_FACTOR: f64 = 1.3;
const LIFESTEAL_RATIO: f64 = 0.15;
const LOG_TAIL: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stance {
    Strong,
    Quick,
    Precise,
    Defend,
}

impl Stance {
    #[must_use]
    pub fn beats(self, other: Stance) -> bool {
        matches!(
            (self, other),
            (Stance::Strong, Stance::Quick) | (Stance::Quick, Stance::Precise) | (Stance::Precise, Stance::Strong)
        )
    }

    /// Damage multiplier for an attack in `self` against `defender`.
    fn matchup(self, defender: Stance) -> f64 {
        if self.beats(defender) {
            MATCHUP_ADVANTAGE
        } else if defender.beats(self) {
            MATCHUP_DISADVANTAGE
        } else {
            1.0
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EnhanceMove {
    Strong,
    Quick,
    Precise,
    Defend,
}

impl EnhanceMove {
    #[must_use]
    pub fn stance(&self) -> Stance {
        match self {
            EnhanceMove::Strong => Stance::Strong,
            EnhanceMove::Quick => Stance::Quick,
            EnhanceMove::Precise => Stance::Precise,
            EnhanceMove::Defend => Stance::Defend,
        }
    }
}

/// A weapon as stored in the host's inventory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EnhancedWeapon {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: WeaponKind,
    pub grade: Grade,
    pub element: Element,
    /// Enhancement level.
    pub level: u32,
}

impl Default for EnhancedWeapon {
    fn default() -> Self {
        Self {
            name: "Basic Sword".into(),
            kind: WeaponKind::Sword,
            grade: Grade::Common,
            element: Element::None,
            level: 0,
        }
    }
}

/// Combat numbers derived from an [`EnhancedWeapon`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeaponStats {
    pub damage_min: u32,
    pub damage_max: u32,
    pub crit_chance: u32,
    pub crit_damage: u32,
    pub max_hp: u32,
    pub sale_price: u32,
}

impl EnhancedWeapon {
    /// Damage and crit multipliers by weapon type.
    fn type_bonus(&self) -> (f64, f64) {
        match self.kind {
            WeaponKind::Sword | WeaponKind::Wand => (1.0, 1.0),
            WeaponKind::Axe => (1.15, 0.9),
            WeaponKind::Spear => (0.95, 1.1),
            WeaponKind::Hammer => (1.2, 0.85),
            WeaponKind::Dagger => (0.85, 1.25),
            WeaponKind::Staff => (0.9, 1.0),
            WeaponKind::Katana => (1.05, 1.15),
            WeaponKind::Scythe => (1.1, 1.05),
        }
    }

    /// Stat multiplier and base sale price by grade. Mythic weapons are not
    /// traded here and fall back to common.
    fn grade_bonus(&self) -> (f64, u32) {
        match self.grade {
            Grade::Common | Grade::Mythic => (1.0, 100),
            Grade::Magic => (1.3, 500),
            Grade::Rare => (1.7, 2000),
            Grade::Legendary => (2.2, 10_000),
            Grade::Unique => (3.0, 50_000),
        }
    }

    #[must_use]
    pub fn stats(&self) -> WeaponStats {
        let (type_damage, type_crit) = self.type_bonus();
        let (grade, base_price) = self.grade_bonus();
        let level = f64::from(self.level);
        let floor = |value: f64| value.max(0.0).floor() as u32;

        WeaponStats {
            damage_min: floor((10.0 + level * 5.0) * grade * type_damage),
            damage_max: floor((15.0 + level * 5.0) * grade * type_damage),
            crit_chance: floor((5.0 + level * 2.0) * type_crit).min(60),
            crit_damage: self.level.saturating_mul(5).saturating_add(150),
            max_hp: floor((100.0 + level * 20.0) * grade),
            sale_price: self.level.saturating_mul(200).saturating_add(base_price),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EnhanceDuelConfig {
    pub weapons: BTreeMap<ActorId, EnhancedWeapon>,
}

impl EnhanceDuelConfig {
    pub fn with_weapon(mut self, actor: impl Into<ActorId>, weapon: EnhancedWeapon) -> Self {
        self.weapons.insert(actor.into(), weapon);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Duelist {
    pub weapon: EnhancedWeapon,
    pub stats: WeaponStats,
    pub hp: u32,
    pub stance: Option<Stance>,
    pub counter_ready: bool,
}

/// How a defensive stance met an attack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Guard {
    /// Halved, counter armed.
    Full,
    Partial,
}

/// One attack within a round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Strike {
    pub attacker: Seat,
    pub damage: u32,
    pub crit: bool,
    pub counter: bool,
    pub stance_advantage: bool,
    pub element_advantage: bool,
    pub guard: Option<Guard>,
    pub healed: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnhanceRound {
    pub round: u32,
    pub stances: [Stance; 2],
    pub strikes: Vec<Strike>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnhanceDuelState {
    pub(crate) roster: Roster,
    pub(crate) duelists: SeatMap<Duelist>,
    pub(crate) round: u32,
    pub(crate) log: im::Vector<LogEntry>,
    pub(crate) last_round: Option<EnhanceRound>,
    pub(crate) finished: bool,
    pub(crate) winner: Option<Seat>,
    pub(crate) rng: GameRng,
}

impl EnhanceDuelState {
    #[must_use]
    pub fn duelist(&self, seat: Seat) -> Option<&Duelist> {
        self.duelists.get(seat)
    }

    #[must_use]
    pub fn round(&self) -> u32 {
        self.round
    }

    #[must_use]
    pub fn last_round(&self) -> Option<&EnhanceRound> {
        self.last_round.as_ref()
    }

    /// Sale price paid to the winner, once decided.
    #[must_use]
    pub fn prize(&self) -> Option<u32> {
        let winner = self.winner?;
        let loser = winner.offset(1, 2);
        Some(self.duelists[loser].stats.sale_price)
    }

    fn nickname(&self, seat: Seat) -> String {
        self.roster
            .participant(seat)
            .map_or_else(|| seat.to_string(), |p| p.nickname.clone())
    }

    fn check(&self, actor: &ActorId) -> Result<Seat, Rejection> {
        if self.finished {
            return Err(Rejection::game_over());
        }
        let seat = self.roster.seat_of(actor).ok_or_else(Rejection::not_participant)?;
        if self.duelists[seat].stance.is_some() {
            return Err(Rejection::wrong_phase("stance already chosen this round"));
        }
        Ok(seat)
    }

    fn stances(&self) -> Option<[Stance; 2]> {
        Some([
            self.duelists[Seat::new(0)].stance?,
            self.duelists[Seat::new(1)].stance?,
        ])
    }

    fn strike(&mut self, attacker: Seat, stances: [Stance; 2], defending: &mut [bool; 2]) -> Strike {
        let defender = attacker.offset(1, 2);
        let (a, d) = (attacker.index(), defender.index());

        let counter = std::mem::take(&mut self.duelists[attacker].counter_ready);
        let stats = self.duelists[attacker].stats;
        let base = self.rng.between(stats.damage_min, stats.damage_max);
        let crit_chance = if counter {
            stats.crit_chance.saturating_add(COUNTER_CRIT_BONUS).min(COUNTER_CRIT_CAP)
        } else {
            stats.crit_chance
        };
        let crit = self.rng.percent(crit_chance);

        let mut damage = if crit {
            u32::try_from(u64::from(base) * u64::from(stats.crit_damage) / 100).unwrap_or(u32::MAX)
        } else {
            base
        };
        if counter {
            damage = (f64::from(damage) * COUNTER_FACTOR).floor() as u32;
        }

        let stance_factor = stances[a].matchup(stances[d]);
        let element_factor = ElementChart::Enhance.factor(
            self.duelists[attacker].weapon.element,
            self.duelists[defender].weapon.element,
            ELEMENT_ADVANTAGE,
            ELEMENT_DISADVANTAGE,
        );
        let mut dealt = (f64::from(damage) * stance_factor * element_factor).floor() as u32;

        let guard = if std::mem::take(&mut defending[d]) {
            if self.rng.percent(GUARD_CHANCE) {
                dealt /= 2;
                self.duelists[defender].counter_ready = true;
                Some(Guard::Full)
            } else {
                dealt = (f64::from(dealt) * PARTIAL_GUARD).floor() as u32;
                Some(Guard::Partial)
            }
        } else {
            None
        };

        let target = &mut self.duelists[defender];
        target.hp = target.hp.saturating_sub(dealt);

        let source = &mut self.duelists[attacker];
        let mut healed = 0;
        if source.weapon.element == Element::Lifesteal {
            let before = source.hp;
            let heal = (f64::from(dealt) * LIFESTEAL_RATIO).floor() as u32;
            source.hp = source.hp.saturating_add(heal).min(source.stats.max_hp);
            healed = source.hp - before;
        }

        Strike {
            attacker,
            damage: dealt,
            crit,
            counter,
            stance_advantage: stance_factor > 1.0,
            element_advantage: element_factor > 1.0,
            guard,
            healed,
        }
    }

    fn resolve_round(&mut self, events: &mut Vec<GameEvent>) -> Result<(), EngineError> {
        let stances = self
            .stances()
            .ok_or_else(|| EngineError::invariant("round resolved before both stances"))?;
        self.round += 1;
        let names = [self.nickname(Seat::new(0)), self.nickname(Seat::new(1))];

        self.log.push_back(LogEntry::new(
            LogKind::Info,
            format!(
                "Round {}: {} {} vs {} {}",
                self.round,
                names[0],
                stance_name(stances[0]),
                names[1],
                stance_name(stances[1])
            ),
        ));

        // Stances are raised before anyone swings.
        let mut defending = stances.map(|s| s == Stance::Defend);
        let mut strikes = Vec::with_capacity(2);
        for attacker in [Seat::new(0), Seat::new(1)] {
            if stances[attacker.index()] == Stance::Defend {
                let text = format!("{} raises a guard", names[attacker.index()]);
                self.log.push_back(LogEntry::new(LogKind::Info, text));
                continue;
            }
            let strike = self.strike(attacker, stances, &mut defending);
            self.log.push_back(strike_entry(&strike, &names));
            strikes.push(strike);
        }

        for duelist in self.duelists.values_mut() {
            duelist.stance = None;
        }

        let hp = [self.duelists[Seat::new(0)].hp, self.duelists[Seat::new(1)].hp];
        let by_actor: BTreeMap<&ActorId, u32> = self
            .roster
            .iter()
            .map(|(seat, p)| (&p.id, hp[seat.index()]))
            .collect();
        let hits: Vec<Value> = strikes
            .iter()
            .map(|s| {
                json!({
                    "attackerId": self.roster.actor(s.attacker),
                    "damage": s.damage,
                    "crit": s.crit,
                    "counter": s.counter,
                    "guard": s.guard,
                })
            })
            .collect();
        events.push(GameEvent::new("round_resolved").with_payload(json!({
            "round": self.round,
            "stances": stances,
            "hits": hits,
            "hp": by_actor,
        })));

        self.last_round = Some(EnhanceRound {
            round: self.round,
            stances,
            strikes,
        });

        if hp.contains(&0) {
            self.finish(hp, &names, events);
        }
        Ok(())
    }

    fn finish(&mut self, hp: [u32; 2], names: &[String; 2], events: &mut Vec<GameEvent>) {
        self.finished = true;
        self.winner = match hp {
            [0, 0] => None,
            [0, _] => Some(Seat::new(1)),
            _ => Some(Seat::new(0)),
        };

        let Some(winner) = self.winner else {
            self.log.push_back(LogEntry::new(LogKind::Info, "Both weapons shatter"));
            info!(round = self.round, "enhance duel drawn");
            events.push(GameEvent::new("game_end").with_payload(json!({ "winnerId": null })));
            return;
        };
        let loser = winner.offset(1, 2);
        let prize = self.duelists[loser].stats.sale_price;
        self.log.push_back(LogEntry::new(
            LogKind::Success,
            format!("{} wins {} gold", names[winner.index()], prize),
        ));
        info!(winner = %names[winner.index()], prize, "enhance duel finished");
        events.push(GameEvent::new("game_end").with_payload(json!({
            "winnerId": self.roster.actor(winner),
            "loserId": self.roster.actor(loser),
            "prize": prize,
        })));
    }
}

fn stance_name(stance: Stance) -> &'static str {
    match stance {
        Stance::Strong => "strong",
        Stance::Quick => "quick",
        Stance::Precise => "precise",
        Stance::Defend => "defend",
    }
}

fn strike_entry(strike: &Strike, names: &[String; 2]) -> LogEntry {
    let a = strike.attacker.index();
    let mut text = match (strike.counter, strike.crit) {
        (true, true) => format!("{} lands a critical counter", names[a]),
        (true, false) => format!("{} counters", names[a]),
        (false, true) => format!("{} lands a critical hit", names[a]),
        (false, false) => format!("{} hits", names[a]),
    };
    text.push_str(&format!(" for {}", strike.damage));
    if strike.stance_advantage {
        text.push_str(", stance advantage");
    }
    if strike.element_advantage {
        text.push_str(", element advantage");
    }
    match strike.guard {
        Some(Guard::Full) => text.push_str(", guarded"),
        Some(Guard::Partial) => text.push_str(", partly guarded"),
        None => {}
    }
    if strike.healed > 0 {
        text.push_str(&format!(", drains {}", strike.healed));
    }
    let kind = if strike.crit { LogKind::Crit } else { LogKind::Damage };
    LogEntry::new(kind, text)
}

pub struct EnhanceDuel;

impl EnhanceDuel {
    pub fn new_game(
        &self,
        participants: &[Participant],
        config: EnhanceDuelConfig,
        seed: u64,
    ) -> Result<EnhanceDuelState, EngineError> {
        let info = self.info();
        let roster = seat_roster(participants, info.min_players, info.max_players)?;

        let weapons: Vec<EnhancedWeapon> = roster
            .iter()
            .map(|(_, p)| config.weapons.get(&p.id).cloned().unwrap_or_default())
            .collect();
        let duelists = SeatMap::new(weapons.len(), |seat| {
            let weapon = weapons[seat.index()].clone();
            let stats = weapon.stats();
            Duelist {
                weapon,
                stats,
                hp: stats.max_hp,
                stance: None,
                counter_ready: false,
            }
        });

        info!(seed, "enhance duel started");
        Ok(EnhanceDuelState {
            roster,
            duelists,
            round: 0,
            log: im::vector![LogEntry::new(LogKind::Info, "Battle start")],
            last_round: None,
            finished: false,
            winner: None,
            rng: GameRng::new(seed),
        })
    }
}

impl GamePlugin for EnhanceDuel {
    type State = EnhanceDuelState;
    type PublicView = EnhancePublicView;
    type PlayerView = EnhancePlayerView;

    fn info(&self) -> GameInfo {
        GameInfo {
            id: "enhance_duel",
            name: "Enhanced Weapon Battle",
            min_players: 2,
            max_players: 2,
        }
    }

    fn initialize(
        &self,
        participants: &[Participant],
        config: &Value,
        seed: u64,
    ) -> Result<EnhanceDuelState, EngineError> {
        self.new_game(participants, parse_config(config)?, seed)
    }

    fn validate(&self, state: &EnhanceDuelState, action: &Action, actor: &ActorId) -> Result<(), Rejection> {
        let _: EnhanceMove = action.decode()?;
        state.check(actor).map(|_| ())
    }

    fn apply(
        &self,
        state: &EnhanceDuelState,
        action: &Action,
        actor: &ActorId,
    ) -> Result<Transition<EnhanceDuelState>, EngineError> {
        let mv: EnhanceMove = action.decode().map_err(EngineError::Unvalidated)?;
        let seat = state.check(actor).map_err(|rejection| {
            warn!(%actor, kind = %action.kind, reason = %rejection, "apply on a refused action");
            EngineError::Unvalidated(rejection)
        })?;

        let mut next = state.clone();
        let mut events = vec![GameEvent::new("action_selected").with_actor(actor)];
        next.duelists[seat].stance = Some(mv.stance());
        let text = format!("{} is ready", next.nickname(seat));
        next.log.push_back(LogEntry::new(LogKind::Info, text));

        if next.stances().is_some() {
            next.resolve_round(&mut events)?;
        }
        trim_log(&mut next.log);

        debug!(%actor, round = next.round, finished = next.finished, "enhance duel action applied");
        Ok(Transition::new(next, events))
    }

    fn current_actor(&self, _state: &EnhanceDuelState) -> Option<ActorId> {
        None
    }

    fn is_terminal(&self, state: &EnhanceDuelState) -> bool {
        state.finished
    }

    fn result(&self, state: &EnhanceDuelState) -> Option<Outcome> {
        if !state.finished {
            return None;
        }
        let Some(winner) = state.winner else {
            return Some(Outcome::draw("double knockout"));
        };
        let prize = state.prize().unwrap_or(0);
        let scores = state
            .roster
            .iter()
            .map(|(seat, p)| (p.id.clone(), if seat == winner { i64::from(prize) } else { 0 }))
            .collect();
        let actor = state.roster.actor(winner)?.clone();
        Some(Outcome::winner(actor, "knockout").with_scores(scores))
    }

    fn public_view(&self, state: &EnhanceDuelState) -> EnhancePublicView {
        EnhancePublicView::build(state)
    }

    fn player_view(&self, state: &EnhanceDuelState, actor: &ActorId) -> EnhancePlayerView {
        let own = state.roster.seat_of(actor).and_then(|seat| state.duelists.get(seat));
        EnhancePlayerView {
            public: EnhancePublicView::build(state),
            my_stance: own.and_then(|d| d.stance),
            counter_ready: own.is_some_and(|d| d.counter_ready),
        }
    }

    fn timeout_action(&self, state: &EnhanceDuelState, actor: &ActorId) -> Option<Action> {
        state.check(actor).ok()?;
        Action::encode(&EnhanceMove::Defend).ok()
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuelistView {
    pub id: ActorId,
    pub nickname: String,
    pub hp: u32,
    pub weapon: EnhancedWeapon,
    pub stats: WeaponStats,
    pub has_selected: bool,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancePublicView {
    pub round: u32,
    pub duelists: Vec<DuelistView>,
    pub last_round: Option<EnhanceRound>,
    pub log: Vec<LogEntry>,
    pub finished: bool,
    pub winner: Option<ActorId>,
    pub prize: Option<u32>,
}

impl EnhancePublicView {
    fn build(state: &EnhanceDuelState) -> Self {
        let duelists = state
            .roster
            .iter()
            .map(|(seat, p)| {
                let d = &state.duelists[seat];
                DuelistView {
                    id: p.id.clone(),
                    nickname: p.nickname.clone(),
                    hp: d.hp,
                    weapon: d.weapon.clone(),
                    stats: d.stats,
                    has_selected: d.stance.is_some(),
                }
            })
            .collect();
        let skip = state.log.len().saturating_sub(LOG_TAIL);

        Self {
            round: state.round,
            duelists,
            last_round: state.last_round.clone(),
            log: state.log.iter().skip(skip).cloned().collect(),
            finished: state.finished,
            winner: state.winner.and_then(|seat| state.roster.actor(seat).cloned()),
            prize: state.prize(),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancePlayerView {
    #[serde(flatten)]
    pub public: EnhancePublicView,
    pub my_stance: Option<Stance>,
    pub counter_ready: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::RejectionKind;
    use crate::games::duel::combat::LOG_CAPACITY;

    fn duelists() -> Vec<Participant> {
        vec![Participant::new("a", "Ann"), Participant::new("b", "Bo")]
    }

    fn start() -> EnhanceDuelState {
        EnhanceDuel.new_game(&duelists(), EnhanceDuelConfig::default(), 3).unwrap()
    }

    fn act(state: &EnhanceDuelState, actor: &str, mv: EnhanceMove) -> Transition<EnhanceDuelState> {
        let action = Action::encode(&mv).unwrap();
        EnhanceDuel.apply(state, &action, &ActorId::from(actor)).unwrap()
    }

    fn round(state: &EnhanceDuelState, a: EnhanceMove, b: EnhanceMove) -> Transition<EnhanceDuelState> {
        let first = act(state, "a", a);
        act(&first.state, "b", b)
    }

    #[test]
    fn test_stance_cycle() {
        assert!(Stance::Strong.beats(Stance::Quick));
        assert!(Stance::Quick.beats(Stance::Precise));
        assert!(Stance::Precise.beats(Stance::Strong));
        assert!(!Stance::Strong.beats(Stance::Defend));
        assert_eq!(Stance::Quick.matchup(Stance::Strong), MATCHUP_DISADVANTAGE);
        assert_eq!(Stance::Strong.matchup(Stance::Defend), 1.0);
    }

    #[test]
    fn test_weapon_stats() {
        let basic = EnhancedWeapon::default().stats();
        assert_eq!(
            basic,
            WeaponStats {
                damage_min: 10,
                damage_max: 15,
                crit_chance: 5,
                crit_damage: 150,
                max_hp: 100,
                sale_price: 100,
            }
        );

        let axe = EnhancedWeapon {
            kind: WeaponKind::Axe,
            grade: Grade::Rare,
            level: 2,
            ..EnhancedWeapon::default()
        }
        .stats();
        // (10 + 10) * 1.7 * 1.15 = 39.1; (15 + 10) * 1.7 * 1.15 = 48.875
        assert_eq!(axe.damage_min, 39);
        assert_eq!(axe.damage_max, 48);
        // (5 + 4) * 0.9 = 8.1
        assert_eq!(axe.crit_chance, 8);
        assert_eq!(axe.crit_damage, 160);
        assert_eq!(axe.max_hp, 238);
        assert_eq!(axe.sale_price, 2400);

        let dagger = EnhancedWeapon {
            kind: WeaponKind::Dagger,
            level: 30,
            ..EnhancedWeapon::default()
        };
        assert_eq!(dagger.stats().crit_chance, 60);
    }

    #[test]
    fn test_extreme_level_saturates() {
        let huge = EnhancedWeapon {
            level: u32::MAX,
            ..EnhancedWeapon::default()
        };
        let stats = huge.stats();
        assert_eq!(stats.crit_damage, u32::MAX);
        assert_eq!(stats.sale_price, u32::MAX);
        assert_eq!(stats.max_hp, u32::MAX);

        let config = EnhanceDuelConfig::default()
            .with_weapon("a", huge.clone())
            .with_weapon("b", huge);
        let state = EnhanceDuel.new_game(&duelists(), config, 6).unwrap();
        let t = round(&state, EnhanceMove::Strong, EnhanceMove::Strong);
        assert!(EnhanceDuel.is_terminal(&t.state));
        assert!(EnhanceDuel.result(&t.state).unwrap().is_draw());
    }

    #[test]
    fn test_stance_hidden_until_resolution() {
        let t = act(&start(), "a", EnhanceMove::Defend);
        let public = serde_json::to_value(EnhanceDuel.public_view(&t.state)).unwrap();
        assert_eq!(public["duelists"][0]["hasSelected"], true);
        assert!(!public.to_string().contains("defend"));

        let mine = EnhanceDuel.player_view(&t.state, &ActorId::from("a"));
        assert_eq!(mine.my_stance, Some(Stance::Defend));
        let theirs = EnhanceDuel.player_view(&t.state, &ActorId::from("b"));
        assert_eq!(theirs.my_stance, None);

        let err = EnhanceDuel
            .validate(&t.state, &Action::new("quick"), &ActorId::from("a"))
            .unwrap_err();
        assert_eq!(err.kind, RejectionKind::WrongPhase);
    }

    #[test]
    fn test_guard_reduces_damage() {
        let t = round(&start(), EnhanceMove::Strong, EnhanceMove::Defend);
        let last = t.state.last_round().unwrap();
        assert_eq!(last.strikes.len(), 1);
        let strike = &last.strikes[0];
        assert!(strike.guard.is_some());
        // A basic sword never exceeds 22 on a crit; any guard at least trims it.
        assert!(strike.damage <= 16);
        let b = t.state.duelist(Seat::new(1)).unwrap();
        assert_eq!(b.hp, 100 - strike.damage);
        assert_eq!(b.counter_ready, strike.guard == Some(Guard::Full));
        assert_eq!(b.stance, None);
    }

    #[test]
    fn test_counter_is_private_and_consumed() {
        let mut state = start();
        state.duelists[Seat::new(1)].counter_ready = true;
        let view = EnhanceDuel.player_view(&state, &ActorId::from("b"));
        assert!(view.counter_ready);
        assert!(!EnhanceDuel.player_view(&state, &ActorId::from("a")).counter_ready);

        let t = round(&state, EnhanceMove::Defend, EnhanceMove::Quick);
        let strike = &t.state.last_round().unwrap().strikes[0];
        assert!(strike.counter);
        assert!(!t.state.duelist(Seat::new(1)).unwrap().counter_ready);
        assert_eq!(
            t.state.duelist(Seat::new(0)).unwrap().counter_ready,
            strike.guard == Some(Guard::Full)
        );
    }

    #[test]
    fn test_both_defend_is_quiet() {
        let t = round(&start(), EnhanceMove::Defend, EnhanceMove::Defend);
        assert!(t.state.last_round().unwrap().strikes.is_empty());
        assert_eq!(t.state.duelist(Seat::new(0)).unwrap().hp, 100);
        assert_eq!(t.state.round(), 1);
    }

    #[test]
    fn test_lifesteal_heals() {
        let config = EnhanceDuelConfig::default().with_weapon(
            "a",
            EnhancedWeapon {
                element: Element::Lifesteal,
                ..EnhancedWeapon::default()
            },
        );
        let mut state = EnhanceDuel.new_game(&duelists(), config, 8).unwrap();
        state.duelists[Seat::new(0)].hp = 50;
        let t = round(&state, EnhanceMove::Strong, EnhanceMove::Defend);
        let strike = &t.state.last_round().unwrap().strikes[0];
        assert_eq!(strike.healed, (f64::from(strike.damage) * LIFESTEAL_RATIO).floor() as u32);
        assert_eq!(t.state.duelist(Seat::new(0)).unwrap().hp, 50 + strike.healed);
    }

    #[test]
    fn test_knockout_pays_sale_price() {
        let config = EnhanceDuelConfig::default().with_weapon(
            "b",
            EnhancedWeapon {
                grade: Grade::Legendary,
                level: 1,
                ..EnhancedWeapon::default()
            },
        );
        let mut state = EnhanceDuel.new_game(&duelists(), config, 2).unwrap();
        state.duelists[Seat::new(1)].hp = 1;
        let t = round(&state, EnhanceMove::Strong, EnhanceMove::Defend);
        assert!(EnhanceDuel.is_terminal(&t.state));

        let outcome = EnhanceDuel.result(&t.state).unwrap();
        assert!(outcome.is_winner(&ActorId::from("a")));
        assert_eq!(outcome.scores.unwrap()[&ActorId::from("a")], 10_200);
        assert!(t.events.iter().any(|e| e.is("game_end") && e.payload["prize"] == 10_200));
    }

    #[test]
    fn test_double_knockout_is_draw() {
        let mut state = start();
        state.duelists[Seat::new(0)].hp = 1;
        state.duelists[Seat::new(1)].hp = 1;
        let t = round(&state, EnhanceMove::Quick, EnhanceMove::Quick);
        assert!(EnhanceDuel.result(&t.state).unwrap().is_draw());
        assert_eq!(EnhanceDuel.public_view(&t.state).prize, None);
    }

    #[test]
    fn test_timeout_defends() {
        let state = start();
        assert_eq!(
            EnhanceDuel.timeout_action(&state, &ActorId::from("a")),
            Some(Action::new("defend"))
        );
        assert_eq!(EnhanceDuel.timeout_action(&state, &ActorId::from("x")), None);
    }

    #[test]
    fn test_stored_log_is_capped() {
        let mut state = start();
        for _ in 0..30 {
            state = round(&state, EnhanceMove::Defend, EnhanceMove::Defend).state;
        }
        assert_eq!(state.log.len(), LOG_CAPACITY);
        assert_eq!(state.round(), 30);
    }

    #[test]
    fn test_state_bincode_round_trip() {
        let state = round(&start(), EnhanceMove::Precise, EnhanceMove::Strong).state;
        let bytes = bincode::serialize(&state).unwrap();
        let restored: EnhanceDuelState = bincode::deserialize(&bytes).unwrap();
        assert_eq!(state, restored);
    }
}
