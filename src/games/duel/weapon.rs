//! Two-player weapon duel with simultaneous selection.
//!
//! Each round both sides commit a base action or an ultimate. Nothing is
//! revealed until the second commitment arrives; the round then resolves
//! through [`super::resolver::resolve`] and the commitments clear. The duel
//! ends when either side's health reaches zero.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::combat::{is_awakened, trim_log, Element, Grade, LogEntry, LogKind, WeaponKind};
use super::resolver::{resolve, BaseAction, Choice, Combatant, Decision, DuelTuning, RoundReport, Ultimate, Weapon};
use crate::core::{
    parse_config, seat_roster, Action, ActorId, EngineError, GameEvent, GameRng, Participant,
    Rejection, Roster, Seat, SeatMap,
};
use crate::rules::{GameInfo, GamePlugin, Outcome, Transition};

/// Log lines kept in the public view.
const LOG_TAIL: usize = 10;

/// History entries shown per fighter.
const HISTORY_SHOWN: usize = 3;

/// One actor's weapon as configured by the host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WeaponSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: WeaponKind,
    pub grade: Grade,
    pub element: Element,
    pub level: u32,
    pub damage_min: u32,
    pub damage_max: u32,
    /// Defaults to `100 + 20 * level`.
    pub hp: Option<u32>,
    pub crit_chance: u32,
    pub crit_damage: u32,
}

impl Default for WeaponSpec {
    fn default() -> Self {
        Self {
            name: "Basic Weapon".into(),
            kind: WeaponKind::Sword,
            grade: Grade::Common,
            element: Element::None,
            level: 0,
            damage_min: 5,
            damage_max: 8,
            hp: None,
            crit_chance: 5,
            crit_damage: 150,
        }
    }
}

impl WeaponSpec {
    #[must_use]
    pub fn max_hp(&self) -> u32 {
        self.hp
            .unwrap_or_else(|| self.level.saturating_mul(20).saturating_add(100))
    }

    fn check(&self) -> Result<(), EngineError> {
        if self.damage_min > self.damage_max {
            return Err(EngineError::Setting(format!(
                "{}: damageMin exceeds damageMax",
                self.name
            )));
        }
        if self.max_hp() == 0 {
            return Err(EngineError::Setting(format!("{}: hp must be positive", self.name)));
        }
        Ok(())
    }

    fn weapon(&self) -> Weapon {
        Weapon {
            name: self.name.clone(),
            kind: self.kind,
            grade: self.grade,
            element: self.element,
            level: self.level,
            damage_min: self.damage_min,
            damage_max: self.damage_max,
            crit_chance: self.crit_chance,
            crit_damage: self.crit_damage,
        }
    }
}

/// Session configuration. Actors without an entry in `weapons` get the
/// default weapon.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WeaponDuelConfig {
    pub weapons: BTreeMap<ActorId, WeaponSpec>,
    pub tuning: DuelTuning,
}

impl WeaponDuelConfig {
    pub fn with_weapon(mut self, actor: impl Into<ActorId>, spec: WeaponSpec) -> Self {
        self.weapons.insert(actor.into(), spec);
        self
    }

    pub fn with_tuning(mut self, tuning: DuelTuning) -> Self {
        self.tuning = tuning;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DuelMove {
    Attack,
    Defense,
    Skill,
    Ultimate { ultimate: Ultimate },
}

impl DuelMove {
    #[must_use]
    pub fn choice(&self) -> Choice {
        match *self {
            DuelMove::Attack => Choice::Base(BaseAction::Attack),
            DuelMove::Defense => Choice::Base(BaseAction::Defense),
            DuelMove::Skill => Choice::Base(BaseAction::Skill),
            DuelMove::Ultimate { ultimate } => Choice::Ultimate(ultimate),
        }
    }
}

/// A resolved round as kept for the views.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResolvedRound {
    pub round: u32,
    pub choices: [Choice; 2],
    pub report: RoundReport,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeaponDuelState {
    pub(crate) roster: Roster,
    pub(crate) tuning: DuelTuning,
    pub(crate) fighters: SeatMap<Combatant>,
    /// Rounds resolved so far.
    pub(crate) round: u32,
    pub(crate) log: im::Vector<LogEntry>,
    pub(crate) last_round: Option<ResolvedRound>,
    pub(crate) finished: bool,
    pub(crate) winner: Option<Seat>,
    pub(crate) rng: GameRng,
}

impl WeaponDuelState {
    #[must_use]
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    #[must_use]
    pub fn fighter(&self, seat: Seat) -> Option<&Combatant> {
        self.fighters.get(seat)
    }

    #[must_use]
    pub fn round(&self) -> u32 {
        self.round
    }

    #[must_use]
    pub fn log(&self) -> &im::Vector<LogEntry> {
        &self.log
    }

    #[must_use]
    pub fn last_round(&self) -> Option<&ResolvedRound> {
        self.last_round.as_ref()
    }

    #[must_use]
    pub fn tuning(&self) -> &DuelTuning {
        &self.tuning
    }

    fn nickname(&self, seat: Seat) -> &str {
        self.roster.participant(seat).map_or("?", |p| p.nickname.as_str())
    }

    fn check(&self, mv: &DuelMove, actor: &ActorId) -> Result<Seat, Rejection> {
        if self.finished {
            return Err(Rejection::game_over());
        }
        let seat = self.roster.seat_of(actor).ok_or_else(Rejection::not_participant)?;
        let fighter = &self.fighters[seat];
        if fighter.committed.is_some() {
            return Err(Rejection::wrong_phase("action already selected this round"));
        }
        if matches!(mv, DuelMove::Ultimate { .. }) && fighter.gauge < self.tuning.gauge_max {
            return Err(Rejection::insufficient("gauge is not full"));
        }
        Ok(seat)
    }

    fn both_committed(&self) -> Option<[Choice; 2]> {
        Some([
            self.fighters[Seat::new(0)].committed?,
            self.fighters[Seat::new(1)].committed?,
        ])
    }

    fn resolve_round(&mut self, events: &mut Vec<GameEvent>) -> Result<(), EngineError> {
        let choices = self
            .both_committed()
            .ok_or_else(|| EngineError::invariant("round resolved before both commitments"))?;
        let report = {
            let sides = [&self.fighters[Seat::new(0)], &self.fighters[Seat::new(1)]];
            resolve(sides, choices, &self.tuning, &mut self.rng)
        };
        self.round += 1;

        let gauge_max = self.tuning.gauge_max;
        let threshold = self.tuning.awaken_threshold;
        let keep = self.tuning.pattern_length.max(HISTORY_SHOWN);
        let mut awakened_now = [false; 2];
        for (seat, fighter) in self.fighters.iter_mut() {
            let side = seat.index();
            if report.gauge_spent[side] {
                fighter.gauge = 0;
            }
            fighter.gauge = (fighter.gauge + report.gauge_gain[side]).min(gauge_max);
            fighter.hp = fighter.hp.saturating_add(report.heal[side]).min(fighter.max_hp);
            fighter.hp = fighter.hp.saturating_sub(report.damage[side]);

            let was_awakened = fighter.awakened;
            fighter.awakened = is_awakened(fighter.hp, fighter.max_hp, threshold);
            awakened_now[side] = fighter.awakened && !was_awakened;

            fighter.next_hit_bonus = report.armed_bonus[side].unwrap_or(1.0);
            if let Choice::Base(action) = choices[side] {
                fighter.record(action, keep);
            }
            fighter.committed = None;
        }

        self.write_log(&choices, &report, awakened_now);

        let by_actor = |values: [u32; 2]| -> BTreeMap<ActorId, u32> {
            self.roster
                .iter()
                .map(|(seat, p)| (p.id.clone(), values[seat.index()]))
                .collect()
        };
        let hp = [self.fighters[Seat::new(0)].hp, self.fighters[Seat::new(1)].hp];
        let picks: BTreeMap<&ActorId, Choice> = self
            .roster
            .iter()
            .map(|(seat, p)| (&p.id, choices[seat.index()]))
            .collect();
        events.push(GameEvent::new("round_resolved").with_payload(json!({
            "round": self.round,
            "choices": picks,
            "decision": report.decision,
            "damage": by_actor(report.damage),
            "hp": by_actor(hp),
        })));

        self.last_round = Some(ResolvedRound {
            round: self.round,
            choices,
            report,
        });

        if hp.contains(&0) {
            self.finish(hp, events);
        }
        Ok(())
    }

    fn write_log(&mut self, choices: &[Choice; 2], report: &RoundReport, awakened_now: [bool; 2]) {
        let names = [self.nickname(Seat::new(0)).to_owned(), self.nickname(Seat::new(1)).to_owned()];
        let mut lines = vec![LogEntry::new(
            LogKind::Info,
            format!(
                "Round {}: {} {} vs {} {}",
                self.round,
                names[0],
                choice_name(choices[0]),
                names[1],
                choice_name(choices[1])
            ),
        )];

        match report.decision {
            Some(Decision::PatternRead { winner }) => lines.push(LogEntry::new(
                LogKind::Crit,
                format!("{} read {}'s pattern", names[winner], names[1 - winner]),
            )),
            Some(Decision::UltimateClash) => {
                lines.push(LogEntry::new(LogKind::Crit, "Ultimates clash"));
            }
            Some(Decision::Ultimate { user, ultimate: Ultimate::Absolute }) => lines.push(
                LogEntry::new(LogKind::Info, format!("{} braces for the next strike", names[user])),
            ),
            _ => {}
        }

        for side in 0..2 {
            let target = 1 - side;
            if report.executed[side] {
                lines.push(LogEntry::new(
                    LogKind::Crit,
                    format!("{} executes {}", names[side], names[target]),
                ));
            } else if report.damage[target] > 0 {
                let (kind, verb) = if report.crit[side] {
                    (LogKind::Crit, "critically hits")
                } else {
                    (LogKind::Damage, "hits")
                };
                lines.push(LogEntry::new(
                    kind,
                    format!("{} {} {} for {}", names[side], verb, names[target], report.damage[target]),
                ));
            }
            if let Some(effect) = report.effects[side] {
                lines.push(LogEntry::new(LogKind::Crit, format!("{} triggers {}", names[side], effect.name())));
            }
            if report.heal[side] > 0 {
                lines.push(LogEntry::new(
                    LogKind::Success,
                    format!("{} recovers {}", names[side], report.heal[side]),
                ));
            }
            if awakened_now[side] {
                lines.push(LogEntry::new(LogKind::Crit, format!("{} awakens", names[side])));
            }
        }
        self.log.extend(lines);
    }

    fn finish(&mut self, hp: [u32; 2], events: &mut Vec<GameEvent>) {
        self.finished = true;
        self.winner = match hp {
            [0, 0] => None,
            [0, _] => Some(Seat::new(1)),
            _ => Some(Seat::new(0)),
        };
        let winner = self.winner.and_then(|seat| self.roster.actor(seat).cloned());
        match self.winner {
            Some(seat) => {
                let text = format!("{} wins", self.nickname(seat));
                self.log.push_back(LogEntry::new(LogKind::Success, text));
            }
            None => self.log.push_back(LogEntry::new(LogKind::Info, "Both fighters fall")),
        }
        info!(winner = ?winner, round = self.round, "weapon duel finished");
        events.push(GameEvent::new("game_end").with_payload(json!({
            "winnerId": winner,
            "round": self.round,
        })));
    }
}

fn choice_name(choice: Choice) -> &'static str {
    match choice {
        Choice::Base(BaseAction::Attack) => "attack",
        Choice::Base(BaseAction::Defense) => "defense",
        Choice::Base(BaseAction::Skill) => "skill",
        Choice::Ultimate(Ultimate::Burst) => "burst",
        Choice::Ultimate(Ultimate::Lifedrain) => "lifedrain",
        Choice::Ultimate(Ultimate::Absolute) => "absolute",
    }
}

pub struct WeaponDuel;

impl WeaponDuel {
    /// Start a duel from a typed configuration.
    pub fn new_game(
        &self,
        participants: &[Participant],
        config: WeaponDuelConfig,
        seed: u64,
    ) -> Result<WeaponDuelState, EngineError> {
        let info = self.info();
        let roster = seat_roster(participants, info.min_players, info.max_players)?;

        let mut fighters = Vec::with_capacity(roster.len());
        for (_, participant) in roster.iter() {
            let spec = config.weapons.get(&participant.id).cloned().unwrap_or_default();
            spec.check()?;
            fighters.push(Combatant::new(spec.weapon(), spec.max_hp()));
        }
        let fighters = SeatMap::new(fighters.len(), |seat| fighters[seat.index()].clone());

        info!(seed, "weapon duel started");
        Ok(WeaponDuelState {
            roster,
            tuning: config.tuning,
            fighters,
            round: 0,
            log: im::vector![LogEntry::new(LogKind::Info, "Duel start")],
            last_round: None,
            finished: false,
            winner: None,
            rng: GameRng::new(seed),
        })
    }
}

impl GamePlugin for WeaponDuel {
    type State = WeaponDuelState;
    type PublicView = WeaponDuelPublicView;
    type PlayerView = WeaponDuelPlayerView;

    fn info(&self) -> GameInfo {
        GameInfo {
            id: "weapon_duel",
            name: "Weapon Duel",
            min_players: 2,
            max_players: 2,
        }
    }

    fn initialize(
        &self,
        participants: &[Participant],
        config: &Value,
        seed: u64,
    ) -> Result<WeaponDuelState, EngineError> {
        self.new_game(participants, parse_config(config)?, seed)
    }

    fn validate(&self, state: &WeaponDuelState, action: &Action, actor: &ActorId) -> Result<(), Rejection> {
        let mv: DuelMove = action.decode()?;
        state.check(&mv, actor).map(|_| ())
    }

    fn apply(
        &self,
        state: &WeaponDuelState,
        action: &Action,
        actor: &ActorId,
    ) -> Result<Transition<WeaponDuelState>, EngineError> {
        let mv: DuelMove = action.decode().map_err(EngineError::Unvalidated)?;
        let seat = state.check(&mv, actor).map_err(|rejection| {
            warn!(%actor, kind = %action.kind, reason = %rejection, "apply on a refused action");
            EngineError::Unvalidated(rejection)
        })?;

        let mut next = state.clone();
        let mut events = vec![GameEvent::new("action_selected").with_actor(actor)];
        next.fighters[seat].committed = Some(mv.choice());
        let text = format!("{} is ready", next.nickname(seat));
        next.log.push_back(LogEntry::new(LogKind::Info, text));

        if next.both_committed().is_some() {
            next.resolve_round(&mut events)?;
        }
        trim_log(&mut next.log);

        debug!(%actor, round = next.round, finished = next.finished, "weapon duel action applied");
        Ok(Transition::new(next, events))
    }

    fn current_actor(&self, _state: &WeaponDuelState) -> Option<ActorId> {
        None
    }

    fn is_terminal(&self, state: &WeaponDuelState) -> bool {
        state.finished
    }

    fn result(&self, state: &WeaponDuelState) -> Option<Outcome> {
        if !state.finished {
            return None;
        }
        let scores = state
            .roster
            .iter()
            .map(|(seat, p)| (p.id.clone(), i64::from(state.fighters[seat].hp)))
            .collect();
        let outcome = match state.winner {
            Some(seat) => Outcome::winner(state.roster.actor(seat)?.clone(), "knockout"),
            None => Outcome::draw("double knockout"),
        };
        Some(outcome.with_scores(scores))
    }

    fn public_view(&self, state: &WeaponDuelState) -> WeaponDuelPublicView {
        WeaponDuelPublicView::build(state)
    }

    fn player_view(&self, state: &WeaponDuelState, actor: &ActorId) -> WeaponDuelPlayerView {
        WeaponDuelPlayerView {
            public: WeaponDuelPublicView::build(state),
            my_action: state
                .roster
                .seat_of(actor)
                .and_then(|seat| state.fighters[seat].committed),
        }
    }

    fn timeout_action(&self, state: &WeaponDuelState, actor: &ActorId) -> Option<Action> {
        let seat = state.roster.seat_of(actor)?;
        if state.finished || state.fighters[seat].committed.is_some() {
            return None;
        }
        Action::encode(&DuelMove::Defense).ok()
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeaponSummary {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: WeaponKind,
    pub grade: Grade,
    pub element: Element,
    pub level: u32,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FighterView {
    pub id: ActorId,
    pub nickname: String,
    pub hp: u32,
    pub max_hp: u32,
    pub gauge: u32,
    pub awakened: bool,
    pub weapon: WeaponSummary,
    pub has_selected: bool,
    pub history: Vec<BaseAction>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundView {
    pub round: u32,
    pub choices: BTreeMap<ActorId, Choice>,
    pub damage: BTreeMap<ActorId, u32>,
    pub critical: Vec<ActorId>,
    pub decision: Option<Decision>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeaponDuelPublicView {
    pub round: u32,
    pub gauge_max: u32,
    pub fighters: Vec<FighterView>,
    pub last_result: Option<RoundView>,
    pub log: Vec<LogEntry>,
    pub finished: bool,
    pub winner: Option<ActorId>,
}

impl WeaponDuelPublicView {
    fn build(state: &WeaponDuelState) -> Self {
        let fighters = state
            .roster
            .iter()
            .map(|(seat, p)| {
                let f = &state.fighters[seat];
                let skip = f.history.len().saturating_sub(HISTORY_SHOWN);
                FighterView {
                    id: p.id.clone(),
                    nickname: p.nickname.clone(),
                    hp: f.hp,
                    max_hp: f.max_hp,
                    gauge: f.gauge,
                    awakened: f.awakened,
                    weapon: WeaponSummary {
                        name: f.weapon.name.clone(),
                        kind: f.weapon.kind,
                        grade: f.weapon.grade,
                        element: f.weapon.element,
                        level: f.weapon.level,
                    },
                    has_selected: f.committed.is_some(),
                    history: f.history.iter().skip(skip).copied().collect(),
                }
            })
            .collect();

        let last_result = state.last_round.as_ref().map(|last| {
            let actor = |side: usize| state.roster.actor(Seat::new(side as u8)).cloned();
            RoundView {
                round: last.round,
                choices: (0..2).filter_map(|s| Some((actor(s)?, last.choices[s]))).collect(),
                damage: (0..2).filter_map(|s| Some((actor(s)?, last.report.damage[s]))).collect(),
                critical: (0..2).filter(|&s| last.report.crit[s]).filter_map(actor).collect(),
                decision: last.report.decision,
            }
        });

        let skip = state.log.len().saturating_sub(LOG_TAIL);
        Self {
            round: state.round,
            gauge_max: state.tuning.gauge_max,
            fighters,
            last_result,
            log: state.log.iter().skip(skip).cloned().collect(),
            finished: state.finished,
            winner: state.winner.and_then(|seat| state.roster.actor(seat).cloned()),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeaponDuelPlayerView {
    #[serde(flatten)]
    pub public: WeaponDuelPublicView,
    pub my_action: Option<Choice>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::RejectionKind;
    use crate::games::duel::combat::LOG_CAPACITY;

    fn duelists() -> Vec<Participant> {
        vec![Participant::new("a", "Ann"), Participant::new("b", "Bo")]
    }

    fn start() -> WeaponDuelState {
        WeaponDuel.new_game(&duelists(), WeaponDuelConfig::default(), 5).unwrap()
    }

    fn act(state: &WeaponDuelState, actor: &str, mv: DuelMove) -> Transition<WeaponDuelState> {
        let action = Action::encode(&mv).unwrap();
        WeaponDuel.apply(state, &action, &ActorId::from(actor)).unwrap()
    }

    fn reject(state: &WeaponDuelState, actor: &str, mv: DuelMove) -> Rejection {
        let action = Action::encode(&mv).unwrap();
        WeaponDuel.validate(state, &action, &ActorId::from(actor)).unwrap_err()
    }

    fn round(state: &WeaponDuelState, a: DuelMove, b: DuelMove) -> Transition<WeaponDuelState> {
        let first = act(state, "a", a);
        act(&first.state, "b", b)
    }

    #[test]
    fn test_initial_state() {
        let state = start();
        let a = state.fighter(Seat::new(0)).unwrap();
        assert_eq!(a.hp, 100);
        assert_eq!(a.weapon.damage_min, 5);
        assert_eq!(WeaponDuel.current_actor(&state), None);
        assert!(!WeaponDuel.is_terminal(&state));
    }

    #[test]
    fn test_config_weapons() {
        let config = json!({
            "weapons": {
                "a": { "name": "Ember Staff", "type": "staff", "element": "fire", "level": 3, "damageMin": 9, "damageMax": 12 },
                "b": { "hp": 80, "grade": "mythic" }
            },
            "tuning": { "patternLength": 4 }
        });
        let state = WeaponDuel.initialize(&duelists(), &config, 1).unwrap();
        let a = state.fighter(Seat::new(0)).unwrap();
        assert_eq!(a.max_hp, 160);
        assert_eq!(a.weapon.kind, WeaponKind::Staff);
        assert_eq!(a.weapon.element, Element::Fire);
        let b = state.fighter(Seat::new(1)).unwrap();
        assert_eq!(b.max_hp, 80);
        assert_eq!(b.weapon.grade, Grade::Mythic);
        assert_eq!(state.tuning().pattern_length, 4);
        assert_eq!(state.tuning().skill_factor, 1.5);

        let bad = json!({ "weapons": { "a": { "damageMin": 9, "damageMax": 2 } } });
        assert!(matches!(
            WeaponDuel.initialize(&duelists(), &bad, 1),
            Err(EngineError::Setting(_))
        ));
    }

    #[test]
    fn test_extreme_level_health_saturates() {
        let config = json!({ "weapons": { "a": { "level": u32::MAX } } });
        let state = WeaponDuel.initialize(&duelists(), &config, 1).unwrap();
        assert_eq!(state.fighter(Seat::new(0)).unwrap().max_hp, u32::MAX);

        let t = round(&state, DuelMove::Attack, DuelMove::Attack);
        assert!(t.state.fighter(Seat::new(0)).unwrap().hp < u32::MAX);
    }

    #[test]
    fn test_selection_is_concealed() {
        let state = start();
        let t = act(&state, "a", DuelMove::Skill);
        assert_eq!(t.events.len(), 1);
        assert!(t.events[0].is("action_selected"));
        assert_eq!(t.events[0].payload, Value::Null);

        let public = serde_json::to_value(WeaponDuel.public_view(&t.state)).unwrap();
        assert_eq!(public["fighters"][0]["hasSelected"], true);
        assert_eq!(public["fighters"][1]["hasSelected"], false);
        assert!(!public.to_string().contains("skill"));

        let mine = WeaponDuel.player_view(&t.state, &ActorId::from("a"));
        assert_eq!(mine.my_action, Some(Choice::Base(BaseAction::Skill)));
        let theirs = WeaponDuel.player_view(&t.state, &ActorId::from("b"));
        assert_eq!(theirs.my_action, None);
    }

    #[test]
    fn test_rejections() {
        let state = start();
        assert_eq!(reject(&state, "z", DuelMove::Attack).kind, RejectionKind::NotParticipant);
        assert_eq!(
            reject(&state, "a", DuelMove::Ultimate { ultimate: Ultimate::Burst }).kind,
            RejectionKind::Insufficient
        );

        let state = act(&state, "a", DuelMove::Attack).state;
        assert_eq!(reject(&state, "a", DuelMove::Skill).kind, RejectionKind::WrongPhase);
        assert!(WeaponDuel
            .validate(&state, &Action::new("dance"), &ActorId::from("b"))
            .is_err());
    }

    #[test]
    fn test_defense_mirror_round() {
        let t = round(&start(), DuelMove::Defense, DuelMove::Defense);
        let state = &t.state;
        assert_eq!(state.round(), 1);
        for seat in [Seat::new(0), Seat::new(1)] {
            let f = state.fighter(seat).unwrap();
            assert_eq!(f.hp, 100);
            assert_eq!(f.gauge, 5);
            assert_eq!(f.committed, None);
            assert_eq!(f.history.as_slice(), &[BaseAction::Defense]);
        }
        assert!(t.events.iter().any(|e| e.is("round_resolved")));
        let view = WeaponDuel.public_view(state);
        assert_eq!(view.last_result.unwrap().decision, Some(Decision::Mirror(BaseAction::Defense)));
    }

    #[test]
    fn test_ultimate_spends_gauge() {
        let mut state = start();
        state.fighters[Seat::new(0)].gauge = 100;
        let t = round(&state, DuelMove::Ultimate { ultimate: Ultimate::Absolute }, DuelMove::Attack);
        let a = t.state.fighter(Seat::new(0)).unwrap();
        assert_eq!(a.gauge, 0);
        assert_eq!(a.next_hit_bonus, 1.5);
        assert!(a.history.is_empty());
        assert_eq!(t.state.fighter(Seat::new(1)).unwrap().gauge, 30);
    }

    #[test]
    fn test_knockout_and_result() {
        let mut state = start();
        state.fighters[Seat::new(1)].hp = 1;
        let t = round(&state, DuelMove::Skill, DuelMove::Defense);
        assert!(WeaponDuel.is_terminal(&t.state));
        assert!(t.events.iter().any(|e| e.is("game_end")));

        let outcome = WeaponDuel.result(&t.state).unwrap();
        assert!(outcome.is_winner(&ActorId::from("a")));
        assert_eq!(outcome.scores.unwrap()[&ActorId::from("b")], 0);
        assert_eq!(reject(&t.state, "a", DuelMove::Attack).kind, RejectionKind::GameOver);
    }

    #[test]
    fn test_double_knockout_is_draw() {
        let mut state = start();
        state.fighters[Seat::new(0)].hp = 1;
        state.fighters[Seat::new(1)].hp = 1;
        let t = round(&state, DuelMove::Attack, DuelMove::Attack);
        assert!(WeaponDuel.is_terminal(&t.state));
        assert!(WeaponDuel.result(&t.state).unwrap().is_draw());
    }

    #[test]
    fn test_timeout_defends() {
        let state = start();
        assert_eq!(
            WeaponDuel.timeout_action(&state, &ActorId::from("b")),
            Some(Action::new("defense"))
        );
        let state = act(&state, "b", DuelMove::Attack).state;
        assert_eq!(WeaponDuel.timeout_action(&state, &ActorId::from("b")), None);
    }

    #[test]
    fn test_log_tail_is_bounded() {
        let mut state = start();
        for _ in 0..8 {
            state = round(&state, DuelMove::Defense, DuelMove::Defense).state;
        }
        let view = WeaponDuel.public_view(&state);
        assert_eq!(view.log.len(), LOG_TAIL);
        assert!(state.log().len() > LOG_TAIL);
        assert_eq!(view.fighters[0].history.len(), 3);
    }

    #[test]
    fn test_stored_log_is_capped() {
        let mut state = start();
        for _ in 0..30 {
            state = round(&state, DuelMove::Defense, DuelMove::Defense).state;
        }
        assert_eq!(state.log().len(), LOG_CAPACITY);
        assert!(state.log().back().unwrap().text.starts_with("Round 30:"));
    }

    #[test]
    fn test_state_bincode_round_trip() {
        let state = round(&start(), DuelMove::Attack, DuelMove::Skill).state;
        let bytes = bincode::serialize(&state).unwrap();
        let restored: WeaponDuelState = bincode::deserialize(&bytes).unwrap();
        assert_eq!(state, restored);
    }
}
