//! Simultaneous round resolution for the weapon duel.
//!
//! [`resolve`] takes two combatants, their committed choices, the tuning
//! table and a randomness source and reports what happened. It does not
//! touch the combatants; the ruleset applies the [`RoundReport`].
//!
//! ## Order of checks
//!
//! 1. Ultimates bypass the matchup. Two at once clash for flat damage.
//! 2. Pattern read: a side whose last recorded base actions are all the
//!    same loses the matchup, unless the opponent is just as predictable.
//! 3. Otherwise attack beats skill, skill beats defense and defense beats
//!    attack, with the three mirrors handled separately.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::combat::{scaled, Element, ElementChart, Grade, WeaponKind};
use crate::core::RandomSource;

/// Base actions of the matchup triangle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaseAction {
    Attack,
    Defense,
    Skill,
}

impl BaseAction {
    #[must_use]
    pub fn beats(self, other: BaseAction) -> bool {
        matches!(
            (self, other),
            (BaseAction::Attack, BaseAction::Skill)
                | (BaseAction::Skill, BaseAction::Defense)
                | (BaseAction::Defense, BaseAction::Attack)
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ultimate {
    Burst,
    Lifedrain,
    Absolute,
}

/// A committed choice for one round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Choice {
    Base(BaseAction),
    Ultimate(Ultimate),
}

/// Every multiplier, threshold and gauge gain of the weapon duel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DuelTuning {
    pub attack_factor: f64,
    pub skill_factor: f64,
    pub defense_factor: f64,
    pub element_advantage: f64,
    pub element_disadvantage: f64,
    pub awakened_factor: f64,
    /// Fraction of max health at or below which a combatant awakens.
    pub awaken_threshold: f64,
    pub gauge_max: u32,
    pub gauge_on_matchup_loss: u32,
    pub gauge_on_ultimate_hit: u32,
    pub gauge_on_attack_mirror: u32,
    pub gauge_on_defense_mirror: u32,
    pub gauge_on_skill_mirror: u32,
    pub burst_factor: f64,
    pub lifedrain_factor: f64,
    /// Next-hit multiplier armed by the absolute ultimate.
    pub absolute_bonus: f64,
    pub ultimate_clash_damage: u32,
    /// Identical recorded actions needed to be read.
    pub pattern_length: usize,
    /// Chance in percent that a mythic weapon ends the duel on a won matchup.
    pub execution_chance: u32,
}

impl Default for DuelTuning {
    fn default() -> Self {
        Self {
            attack_factor: 1.0,
            skill_factor: 1.5,
            defense_factor: 0.5,
            element_advantage: 1.2,
            element_disadvantage: 0.8,
            awakened_factor: 1.5,
            awaken_threshold: 0.3,
            gauge_max: 100,
            gauge_on_matchup_loss: 30,
            gauge_on_ultimate_hit: 30,
            gauge_on_attack_mirror: 15,
            gauge_on_defense_mirror: 5,
            gauge_on_skill_mirror: 20,
            burst_factor: 2.0,
            lifedrain_factor: 1.0,
            absolute_bonus: 1.5,
            ultimate_clash_damage: 10,
            pattern_length: 3,
            execution_chance: 1,
        }
    }
}

impl DuelTuning {
    fn matchup_factor(&self, action: BaseAction) -> f64 {
        match action {
            BaseAction::Attack => self.attack_factor,
            BaseAction::Skill => self.skill_factor,
            BaseAction::Defense => self.defense_factor,
        }
    }
}

/// A weapon's combat profile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Weapon {
    pub name: String,
    pub kind: WeaponKind,
    pub grade: Grade,
    pub element: Element,
    pub level: u32,
    pub damage_min: u32,
    pub damage_max: u32,
    /// Percent.
    pub crit_chance: u32,
    /// Percent of base damage dealt on a critical hit.
    pub crit_damage: u32,
}

/// One side of a weapon duel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Combatant {
    pub hp: u32,
    pub max_hp: u32,
    pub weapon: Weapon,
    pub gauge: u32,
    pub awakened: bool,
    /// Most recent base actions, oldest first.
    pub history: SmallVec<[BaseAction; 3]>,
    pub committed: Option<Choice>,
    /// Multiplier applied to the next damage this side deals.
    pub next_hit_bonus: f64,
}

impl Combatant {
    #[must_use]
    pub fn new(weapon: Weapon, max_hp: u32) -> Self {
        Self {
            hp: max_hp,
            max_hp,
            weapon,
            gauge: 0,
            awakened: false,
            history: SmallVec::new(),
            committed: None,
            next_hit_bonus: 1.0,
        }
    }

    /// Whether the last `length` recorded actions are identical.
    #[must_use]
    pub fn is_predictable(&self, length: usize) -> bool {
        length > 0
            && self.history.len() >= length
            && self.history[self.history.len() - length..]
                .windows(2)
                .all(|w| w[0] == w[1])
    }

    /// Record a base action, keeping at most `keep` entries.
    pub fn record(&mut self, action: BaseAction, keep: usize) {
        self.history.push(action);
        while self.history.len() > keep.max(1) {
            self.history.remove(0);
        }
    }

    fn roll(&self, rng: &mut impl RandomSource) -> u32 {
        rng.between(self.weapon.damage_min, self.weapon.damage_max)
    }

    /// Product of every outgoing multiplier except the matchup factor.
    fn outgoing(&self, target: &Combatant, tuning: &DuelTuning) -> f64 {
        let element = ElementChart::Weapon.factor(
            self.weapon.element,
            target.weapon.element,
            tuning.element_advantage,
            tuning.element_disadvantage,
        );
        let awakened = if self.awakened { tuning.awakened_factor } else { 1.0 };
        element * awakened * self.next_hit_bonus
    }
}

/// How the matchup was decided.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// One side won the triangle outright.
    Matchup { winner: usize },
    /// The loser was read through repetition.
    PatternRead { winner: usize },
    Mirror(BaseAction),
    /// Exactly one side fired an ultimate.
    Ultimate { user: usize, ultimate: Ultimate },
    UltimateClash,
}

/// Everything a round changes, indexed by side.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RoundReport {
    /// Damage taken by each side.
    pub damage: [u32; 2],
    /// Health restored to each side before damage lands.
    pub heal: [u32; 2],
    pub gauge_gain: [u32; 2],
    /// Sides whose gauge was spent on an ultimate.
    pub gauge_spent: [bool; 2],
    pub crit: [bool; 2],
    pub executed: [bool; 2],
    /// Replacement next-hit bonus; every side's bonus resets otherwise.
    pub armed_bonus: [Option<f64>; 2],
    pub decision: Option<Decision>,
    pub effects: [Option<CritEffect>; 2],
}

/// Elemental bonus of a magic weapon's critical hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CritEffect {
    Explosion,
    Frostbite,
    Shock,
    Venom,
    Smite,
    Mending,
}

impl CritEffect {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            CritEffect::Explosion => "explosion",
            CritEffect::Frostbite => "frostbite",
            CritEffect::Shock => "shock",
            CritEffect::Venom => "venom",
            CritEffect::Smite => "smite",
            CritEffect::Mending => "mending",
        }
    }
}

/// Resolve one round between `sides[0]` and `sides[1]`.
pub fn resolve(
    sides: [&Combatant; 2],
    choices: [Choice; 2],
    tuning: &DuelTuning,
    rng: &mut impl RandomSource,
) -> RoundReport {
    let mut report = RoundReport::default();

    match choices {
        [Choice::Ultimate(_), Choice::Ultimate(_)] => {
            report.gauge_spent = [true, true];
            report.damage = [tuning.ultimate_clash_damage; 2];
            report.decision = Some(Decision::UltimateClash);
        }
        [Choice::Ultimate(ultimate), Choice::Base(_)] => {
            fire_ultimate(sides, 0, ultimate, tuning, rng, &mut report);
        }
        [Choice::Base(_), Choice::Ultimate(ultimate)] => {
            fire_ultimate(sides, 1, ultimate, tuning, rng, &mut report);
        }
        [Choice::Base(a), Choice::Base(b)] => {
            let read = [
                sides[0].is_predictable(tuning.pattern_length),
                sides[1].is_predictable(tuning.pattern_length),
            ];
            let actions = [a, b];
            match read {
                [true, false] => {
                    win_matchup(sides, actions, 1, tuning, rng, &mut report);
                    report.decision = Some(Decision::PatternRead { winner: 1 });
                }
                [false, true] => {
                    win_matchup(sides, actions, 0, tuning, rng, &mut report);
                    report.decision = Some(Decision::PatternRead { winner: 0 });
                }
                _ if a.beats(b) => {
                    win_matchup(sides, actions, 0, tuning, rng, &mut report);
                    report.decision = Some(Decision::Matchup { winner: 0 });
                }
                _ if b.beats(a) => {
                    win_matchup(sides, actions, 1, tuning, rng, &mut report);
                    report.decision = Some(Decision::Matchup { winner: 1 });
                }
                _ => {
                    mirror(sides, a, tuning, rng, &mut report);
                    report.decision = Some(Decision::Mirror(a));
                }
            }
        }
    }

    report
}

fn fire_ultimate(
    sides: [&Combatant; 2],
    user: usize,
    ultimate: Ultimate,
    tuning: &DuelTuning,
    rng: &mut impl RandomSource,
    report: &mut RoundReport,
) {
    let target = 1 - user;
    let attacker = sides[user];
    let base = attacker.roll(rng);
    let outgoing = attacker.outgoing(sides[target], tuning);

    report.gauge_spent[user] = true;
    report.decision = Some(Decision::Ultimate { user, ultimate });
    match ultimate {
        Ultimate::Burst => {
            report.damage[target] = scaled(base, tuning.burst_factor * outgoing);
        }
        Ultimate::Lifedrain => {
            let dealt = scaled(base, tuning.lifedrain_factor * outgoing);
            report.damage[target] = dealt;
            report.heal[user] = dealt;
        }
        Ultimate::Absolute => {
            report.armed_bonus[user] = Some(tuning.absolute_bonus);
        }
    }
    report.gauge_gain[target] = tuning.gauge_on_ultimate_hit;
}

fn win_matchup(
    sides: [&Combatant; 2],
    actions: [BaseAction; 2],
    winner: usize,
    tuning: &DuelTuning,
    rng: &mut impl RandomSource,
    report: &mut RoundReport,
) {
    let loser = 1 - winner;
    let attacker = sides[winner];
    let weapon = &attacker.weapon;

    let base = attacker.roll(rng);
    let crit = rng.percent(weapon.crit_chance);
    let executed = weapon.grade == Grade::Mythic && rng.percent(tuning.execution_chance);
    let crit_factor = if crit { f64::from(weapon.crit_damage) / 100.0 } else { 1.0 };

    let mut damage = if executed {
        sides[loser].hp
    } else {
        let factor = tuning.matchup_factor(actions[winner]) * attacker.outgoing(sides[loser], tuning);
        scaled(base, factor * crit_factor)
    };

    if crit && !executed && weapon.kind.is_magic() {
        let (effect, extra, heal) = magic_crit(weapon.element, damage, attacker.max_hp);
        damage = damage.saturating_add(extra);
        report.heal[winner] = heal;
        report.effects[winner] = effect;
    }

    report.damage[loser] = damage;
    report.crit[winner] = crit;
    report.executed[winner] = executed;
    report.gauge_gain[loser] = tuning.gauge_on_matchup_loss;
}

/// Elemental crit effect of a magic weapon: effect, extra damage, self-heal.
fn magic_crit(element: Element, damage: u32, max_hp: u32) -> (Option<CritEffect>, u32, u32) {
    match element {
        Element::Fire => (Some(CritEffect::Explosion), scaled(damage, 0.5), 0),
        Element::Ice => (Some(CritEffect::Frostbite), scaled(damage, 0.3), 0),
        Element::Lightning => (Some(CritEffect::Shock), scaled(damage, 0.3), 0),
        Element::Poison => (Some(CritEffect::Venom), scaled(damage, 0.4), 0),
        Element::Holy => (Some(CritEffect::Smite), scaled(damage, 0.5), 0),
        Element::Water => (Some(CritEffect::Mending), 0, scaled(max_hp, 0.2)),
        Element::None | Element::Silver | Element::Lifesteal => (None, 0, 0),
    }
}

fn mirror(
    sides: [&Combatant; 2],
    action: BaseAction,
    tuning: &DuelTuning,
    rng: &mut impl RandomSource,
    report: &mut RoundReport,
) {
    match action {
        BaseAction::Attack => {
            for side in 0..2 {
                let target = 1 - side;
                let base = sides[side].roll(rng);
                report.damage[target] = scaled(base, sides[side].outgoing(sides[target], tuning));
            }
            for side in 0..2 {
                if report.damage[side] > 0 {
                    report.gauge_gain[side] = tuning.gauge_on_attack_mirror;
                }
            }
        }
        BaseAction::Defense => {
            report.gauge_gain = [tuning.gauge_on_defense_mirror; 2];
        }
        BaseAction::Skill => {
            for side in 0..2 {
                let target = 1 - side;
                let attacker = sides[side];
                let base = attacker.roll(rng);
                let crit_factor = f64::from(attacker.weapon.crit_damage) / 100.0;
                let factor = tuning.skill_factor * attacker.outgoing(sides[target], tuning) * crit_factor;
                report.damage[target] = scaled(base, factor);
            }
            report.crit = [true, true];
            report.gauge_gain = [tuning.gauge_on_skill_mirror; 2];
        }
    }
}
