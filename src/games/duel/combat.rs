//! Weapon attributes and damage math shared by the duel rulesets.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Element {
    #[default]
    None,
    Fire,
    Ice,
    Lightning,
    Holy,
    Poison,
    Silver,
    Water,
    Lifesteal,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
    #[default]
    Common,
    Magic,
    Rare,
    Legendary,
    Unique,
    Mythic,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponKind {
    #[default]
    Sword,
    Axe,
    Spear,
    Hammer,
    Dagger,
    Staff,
    Wand,
    Katana,
    Scythe,
}

impl WeaponKind {
    /// Staves and wands trigger elemental effects on critical hits.
    #[must_use]
    pub fn is_magic(self) -> bool {
        matches!(self, WeaponKind::Staff | WeaponKind::Wand)
    }
}

/// Directed element advantage table. The two duel rulesets use different
/// charts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElementChart {
    Weapon,
    Enhance,
}

impl ElementChart {
    /// Whether `attacker` has the advantage over `defender`.
    #[must_use]
    pub fn beats(self, attacker: Element, defender: Element) -> bool {
        use Element::*;
        match self {
            ElementChart::Weapon => matches!(
                (attacker, defender),
                (Fire, Ice | Poison)
                    | (Ice, Lightning)
                    | (Lightning, Fire | Holy)
                    | (Holy, Poison | Lifesteal)
                    | (Poison, Lightning)
                    | (Silver, Lifesteal)
                    | (Water, Fire)
            ),
            ElementChart::Enhance => matches!(
                (attacker, defender),
                (Fire, Ice | Poison)
                    | (Ice, Lightning | Silver)
                    | (Lightning, Fire | Holy)
                    | (Holy, Poison | Fire)
                    | (Poison, Silver | Ice)
                    | (Silver, Holy | Lightning)
            ),
        }
    }

    /// Damage multiplier for `attacker` hitting `defender`. Elementless
    /// weapons are always neutral.
    #[must_use]
    pub fn factor(self, attacker: Element, defender: Element, advantage: f64, disadvantage: f64) -> f64 {
        if attacker == Element::None || defender == Element::None {
            1.0
        } else if self.beats(attacker, defender) {
            advantage
        } else if self.beats(defender, attacker) {
            disadvantage
        } else {
            1.0
        }
    }
}

/// Scale `base` by `factor`, rounding down.
#[must_use]
pub fn scaled(base: u32, factor: f64) -> u32 {
    (f64::from(base) * factor).max(0.0).floor() as u32
}

/// Awakened while alive at or below `threshold` of max health.
#[must_use]
pub fn is_awakened(hp: u32, max_hp: u32, threshold: f64) -> bool {
    hp > 0 && f64::from(hp) <= f64::from(max_hp) * threshold
}

/// Battle log lines kept in a duel's state.
pub const LOG_CAPACITY: usize = 50;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    Info,
    Damage,
    Crit,
    Success,
}

/// One line of the battle log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub text: String,
    pub kind: LogKind,
}

impl LogEntry {
    pub fn new(kind: LogKind, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind,
        }
    }
}

/// Drop the oldest lines beyond [`LOG_CAPACITY`].
pub fn trim_log(log: &mut im::Vector<LogEntry>) {
    if log.len() > LOG_CAPACITY {
        *log = log.skip(log.len() - LOG_CAPACITY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weapon_chart() {
        let chart = ElementChart::Weapon;
        assert_eq!(chart.factor(Element::Fire, Element::Ice, 1.2, 0.8), 1.2);
        assert_eq!(chart.factor(Element::Ice, Element::Fire, 1.2, 0.8), 0.8);
        assert_eq!(chart.factor(Element::Water, Element::Fire, 1.2, 0.8), 1.2);
        assert_eq!(chart.factor(Element::Fire, Element::Holy, 1.2, 0.8), 1.0);
        assert_eq!(chart.factor(Element::None, Element::Fire, 1.2, 0.8), 1.0);
    }

    #[test]
    fn test_enhance_chart_differs() {
        assert!(ElementChart::Enhance.beats(Element::Holy, Element::Fire));
        assert!(!ElementChart::Weapon.beats(Element::Holy, Element::Fire));
        assert!(ElementChart::Enhance.beats(Element::Ice, Element::Silver));
        assert!(!ElementChart::Enhance.beats(Element::Water, Element::Fire));
    }

    #[test]
    fn test_scaled_rounds_down() {
        assert_eq!(scaled(7, 1.5), 10);
        assert_eq!(scaled(5, 0.5), 2);
        assert_eq!(scaled(8, 0.0), 0);
    }

    #[test]
    fn test_awakened_window() {
        assert!(is_awakened(30, 100, 0.3));
        assert!(is_awakened(1, 100, 0.3));
        assert!(!is_awakened(31, 100, 0.3));
        assert!(!is_awakened(0, 100, 0.3));
    }

    #[test]
    fn test_trim_log_keeps_newest() {
        let mut log: im::Vector<LogEntry> = (0..LOG_CAPACITY + 7)
            .map(|i| LogEntry::new(LogKind::Info, format!("line {i}")))
            .collect();
        trim_log(&mut log);
        assert_eq!(log.len(), LOG_CAPACITY);
        assert_eq!(log[0].text, "line 7");
        assert_eq!(log.back().unwrap().text, format!("line {}", LOG_CAPACITY + 6));

        let mut short = im::vector![LogEntry::new(LogKind::Info, "only")];
        trim_log(&mut short);
        assert_eq!(short.len(), 1);
    }

    #[test]
    fn test_attribute_json() {
        assert_eq!(serde_json::to_value(Element::Lifesteal).unwrap(), "lifesteal");
        assert_eq!(
            serde_json::from_value::<WeaponKind>(serde_json::json!("wand")).unwrap(),
            WeaponKind::Wand
        );
        assert!(WeaponKind::Staff.is_magic());
        assert!(!WeaponKind::Katana.is_magic());
    }
}
