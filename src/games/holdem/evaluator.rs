//! Best-five-card hand evaluation.
//!
//! Every 5-card subset of the input is scored and the strongest kept. A
//! [`HandRanking`] compares by category, then primary value, then kickers
//! from high to low, which is exactly its derived ordering.
//!
//! ```
//! use rust_tabletop::games::holdem::{evaluate, Card, HandCategory};
//!
//! let cards: Vec<Card> = ["As", "2d", "3c", "4h", "5s", "Kd", "Kc"]
//!     .iter()
//!     .map(|c| c.parse().unwrap())
//!     .collect();
//! let ranking = evaluate(&cards).unwrap();
//! assert_eq!(ranking.category, HandCategory::Straight);
//! assert_eq!(ranking.primary, 5);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::card::{Card, Rank};

/// Hand categories from weakest to strongest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandCategory {
    HighCard,
    OnePair,
    TwoPair,
    ThreeOfAKind,
    Straight,
    Flush,
    FullHouse,
    FourOfAKind,
    StraightFlush,
    RoyalFlush,
}

impl HandCategory {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            HandCategory::HighCard => "high card",
            HandCategory::OnePair => "one pair",
            HandCategory::TwoPair => "two pair",
            HandCategory::ThreeOfAKind => "three of a kind",
            HandCategory::Straight => "straight",
            HandCategory::Flush => "flush",
            HandCategory::FullHouse => "full house",
            HandCategory::FourOfAKind => "four of a kind",
            HandCategory::StraightFlush => "straight flush",
            HandCategory::RoyalFlush => "royal flush",
        }
    }
}

/// Comparable strength of a five-card hand.
///
/// `primary` is the defining rank value (2..=14): the top card of a straight
/// or flush, the rank of the largest group otherwise. A wheel (A-2-3-4-5)
/// has primary 5. `kickers` hold the remaining tie-breaking rank values in
/// descending order of significance.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HandRanking {
    pub category: HandCategory,
    pub primary: u8,
    pub kickers: SmallVec<[u8; 4]>,
}

impl HandRanking {
    fn new(category: HandCategory, primary: u8, kickers: &[u8]) -> Self {
        Self {
            category,
            primary,
            kickers: SmallVec::from_slice(kickers),
        }
    }
}

impl fmt::Display for HandRanking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.category.name())
    }
}

/// Best ranking among all five-card subsets, or `None` for fewer than five
/// cards.
#[must_use]
pub fn evaluate(cards: &[Card]) -> Option<HandRanking> {
    let n = cards.len();
    if n < 5 {
        return None;
    }

    let mut best: Option<HandRanking> = None;
    for a in 0..n - 4 {
        for b in a + 1..n - 3 {
            for c in b + 1..n - 2 {
                for d in c + 1..n - 1 {
                    for e in d + 1..n {
                        let ranking =
                            evaluate_five([cards[a], cards[b], cards[c], cards[d], cards[e]]);
                        if best.as_ref().map_or(true, |current| ranking > *current) {
                            best = Some(ranking);
                        }
                    }
                }
            }
        }
    }
    best
}

/// Score exactly five cards.
#[must_use]
pub fn evaluate_five(cards: [Card; 5]) -> HandRanking {
    let mut values: [u8; 5] = cards.map(|c| c.rank.value());
    values.sort_unstable_by(|x, y| y.cmp(x));

    let flush = cards.iter().all(|c| c.suit == cards[0].suit);
    let straight_high = straight_high(&values);

    // (count, value) groups, largest group first, then higher value first.
    let mut groups: SmallVec<[(u8, u8); 5]> = SmallVec::new();
    for &v in &values {
        match groups.iter_mut().find(|(_, value)| *value == v) {
            Some((count, _)) => *count += 1,
            None => groups.push((1, v)),
        }
    }
    groups.sort_unstable_by(|x, y| y.cmp(x));
    let rest: SmallVec<[u8; 4]> = groups.iter().skip(1).map(|&(_, v)| v).collect();

    use HandCategory::*;
    match (flush, straight_high, groups[0].0, groups.get(1).map_or(0, |g| g.0)) {
        (true, Some(high), _, _) if high == Rank::Ace.value() => {
            HandRanking::new(RoyalFlush, high, &[])
        }
        (true, Some(high), _, _) => HandRanking::new(StraightFlush, high, &[]),
        (_, _, 4, _) => HandRanking::new(FourOfAKind, groups[0].1, &rest),
        (_, _, 3, 2) => HandRanking::new(FullHouse, groups[0].1, &rest),
        (true, None, _, _) => HandRanking::new(Flush, values[0], &values[1..]),
        (false, Some(high), _, _) => HandRanking::new(Straight, high, &[]),
        (_, _, 3, _) => HandRanking::new(ThreeOfAKind, groups[0].1, &rest),
        (_, _, 2, 2) => HandRanking::new(TwoPair, groups[0].1, &rest),
        (_, _, 2, _) => HandRanking::new(OnePair, groups[0].1, &rest),
        _ => HandRanking::new(HighCard, values[0], &values[1..]),
    }
}

/// Top card of a straight over descending `values`, with the wheel topping
/// out at five.
fn straight_high(values: &[u8; 5]) -> Option<u8> {
    if values == &[14, 5, 4, 3, 2] {
        return Some(5);
    }
    values
        .windows(2)
        .all(|w| w[0] == w[1] + 1)
        .then_some(values[0])
}
