//! Main and side pots.
//!
//! Pots are layered by total contribution: every distinct all-in level caps
//! a pot that only players who reached it may win. Players still able to bet
//! are eligible for every layer. Folded chips stay in the layers they
//! reached, but folded players are never eligible.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::Seat;

/// One seat's stake in the hand.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Stake {
    pub seat: Seat,
    pub contributed: u32,
    pub folded: bool,
    pub all_in: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pot {
    pub amount: u32,
    pub eligible: SmallVec<[Seat; 8]>,
}

/// Split contributions into pots, smallest layer (the main pot) first.
///
/// A layer nobody eligible reached is folded into the pot below it.
#[must_use]
pub fn layer_pots(stakes: &[Stake]) -> Vec<Pot> {
    let live = stakes.iter().filter(|s| !s.folded && s.contributed > 0);
    let mut levels: SmallVec<[u32; 8]> = live.clone().filter(|s| s.all_in).map(|s| s.contributed).collect();
    levels.extend(live.map(|s| s.contributed).max());
    levels.sort_unstable();
    levels.dedup();

    let mut pots: Vec<Pot> = Vec::new();
    let mut floor = 0;
    for &level in &levels {
        let amount = stakes
            .iter()
            .map(|s| s.contributed.min(level) - s.contributed.min(floor))
            .sum();
        let eligible = stakes
            .iter()
            .filter(|s| !s.folded && (!s.all_in || s.contributed >= level))
            .map(|s| s.seat)
            .collect();
        pots.push(Pot { amount, eligible });
        floor = level;
    }

    // Chips above the highest live contribution belong to folded seats only.
    let excess: u32 = stakes.iter().map(|s| s.contributed.saturating_sub(floor)).sum();
    if excess > 0 {
        if let Some(top) = pots.last_mut() {
            top.amount += excess;
        }
    }

    pots
}

/// Divide `amount` between `winners`. Odd chips go one at a time to the
/// winners closest clockwise after the dealer.
#[must_use]
pub fn split(amount: u32, winners: &[Seat], dealer: Seat, seat_count: usize) -> Vec<(Seat, u32)> {
    if winners.is_empty() {
        return Vec::new();
    }
    let count = winners.len() as u32;
    let share = amount / count;
    let mut odd = amount % count;

    let mut order: Vec<Seat> = winners.to_vec();
    order.sort_by_key(|seat| (seat.index() + seat_count - dealer.index() - 1) % seat_count.max(1));

    order
        .into_iter()
        .map(|seat| {
            let bonus = u32::from(odd > 0);
            odd -= bonus;
            (seat, share + bonus)
        })
        .collect()
}
