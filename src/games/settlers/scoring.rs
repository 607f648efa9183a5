//! Longest road, largest army and victory points.

use serde::{Deserialize, Serialize};

use super::graph::Board;
use crate::core::Seat;

/// Roads needed before the longest-road bonus is awarded.
pub const LONGEST_ROAD_MIN: u32 = 5;
/// Knights needed before the largest-army bonus is awarded.
pub const LARGEST_ARMY_MIN: u32 = 3;
/// Points carried by either bonus.
pub const AWARD_POINTS: u32 = 2;

/// A bonus holder and the count that earned it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Award {
    pub seat: Seat,
    pub count: u32,
}

/// Length of `seat`'s longest simple road path.
///
/// Paths may start or end at any vertex but never continue through a vertex
/// holding another player's building.
#[must_use]
pub fn longest_road(board: &Board, seat: Seat) -> u32 {
    let mut used = vec![false; board.edges.len()];
    let mut best = 0;

    for (index, edge) in board.edges.iter().enumerate() {
        if edge.owner != Some(seat) {
            continue;
        }
        for &start in &edge.vertices {
            used[index] = true;
            let far = edge.other_end(start);
            best = best.max(extend(board, seat, far, 1, &mut used));
            used[index] = false;
        }
    }

    best
}

fn extend(board: &Board, seat: Seat, vertex: usize, length: u32, used: &mut [bool]) -> u32 {
    let blocked = board.vertices[vertex]
        .owner
        .is_some_and(|owner| owner != seat);
    if blocked {
        return length;
    }

    let mut best = length;
    for &edge in &board.vertices[vertex].edges {
        if used[edge] || board.edges[edge].owner != Some(seat) {
            continue;
        }
        used[edge] = true;
        let next = board.edges[edge].other_end(vertex);
        best = best.max(extend(board, seat, next, length + 1, used));
        used[edge] = false;
    }
    best
}

/// Re-decide a bonus from fresh per-seat counts.
///
/// Seats are scanned in order and a qualifying count takes the bonus only by
/// beating the recorded holder's count, so a tie with no holder goes to the
/// earliest seat. Once awarded the bonus is never revoked; the holder's
/// recorded count only grows.
#[must_use]
pub fn contest(previous: Option<Award>, counts: &[u32], minimum: u32) -> Option<Award> {
    let mut award = previous;
    for (index, &count) in counts.iter().enumerate() {
        if count < minimum {
            continue;
        }
        let seat = Seat::new(index as u8);
        let beaten = award.map_or(true, |held| count > held.count);
        if beaten {
            award = Some(Award { seat, count });
        }
    }
    award
}

/// Points from settlements (1) and cities (2).
#[must_use]
pub fn building_points(board: &Board, seat: Seat) -> u32 {
    board
        .vertices
        .iter()
        .filter(|v| v.owner == Some(seat))
        .filter_map(|v| v.building)
        .map(|b| b.yield_amount())
        .sum()
}

/// Points from bonuses held by `seat`.
#[must_use]
pub fn award_points(seat: Seat, longest: Option<Award>, largest: Option<Award>) -> u32 {
    [longest, largest]
        .iter()
        .flatten()
        .filter(|award| award.seat == seat)
        .count() as u32
        * AWARD_POINTS
}
