//! Participant identification and per-seat data storage.
//!
//! ## ActorId
//!
//! Opaque string identity handed to the engine by the host. Stable for a
//! session, used in every public API and every view.
//!
//! ## Seat
//!
//! Dense 0-based position at the table. Rulesets key their private state
//! by seat internally and translate to [`ActorId`] at the boundary.
//!
//! ## SeatMap
//!
//! Per-seat data backed by `im::Vector`, so cloning a state to apply an
//! action shares untouched seats.

use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

/// Opaque participant identifier supplied by the host.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(pub String);

impl ActorId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActorId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for ActorId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Table position, 0-based: the first participant sits at `Seat(0)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Seat(pub u8);

impl Seat {
    #[must_use]
    pub const fn new(seat: u8) -> Self {
        Self(seat)
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// The seat `offset` places clockwise from this one.
    #[must_use]
    pub fn offset(self, offset: usize, seat_count: usize) -> Seat {
        Seat(((self.index() + offset) % seat_count.max(1)) as u8)
    }

    /// Iterate over all seats at a table of `seat_count`.
    pub fn all(seat_count: usize) -> impl Iterator<Item = Seat> {
        (0..seat_count.min(u8::MAX as usize) as u8).map(Seat)
    }
}

impl std::fmt::Display for Seat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Seat {}", self.0)
    }
}

/// One participant as handed to a ruleset's initializer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ActorId,
    pub nickname: String,
}

impl Participant {
    #[must_use]
    pub fn new(id: impl Into<ActorId>, nickname: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            nickname: nickname.into(),
        }
    }
}

/// Per-seat data storage with O(1) access by [`Seat`].
///
/// ```
/// use rust_tabletop::core::{Seat, SeatMap};
///
/// let mut chips: SeatMap<u32> = SeatMap::new(3, |_| 1000);
/// chips[Seat::new(1)] -= 20;
/// assert_eq!(chips[Seat::new(1)], 980);
/// assert_eq!(chips.seat_count(), 3);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatMap<T: Clone> {
    data: im::Vector<T>,
}

impl<T: Clone> SeatMap<T> {
    /// Create with values from a factory function receiving each seat.
    pub fn new(seat_count: usize, factory: impl Fn(Seat) -> T) -> Self {
        Self {
            data: Seat::all(seat_count).map(factory).collect(),
        }
    }

    /// Create with all entries set to the same value.
    pub fn with_value(seat_count: usize, value: T) -> Self {
        Self::new(seat_count, |_| value.clone())
    }

    #[must_use]
    pub fn seat_count(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn get(&self, seat: Seat) -> Option<&T> {
        self.data.get(seat.index())
    }

    pub fn get_mut(&mut self, seat: Seat) -> Option<&mut T> {
        self.data.get_mut(seat.index())
    }

    /// Iterate over (Seat, &T) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (Seat, &T)> {
        self.data.iter().enumerate().map(|(i, v)| (Seat(i as u8), v))
    }

    /// Iterate over the stored values in seat order.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.data.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Seat, &mut T)> {
        self.data.iter_mut().enumerate().map(|(i, v)| (Seat(i as u8), v))
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.data.iter_mut()
    }

    pub fn seats(&self) -> impl Iterator<Item = Seat> {
        Seat::all(self.data.len())
    }
}

impl<T: Clone> Index<Seat> for SeatMap<T> {
    type Output = T;

    fn index(&self, seat: Seat) -> &Self::Output {
        &self.data[seat.index()]
    }
}

impl<T: Clone> IndexMut<Seat> for SeatMap<T> {
    fn index_mut(&mut self, seat: Seat) -> &mut Self::Output {
        &mut self.data[seat.index()]
    }
}

/// Ordered participant list with actor <-> seat lookup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    participants: Vec<Participant>,
}

impl Roster {
    #[must_use]
    pub fn new(participants: Vec<Participant>) -> Self {
        Self { participants }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.participants.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Seat occupied by `actor`, if seated.
    #[must_use]
    pub fn seat_of(&self, actor: &ActorId) -> Option<Seat> {
        self.participants
            .iter()
            .position(|p| &p.id == actor)
            .map(|i| Seat(i as u8))
    }

    /// Actor sitting at `seat`.
    #[must_use]
    pub fn actor(&self, seat: Seat) -> Option<&ActorId> {
        self.participants.get(seat.index()).map(|p| &p.id)
    }

    #[must_use]
    pub fn participant(&self, seat: Seat) -> Option<&Participant> {
        self.participants.get(seat.index())
    }

    pub fn iter(&self) -> impl Iterator<Item = (Seat, &Participant)> {
        self.participants
            .iter()
            .enumerate()
            .map(|(i, p)| (Seat(i as u8), p))
    }
}
