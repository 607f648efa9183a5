//! Resources, costs, tiles, ports and development cards.

use serde::{Deserialize, Serialize};

/// The five tradeable resources.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Brick,
    Lumber,
    Wool,
    Grain,
    Ore,
}

impl Resource {
    pub const ALL: [Resource; 5] = [
        Resource::Brick,
        Resource::Lumber,
        Resource::Wool,
        Resource::Grain,
        Resource::Ore,
    ];
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Resource::Brick => "brick",
            Resource::Lumber => "lumber",
            Resource::Wool => "wool",
            Resource::Grain => "grain",
            Resource::Ore => "ore",
        };
        f.write_str(name)
    }
}

/// A count of each resource. Deserializes from a partial map such as
/// `{"brick": 1, "ore": 2}`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceBundle {
    pub brick: u32,
    pub lumber: u32,
    pub wool: u32,
    pub grain: u32,
    pub ore: u32,
}

impl ResourceBundle {
    #[must_use]
    pub const fn new(brick: u32, lumber: u32, wool: u32, grain: u32, ore: u32) -> Self {
        Self {
            brick,
            lumber,
            wool,
            grain,
            ore,
        }
    }

    /// A bundle holding `amount` of a single resource.
    #[must_use]
    pub fn single(resource: Resource, amount: u32) -> Self {
        let mut bundle = Self::default();
        *bundle.get_mut(resource) = amount;
        bundle
    }

    #[must_use]
    pub fn get(&self, resource: Resource) -> u32 {
        match resource {
            Resource::Brick => self.brick,
            Resource::Lumber => self.lumber,
            Resource::Wool => self.wool,
            Resource::Grain => self.grain,
            Resource::Ore => self.ore,
        }
    }

    pub fn get_mut(&mut self, resource: Resource) -> &mut u32 {
        match resource {
            Resource::Brick => &mut self.brick,
            Resource::Lumber => &mut self.lumber,
            Resource::Wool => &mut self.wool,
            Resource::Grain => &mut self.grain,
            Resource::Ore => &mut self.ore,
        }
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        Resource::ALL.iter().map(|&r| self.get(r)).sum()
    }

    /// True when every count in `cost` is covered.
    #[must_use]
    pub fn covers(&self, cost: &ResourceBundle) -> bool {
        Resource::ALL.iter().all(|&r| self.get(r) >= cost.get(r))
    }

    pub fn add(&mut self, other: &ResourceBundle) {
        for r in Resource::ALL {
            *self.get_mut(r) += other.get(r);
        }
    }

    /// Remove `cost`, saturating at zero. Callers check [`covers`](Self::covers) first.
    pub fn remove(&mut self, cost: &ResourceBundle) {
        for r in Resource::ALL {
            let held = self.get_mut(r);
            *held = held.saturating_sub(cost.get(r));
        }
    }

    /// The resource holding the card at position `index` when the hand is
    /// laid out in [`Resource::ALL`] order.
    #[must_use]
    pub fn nth_card(&self, mut index: u32) -> Option<Resource> {
        for r in Resource::ALL {
            let count = self.get(r);
            if index < count {
                return Some(r);
            }
            index -= count;
        }
        None
    }
}

pub const ROAD_COST: ResourceBundle = ResourceBundle::new(1, 1, 0, 0, 0);
pub const SETTLEMENT_COST: ResourceBundle = ResourceBundle::new(1, 1, 1, 1, 0);
pub const CITY_COST: ResourceBundle = ResourceBundle::new(0, 0, 0, 2, 3);
pub const DEV_CARD_COST: ResourceBundle = ResourceBundle::new(0, 0, 1, 1, 1);

/// Land type of a tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileKind {
    Producing(Resource),
    Desert,
}

impl TileKind {
    #[must_use]
    pub fn resource(self) -> Option<Resource> {
        match self {
            TileKind::Producing(r) => Some(r),
            TileKind::Desert => None,
        }
    }
}

/// Tile multiset for the 19-tile board.
pub const TILE_KINDS: [TileKind; 19] = [
    TileKind::Producing(Resource::Brick),
    TileKind::Producing(Resource::Brick),
    TileKind::Producing(Resource::Brick),
    TileKind::Producing(Resource::Lumber),
    TileKind::Producing(Resource::Lumber),
    TileKind::Producing(Resource::Lumber),
    TileKind::Producing(Resource::Lumber),
    TileKind::Producing(Resource::Wool),
    TileKind::Producing(Resource::Wool),
    TileKind::Producing(Resource::Wool),
    TileKind::Producing(Resource::Wool),
    TileKind::Producing(Resource::Grain),
    TileKind::Producing(Resource::Grain),
    TileKind::Producing(Resource::Grain),
    TileKind::Producing(Resource::Grain),
    TileKind::Producing(Resource::Ore),
    TileKind::Producing(Resource::Ore),
    TileKind::Producing(Resource::Ore),
    TileKind::Desert,
];

/// Yield numbers, one per producing tile. No 7.
pub const NUMBER_TOKENS: [u8; 18] = [2, 3, 3, 4, 4, 5, 5, 6, 6, 8, 8, 9, 9, 10, 10, 11, 11, 12];

/// Harbor on a coastal vertex.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortKind {
    /// Any resource at 3:1.
    Generic,
    /// One resource at 2:1.
    Special(Resource),
}

pub const PORT_KINDS: [PortKind; 9] = [
    PortKind::Generic,
    PortKind::Generic,
    PortKind::Generic,
    PortKind::Generic,
    PortKind::Special(Resource::Brick),
    PortKind::Special(Resource::Lumber),
    PortKind::Special(Resource::Wool),
    PortKind::Special(Resource::Grain),
    PortKind::Special(Resource::Ore),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DevCardKind {
    Knight,
    VictoryPoint,
    RoadBuilding,
    YearOfPlenty,
    Monopoly,
}

/// A development card in a player's hand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevCard {
    pub kind: DevCardKind,
    /// False until the turn after purchase.
    pub playable: bool,
}

/// The 25-card development deck, unshuffled.
#[must_use]
pub fn dev_card_deck() -> Vec<DevCardKind> {
    let mut deck = Vec::with_capacity(25);
    deck.extend(std::iter::repeat(DevCardKind::Knight).take(14));
    deck.extend(std::iter::repeat(DevCardKind::VictoryPoint).take(5));
    deck.extend(std::iter::repeat(DevCardKind::RoadBuilding).take(2));
    deck.extend(std::iter::repeat(DevCardKind::YearOfPlenty).take(2));
    deck.extend(std::iter::repeat(DevCardKind::Monopoly).take(2));
    deck
}
