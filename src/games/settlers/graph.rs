//! Hex board construction.
//!
//! ## Layout
//!
//! Nineteen tiles in rows of 3-4-5-4-3, addressed by axial coordinates.
//! Corner `i` of a tile sits between neighbor directions `i` and `i + 1`,
//! so the same physical corner seen from the two neighboring tiles is
//! corner `i + 2` of the first and corner `i + 4` of the second. Every one
//! of those keys is registered in the lookup the moment a corner is first
//! created, which is what makes shared corners resolve to one vertex.
//!
//! ## Arena
//!
//! Tiles, vertices and edges live in flat `im::Vector`s and refer to each
//! other only by index. Topology is fixed after [`Board::generate`]; play
//! only changes the `building`, `owner` and `robber` fields.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::resources::{PortKind, TileKind, NUMBER_TOKENS, PORT_KINDS, TILE_KINDS};
use crate::core::{RandomSource, Seat};

/// Axial `(q, r)` of each tile, row by row.
pub const AXIAL_LAYOUT: [(i8, i8); 19] = [
    (0, -2), (1, -2), (2, -2),
    (-1, -1), (0, -1), (1, -1), (2, -1),
    (-2, 0), (-1, 0), (0, 0), (1, 0), (2, 0),
    (-2, 1), (-1, 1), (0, 1), (1, 1),
    (-2, 2), (-1, 2), (0, 2),
];

/// Axial neighbor offsets in angular order.
const DIRECTIONS: [(i8, i8); 6] = [(1, 0), (1, -1), (0, -1), (-1, 0), (-1, 1), (0, 1)];

type CornerKey = (i8, i8, u8);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Building {
    Settlement,
    City,
}

impl Building {
    /// Resource cards produced per matching roll.
    #[must_use]
    pub fn yield_amount(self) -> u32 {
        match self {
            Building::Settlement => 1,
            Building::City => 2,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub kind: TileKind,
    pub number: Option<u8>,
    pub robber: bool,
    pub q: i8,
    pub r: i8,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vertex {
    pub building: Option<Building>,
    pub owner: Option<Seat>,
    pub tiles: SmallVec<[usize; 3]>,
    pub neighbors: SmallVec<[usize; 3]>,
    pub edges: SmallVec<[usize; 3]>,
    pub port: Option<PortKind>,
}

impl Vertex {
    /// Coastal vertices touch fewer than three tiles.
    #[must_use]
    pub fn is_coastal(&self) -> bool {
        self.tiles.len() < 3
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub owner: Option<Seat>,
    pub vertices: [usize; 2],
}

impl Edge {
    /// The endpoint that is not `vertex`.
    #[must_use]
    pub fn other_end(&self, vertex: usize) -> usize {
        if self.vertices[0] == vertex {
            self.vertices[1]
        } else {
            self.vertices[0]
        }
    }
}

/// The full board arena.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub tiles: im::Vector<Tile>,
    pub vertices: im::Vector<Vertex>,
    pub edges: im::Vector<Edge>,
}

impl Board {
    /// Shuffle tiles, numbers and ports and build the adjacency arena.
    pub fn generate(rng: &mut impl RandomSource) -> Self {
        let mut kinds = TILE_KINDS;
        rng.shuffle(&mut kinds);
        let mut numbers = NUMBER_TOKENS;
        rng.shuffle(&mut numbers);
        let mut ports = PORT_KINDS;
        rng.shuffle(&mut ports);

        let mut next_number = numbers.into_iter();
        let tiles = AXIAL_LAYOUT
            .iter()
            .zip(kinds)
            .map(|(&(q, r), kind)| {
                let desert = kind == TileKind::Desert;
                Tile {
                    kind,
                    number: if desert { None } else { next_number.next() },
                    robber: desert,
                    q,
                    r,
                }
            })
            .collect();

        let (mut vertices, edges) = build_topology();
        let ring = coastline(&vertices, &edges);
        let len = ring.len();
        if len >= 2 * ports.len() {
            for (k, port) in ports.into_iter().enumerate() {
                let start = k * len / PORT_KINDS.len();
                vertices[ring[start]].port = Some(port);
                vertices[ring[(start + 1) % len]].port = Some(port);
            }
        }

        Self {
            tiles,
            vertices: vertices.into_iter().collect(),
            edges: edges.into_iter().collect(),
        }
    }

    /// Index of the tile holding the robber.
    #[must_use]
    pub fn robber_tile(&self) -> Option<usize> {
        self.tiles.iter().position(|t| t.robber)
    }

    /// Vertices on the corners of `tile`.
    pub fn tile_vertices(&self, tile: usize) -> impl Iterator<Item = usize> + '_ {
        self.vertices
            .iter()
            .enumerate()
            .filter(move |(_, v)| v.tiles.contains(&tile))
            .map(|(i, _)| i)
    }

    /// Seats with a building on a corner of `tile`.
    #[must_use]
    pub fn owners_on_tile(&self, tile: usize) -> SmallVec<[Seat; 4]> {
        let mut owners = SmallVec::new();
        for index in self.tile_vertices(tile) {
            if let Some(owner) = self.vertices[index].owner {
                if !owners.contains(&owner) {
                    owners.push(owner);
                }
            }
        }
        owners
    }

    /// True if any neighbor of `vertex` holds a building.
    #[must_use]
    pub fn crowded(&self, vertex: usize) -> bool {
        self.vertices[vertex]
            .neighbors
            .iter()
            .any(|&n| self.vertices[n].building.is_some())
    }

    /// True if `seat` owns a road ending at `vertex`.
    #[must_use]
    pub fn has_road_at(&self, vertex: usize, seat: Seat) -> bool {
        self.vertices[vertex]
            .edges
            .iter()
            .any(|&e| self.edges[e].owner == Some(seat))
    }

    /// True if a new road on `edge` would connect to `seat`'s network.
    ///
    /// A road connects through an own building at either end, or through an
    /// own road at an end not occupied by another player.
    #[must_use]
    pub fn road_connects(&self, edge: usize, seat: Seat) -> bool {
        self.edges[edge].vertices.iter().any(|&v| {
            let vertex = &self.vertices[v];
            match vertex.owner {
                Some(owner) => owner == seat,
                None => self.has_road_at(v, seat),
            }
        })
    }

    /// Ports reachable through `seat`'s buildings.
    pub fn ports_of(&self, seat: Seat) -> impl Iterator<Item = PortKind> + '_ {
        self.vertices
            .iter()
            .filter(move |v| v.owner == Some(seat))
            .filter_map(|v| v.port)
    }
}

/// The three keys naming corner `corner` of tile `(q, r)`.
fn corner_keys(q: i8, r: i8, corner: u8) -> [CornerKey; 3] {
    let i = corner as usize;
    let (aq, ar) = DIRECTIONS[i];
    let (bq, br) = DIRECTIONS[(i + 1) % 6];
    [
        (q, r, corner),
        (q + aq, r + ar, ((i + 2) % 6) as u8),
        (q + bq, r + br, ((i + 4) % 6) as u8),
    ]
}

fn build_topology() -> (Vec<Vertex>, Vec<Edge>) {
    let mut vertex_lookup: FxHashMap<CornerKey, usize> = FxHashMap::default();
    let mut edge_lookup: FxHashMap<(usize, usize), usize> = FxHashMap::default();
    let mut vertices: Vec<Vertex> = Vec::with_capacity(54);
    let mut edges: Vec<Edge> = Vec::with_capacity(72);

    for (tile, &(q, r)) in AXIAL_LAYOUT.iter().enumerate() {
        let mut corners = [0usize; 6];
        for corner in 0..6u8 {
            let index = match vertex_lookup.get(&(q, r, corner)) {
                Some(&index) => index,
                None => {
                    let index = vertices.len();
                    vertices.push(Vertex::default());
                    for key in corner_keys(q, r, corner) {
                        vertex_lookup.insert(key, index);
                    }
                    index
                }
            };
            if !vertices[index].tiles.contains(&tile) {
                vertices[index].tiles.push(tile);
            }
            corners[corner as usize] = index;
        }

        for side in 0..6 {
            let a = corners[side];
            let b = corners[(side + 1) % 6];
            let key = (a.min(b), a.max(b));
            if edge_lookup.contains_key(&key) {
                continue;
            }
            let index = edges.len();
            edges.push(Edge {
                owner: None,
                vertices: [key.0, key.1],
            });
            edge_lookup.insert(key, index);
            vertices[a].edges.push(index);
            vertices[b].edges.push(index);
        }
    }

    for edge in &edges {
        let [a, b] = edge.vertices;
        vertices[a].neighbors.push(b);
        vertices[b].neighbors.push(a);
    }

    (vertices, edges)
}

/// Coastal vertices in walking order around the board's rim.
fn coastline(vertices: &[Vertex], edges: &[Edge]) -> Vec<usize> {
    let shares_one_tile = |a: usize, b: usize| {
        vertices[a]
            .tiles
            .iter()
            .filter(|t| vertices[b].tiles.contains(t))
            .count()
            == 1
    };
    let rim_step = |from: usize, prev: Option<usize>| {
        vertices[from].edges.iter().map(|&e| edges[e].other_end(from)).find(|&n| {
            Some(n) != prev && vertices[n].is_coastal() && shares_one_tile(from, n)
        })
    };

    let Some(start) = vertices.iter().position(Vertex::is_coastal) else {
        return Vec::new();
    };

    let mut ring = vec![start];
    let mut prev = None;
    let mut current = start;
    while let Some(next) = rim_step(current, prev) {
        if next == start || ring.len() > vertices.len() {
            break;
        }
        ring.push(next);
        prev = Some(current);
        current = next;
    }
    ring
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::GameRng;
    use crate::games::settlers::resources::Resource;

    fn board() -> Board {
        Board::generate(&mut GameRng::new(17))
    }

    #[test]
    fn test_entity_counts_match_euler() {
        let board = board();
        let v = board.vertices.len() as i64;
        let e = board.edges.len() as i64;
        let f = board.tiles.len() as i64 + 1;

        assert_eq!(v, 54);
        assert_eq!(e, 72);
        assert_eq!(v - e + f, 2);
    }

    #[test]
    fn test_vertex_tile_degrees() {
        let board = board();
        let count = |n: usize| board.vertices.iter().filter(|v| v.tiles.len() == n).count();

        assert!(board.vertices.iter().all(|v| (1..=3).contains(&v.tiles.len())));
        assert_eq!(count(3), 24);
        assert_eq!(count(2), 12);
        assert_eq!(count(1), 18);
    }

    #[test]
    fn test_adjacency_is_symmetric() {
        let board = board();
        for (i, vertex) in board.vertices.iter().enumerate() {
            assert!((2..=3).contains(&vertex.neighbors.len()));
            assert_eq!(vertex.neighbors.len(), vertex.edges.len());
            for &n in &vertex.neighbors {
                assert!(board.vertices[n].neighbors.contains(&i));
            }
            for &e in &vertex.edges {
                assert!(board.edges[e].vertices.contains(&i));
            }
        }
    }

    #[test]
    fn test_every_tile_has_six_corners() {
        let board = board();
        for tile in 0..board.tiles.len() {
            assert_eq!(board.tile_vertices(tile).count(), 6);
        }
    }

    #[test]
    fn test_tiles_and_numbers() {
        let board = board();
        let desert: Vec<_> = board.tiles.iter().filter(|t| t.kind == TileKind::Desert).collect();
        assert_eq!(desert.len(), 1);
        assert!(desert[0].robber);
        assert_eq!(desert[0].number, None);
        assert_eq!(board.tiles.iter().filter(|t| t.robber).count(), 1);

        let mut numbers: Vec<u8> = board.tiles.iter().filter_map(|t| t.number).collect();
        numbers.sort_unstable();
        assert_eq!(numbers, NUMBER_TOKENS.to_vec());

        let ore = board
            .tiles
            .iter()
            .filter(|t| t.kind.resource() == Some(Resource::Ore))
            .count();
        assert_eq!(ore, 3);
    }

    #[test]
    fn test_ports_on_adjacent_coastal_pairs() {
        let board = board();
        let ported: Vec<usize> = (0..board.vertices.len())
            .filter(|&i| board.vertices[i].port.is_some())
            .collect();
        assert_eq!(ported.len(), 18);

        for &i in &ported {
            let vertex = &board.vertices[i];
            assert!(vertex.is_coastal());
            let partners = vertex
                .neighbors
                .iter()
                .filter(|&&n| board.vertices[n].port == vertex.port)
                .count();
            assert!(partners >= 1);
        }

        let generic = board
            .vertices
            .iter()
            .filter(|v| v.port == Some(PortKind::Generic))
            .count();
        assert_eq!(generic, 8);
    }

    #[test]
    fn test_coastline_walks_the_whole_rim() {
        let (vertices, edges) = build_topology();
        let ring = coastline(&vertices, &edges);
        assert_eq!(ring.len(), 30);

        let mut sorted = ring.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), 30);
    }

    #[test]
    fn test_generation_is_deterministic() {
        let a = Board::generate(&mut GameRng::new(99));
        let b = Board::generate(&mut GameRng::new(99));
        let c = Board::generate(&mut GameRng::new(100));

        assert_eq!(a, b);
        assert_ne!(a.tiles, c.tiles);
    }

    #[test]
    fn test_road_connects_stops_at_opponent_building() {
        let mut board = board();
        let me = Seat::new(0);
        let them = Seat::new(1);

        let first = 0;
        let [a, b] = board.edges[first].vertices;
        board.edges[first].owner = Some(me);
        board.vertices[b].building = Some(Building::Settlement);
        board.vertices[b].owner = Some(them);

        let through_b = board.vertices[b]
            .edges
            .iter()
            .copied()
            .find(|&e| e != first)
            .unwrap();
        let through_a = board.vertices[a]
            .edges
            .iter()
            .copied()
            .find(|&e| e != first)
            .unwrap();

        assert!(!board.road_connects(through_b, me));
        assert!(board.road_connects(through_a, me));
    }
}
