//! Settlement and trading board game.
//!
//! - `resources`: resource bundles, costs, tile/port/card multisets
//! - `graph`: hex board arena with shared corners and sides
//! - `scoring`: longest road, largest army, victory points
//! - `game`: the [`Settlers`] ruleset
//! - `view`: public and per-seat projections

pub mod game;
pub mod graph;
pub mod resources;
pub mod scoring;
pub mod view;

pub use game::{Hand, Phase, Settlers, SettlersConfig, SettlersMove, SettlersState};
pub use graph::{Board, Building, Edge, Tile, Vertex};
pub use resources::{DevCard, DevCardKind, PortKind, Resource, ResourceBundle, TileKind};
pub use scoring::{longest_road, Award};
pub use view::{SettlersPlayerView, SettlersPublicView};
