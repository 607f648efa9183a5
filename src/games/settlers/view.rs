//! Observer projections of a settlers session.
//!
//! Resource hands, development cards and hidden victory points only appear
//! in [`SettlersPlayerView`], and only for the viewing seat.

use serde::Serialize;
use smallvec::SmallVec;

use super::game::{Phase, SettlersState};
use super::graph::{Building, Tile};
use super::resources::{DevCard, PortKind, Resource, ResourceBundle};
use super::scoring::Award;
use crate::core::{ActorId, Seat};

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VertexView {
    pub building: Option<Building>,
    pub owner: Option<ActorId>,
    pub adjacent_hexes: SmallVec<[usize; 3]>,
    pub adjacent_vertices: SmallVec<[usize; 3]>,
    pub adjacent_edges: SmallVec<[usize; 3]>,
    pub port: Option<PortKind>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeView {
    pub owner: Option<ActorId>,
    pub vertices: [usize; 2],
}

/// What everyone may know about one seat.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatSummary {
    pub id: ActorId,
    pub nickname: String,
    pub seat: Seat,
    pub resource_count: u32,
    pub dev_card_count: usize,
    pub knights_played: u32,
    /// Points excluding hidden victory point cards.
    pub victory_points: u32,
    pub roads_left: u8,
    pub settlements_left: u8,
    pub cities_left: u8,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AwardView {
    pub holder: ActorId,
    pub count: u32,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlersPublicView {
    pub hexes: Vec<Tile>,
    pub vertices: Vec<VertexView>,
    pub edges: Vec<EdgeView>,
    pub players: Vec<SeatSummary>,
    pub current_player: Option<ActorId>,
    pub phase: Phase,
    pub longest_road: Option<AwardView>,
    pub largest_army: Option<AwardView>,
    pub last_roll: Option<[u8; 2]>,
    pub pending_discard: Vec<ActorId>,
    pub dev_cards_remaining: usize,
    pub winner: Option<ActorId>,
}

impl SettlersPublicView {
    pub(crate) fn build(state: &SettlersState) -> Self {
        let roster = state.roster();
        let actor = |seat: Seat| roster.actor(seat).cloned();
        let award = |a: Option<Award>| {
            a.and_then(|a| {
                Some(AwardView {
                    holder: actor(a.seat)?,
                    count: a.count,
                })
            })
        };
        let board = state.board();

        let players = roster
            .iter()
            .filter_map(|(seat, p)| {
                let hand = state.hand(seat)?;
                Some(SeatSummary {
                    id: p.id.clone(),
                    nickname: p.nickname.clone(),
                    seat,
                    resource_count: hand.resources.total(),
                    dev_card_count: hand.dev_cards.len(),
                    knights_played: hand.knights_played,
                    victory_points: state.victory_points(seat, false),
                    roads_left: hand.roads_left,
                    settlements_left: hand.settlements_left,
                    cities_left: hand.cities_left,
                })
            })
            .collect();

        let current_player = if state.winner.is_some() {
            None
        } else {
            actor(state.pending_discards().next().unwrap_or(state.current_seat()))
        };

        Self {
            hexes: board.tiles.iter().cloned().collect(),
            vertices: board
                .vertices
                .iter()
                .map(|v| VertexView {
                    building: v.building,
                    owner: v.owner.and_then(actor),
                    adjacent_hexes: v.tiles.clone(),
                    adjacent_vertices: v.neighbors.clone(),
                    adjacent_edges: v.edges.clone(),
                    port: v.port,
                })
                .collect(),
            edges: board
                .edges
                .iter()
                .map(|e| EdgeView {
                    owner: e.owner.and_then(actor),
                    vertices: e.vertices,
                })
                .collect(),
            players,
            current_player,
            phase: state.phase(),
            longest_road: award(state.longest_road()),
            largest_army: award(state.largest_army()),
            last_roll: state.last_roll(),
            pending_discard: state.pending_discards().filter_map(actor).collect(),
            dev_cards_remaining: state.dev_cards_remaining(),
            winner: state.winner.and_then(actor),
        }
    }
}

/// One seat's view: everything public plus their own hand.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlersPlayerView {
    #[serde(flatten)]
    pub public: SettlersPublicView,
    pub resources: ResourceBundle,
    pub dev_cards: Vec<DevCard>,
    /// Full total including hidden victory point cards.
    pub my_victory_points: u32,
    pub is_my_turn: bool,
    pub can_roll: bool,
    pub can_build: bool,
    pub must_discard: u32,
    pub trade_ratios: Vec<(Resource, u32)>,
}

impl SettlersPlayerView {
    pub(crate) fn build(state: &SettlersState, actor: &ActorId) -> Self {
        let public = SettlersPublicView::build(state);
        let seat = state.roster().seat_of(actor);
        let hand = seat.and_then(|s| state.hand(s));
        let is_my_turn = public.current_player.as_ref() == Some(actor);
        let phase = state.phase();

        Self {
            resources: hand.map(|h| h.resources).unwrap_or_default(),
            dev_cards: hand.map(|h| h.dev_cards.iter().copied().collect()).unwrap_or_default(),
            my_victory_points: seat.map_or(0, |s| state.victory_points(s, true)),
            is_my_turn,
            can_roll: is_my_turn && phase == Phase::Roll,
            can_build: is_my_turn && matches!(phase, Phase::Main | Phase::Setup { .. }),
            must_discard: seat.map_or(0, |s| state.discard_due(s)),
            trade_ratios: seat.map_or_else(Vec::new, |s| {
                Resource::ALL
                    .iter()
                    .map(|&r| (r, state.trade_ratio(s, r)))
                    .collect()
            }),
            public,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Participant;
    use crate::games::settlers::game::{Settlers, SettlersConfig};
    use crate::rules::GamePlugin;

    fn state() -> SettlersState {
        let players: Vec<_> = ["a", "b", "c"].iter().map(|id| Participant::new(*id, *id)).collect();
        let config = SettlersConfig::default()
            .with_shuffled_turn_order(false)
            .with_starting_resources(ResourceBundle::new(1, 2, 0, 0, 0));
        Settlers.new_game(&players, config, 3).unwrap()
    }

    #[test]
    fn test_public_view_hides_hands() {
        let state = state();
        let view = Settlers.public_view(&state);
        assert_eq!(view.hexes.len(), 19);
        assert_eq!(view.vertices.len(), 54);
        assert_eq!(view.edges.len(), 72);
        assert_eq!(view.players[0].resource_count, 3);
        assert_eq!(view.current_player, Some(ActorId::from("a")));

        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("resources").is_none());
        assert!(json["players"][0].get("resources").is_none());
    }

    #[test]
    fn test_player_view_includes_own_hand() {
        let state = state();
        let view = Settlers.player_view(&state, &ActorId::from("b"));
        assert_eq!(view.resources, ResourceBundle::new(1, 2, 0, 0, 0));
        assert!(!view.is_my_turn);
        assert!(!view.can_build);

        let mine = Settlers.player_view(&state, &ActorId::from("a"));
        assert!(mine.is_my_turn);
        assert!(mine.can_build);
        assert!(!mine.can_roll);

        let json = serde_json::to_value(&mine).unwrap();
        assert_eq!(json["phase"], serde_json::json!({ "setup": { "round": 1 } }));
        assert_eq!(json["resources"]["lumber"], 2);
    }
}
