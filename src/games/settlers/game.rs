//! The settlement and trading ruleset.
//!
//! ## Turn structure
//!
//! 1. Two setup rounds in snake order. Each seat places a settlement, then a
//!    road touching it. Second-round settlements yield one card per
//!    adjacent producing tile.
//! 2. Regular turns: roll, then build, trade and play development cards
//!    until `end_turn`.
//! 3. A roll of 7 sends every seat holding more than seven cards to the
//!    discard step, after which the roller moves the robber.
//!
//! The first seat to reach the configured victory total on their own action
//! wins.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::graph::{Board, Building};
use super::resources::{
    dev_card_deck, DevCard, DevCardKind, PortKind, Resource, ResourceBundle, CITY_COST,
    DEV_CARD_COST, ROAD_COST, SETTLEMENT_COST,
};
use super::scoring::{
    award_points, building_points, contest, longest_road, Award, LARGEST_ARMY_MIN,
    LONGEST_ROAD_MIN,
};
use super::view::{SettlersPlayerView, SettlersPublicView};
use crate::core::{
    parse_config, seat_roster, Action, ActorId, EngineError, GameEvent, GameRng, Participant,
    RandomSource, Rejection, Roster, Seat, SeatMap,
};
use crate::rules::{GameInfo, GamePlugin, Outcome, Transition};

pub const SETTLEMENTS_PER_PLAYER: u8 = 5;
pub const CITIES_PER_PLAYER: u8 = 4;
pub const ROADS_PER_PLAYER: u8 = 15;
/// Hands above this size discard half on a 7.
pub const DISCARD_LIMIT: u32 = 7;

/// Session configuration. Every key is optional.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SettlersConfig {
    /// Points needed to win.
    pub victory_points: u32,
    /// Cards each seat starts with.
    pub starting_resources: ResourceBundle,
    /// Randomize seating order instead of using the participant order.
    pub shuffle_turn_order: bool,
}

impl Default for SettlersConfig {
    fn default() -> Self {
        Self {
            victory_points: 10,
            starting_resources: ResourceBundle::default(),
            shuffle_turn_order: true,
        }
    }
}

impl SettlersConfig {
    pub fn with_victory_points(mut self, points: u32) -> Self {
        self.victory_points = points;
        self
    }

    pub fn with_starting_resources(mut self, resources: ResourceBundle) -> Self {
        self.starting_resources = resources;
        self
    }

    pub fn with_shuffled_turn_order(mut self, shuffle: bool) -> Self {
        self.shuffle_turn_order = shuffle;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Initial placement; `round` is 1 or 2.
    Setup { round: u8 },
    Roll,
    Main,
    Discard,
    Robber,
    Finished,
}

/// Per-seat holdings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hand {
    pub resources: ResourceBundle,
    pub dev_cards: im::Vector<DevCard>,
    pub knights_played: u32,
    pub settlements_left: u8,
    pub cities_left: u8,
    pub roads_left: u8,
    pub played_dev_card: bool,
}

impl Hand {
    fn new(resources: ResourceBundle) -> Self {
        Self {
            resources,
            dev_cards: im::Vector::new(),
            knights_played: 0,
            settlements_left: SETTLEMENTS_PER_PLAYER,
            cities_left: CITIES_PER_PLAYER,
            roads_left: ROADS_PER_PLAYER,
            played_dev_card: false,
        }
    }

    /// Victory point cards held. They count toward the owner's total but
    /// stay hidden from everyone else.
    #[must_use]
    pub fn hidden_points(&self) -> u32 {
        self.dev_cards
            .iter()
            .filter(|c| c.kind == DevCardKind::VictoryPoint)
            .count() as u32
    }
}

/// Moves accepted by the ruleset, decoded from [`Action`]s.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum SettlersMove {
    BuildSettlement {
        vertex_index: usize,
    },
    BuildRoad {
        edge_index: usize,
    },
    BuildCity {
        vertex_index: usize,
    },
    RollDice,
    EndTurn,
    BuyDevCard,
    PlayDevCard {
        card_index: usize,
        /// Monopoly target.
        #[serde(default)]
        resource: Option<Resource>,
        /// Year of plenty picks.
        #[serde(default)]
        resource1: Option<Resource>,
        #[serde(default)]
        resource2: Option<Resource>,
    },
    MoveRobber {
        hex_index: usize,
        #[serde(default)]
        steal_from_player: Option<ActorId>,
    },
    Discard {
        resources: ResourceBundle,
    },
    TradeBank {
        give: Resource,
        receive: Resource,
    },
}

/// Complete session state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SettlersState {
    pub(crate) roster: Roster,
    pub(crate) config: SettlersConfig,
    pub(crate) board: Board,
    pub(crate) hands: SeatMap<Hand>,
    pub(crate) current: Seat,
    pub(crate) phase: Phase,
    /// Settlement placed in the current setup step, awaiting its road.
    pub(crate) setup_anchor: Option<usize>,
    /// Phase to return to once the robber has moved.
    pub(crate) resume: Phase,
    pub(crate) free_roads: u8,
    pub(crate) dev_deck: im::Vector<DevCardKind>,
    pub(crate) longest_road: Option<Award>,
    pub(crate) largest_army: Option<Award>,
    pub(crate) last_roll: Option<[u8; 2]>,
    pub(crate) pending_discard: im::Vector<Seat>,
    pub(crate) winner: Option<Seat>,
    pub(crate) turn: u32,
    pub(crate) rng: GameRng,
}

impl SettlersState {
    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[must_use]
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Seat whose turn it is (ignoring pending discards).
    #[must_use]
    pub fn current_seat(&self) -> Seat {
        self.current
    }

    #[must_use]
    pub fn hand(&self, seat: Seat) -> Option<&Hand> {
        self.hands.get(seat)
    }

    #[must_use]
    pub fn longest_road(&self) -> Option<Award> {
        self.longest_road
    }

    #[must_use]
    pub fn largest_army(&self) -> Option<Award> {
        self.largest_army
    }

    #[must_use]
    pub fn last_roll(&self) -> Option<[u8; 2]> {
        self.last_roll
    }

    #[must_use]
    pub fn dev_cards_remaining(&self) -> usize {
        self.dev_deck.len()
    }

    /// Seats that still owe a discard.
    pub fn pending_discards(&self) -> impl Iterator<Item = Seat> + '_ {
        self.pending_discard.iter().copied()
    }

    /// Victory points for `seat`; hidden victory cards only when asked.
    #[must_use]
    pub fn victory_points(&self, seat: Seat, include_hidden: bool) -> u32 {
        let hidden = if include_hidden {
            self.hands.get(seat).map_or(0, Hand::hidden_points)
        } else {
            0
        };
        building_points(&self.board, seat)
            + award_points(seat, self.longest_road, self.largest_army)
            + hidden
    }

    /// Cards of `give` needed for one card from the bank.
    #[must_use]
    pub fn trade_ratio(&self, seat: Seat, give: Resource) -> u32 {
        let mut ratio = 4;
        for port in self.board.ports_of(seat) {
            match port {
                PortKind::Special(r) if r == give => return 2,
                PortKind::Generic => ratio = 3,
                PortKind::Special(_) => {}
            }
        }
        ratio
    }

    /// Number of cards `seat` must give up in the pending discard.
    #[must_use]
    pub fn discard_due(&self, seat: Seat) -> u32 {
        if self.pending_discard.contains(&seat) {
            self.hands.get(seat).map_or(0, |h| h.resources.total() / 2)
        } else {
            0
        }
    }

    fn name(&self, seat: Seat) -> String {
        self.roster.actor(seat).map(ToString::to_string).unwrap_or_default()
    }

    fn is_setup(&self) -> bool {
        matches!(self.phase, Phase::Setup { .. })
    }

    // === Validation ===

    fn check(&self, mv: &SettlersMove, actor: &ActorId) -> Result<Seat, Rejection> {
        if self.winner.is_some() || self.phase == Phase::Finished {
            return Err(Rejection::game_over());
        }
        let seat = self.roster.seat_of(actor).ok_or_else(Rejection::not_participant)?;

        if let SettlersMove::Discard { resources } = mv {
            self.check_discard(seat, resources)?;
            return Ok(seat);
        }
        if self.phase == Phase::Discard {
            return Err(Rejection::wrong_phase("waiting for players to discard"));
        }
        if seat != self.current {
            return Err(Rejection::not_your_turn());
        }

        let hand = &self.hands[seat];
        let verdict = match mv {
            SettlersMove::BuildSettlement { vertex_index } => {
                self.check_settlement(seat, *vertex_index)
            }
            SettlersMove::BuildRoad { edge_index } => self.check_road(seat, *edge_index),
            _ if self.is_setup() => Err(Rejection::wrong_phase(
                "place your starting settlement and road first",
            )),
            SettlersMove::BuildCity { vertex_index } => {
                self.require_phase(Phase::Main, "cannot build now")?;
                let vertex = self
                    .board
                    .vertices
                    .get(*vertex_index)
                    .ok_or_else(|| Rejection::malformed("no such vertex"))?;
                if vertex.building != Some(Building::Settlement) || vertex.owner != Some(seat) {
                    return Err(Rejection::illegal("only your own settlement can become a city"));
                }
                if !hand.resources.covers(&CITY_COST) {
                    return Err(Rejection::insufficient("not enough resources"));
                }
                if hand.cities_left == 0 {
                    return Err(Rejection::insufficient("no cities left"));
                }
                Ok(())
            }
            SettlersMove::RollDice => self.require_phase(Phase::Roll, "cannot roll now"),
            SettlersMove::EndTurn => self.require_phase(Phase::Main, "cannot end the turn now"),
            SettlersMove::BuyDevCard => {
                self.require_phase(Phase::Main, "cannot buy development cards now")?;
                if self.dev_deck.is_empty() {
                    return Err(Rejection::insufficient("development deck is empty"));
                }
                if !hand.resources.covers(&DEV_CARD_COST) {
                    return Err(Rejection::insufficient("not enough resources"));
                }
                Ok(())
            }
            SettlersMove::PlayDevCard {
                card_index,
                resource,
                resource1,
                resource2,
            } => {
                if !matches!(self.phase, Phase::Roll | Phase::Main) {
                    return Err(Rejection::wrong_phase("cannot play development cards now"));
                }
                if hand.played_dev_card {
                    return Err(Rejection::illegal("already played a development card this turn"));
                }
                let card = hand
                    .dev_cards
                    .get(*card_index)
                    .filter(|c| c.playable)
                    .ok_or_else(|| Rejection::illegal("that card cannot be played"))?;
                match card.kind {
                    DevCardKind::VictoryPoint => {
                        Err(Rejection::illegal("victory point cards score automatically"))
                    }
                    DevCardKind::YearOfPlenty if resource1.is_none() || resource2.is_none() => {
                        Err(Rejection::malformed("choose two resources"))
                    }
                    DevCardKind::Monopoly if resource.is_none() => {
                        Err(Rejection::malformed("choose a resource to monopolize"))
                    }
                    _ => Ok(()),
                }
            }
            SettlersMove::MoveRobber {
                hex_index,
                steal_from_player,
            } => {
                self.require_phase(Phase::Robber, "cannot move the robber now")?;
                let tile = self
                    .board
                    .tiles
                    .get(*hex_index)
                    .ok_or_else(|| Rejection::malformed("no such tile"))?;
                if tile.robber {
                    return Err(Rejection::illegal("the robber must move to a different tile"));
                }
                if let Some(victim) = steal_from_player {
                    let victim = self
                        .roster
                        .seat_of(victim)
                        .ok_or_else(|| Rejection::illegal("unknown player to steal from"))?;
                    if victim == seat {
                        return Err(Rejection::illegal("cannot steal from yourself"));
                    }
                    if !self.board.owners_on_tile(*hex_index).contains(&victim) {
                        return Err(Rejection::illegal("that player has no building on this tile"));
                    }
                }
                Ok(())
            }
            SettlersMove::TradeBank { give, receive } => {
                self.require_phase(Phase::Main, "cannot trade now")?;
                if give == receive {
                    return Err(Rejection::illegal("trade must exchange different resources"));
                }
                let ratio = self.trade_ratio(seat, *give);
                if hand.resources.get(*give) < ratio {
                    return Err(Rejection::insufficient(format!("{ratio} {give} needed")));
                }
                Ok(())
            }
            SettlersMove::Discard { .. } => Ok(()),
        };
        verdict.map(|()| seat)
    }

    fn require_phase(&self, phase: Phase, reason: &str) -> Result<(), Rejection> {
        if self.phase == phase {
            Ok(())
        } else {
            Err(Rejection::wrong_phase(reason))
        }
    }

    fn check_settlement(&self, seat: Seat, vertex_index: usize) -> Result<(), Rejection> {
        let setup = self.is_setup();
        if setup {
            if self.setup_anchor.is_some() {
                return Err(Rejection::wrong_phase("place a road next to your new settlement"));
            }
        } else {
            self.require_phase(Phase::Main, "cannot build now")?;
        }

        let vertex = self
            .board
            .vertices
            .get(vertex_index)
            .ok_or_else(|| Rejection::malformed("no such vertex"))?;
        if vertex.building.is_some() {
            return Err(Rejection::illegal("vertex already has a building"));
        }
        if self.board.crowded(vertex_index) {
            return Err(Rejection::illegal("too close to another building"));
        }

        let hand = &self.hands[seat];
        if !setup {
            if !self.board.has_road_at(vertex_index, seat) {
                return Err(Rejection::illegal("settlement must connect to your road"));
            }
            if !hand.resources.covers(&SETTLEMENT_COST) {
                return Err(Rejection::insufficient("not enough resources"));
            }
        }
        if hand.settlements_left == 0 {
            return Err(Rejection::insufficient("no settlements left"));
        }
        Ok(())
    }

    fn check_road(&self, seat: Seat, edge_index: usize) -> Result<(), Rejection> {
        let setup = self.is_setup();
        if !setup {
            self.require_phase(Phase::Main, "cannot build now")?;
        }

        let edge = self
            .board
            .edges
            .get(edge_index)
            .ok_or_else(|| Rejection::malformed("no such edge"))?;
        if edge.owner.is_some() {
            return Err(Rejection::illegal("edge already has a road"));
        }

        let hand = &self.hands[seat];
        if setup {
            let anchor = self
                .setup_anchor
                .ok_or_else(|| Rejection::wrong_phase("place a settlement first"))?;
            if !edge.vertices.contains(&anchor) {
                return Err(Rejection::illegal("road must touch the settlement just placed"));
            }
        } else {
            if !self.board.road_connects(edge_index, seat) {
                return Err(Rejection::illegal("road must connect to your buildings or roads"));
            }
            if self.free_roads == 0 && !hand.resources.covers(&ROAD_COST) {
                return Err(Rejection::insufficient("not enough resources"));
            }
        }
        if hand.roads_left == 0 {
            return Err(Rejection::insufficient("no roads left"));
        }
        Ok(())
    }

    fn check_discard(&self, seat: Seat, resources: &ResourceBundle) -> Result<(), Rejection> {
        if self.phase != Phase::Discard || !self.pending_discard.contains(&seat) {
            return Err(Rejection::wrong_phase("you do not need to discard"));
        }
        let held = &self.hands[seat].resources;
        if !held.covers(resources) {
            return Err(Rejection::insufficient("cannot discard more than you hold"));
        }
        let due = held.total() / 2;
        if resources.total() != due {
            return Err(Rejection::illegal(format!("must discard exactly {due} cards")));
        }
        Ok(())
    }

    // === Application ===

    fn perform(
        &mut self,
        mv: &SettlersMove,
        seat: Seat,
        actor: &ActorId,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), EngineError> {
        match mv {
            SettlersMove::BuildSettlement { vertex_index } => {
                self.place_settlement(seat, *vertex_index, actor, events)
            }
            SettlersMove::BuildRoad { edge_index } => {
                self.place_road(seat, *edge_index, actor, events);
                Ok(())
            }
            SettlersMove::BuildCity { vertex_index } => {
                let hand = &mut self.hands[seat];
                hand.resources.remove(&CITY_COST);
                hand.cities_left -= 1;
                hand.settlements_left += 1;
                let vertex = self
                    .board
                    .vertices
                    .get_mut(*vertex_index)
                    .ok_or_else(|| EngineError::invariant("city vertex vanished"))?;
                vertex.building = Some(Building::City);
                events.push(
                    GameEvent::new("city_built")
                        .with_actor(actor)
                        .with_payload(json!({ "vertexIndex": vertex_index })),
                );
                Ok(())
            }
            SettlersMove::RollDice => {
                self.roll(actor, events);
                Ok(())
            }
            SettlersMove::EndTurn => {
                let hand = &mut self.hands[seat];
                for card in hand.dev_cards.iter_mut() {
                    card.playable = true;
                }
                hand.played_dev_card = false;
                self.free_roads = 0;
                self.current = seat.offset(1, self.roster.len());
                self.phase = Phase::Roll;
                self.turn += 1;
                events.push(GameEvent::new("turn_ended").with_actor(actor).with_payload(json!({
                    "next": self.name(self.current),
                    "turn": self.turn,
                })));
                Ok(())
            }
            SettlersMove::BuyDevCard => {
                let kind = self
                    .dev_deck
                    .pop_back()
                    .ok_or_else(|| EngineError::invariant("development deck empty on purchase"))?;
                let hand = &mut self.hands[seat];
                hand.resources.remove(&DEV_CARD_COST);
                hand.dev_cards.push_back(DevCard {
                    kind,
                    playable: false,
                });
                events.push(GameEvent::new("dev_card_bought").with_actor(actor).with_payload(
                    json!({ "remaining": self.dev_deck.len() }),
                ));
                Ok(())
            }
            SettlersMove::PlayDevCard {
                card_index,
                resource,
                resource1,
                resource2,
            } => self.play_dev_card(seat, *card_index, *resource, [*resource1, *resource2], actor, events),
            SettlersMove::MoveRobber {
                hex_index,
                steal_from_player,
            } => {
                self.move_robber(seat, *hex_index, steal_from_player.as_ref(), actor, events);
                Ok(())
            }
            SettlersMove::Discard { resources } => {
                self.hands[seat].resources.remove(resources);
                self.pending_discard.retain(|s| *s != seat);
                if self.pending_discard.is_empty() {
                    self.phase = Phase::Robber;
                }
                events.push(
                    GameEvent::new("discarded")
                        .with_actor(actor)
                        .with_payload(json!({ "count": resources.total() })),
                );
                Ok(())
            }
            SettlersMove::TradeBank { give, receive } => {
                let ratio = self.trade_ratio(seat, *give);
                let hand = &mut self.hands[seat];
                hand.resources.remove(&ResourceBundle::single(*give, ratio));
                *hand.resources.get_mut(*receive) += 1;
                events.push(GameEvent::new("bank_trade").with_actor(actor).with_payload(json!({
                    "give": give,
                    "receive": receive,
                    "ratio": ratio,
                })));
                Ok(())
            }
        }
    }

    fn place_settlement(
        &mut self,
        seat: Seat,
        vertex_index: usize,
        actor: &ActorId,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), EngineError> {
        let vertex = self
            .board
            .vertices
            .get_mut(vertex_index)
            .ok_or_else(|| EngineError::invariant("settlement vertex vanished"))?;
        vertex.building = Some(Building::Settlement);
        vertex.owner = Some(seat);
        let adjacent: Vec<usize> = vertex.tiles.iter().copied().collect();

        let hand = &mut self.hands[seat];
        hand.settlements_left -= 1;
        match self.phase {
            Phase::Setup { round } => {
                self.setup_anchor = Some(vertex_index);
                if round == 2 {
                    let mut granted = ResourceBundle::default();
                    for tile in adjacent {
                        if let Some(resource) = self.board.tiles[tile].kind.resource() {
                            *granted.get_mut(resource) += 1;
                        }
                    }
                    hand.resources.add(&granted);
                    events.push(
                        GameEvent::new("starting_resources")
                            .with_actor(actor)
                            .with_payload(json!(granted)),
                    );
                }
            }
            _ => hand.resources.remove(&SETTLEMENT_COST),
        }

        events.push(
            GameEvent::new("settlement_built")
                .with_actor(actor)
                .with_payload(json!({ "vertexIndex": vertex_index })),
        );
        Ok(())
    }

    fn place_road(&mut self, seat: Seat, edge_index: usize, actor: &ActorId, events: &mut Vec<GameEvent>) {
        if let Some(edge) = self.board.edges.get_mut(edge_index) {
            edge.owner = Some(seat);
        }
        let hand = &mut self.hands[seat];
        hand.roads_left -= 1;

        let setup_round = match self.phase {
            Phase::Setup { round } => Some(round),
            _ => None,
        };
        if setup_round.is_none() {
            if self.free_roads > 0 {
                self.free_roads -= 1;
            } else {
                hand.resources.remove(&ROAD_COST);
            }
        }

        events.push(
            GameEvent::new("road_built")
                .with_actor(actor)
                .with_payload(json!({ "edgeIndex": edge_index })),
        );

        if let Some(round) = setup_round {
            self.advance_setup(seat, round);
        }
    }

    fn advance_setup(&mut self, seat: Seat, round: u8) {
        let last = self.roster.len().saturating_sub(1);
        self.setup_anchor = None;
        match (round, seat.index()) {
            (1, i) if i == last => self.phase = Phase::Setup { round: 2 },
            (1, i) => self.current = Seat::new((i + 1) as u8),
            (_, 0) => {
                self.phase = Phase::Roll;
                self.turn = 1;
            }
            (_, i) => self.current = Seat::new((i - 1) as u8),
        }
    }

    fn roll(&mut self, actor: &ActorId, events: &mut Vec<GameEvent>) {
        let dice = [self.rng.roll_die(6) as u8, self.rng.roll_die(6) as u8];
        let total = dice[0] + dice[1];
        self.last_roll = Some(dice);
        events.push(
            GameEvent::new("dice_rolled")
                .with_actor(actor)
                .with_payload(json!({ "dice": dice, "total": total })),
        );

        if total == 7 {
            self.pending_discard = self
                .hands
                .iter()
                .filter(|(_, hand)| hand.resources.total() > DISCARD_LIMIT)
                .map(|(seat, _)| seat)
                .collect();
            self.resume = Phase::Main;
            self.phase = if self.pending_discard.is_empty() {
                Phase::Robber
            } else {
                Phase::Discard
            };
            if !self.pending_discard.is_empty() {
                let names: Vec<String> = self.pending_discard.iter().map(|&s| self.name(s)).collect();
                events.push(GameEvent::new("discard_required").with_payload(json!({ "players": names })));
            }
            return;
        }

        let mut gains: SeatMap<ResourceBundle> = SeatMap::with_value(self.roster.len(), ResourceBundle::default());
        for (index, tile) in self.board.tiles.iter().enumerate() {
            if tile.number != Some(total) || tile.robber {
                continue;
            }
            let Some(resource) = tile.kind.resource() else {
                continue;
            };
            for vertex in self.board.vertices.iter().filter(|v| v.tiles.contains(&index)) {
                if let (Some(owner), Some(building)) = (vertex.owner, vertex.building) {
                    *gains[owner].get_mut(resource) += building.yield_amount();
                }
            }
        }

        let mut produced = serde_json::Map::new();
        for (seat, gain) in gains.iter() {
            if gain.total() == 0 {
                continue;
            }
            self.hands[seat].resources.add(gain);
            produced.insert(self.name(seat), json!(gain));
        }
        if !produced.is_empty() {
            events.push(GameEvent::new("resources_produced").with_payload(Value::Object(produced)));
        }
        self.phase = Phase::Main;
    }

    fn play_dev_card(
        &mut self,
        seat: Seat,
        card_index: usize,
        monopoly: Option<Resource>,
        plenty: [Option<Resource>; 2],
        actor: &ActorId,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), EngineError> {
        if card_index >= self.hands[seat].dev_cards.len() {
            return Err(EngineError::invariant("played card index out of range"));
        }
        let card = self.hands[seat].dev_cards.remove(card_index);
        self.hands[seat].played_dev_card = true;

        let mut detail = json!({ "card": card.kind });
        match card.kind {
            DevCardKind::Knight => {
                self.hands[seat].knights_played += 1;
                self.resume = self.phase;
                self.phase = Phase::Robber;
            }
            DevCardKind::RoadBuilding => {
                self.free_roads = 2.min(self.hands[seat].roads_left);
            }
            DevCardKind::YearOfPlenty => {
                for resource in plenty.into_iter().flatten() {
                    *self.hands[seat].resources.get_mut(resource) += 1;
                }
            }
            DevCardKind::Monopoly => {
                let resource = monopoly.ok_or_else(|| EngineError::invariant("monopoly without a resource"))?;
                let mut taken = 0;
                for other in self.hands.seats().filter(|s| *s != seat).collect::<Vec<_>>() {
                    let held = self.hands[other].resources.get_mut(resource);
                    taken += *held;
                    *held = 0;
                }
                *self.hands[seat].resources.get_mut(resource) += taken;
                detail["resource"] = json!(resource);
                detail["taken"] = json!(taken);
            }
            DevCardKind::VictoryPoint => {
                return Err(EngineError::invariant("victory point card played"));
            }
        }

        events.push(GameEvent::new("dev_card_played").with_actor(actor).with_payload(detail));
        Ok(())
    }

    fn move_robber(
        &mut self,
        seat: Seat,
        tile: usize,
        victim: Option<&ActorId>,
        actor: &ActorId,
        events: &mut Vec<GameEvent>,
    ) {
        for t in self.board.tiles.iter_mut() {
            t.robber = false;
        }
        if let Some(target) = self.board.tiles.get_mut(tile) {
            target.robber = true;
        }
        self.phase = self.resume;
        events.push(
            GameEvent::new("robber_moved")
                .with_actor(actor)
                .with_payload(json!({ "hexIndex": tile })),
        );

        let Some(victim_seat) = victim.and_then(|v| self.roster.seat_of(v)) else {
            return;
        };
        let held = self.hands[victim_seat].resources;
        if held.total() == 0 {
            return;
        }
        let pick = self.rng.below(held.total());
        if let Some(stolen) = held.nth_card(pick) {
            *self.hands[victim_seat].resources.get_mut(stolen) -= 1;
            *self.hands[seat].resources.get_mut(stolen) += 1;
            events.push(
                GameEvent::new("resource_stolen")
                    .with_actor(actor)
                    .with_payload(json!({ "from": self.name(victim_seat) })),
            );
        }
    }

    /// Recount both bonuses, emitting an event whenever the holder changes.
    fn settle_awards(&mut self, events: &mut Vec<GameEvent>) {
        let roads: Vec<u32> = self
            .hands
            .seats()
            .map(|seat| longest_road(&self.board, seat))
            .collect();
        let longest = contest(self.longest_road, &roads, LONGEST_ROAD_MIN);
        if longest.map(|a| a.seat) != self.longest_road.map(|a| a.seat) {
            events.push(GameEvent::new("longest_road_changed").with_payload(json!({
                "holder": longest.map(|a| self.name(a.seat)),
                "length": longest.map(|a| a.count),
            })));
        }
        self.longest_road = longest;

        let knights: Vec<u32> = self.hands.values().map(|h| h.knights_played).collect();
        let largest = contest(self.largest_army, &knights, LARGEST_ARMY_MIN);
        if largest.map(|a| a.seat) != self.largest_army.map(|a| a.seat) {
            events.push(GameEvent::new("largest_army_changed").with_payload(json!({
                "holder": largest.map(|a| self.name(a.seat)),
                "knights": largest.map(|a| a.count),
            })));
        }
        self.largest_army = largest;
    }

    fn check_victory(&mut self, seat: Seat, actor: &ActorId, events: &mut Vec<GameEvent>) {
        let points = self.victory_points(seat, true);
        if points >= self.config.victory_points {
            self.winner = Some(seat);
            self.phase = Phase::Finished;
            info!(winner = %actor, points, turn = self.turn, "settlers game won");
            events.push(
                GameEvent::new("game_ended")
                    .with_actor(actor)
                    .with_payload(json!({ "winner": actor, "points": points })),
            );
        }
    }

    /// Give up `due` cards, most plentiful first.
    fn auto_discard(&self, seat: Seat) -> ResourceBundle {
        let mut left = self.hands[seat].resources;
        let mut dropped = ResourceBundle::default();
        for _ in 0..self.discard_due(seat) {
            let Some(most) = Resource::ALL.iter().copied().max_by_key(|&r| left.get(r)) else {
                break;
            };
            *left.get_mut(most) -= 1;
            *dropped.get_mut(most) += 1;
        }
        dropped
    }
}

/// The settlers ruleset.
#[derive(Clone, Copy, Debug, Default)]
pub struct Settlers;

impl Settlers {
    /// Build a session from a typed configuration.
    pub fn new_game(
        &self,
        participants: &[Participant],
        config: SettlersConfig,
        seed: u64,
    ) -> Result<SettlersState, EngineError> {
        let info = self.info();
        seat_roster(participants, info.min_players, info.max_players)?;

        let mut rng = GameRng::new(seed);
        let board = Board::generate(&mut rng);
        let mut deck = dev_card_deck();
        rng.shuffle(&mut deck);
        let mut order = participants.to_vec();
        if config.shuffle_turn_order {
            rng.shuffle(&mut order);
        }
        let roster = Roster::new(order);
        let hands = SeatMap::with_value(roster.len(), Hand::new(config.starting_resources));

        info!(players = roster.len(), seed, "settlers session created");
        Ok(SettlersState {
            roster,
            config,
            board,
            hands,
            current: Seat::new(0),
            phase: Phase::Setup { round: 1 },
            setup_anchor: None,
            resume: Phase::Main,
            free_roads: 0,
            dev_deck: deck.into_iter().collect(),
            longest_road: None,
            largest_army: None,
            last_roll: None,
            pending_discard: im::Vector::new(),
            winner: None,
            turn: 0,
            rng,
        })
    }
}

impl GamePlugin for Settlers {
    type State = SettlersState;
    type PublicView = SettlersPublicView;
    type PlayerView = SettlersPlayerView;

    fn info(&self) -> GameInfo {
        GameInfo {
            id: "settlers",
            name: "Settlers",
            min_players: 3,
            max_players: 4,
        }
    }

    fn initialize(
        &self,
        participants: &[Participant],
        config: &Value,
        seed: u64,
    ) -> Result<SettlersState, EngineError> {
        self.new_game(participants, parse_config(config)?, seed)
    }

    fn validate(&self, state: &SettlersState, action: &Action, actor: &ActorId) -> Result<(), Rejection> {
        let mv: SettlersMove = action.decode()?;
        state.check(&mv, actor).map(|_| ())
    }

    fn apply(
        &self,
        state: &SettlersState,
        action: &Action,
        actor: &ActorId,
    ) -> Result<Transition<SettlersState>, EngineError> {
        let mv: SettlersMove = action.decode().map_err(EngineError::Unvalidated)?;
        let seat = state.check(&mv, actor).map_err(|rejection| {
            warn!(%actor, kind = %action.kind, reason = %rejection, "apply on a refused action");
            EngineError::Unvalidated(rejection)
        })?;

        let mut next = state.clone();
        let mut events = Vec::new();
        next.perform(&mv, seat, actor, &mut events)?;
        next.settle_awards(&mut events);
        next.check_victory(seat, actor, &mut events);

        debug!(%actor, kind = %action.kind, phase = ?next.phase, events = events.len(), "settlers action applied");
        Ok(Transition::new(next, events))
    }

    fn current_actor(&self, state: &SettlersState) -> Option<ActorId> {
        if state.winner.is_some() {
            return None;
        }
        let seat = state.pending_discard.front().copied().unwrap_or(state.current);
        state.roster.actor(seat).cloned()
    }

    fn is_terminal(&self, state: &SettlersState) -> bool {
        state.winner.is_some()
    }

    fn result(&self, state: &SettlersState) -> Option<Outcome> {
        let winner = state.roster.actor(state.winner?)?.clone();
        let scores = state
            .roster
            .iter()
            .map(|(seat, p)| (p.id.clone(), i64::from(state.victory_points(seat, true))))
            .collect();
        Some(
            Outcome::winner(winner, format!("reached {} victory points", state.config.victory_points))
                .with_scores(scores),
        )
    }

    fn public_view(&self, state: &SettlersState) -> SettlersPublicView {
        SettlersPublicView::build(state)
    }

    fn player_view(&self, state: &SettlersState, actor: &ActorId) -> SettlersPlayerView {
        SettlersPlayerView::build(state, actor)
    }

    fn timeout_action(&self, state: &SettlersState, actor: &ActorId) -> Option<Action> {
        let seat = state.roster.seat_of(actor)?;
        let mv = match state.phase {
            Phase::Discard if state.pending_discard.contains(&seat) => SettlersMove::Discard {
                resources: state.auto_discard(seat),
            },
            _ if seat != state.current => return None,
            Phase::Setup { .. } => match state.setup_anchor {
                None => SettlersMove::BuildSettlement {
                    vertex_index: (0..state.board.vertices.len())
                        .find(|&v| state.check_settlement(seat, v).is_ok())?,
                },
                Some(anchor) => SettlersMove::BuildRoad {
                    edge_index: state
                        .board
                        .vertices
                        .get(anchor)?
                        .edges
                        .iter()
                        .copied()
                        .find(|&e| state.check_road(seat, e).is_ok())?,
                },
            },
            Phase::Roll => SettlersMove::RollDice,
            Phase::Main => SettlersMove::EndTurn,
            Phase::Robber => SettlersMove::MoveRobber {
                hex_index: state.board.tiles.iter().position(|t| !t.robber)?,
                steal_from_player: None,
            },
            _ => return None,
        };
        Action::encode(&mv).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn participants(n: usize) -> Vec<Participant> {
        (0..n)
            .map(|i| Participant::new(format!("p{i}"), format!("Player {i}")))
            .collect()
    }

    fn fixed_order() -> SettlersConfig {
        SettlersConfig::default().with_shuffled_turn_order(false)
    }

    fn act(state: &SettlersState, actor: &str, mv: SettlersMove) -> SettlersState {
        let action = Action::encode(&mv).unwrap();
        Settlers
            .apply(state, &action, &ActorId::from(actor))
            .unwrap()
            .state
    }

    /// A free vertex satisfying the distance rule, preferring inland spots.
    fn open_vertex(state: &SettlersState) -> usize {
        let board = state.board();
        (0..board.vertices.len())
            .filter(|&v| board.vertices[v].building.is_none() && !board.crowded(v))
            .max_by_key(|&v| (board.vertices[v].tiles.len(), std::cmp::Reverse(v)))
            .unwrap()
    }

    fn place_pair(state: &SettlersState, actor: &str) -> SettlersState {
        let vertex = open_vertex(state);
        let state = act(state, actor, SettlersMove::BuildSettlement { vertex_index: vertex });
        let edge = state.board().vertices[vertex].edges[0];
        act(&state, actor, SettlersMove::BuildRoad { edge_index: edge })
    }

    fn after_setup(config: SettlersConfig) -> SettlersState {
        let mut state = Settlers.new_game(&participants(3), config, 8).unwrap();
        for actor in ["p0", "p1", "p2", "p2", "p1", "p0"] {
            state = place_pair(&state, actor);
        }
        state
    }

    #[test]
    fn test_new_game() {
        let state = Settlers.new_game(&participants(3), fixed_order(), 1).unwrap();
        assert_eq!(state.phase(), Phase::Setup { round: 1 });
        assert_eq!(state.dev_cards_remaining(), 25);
        assert_eq!(Settlers.current_actor(&state), Some(ActorId::from("p0")));
        assert!(!Settlers.is_terminal(&state));
    }

    #[test]
    fn test_player_count_limits() {
        assert!(matches!(
            Settlers.new_game(&participants(2), fixed_order(), 1),
            Err(EngineError::PlayerCount { .. })
        ));
        assert!(Settlers.new_game(&participants(4), fixed_order(), 1).is_ok());
    }

    #[test]
    fn test_snake_setup_order() {
        let mut state = Settlers.new_game(&participants(3), fixed_order(), 8).unwrap();
        let mut order = Vec::new();
        for _ in 0..6 {
            let actor = Settlers.current_actor(&state).unwrap();
            order.push(actor.to_string());
            state = place_pair(&state, actor.as_str());
        }
        assert_eq!(order, ["p0", "p1", "p2", "p2", "p1", "p0"]);
        assert_eq!(state.phase(), Phase::Roll);
        assert_eq!(state.current_seat(), Seat::new(0));
    }

    #[test]
    fn test_timeouts_complete_setup() {
        let mut state = Settlers.new_game(&participants(3), fixed_order(), 8).unwrap();
        assert_eq!(Settlers.timeout_action(&state, &ActorId::from("p1")), None);

        let mut steps = 0;
        while state.phase() != Phase::Roll {
            let actor = Settlers.current_actor(&state).unwrap();
            let action = Settlers.timeout_action(&state, &actor).unwrap();
            assert!(Settlers.validate(&state, &action, &actor).is_ok());
            state = Settlers.apply(&state, &action, &actor).unwrap().state;
            steps += 1;
        }
        assert_eq!(steps, 12);
        for seat in Seat::all(3) {
            let hand = state.hand(seat).unwrap();
            assert_eq!(hand.settlements_left, SETTLEMENTS_PER_PLAYER - 2);
            assert_eq!(hand.roads_left, ROADS_PER_PLAYER - 2);
        }
    }

    #[test]
    fn test_second_round_settlement_grants_resources() {
        let state = after_setup(fixed_order());
        for seat in Seat::all(3) {
            let hand = state.hand(seat).unwrap();
            let settlement = state
                .board()
                .vertices
                .iter()
                .filter(|v| v.owner == Some(seat))
                .count();
            assert_eq!(settlement, 2);
            assert!(hand.resources.total() <= 3);
            assert_eq!(hand.settlements_left, SETTLEMENTS_PER_PLAYER - 2);
            assert_eq!(hand.roads_left, ROADS_PER_PLAYER - 2);
        }
    }

    #[test]
    fn test_setup_road_must_touch_new_settlement() {
        let state = Settlers.new_game(&participants(3), fixed_order(), 8).unwrap();
        let vertex = open_vertex(&state);
        let state = act(&state, "p0", SettlersMove::BuildSettlement { vertex_index: vertex });

        let far_edge = (0..state.board().edges.len())
            .find(|&e| !state.board().edges[e].vertices.contains(&vertex))
            .unwrap();
        let action = Action::encode(&SettlersMove::BuildRoad { edge_index: far_edge }).unwrap();
        let err = Settlers.validate(&state, &action, &ActorId::from("p0")).unwrap_err();
        assert_eq!(err.reason, "road must touch the settlement just placed");
    }

    #[test]
    fn test_distance_rule() {
        let state = Settlers.new_game(&participants(3), fixed_order(), 8).unwrap();
        let vertex = open_vertex(&state);
        let state = place_pair(&state, "p0");

        let neighbor = state.board().vertices[vertex].neighbors[0];
        let action = Action::encode(&SettlersMove::BuildSettlement { vertex_index: neighbor }).unwrap();
        let err = Settlers.validate(&state, &action, &ActorId::from("p1")).unwrap_err();
        assert_eq!(err.reason, "too close to another building");
    }

    #[test]
    fn test_wrong_turn_rejected() {
        let state = Settlers.new_game(&participants(3), fixed_order(), 8).unwrap();
        let action = Action::encode(&SettlersMove::BuildSettlement { vertex_index: 0 }).unwrap();
        let err = Settlers.validate(&state, &action, &ActorId::from("p1")).unwrap_err();
        assert_eq!(err, Rejection::not_your_turn());

        let err = Settlers.validate(&state, &action, &ActorId::from("ghost")).unwrap_err();
        assert_eq!(err, Rejection::not_participant());
    }

    #[test]
    fn test_apply_refuses_invalid_action_and_leaves_input() {
        let state = Settlers.new_game(&participants(3), fixed_order(), 8).unwrap();
        let before = state.clone();
        let result = Settlers.apply(&state, &Action::new("roll_dice"), &ActorId::from("p0"));
        assert!(matches!(result, Err(EngineError::Unvalidated(_))));
        assert_eq!(state, before);
    }

    #[test]
    fn test_roll_moves_to_main_or_robber() {
        let state = after_setup(fixed_order());
        let next = Settlers
            .apply(&state, &Action::new("roll_dice"), &ActorId::from("p0"))
            .unwrap();
        let [a, b] = next.state.last_roll().unwrap();
        assert!((1..=6).contains(&a) && (1..=6).contains(&b));
        let expected = if a + b == 7 { Phase::Robber } else { Phase::Main };
        assert_eq!(next.state.phase(), expected);
        assert!(next.events[0].is("dice_rolled"));
    }

    #[test]
    fn test_bank_trade_ratios() {
        let config = fixed_order().with_starting_resources(ResourceBundle::new(4, 0, 0, 0, 0));
        let mut state = after_setup(config);
        state.phase = Phase::Main;

        let seat = Seat::new(0);
        let ratio = state.trade_ratio(seat, Resource::Brick);
        assert!([2, 3, 4].contains(&ratio));

        let before = state.hand(seat).unwrap().resources;
        let next = act(&state, "p0", SettlersMove::TradeBank {
            give: Resource::Brick,
            receive: Resource::Ore,
        });
        let after = next.hand(seat).unwrap().resources;
        assert_eq!(after.brick, before.brick - ratio);
        assert_eq!(after.ore, before.ore + 1);
    }

    #[test]
    fn test_seven_forces_discard_then_robber() {
        let config = fixed_order().with_starting_resources(ResourceBundle::new(2, 2, 2, 2, 2));
        let mut state = after_setup(config);
        // Force a 7 by searching for a seed whose next roll sums to seven.
        let seed = (0..500u64)
            .find(|&s| {
                let mut rng = GameRng::new(s);
                rng.roll_die(6) + rng.roll_die(6) == 7
            })
            .unwrap();
        state.rng = GameRng::new(seed);

        let state = act(&state, "p0", SettlersMove::RollDice);
        assert_eq!(state.phase(), Phase::Discard);
        let first = Settlers.current_actor(&state).unwrap();
        let seat = state.roster().seat_of(&first).unwrap();
        let due = state.discard_due(seat);
        assert_eq!(due, state.hand(seat).unwrap().resources.total() / 2);

        let mut state = state;
        while state.phase() == Phase::Discard {
            let actor = Settlers.current_actor(&state).unwrap();
            let action = Settlers.timeout_action(&state, &actor).unwrap();
            state = Settlers.apply(&state, &action, &actor).unwrap().state;
        }
        assert_eq!(state.phase(), Phase::Robber);
        assert_eq!(Settlers.current_actor(&state), Some(ActorId::from("p0")));
    }

    #[test]
    fn test_dev_card_not_playable_on_purchase_turn() {
        let config = fixed_order().with_starting_resources(ResourceBundle::new(0, 0, 3, 3, 3));
        let mut state = after_setup(config);
        state.phase = Phase::Main;

        let state = act(&state, "p0", SettlersMove::BuyDevCard);
        assert_eq!(state.dev_cards_remaining(), 24);
        let action = Action::encode(&SettlersMove::PlayDevCard {
            card_index: 0,
            resource: Some(Resource::Ore),
            resource1: Some(Resource::Ore),
            resource2: Some(Resource::Ore),
        })
        .unwrap();
        let err = Settlers.validate(&state, &action, &ActorId::from("p0")).unwrap_err();
        assert_eq!(err.reason, "that card cannot be played");
    }

    #[test]
    fn test_knight_moves_to_robber_and_counts_army() {
        let mut state = after_setup(fixed_order());
        state.phase = Phase::Main;
        state.hands[Seat::new(0)].dev_cards.push_back(DevCard {
            kind: DevCardKind::Knight,
            playable: true,
        });
        state.hands[Seat::new(0)].knights_played = 2;

        let state = act(&state, "p0", SettlersMove::PlayDevCard {
            card_index: 0,
            resource: None,
            resource1: None,
            resource2: None,
        });
        assert_eq!(state.phase(), Phase::Robber);
        assert_eq!(state.largest_army(), Some(Award { seat: Seat::new(0), count: 3 }));

        let target = state.board().tiles.iter().position(|t| !t.robber).unwrap();
        let state = act(&state, "p0", SettlersMove::MoveRobber {
            hex_index: target,
            steal_from_player: None,
        });
        assert_eq!(state.phase(), Phase::Main);
        assert_eq!(state.board().robber_tile(), Some(target));
    }

    #[test]
    fn test_monopoly_collects_from_everyone() {
        let config = fixed_order().with_starting_resources(ResourceBundle::new(0, 0, 0, 0, 2));
        let mut state = after_setup(config);
        state.phase = Phase::Main;
        state.hands[Seat::new(0)].dev_cards.push_back(DevCard {
            kind: DevCardKind::Monopoly,
            playable: true,
        });
        let others: u32 = [1, 2]
            .iter()
            .map(|&s| state.hand(Seat::new(s)).unwrap().resources.ore)
            .sum();
        let mine = state.hand(Seat::new(0)).unwrap().resources.ore;

        let state = act(&state, "p0", SettlersMove::PlayDevCard {
            card_index: 0,
            resource: Some(Resource::Ore),
            resource1: None,
            resource2: None,
        });
        assert_eq!(state.hand(Seat::new(0)).unwrap().resources.ore, mine + others);
        assert_eq!(state.hand(Seat::new(1)).unwrap().resources.ore, 0);
    }

    #[test]
    fn test_victory_ends_game() {
        let config = fixed_order()
            .with_victory_points(3)
            .with_starting_resources(ResourceBundle::new(0, 0, 0, 2, 3));
        let mut state = after_setup(config);
        state.phase = Phase::Main;
        let vertex = state
            .board()
            .vertices
            .iter()
            .position(|v| v.owner == Some(Seat::new(0)))
            .unwrap();

        let state = act(&state, "p0", SettlersMove::BuildCity { vertex_index: vertex });
        assert!(Settlers.is_terminal(&state));
        assert_eq!(Settlers.current_actor(&state), None);
        let outcome = Settlers.result(&state).unwrap();
        assert!(outcome.is_winner(&ActorId::from("p0")));

        let err = Settlers
            .validate(&state, &Action::new("end_turn"), &ActorId::from("p1"))
            .unwrap_err();
        assert_eq!(err, Rejection::game_over());
    }

    #[test]
    fn test_state_bincode_round_trip() {
        let state = after_setup(fixed_order());
        let bytes = bincode::serialize(&state).unwrap();
        let restored: SettlersState = bincode::deserialize(&bytes).unwrap();
        assert_eq!(restored, state);
    }
}
