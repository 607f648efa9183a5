//! No-limit Texas hold'em, one hand per session.
//!
//! ## Betting
//!
//! - Seat 0 deals. Heads-up the dealer posts the small blind and acts first
//!   before the flop; otherwise the two seats after the dealer post the
//!   blinds and the seat after the big blind opens.
//! - A street closes once every seat that is neither folded nor all-in has
//!   matched the current bet and acted since the last raise.
//! - From the flop on, the first live seat after the dealer opens.
//! - When at most one seat can still bet, the board runs out and the hand
//!   goes to showdown.
//!
//! Pots are split per contribution layer; see [`super::pots`].

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use smallvec::SmallVec;
use tracing::{debug, info, warn};

use super::card::{Card, Deck};
use super::evaluator::{evaluate, HandCategory, HandRanking};
use super::pots::{layer_pots, split, Pot, Stake};
use super::view::{HoldemPlayerView, HoldemPublicView};
use crate::core::{
    parse_config, seat_roster, Action, ActorId, EngineError, GameEvent, GameRng, Participant,
    Rejection, Roster, Seat, SeatMap,
};
use crate::rules::{GameInfo, GamePlugin, Outcome, Transition};

/// Session configuration. Every key is optional.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HoldemConfig {
    pub starting_chips: u32,
    pub big_blind: u32,
    /// Defaults to half the big blind.
    pub small_blind: Option<u32>,
}

impl Default for HoldemConfig {
    fn default() -> Self {
        Self {
            starting_chips: 1000,
            big_blind: 20,
            small_blind: None,
        }
    }
}

impl HoldemConfig {
    pub fn with_starting_chips(mut self, chips: u32) -> Self {
        self.starting_chips = chips;
        self
    }

    pub fn with_blinds(mut self, small: u32, big: u32) -> Self {
        self.small_blind = Some(small);
        self.big_blind = big;
        self
    }

    #[must_use]
    pub fn small_blind(&self) -> u32 {
        self.small_blind.unwrap_or(self.big_blind / 2)
    }

    fn check(&self) -> Result<(), EngineError> {
        if self.big_blind == 0 {
            return Err(EngineError::Setting("bigBlind must be positive".into()));
        }
        if self.small_blind() > self.big_blind {
            return Err(EngineError::Setting("smallBlind exceeds bigBlind".into()));
        }
        if self.starting_chips <= self.big_blind {
            return Err(EngineError::Setting("startingChips must exceed bigBlind".into()));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Preflop,
    Flop,
    Turn,
    River,
    Showdown,
    Finished,
}

/// One seat at the table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatState {
    pub chips: u32,
    pub hole: [Card; 2],
    /// Chips put in on the current street.
    pub bet: u32,
    /// Chips put in on earlier streets.
    pub contributed: u32,
    pub folded: bool,
    pub all_in: bool,
    pub acted: bool,
}

impl SeatState {
    /// Still able to bet.
    fn is_live(&self) -> bool {
        !self.folded && !self.all_in
    }

    /// Move up to `amount` chips from the stack into the current bet.
    fn pay(&mut self, amount: u32) -> u32 {
        let paid = amount.min(self.chips);
        self.chips -= paid;
        self.bet += paid;
        if self.chips == 0 {
            self.all_in = true;
        }
        paid
    }
}

/// Chips awarded from one pot at showdown.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PotAward {
    pub amount: u32,
    pub winners: Vec<Seat>,
    /// `None` when the pot was won uncontested.
    pub hand: Option<HandCategory>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HoldemMove {
    Fold,
    Check,
    Call,
    /// `amount` is the total bet for this street, not the increment.
    Raise { amount: u32 },
    Allin,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HoldemState {
    pub(crate) roster: Roster,
    pub(crate) config: HoldemConfig,
    pub(crate) seats: SeatMap<SeatState>,
    pub(crate) deck: Deck,
    pub(crate) board: SmallVec<[Card; 5]>,
    pub(crate) phase: Phase,
    pub(crate) dealer: Seat,
    pub(crate) current: Seat,
    pub(crate) current_bet: u32,
    pub(crate) min_raise: u32,
    pub(crate) last_raiser: Option<Seat>,
    /// Chips collected from finished streets and not yet awarded.
    pub(crate) pot: u32,
    pub(crate) awards: Vec<PotAward>,
    pub(crate) rng: GameRng,
}

impl HoldemState {
    #[must_use]
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn seat(&self, seat: Seat) -> Option<&SeatState> {
        self.seats.get(seat)
    }

    #[must_use]
    pub fn board(&self) -> &[Card] {
        &self.board
    }

    #[must_use]
    pub fn dealer(&self) -> Seat {
        self.dealer
    }

    #[must_use]
    pub fn current_seat(&self) -> Option<Seat> {
        (!self.is_over()).then_some(self.current)
    }

    #[must_use]
    pub fn current_bet(&self) -> u32 {
        self.current_bet
    }

    #[must_use]
    pub fn min_raise(&self) -> u32 {
        self.min_raise
    }

    #[must_use]
    pub fn pot(&self) -> u32 {
        self.pot
    }

    #[must_use]
    pub fn config(&self) -> &HoldemConfig {
        &self.config
    }

    #[must_use]
    pub fn awards(&self) -> &[PotAward] {
        &self.awards
    }

    /// Amount `seat` must add to stay in.
    #[must_use]
    pub fn to_call(&self, seat: Seat) -> u32 {
        self.seats
            .get(seat)
            .map_or(0, |s| self.current_bet.saturating_sub(s.bet))
    }

    /// Pots as they stand, counting chips bet on the current street.
    #[must_use]
    pub fn pots(&self) -> Vec<Pot> {
        layer_pots(&self.stakes())
    }

    /// Best ranking `seat` can make with the cards dealt so far.
    #[must_use]
    pub fn ranking(&self, seat: Seat) -> Option<HandRanking> {
        let hole = self.seats.get(seat)?.hole;
        let cards: SmallVec<[Card; 7]> = hole.iter().chain(self.board.iter()).copied().collect();
        evaluate(&cards)
    }

    fn is_over(&self) -> bool {
        matches!(self.phase, Phase::Showdown | Phase::Finished)
    }

    fn stakes(&self) -> SmallVec<[Stake; 8]> {
        self.seats
            .iter()
            .map(|(seat, s)| Stake {
                seat,
                contributed: s.contributed + s.bet,
                folded: s.folded,
                all_in: s.all_in,
            })
            .collect()
    }

    /// First seat strictly after `from` that can still bet.
    fn next_live(&self, from: Seat) -> Option<Seat> {
        let n = self.seats.seat_count();
        (1..=n)
            .map(|step| from.offset(step, n))
            .find(|&seat| self.seats[seat].is_live())
    }

    fn street_complete(&self) -> bool {
        self.seats
            .values()
            .filter(|s| s.is_live())
            .all(|s| s.acted && s.bet == self.current_bet)
    }

    fn check(&self, mv: &HoldemMove, actor: &ActorId) -> Result<Seat, Rejection> {
        if self.is_over() {
            return Err(Rejection::game_over());
        }
        let seat = self.roster.seat_of(actor).ok_or_else(Rejection::not_participant)?;
        if seat != self.current {
            return Err(Rejection::not_your_turn());
        }
        let player = &self.seats[seat];
        if player.folded {
            return Err(Rejection::illegal("already folded"));
        }

        let to_call = self.current_bet.saturating_sub(player.bet);
        let verdict = match *mv {
            HoldemMove::Fold => Ok(()),
            HoldemMove::Check if to_call > 0 => {
                Err(Rejection::illegal("cannot check facing a bet; call or fold"))
            }
            HoldemMove::Check => Ok(()),
            HoldemMove::Call if to_call == 0 => Err(Rejection::illegal("nothing to call")),
            HoldemMove::Call => Ok(()),
            HoldemMove::Raise { amount } => {
                let reach = player.chips + player.bet;
                if amount > reach {
                    Err(Rejection::insufficient("not enough chips"))
                } else if amount <= self.current_bet {
                    Err(Rejection::illegal("raise must exceed the current bet"))
                } else if amount - self.current_bet < self.min_raise && amount < reach {
                    Err(Rejection::illegal(format!(
                        "raise by at least {}",
                        self.min_raise
                    )))
                } else {
                    Ok(())
                }
            }
            HoldemMove::Allin if player.chips == 0 => Err(Rejection::insufficient("no chips left")),
            HoldemMove::Allin => Ok(()),
        };
        verdict.map(|()| seat)
    }

    fn perform(&mut self, mv: &HoldemMove, seat: Seat, actor: &ActorId, events: &mut Vec<GameEvent>) {
        let to_call = self.to_call(seat);
        let player = &mut self.seats[seat];

        match *mv {
            HoldemMove::Fold => {
                player.folded = true;
                events.push(GameEvent::new("fold").with_actor(actor));
            }
            HoldemMove::Check => {
                player.acted = true;
                events.push(GameEvent::new("check").with_actor(actor));
            }
            HoldemMove::Call => {
                let paid = player.pay(to_call);
                player.acted = true;
                events.push(
                    GameEvent::new("call")
                        .with_actor(actor)
                        .with_payload(json!({ "amount": paid, "allIn": player.all_in })),
                );
            }
            HoldemMove::Raise { amount } => {
                let paid = player.pay(amount - player.bet);
                player.acted = true;
                let total = player.bet;
                self.raise_to(seat, total);
                events.push(
                    GameEvent::new("raise")
                        .with_actor(actor)
                        .with_payload(json!({ "amount": total, "raiseBy": paid })),
                );
            }
            HoldemMove::Allin => {
                let chips = player.chips;
                player.pay(chips);
                player.acted = true;
                let total = player.bet;
                if total > self.current_bet {
                    self.raise_to(seat, total);
                }
                events.push(
                    GameEvent::new("allin")
                        .with_actor(actor)
                        .with_payload(json!({ "amount": total })),
                );
            }
        }
    }

    /// Raise the street's bet to `total` and reopen action for everyone else.
    fn raise_to(&mut self, seat: Seat, total: u32) {
        let size = total - self.current_bet;
        if size >= self.min_raise {
            self.min_raise = size;
        }
        self.current_bet = total;
        self.last_raiser = Some(seat);
        for (other, s) in self.seats.iter_mut() {
            if other != seat && s.is_live() {
                s.acted = false;
            }
        }
    }

    /// Move street bets into the pot and reset for the next street.
    fn collect_bets(&mut self) {
        for s in self.seats.values_mut() {
            self.pot += s.bet;
            s.contributed += s.bet;
            s.bet = 0;
            s.acted = false;
        }
        self.current_bet = 0;
        self.min_raise = self.config.big_blind;
        self.last_raiser = None;
    }

    fn deal_board(&mut self, count: usize) -> Result<SmallVec<[Card; 3]>, EngineError> {
        let mut dealt = SmallVec::new();
        for _ in 0..count {
            let card = self
                .deck
                .draw()
                .ok_or_else(|| EngineError::invariant("deck exhausted"))?;
            self.board.push(card);
            dealt.push(card);
        }
        Ok(dealt)
    }

    /// Close the street if it is complete, otherwise pass the turn.
    fn advance(&mut self, seat: Seat, events: &mut Vec<GameEvent>) -> Result<(), EngineError> {
        let contenders: SmallVec<[Seat; 8]> = self
            .seats
            .iter()
            .filter(|(_, s)| !s.folded)
            .map(|(seat, _)| seat)
            .collect();
        if let [winner] = contenders.as_slice() {
            let winner = *winner;
            self.collect_bets();
            self.award_uncontested(winner, events);
            return Ok(());
        }

        if !self.street_complete() {
            self.current = self
                .next_live(seat)
                .ok_or_else(|| EngineError::invariant("street open but nobody can act"))?;
            return Ok(());
        }

        self.collect_bets();
        let live = self.seats.values().filter(|s| s.is_live()).count();
        if live <= 1 {
            let missing = 5 - self.board.len();
            if missing > 0 {
                let cards = self.deal_board(missing)?;
                events.push(GameEvent::new("run_out").with_payload(json!({ "cards": cards })));
            }
            return self.showdown(events);
        }

        match self.phase {
            Phase::Preflop => {
                let cards = self.deal_board(3)?;
                self.phase = Phase::Flop;
                events.push(GameEvent::new("flop").with_payload(json!({ "cards": cards })));
            }
            Phase::Flop => {
                let cards = self.deal_board(1)?;
                self.phase = Phase::Turn;
                events.push(GameEvent::new("turn").with_payload(json!({ "card": cards[0] })));
            }
            Phase::Turn => {
                let cards = self.deal_board(1)?;
                self.phase = Phase::River;
                events.push(GameEvent::new("river").with_payload(json!({ "card": cards[0] })));
            }
            Phase::River => return self.showdown(events),
            Phase::Showdown | Phase::Finished => {
                return Err(EngineError::invariant("betting after the hand ended"))
            }
        }

        self.current = self
            .next_live(self.dealer)
            .ok_or_else(|| EngineError::invariant("new street with nobody to act"))?;
        Ok(())
    }

    fn award_uncontested(&mut self, winner: Seat, events: &mut Vec<GameEvent>) {
        let amount = self.pot;
        self.seats[winner].chips += amount;
        self.pot = 0;
        self.phase = Phase::Finished;
        self.awards.push(PotAward {
            amount,
            winners: vec![winner],
            hand: None,
        });
        if let Some(actor) = self.roster.actor(winner) {
            info!(%actor, amount, "hand won uncontested");
            events.push(
                GameEvent::new("win")
                    .with_actor(actor)
                    .with_payload(json!({ "amount": amount, "reason": "fold" })),
            );
        }
    }

    fn showdown(&mut self, events: &mut Vec<GameEvent>) -> Result<(), EngineError> {
        self.phase = Phase::Showdown;
        let n = self.seats.seat_count();

        let rankings: SmallVec<[Option<HandRanking>; 8]> = Seat::all(n)
            .map(|seat| {
                let s = &self.seats[seat];
                if s.folded {
                    None
                } else {
                    self.ranking(seat)
                }
            })
            .collect();

        let hands: Vec<Value> = Seat::all(n)
            .filter_map(|seat| {
                let ranking = rankings[seat.index()].as_ref()?;
                let actor = self.roster.actor(seat)?;
                Some(json!({
                    "playerId": actor,
                    "hole": self.seats[seat].hole,
                    "hand": ranking.category,
                }))
            })
            .collect();
        events.push(GameEvent::new("showdown").with_payload(json!({ "hands": hands })));

        for pot in layer_pots(&self.stakes()) {
            let best = pot
                .eligible
                .iter()
                .filter_map(|seat| rankings[seat.index()].as_ref())
                .max()
                .cloned()
                .ok_or_else(|| EngineError::invariant("pot with no eligible hand"))?;
            let winners: Vec<Seat> = pot
                .eligible
                .iter()
                .copied()
                .filter(|seat| rankings[seat.index()].as_ref() == Some(&best))
                .collect();

            for (seat, amount) in split(pot.amount, &winners, self.dealer, n) {
                self.seats[seat].chips += amount;
                if let Some(actor) = self.roster.actor(seat) {
                    events.push(GameEvent::new("win").with_actor(actor).with_payload(json!({
                        "amount": amount,
                        "hand": best.category.name(),
                    })));
                }
            }
            self.awards.push(PotAward {
                amount: pot.amount,
                winners,
                hand: Some(best.category),
            });
        }

        self.pot = 0;
        self.phase = Phase::Finished;
        info!(pots = self.awards.len(), "showdown settled");
        Ok(())
    }
}

pub struct Holdem;

impl Holdem {
    /// Deal a hand from a typed configuration.
    pub fn new_game(
        &self,
        participants: &[Participant],
        config: HoldemConfig,
        seed: u64,
    ) -> Result<HoldemState, EngineError> {
        let mut rng = GameRng::new(seed);
        let deck = Deck::shuffled(&mut rng);
        Self::deal(participants, config, deck, rng)
    }

    /// Deal from a prepared deck (top card first).
    pub fn with_deck(
        &self,
        participants: &[Participant],
        config: HoldemConfig,
        deck: Deck,
    ) -> Result<HoldemState, EngineError> {
        Self::deal(participants, config, deck, GameRng::new(0))
    }

    fn deal(
        participants: &[Participant],
        config: HoldemConfig,
        mut deck: Deck,
        rng: GameRng,
    ) -> Result<HoldemState, EngineError> {
        let info = Holdem.info();
        let roster = seat_roster(participants, info.min_players, info.max_players)?;
        config.check()?;
        let n = roster.len();

        let mut holes = Vec::with_capacity(n);
        for _ in 0..n {
            match (deck.draw(), deck.draw()) {
                (Some(a), Some(b)) => holes.push([a, b]),
                _ => return Err(EngineError::invariant("deck too small to deal")),
            }
        }
        let seats = SeatMap::new(n, |seat| SeatState {
            chips: config.starting_chips,
            hole: holes[seat.index()],
            bet: 0,
            contributed: 0,
            folded: false,
            all_in: false,
            acted: false,
        });

        let dealer = Seat::new(0);
        let (sb, bb) = if n == 2 {
            (dealer, dealer.offset(1, n))
        } else {
            (dealer.offset(1, n), dealer.offset(2, n))
        };

        let mut state = HoldemState {
            roster,
            seats,
            deck,
            board: SmallVec::new(),
            phase: Phase::Preflop,
            dealer,
            current: dealer,
            current_bet: config.big_blind,
            min_raise: config.big_blind,
            last_raiser: Some(bb),
            pot: 0,
            awards: Vec::new(),
            rng,
            config,
        };
        let small = state.config.small_blind();
        let big = state.config.big_blind;
        state.seats[sb].pay(small);
        state.seats[bb].pay(big);

        let opener = if n == 2 { dealer } else { bb.offset(1, n) };
        state.current = if state.seats[opener].is_live() {
            opener
        } else {
            state
                .next_live(opener)
                .ok_or_else(|| EngineError::invariant("no seat can act after the blinds"))?
        };

        info!(players = n, small, big, "hold'em hand dealt");
        Ok(state)
    }
}

impl GamePlugin for Holdem {
    type State = HoldemState;
    type PublicView = HoldemPublicView;
    type PlayerView = HoldemPlayerView;

    fn info(&self) -> GameInfo {
        GameInfo {
            id: "holdem",
            name: "Texas Hold'em",
            min_players: 2,
            max_players: 8,
        }
    }

    fn initialize(
        &self,
        participants: &[Participant],
        config: &Value,
        seed: u64,
    ) -> Result<HoldemState, EngineError> {
        self.new_game(participants, parse_config(config)?, seed)
    }

    fn validate(&self, state: &HoldemState, action: &Action, actor: &ActorId) -> Result<(), Rejection> {
        let mv: HoldemMove = action.decode()?;
        state.check(&mv, actor).map(|_| ())
    }

    fn apply(
        &self,
        state: &HoldemState,
        action: &Action,
        actor: &ActorId,
    ) -> Result<Transition<HoldemState>, EngineError> {
        let mv: HoldemMove = action.decode().map_err(EngineError::Unvalidated)?;
        let seat = state.check(&mv, actor).map_err(|rejection| {
            warn!(%actor, kind = %action.kind, reason = %rejection, "apply on a refused action");
            EngineError::Unvalidated(rejection)
        })?;

        let mut next = state.clone();
        let mut events = Vec::new();
        next.perform(&mv, seat, actor, &mut events);
        next.advance(seat, &mut events)?;

        debug!(%actor, kind = %action.kind, phase = ?next.phase, pot = next.pot, "hold'em action applied");
        Ok(Transition::new(next, events))
    }

    fn current_actor(&self, state: &HoldemState) -> Option<ActorId> {
        state.roster.actor(state.current_seat()?).cloned()
    }

    fn is_terminal(&self, state: &HoldemState) -> bool {
        state.phase == Phase::Finished
    }

    fn result(&self, state: &HoldemState) -> Option<Outcome> {
        if state.phase != Phase::Finished {
            return None;
        }
        let scores = state
            .roster
            .iter()
            .map(|(seat, p)| (p.id.clone(), i64::from(state.seats[seat].chips)))
            .collect();

        let mut holding = state.seats.iter().filter(|(_, s)| s.chips > 0);
        let outcome = match (holding.next(), holding.next()) {
            (Some((seat, _)), None) => {
                let actor = state.roster.actor(seat)?.clone();
                Outcome::winner(actor, "won every chip")
            }
            _ => Outcome::draw("hand complete"),
        };
        Some(outcome.with_scores(scores))
    }

    fn public_view(&self, state: &HoldemState) -> HoldemPublicView {
        HoldemPublicView::build(state)
    }

    fn player_view(&self, state: &HoldemState, actor: &ActorId) -> HoldemPlayerView {
        HoldemPlayerView::build(state, actor)
    }

    fn timeout_action(&self, state: &HoldemState, actor: &ActorId) -> Option<Action> {
        let seat = state.roster.seat_of(actor)?;
        if state.current_seat()? != seat {
            return None;
        }
        let mv = if state.to_call(seat) == 0 {
            HoldemMove::Check
        } else {
            HoldemMove::Fold
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

    fn cards(text: &str) -> Vec<Card> {
        text.split_whitespace().map(|c| c.parse().unwrap()).collect()
    }

    fn act(state: &HoldemState, actor: &str, mv: HoldemMove) -> Transition<HoldemState> {
        let action = Action::encode(&mv).unwrap();
        Holdem.apply(state, &action, &ActorId::from(actor)).unwrap()
    }

    fn reject(state: &HoldemState, actor: &str, mv: HoldemMove) -> Rejection {
        let action = Action::encode(&mv).unwrap();
        Holdem.validate(state, &action, &ActorId::from(actor)).unwrap_err()
    }

    /// Heads-up with known cards: p0 holds aces, p1 holds kings, and the
    /// board bricks.
    fn heads_up_aces_vs_kings(chips: u32) -> HoldemState {
        let deck = Deck::stacked(cards("As Ah Ks Kh 2c 7d 9s 3h 4d"));
        Holdem
            .with_deck(&participants(2), HoldemConfig::default().with_starting_chips(chips), deck)
            .unwrap()
    }

    #[test]
    fn test_heads_up_blinds() {
        let state = Holdem.new_game(&participants(2), HoldemConfig::default(), 1).unwrap();
        assert_eq!(state.seat(Seat::new(0)).unwrap().bet, 10);
        assert_eq!(state.seat(Seat::new(1)).unwrap().bet, 20);
        assert_eq!(Holdem.current_actor(&state), Some(ActorId::from("p0")));
        assert_eq!(state.to_call(Seat::new(0)), 10);
    }

    #[test]
    fn test_ring_blinds_and_opener() {
        let state = Holdem.new_game(&participants(4), HoldemConfig::default(), 1).unwrap();
        assert_eq!(state.seat(Seat::new(0)).unwrap().bet, 0);
        assert_eq!(state.seat(Seat::new(1)).unwrap().bet, 10);
        assert_eq!(state.seat(Seat::new(2)).unwrap().bet, 20);
        assert_eq!(Holdem.current_actor(&state), Some(ActorId::from("p3")));
    }

    #[test]
    fn test_config_keys() {
        let config = serde_json::json!({ "startingChips": 500, "bigBlind": 50 });
        let state = Holdem.initialize(&participants(3), &config, 4).unwrap();
        assert_eq!(state.seat(Seat::new(1)).unwrap().bet, 25);
        assert_eq!(state.seat(Seat::new(2)).unwrap().chips, 450);

        let bad = serde_json::json!({ "startingChips": 10, "bigBlind": 20 });
        assert!(matches!(
            Holdem.initialize(&participants(3), &bad, 4),
            Err(EngineError::Setting(_))
        ));
    }

    #[test]
    fn test_player_count_limits() {
        assert!(Holdem.new_game(&participants(1), HoldemConfig::default(), 0).is_err());
        assert!(Holdem.new_game(&participants(9), HoldemConfig::default(), 0).is_err());
        assert!(Holdem.new_game(&participants(8), HoldemConfig::default(), 0).is_ok());
    }

    #[test]
    fn test_check_and_call_rules() {
        let state = heads_up_aces_vs_kings(1000);
        assert_eq!(reject(&state, "p0", HoldemMove::Check).kind, crate::core::RejectionKind::IllegalMove);
        assert_eq!(reject(&state, "p1", HoldemMove::Call).kind, crate::core::RejectionKind::NotYourTurn);

        let state = act(&state, "p0", HoldemMove::Call).state;
        // Big blind keeps the option.
        assert_eq!(Holdem.current_actor(&state), Some(ActorId::from("p1")));
        assert_eq!(state.phase(), Phase::Preflop);
        assert!(reject(&state, "p1", HoldemMove::Call).reason.contains("nothing to call"));

        let t = act(&state, "p1", HoldemMove::Check);
        assert_eq!(t.state.phase(), Phase::Flop);
        assert_eq!(t.state.board().len(), 3);
        assert_eq!(t.state.pot(), 40);
        assert!(t.events.iter().any(|e| e.is("flop")));
        // Post-flop the first live seat after the dealer opens.
        assert_eq!(Holdem.current_actor(&t.state), Some(ActorId::from("p1")));
    }

    #[test]
    fn test_min_raise() {
        let state = heads_up_aces_vs_kings(1000);
        let err = reject(&state, "p0", HoldemMove::Raise { amount: 30 });
        assert!(err.reason.contains("at least 20"));
        assert_eq!(
            reject(&state, "p0", HoldemMove::Raise { amount: 5000 }).kind,
            crate::core::RejectionKind::Insufficient
        );

        let state = act(&state, "p0", HoldemMove::Raise { amount: 60 }).state;
        assert_eq!(state.current_bet(), 60);
        assert_eq!(state.min_raise(), 40);
        assert!(reject(&state, "p1", HoldemMove::Raise { amount: 90 }).reason.contains("at least 40"));
        let state = act(&state, "p1", HoldemMove::Raise { amount: 100 }).state;
        assert_eq!(Holdem.current_actor(&state), Some(ActorId::from("p0")));
    }

    #[test]
    fn test_fold_ends_hand() {
        let state = heads_up_aces_vs_kings(1000);
        let t = act(&state, "p0", HoldemMove::Fold);
        assert!(Holdem.is_terminal(&t.state));
        assert_eq!(t.state.seat(Seat::new(1)).unwrap().chips, 1010);
        assert_eq!(t.state.seat(Seat::new(0)).unwrap().chips, 990);
        assert!(t.events.iter().any(|e| e.is("win")));

        let outcome = Holdem.result(&t.state).unwrap();
        assert!(outcome.is_draw());
        assert_eq!(outcome.scores.unwrap()[&ActorId::from("p1")], 1010);
        assert_eq!(reject(&t.state, "p1", HoldemMove::Check).kind, crate::core::RejectionKind::GameOver);
    }

    #[test]
    fn test_all_in_runs_out_board() {
        let state = heads_up_aces_vs_kings(1000);
        let state = act(&state, "p0", HoldemMove::Allin).state;
        assert_eq!(Holdem.current_actor(&state), Some(ActorId::from("p1")));

        let t = act(&state, "p1", HoldemMove::Call);
        assert!(Holdem.is_terminal(&t.state));
        assert_eq!(t.state.board().len(), 5);
        assert_eq!(t.state.seat(Seat::new(0)).unwrap().chips, 2000);
        assert_eq!(t.state.seat(Seat::new(1)).unwrap().chips, 0);

        let outcome = Holdem.result(&t.state).unwrap();
        assert!(outcome.is_winner(&ActorId::from("p0")));
        assert!(t.events.iter().any(|e| e.is("showdown")));
    }

    #[test]
    fn test_side_pot_showdown() {
        // p0 is short-stacked with aces, p1 holds kings, p2 holds queens.
        let deck = Deck::stacked(cards("As Ah Ks Kh Qs Qh 2c 7d 9s 3h 4d"));
        let mut state = Holdem
            .with_deck(&participants(3), HoldemConfig::default(), deck)
            .unwrap();
        state.seats[Seat::new(0)].chips = 100;

        // p0 opens all-in, p1 raises, p2 calls, then both check it down.
        let state = act(&state, "p0", HoldemMove::Allin).state;
        let state = act(&state, "p1", HoldemMove::Raise { amount: 300 }).state;
        let mut state = act(&state, "p2", HoldemMove::Call).state;
        assert_eq!(state.phase(), Phase::Flop);
        while !Holdem.is_terminal(&state) {
            let actor = Holdem.current_actor(&state).unwrap();
            state = act(&state, actor.as_str(), HoldemMove::Check).state;
        }

        // Main pot 300 to the aces, side pot 400 to the kings.
        assert_eq!(state.awards().len(), 2);
        assert_eq!(state.seat(Seat::new(0)).unwrap().chips, 300);
        assert_eq!(state.seat(Seat::new(1)).unwrap().chips, 1000 - 300 + 400);
        assert_eq!(state.seat(Seat::new(2)).unwrap().chips, 1000 - 300);
    }

    #[test]
    fn test_timeout_checks_or_folds() {
        let state = heads_up_aces_vs_kings(1000);
        assert_eq!(
            Holdem.timeout_action(&state, &ActorId::from("p0")),
            Some(Action::new("fold"))
        );
        assert_eq!(Holdem.timeout_action(&state, &ActorId::from("p1")), None);

        let state = act(&state, "p0", HoldemMove::Call).state;
        assert_eq!(
            Holdem.timeout_action(&state, &ActorId::from("p1")),
            Some(Action::new("check"))
        );
    }

    #[test]
    fn test_apply_leaves_input_untouched() {
        let state = heads_up_aces_vs_kings(1000);
        let before = state.clone();
        let _ = act(&state, "p0", HoldemMove::Call);
        assert_eq!(state, before);

        let refused = Holdem.apply(&state, &Action::new("check"), &ActorId::from("p0"));
        assert!(matches!(refused, Err(EngineError::Unvalidated(_))));
    }

    #[test]
    fn test_state_bincode_round_trip() {
        let state = Holdem.new_game(&participants(3), HoldemConfig::default(), 9).unwrap();
        let bytes = bincode::serialize(&state).unwrap();
        let restored: HoldemState = bincode::deserialize(&bytes).unwrap();
        assert_eq!(state, restored);
    }
}
