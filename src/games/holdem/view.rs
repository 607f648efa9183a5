//! Table projections. Hole cards stay hidden until the hand is finished.

use serde::Serialize;

use super::card::Card;
use super::evaluator::HandCategory;
use super::game::{HoldemState, Phase, PotAward};
use super::pots::Pot;
use crate::core::{ActorId, Roster, Seat};

fn actors(roster: &Roster, seats: impl IntoIterator<Item = Seat>) -> Vec<ActorId> {
    seats
        .into_iter()
        .filter_map(|seat| roster.actor(seat).cloned())
        .collect()
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSeat {
    pub id: ActorId,
    pub nickname: String,
    pub seat: Seat,
    pub chips: u32,
    pub bet: u32,
    pub folded: bool,
    pub is_all_in: bool,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PotView {
    pub amount: u32,
    pub eligible: Vec<ActorId>,
}

/// Hole cards revealed once the hand is over.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShownHand {
    pub id: ActorId,
    pub hole: [Card; 2],
    pub hand: Option<HandCategory>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AwardView {
    pub amount: u32,
    pub winners: Vec<ActorId>,
    pub hand: Option<HandCategory>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldemPublicView {
    pub phase: Phase,
    pub pot: u32,
    pub pots: Vec<PotView>,
    pub community_cards: Vec<Card>,
    pub current_bet: u32,
    pub min_raise: u32,
    pub current_player: Option<ActorId>,
    pub dealer_seat: Seat,
    pub small_blind: u32,
    pub big_blind: u32,
    pub players: Vec<TableSeat>,
    pub showdown_hands: Vec<ShownHand>,
    pub awards: Vec<AwardView>,
}

impl HoldemPublicView {
    pub(crate) fn build(state: &HoldemState) -> Self {
        let roster = state.roster();

        let players = roster
            .iter()
            .filter_map(|(seat, p)| {
                let s = state.seat(seat)?;
                Some(TableSeat {
                    id: p.id.clone(),
                    nickname: p.nickname.clone(),
                    seat,
                    chips: s.chips,
                    bet: s.bet,
                    folded: s.folded,
                    is_all_in: s.all_in,
                })
            })
            .collect();

        let showdown_hands = if state.phase() == Phase::Finished {
            roster
                .iter()
                .filter_map(|(seat, p)| {
                    let s = state.seat(seat)?;
                    (!s.folded).then(|| ShownHand {
                        id: p.id.clone(),
                        hole: s.hole,
                        hand: state.ranking(seat).map(|r| r.category),
                    })
                })
                .collect()
        } else {
            Vec::new()
        };

        let pot_view = |pot: Pot| PotView {
            amount: pot.amount,
            eligible: actors(roster, pot.eligible),
        };
        let award_view = |award: &PotAward| AwardView {
            amount: award.amount,
            winners: actors(roster, award.winners.iter().copied()),
            hand: award.hand,
        };

        Self {
            phase: state.phase(),
            pot: state.pot(),
            pots: if state.phase() == Phase::Finished {
                Vec::new()
            } else {
                state.pots().into_iter().map(pot_view).collect()
            },
            community_cards: state.board().to_vec(),
            current_bet: state.current_bet(),
            min_raise: state.min_raise(),
            current_player: state.current_seat().and_then(|s| roster.actor(s).cloned()),
            dealer_seat: state.dealer(),
            small_blind: state.config().small_blind(),
            big_blind: state.config().big_blind,
            players,
            showdown_hands,
            awards: state.awards().iter().map(award_view).collect(),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldemPlayerView {
    #[serde(flatten)]
    pub public: HoldemPublicView,
    pub my_hand: Vec<Card>,
    pub is_my_turn: bool,
    pub to_call: u32,
}

impl HoldemPlayerView {
    pub(crate) fn build(state: &HoldemState, actor: &ActorId) -> Self {
        let public = HoldemPublicView::build(state);
        let seat = state.roster().seat_of(actor);
        Self {
            my_hand: seat
                .and_then(|s| state.seat(s))
                .map_or_else(Vec::new, |s| s.hole.to_vec()),
            is_my_turn: public.current_player.as_ref() == Some(actor),
            to_call: seat.map_or(0, |s| state.to_call(s)),
            public,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Action, Participant};
    use crate::games::holdem::card::Deck;
    use crate::games::holdem::game::{Holdem, HoldemConfig};
    use crate::rules::GamePlugin;

    fn state() -> HoldemState {
        let deck = Deck::stacked(
            "As Ah Ks Kh 2c 7d 9s 3h 4d"
                .split_whitespace()
                .map(|c| c.parse().unwrap()),
        );
        let players = vec![Participant::new("a", "Ann"), Participant::new("b", "Bo")];
        Holdem.with_deck(&players, HoldemConfig::default(), deck).unwrap()
    }

    #[test]
    fn test_public_view_hides_hole_cards() {
        let view = Holdem.public_view(&state());
        assert_eq!(view.players.len(), 2);
        assert_eq!(view.players[0].bet, 10);
        assert_eq!(view.players[1].bet, 20);
        assert!(view.showdown_hands.is_empty());
        assert_eq!(view.pots.len(), 1);
        assert_eq!(view.pots[0].amount, 30);

        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("myHand").is_none());
        assert!(json["players"][0].get("hole").is_none());
        assert_eq!(json["currentPlayer"], "a");
    }

    #[test]
    fn test_player_view_shows_own_cards() {
        let state = state();
        let view = Holdem.player_view(&state, &ActorId::from("b"));
        assert_eq!(view.my_hand.len(), 2);
        assert_eq!(view.my_hand[0].to_string(), "Ks");
        assert!(!view.is_my_turn);
        assert_eq!(view.to_call, 0);

        let mine = Holdem.player_view(&state, &ActorId::from("a"));
        assert!(mine.is_my_turn);
        assert_eq!(mine.to_call, 10);
    }

    #[test]
    fn test_finished_hand_reveals_contenders() {
        let state = state();
        let state = Holdem
            .apply(&state, &Action::new("allin"), &ActorId::from("a"))
            .unwrap()
            .state;
        let state = Holdem
            .apply(&state, &Action::new("call"), &ActorId::from("b"))
            .unwrap()
            .state;

        let view = Holdem.public_view(&state);
        assert_eq!(view.showdown_hands.len(), 2);
        assert_eq!(view.showdown_hands[0].hand, Some(HandCategory::OnePair));
        assert_eq!(view.awards[0].winners, vec![ActorId::from("a")]);
        assert_eq!(view.current_player, None);
    }
}
