//! Texas hold'em: cards, hand evaluation, pots and the betting machine.

pub mod card;
pub mod evaluator;
pub mod game;
pub mod pots;
pub mod view;

pub use card::{Card, Deck, Rank, Suit};
pub use evaluator::{evaluate, evaluate_five, HandCategory, HandRanking};
pub use game::{Holdem, HoldemConfig, HoldemMove, HoldemState, Phase, PotAward, SeatState};
pub use pots::{layer_pots, split, Pot, Stake};
pub use view::{HoldemPlayerView, HoldemPublicView};
