//! Deterministic randomness for shuffles, dice and probability checks.
//!
//! ## Key Features
//!
//! - **Deterministic**: Same seed produces identical sequence
//! - **Serializable**: O(1) state capture and restore via the ChaCha word position
//! - **Substitutable**: rules code draws through [`RandomSource`], so tests can
//!   feed a [`ScriptedSource`] instead of a seeded generator
//!
//! ```
//! use rust_tabletop::core::{GameRng, RandomSource};
//!
//! let mut rng = GameRng::new(42);
//! let die = rng.roll_die(6);
//! assert!((1..=6).contains(&die));
//!
//! // Capturing the state mid-stream replays the rest of the sequence.
//! let saved = rng.state();
//! let next = rng.below(1000);
//! let mut restored = GameRng::from_state(&saved);
//! assert_eq!(restored.below(1000), next);
//! ```

use std::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// A source of uniform draws.
///
/// Everything random in a ruleset goes through this trait. Only
/// [`below`](Self::below) must be provided; the other draws are built on it.
pub trait RandomSource {
    /// Uniform integer in `0..bound`. `bound` must be positive.
    fn below(&mut self, bound: u32) -> u32;

    /// Roll a die with `sides` faces, returning `1..=sides`.
    fn roll_die(&mut self, sides: u32) -> u32 {
        self.below(sides) + 1
    }

    /// Uniform integer in `min..=max` (inclusive on both ends).
    fn between(&mut self, min: u32, max: u32) -> u32 {
        if max <= min {
            return min;
        }
        min + self.below((max - min).saturating_add(1))
    }

    /// True with probability `percent / 100`.
    fn percent(&mut self, percent: u32) -> bool {
        self.below(100) < percent
    }

    /// Uniform index into a collection of `len` items.
    fn pick(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        let bound = u32::try_from(len).unwrap_or(u32::MAX);
        Some(self.below(bound) as usize)
    }

    /// Fisher-Yates shuffle in place.
    fn shuffle<T>(&mut self, slice: &mut [T])
    where
        Self: Sized,
    {
        for i in (1..slice.len()).rev() {
            let bound = u32::try_from(i + 1).unwrap_or(u32::MAX);
            let j = self.below(bound) as usize;
            slice.swap(i, j);
        }
    }
}

/// Seeded ChaCha8 generator carried inside every session state.
///
/// Serializes as a [`GameRngState`], so a persisted session resumes the
/// exact same draw sequence.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(from = "GameRngState", into = "GameRngState")]
pub struct GameRng {
    inner: ChaCha8Rng,
    seed: u64,
}

impl GameRng {
    /// Create a new RNG with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// The seed this generator started from.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Get the current state for serialization.
    #[must_use]
    pub fn state(&self) -> GameRngState {
        GameRngState {
            seed: self.seed,
            word_pos: self.inner.get_word_pos(),
        }
    }

    /// Restore from a saved state.
    #[must_use]
    pub fn from_state(state: &GameRngState) -> Self {
        let mut inner = ChaCha8Rng::seed_from_u64(state.seed);
        inner.set_word_pos(state.word_pos);
        Self {
            inner,
            seed: state.seed,
        }
    }
}

impl RandomSource for GameRng {
    fn below(&mut self, bound: u32) -> u32 {
        self.inner.gen_range(0..bound.max(1))
    }
}

impl PartialEq for GameRng {
    fn eq(&self, other: &Self) -> bool {
        self.state() == other.state()
    }
}

impl From<GameRngState> for GameRng {
    fn from(state: GameRngState) -> Self {
        Self::from_state(&state)
    }
}

impl From<GameRng> for GameRngState {
    fn from(rng: GameRng) -> Self {
        rng.state()
    }
}

/// Serializable RNG state for checkpointing.
///
/// Uses ChaCha8 word position for O(1) serialization regardless of
/// how many random numbers have been generated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRngState {
    /// Original seed
    pub seed: u64,
    /// ChaCha8 word position (128-bit counter)
    pub word_pos: u128,
}

/// Replays a fixed list of draws, for tests and replays.
///
/// Each draw is reduced modulo the requested bound. When the script runs
/// out every further draw returns 0.
#[derive(Clone, Debug, Default)]
pub struct ScriptedSource {
    draws: VecDeque<u32>,
}

impl ScriptedSource {
    #[must_use]
    pub fn new(draws: impl IntoIterator<Item = u32>) -> Self {
        Self {
            draws: draws.into_iter().collect(),
        }
    }

    /// Draws not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.draws.len()
    }
}

impl RandomSource for ScriptedSource {
    fn below(&mut self, bound: u32) -> u32 {
        self.draws.pop_front().unwrap_or(0) % bound.max(1)
    }
}
