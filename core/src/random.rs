//! Injectable randomness used for enemy composition and junction rerouting.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Source of uniform random numbers consumed by the simulation.
pub trait RandomSource {
    /// Returns a value uniformly distributed in `[0, 1)`.
    fn next_unit(&mut self) -> f32;

    /// Returns an index uniformly distributed in `[0, len)`.
    ///
    /// `len` must be non-zero.
    fn next_index(&mut self, len: usize) -> usize;
}

/// Deterministic generator seeded from a single integer.
#[derive(Clone, Debug)]
pub struct SeededRandom {
    rng: ChaCha8Rng,
}

impl SeededRandom {
    /// Creates a generator whose sequence is fully determined by `seed`.
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_unit(&mut self) -> f32 {
        self.rng.gen::<f32>()
    }

    fn next_index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len.max(1))
    }
}

/// Replays a fixed sequence of unit values, wrapping around when exhausted.
#[derive(Clone, Debug)]
pub struct ScriptedRandom {
    values: Vec<f32>,
    cursor: usize,
}

impl ScriptedRandom {
    /// Creates a source that yields `values` in order, cycling forever.
    ///
    /// An empty script behaves like a constant zero.
    #[must_use]
    pub fn new(values: Vec<f32>) -> Self {
        Self {
            values,
            cursor: 0,
        }
    }
}

impl RandomSource for ScriptedRandom {
    fn next_unit(&mut self) -> f32 {
        if self.values.is_empty() {
            return 0.0;
        }
        let value = self.values[self.cursor % self.values.len()];
        self.cursor = (self.cursor + 1) % self.values.len();
        value
    }

    fn next_index(&mut self, len: usize) -> usize {
        let unit = self.next_unit().clamp(0.0, 1.0);
        ((unit * len as f32) as usize).min(len.saturating_sub(1))
    }
}
