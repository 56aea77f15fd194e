//! Random musical choices
//!
//! Pan jitter, pattern fill, octave jumps. The distributions are cosmetic,
//! not structural, so the capability is a small trait the loops depend on:
//! production uses a `SmallRng` per task, tests inject a seeded source for
//! determinism.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Random-choice capability used by the playback loops.
pub trait RandomSource: Send {
    /// Uniform value in `[lo, hi)`.
    fn range(&mut self, lo: f32, hi: f32) -> f32;

    /// Uniform index in `[0, len)`.
    fn pick_index(&mut self, len: usize) -> usize;

    /// True with probability `1/n`.
    fn one_in(&mut self, n: u32) -> bool;

    /// Uniformly choose one element.
    fn choose<'a, T>(&mut self, items: &'a [T]) -> &'a T
    where
        Self: Sized,
    {
        &items[self.pick_index(items.len())]
    }
}

/// `rand`-backed source. Each loop task owns its own.
pub struct SmallRngSource {
    rng: SmallRng,
}

impl SmallRngSource {
    pub fn from_entropy() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SmallRngSource {
    fn range(&mut self, lo: f32, hi: f32) -> f32 {
        self.rng.gen_range(lo..hi)
    }

    fn pick_index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }

    fn one_in(&mut self, n: u32) -> bool {
        self.rng.gen_range(0..n) == 0
    }
}
