//! Deterministic per-user and simulation-level RNG wrappers.
//!
//! # Determinism strategy
//!
//! Each user's movement model gets its own independent `SmallRng` seeded by:
//!
//!   seed = global_seed XOR (user_id * MIXING_CONSTANT)
//!
//! The mixing constant is the 64-bit fractional part of the golden ratio,
//! which spreads consecutive user IDs uniformly across the seed space.
//! Users never share RNG state, so adding or removing users does not disturb
//! the trajectories of the others.
//!
//! Strategy-level randomness (service shuffling, random population spawn)
//! goes through `SimRng`, seeded explicitly by its owner.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::UserId;

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

// ── UserRng ───────────────────────────────────────────────────────────────────

/// Per-user deterministic RNG, owned by that user's movement model.
pub struct UserRng(SmallRng);

impl UserRng {
    /// Seed deterministically from the run's global seed and a user ID.
    pub fn new(global_seed: u64, user: UserId) -> Self {
        let seed = global_seed ^ (user.0 as u64).wrapping_mul(MIXING_CONSTANT);
        UserRng(SmallRng::seed_from_u64(seed))
    }

    /// Uniform sample in `[lo, hi]`.  Returns `lo` when the interval is empty.
    #[inline]
    pub fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        if hi > lo { self.0.gen_range(lo..=hi) } else { lo }
    }
}

// ── SimRng ────────────────────────────────────────────────────────────────────

/// Simulation-level RNG for global operations (service shuffling, random
/// user spawning, configurator draws).
pub struct SimRng(SmallRng);

impl SimRng {
    pub fn new(seed: u64) -> Self {
        SimRng(SmallRng::seed_from_u64(seed))
    }

    #[inline]
    pub fn random<T>(&mut self) -> T
    where
        rand::distributions::Standard: rand::distributions::Distribution<T>,
    {
        self.0.r#gen()
    }

    #[inline]
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.0.gen_range(range)
    }

    /// Uniform sample in `[lo, hi]`.  Returns `lo` when the interval is empty.
    #[inline]
    pub fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        if hi > lo { self.0.gen_range(lo..=hi) } else { lo }
    }

    /// Shuffle a mutable slice in-place (Fisher-Yates).
    #[inline]
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        use rand::seq::SliceRandom;
        slice.shuffle(&mut self.0);
    }
}
