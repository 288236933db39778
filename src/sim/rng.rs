//! Seeded random stream for track layout
//!
//! PCG32 is fully specified, so the same seed gives the same stream on every
//! platform. Nothing reseeds it from an entropy source once created.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// Deterministic PRNG seeded from a single 32-bit value
#[derive(Debug, Clone)]
pub struct TrackRng {
    seed: u32,
    rng: Pcg32,
}

impl TrackRng {
    pub fn new(seed: u32) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(u64::from(seed)),
        }
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Next value in [0, 1)
    pub fn next_f32(&mut self) -> f32 {
        self.rng.random::<f32>()
    }

    /// Next value in [lo, hi)
    pub fn range(&mut self, lo: f32, hi: f32) -> f32 {
        if hi <= lo {
            return lo;
        }
        self.rng.random_range(lo..hi)
    }
}
