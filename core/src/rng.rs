//! Deterministic random number generation for the sandbox backend.
//!
//! RULE: The sandbox never calls a platform RNG.
//! Every draw comes from a `LevelRng` derived from (seed, stream index),
//! so a stream can be rebuilt from two integers. That is what lets the
//! sandbox state serialize without carrying generator internals.

use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;

/// A deterministic RNG for one stream (one level layout, one episode pick).
pub struct LevelRng {
    inner: Pcg64Mcg,
}

impl LevelRng {
    /// The stream index must be stable for a given purpose.
    pub fn new(seed: u64, stream: u64) -> Self {
        let derived_seed = seed ^ (stream.wrapping_mul(0x9e37_79b9_7f4a_7c15));
        Self {
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        use rand::RngCore;
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Roll a u64 in [0, n).
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        use rand::RngCore;
        assert!(n > 0, "n must be > 0");
        self.inner.next_u64() % n
    }

    /// Bernoulli trial: returns true with probability p.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

/// Picks which level each episode plays.
/// `num_levels == 0` means the full level range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelSampler {
    pub seed:        u64,
    pub start_level: u64,
    pub num_levels:  u64,
}

impl LevelSampler {
    pub fn level_for_episode(&self, episode: u64) -> u64 {
        match self.num_levels {
            0 => LevelRng::new(self.seed, episode).next_u64_below(i32::MAX as u64),
            1 => self.start_level,
            n => self.start_level + LevelRng::new(self.seed, episode).next_u64_below(n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_stream_same_draws() {
        let mut a = LevelRng::new(42, 7);
        let mut b = LevelRng::new(42, 7);
        for _ in 0..32 {
            assert_eq!(a.next_u64_below(1000), b.next_u64_below(1000));
        }
    }

    #[test]
    fn single_level_is_pinned() {
        let sampler = LevelSampler { seed: 9, start_level: 1234, num_levels: 1 };
        for episode in 0..10 {
            assert_eq!(sampler.level_for_episode(episode), 1234);
        }
    }

    #[test]
    fn bounded_levels_stay_in_range() {
        let sampler = LevelSampler { seed: 9, start_level: 100, num_levels: 5 };
        for episode in 0..50 {
            let level = sampler.level_for_episode(episode);
            assert!((100..105).contains(&level), "level {level} out of range");
        }
    }
}
