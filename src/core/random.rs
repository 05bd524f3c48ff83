//! Injectable randomness for reply selection and typing jitter

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of uniformly distributed indices
pub trait RandomSource: Send + Sync {
    /// Uniform value in `0..upper`. Returns 0 when `upper` is 0.
    fn below(&self, upper: usize) -> usize;
}

/// Pick a uniformly random entry from a non-empty table
pub fn pick<'a>(random: &dyn RandomSource, table: &[&'a str]) -> &'a str {
    table.get(random.below(table.len())).copied().unwrap_or_default()
}

/// Thread-local RNG, used in production
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn below(&self, upper: usize) -> usize {
        if upper == 0 {
            return 0;
        }
        rand::rng().random_range(0..upper)
    }
}

/// Deterministic RNG for reproducible selections
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn below(&self, upper: usize) -> usize {
        if upper == 0 {
            return 0;
        }
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        rng.random_range(0..upper)
    }
}

/// Always yields the same index, clamped to the range
#[cfg(test)]
#[derive(Debug, Clone, Copy)]
pub struct FixedRandom(pub usize);

#[cfg(test)]
impl RandomSource for FixedRandom {
    fn below(&self, upper: usize) -> usize {
        if upper == 0 {
            0
        } else {
            self.0.min(upper - 1)
        }
    }
}
