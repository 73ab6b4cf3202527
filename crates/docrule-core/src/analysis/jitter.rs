//! Randomness for heuristic confidence scores.
//!
//! Heuristic confidence carries a small random offset so repeated checks do
//! not report suspiciously identical numbers. The source is injected so
//! tests and reproducible runs can pin it down.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Supplies bounded random offsets.
pub trait JitterSource: Send {
    /// Return a value in `0..upper`. Returns 0 when `upper` is 0.
    fn jitter(&mut self, upper: u32) -> u32;
}

impl<J: JitterSource + ?Sized> JitterSource for Box<J> {
    fn jitter(&mut self, upper: u32) -> u32 {
        (**self).jitter(upper)
    }
}

/// Thread-local OS-seeded generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadJitter;

impl JitterSource for ThreadJitter {
    fn jitter(&mut self, upper: u32) -> u32 {
        if upper == 0 {
            return 0;
        }
        rand::thread_rng().gen_range(0..upper)
    }
}

/// Reproducible generator seeded from a `u64`.
#[derive(Debug, Clone)]
pub struct SeededJitter {
    rng: StdRng,
}

impl SeededJitter {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl JitterSource for SeededJitter {
    fn jitter(&mut self, upper: u32) -> u32 {
        if upper == 0 {
            return 0;
        }
        self.rng.gen_range(0..upper)
    }
}

/// Always returns the same offset, capped below `upper`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedJitter(pub u32);

impl JitterSource for FixedJitter {
    fn jitter(&mut self, upper: u32) -> u32 {
        self.0.min(upper.saturating_sub(1))
    }
}

/// Pick a seeded source when a seed is configured, the thread RNG otherwise.
pub fn jitter_from_seed(seed: Option<u64>) -> Box<dyn JitterSource> {
    match seed {
        Some(seed) => Box::new(SeededJitter::new(seed)),
        None => Box::new(ThreadJitter),
    }
}
