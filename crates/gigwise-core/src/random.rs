//! Injectable random source
//!
//! Business rules that intentionally draw random numbers (the workday
//! inclusion filter, the suggested reduction percentage) take a
//! `&mut dyn RandomSource` so callers can seed or stub them.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of the random draws used by insight rules
pub trait RandomSource: Send {
    /// Uniform draw in `[0, 1)`
    fn uniform(&mut self) -> f64;

    /// Uniform integer in `lo..=hi`
    fn int_inclusive(&mut self, lo: u32, hi: u32) -> u32;
}

impl<R: Rng + Send> RandomSource for R {
    fn uniform(&mut self) -> f64 {
        self.gen::<f64>()
    }

    fn int_inclusive(&mut self, lo: u32, hi: u32) -> u32 {
        if lo >= hi {
            return lo;
        }
        self.gen_range(lo..=hi)
    }
}

/// Build the default source: seeded when a seed is configured, otherwise
/// seeded from OS entropy
pub fn default_source(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// A source that always returns the same values (for tests and dry runs)
#[derive(Debug, Clone, Copy)]
pub struct FixedSource {
    pub uniform: f64,
    pub int: u32,
}

impl FixedSource {
    pub fn new(uniform: f64, int: u32) -> Self {
        Self { uniform, int }
    }
}

impl RandomSource for FixedSource {
    fn uniform(&mut self) -> f64 {
        self.uniform
    }

    fn int_inclusive(&mut self, lo: u32, hi: u32) -> u32 {
        self.int.clamp(lo, hi.max(lo))
    }
}
