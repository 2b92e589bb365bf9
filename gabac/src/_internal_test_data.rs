//! Shared deterministic test fixtures. Not part of the public API.

use lazy_static::lazy_static;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

/// Generates `len` pseudo-random symbols in `[0, max]`, deterministic
/// in `seed`.
#[must_use]
pub fn random_symbols(len: usize, max: u64, seed: u64) -> Vec<u64> {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    (0..len).map(|_| rng.gen_range(0..=max)).collect()
}

/// Generates a run-heavy symbol sequence: random values repeated with
/// random run lengths up to `max_run`.
#[must_use]
pub fn run_heavy_symbols(len: usize, max: u64, max_run: usize, seed: u64) -> Vec<u64> {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let mut symbols = Vec::with_capacity(len);
    while symbols.len() < len {
        let value = rng.gen_range(0..=max);
        let run = rng.gen_range(1..=max_run).min(len - symbols.len());
        symbols.extend(std::iter::repeat(value).take(run));
    }
    symbols
}

/// Generates a slowly drifting sequence, a good fit for diff coding.
#[must_use]
pub fn drifting_symbols(len: usize, max: u64, seed: u64) -> Vec<u64> {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let mut value: u64 = max / 2;
    (0..len)
        .map(|_| {
            let step = rng.gen_range(0..=6);
            value = (value + step).saturating_sub(3).min(max);
            value
        })
        .collect()
}

lazy_static! {
    /// 1000 random byte-sized symbols.
    pub static ref SYMBOLS_RANDOM_1K: Vec<u64> = random_symbols(1000, 255, 7);
    /// 1000 byte-sized symbols dominated by runs.
    pub static ref SYMBOLS_RUNS_1K: Vec<u64> = run_heavy_symbols(1000, 200, 40, 11);
    /// 1000 byte-sized symbols forming a slow random walk.
    pub static ref SYMBOLS_DRIFT_1K: Vec<u64> = drifting_symbols(1000, 255, 13);
}
