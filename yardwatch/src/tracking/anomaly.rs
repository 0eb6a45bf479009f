//! Choosing which entity, if any, to flag as misplaced.
//!
//! Misplacement is a heuristic signal: once per cycle, with a configured
//! probability, one active entity is picked uniformly at random. The choice
//! sits behind a trait so tests can make it deterministic.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Decides whether to flag an entity this cycle, and which one.
///
/// # Implementations
///
/// - `RandomPicker` - production: Bernoulli trial, then a uniform pick
/// - `NeverFlag` - testing: never flags
/// - `AlwaysFlagFirst` - testing: always flags the first candidate
pub trait MisplacedPicker: Send + Sync {
    /// Return the index of the candidate to flag, or `None`.
    ///
    /// `candidates` is the number of active entities and is never zero.
    fn pick(&self, probability: f64, candidates: usize) -> Option<usize>;
}

/// Random picker over a seedable RNG.
pub struct RandomPicker {
    rng: Mutex<StdRng>,
}

impl RandomPicker {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            rng: Mutex::new(rng),
        }
    }
}

impl std::fmt::Debug for RandomPicker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RandomPicker").finish_non_exhaustive()
    }
}

impl MisplacedPicker for RandomPicker {
    fn pick(&self, probability: f64, candidates: usize) -> Option<usize> {
        if candidates == 0 || probability <= 0.0 {
            return None;
        }
        let mut rng = self.rng.lock();
        if rng.random::<f64>() >= probability {
            return None;
        }
        Some(rng.random_range(0..candidates))
    }
}

/// Picker that never flags anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverFlag;

impl MisplacedPicker for NeverFlag {
    fn pick(&self, _probability: f64, _candidates: usize) -> Option<usize> {
        None
    }
}

/// Picker that always flags the first candidate.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysFlagFirst;

impl MisplacedPicker for AlwaysFlagFirst {
    fn pick(&self, _probability: f64, candidates: usize) -> Option<usize> {
        (candidates > 0).then_some(0)
    }
}
