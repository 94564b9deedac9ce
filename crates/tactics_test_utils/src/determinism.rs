//! Determinism testing utilities.
//!
//! Provides a harness for verifying that a match produces identical results
//! given identical inputs.
//!
//! # Testing Strategy
//!
//! Sources of non-determinism the engine guards against:
//!
//! - **Floating-point math**: visual poses use fixed-point arithmetic via
//!   [`tactics_core::math::Fixed`]; gameplay state is integer.
//!
//! - **HashMap iteration order**: actors and sides are iterated in index
//!   order and reachability maps are `BTreeMap`s.
//!
//! - **System randomness**: none. Automated policies break ties by
//!   coordinates and ids.

use tactics_core::prelude::*;

use crate::fixtures::all_auto;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic match).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the match was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Match is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a state machine multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run
/// * `ticks` - Number of ticks per run
/// * `setup` - Creates the initial state
/// * `step` - Advances the state by one tick; receives the tick index
/// * `hash` - Computes the state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S, u64),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();
        for tick in 0..ticks {
            step(&mut state, tick);
        }
        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Run `config` with every side automated, `runs` times for `ticks` ticks
/// each, and compare orchestrator state hashes.
///
/// # Panics
///
/// Panics if the config cannot be built.
#[must_use]
pub fn verify_match_determinism(config: &MatchConfig, runs: usize, ticks: u64) -> DeterminismResult {
    let config = all_auto(config);
    verify_determinism(
        runs,
        ticks,
        || Orchestrator::from_config(&config).expect("config builds a battle"),
        |orchestrator, _| orchestrator.tick(None),
        Orchestrator::state_hash,
    )
}

/// Run the same scripted inputs twice and verify both runs match.
///
/// # Panics
///
/// Panics if the config cannot be built.
#[must_use]
pub fn verify_scripted_determinism(config: &MatchConfig, inputs: &[Option<InputEvent>]) -> bool {
    let run = || {
        let mut orchestrator = Orchestrator::from_config(config).expect("config builds a battle");
        for input in inputs {
            orchestrator.tick(*input);
        }
        orchestrator.state_hash()
    };
    run() == run()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skirmish_is_deterministic() {
        let mut config = MatchConfig::skirmish();
        config.timing = TimingConfig::instant();
        verify_match_determinism(&config, 3, 200).assert_deterministic();
    }

    #[test]
    fn test_unique_hashes() {
        let result = DeterminismResult {
            is_deterministic: false,
            hashes: vec![3, 1, 3],
            ticks: 1,
        };
        assert_eq!(result.unique_hashes(), vec![1, 3]);
    }

    #[test]
    #[should_panic(expected = "non-deterministic")]
    fn test_divergence_panics() {
        DeterminismResult {
            is_deterministic: false,
            hashes: vec![1, 2],
            ticks: 1,
        }
        .assert_deterministic();
    }
}
