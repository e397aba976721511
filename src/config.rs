//! Suggestion engine configuration.
use serde::{Deserialize, Serialize};

use crate::errors::{OptError, Result};
use crate::optimizers::ACQ_MAX_EVAL_DEFAULT;
use crate::types::LocalSolver;

/// Tuning knobs of the acquisition search and of the engine's randomness.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Number of uniform random candidates scored in the warm-start phase
    pub(crate) n_warmup: usize,
    /// Number of local refinement restarts (the warm-start incumbent is
    /// always added as one extra seed)
    pub(crate) n_restarts: usize,
    /// Evaluation budget of each local refinement run
    pub(crate) max_eval: usize,
    /// Solver used for local refinement
    pub(crate) local_solver: LocalSolver,
    /// Bound on random substitutions when a suggestion collides with an
    /// already-registered point
    pub(crate) max_duplicate_draws: usize,
    /// Random generator seed for reproducible runs
    pub(crate) seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            n_warmup: 10_000,
            n_restarts: 10,
            max_eval: ACQ_MAX_EVAL_DEFAULT,
            local_solver: LocalSolver::Cobyla,
            max_duplicate_draws: 10,
            seed: None,
        }
    }
}

impl EngineConfig {
    /// Sets the number of warm-start candidates
    pub fn n_warmup(mut self, n_warmup: usize) -> Self {
        self.n_warmup = n_warmup;
        self
    }

    /// Sets the number of local refinement restarts
    pub fn n_restarts(mut self, n_restarts: usize) -> Self {
        self.n_restarts = n_restarts;
        self
    }

    /// Sets the evaluation budget of each local refinement run
    pub fn max_eval(mut self, max_eval: usize) -> Self {
        self.max_eval = max_eval;
        self
    }

    /// Sets the local refinement solver
    pub fn local_solver(mut self, local_solver: LocalSolver) -> Self {
        self.local_solver = local_solver;
        self
    }

    /// Sets the bound on duplicate-suggestion substitutions
    pub fn max_duplicate_draws(mut self, max_duplicate_draws: usize) -> Self {
        self.max_duplicate_draws = max_duplicate_draws;
        self
    }

    /// Seeds the random generator to get reproducible runs
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub(crate) fn check(self) -> Result<Self> {
        if self.n_warmup == 0 {
            return Err(OptError::InvalidConfig("n_warmup must be >= 1".to_string()));
        }
        if self.n_restarts == 0 {
            return Err(OptError::InvalidConfig(
                "n_restarts must be >= 1".to_string(),
            ));
        }
        if self.max_eval == 0 {
            return Err(OptError::InvalidConfig("max_eval must be >= 1".to_string()));
        }
        Ok(self)
    }
}
