use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::observations::Observation;

/// A named parameter assignment, as handed to objective functions.
///
/// Keys are the domain's parameter names; the axis order used internally
/// is the domain's, not the map's.
pub type Params = HashMap<String, f64>;

/// An objective function collaborator.
///
/// Maps a named parameter assignment to a target value; any `Err` marks the
/// evaluation as failed and is treated identically regardless of its cause.
pub type Objective = Box<dyn Fn(&Params) -> anyhow::Result<f64> + Send + Sync>;

/// Scoring policy turning the surrogate's predictive distribution into
/// a "value of probing here" score
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AcquisitionStrategy {
    /// Upper confidence bound: `mean + kappa * std`
    UpperConfidenceBound,
    /// Expected improvement over the best target, with margin `xi`
    ExpectedImprovement,
    /// Probability of improvement over the best target, with margin `xi`
    ProbabilityOfImprovement,
}

/// Local solver used to refine the acquisition maximum
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocalSolver {
    /// Cobyla (derivative-free)
    Cobyla,
    /// SLSQP with central finite-difference gradients
    Slsqp,
}

/// Phase of the convenience `maximize` loop.
///
/// `Done` only marks the loop's completion; the engine stays usable for
/// further manual suggest/register calls afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineState {
    /// No maximize loop has run yet
    Idle,
    /// Pure random exploration over the first `init_points` iterations
    Warmup,
    /// Acquisition-driven iterations
    Refine,
    /// Loop budget exhausted
    Done,
}

/// Outcome of a single probe of the objective function
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ProbeOutcome {
    /// The objective returned a finite target which was registered
    Evaluated(f64),
    /// The evaluation failed and was discarded
    Failed,
}

/// Result of a `maximize` run
#[derive(Clone, Debug)]
pub struct OptimResult {
    /// Best observation over the whole history, if any evaluation succeeded
    pub best: Option<Observation>,
    /// Number of successful registrations during the run
    pub n_steps: usize,
    /// Number of discarded evaluations during the run
    pub n_skips: usize,
}

/// A trait for functions used by internal optimizers
/// Functions are expected to be defined as `g(x, g, u)` where
/// * `x` is the input information,
/// * `g` an optional gradient information to be updated if present
/// * `u` information provided by the user
pub trait ObjFn<U>: Fn(&[f64], Option<&mut [f64]>, &mut U) -> f64 {}
impl<T, U> ObjFn<U> for T where T: Fn(&[f64], Option<&mut [f64]>, &mut U) -> f64 {}
