//! This library implements sequential model-based (Bayesian) optimization of
//! an expensive black-box function over a bounded continuous domain: fit a
//! probabilistic surrogate to the evaluation history, maximize an acquisition
//! function over its predictive distribution, probe there, repeat.
//!
//! The surrogate regression model is a collaborator, not part of this crate:
//! anything implementing [`SurrogateModel`] (a `fit`/`predict` pair) plugs
//! in. The engine exposes both a self-driving [`OptimizationEngine::maximize`]
//! loop and the decoupled `suggest`/`register` primitives, so evaluations can
//! run anywhere — worker threads, other processes, remote machines — and be
//! told back to the engine when they land.
//!
//! # Example
//!
//! ```
//! use bayesopt::{
//!     AcquisitionFunction, AcquisitionStrategy, Domain, EngineBuilder, Params, SurrogateModel,
//! };
//! use ndarray::{Array1, ArrayView1, ArrayView2};
//!
//! // A minimal surrogate: inverse-distance weighting of the history, with
//! // predictive deviation growing with the distance to the closest point.
//! #[derive(Default)]
//! struct InverseDistance {
//!     x: Vec<Vec<f64>>,
//!     y: Vec<f64>,
//! }
//!
//! impl SurrogateModel for InverseDistance {
//!     fn fit(&mut self, x: &ArrayView2<f64>, y: &ArrayView1<f64>) -> anyhow::Result<()> {
//!         self.x = x.rows().into_iter().map(|r| r.to_vec()).collect();
//!         self.y = y.to_vec();
//!         Ok(())
//!     }
//!
//!     fn predict(&self, x: &ArrayView2<f64>) -> anyhow::Result<(Array1<f64>, Array1<f64>)> {
//!         let (mut mean, mut std) = (Vec::new(), Vec::new());
//!         for q in x.rows() {
//!             let d2: Vec<f64> = self
//!                 .x
//!                 .iter()
//!                 .map(|p| p.iter().zip(q.iter()).map(|(a, b)| (a - b) * (a - b)).sum())
//!                 .collect();
//!             let dmin = d2.iter().cloned().fold(f64::INFINITY, f64::min);
//!             if dmin < 1e-16 {
//!                 let i = d2.iter().position(|&d| d == dmin).unwrap();
//!                 mean.push(self.y[i]);
//!                 std.push(0.);
//!             } else {
//!                 let w: Vec<f64> = d2.iter().map(|&d| 1. / d).collect();
//!                 let wsum: f64 = w.iter().sum();
//!                 mean.push(w.iter().zip(&self.y).map(|(wi, yi)| wi * yi).sum::<f64>() / wsum);
//!                 std.push(dmin.sqrt());
//!             }
//!         }
//!         Ok((Array1::from_vec(mean), Array1::from_vec(std)))
//!     }
//! }
//!
//! // Maximum of the objective is 1 at (0, 1)
//! let objective = |p: &Params| -> anyhow::Result<f64> {
//!     Ok(-p["x"] * p["x"] - (p["y"] - 1.) * (p["y"] - 1.) + 1.)
//! };
//!
//! let domain = Domain::new([("x", (-2., 2.)), ("y", (-3., 3.))])?;
//! let engine = EngineBuilder::maximize(objective)
//!     .configure(|config| config.n_warmup(500).n_restarts(4).seed(42))
//!     .within(domain, InverseDistance::default())?;
//!
//! let mut acq = AcquisitionFunction::new(AcquisitionStrategy::UpperConfidenceBound);
//! let result = engine.maximize(2, 8, &mut acq)?;
//!
//! let best = result.best.expect("all evaluations succeeded");
//! assert!(best.target <= 1.0);
//! # Ok::<(), bayesopt::OptError>(())
//! ```
//!
//! For the decoupled pattern, build with [`EngineBuilder::ask_tell`], call
//! [`OptimizationEngine::suggest`] to obtain the next promising parameters,
//! evaluate them however and wherever suits, then
//! [`OptimizationEngine::register`] the outcome; failed evaluations are
//! simply never registered. Lifecycle observers ([`Subscriber`],
//! [`OptEvent`]) hook progress reporting in without touching the loop.

mod config;
mod criteria;
mod domain;
mod engine;
mod errors;
mod events;
mod observations;
mod optimizers;
mod surrogate;
#[cfg(test)]
pub(crate) mod testing;
mod transform;
mod types;
mod utils;

pub use config::EngineConfig;
pub use criteria::{
    AcqParams, AcquisitionCriterion, AcquisitionFunction, ExpectedImprovement,
    ProbabilityOfImprovement, UpperConfidenceBound, EI, POI, UCB,
};
pub use domain::Domain;
pub use engine::{EngineBuilder, OptimizationEngine};
pub use errors::{OptError, Result};
pub use events::{EventBus, Observer, OptEvent, Subscriber};
pub use observations::{Observation, ObservationStore};
pub use surrogate::SurrogateModel;
pub use transform::DomainTransform;
pub use types::{
    AcquisitionStrategy, EngineState, LocalSolver, ObjFn, Objective, OptimResult, Params,
    ProbeOutcome,
};
pub use utils::{norm_cdf, norm_pdf};
