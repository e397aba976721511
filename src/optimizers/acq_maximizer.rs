use finitediff::FiniteDiff;
use ndarray::{Array1, ArrayView, ArrayView1};
use ndarray_rand::rand::Rng;
use ndarray_stats::QuantileExt;
use rayon::prelude::*;

use crate::config::EngineConfig;
use crate::criteria::AcquisitionFunction;
use crate::domain::Domain;
use crate::errors::Result;
use crate::optimizers::LocalOptimizer;
use crate::surrogate::SurrogateModel;
use crate::types::LocalSolver;

/// Two-phase maximization of the acquisition surface: a vectorized random
/// warm start followed by multi-start local refinement, with a duplicate
/// guard keeping already-registered points out of the suggestion.
pub(crate) struct AcqMaximizer<'a, R: Rng + Clone + Sync + Send> {
    domain: &'a Domain,
    n_warmup: usize,
    n_restarts: usize,
    max_eval: usize,
    max_duplicate_draws: usize,
    solver: LocalSolver,
    rng: R,
}

impl<'a, R: Rng + Clone + Sync + Send> AcqMaximizer<'a, R> {
    pub fn new(domain: &'a Domain, config: &EngineConfig, rng: R) -> AcqMaximizer<'a, R> {
        AcqMaximizer {
            domain,
            n_warmup: config.n_warmup,
            n_restarts: config.n_restarts,
            max_eval: config.max_eval,
            max_duplicate_draws: config.max_duplicate_draws,
            solver: config.local_solver,
            rng,
        }
    }

    /// Returns the point in the domain approximately maximizing `acq`.
    ///
    /// The acquisition surface is smooth but multi-modal; local search alone
    /// can get stuck, so every restart is seeded from a distinct random point
    /// and the warm-start incumbent competes with all local optima.
    pub fn maximize(
        &mut self,
        acq: &AcquisitionFunction,
        surrogate: &dyn SurrogateModel,
        best_target: f64,
        is_observed: &dyn Fn(&ArrayView1<f64>) -> bool,
    ) -> Result<Array1<f64>> {
        // Warm start: one batched scoring call over uniform candidates
        let candidates = self.domain.sample(self.n_warmup, &mut self.rng);
        let scores = acq
            .score(&candidates.view(), surrogate, best_target)?
            .mapv(|v| if v.is_nan() { f64::NEG_INFINITY } else { v });
        let incumbent = scores.argmax().expect("warmup candidates scored");
        let mut best_x = candidates.row(incumbent).to_owned();
        let mut best_score = scores[incumbent];

        // Local refinement, seeded from fresh draws plus the incumbent
        let seeds: Vec<Array1<f64>> = self
            .domain
            .sample(self.n_restarts, &mut self.rng)
            .outer_iter()
            .map(|row| row.to_owned())
            .chain(std::iter::once(best_x.clone()))
            .collect();
        let neg_acq = |x: &[f64], gradient: Option<&mut [f64]>, _u: &mut ()| -> f64 {
            if let Some(grad) = gradient {
                let f = |x: &Vec<f64>| -> f64 { -score_at(acq, surrogate, best_target, x) };
                grad.copy_from_slice(&x.to_vec().central_diff(&f));
            }
            -score_at(acq, surrogate, best_target, x)
        };
        let (solver, max_eval, xlimits) = (self.solver, self.max_eval, self.domain.xlimits());
        let refined: Vec<(f64, Array1<f64>)> = seeds
            .par_iter()
            .map(|xinit| {
                LocalOptimizer::new(solver, &neg_acq, xlimits, &xinit.view())
                    .max_eval(max_eval)
                    .minimize()
            })
            .collect();
        for (neg_score, x_opt) in refined {
            let score = -neg_score;
            if score > best_score {
                best_score = score;
                best_x = x_opt;
            }
        }
        log::debug!(
            "{} maximum {best_score} found at {best_x}",
            acq.name()
        );

        // Duplicate inputs make the next surrogate fit ill-conditioned;
        // substitute a fresh draw, bounded so suggestion always terminates
        let mut x_next = self.domain.clip(&best_x.view());
        let mut draws = 0;
        while is_observed(&x_next.view()) && draws < self.max_duplicate_draws {
            x_next = self.domain.sample_one(&mut self.rng);
            draws += 1;
        }
        if draws > 0 {
            log::debug!("suggestion already observed, substituted after {draws} random draw(s)");
        }
        Ok(x_next)
    }
}

/// Pointwise acquisition score for the local solvers; scoring failures rank
/// the point below every finite candidate.
fn score_at(
    acq: &AcquisitionFunction,
    surrogate: &dyn SurrogateModel,
    best_target: f64,
    x: &[f64],
) -> f64 {
    let pt = ArrayView::from_shape((1, x.len()), x).expect("point as single-row matrix");
    match acq.score(&pt, surrogate, best_target) {
        Ok(scores) if scores[0].is_finite() => scores[0],
        _ => f64::NEG_INFINITY,
    }
}
