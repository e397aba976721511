//! Acquisition scoring policies used to pick the next probe location.
mod classic;

pub use classic::{
    ExpectedImprovement, ProbabilityOfImprovement, UpperConfidenceBound, EI, POI, UCB,
};

use ndarray::{Array1, ArrayView2};

use crate::errors::Result;
use crate::surrogate::SurrogateModel;
use crate::types::AcquisitionStrategy;

/// Numeric parameters handed to a criterion at scoring time
#[derive(Clone, Copy, Debug)]
pub struct AcqParams {
    /// Exploration weight (UCB)
    pub kappa: f64,
    /// Improvement margin (EI, POI)
    pub xi: f64,
}

/// A trait for acquisition criteria whose maximum location determines the
/// next most promising point to probe.
///
/// Scoring is a pure function of its inputs: candidates are scored in one
/// batched surrogate prediction, and no internal state is mutated.
pub trait AcquisitionCriterion: Send + Sync {
    /// Name of the criterion
    fn name(&self) -> &'static str;

    /// Scores every row of `x` against the surrogate's predictive
    /// distribution and the best target observed so far.
    fn score(
        &self,
        x: &ArrayView2<f64>,
        surrogate: &dyn SurrogateModel,
        best_target: f64,
        params: &AcqParams,
    ) -> Result<Array1<f64>>;
}

impl std::fmt::Debug for dyn AcquisitionCriterion {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// An acquisition function: a scoring policy plus its numeric state and an
/// optional kappa decay schedule.
///
/// Decay is applied out-of-band between scoring calls: the engine calls
/// [`AcquisitionFunction::update`] exactly once per suggestion, and one decay
/// step fires per call past the configured delay.
#[derive(Debug)]
pub struct AcquisitionFunction {
    criterion: Box<dyn AcquisitionCriterion>,
    kappa: f64,
    xi: f64,
    kappa_decay: f64,
    kappa_decay_delay: usize,
    kappa_min: f64,
    iterations: usize,
}

impl AcquisitionFunction {
    /// Builds an acquisition function for the given strategy with the
    /// default parameters (`kappa = 2.576`, `xi = 0.0`, no decay).
    pub fn new(strategy: AcquisitionStrategy) -> Self {
        let criterion: Box<dyn AcquisitionCriterion> = match strategy {
            AcquisitionStrategy::UpperConfidenceBound => Box::new(UCB),
            AcquisitionStrategy::ExpectedImprovement => Box::new(EI),
            AcquisitionStrategy::ProbabilityOfImprovement => Box::new(POI),
        };
        AcquisitionFunction {
            criterion,
            kappa: 2.576,
            xi: 0.0,
            kappa_decay: 1.0,
            kappa_decay_delay: 0,
            kappa_min: 0.0,
            iterations: 0,
        }
    }

    /// Sets the exploration weight used by UCB
    pub fn kappa(mut self, kappa: f64) -> Self {
        self.kappa = kappa;
        self
    }

    /// Sets the improvement margin used by EI and POI
    pub fn xi(mut self, xi: f64) -> Self {
        self.xi = xi;
        self
    }

    /// Enables kappa decay: after each suggestion beyond `delay` iterations,
    /// `kappa <- max(kappa * gamma, kappa_min)` with `gamma` in (0, 1].
    pub fn kappa_decay(mut self, gamma: f64, delay: usize) -> Self {
        self.kappa_decay = gamma;
        self.kappa_decay_delay = delay;
        self
    }

    /// Sets the floor kappa never decays below (default 0)
    pub fn kappa_min(mut self, kappa_min: f64) -> Self {
        self.kappa_min = kappa_min;
        self
    }

    /// Current numeric parameters
    pub fn current(&self) -> AcqParams {
        AcqParams {
            kappa: self.kappa,
            xi: self.xi,
        }
    }

    /// Name of the underlying criterion
    pub fn name(&self) -> &'static str {
        self.criterion.name()
    }

    /// Scores every row of `x`; pure, see [`AcquisitionCriterion::score`]
    pub fn score(
        &self,
        x: &ArrayView2<f64>,
        surrogate: &dyn SurrogateModel,
        best_target: f64,
    ) -> Result<Array1<f64>> {
        self.criterion.score(x, surrogate, best_target, &self.current())
    }

    /// Advances the iteration count and fires at most one decay step.
    ///
    /// Idempotent per suggestion: the engine calls this once per `suggest`,
    /// and kappa never goes below the configured floor.
    pub fn update(&mut self) {
        self.iterations += 1;
        if self.kappa_decay < 1.0 && self.iterations > self.kappa_decay_delay {
            self.kappa = (self.kappa * self.kappa_decay).max(self.kappa_min);
        }
    }
}

impl Default for AcquisitionFunction {
    fn default() -> Self {
        AcquisitionFunction::new(AcquisitionStrategy::UpperConfidenceBound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_decay_schedule() {
        let mut acq = AcquisitionFunction::new(AcquisitionStrategy::UpperConfidenceBound)
            .kappa(2.0)
            .kappa_decay(0.5, 2);
        // delayed: first two updates leave kappa untouched
        acq.update();
        acq.update();
        assert_abs_diff_eq!(acq.current().kappa, 2.0);
        acq.update();
        assert_abs_diff_eq!(acq.current().kappa, 1.0);
        acq.update();
        assert_abs_diff_eq!(acq.current().kappa, 0.5);
    }

    #[test]
    fn test_decay_respects_floor() {
        let mut acq = AcquisitionFunction::new(AcquisitionStrategy::UpperConfidenceBound)
            .kappa(1.0)
            .kappa_decay(0.1, 0)
            .kappa_min(0.05);
        for _ in 0..10 {
            acq.update();
        }
        assert_abs_diff_eq!(acq.current().kappa, 0.05);
    }

    #[test]
    fn test_no_decay_by_default() {
        let mut acq = AcquisitionFunction::default().kappa(3.0);
        for _ in 0..5 {
            acq.update();
        }
        assert_abs_diff_eq!(acq.current().kappa, 3.0);
    }
}
