use ndarray::{Array1, ArrayView2, Zip};

use crate::criteria::{AcqParams, AcquisitionCriterion};
use crate::errors::Result;
use crate::surrogate::SurrogateModel;
use crate::utils::{norm_cdf, norm_pdf};

/// A structure for the upper confidence bound criterion
#[derive(Clone)]
pub struct UpperConfidenceBound;

impl AcquisitionCriterion for UpperConfidenceBound {
    fn name(&self) -> &'static str {
        "UCB"
    }

    /// `mean + kappa * std`; well-defined for any predictive distribution,
    /// including a flat prior with zero observations.
    fn score(
        &self,
        x: &ArrayView2<f64>,
        surrogate: &dyn SurrogateModel,
        _best_target: f64,
        params: &AcqParams,
    ) -> Result<Array1<f64>> {
        let (mean, std) = surrogate.predict(x)?;
        let kappa = params.kappa;
        Ok(Zip::from(&mean)
            .and(&std)
            .map_collect(|&m, &s| m + kappa * s))
    }
}

/// Upper confidence bound criterion
pub const UCB: UpperConfidenceBound = UpperConfidenceBound {};

/// A structure for the expected improvement criterion
#[derive(Clone)]
pub struct ExpectedImprovement;

impl AcquisitionCriterion for ExpectedImprovement {
    fn name(&self) -> &'static str {
        "EI"
    }

    /// With `z = (mean - best - xi) / std`, the score is
    /// `(mean - best - xi) * cdf(z) + std * pdf(z)`; an exact 0 where the
    /// predictive deviation is numerically indistinguishable from zero.
    fn score(
        &self,
        x: &ArrayView2<f64>,
        surrogate: &dyn SurrogateModel,
        best_target: f64,
        params: &AcqParams,
    ) -> Result<Array1<f64>> {
        let (mean, std) = surrogate.predict(x)?;
        let xi = params.xi;
        Ok(Zip::from(&mean).and(&std).map_collect(|&m, &s| {
            if s < f64::EPSILON {
                0.0
            } else {
                let improve = m - best_target - xi;
                let z = improve / s;
                improve * norm_cdf(z) + s * norm_pdf(z)
            }
        }))
    }
}

/// Expected improvement criterion
pub const EI: ExpectedImprovement = ExpectedImprovement {};

/// A structure for the probability of improvement criterion
#[derive(Clone)]
pub struct ProbabilityOfImprovement;

impl AcquisitionCriterion for ProbabilityOfImprovement {
    fn name(&self) -> &'static str {
        "POI"
    }

    /// `cdf(z)` with the same `z` and zero-deviation guard as EI.
    fn score(
        &self,
        x: &ArrayView2<f64>,
        surrogate: &dyn SurrogateModel,
        best_target: f64,
        params: &AcqParams,
    ) -> Result<Array1<f64>> {
        let (mean, std) = surrogate.predict(x)?;
        let xi = params.xi;
        Ok(Zip::from(&mean).and(&std).map_collect(|&m, &s| {
            if s < f64::EPSILON {
                0.0
            } else {
                norm_cdf((m - best_target - xi) / s)
            }
        }))
    }
}

/// Probability of improvement criterion
pub const POI: ProbabilityOfImprovement = ProbabilityOfImprovement {};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ConstantSurrogate;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_ucb_score() {
        let surrogate = ConstantSurrogate::new(1.0, 0.5);
        let x = array![[0.], [1.]];
        let scores = UCB
            .score(&x.view(), &surrogate, 0., &AcqParams { kappa: 2., xi: 0. })
            .unwrap();
        assert_abs_diff_eq!(scores[0], 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(scores[1], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_ei_matches_closed_form() {
        let surrogate = ConstantSurrogate::new(1.0, 1.0);
        let x = array![[0.]];
        let best = 0.5;
        let xi = 0.1;
        let scores = EI
            .score(&x.view(), &surrogate, best, &AcqParams { kappa: 0., xi })
            .unwrap();
        let improve = 1.0 - best - xi;
        let expected = improve * norm_cdf(improve) + norm_pdf(improve);
        assert_abs_diff_eq!(scores[0], expected, epsilon = 1e-12);
    }

    #[test]
    fn test_ei_poi_zero_std_is_exactly_zero() {
        // degenerate surrogate: no predictive uncertainty anywhere
        let surrogate = ConstantSurrogate::new(10.0, 0.0);
        let x = array![[0.], [1.], [2.]];
        let params = AcqParams { kappa: 2., xi: 0. };
        let ei = EI.score(&x.view(), &surrogate, 0., &params).unwrap();
        let poi = POI.score(&x.view(), &surrogate, 0., &params).unwrap();
        for i in 0..3 {
            assert_eq!(ei[i], 0.0);
            assert_eq!(poi[i], 0.0);
        }
    }

    #[test]
    fn test_poi_is_a_probability() {
        let surrogate = ConstantSurrogate::new(0.5, 2.0);
        let x = array![[0.]];
        let scores = POI
            .score(&x.view(), &surrogate, 0., &AcqParams { kappa: 0., xi: 0. })
            .unwrap();
        assert!(scores[0] > 0.0 && scores[0] < 1.0);
        assert_abs_diff_eq!(scores[0], norm_cdf(0.25), epsilon = 1e-12);
    }
}
