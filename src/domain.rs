//! Bounded continuous search domain.
//!
//! A [`Domain`] is an ordered mapping from parameter name to a closed interval
//! `[lo, hi]`. Internally bounds are kept as an `(nx, 2)` matrix where the ith
//! row is the `[lower_bound, upper_bound]` of the ith component of `x`; the
//! name order given at construction defines the axis order of every vector
//! representation used by the crate.

use ndarray::{Array, Array1, Array2, ArrayView1, Zip};
use ndarray_rand::{rand::Rng, rand_distr::Uniform, RandomExt};

use crate::errors::{OptError, Result};
use crate::types::Params;

/// An ordered, named set of closed parameter intervals.
#[derive(Clone, Debug, PartialEq)]
pub struct Domain {
    /// Parameter names, in axis order
    names: Vec<String>,
    /// Sampling space definition as a (nx, 2) matrix
    xlimits: Array2<f64>,
}

impl Domain {
    /// Builds a domain from `(name, (lower, upper))` pairs, preserving order.
    ///
    /// ```
    /// use bayesopt::Domain;
    ///
    /// let domain = Domain::new([("x", (-2., 2.)), ("y", (-3., 3.))]).unwrap();
    /// assert_eq!(domain.dim(), 2);
    /// ```
    pub fn new<S, I>(bounds: I) -> Result<Self>
    where
        S: Into<String>,
        I: IntoIterator<Item = (S, (f64, f64))>,
    {
        let mut names = Vec::new();
        let mut limits = Vec::new();
        for (name, (lo, hi)) in bounds {
            let name = name.into();
            if !lo.is_finite() || !hi.is_finite() {
                return Err(OptError::InvalidDomain(format!(
                    "bounds of {name} must be finite, got [{lo}, {hi}]"
                )));
            }
            if lo > hi {
                return Err(OptError::InvalidDomain(format!(
                    "lower bound of {name} exceeds its upper bound ({lo} > {hi})"
                )));
            }
            if names.contains(&name) {
                return Err(OptError::InvalidDomain(format!("duplicate parameter {name}")));
            }
            names.push(name);
            limits.push(lo);
            limits.push(hi);
        }
        if names.is_empty() {
            return Err(OptError::InvalidDomain("empty parameter set".to_string()));
        }
        let xlimits = Array2::from_shape_vec((names.len(), 2), limits)
            .expect("bounds laid out two per parameter");
        Ok(Domain { names, xlimits })
    }

    /// Number of parameters
    pub fn dim(&self) -> usize {
        self.names.len()
    }

    /// Parameter names in axis order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Bounds as a (nx, 2) matrix \[\[lower, upper\], ...\]
    pub fn xlimits(&self) -> &Array2<f64> {
        &self.xlimits
    }

    /// Clamps each component of `x` into its interval
    pub fn clip(&self, x: &ArrayView1<f64>) -> Array1<f64> {
        Zip::from(x)
            .and(self.xlimits.rows())
            .map_collect(|&v, b| v.clamp(b[0], b[1]))
    }

    /// Whether `x` lies inside the domain (bounds included)
    pub fn contains(&self, x: &ArrayView1<f64>) -> bool {
        x.len() == self.dim()
            && Zip::from(x)
                .and(self.xlimits.rows())
                .all(|&v, b| b[0] <= v && v <= b[1])
    }

    /// Draws `n` points independently and uniformly, one row per point
    pub fn sample<R: Rng>(&self, n: usize, rng: &mut R) -> Array2<f64> {
        let lower = self.xlimits.column(0);
        let scaler = &self.xlimits.column(1) - &lower;
        Array::random_using((n, self.dim()), Uniform::new(0., 1.), rng) * scaler + lower
    }

    /// Draws one point uniformly from the domain
    pub fn sample_one<R: Rng>(&self, rng: &mut R) -> Array1<f64> {
        self.sample(1, rng).row(0).to_owned()
    }

    /// Renders a point as a named parameter assignment
    pub fn to_params(&self, x: &ArrayView1<f64>) -> Params {
        self.names
            .iter()
            .zip(x.iter())
            .map(|(name, &v)| (name.clone(), v))
            .collect()
    }

    /// Converts a named assignment back into a point, in axis order.
    ///
    /// The assignment must carry exactly the domain's parameters.
    pub fn params_to_point(&self, params: &Params) -> Result<Array1<f64>> {
        if params.len() != self.dim() {
            return Err(OptError::InvalidDimension {
                expected: self.dim(),
                actual: params.len(),
            });
        }
        let mut point = Vec::with_capacity(self.dim());
        for name in &self.names {
            let v = params
                .get(name)
                .ok_or_else(|| OptError::UnknownParameter(name.clone()))?;
            point.push(*v);
        }
        Ok(Array1::from_vec(point))
    }
}
