//! Surrogate model collaborator interface.
//!
//! The regression model itself is external to this crate: anything able to
//! fit the observation history and report a predictive mean and standard
//! deviation can drive the suggestion engine. Implementations must be
//! internally thread-safe for `&self` calls since the acquisition maximizer
//! evaluates predictions from its restart fan-out.

use ndarray::{Array1, ArrayView1, ArrayView2};

/// A probabilistic regression model over the observation history.
pub trait SurrogateModel: Send + Sync {
    /// Fits the model against the full observation history `(x, y)`,
    /// one row of `x` per observation.
    ///
    /// An `Err` reports an internal numerical failure (e.g. an
    /// ill-conditioned covariance from near-duplicate points); the engine
    /// retries once with jittered inputs before giving up.
    fn fit(&mut self, x: &ArrayView2<f64>, y: &ArrayView1<f64>) -> anyhow::Result<()>;

    /// Predictive mean and standard deviation at each row of `x`.
    fn predict(&self, x: &ArrayView2<f64>) -> anyhow::Result<(Array1<f64>, Array1<f64>)>;
}
