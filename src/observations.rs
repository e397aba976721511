//! Deduplicating storage of probed points and their target values.
//!
//! The store is the ground truth the surrogate model is fit against.
//! Observations are append-only; registering a parameter vector equal (after
//! clipping, on the canonical bit pattern) to a stored one overwrites that
//! row's target, last write wins, and does not grow the store. Re-probing the
//! same point with a different realization is legitimate for noisy functions,
//! while keeping exact duplicate rows out of the surrogate fit.

use std::collections::HashMap;

use ndarray::{Array1, Array2, ArrayView1};
use ndarray_rand::rand::Rng;

use crate::domain::Domain;
use crate::errors::{OptError, Result};

/// A probed point and its observed target value
#[derive(Clone, Debug, PartialEq)]
pub struct Observation {
    /// Probed parameters, inside the domain current at registration time
    pub x: Array1<f64>,
    /// Observed target value, always finite
    pub target: f64,
}

/// Bounded-domain, deduplicating observation storage with O(1) best-so-far.
#[derive(Debug)]
pub struct ObservationStore {
    domain: Domain,
    /// Row-major observation matrix, one row per stored point
    data: Vec<f64>,
    targets: Vec<f64>,
    /// Exact-match index from canonical bit pattern to row
    index: HashMap<Vec<u64>, usize>,
    /// Row of the running maximum
    best: Option<usize>,
    /// Bumped on every mutation, drives the engine's lazy refit
    version: u64,
}

impl ObservationStore {
    /// Creates an empty store over `domain`
    pub fn new(domain: Domain) -> Self {
        ObservationStore {
            domain,
            data: Vec::new(),
            targets: Vec::new(),
            index: HashMap::new(),
            best: None,
            version: 0,
        }
    }

    /// Current search domain
    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    /// Replaces the domain used for all subsequent clipping and sampling.
    ///
    /// Already-stored observations are retained as given, even when the new
    /// domain no longer contains them.
    pub fn set_domain(&mut self, domain: Domain) -> Result<()> {
        if domain.dim() != self.domain.dim() {
            return Err(OptError::InvalidDimension {
                expected: self.domain.dim(),
                actual: domain.dim(),
            });
        }
        self.domain = domain;
        Ok(())
    }

    /// Number of stored observations
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Whether the store holds no observation
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Domain dimension
    pub fn dim(&self) -> usize {
        self.domain.dim()
    }

    /// Mutation counter; a fit taken at version `v` is stale once this moves
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Registers `(x, target)`, clipping `x` into the domain first.
    ///
    /// A vector equal to a stored one overwrites that row's target.
    /// Non-finite targets and parameter values are rejected before any
    /// mutation; a wrong-length vector is a fatal caller error.
    pub fn add(&mut self, x: &ArrayView1<f64>, target: f64) -> Result<()> {
        if x.len() != self.dim() {
            return Err(OptError::InvalidDimension {
                expected: self.dim(),
                actual: x.len(),
            });
        }
        if !target.is_finite() {
            return Err(OptError::NonFiniteTarget(target));
        }
        if let Some((i, _)) = x.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(OptError::NonFiniteParam(self.domain.names()[i].clone()));
        }
        let x = self.domain.clip(x);
        let key = canonical_key(&x.view());
        if let Some(&row) = self.index.get(&key) {
            self.targets[row] = target;
            match self.best {
                Some(b) if b == row => self.rescan_best(),
                Some(b) if target > self.targets[b] => self.best = Some(row),
                _ => {}
            }
        } else {
            let row = self.targets.len();
            self.data.extend(x.iter());
            self.targets.push(target);
            self.index.insert(key, row);
            let improved = match self.best {
                Some(b) => target > self.targets[b],
                None => true,
            };
            if improved {
                self.best = Some(row);
            }
        }
        self.version += 1;
        Ok(())
    }

    /// Whether `x`, clipped, exactly matches a stored parameter vector
    pub fn contains(&self, x: &ArrayView1<f64>) -> bool {
        x.len() == self.dim() && {
            let clipped = self.domain.clip(x);
            self.index.contains_key(&canonical_key(&clipped.view()))
        }
    }

    /// All observations in insertion order, ready for a surrogate fit
    pub fn as_arrays(&self) -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_vec((self.len(), self.dim()), self.data.clone())
            .expect("row-major store data");
        let y = Array1::from_vec(self.targets.clone());
        (x, y)
    }

    /// Best observation so far, `None` while the store is empty
    pub fn max(&self) -> Option<Observation> {
        self.best.map(|row| Observation {
            x: self.row(row).to_owned(),
            target: self.targets[row],
        })
    }

    /// Draws one point uniformly from the current domain
    pub fn random_point<R: Rng>(&self, rng: &mut R) -> Array1<f64> {
        self.domain.sample_one(rng)
    }

    fn row(&self, row: usize) -> ArrayView1<f64> {
        let d = self.dim();
        ArrayView1::from(&self.data[row * d..(row + 1) * d])
    }

    fn rescan_best(&mut self) {
        self.best = self
            .targets
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(row, _)| row);
    }
}

/// Canonical exact-match key: the bit pattern of each component, with
/// negative zero folded onto zero so `-0.0` and `0.0` collide.
fn canonical_key(x: &ArrayView1<f64>) -> Vec<u64> {
    x.iter()
        .map(|&v| {
            let v = if v == 0.0 { 0.0 } else { v };
            v.to_bits()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use ndarray_rand::rand::SeedableRng;
    use rand_xoshiro::Xoshiro256Plus;

    fn domain() -> Domain {
        Domain::new([("x", (-2., 2.)), ("y", (-3., 3.))]).unwrap()
    }

    #[test]
    fn test_add_and_max() {
        let mut store = ObservationStore::new(domain());
        assert!(store.max().is_none());
        store.add(&array![0., 0.].view(), 1.).unwrap();
        store.add(&array![1., 1.].view(), 3.).unwrap();
        store.add(&array![-1., 2.].view(), 2.).unwrap();
        let best = store.max().unwrap();
        assert_eq!(best.x, array![1., 1.]);
        assert_eq!(best.target, 3.);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_clip_on_add() {
        let mut store = ObservationStore::new(domain());
        store.add(&array![5., -9.].view(), 0.).unwrap();
        let (x, _) = store.as_arrays();
        assert_eq!(x.row(0), array![2., -3.].view());
    }

    #[test]
    fn test_duplicate_overwrites_last_write_wins() {
        let mut store = ObservationStore::new(domain());
        store.add(&array![0.5, 0.5].view(), 1.).unwrap();
        store.add(&array![0.5, 0.5].view(), 7.).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.max().unwrap().target, 7.);
        // overwriting the best downwards re-elects the runner-up
        store.add(&array![1., 1.].view(), 5.).unwrap();
        store.add(&array![0.5, 0.5].view(), 0.).unwrap();
        assert_eq!(store.len(), 2);
        let best = store.max().unwrap();
        assert_eq!(best.x, array![1., 1.]);
        assert_eq!(best.target, 5.);
    }

    #[test]
    fn test_negative_zero_collides_with_zero() {
        let mut store = ObservationStore::new(domain());
        store.add(&array![0., 0.].view(), 1.).unwrap();
        assert!(store.contains(&array![-0., 0.].view()));
        store.add(&array![-0., 0.].view(), 2.).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_rejects_bad_inputs() {
        let mut store = ObservationStore::new(domain());
        assert!(matches!(
            store.add(&array![0.].view(), 1.),
            Err(OptError::InvalidDimension { expected: 2, actual: 1 })
        ));
        assert!(matches!(
            store.add(&array![0., 0.].view(), f64::NAN),
            Err(OptError::NonFiniteTarget(_))
        ));
        assert!(matches!(
            store.add(&array![f64::NAN, 0.].view(), 1.),
            Err(OptError::NonFiniteParam(_))
        ));
        // no rejected call left a trace
        assert!(store.is_empty());
        assert_eq!(store.version(), 0);
    }

    #[test]
    fn test_contains_uses_clipped_vector() {
        let mut store = ObservationStore::new(domain());
        store.add(&array![2., 3.].view(), 1.).unwrap();
        assert!(store.contains(&array![10., 10.].view()));
        assert!(!store.contains(&array![0., 0.].view()));
        assert!(!store.contains(&array![0.].view()));
    }

    #[test]
    fn test_as_arrays_round_trip() {
        let mut store = ObservationStore::new(domain());
        store.add(&array![0., 1.].view(), 1.).unwrap();
        store.add(&array![1., 0.].view(), 4.).unwrap();
        store.add(&array![-1., -1.].view(), 2.).unwrap();

        let (x, y) = store.as_arrays();
        let mut rebuilt = ObservationStore::new(domain());
        for (row, &target) in x.rows().into_iter().zip(y.iter()) {
            rebuilt.add(&row, target).unwrap();
        }
        assert_eq!(rebuilt.len(), store.len());
        assert_eq!(rebuilt.max(), store.max());
        for row in x.rows() {
            assert!(rebuilt.contains(&row));
        }
    }

    #[test]
    fn test_set_domain_keeps_observations() {
        let mut store = ObservationStore::new(domain());
        store.add(&array![2., 3.].view(), 1.).unwrap();
        store
            .set_domain(Domain::new([("x", (-1., 1.)), ("y", (-1., 1.))]).unwrap())
            .unwrap();
        // stored rows are untouched, new adds clip to the new domain
        let (x, _) = store.as_arrays();
        assert_eq!(x.row(0), array![2., 3.].view());
        store.add(&array![2., 3.].view(), 2.).unwrap();
        let (x, _) = store.as_arrays();
        assert_eq!(x.row(1), array![1., 1.].view());
        assert!(store
            .set_domain(Domain::new([("x", (0., 1.))]).unwrap())
            .is_err());
    }

    #[test]
    fn test_random_point_in_domain() {
        let store = ObservationStore::new(domain());
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        for _ in 0..50 {
            let p = store.random_point(&mut rng);
            assert!(store.domain().contains(&p.view()));
        }
    }
}
