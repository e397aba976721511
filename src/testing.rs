//! Surrogate test doubles shared by the unit tests.

use std::sync::Mutex;

use anyhow::anyhow;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use crate::surrogate::SurrogateModel;

/// Predicts the same mean and deviation everywhere.
pub(crate) struct ConstantSurrogate {
    mean: f64,
    std: f64,
}

impl ConstantSurrogate {
    pub fn new(mean: f64, std: f64) -> Self {
        ConstantSurrogate { mean, std }
    }
}

impl SurrogateModel for ConstantSurrogate {
    fn fit(&mut self, _x: &ArrayView2<f64>, _y: &ArrayView1<f64>) -> anyhow::Result<()> {
        Ok(())
    }

    fn predict(&self, x: &ArrayView2<f64>) -> anyhow::Result<(Array1<f64>, Array1<f64>)> {
        Ok((
            Array1::from_elem(x.nrows(), self.mean),
            Array1::from_elem(x.nrows(), self.std),
        ))
    }
}

/// Mean peaking at a fixed center (negated squared distance), constant
/// deviation; gives the acquisition maximizer a known optimum to find.
pub(crate) struct PeakSurrogate {
    center: Array1<f64>,
    std: f64,
}

impl PeakSurrogate {
    pub fn new(center: Array1<f64>, std: f64) -> Self {
        PeakSurrogate { center, std }
    }
}

impl SurrogateModel for PeakSurrogate {
    fn fit(&mut self, _x: &ArrayView2<f64>, _y: &ArrayView1<f64>) -> anyhow::Result<()> {
        Ok(())
    }

    fn predict(&self, x: &ArrayView2<f64>) -> anyhow::Result<(Array1<f64>, Array1<f64>)> {
        let mean = x.map_axis(ndarray::Axis(1), |row| {
            -row.iter()
                .zip(self.center.iter())
                .map(|(a, b)| (a - b) * (a - b))
                .sum::<f64>()
        });
        Ok((mean, Array1::from_elem(x.nrows(), self.std)))
    }
}

/// Aborts the test on any use; proves a code path never touches the model.
pub(crate) struct PanickingSurrogate;

impl SurrogateModel for PanickingSurrogate {
    fn fit(&mut self, _x: &ArrayView2<f64>, _y: &ArrayView1<f64>) -> anyhow::Result<()> {
        panic!("surrogate must not be fitted on this path");
    }

    fn predict(&self, _x: &ArrayView2<f64>) -> anyhow::Result<(Array1<f64>, Array1<f64>)> {
        panic!("surrogate must not be queried on this path");
    }
}

/// Fails its first `failures` fit calls, then behaves like a flat model;
/// exercises the engine's jitter retry.
pub(crate) struct FlakyFitSurrogate {
    failures: Mutex<usize>,
}

impl FlakyFitSurrogate {
    pub fn failing(failures: usize) -> Self {
        FlakyFitSurrogate {
            failures: Mutex::new(failures),
        }
    }
}

impl SurrogateModel for FlakyFitSurrogate {
    fn fit(&mut self, _x: &ArrayView2<f64>, _y: &ArrayView1<f64>) -> anyhow::Result<()> {
        let mut failures = self.failures.lock().unwrap();
        if *failures > 0 {
            *failures = failures.saturating_sub(1);
            return Err(anyhow!("ill-conditioned covariance"));
        }
        Ok(())
    }

    fn predict(&self, x: &ArrayView2<f64>) -> anyhow::Result<(Array1<f64>, Array1<f64>)> {
        Ok((Array1::zeros(x.nrows()), Array1::ones(x.nrows())))
    }
}

/// Inverse-distance interpolation of the history: exact (zero-deviation)
/// at observed points, uncertainty growing with the distance to the
/// closest one. Cheap, dependency-free stand-in for a real regressor.
pub(crate) struct InverseDistanceSurrogate {
    x: Option<Array2<f64>>,
    y: Array1<f64>,
}

impl Default for InverseDistanceSurrogate {
    fn default() -> Self {
        InverseDistanceSurrogate {
            x: None,
            y: Array1::zeros(0),
        }
    }
}

impl SurrogateModel for InverseDistanceSurrogate {
    fn fit(&mut self, x: &ArrayView2<f64>, y: &ArrayView1<f64>) -> anyhow::Result<()> {
        self.x = Some(x.to_owned());
        self.y = y.to_owned();
        Ok(())
    }

    fn predict(&self, x: &ArrayView2<f64>) -> anyhow::Result<(Array1<f64>, Array1<f64>)> {
        let xt = self.x.as_ref().ok_or_else(|| anyhow!("not fitted"))?;
        let mut mean = Vec::with_capacity(x.nrows());
        let mut std = Vec::with_capacity(x.nrows());
        for q in x.rows() {
            let d2: Vec<f64> = xt
                .rows()
                .into_iter()
                .map(|p| {
                    p.iter()
                        .zip(q.iter())
                        .map(|(a, b)| (a - b) * (a - b))
                        .sum::<f64>()
                })
                .collect();
            let dmin = d2.iter().cloned().fold(f64::INFINITY, f64::min);
            if dmin < 1e-16 {
                let i = d2
                    .iter()
                    .position(|&d| d == dmin)
                    .expect("minimum is attained");
                mean.push(self.y[i]);
                std.push(0.);
            } else {
                let w: Vec<f64> = d2.iter().map(|&d| 1. / d).collect();
                let wsum: f64 = w.iter().sum();
                let m = w
                    .iter()
                    .zip(self.y.iter())
                    .map(|(wi, yi)| wi * yi)
                    .sum::<f64>()
                    / wsum;
                mean.push(m);
                std.push(dmin.sqrt());
            }
        }
        Ok((Array1::from_vec(mean), Array1::from_vec(std)))
    }
}
