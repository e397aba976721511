use cobyla::RhoBeg;
use ndarray::{arr1, Array1, Array2, ArrayView1};

use crate::types::{LocalSolver, ObjFn};

pub(crate) const ACQ_MAX_EVAL_DEFAULT: usize = 2000;

/// Facade for the box-constrained local solvers.
///
/// Both backends minimize, so callers maximizing a score hand in its
/// negation. SLSQP consumes the gradient slot of [`ObjFn`]; the function is
/// expected to fill it when asked.
pub(crate) struct LocalOptimizer<'a> {
    solver: LocalSolver,
    fun: &'a (dyn ObjFn<()> + Sync),
    bounds: &'a Array2<f64>,
    xinit: Array1<f64>,
    max_eval: usize,
}

impl<'a> LocalOptimizer<'a> {
    pub fn new(
        solver: LocalSolver,
        fun: &'a (dyn ObjFn<()> + Sync),
        bounds: &'a Array2<f64>,
        xinit: &ArrayView1<f64>,
    ) -> Self {
        LocalOptimizer {
            solver,
            fun,
            bounds,
            xinit: xinit.to_owned(),
            max_eval: ACQ_MAX_EVAL_DEFAULT,
        }
    }

    pub fn max_eval(mut self, max_eval: usize) -> Self {
        self.max_eval = max_eval;
        self
    }

    /// Runs the solver from `xinit`; a failed run reports `f64::INFINITY`
    /// so the caller's best-of selection discards it.
    pub fn minimize(&self) -> (f64, Array1<f64>) {
        let xinit = self.xinit.to_vec();
        let bounds: Vec<_> = self
            .bounds
            .outer_iter()
            .map(|row| (row[0], row[1]))
            .collect();
        match self.solver {
            LocalSolver::Cobyla => {
                let cons: Vec<fn(&[f64], &mut ()) -> f64> = vec![];
                let res = cobyla::minimize(
                    |x: &[f64], u: &mut ()| (self.fun)(x, None, u),
                    &xinit,
                    &bounds,
                    &cons,
                    (),
                    self.max_eval,
                    RhoBeg::All(0.5),
                    None,
                );
                match res {
                    Ok((_, x_opt, y_opt)) => (y_opt, arr1(&x_opt)),
                    Err((_, x_opt, _)) => (f64::INFINITY, arr1(&x_opt)),
                }
            }
            LocalSolver::Slsqp => {
                let cons: Vec<fn(&[f64], Option<&mut [f64]>, &mut ()) -> f64> = vec![];
                let res = slsqp::minimize(
                    self.fun,
                    &xinit,
                    &bounds,
                    &cons,
                    (),
                    self.max_eval,
                    None,
                );
                match res {
                    Ok((_, x_opt, y_opt)) => (y_opt, arr1(&x_opt)),
                    Err((_, x_opt, _)) => (f64::INFINITY, arr1(&x_opt)),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_cobyla_min_quadratic() {
        let obj = |x: &[f64], _g: Option<&mut [f64]>, _u: &mut ()| -> f64 { x[0] * x[0] };
        let bounds = array![[-1., 1.]];
        let (y_opt, x_opt) =
            LocalOptimizer::new(LocalSolver::Cobyla, &obj, &bounds, &array![0.7].view())
                .minimize();
        assert_abs_diff_eq!(x_opt[0], 0., epsilon = 1e-2);
        assert_abs_diff_eq!(y_opt, 0., epsilon = 1e-3);
    }

    #[test]
    fn test_slsqp_min_quadratic_with_gradient() {
        let obj = |x: &[f64], g: Option<&mut [f64]>, _u: &mut ()| -> f64 {
            if let Some(g) = g {
                g[0] = 2. * (x[0] - 0.5);
            }
            (x[0] - 0.5) * (x[0] - 0.5)
        };
        let bounds = array![[-1., 1.]];
        let (y_opt, x_opt) =
            LocalOptimizer::new(LocalSolver::Slsqp, &obj, &bounds, &array![-0.9].view())
                .minimize();
        assert_abs_diff_eq!(x_opt[0], 0.5, epsilon = 1e-3);
        assert_abs_diff_eq!(y_opt, 0., epsilon = 1e-4);
    }

    #[test]
    fn test_solution_respects_bounds() {
        // unconstrained minimum at 2, outside the box
        let obj = |x: &[f64], _g: Option<&mut [f64]>, _u: &mut ()| -> f64 {
            (x[0] - 2.) * (x[0] - 2.)
        };
        let bounds = array![[-1., 1.]];
        let (_, x_opt) =
            LocalOptimizer::new(LocalSolver::Cobyla, &obj, &bounds, &array![0.].view())
                .minimize();
        assert!(x_opt[0] <= 1. + 1e-8);
    }
}
