//! Elastic-net coordinate descent.
//!
//! Minimizes
//!
//! ```text
//! 0.5 * ||y - X b||^2 + alpha * ||b||_1 + 0.5 * ridge * ||b||^2
//! ```
//!
//! one coordinate at a time. Each update is a soft-threshold of the partial
//! residual correlation, so coefficients land exactly on zero.

use ndarray::{Array1, ArrayView1, ArrayView2, Axis};

use super::{check_shapes, support_of, RidgeLassoParams, Solver, SolverError};

/// Soft-thresholding operator for L1 regularization.
#[inline]
pub(crate) fn soft_threshold(x: f64, threshold: f64) -> f64 {
    if x > threshold {
        x - threshold
    } else if x < -threshold {
        x + threshold
    } else {
        0.0
    }
}

/// Cyclic coordinate descent from `b = 0`.
///
/// Stops after a sweep whose largest coefficient change is below `tol`, or
/// after `max_iter` sweeps.
pub(crate) fn elastic_net(
    x: ArrayView2<'_, f64>,
    y: ArrayView1<'_, f64>,
    alpha: f64,
    ridge: f64,
    max_iter: usize,
    tol: f64,
) -> Array1<f64> {
    let p = x.ncols();
    let sq_norms = x.map_axis(Axis(0), |col| col.dot(&col));
    let mut beta = Array1::<f64>::zeros(p);
    let mut residual = y.to_owned();

    for sweep in 0..max_iter {
        let mut max_delta = 0.0_f64;

        for j in 0..p {
            let denom = sq_norms[j] + ridge;
            if denom <= 0.0 {
                continue;
            }

            let col = x.column(j);
            let old = beta[j];
            let rho = col.dot(&residual) + sq_norms[j] * old;
            let new = soft_threshold(rho, alpha) / denom;

            let delta = new - old;
            if delta != 0.0 {
                residual.scaled_add(-delta, &col);
                beta[j] = new;
                max_delta = max_delta.max(delta.abs());
            }
        }

        if max_delta < tol {
            log::trace!("coordinate descent converged after {} sweeps", sweep + 1);
            return beta;
        }
    }

    log::debug!("coordinate descent hit max_iter={max_iter} before converging");
    beta
}

// =============================================================================
// RidgeLasso
// =============================================================================

/// Lasso with an additional ridge penalty (elastic net).
#[derive(Debug, Clone)]
pub struct RidgeLasso {
    params: RidgeLassoParams,
    beta: Array1<f64>,
}

impl RidgeLasso {
    pub fn new(params: RidgeLassoParams) -> Self {
        Self {
            params,
            beta: Array1::zeros(0),
        }
    }
}

impl Solver for RidgeLasso {
    fn name(&self) -> &'static str {
        "ridge_lasso"
    }

    fn learn(&mut self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>) -> Result<(), SolverError> {
        check_shapes(x, y)?;
        self.beta = elastic_net(
            x,
            y,
            self.params.alpha,
            self.params.ridge,
            self.params.max_iter,
            self.params.tol,
        );
        Ok(())
    }

    fn beta(&self) -> ArrayView1<'_, f64> {
        self.beta.view()
    }

    fn selected(&self) -> Vec<usize> {
        support_of(self.beta.view())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::synthetic_regression;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn soft_threshold_cases() {
        assert_eq!(soft_threshold(3.0, 1.0), 2.0);
        assert_eq!(soft_threshold(-3.0, 1.0), -2.0);
        assert_eq!(soft_threshold(0.5, 1.0), 0.0);
        assert_eq!(soft_threshold(-0.5, 1.0), 0.0);
    }

    #[test]
    fn orthonormal_design_closed_form() {
        // X^T X = I: b_j = S(x_j . y, alpha) / (1 + ridge)
        let x = array![[1.0, 0.0], [0.0, 1.0]];
        let y = array![3.0, 0.5];
        let beta = elastic_net(x.view(), y.view(), 1.0, 1.0, 100, 1e-12);
        assert_abs_diff_eq!(beta[0], 1.0, epsilon = 1e-12);
        assert_eq!(beta[1], 0.0);
    }

    #[test]
    fn no_penalty_reaches_least_squares() {
        let (x, y, _) = synthetic_regression(40, 3, 17, 0.05);
        let beta = elastic_net(x.view(), y.view(), 0.0, 0.0, 10_000, 1e-12);
        let residual = &y - &x.dot(&beta);
        let grad = x.t().dot(&residual);
        for g in grad.iter() {
            assert!(g.abs() < 1e-6);
        }
    }

    #[test]
    fn large_alpha_zeroes_everything() {
        let (x, y, _) = synthetic_regression(20, 4, 2, 0.1);
        let params = RidgeLassoParams::builder().alpha(1e6).build().unwrap();
        let mut solver = RidgeLasso::new(params);
        solver.learn(x.view(), y.view()).unwrap();
        assert!(solver.selected().is_empty());
        assert_eq!(solver.beta().len(), 4);
    }

    #[test]
    fn zero_column_stays_zero() {
        let x = array![[0.0, 1.0], [0.0, 2.0], [0.0, 3.0]];
        let y = array![1.0, 2.0, 3.0];
        let beta = elastic_net(x.view(), y.view(), 0.0, 0.0, 100, 1e-12);
        assert_eq!(beta[0], 0.0);
        assert_abs_diff_eq!(beta[1], 1.0, epsilon = 1e-12);
    }
}
