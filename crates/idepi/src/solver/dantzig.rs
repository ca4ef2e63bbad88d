//! Dantzig selector and the solvers built around it.
//!
//! The Dantzig selector is
//!
//! ```text
//! minimize ||b||_1   subject to   ||X^T (y - X b)||_inf <= lambda
//! ```
//!
//! Writing `b = u - v` with `u, v >= 0` turns it into a linear program with
//! `2p` variables and `2p` inequality rows. That program starts infeasible
//! whenever some correlation exceeds `lambda`, so [`LinearProgram`] is run on
//! its dual instead, which is feasible at zero; the dual's row prices are the
//! optimal `(u, v)`.
//!
//! Variants in this module differ only in how they pick the columns handed to
//! the final Dantzig fit: all of them ([`Dantzig`]), a looser Dantzig fit
//! ([`DoubleDantzig`]), a LAR path ([`LarDantzig`]), a Lasso fit
//! ([`LassoDantzig`]), or all of them on a ridge-augmented design
//! ([`RidgeDantzig`]).

use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2, Axis};

use super::lar::least_angle;
use super::lasso::elastic_net;
use super::simplex::LinearProgram;
use super::{
    check_shapes, support_of, DantzigParams, DoubleDantzigParams, LarDantzigParams,
    LassoDantzigParams, RidgeDantzigParams, Solver, SolverError,
};
use crate::linalg::ridge_augment;

/// Solve the Dantzig selector for `x`, `y` and correlation bound `lambda`.
pub(crate) fn dantzig_selector(
    x: ArrayView2<'_, f64>,
    y: ArrayView1<'_, f64>,
    lambda: f64,
) -> Result<Array1<f64>, SolverError> {
    let p = x.ncols();
    let corr = x.t().dot(&y);

    // b = 0 is feasible, and the L1 norm cannot go lower.
    let max_corr = corr.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    if p == 0 || max_corr <= lambda {
        return Ok(Array1::zeros(p));
    }

    let gram = x.t().dot(&x);
    let neg_gram = gram.mapv(|v| -v);

    // Primal:  minimize 1.(u, v)  s.t.   G u - G v <= lambda + c
    //                                  -G u + G v <= lambda - c
    // Dual:    minimize (lambda + c, lambda - c).w  s.t.  |G (w1 - w2)| <= 1
    let mut a = Array2::<f64>::zeros((2 * p, 2 * p));
    a.slice_mut(s![..p, ..p]).assign(&neg_gram);
    a.slice_mut(s![..p, p..]).assign(&gram);
    a.slice_mut(s![p.., ..p]).assign(&gram);
    a.slice_mut(s![p.., p..]).assign(&neg_gram);

    let b = Array1::<f64>::ones(2 * p);

    let mut cost = Array1::<f64>::zeros(2 * p);
    cost.slice_mut(s![..p]).assign(&corr.mapv(|v| lambda + v));
    cost.slice_mut(s![p..]).assign(&corr.mapv(|v| lambda - v));

    let solution = LinearProgram {
        a: a.view(),
        b: b.view(),
        c: cost.view(),
    }
    .solve()?;
    // the dual optimum is minus the smallest feasible L1 norm
    log::trace!("dantzig selector: l1 norm {:.4e}", -cost.dot(&solution.z));
    let z = solution.prices;

    Ok(&z.slice(s![..p]) - &z.slice(s![p..]))
}

/// Dantzig fit restricted to `support`, scattered back to all `p` columns.
fn refit_on_support(
    x: ArrayView2<'_, f64>,
    y: ArrayView1<'_, f64>,
    support: &[usize],
    lambda: f64,
) -> Result<Array1<f64>, SolverError> {
    let mut beta = Array1::<f64>::zeros(x.ncols());
    if support.is_empty() {
        return Ok(beta);
    }

    let restricted = x.select(Axis(1), support);
    let fitted = dantzig_selector(restricted.view(), y, lambda)?;
    for (k, &j) in support.iter().enumerate() {
        beta[j] = fitted[k];
    }
    Ok(beta)
}

// =============================================================================
// Dantzig
// =============================================================================

/// Plain Dantzig selector over every column.
#[derive(Debug, Clone)]
pub struct Dantzig {
    params: DantzigParams,
    beta: Array1<f64>,
}

impl Dantzig {
    pub fn new(params: DantzigParams) -> Self {
        Self {
            params,
            beta: Array1::zeros(0),
        }
    }
}

impl Solver for Dantzig {
    fn name(&self) -> &'static str {
        "dantzig"
    }

    fn learn(&mut self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>) -> Result<(), SolverError> {
        check_shapes(x, y)?;
        self.beta = dantzig_selector(x, y, self.params.lambda)?;
        Ok(())
    }

    fn beta(&self) -> ArrayView1<'_, f64> {
        self.beta.view()
    }

    fn selected(&self) -> Vec<usize> {
        support_of(self.beta.view())
    }
}

// =============================================================================
// DoubleDantzig
// =============================================================================

/// Two-stage Dantzig selector.
///
/// A fit with the looser `select_lambda` chooses the columns; a fit with the
/// tighter `refit_lambda` on those columns alone gives the coefficients, which
/// removes most of the shrinkage of the first stage.
#[derive(Debug, Clone)]
pub struct DoubleDantzig {
    params: DoubleDantzigParams,
    beta: Array1<f64>,
}

impl DoubleDantzig {
    pub fn new(params: DoubleDantzigParams) -> Self {
        Self {
            params,
            beta: Array1::zeros(0),
        }
    }
}

impl Solver for DoubleDantzig {
    fn name(&self) -> &'static str {
        "double_dantzig"
    }

    fn learn(&mut self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>) -> Result<(), SolverError> {
        check_shapes(x, y)?;
        let first = dantzig_selector(x, y, self.params.select_lambda)?;
        let support = support_of(first.view());
        log::trace!("double dantzig: {} columns survive selection", support.len());
        self.beta = refit_on_support(x, y, &support, self.params.refit_lambda)?;
        Ok(())
    }

    fn beta(&self) -> ArrayView1<'_, f64> {
        self.beta.view()
    }

    fn selected(&self) -> Vec<usize> {
        support_of(self.beta.view())
    }
}

// =============================================================================
// LarDantzig
// =============================================================================

/// LAR path for column selection, Dantzig selector for the coefficients.
#[derive(Debug, Clone)]
pub struct LarDantzig {
    params: LarDantzigParams,
    beta: Array1<f64>,
}

impl LarDantzig {
    pub fn new(params: LarDantzigParams) -> Self {
        Self {
            params,
            beta: Array1::zeros(0),
        }
    }
}

impl Solver for LarDantzig {
    fn name(&self) -> &'static str {
        "lar_dantzig"
    }

    fn learn(&mut self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>) -> Result<(), SolverError> {
        check_shapes(x, y)?;
        let mut support = least_angle(x, y, self.params.max_features).active;
        support.sort_unstable();
        self.beta = refit_on_support(x, y, &support, self.params.lambda)?;
        Ok(())
    }

    fn beta(&self) -> ArrayView1<'_, f64> {
        self.beta.view()
    }

    fn selected(&self) -> Vec<usize> {
        support_of(self.beta.view())
    }
}

// =============================================================================
// LassoDantzig
// =============================================================================

/// Lasso for column selection, Dantzig selector for the coefficients.
#[derive(Debug, Clone)]
pub struct LassoDantzig {
    params: LassoDantzigParams,
    beta: Array1<f64>,
}

impl LassoDantzig {
    pub fn new(params: LassoDantzigParams) -> Self {
        Self {
            params,
            beta: Array1::zeros(0),
        }
    }
}

impl Solver for LassoDantzig {
    fn name(&self) -> &'static str {
        "lasso_dantzig"
    }

    fn learn(&mut self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>) -> Result<(), SolverError> {
        check_shapes(x, y)?;
        let lasso = elastic_net(
            x,
            y,
            self.params.alpha,
            0.0,
            self.params.max_iter,
            self.params.tol,
        );
        let support = support_of(lasso.view());
        self.beta = refit_on_support(x, y, &support, self.params.lambda)?;
        Ok(())
    }

    fn beta(&self) -> ArrayView1<'_, f64> {
        self.beta.view()
    }

    fn selected(&self) -> Vec<usize> {
        support_of(self.beta.view())
    }
}

// =============================================================================
// RidgeDantzig
// =============================================================================

/// Dantzig selector on the ridge-augmented design `[X; sqrt(ridge) I]`.
#[derive(Debug, Clone)]
pub struct RidgeDantzig {
    params: RidgeDantzigParams,
    beta: Array1<f64>,
}

impl RidgeDantzig {
    pub fn new(params: RidgeDantzigParams) -> Self {
        Self {
            params,
            beta: Array1::zeros(0),
        }
    }
}

impl Solver for RidgeDantzig {
    fn name(&self) -> &'static str {
        "ridge_dantzig"
    }

    fn learn(&mut self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>) -> Result<(), SolverError> {
        check_shapes(x, y)?;
        let (xa, ya) = ridge_augment(x, y, self.params.ridge);
        self.beta = dantzig_selector(xa.view(), ya.view(), self.params.lambda)?;
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
    use crate::regressor::Normalization;
    use crate::testing::{binary_design, linear_targets, synthetic_regression};
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use rstest::rstest;

    fn max_abs_correlation(x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>, beta: &Array1<f64>) -> f64 {
        let residual = &y - &x.dot(beta);
        x.t()
            .dot(&residual)
            .iter()
            .fold(0.0_f64, |acc, v| acc.max(v.abs()))
    }

    #[test]
    fn large_lambda_gives_zero() {
        let x = array![[1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
        let y = array![1.0, 2.0, 3.0];
        let beta = dantzig_selector(x.view(), y.view(), 100.0).unwrap();
        assert_eq!(beta, Array1::<f64>::zeros(2));
    }

    #[test]
    fn orthonormal_design_soft_thresholds() {
        // For X^T X = I the Dantzig selector equals soft-thresholding X^T y.
        let x = array![[1.0, 0.0], [0.0, 1.0]];
        let y = array![3.0, -0.5];
        let beta = dantzig_selector(x.view(), y.view(), 1.0).unwrap();
        assert_abs_diff_eq!(beta[0], 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(beta[1], 0.0, epsilon = 1e-9);
    }

    #[test]
    fn constraint_holds_on_random_design() {
        let (x, y, _) = synthetic_regression(30, 5, 7, 0.1);
        let lambda = 0.5;
        let beta = dantzig_selector(x.view(), y.view(), lambda).unwrap();
        assert!(max_abs_correlation(x.view(), y.view(), &beta) <= lambda + 1e-7);
    }

    #[test]
    fn zero_lambda_matches_least_squares() {
        let (x, y, _) = synthetic_regression(25, 3, 11, 0.05);
        let beta = dantzig_selector(x.view(), y.view(), 0.0).unwrap();
        assert!(max_abs_correlation(x.view(), y.view(), &beta) <= 1e-7);
    }

    /// Normalized 40x120 0/1 design (plus intercept) with
    /// `y = 2 x0 - x1 + 0.5 + noise`.
    fn wide_binary_problem(seed: u64) -> (Array2<f64>, Array1<f64>) {
        let x = binary_design(40, 120, seed, 0.3);
        let mut weights = Array1::<f64>::zeros(120);
        weights[0] = 2.0;
        weights[1] = -1.0;
        let y = linear_targets(x.view(), weights.view(), 0.5, seed + 100, 0.1);
        let (_, design, target) = Normalization::fit(x.view(), y.view()).unwrap();
        (design, target)
    }

    #[rstest]
    #[case(0, 1.0)]
    #[case(1, 1.0)]
    #[case(2, 1.0)]
    #[case(2, 0.0)]
    #[case(3, 0.0)]
    fn wide_binary_design_is_solved(#[case] seed: u64, #[case] lambda: f64) {
        let (x, y) = wide_binary_problem(seed);
        let beta = dantzig_selector(x.view(), y.view(), lambda).unwrap();
        assert_eq!(beta.len(), 121);
        assert!(beta.iter().all(|b| b.is_finite()));
        assert!(max_abs_correlation(x.view(), y.view(), &beta) <= lambda + 1e-6);
    }

    #[test]
    fn wide_binary_l1_shrinks_as_lambda_grows() {
        // a looser bound only enlarges the feasible set
        let (x, y) = wide_binary_problem(2);
        let bound = x
            .t()
            .dot(&y)
            .iter()
            .fold(0.0_f64, |acc, v| acc.max(v.abs()));
        let loose = dantzig_selector(x.view(), y.view(), 0.5 * bound).unwrap();
        let tight = dantzig_selector(x.view(), y.view(), 0.1 * bound).unwrap();
        let l1 = |b: &Array1<f64>| b.iter().map(|v| v.abs()).sum::<f64>();
        assert!(l1(&loose) > 0.0);
        assert!(l1(&loose) <= l1(&tight) + 1e-9);
    }

    #[test]
    fn double_dantzig_refit_is_sparse() {
        let (x, y, _) = synthetic_regression(40, 6, 3, 0.1);
        let params = DoubleDantzigParams::builder()
            .select_lambda(5.0)
            .refit_lambda(0.1)
            .build()
            .unwrap();
        let mut solver = DoubleDantzig::new(params);
        solver.learn(x.view(), y.view()).unwrap();

        let mut first = Dantzig::new(DantzigParams::builder().lambda(5.0).build().unwrap());
        first.learn(x.view(), y.view()).unwrap();

        // refit never adds columns
        for j in solver.selected() {
            assert!(first.selected().contains(&j));
        }
    }

    #[test]
    fn lar_dantzig_respects_feature_budget() {
        let (x, y, _) = synthetic_regression(40, 6, 5, 0.1);
        let params = LarDantzigParams::builder()
            .max_features(2)
            .lambda(0.01)
            .build()
            .unwrap();
        let mut solver = LarDantzig::new(params);
        solver.learn(x.view(), y.view()).unwrap();
        assert!(solver.selected().len() <= 2);
        assert_eq!(solver.beta().len(), 6);
    }

    #[test]
    fn lasso_dantzig_respects_lasso_support() {
        let (x, y, _) = synthetic_regression(40, 6, 9, 0.1);
        let params = LassoDantzigParams::builder()
            .alpha(2.0)
            .lambda(0.01)
            .build()
            .unwrap();
        let mut solver = LassoDantzig::new(params.clone());
        solver.learn(x.view(), y.view()).unwrap();

        let lasso = elastic_net(x.view(), y.view(), params.alpha, 0.0, params.max_iter, params.tol);
        let support = support_of(lasso.view());
        for j in solver.selected() {
            assert!(support.contains(&j));
        }
    }

    #[test]
    fn ridge_dantzig_shrinks_relative_to_plain() {
        let (x, y, _) = synthetic_regression(30, 4, 13, 0.1);
        let mut plain = Dantzig::new(DantzigParams::builder().lambda(0.0).build().unwrap());
        plain.learn(x.view(), y.view()).unwrap();

        let params = RidgeDantzigParams::builder()
            .ridge(50.0)
            .lambda(0.0)
            .build()
            .unwrap();
        let mut ridge = RidgeDantzig::new(params);
        ridge.learn(x.view(), y.view()).unwrap();

        let l2 = |b: ArrayView1<'_, f64>| b.dot(&b);
        assert!(l2(ridge.beta()) < l2(plain.beta()));
    }

    #[test]
    fn shape_mismatch_is_reported() {
        let x = array![[1.0], [2.0]];
        let y = array![1.0];
        let mut solver = Dantzig::new(DantzigParams::default());
        assert!(matches!(
            solver.learn(x.view(), y.view()),
            Err(SolverError::ShapeMismatch { rows: 2, len: 1 })
        ));
    }
}
