//! Least angle regression.
//!
//! [`least_angle`] walks the LAR path of Efron et al.: at every step the
//! fitted vector moves along the equiangular direction of the active columns
//! until an inactive column becomes as correlated with the residual as the
//! active ones. Run to the end with every usable column active, the path
//! reaches the least-squares fit.

use ndarray::{Array1, ArrayView1, ArrayView2, Axis};

use super::{check_shapes, RidgeLarParams, Solver, SolverError};
use crate::linalg::{cholesky_solve, column_norms, ridge_augment};

const EPS: f64 = 1e-12;

/// End point of a LAR path.
#[derive(Debug, Clone)]
pub(crate) struct LarPath {
    pub beta: Array1<f64>,
    /// Active columns in the order they entered.
    pub active: Vec<usize>,
}

/// Index of the largest `|values[j]|` among `candidates`, first one on ties.
fn argmax_abs(values: ArrayView1<'_, f64>, candidates: impl Iterator<Item = usize>) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for j in candidates {
        let v = values[j].abs();
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((j, v)),
        }
    }
    best.map(|(j, _)| j)
}

/// Run LAR on `x`, `y` with at most `max_features` active columns.
///
/// Zero-norm columns never enter. With `max_features = None` the path runs
/// until every usable column is active (or `n` columns are, whichever comes
/// first).
pub(crate) fn least_angle(
    x: ArrayView2<'_, f64>,
    y: ArrayView1<'_, f64>,
    max_features: Option<usize>,
) -> LarPath {
    let (n, p) = x.dim();
    let norms = column_norms(x);
    let usable: Vec<bool> = norms.iter().map(|&v| v > EPS).collect();
    let n_usable = usable.iter().filter(|&&u| u).count();
    let limit = max_features.unwrap_or(n_usable).min(n_usable).min(n);

    let mut beta = Array1::<f64>::zeros(p);
    let mut fitted = Array1::<f64>::zeros(n);
    let mut active: Vec<usize> = Vec::with_capacity(limit);
    let mut in_active = vec![false; p];

    if limit == 0 {
        return LarPath { beta, active };
    }

    let corr = x.t().dot(&y);
    match argmax_abs(corr.view(), (0..p).filter(|&j| usable[j])) {
        Some(j) if corr[j].abs() > EPS => {
            active.push(j);
            in_active[j] = true;
        }
        _ => return LarPath { beta, active },
    }

    loop {
        let residual = &y - &fitted;
        let corr = x.t().dot(&residual);
        let max_corr = active
            .iter()
            .fold(0.0_f64, |acc, &j| acc.max(corr[j].abs()));
        if max_corr <= EPS {
            break;
        }

        let signs = Array1::from_iter(active.iter().map(|&j| corr[j].signum()));
        let xa = x.select(Axis(1), &active);
        let gram = xa.t().dot(&xa);
        let Some(ginv_signs) = cholesky_solve(gram.view(), signs.view()) else {
            log::debug!("lar: active gram singular at {} columns, stopping", active.len());
            break;
        };
        let norm = signs.dot(&ginv_signs);
        if norm <= 0.0 || !norm.is_finite() {
            break;
        }

        let equiangular = norm.sqrt().recip();
        let w = ginv_signs * equiangular;
        let direction = xa.dot(&w);
        let inner = x.t().dot(&direction);

        // Full least-squares step unless an inactive column catches up first.
        let mut gamma = max_corr / equiangular;
        let mut next = None;
        for j in 0..p {
            if in_active[j] || !usable[j] {
                continue;
            }
            for step in [
                (max_corr - corr[j]) / (equiangular - inner[j]),
                (max_corr + corr[j]) / (equiangular + inner[j]),
            ] {
                if step.is_finite() && step > EPS && step < gamma {
                    gamma = step;
                    next = Some(j);
                }
            }
        }

        fitted.scaled_add(gamma, &direction);
        for (k, &j) in active.iter().enumerate() {
            beta[j] += gamma * w[k];
        }
        log::trace!("lar: step {} gamma={gamma:.3e}", active.len());

        match next {
            Some(j) if active.len() < limit => {
                active.push(j);
                in_active[j] = true;
            }
            _ => break,
        }
    }

    LarPath { beta, active }
}

// =============================================================================
// RidgeLar
// =============================================================================

/// LAR on the ridge-augmented design `[X; sqrt(ridge) I]`.
///
/// `selected()` reports the active set in the order the columns entered the
/// path, so the first entries are the strongest predictors.
#[derive(Debug, Clone)]
pub struct RidgeLar {
    params: RidgeLarParams,
    beta: Array1<f64>,
    active: Vec<usize>,
}

impl RidgeLar {
    pub fn new(params: RidgeLarParams) -> Self {
        Self {
            params,
            beta: Array1::zeros(0),
            active: Vec::new(),
        }
    }
}

impl Default for RidgeLar {
    fn default() -> Self {
        Self::new(RidgeLarParams::default())
    }
}

impl Solver for RidgeLar {
    fn name(&self) -> &'static str {
        "ridge_lar"
    }

    fn learn(&mut self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>) -> Result<(), SolverError> {
        check_shapes(x, y)?;
        let path = if self.params.ridge > 0.0 {
            let (xa, ya) = ridge_augment(x, y, self.params.ridge);
            least_angle(xa.view(), ya.view(), self.params.max_features)
        } else {
            least_angle(x, y, self.params.max_features)
        };
        self.beta = path.beta;
        self.active = path.active;
        Ok(())
    }

    fn beta(&self) -> ArrayView1<'_, f64> {
        self.beta.view()
    }

    fn selected(&self) -> Vec<usize> {
        self.active.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::synthetic_regression;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn full_path_reaches_least_squares() {
        let (x, y, _) = synthetic_regression(30, 4, 21, 0.1);
        let path = least_angle(x.view(), y.view(), None);
        assert_eq!(path.active.len(), 4);

        let gram = x.t().dot(&x);
        let rhs = x.t().dot(&y);
        let ols = cholesky_solve(gram.view(), rhs.view()).unwrap();
        for j in 0..4 {
            assert_abs_diff_eq!(path.beta[j], ols[j], epsilon = 1e-8);
        }
    }

    #[test]
    fn first_entry_is_most_correlated() {
        let x = array![[1.0, 0.0], [0.0, 1.0], [0.0, 0.0]];
        let y = array![0.5, 2.0, 0.0];
        let path = least_angle(x.view(), y.view(), Some(1));
        assert_eq!(path.active, vec![1]);
        // stops where column 0 ties: |2 - g| = 0.5
        assert_abs_diff_eq!(path.beta[1], 1.5, epsilon = 1e-12);
        assert_eq!(path.beta[0], 0.0);
    }

    #[test]
    fn zero_columns_never_enter() {
        let x = array![[0.0, 1.0], [0.0, 2.0], [0.0, 3.0]];
        let y = array![1.0, 2.0, 3.0];
        let path = least_angle(x.view(), y.view(), None);
        assert_eq!(path.active, vec![1]);
        assert_abs_diff_eq!(path.beta[1], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn zero_target_selects_nothing() {
        let x = array![[1.0, 2.0], [3.0, 4.0]];
        let y = array![0.0, 0.0];
        let path = least_angle(x.view(), y.view(), None);
        assert!(path.active.is_empty());
        assert_eq!(path.beta, Array1::<f64>::zeros(2));
    }

    #[test]
    fn ridge_lar_respects_max_features() {
        let (x, y, _) = synthetic_regression(40, 8, 4, 0.1);
        let params = RidgeLarParams::builder()
            .ridge(0.5)
            .max_features(3)
            .build()
            .unwrap();
        let mut solver = RidgeLar::new(params);
        solver.learn(x.view(), y.view()).unwrap();

        let selected = solver.selected();
        assert_eq!(selected.len(), 3);
        for j in 0..8 {
            if !selected.contains(&j) {
                assert_eq!(solver.beta()[j], 0.0);
            }
        }
    }

    #[test]
    fn ridge_shrinks_coefficients() {
        let (x, y, _) = synthetic_regression(30, 3, 8, 0.1);
        let fit = |ridge: f64| {
            let params = RidgeLarParams::builder().ridge(ridge).build().unwrap();
            let mut solver = RidgeLar::new(params);
            solver.learn(x.view(), y.view()).unwrap();
            solver.beta().dot(&solver.beta())
        };
        assert!(fit(100.0) < fit(0.0));
    }
}
