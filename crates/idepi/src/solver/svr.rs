//! Linear support vector regression.
//!
//! Dual coordinate descent for the L1-loss (epsilon-insensitive) SVR:
//!
//! ```text
//! primal:  0.5 * ||w||^2 + C * sum_i max(0, |y_i - w . x_i| - epsilon)
//! dual:    0.5 * a^T Q a - y^T a + epsilon * ||a||_1,   -C <= a_i <= C
//! ```
//!
//! with `Q = X X^T` and `w = sum_i a_i x_i` maintained incrementally.

use ndarray::{Array1, ArrayView1, ArrayView2, Axis};

use super::{check_shapes, support_of, LinearSvrParams, Solver, SolverError};

/// Epsilon-insensitive linear SVR.
#[derive(Debug, Clone)]
pub struct LinearSvr {
    params: LinearSvrParams,
    beta: Array1<f64>,
}

impl LinearSvr {
    pub fn new(params: LinearSvrParams) -> Self {
        Self {
            params,
            beta: Array1::zeros(0),
        }
    }
}

impl Solver for LinearSvr {
    fn name(&self) -> &'static str {
        "linear_svr"
    }

    fn learn(&mut self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>) -> Result<(), SolverError> {
        check_shapes(x, y)?;
        let (n, p) = x.dim();
        let cost = self.params.c;
        let epsilon = self.params.epsilon;

        let q_diag = x.map_axis(Axis(1), |row| row.dot(&row));
        let mut dual = Array1::<f64>::zeros(n);
        let mut w = Array1::<f64>::zeros(p);

        let mut converged = false;
        for sweep in 0..self.params.max_iter {
            let mut max_change = 0.0_f64;

            for i in 0..n {
                let h = q_diag[i];
                if h <= 0.0 {
                    continue;
                }

                let row = x.row(i);
                let old = dual[i];
                let g = row.dot(&w) - y[i];
                let gp = g + epsilon;
                let gn = g - epsilon;

                // Minimizer of the one-dimensional piecewise quadratic.
                let step = if gp < h * old {
                    -gp / h
                } else if gn > h * old {
                    -gn / h
                } else {
                    -old
                };

                let new = (old + step).clamp(-cost, cost);
                let delta = new - old;
                if delta != 0.0 {
                    w.scaled_add(delta, &row);
                    dual[i] = new;
                    max_change = max_change.max(delta.abs());
                }
            }

            if max_change < self.params.tol {
                log::trace!("linear svr converged after {} sweeps", sweep + 1);
                converged = true;
                break;
            }
        }

        if !converged {
            log::debug!(
                "linear svr hit max_iter={} before converging",
                self.params.max_iter
            );
        }

        self.beta = w;
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
    use ndarray::{array, Array2};

    fn line_data() -> (Array2<f64>, Array1<f64>) {
        // y = 2 * x, centered
        let xs = [-2.0, -1.5, -1.0, -0.5, 0.0, 0.5, 1.0, 1.5, 2.0];
        let x = Array2::from_shape_fn((xs.len(), 1), |(i, _)| xs[i]);
        let y = x.column(0).mapv(|v| 2.0 * v);
        (x, y)
    }

    #[test]
    fn fits_inside_the_tube() {
        let (x, y) = line_data();
        let params = LinearSvrParams::builder()
            .c(100.0)
            .epsilon(0.1)
            .max_iter(10_000)
            .tol(1e-10)
            .build()
            .unwrap();
        let mut solver = LinearSvr::new(params);
        solver.learn(x.view(), y.view()).unwrap();

        let residual = &y - &solver.pred(x.view());
        for r in residual.iter() {
            assert!(r.abs() < 0.2, "residual {r} outside tube");
        }
        assert_eq!(solver.selected(), vec![0]);
    }

    #[test]
    fn wide_tube_gives_zero_model() {
        let x = array![[1.0], [2.0]];
        let y = array![0.5, -0.5];
        let params = LinearSvrParams::builder().epsilon(10.0).build().unwrap();
        let mut solver = LinearSvr::new(params);
        solver.learn(x.view(), y.view()).unwrap();
        assert_eq!(solver.beta().to_vec(), vec![0.0]);
        assert!(solver.selected().is_empty());
    }

    #[test]
    fn zero_rows_are_skipped() {
        let x = array![[0.0, 0.0], [1.0, 0.0]];
        let y = array![5.0, 1.0];
        let mut solver = LinearSvr::new(LinearSvrParams::default());
        solver.learn(x.view(), y.view()).unwrap();
        assert_eq!(solver.beta()[1], 0.0);
    }
}
