//! Dense two-phase simplex for small linear programs.
//!
//! Solves
//!
//! ```text
//! minimize    c . z
//! subject to  A z <= b,   z >= 0
//! ```
//!
//! where `b` may have negative entries. Rows with `b_i < 0` are negated into
//! `>=` rows and receive an artificial variable; phase one drives the
//! artificials to zero, phase two optimizes `c`. Programs with `b >= 0` start
//! from the slack basis and skip phase one entirely.
//!
//! The entering column is the one with the most negative reduced cost. After
//! a run of degenerate pivots the method falls back to Bland's rule until the
//! objective moves again, so it cannot cycle.
//!
//! Besides the optimal point, [`Solution::prices`] holds the shadow price of
//! every row, which is an optimal solution of the dual program.

use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2, Axis};

use super::SolverError;

/// Reduced costs above `-EPS` count as non-negative.
const EPS: f64 = 1e-10;

/// Smallest tableau entry accepted as a pivot.
const PIVOT_TOL: f64 = 1e-9;

/// Right-hand sides in `(-FEASIBILITY_TOL, 0)` are rounding noise.
const FEASIBILITY_TOL: f64 = 1e-9;

/// Degenerate pivots in a row before switching to Bland's rule.
const STALL_LIMIT: usize = 50;

/// A linear program in inequality form.
#[derive(Debug, Clone)]
pub(crate) struct LinearProgram<'a> {
    pub a: ArrayView2<'a, f64>,
    pub b: ArrayView1<'a, f64>,
    pub c: ArrayView1<'a, f64>,
}

/// Optimal point and row prices of a [`LinearProgram`].
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Solution {
    pub z: Array1<f64>,
    /// Decrease of the optimum per unit increase of each `b_i`; non-negative.
    pub prices: Array1<f64>,
}

/// Tableau state shared by both phases.
struct Tableau {
    /// `[m, n_cols + 1]`, last column is the right-hand side.
    rows: Array2<f64>,
    /// Reduced costs, last entry is minus the objective value.
    objective: Array1<f64>,
    /// Basic variable of every row.
    basis: Vec<usize>,
    /// Columns that may never enter the basis.
    blocked: Vec<bool>,
    pivots: usize,
    max_pivots: usize,
}

impl Tableau {
    fn n_cols(&self) -> usize {
        self.rows.ncols() - 1
    }

    fn rhs(&self, row: usize) -> f64 {
        self.rows[[row, self.n_cols()]]
    }

    /// Recompute reduced costs for `cost` against the current basis.
    fn price(&mut self, cost: &Array1<f64>) {
        let width = self.rows.ncols();
        let mut objective = Array1::<f64>::zeros(width);
        objective.slice_mut(s![..cost.len()]).assign(cost);
        for (row, &var) in self.basis.iter().enumerate() {
            let weight = cost[var];
            if weight != 0.0 {
                objective.scaled_add(-weight, &self.rows.row(row));
            }
        }
        self.objective = objective;
    }

    fn pivot(&mut self, row: usize, col: usize) {
        let pivot = self.rows[[row, col]];
        self.rows.row_mut(row).mapv_inplace(|v| v / pivot);
        let pivot_row = self.rows.row(row).to_owned();

        for (i, mut other) in self.rows.axis_iter_mut(Axis(0)).enumerate() {
            if i == row {
                continue;
            }
            let factor = other[col];
            if factor != 0.0 {
                other.scaled_add(-factor, &pivot_row);
            }
        }

        let factor = self.objective[col];
        if factor != 0.0 {
            self.objective.scaled_add(-factor, &pivot_row);
        }

        let last = self.n_cols();
        self.rows.column_mut(last).mapv_inplace(|v| {
            if v < 0.0 && v > -FEASIBILITY_TOL {
                0.0
            } else {
                v
            }
        });

        self.basis[row] = col;
        self.pivots += 1;
    }

    /// Column to bring into the basis, if any reduced cost is negative.
    fn entering(&self, bland: bool) -> Option<usize> {
        let mut candidates =
            (0..self.n_cols()).filter(|&j| !self.blocked[j] && self.objective[j] < -EPS);
        if bland {
            candidates.next()
        } else {
            candidates.min_by(|&a, &b| self.objective[a].total_cmp(&self.objective[b]))
        }
    }

    /// Ratio test for `col`, returning the leaving row and its step length.
    ///
    /// Near-ties go to the largest pivot entry, or under Bland's rule to the
    /// lowest basic variable index.
    fn leaving(&self, col: usize, bland: bool) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for row in 0..self.rows.nrows() {
            let coef = self.rows[[row, col]];
            if coef <= PIVOT_TOL {
                continue;
            }
            let ratio = self.rhs(row).max(0.0) / coef;
            let better = match best {
                None => true,
                Some((current, current_ratio)) => {
                    if ratio < current_ratio - EPS {
                        true
                    } else if ratio <= current_ratio + EPS {
                        if bland {
                            self.basis[row] < self.basis[current]
                        } else {
                            coef > self.rows[[current, col]]
                        }
                    } else {
                        false
                    }
                }
            };
            if better {
                best = Some((row, ratio));
            }
        }
        best
    }

    /// Pivot until no reduced cost is negative.
    fn optimize(&mut self) -> Result<(), SolverError> {
        let mut stalled = 0;
        loop {
            if self.pivots >= self.max_pivots {
                return Err(SolverError::PivotLimit {
                    pivots: self.pivots,
                });
            }

            let bland = stalled >= STALL_LIMIT;
            let Some(col) = self.entering(bland) else {
                return Ok(());
            };
            let Some((row, step)) = self.leaving(col, bland) else {
                return Err(SolverError::Unbounded);
            };

            if step <= EPS {
                stalled += 1;
            } else {
                stalled = 0;
            }
            self.pivot(row, col);
        }
    }
}

impl LinearProgram<'_> {
    /// Solve the program.
    pub fn solve(&self) -> Result<Solution, SolverError> {
        let (m, n) = self.a.dim();
        debug_assert_eq!(self.b.len(), m);
        debug_assert_eq!(self.c.len(), n);

        // Columns: structural [0, n), slack [n, n + m), artificial after.
        let n_artificial = self.b.iter().filter(|&&v| v < 0.0).count();
        let n_cols = n + m + n_artificial;

        let mut rows = Array2::<f64>::zeros((m, n_cols + 1));
        let mut basis = vec![0; m];
        let mut artificial = n + m;
        for i in 0..m {
            let sign = if self.b[i] < 0.0 { -1.0 } else { 1.0 };
            for j in 0..n {
                rows[[i, j]] = sign * self.a[[i, j]];
            }
            rows[[i, n + i]] = sign;
            rows[[i, n_cols]] = sign * self.b[i];
            if sign < 0.0 {
                rows[[i, artificial]] = 1.0;
                basis[i] = artificial;
                artificial += 1;
            } else {
                basis[i] = n + i;
            }
        }

        let mut tableau = Tableau {
            rows,
            objective: Array1::zeros(n_cols + 1),
            basis,
            blocked: vec![false; n_cols],
            pivots: 0,
            max_pivots: 50 * (m + n_cols).max(1),
        };

        if n_artificial > 0 {
            let mut phase_one = Array1::<f64>::zeros(n_cols);
            phase_one.slice_mut(s![n + m..]).fill(1.0);
            tableau.price(&phase_one);
            tableau.optimize()?;

            let residual = -tableau.objective[n_cols];
            let scale = self.b.iter().fold(1.0_f64, |acc, v| acc.max(v.abs()));
            if residual > 1e-8 * scale {
                return Err(SolverError::Infeasible { residual });
            }

            // Every artificial left in the basis is at most `residual`; zero
            // it so that pivoting it out cannot move any other row.
            for row in 0..m {
                if tableau.basis[row] < n + m {
                    continue;
                }
                tableau.rows[[row, n_cols]] = 0.0;
                let col = (0..n + m)
                    .filter(|&j| tableau.rows[[row, j]].abs() > PIVOT_TOL)
                    .max_by(|&a, &b| {
                        tableau.rows[[row, a]]
                            .abs()
                            .total_cmp(&tableau.rows[[row, b]].abs())
                    });
                // no candidate: the row is redundant and its artificial stays
                // basic at zero
                if let Some(col) = col {
                    tableau.pivot(row, col);
                }
            }
            for blocked in tableau.blocked.iter_mut().skip(n + m) {
                *blocked = true;
            }

            let worst = (0..m).map(|row| tableau.rhs(row)).fold(0.0_f64, f64::min);
            if worst < 0.0 {
                return Err(SolverError::Infeasible { residual: -worst });
            }
        }

        let mut phase_two = Array1::<f64>::zeros(n_cols);
        phase_two.slice_mut(s![..n]).assign(&self.c);
        tableau.price(&phase_two);
        tableau.optimize()?;
        // reduced costs drift under incremental updates; refresh and polish
        tableau.price(&phase_two);
        tableau.optimize()?;

        let mut z = Array1::<f64>::zeros(n);
        for (row, &var) in tableau.basis.iter().enumerate() {
            if var < n {
                z[var] = tableau.rhs(row).max(0.0);
            }
        }
        let prices = tableau.objective.slice(s![n..n + m]).mapv(|v| v.max(0.0));

        log::trace!("simplex: {m}x{n} program solved in {} pivots", tableau.pivots);
        Ok(Solution { z, prices })
    }
}
