//! Normalizing front end for the linear solvers.
//!
//! [`Regressor`] owns one [`Solver`] and handles everything that is identical
//! across solvers: the intercept column, centering and scaling on `learn`,
//! replaying the stored constants on `predict`, and translating coefficient
//! indices back to the caller's columns.
//!
//! # Example
//!
//! ```
//! use idepi::{Regressor, solver::{RidgeLar, RidgeLarParams}};
//! use ndarray::array;
//!
//! let x = array![[1.0, 0.0], [2.0, 1.0], [3.0, 0.0], [4.0, 1.0]];
//! let y = array![2.0, 5.0, 6.0, 9.0];
//!
//! let params = RidgeLarParams::builder().ridge(0.0).build().unwrap();
//! let mut reg = Regressor::new(RidgeLar::new(params));
//! reg.learn(x.view(), y.view()).unwrap();
//!
//! assert_eq!(reg.weights().unwrap().len(), 2);
//! let pred = reg.predict(x.view()).unwrap();
//! assert!((pred[0] - 2.0).abs() < 1e-8);
//! ```

mod normalize;

use ndarray::{s, Array1, ArrayView1, ArrayView2};

use crate::error::{Error, Result};
use crate::metrics::FitSummary;
use crate::solver::{RidgeLar, Solver, SolverConfig};
use crate::utils::Parallelism;

pub use normalize::{Normalization, NORMALIZATION_TOLERANCE};

/// Intercept and weights on the caller's (unnormalized) scale.
#[derive(Debug, Clone, PartialEq)]
pub struct Coefficients {
    pub intercept: f64,
    pub weights: Array1<f64>,
}

/// A solver together with the normalization it was trained under.
#[derive(Debug)]
pub struct Regressor {
    solver: Box<dyn Solver>,
    normalization: Option<Normalization>,
}

impl Default for Regressor {
    fn default() -> Self {
        Self::new(RidgeLar::default())
    }
}

impl Regressor {
    /// Wrap an unfitted solver.
    pub fn new(solver: impl Solver + 'static) -> Self {
        Self::from_boxed(Box::new(solver))
    }

    pub fn from_boxed(solver: Box<dyn Solver>) -> Self {
        Self {
            solver,
            normalization: None,
        }
    }

    /// Validate `config` and wrap the solver it describes.
    pub fn from_config(config: &SolverConfig) -> Result<Self> {
        Ok(Self::from_boxed(config.build()?))
    }

    pub fn solver(&self) -> &dyn Solver {
        self.solver.as_ref()
    }

    pub fn is_fitted(&self) -> bool {
        self.normalization.is_some()
    }

    /// Constants recorded by the last successful `learn`.
    pub fn normalization(&self) -> Result<&Normalization> {
        self.normalization.as_ref().ok_or(Error::NotFitted)
    }

    /// Normalize `x` and `y` and fit the solver.
    ///
    /// `x` is `[n_samples, n_features]` without an intercept column. On error
    /// the regressor is left unfitted.
    pub fn learn(&mut self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>) -> Result<()> {
        self.normalization = None;

        let (normalization, design, target) = Normalization::fit(x, y)?;
        self.solver.learn(design.view(), target.view())?;

        let n_coef = self.solver.beta().len();
        if n_coef != design.ncols() {
            return Err(Error::ShapeMismatch {
                expected: format!("{} coefficients", design.ncols()),
                actual: format!("{n_coef}"),
            });
        }

        log::debug!(
            "{}: fitted {}x{} design, {} columns selected",
            self.solver.name(),
            x.nrows(),
            x.ncols(),
            self.solver.selected().len()
        );
        self.normalization = Some(normalization);
        Ok(())
    }

    /// Predict responses for new rows, on the scale of the training `y`.
    pub fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
        let normalization = self.normalization()?;
        let design = normalization.apply(x)?;
        Ok(self.solver.pred(design.view()) + normalization.ybar)
    }

    /// Coefficient of the intercept column, in normalized units.
    pub fn intercept(&self) -> Result<f64> {
        self.normalization()?;
        Ok(self.solver.beta()[0])
    }

    /// Coefficients of the caller's columns, in normalized units.
    pub fn weights(&self) -> Result<ArrayView1<'_, f64>> {
        self.normalization()?;
        Ok(self.solver.beta().slice_move(s![1..]))
    }

    /// Selected caller columns, in the order the solver reports them.
    pub fn selected(&self) -> Result<Vec<usize>> {
        self.normalization()?;
        Ok(self
            .solver
            .selected()
            .into_iter()
            .filter_map(|j| j.checked_sub(1))
            .collect())
    }

    /// Intercept and weights mapped back to the unnormalized columns, so that
    /// `intercept + x . weights` reproduces `predict`.
    pub fn coefficients(&self) -> Result<Coefficients> {
        let normalization = self.normalization()?;
        let beta = self.solver.beta();

        let weights = Array1::from_iter(
            beta.slice(s![1..])
                .iter()
                .zip(normalization.xvar.iter())
                .map(|(&w, &scale)| if scale != 0.0 { w / scale } else { w }),
        );
        let intercept = normalization.ybar + beta[0] - normalization.xbar.dot(&weights);

        Ok(Coefficients { intercept, weights })
    }

    /// Goodness of fit of `predict(x)` against `y`.
    pub fn score(&self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>) -> Result<FitSummary> {
        let pred = self.predict(x)?;
        FitSummary::compute(y, pred.view(), self.selected()?.len())
    }
}

/// Fit one regressor per configuration on the same data.
///
/// Results come back in the order of `configs`; a failing configuration does
/// not affect the others.
pub fn fit_all(
    configs: &[SolverConfig],
    x: ArrayView2<'_, f64>,
    y: ArrayView1<'_, f64>,
    parallelism: Parallelism,
) -> Vec<Result<Regressor>> {
    parallelism.maybe_par_map(configs, |config| -> Result<Regressor> {
        let mut regressor = Regressor::from_config(config)?;
        regressor.learn(x, y)?;
        Ok(regressor)
    })
}
