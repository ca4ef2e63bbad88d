//! Linear solvers behind the regressor.
//!
//! Every solver fits `y ≈ X b` on data the [`Regressor`](crate::Regressor)
//! has already normalized, and exposes the fitted coefficients, predictions,
//! and the columns it considers selected.
//!
//! # Variants
//!
//! | Solver            | Selection             | Coefficients            |
//! |-------------------|-----------------------|-------------------------|
//! | [`Dantzig`]       | Dantzig selector      | same fit                |
//! | [`DoubleDantzig`] | Dantzig, loose bound  | Dantzig, tight bound    |
//! | [`LarDantzig`]    | LAR path              | Dantzig on support      |
//! | [`LassoDantzig`]  | Lasso                 | Dantzig on support      |
//! | [`RidgeDantzig`]  | Dantzig, ridge design | same fit                |
//! | [`RidgeLar`]      | LAR, ridge design     | same fit                |
//! | [`RidgeLasso`]    | elastic net           | same fit                |
//! | [`LinearSvr`]     | epsilon-SVR           | same fit                |
//!
//! [`SolverConfig`] names one variant with its parameters and is what
//! configuration files deserialize into.

mod dantzig;
mod lar;
mod lasso;
mod params;
mod simplex;
mod svr;

use std::fmt::Debug;

use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

pub use dantzig::{Dantzig, DoubleDantzig, LarDantzig, LassoDantzig, RidgeDantzig};
pub use lar::RidgeLar;
pub use lasso::RidgeLasso;
pub use params::*;
pub use svr::LinearSvr;

/// Coefficients with magnitude at or below this count as zero.
pub const SUPPORT_TOLERANCE: f64 = 1e-12;

// =============================================================================
// Errors
// =============================================================================

/// Failure inside a solver's `learn`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SolverError {
    #[error("design has {rows} rows but target has {len} entries")]
    ShapeMismatch { rows: usize, len: usize },

    #[error("linear program is infeasible (phase-one residual {residual:.3e})")]
    Infeasible { residual: f64 },

    #[error("linear program is unbounded")]
    Unbounded,

    #[error("simplex gave up after {pivots} pivots")]
    PivotLimit { pivots: usize },
}

// =============================================================================
// Solver trait
// =============================================================================

/// A linear solver over a normalized design.
pub trait Solver: Send + Sync + Debug {
    /// Short identifier, matching the `solver` tag of [`SolverConfig`].
    fn name(&self) -> &'static str;

    /// Fit coefficients to `x` (`[n_samples, n_columns]`) and `y`.
    fn learn(&mut self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>) -> Result<(), SolverError>;

    /// Fitted coefficients, one per column. Empty before `learn`.
    fn beta(&self) -> ArrayView1<'_, f64>;

    /// Predictions `x b`.
    fn pred(&self, x: ArrayView2<'_, f64>) -> Array1<f64> {
        x.dot(&self.beta())
    }

    /// Column indices this solver considers selected.
    fn selected(&self) -> Vec<usize>;
}

pub(crate) fn check_shapes(x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>) -> Result<(), SolverError> {
    if x.nrows() != y.len() {
        return Err(SolverError::ShapeMismatch {
            rows: x.nrows(),
            len: y.len(),
        });
    }
    Ok(())
}

/// Ascending indices of the nonzero coefficients.
pub(crate) fn support_of(beta: ArrayView1<'_, f64>) -> Vec<usize> {
    beta.iter()
        .enumerate()
        .filter(|(_, b)| b.abs() > SUPPORT_TOLERANCE)
        .map(|(j, _)| j)
        .collect()
}

// =============================================================================
// Configuration
// =============================================================================

/// A solver variant together with its parameters.
///
/// Serialized with a `solver` tag next to the parameter fields:
///
/// ```
/// use idepi::solver::SolverConfig;
///
/// let config: SolverConfig =
///     serde_json::from_str(r#"{"solver": "ridge_lar", "ridge": 0.5}"#).unwrap();
/// let solver = config.build().unwrap();
/// assert_eq!(solver.name(), "ridge_lar");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "solver", rename_all = "snake_case")]
pub enum SolverConfig {
    Dantzig(DantzigParams),
    DoubleDantzig(DoubleDantzigParams),
    LarDantzig(LarDantzigParams),
    LassoDantzig(LassoDantzigParams),
    RidgeDantzig(RidgeDantzigParams),
    RidgeLar(RidgeLarParams),
    RidgeLasso(RidgeLassoParams),
    LinearSvr(LinearSvrParams),
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig::RidgeLar(RidgeLarParams::default())
    }
}

impl SolverConfig {
    /// Validate the parameters and construct an unfitted solver.
    pub fn build(&self) -> Result<Box<dyn Solver>, ParamError> {
        let solver: Box<dyn Solver> = match self {
            SolverConfig::Dantzig(p) => {
                p.validate()?;
                Box::new(Dantzig::new(p.clone()))
            }
            SolverConfig::DoubleDantzig(p) => {
                p.validate()?;
                Box::new(DoubleDantzig::new(p.clone()))
            }
            SolverConfig::LarDantzig(p) => {
                p.validate()?;
                Box::new(LarDantzig::new(p.clone()))
            }
            SolverConfig::LassoDantzig(p) => {
                p.validate()?;
                Box::new(LassoDantzig::new(p.clone()))
            }
            SolverConfig::RidgeDantzig(p) => {
                p.validate()?;
                Box::new(RidgeDantzig::new(p.clone()))
            }
            SolverConfig::RidgeLar(p) => {
                p.validate()?;
                Box::new(RidgeLar::new(p.clone()))
            }
            SolverConfig::RidgeLasso(p) => {
                p.validate()?;
                Box::new(RidgeLasso::new(p.clone()))
            }
            SolverConfig::LinearSvr(p) => {
                p.validate()?;
                Box::new(LinearSvr::new(p.clone()))
            }
        };
        Ok(solver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn support_skips_tiny_values() {
        let beta = array![0.0, 1e-14, -0.3, 2.0];
        assert_eq!(support_of(beta.view()), vec![2, 3]);
    }

    #[test]
    fn every_config_builds_its_solver() {
        let configs = [
            (SolverConfig::Dantzig(Default::default()), "dantzig"),
            (SolverConfig::DoubleDantzig(Default::default()), "double_dantzig"),
            (SolverConfig::LarDantzig(Default::default()), "lar_dantzig"),
            (SolverConfig::LassoDantzig(Default::default()), "lasso_dantzig"),
            (SolverConfig::RidgeDantzig(Default::default()), "ridge_dantzig"),
            (SolverConfig::RidgeLar(Default::default()), "ridge_lar"),
            (SolverConfig::RidgeLasso(Default::default()), "ridge_lasso"),
            (SolverConfig::LinearSvr(Default::default()), "linear_svr"),
        ];
        for (config, name) in configs {
            let solver = config.build().unwrap();
            assert_eq!(solver.name(), name);
            assert!(solver.beta().is_empty());
        }
    }

    #[test]
    fn build_validates_deserialized_params() {
        let config = SolverConfig::Dantzig(DantzigParams { lambda: -1.0 });
        assert!(matches!(
            config.build(),
            Err(ParamError::Negative { field: "lambda", .. })
        ));
    }

    #[test]
    fn default_is_ridge_lar() {
        assert_eq!(SolverConfig::default().build().unwrap().name(), "ridge_lar");
    }
}
