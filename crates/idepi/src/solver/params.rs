//! Solver hyperparameters.
//!
//! Every parameter struct is built with a `bon` builder whose finishing
//! function validates the values, and is also (de)serializable so a solver can
//! be described in a configuration file. Deserialized values are validated
//! again when the solver is constructed via [`SolverConfig`](super::SolverConfig).
//!
//! ```
//! use idepi::solver::RidgeLarParams;
//!
//! let params = RidgeLarParams::builder().ridge(0.5).max_features(10).build().unwrap();
//! assert_eq!(params.max_features, Some(10));
//!
//! assert!(RidgeLarParams::builder().ridge(-1.0).build().is_err());
//! ```

use bon::Builder;
use serde::{Deserialize, Serialize};

// =============================================================================
// Validation Errors
// =============================================================================

/// Parameter validation error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParamError {
    /// Value must be >= 0.
    #[error("{field} must be >= 0, got {value}")]
    Negative { field: &'static str, value: f64 },

    /// Value must be > 0.
    #[error("{field} must be > 0, got {value}")]
    NonPositive { field: &'static str, value: f64 },

    /// Count must be at least 1.
    #[error("{field} must be at least 1")]
    Zero { field: &'static str },

    /// The selection stage of a double Dantzig fit must be at least as loose
    /// as the refit stage.
    #[error("select_lambda ({select}) must be >= refit_lambda ({refit})")]
    RefitAboveSelect { select: f64, refit: f64 },
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ParamError> {
    // written this way so NaN is rejected too
    if !(value >= 0.0) {
        return Err(ParamError::Negative { field, value });
    }
    Ok(())
}

fn positive(field: &'static str, value: f64) -> Result<(), ParamError> {
    if !(value > 0.0) {
        return Err(ParamError::NonPositive { field, value });
    }
    Ok(())
}

fn at_least_one(field: &'static str, value: usize) -> Result<(), ParamError> {
    if value == 0 {
        return Err(ParamError::Zero { field });
    }
    Ok(())
}

// =============================================================================
// Dantzig
// =============================================================================

/// Parameters for the plain Dantzig selector.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(derive(Clone, Debug), finish_fn(vis = "", name = __build_internal))]
#[serde(default)]
pub struct DantzigParams {
    /// Bound on `|x_j . residual|` for every column. Default: 1.0.
    #[builder(default = 1.0)]
    pub lambda: f64,
}

impl<S: dantzig_params_builder::IsComplete> DantzigParamsBuilder<S> {
    /// Build and validate the parameters.
    pub fn build(self) -> Result<DantzigParams, ParamError> {
        let params = self.__build_internal();
        params.validate()?;
        Ok(params)
    }
}

impl DantzigParams {
    pub(crate) fn validate(&self) -> Result<(), ParamError> {
        non_negative("lambda", self.lambda)
    }
}

impl Default for DantzigParams {
    fn default() -> Self {
        Self::builder().build().expect("default params are valid")
    }
}

/// Parameters for the two-stage (double) Dantzig selector.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(derive(Clone, Debug), finish_fn(vis = "", name = __build_internal))]
#[serde(default)]
pub struct DoubleDantzigParams {
    /// Correlation bound of the selection stage. Default: 2.0.
    #[builder(default = 2.0)]
    pub select_lambda: f64,

    /// Correlation bound of the refit on the selected columns. Default: 0.5.
    #[builder(default = 0.5)]
    pub refit_lambda: f64,
}

impl<S: double_dantzig_params_builder::IsComplete> DoubleDantzigParamsBuilder<S> {
    /// Build and validate the parameters.
    pub fn build(self) -> Result<DoubleDantzigParams, ParamError> {
        let params = self.__build_internal();
        params.validate()?;
        Ok(params)
    }
}

impl DoubleDantzigParams {
    pub(crate) fn validate(&self) -> Result<(), ParamError> {
        non_negative("select_lambda", self.select_lambda)?;
        non_negative("refit_lambda", self.refit_lambda)?;
        if self.select_lambda < self.refit_lambda {
            return Err(ParamError::RefitAboveSelect {
                select: self.select_lambda,
                refit: self.refit_lambda,
            });
        }
        Ok(())
    }
}

impl Default for DoubleDantzigParams {
    fn default() -> Self {
        Self::builder().build().expect("default params are valid")
    }
}

/// Parameters for LAR support selection followed by a Dantzig refit.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(derive(Clone, Debug), finish_fn(vis = "", name = __build_internal))]
#[serde(default)]
pub struct LarDantzigParams {
    /// Number of columns LAR may activate. `None` runs the full path.
    pub max_features: Option<usize>,

    /// Correlation bound of the Dantzig refit. Default: 1.0.
    #[builder(default = 1.0)]
    pub lambda: f64,
}

impl<S: lar_dantzig_params_builder::IsComplete> LarDantzigParamsBuilder<S> {
    /// Build and validate the parameters.
    pub fn build(self) -> Result<LarDantzigParams, ParamError> {
        let params = self.__build_internal();
        params.validate()?;
        Ok(params)
    }
}

impl LarDantzigParams {
    pub(crate) fn validate(&self) -> Result<(), ParamError> {
        if let Some(m) = self.max_features {
            at_least_one("max_features", m)?;
        }
        non_negative("lambda", self.lambda)
    }
}

impl Default for LarDantzigParams {
    fn default() -> Self {
        Self::builder().build().expect("default params are valid")
    }
}

/// Parameters for Lasso support selection followed by a Dantzig refit.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(derive(Clone, Debug), finish_fn(vis = "", name = __build_internal))]
#[serde(default)]
pub struct LassoDantzigParams {
    /// L1 penalty of the selection stage. Default: 0.1.
    #[builder(default = 0.1)]
    pub alpha: f64,

    /// Correlation bound of the Dantzig refit. Default: 1.0.
    #[builder(default = 1.0)]
    pub lambda: f64,

    /// Coordinate descent sweeps. Default: 1000.
    #[builder(default = 1000)]
    pub max_iter: usize,

    /// Stop when the largest coefficient change in a sweep is below this.
    #[builder(default = 1e-8)]
    pub tol: f64,
}

impl<S: lasso_dantzig_params_builder::IsComplete> LassoDantzigParamsBuilder<S> {
    /// Build and validate the parameters.
    pub fn build(self) -> Result<LassoDantzigParams, ParamError> {
        let params = self.__build_internal();
        params.validate()?;
        Ok(params)
    }
}

impl LassoDantzigParams {
    pub(crate) fn validate(&self) -> Result<(), ParamError> {
        non_negative("alpha", self.alpha)?;
        non_negative("lambda", self.lambda)?;
        at_least_one("max_iter", self.max_iter)?;
        positive("tol", self.tol)
    }
}

impl Default for LassoDantzigParams {
    fn default() -> Self {
        Self::builder().build().expect("default params are valid")
    }
}

/// Parameters for the Dantzig selector on a ridge-augmented design.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(derive(Clone, Debug), finish_fn(vis = "", name = __build_internal))]
#[serde(default)]
pub struct RidgeDantzigParams {
    /// L2 penalty. Default: 1.0.
    #[builder(default = 1.0)]
    pub ridge: f64,

    /// Correlation bound on the augmented design. Default: 1.0.
    #[builder(default = 1.0)]
    pub lambda: f64,
}

impl<S: ridge_dantzig_params_builder::IsComplete> RidgeDantzigParamsBuilder<S> {
    /// Build and validate the parameters.
    pub fn build(self) -> Result<RidgeDantzigParams, ParamError> {
        let params = self.__build_internal();
        params.validate()?;
        Ok(params)
    }
}

impl RidgeDantzigParams {
    pub(crate) fn validate(&self) -> Result<(), ParamError> {
        non_negative("ridge", self.ridge)?;
        non_negative("lambda", self.lambda)
    }
}

impl Default for RidgeDantzigParams {
    fn default() -> Self {
        Self::builder().build().expect("default params are valid")
    }
}

// =============================================================================
// LAR / Lasso
// =============================================================================

/// Parameters for least-angle regression on a ridge-augmented design.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(derive(Clone, Debug), finish_fn(vis = "", name = __build_internal))]
#[serde(default)]
pub struct RidgeLarParams {
    /// L2 penalty. Default: 1.0.
    #[builder(default = 1.0)]
    pub ridge: f64,

    /// Number of columns LAR may activate. `None` runs the full path, which
    /// ends at the ridge solution.
    pub max_features: Option<usize>,
}

impl<S: ridge_lar_params_builder::IsComplete> RidgeLarParamsBuilder<S> {
    /// Build and validate the parameters.
    pub fn build(self) -> Result<RidgeLarParams, ParamError> {
        let params = self.__build_internal();
        params.validate()?;
        Ok(params)
    }
}

impl RidgeLarParams {
    pub(crate) fn validate(&self) -> Result<(), ParamError> {
        non_negative("ridge", self.ridge)?;
        if let Some(m) = self.max_features {
            at_least_one("max_features", m)?;
        }
        Ok(())
    }
}

impl Default for RidgeLarParams {
    fn default() -> Self {
        Self::builder().build().expect("default params are valid")
    }
}

/// Parameters for elastic-net coordinate descent.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(derive(Clone, Debug), finish_fn(vis = "", name = __build_internal))]
#[serde(default)]
pub struct RidgeLassoParams {
    /// L1 penalty. Default: 0.1.
    #[builder(default = 0.1)]
    pub alpha: f64,

    /// L2 penalty. Default: 1.0.
    #[builder(default = 1.0)]
    pub ridge: f64,

    /// Coordinate descent sweeps. Default: 1000.
    #[builder(default = 1000)]
    pub max_iter: usize,

    /// Stop when the largest coefficient change in a sweep is below this.
    #[builder(default = 1e-8)]
    pub tol: f64,
}

impl<S: ridge_lasso_params_builder::IsComplete> RidgeLassoParamsBuilder<S> {
    /// Build and validate the parameters.
    pub fn build(self) -> Result<RidgeLassoParams, ParamError> {
        let params = self.__build_internal();
        params.validate()?;
        Ok(params)
    }
}

impl RidgeLassoParams {
    pub(crate) fn validate(&self) -> Result<(), ParamError> {
        non_negative("alpha", self.alpha)?;
        non_negative("ridge", self.ridge)?;
        at_least_one("max_iter", self.max_iter)?;
        positive("tol", self.tol)
    }
}

impl Default for RidgeLassoParams {
    fn default() -> Self {
        Self::builder().build().expect("default params are valid")
    }
}

// =============================================================================
// SVR
// =============================================================================

/// Parameters for epsilon-insensitive linear support vector regression.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(derive(Clone, Debug), finish_fn(vis = "", name = __build_internal))]
#[serde(default)]
pub struct LinearSvrParams {
    /// Cost of residuals outside the epsilon tube. Default: 1.0.
    #[builder(default = 1.0)]
    pub c: f64,

    /// Half-width of the insensitive tube. Default: 0.1.
    #[builder(default = 0.1)]
    pub epsilon: f64,

    /// Dual coordinate descent sweeps. Default: 1000.
    #[builder(default = 1000)]
    pub max_iter: usize,

    /// Stop when the largest dual variable change in a sweep is below this.
    #[builder(default = 1e-6)]
    pub tol: f64,
}

impl<S: linear_svr_params_builder::IsComplete> LinearSvrParamsBuilder<S> {
    /// Build and validate the parameters.
    pub fn build(self) -> Result<LinearSvrParams, ParamError> {
        let params = self.__build_internal();
        params.validate()?;
        Ok(params)
    }
}

impl LinearSvrParams {
    pub(crate) fn validate(&self) -> Result<(), ParamError> {
        positive("c", self.c)?;
        non_negative("epsilon", self.epsilon)?;
        at_least_one("max_iter", self.max_iter)?;
        positive("tol", self.tol)
    }
}

impl Default for LinearSvrParams {
    fn default() -> Self {
        Self::builder().build().expect("default params are valid")
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(DantzigParams::default().validate().is_ok());
        assert!(DoubleDantzigParams::default().validate().is_ok());
        assert!(LarDantzigParams::default().validate().is_ok());
        assert!(LassoDantzigParams::default().validate().is_ok());
        assert!(RidgeDantzigParams::default().validate().is_ok());
        assert!(RidgeLarParams::default().validate().is_ok());
        assert!(RidgeLassoParams::default().validate().is_ok());
        assert!(LinearSvrParams::default().validate().is_ok());
    }

    #[test]
    fn negative_lambda_rejected() {
        let result = DantzigParams::builder().lambda(-0.1).build();
        assert!(matches!(
            result,
            Err(ParamError::Negative { field: "lambda", .. })
        ));
    }

    #[test]
    fn nan_rejected() {
        let result = RidgeLassoParams::builder().alpha(f64::NAN).build();
        assert!(matches!(result, Err(ParamError::Negative { field: "alpha", .. })));
    }

    #[test]
    fn zero_max_features_rejected() {
        let result = RidgeLarParams::builder().max_features(0).build();
        assert!(matches!(
            result,
            Err(ParamError::Zero { field: "max_features" })
        ));
    }

    #[test]
    fn double_dantzig_stage_order() {
        let result = DoubleDantzigParams::builder()
            .select_lambda(0.1)
            .refit_lambda(1.0)
            .build();
        assert!(matches!(result, Err(ParamError::RefitAboveSelect { .. })));

        let ok = DoubleDantzigParams::builder()
            .select_lambda(1.0)
            .refit_lambda(1.0)
            .build();
        assert!(ok.is_ok());
    }

    #[test]
    fn svr_requires_positive_cost() {
        let result = LinearSvrParams::builder().c(0.0).build();
        assert!(matches!(result, Err(ParamError::NonPositive { field: "c", .. })));
    }

    #[test]
    fn builder_sets_fields() {
        let params = LassoDantzigParams::builder()
            .alpha(0.25)
            .lambda(0.5)
            .max_iter(50)
            .build()
            .unwrap();
        assert_eq!(params.alpha, 0.25);
        assert_eq!(params.lambda, 0.5);
        assert_eq!(params.max_iter, 50);
        assert_eq!(params.tol, 1e-8);
    }
}
