//! idepi: epitope identification by sparse regression on neutralization data.
//!
//! The core of the pipeline: turning per-record potency measurements into a
//! response vector, and fitting sparse linear models that relate sequence
//! features to it.
//!
//! # Key Types
//!
//! - [`Regressor`] - Normalizing front end around a linear [`Solver`]
//! - [`SolverConfig`] - Serializable choice of solver and hyperparameters
//! - [`ClassExtractor`] - Measurements to (optionally balanced) class labels
//! - [`RecordFilter`] - Reference-sequence and IC50 handling for records
//!
//! # Regression
//!
//! Build a solver from its parameters (`RidgeLarParams::builder()...build()`)
//! or from a [`SolverConfig`], wrap it in a [`Regressor`], then call
//! [`Regressor::learn`] and [`Regressor::predict`]. See the [`solver`] module
//! for the available solvers.
//!
//! # Labels
//!
//! [`ClassExtractor::extract`] returns an [`Extraction`] holding the labels and,
//! when autobalancing, the threshold that was found. See the [`class`] module.
//!
//! # Logging
//!
//! Diagnostics go through the `log` facade; install any logger to see them.

// Re-export approx traits for users who want to compare predictions
pub use approx;

pub mod class;
pub mod error;
pub mod linalg;
pub mod metrics;
pub mod record;
pub mod regressor;
pub mod solver;
pub mod testing;
pub mod utils;

// =============================================================================
// Convenience Re-exports
// =============================================================================

pub use error::{BoxError, Error, Result};

pub use regressor::{fit_all, Coefficients, Normalization, Regressor};
pub use solver::{ParamError, Solver, SolverConfig, SolverError};

pub use class::{BalanceReport, ClassExtractor, Extraction, Measurement, Response};
pub use record::{RecordFilter, SeqRecord};

pub use metrics::{ConfusionMatrix, FitSummary};
pub use utils::Parallelism;
