//! Error types shared by the regression and class-extraction code.

use crate::solver::{ParamError, SolverError};

/// Boxed error returned by caller-supplied extraction functions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Crate-level result alias.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised by [`Regressor`](crate::Regressor),
/// [`ClassExtractor`](crate::ClassExtractor) and the record helpers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An accessor or `predict` was called before `learn`.
    #[error("no regression model computed")]
    NotFitted,

    /// Input arrays do not have compatible shapes.
    #[error("shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    /// The design matrix has no rows.
    #[error("cannot learn from an empty design matrix")]
    EmptyInput,

    /// Normalization produced a value outside the `1e-9` tolerance.
    #[error("{quantity} off by {deviation:e} after normalization (tolerance {tolerance:e})")]
    NumericalInvariant {
        quantity: String,
        deviation: f64,
        tolerance: f64,
    },

    /// Invalid solver hyperparameter.
    #[error(transparent)]
    Param(#[from] ParamError),

    /// The underlying solver failed.
    #[error(transparent)]
    Solver(#[from] SolverError),

    /// Every sample was excluded by the skip predicate or the count limit.
    #[error("every sample was skipped, nothing to extract")]
    AllSkipped,

    /// A sample produced an empty list of replicate measurements.
    #[error("sample {index} has no measurements")]
    EmptyMeasurement { index: usize },

    /// The caller's extraction function failed for a sample.
    #[error("failed to extract a measurement from sample {index}")]
    Extraction {
        index: usize,
        #[source]
        source: BoxError,
    },

    /// A record description does not carry parseable IC50 values.
    #[error("cannot parse `{description}` for IC50 values")]
    MalformedIc50 { description: String },

    /// A record identifier does not have the expected `|`-separated fields.
    #[error("malformed ID: {id}")]
    MalformedId { id: String },
}
