//! Turning per-sample measurements into class labels.
//!
//! A [`ClassExtractor`] pulls one or more measurements out of every sample
//! through a caller-supplied function, drops skipped samples, and produces one
//! label per retained sample:
//!
//! - With a discretization rule, each measurement becomes a boolean.
//! - With autobalancing, the rule is `value >= threshold` and the threshold is
//!   searched so that the classes come out close to even.
//! - With neither, measurements pass through as a continuous response.
//!
//! When samples carry replicate measurements that disagree, just enough of
//! them are labelled positive to move the overall split towards 50/50.
//!
//! ```
//! use idepi::class::{ClassExtractor, Measurement};
//!
//! let samples = vec![vec![10.0], vec![20.0], vec![30.0], vec![25.0, 5.0]];
//! let extractor = ClassExtractor::new(|s: &Vec<f64>| {
//!     Ok::<_, std::convert::Infallible>(Measurement::Replicates(s.clone()))
//! })
//! .with_autobalance(true);
//!
//! let out = extractor.extract(&samples, None).unwrap();
//! assert_eq!(out.threshold, Some(20.0));
//! assert_eq!(out.labels().unwrap(), &[false, true, true, false]);
//! ```

mod ambiguity;
mod balance;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{BoxError, Error, Result};
use crate::utils::mean;

pub use ambiguity::positive_quota;
pub use balance::{BalanceReport, DEFAULT_MAX_ITERATIONS};

/// What the extraction function reports for one sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Measurement {
    Single(f64),
    /// Replicate measurements. Any sample reporting replicates switches the
    /// whole extraction to ambiguity-aware labelling.
    Replicates(Vec<f64>),
}

impl From<f64> for Measurement {
    fn from(value: f64) -> Self {
        Measurement::Single(value)
    }
}

impl From<Vec<f64>> for Measurement {
    fn from(values: Vec<f64>) -> Self {
        Measurement::Replicates(values)
    }
}

/// Extracted response, one entry per retained sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Response {
    Classes(Vec<bool>),
    /// Raw values (replicates averaged), when no discretization applies.
    Continuous(Vec<f64>),
}

impl Response {
    pub fn len(&self) -> usize {
        match self {
            Response::Classes(v) => v.len(),
            Response::Continuous(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Labels as `1.0`/`0.0`, or the continuous values.
    pub fn to_f64(&self) -> Vec<f64> {
        match self {
            Response::Classes(v) => v.iter().map(|&c| if c { 1.0 } else { 0.0 }).collect(),
            Response::Continuous(v) => v.clone(),
        }
    }
}

/// Result of [`ClassExtractor::extract`].
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub response: Response,
    /// Final autobalance threshold, `None` without autobalancing.
    pub threshold: Option<f64>,
    /// Input index of every retained sample, in order.
    pub retained: Vec<usize>,
    /// Samples whose replicates disagreed.
    pub ambiguous: usize,
    /// Ambiguous samples labelled positive.
    pub resolved_positive: usize,
    pub balance: Option<BalanceReport>,
}

impl Extraction {
    pub fn labels(&self) -> Option<&[bool]> {
        match &self.response {
            Response::Classes(v) => Some(v),
            Response::Continuous(_) => None,
        }
    }

    pub fn values(&self) -> Option<&[f64]> {
        match &self.response {
            Response::Continuous(v) => Some(v),
            Response::Classes(_) => None,
        }
    }
}

type ExtractFn<T> = Box<dyn Fn(&T) -> std::result::Result<Measurement, BoxError> + Send + Sync>;
type SkipFn<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;
type DiscretizeFn = Box<dyn Fn(f64) -> bool + Send + Sync>;

/// Converts samples of type `T` into a response vector.
pub struct ClassExtractor<T> {
    extract: ExtractFn<T>,
    skip: Option<SkipFn<T>>,
    discretize: Option<DiscretizeFn>,
    autobalance: bool,
    max_iterations: usize,
}

impl<T> fmt::Debug for ClassExtractor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassExtractor")
            .field("skip", &self.skip.is_some())
            .field("discretize", &self.discretize.is_some())
            .field("autobalance", &self.autobalance)
            .field("max_iterations", &self.max_iterations)
            .finish()
    }
}

impl<T> ClassExtractor<T> {
    /// Create an extractor around `extract`.
    ///
    /// Errors returned by `extract` are passed through as
    /// [`Error::Extraction`].
    pub fn new<F, M, E>(extract: F) -> Self
    where
        F: Fn(&T) -> std::result::Result<M, E> + Send + Sync + 'static,
        M: Into<Measurement>,
        E: Into<BoxError>,
    {
        Self {
            extract: Box::new(move |sample: &T| extract(sample).map(Into::into).map_err(Into::into)),
            skip: None,
            discretize: None,
            autobalance: false,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Exclude samples for which `skip` returns `true`.
    pub fn with_skip<F>(mut self, skip: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.skip = Some(Box::new(skip));
        self
    }

    /// Label measurements with `discretize`. Ignored when autobalancing.
    pub fn with_discretize<F>(mut self, discretize: F) -> Self
    where
        F: Fn(f64) -> bool + Send + Sync + 'static,
    {
        self.discretize = Some(Box::new(discretize));
        self
    }

    pub fn with_autobalance(mut self, autobalance: bool) -> Self {
        self.autobalance = autobalance;
        self
    }

    /// Cap on autobalance iterations. Default: [`DEFAULT_MAX_ITERATIONS`].
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Extract the response for `samples`.
    ///
    /// Only the first `count` non-skipped samples are retained (all of them
    /// when `None`). Labels follow input order.
    pub fn extract(&self, samples: &[T], count: Option<usize>) -> Result<Extraction> {
        let limit = count.unwrap_or(usize::MAX);
        let mut retained = Vec::new();
        let mut values: Vec<Vec<f64>> = Vec::new();
        let mut multi = false;

        for (index, sample) in samples.iter().enumerate() {
            if retained.len() >= limit {
                break;
            }
            if self.skip.as_ref().is_some_and(|skip| skip(sample)) {
                continue;
            }

            let measurement =
                (self.extract)(sample).map_err(|source| Error::Extraction { index, source })?;
            let mut entry = match measurement {
                Measurement::Single(v) => vec![v],
                Measurement::Replicates(vs) => {
                    if vs.is_empty() {
                        return Err(Error::EmptyMeasurement { index });
                    }
                    multi = true;
                    vs
                }
            };
            entry.sort_by(|a, b| b.total_cmp(a));

            retained.push(index);
            values.push(entry);
        }

        if retained.is_empty() {
            return Err(Error::AllSkipped);
        }

        if !self.autobalance && self.discretize.is_none() {
            let response = values
                .iter()
                .map(|v| mean(v).unwrap_or(f64::NAN))
                .collect();
            return Ok(Extraction {
                response: Response::Continuous(response),
                threshold: None,
                retained,
                ambiguous: 0,
                resolved_positive: 0,
                balance: None,
            });
        }

        let balance = self
            .autobalance
            .then(|| balance::autobalance(&mut values, self.max_iterations));

        let threshold = balance.map(|report| report.threshold);
        let discretize = |v: f64| match (threshold, &self.discretize) {
            (Some(t), _) => v >= t,
            (None, Some(rule)) => rule(v),
            (None, None) => false,
        };

        let (labels, ambiguous, resolved_positive) = if multi {
            let res = ambiguity::resolve(&values, discretize);
            (res.labels, res.ambiguous, res.resolved_positive)
        } else {
            let labels = values.iter().map(|v| discretize(v[0])).collect();
            (labels, 0, 0)
        };

        Ok(Extraction {
            response: Response::Classes(labels),
            threshold,
            retained,
            ambiguous,
            resolved_positive,
            balance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    fn replicates() -> ClassExtractor<Vec<f64>> {
        ClassExtractor::new(|s: &Vec<f64>| Ok::<_, Infallible>(Measurement::Replicates(s.clone())))
    }

    fn singles() -> ClassExtractor<f64> {
        ClassExtractor::new(|&v: &f64| Ok::<_, Infallible>(v))
    }

    #[test]
    fn everything_skipped_is_an_error() {
        let extractor = singles().with_skip(|_| true);
        assert!(matches!(extractor.extract(&[1.0, 2.0], None), Err(Error::AllSkipped)));
        assert!(matches!(singles().extract(&[], None), Err(Error::AllSkipped)));
    }

    #[test]
    fn zero_count_is_everything_skipped() {
        assert!(matches!(singles().extract(&[1.0], Some(0)), Err(Error::AllSkipped)));
    }

    #[test]
    fn count_limits_retained_samples() {
        let extractor = singles()
            .with_skip(|&v| v < 0.0)
            .with_discretize(|v| v > 1.5);
        let out = extractor.extract(&[-1.0, 1.0, -2.0, 2.0, 3.0], Some(2)).unwrap();
        assert_eq!(out.retained, vec![1, 3]);
        assert_eq!(out.labels().unwrap(), &[false, true]);
        assert_eq!(out.threshold, None);
    }

    #[test]
    fn continuous_mode_averages_replicates() {
        let out = replicates().extract(&[vec![1.0, 3.0], vec![5.0]], None).unwrap();
        assert_eq!(out.values().unwrap(), &[2.0, 5.0]);
        assert!(out.labels().is_none());
    }

    #[test]
    fn autobalance_ignores_discretize() {
        let extractor = singles()
            .with_discretize(|_| true)
            .with_autobalance(true);
        let out = extractor.extract(&[1.0, 2.0, 3.0, 4.0], None).unwrap();
        assert_eq!(out.threshold, Some(2.5));
        assert_eq!(out.labels().unwrap(), &[false, false, true, true]);
        assert!(out.balance.unwrap().converged);
    }

    #[test]
    fn empty_replicates_rejected() {
        let extractor = replicates().with_discretize(|v| v > 0.0);
        assert!(matches!(
            extractor.extract(&[vec![1.0], vec![]], None),
            Err(Error::EmptyMeasurement { index: 1 })
        ));
    }

    #[test]
    fn extraction_errors_carry_index() {
        let extractor: ClassExtractor<&str> =
            ClassExtractor::new(|s: &&str| s.parse::<f64>()).with_discretize(|v| v > 0.0);
        let err = extractor.extract(&["1.0", "oops"], None).unwrap_err();
        assert!(matches!(err, Error::Extraction { index: 1, .. }));
    }

    #[test]
    fn any_replicate_switches_to_multi_mode() {
        // single sample with disagreeing replicates gets resolved
        let samples = vec![vec![1.0], vec![2.0], vec![20.0, 1.0]];
        let out = replicates()
            .with_discretize(|v| v >= 10.0)
            .extract(&samples, None)
            .unwrap();
        assert_eq!(out.ambiguous, 1);
        // f = 0, quota = round(0.5 * 3) = 2, clamped to 1
        assert_eq!(out.resolved_positive, 1);
        assert_eq!(out.labels().unwrap(), &[false, false, true]);
    }
}
