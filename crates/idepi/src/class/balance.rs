//! Iterative median search for a balanced discretization threshold.

use serde::{Deserialize, Serialize};

use crate::utils::median;

/// Default cap on autobalance iterations.
pub const DEFAULT_MAX_ITERATIONS: usize = 1000;

/// Outcome of an autobalance run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BalanceReport {
    /// Final threshold; values `>=` it are positive.
    pub threshold: f64,
    pub iterations: usize,
    /// `false` when the iteration cap was reached before the class pattern
    /// stopped changing.
    pub converged: bool,
}

/// How a sample's measurements fall relative to a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Agreement {
    Positive,
    Negative,
    Mixed,
}

pub(super) fn agreement(values: &[f64], threshold: f64) -> Agreement {
    let mut positive = false;
    let mut negative = false;
    for &v in values {
        if v >= threshold {
            positive = true;
        } else {
            negative = true;
        }
    }
    match (positive, negative) {
        (true, false) => Agreement::Positive,
        (false, true) => Agreement::Negative,
        _ => Agreement::Mixed,
    }
}

fn max_of(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

fn min_of(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::INFINITY, f64::min)
}

/// Search a threshold that splits `samples` close to evenly.
///
/// The threshold starts at the median of single-measurement samples (all
/// values if there are none). Every iteration classifies each sample against
/// it, then moves it to the median over agreeing samples of their maximum
/// (positive) or minimum (negative) value. The search stops once the
/// per-sample agreement pattern repeats, or after `max_iterations`.
///
/// Afterwards each agreeing sample is collapsed to its extremal value; mixed
/// samples keep all of theirs. Every sample must be non-empty.
pub(super) fn autobalance(samples: &mut [Vec<f64>], max_iterations: usize) -> BalanceReport {
    let singles: Vec<f64> = samples
        .iter()
        .filter(|s| s.len() == 1)
        .map(|s| s[0])
        .collect();
    let mut threshold = match median(&singles) {
        Some(m) => m,
        None => {
            let all: Vec<f64> = samples.iter().flatten().copied().collect();
            median(&all).unwrap_or(0.0)
        }
    };

    let mut previous: Option<Vec<Agreement>> = None;
    let mut iterations = 0;
    let mut converged = false;

    while iterations < max_iterations {
        iterations += 1;

        let pattern: Vec<Agreement> = samples.iter().map(|s| agreement(s, threshold)).collect();
        if previous.as_ref() == Some(&pattern) {
            converged = true;
            break;
        }

        let extremes: Vec<f64> = samples
            .iter()
            .zip(&pattern)
            .filter_map(|(s, a)| match a {
                Agreement::Positive => Some(max_of(s)),
                Agreement::Negative => Some(min_of(s)),
                Agreement::Mixed => None,
            })
            .collect();
        // no agreeing sample leaves the threshold where it is
        if let Some(m) = median(&extremes) {
            threshold = m;
        }

        previous = Some(pattern);
    }

    if converged {
        log::debug!("autobalance converged to {threshold} after {iterations} iterations");
    } else {
        log::warn!(
            "autobalance stopped at the {max_iterations} iteration cap, using threshold {threshold}"
        );
    }

    for s in samples.iter_mut() {
        match agreement(s, threshold) {
            Agreement::Positive => *s = vec![max_of(s)],
            Agreement::Negative => *s = vec![min_of(s)],
            Agreement::Mixed => {}
        }
    }

    BalanceReport {
        threshold,
        iterations,
        converged,
    }
}
