//! Goodness-of-fit summaries.

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

fn check_lengths(truth: usize, preds: usize) -> Result<()> {
    if truth != preds {
        return Err(Error::ShapeMismatch {
            expected: format!("{truth} predictions"),
            actual: format!("{preds}"),
        });
    }
    Ok(())
}

// =============================================================================
// Classification
// =============================================================================

/// Counts of a binary classification, positive meaning `> 0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub tp: usize,
    pub tn: usize,
    pub fp: usize,
    pub fn_: usize,
}

impl ConfusionMatrix {
    /// Tally signed scores against signed truth values.
    pub fn from_scores(truth: ArrayView1<'_, f64>, preds: ArrayView1<'_, f64>) -> Result<Self> {
        check_lengths(truth.len(), preds.len())?;
        let mut cm = Self::default();
        for (&t, &p) in truth.iter().zip(preds.iter()) {
            match (t > 0.0, p > 0.0) {
                (true, true) => cm.tp += 1,
                (false, false) => cm.tn += 1,
                (false, true) => cm.fp += 1,
                (true, false) => cm.fn_ += 1,
            }
        }
        Ok(cm)
    }

    /// Tally boolean labels.
    pub fn from_labels(truth: &[bool], preds: &[bool]) -> Result<Self> {
        check_lengths(truth.len(), preds.len())?;
        let mut cm = Self::default();
        for (&t, &p) in truth.iter().zip(preds) {
            match (t, p) {
                (true, true) => cm.tp += 1,
                (false, false) => cm.tn += 1,
                (false, true) => cm.fp += 1,
                (true, false) => cm.fn_ += 1,
            }
        }
        Ok(cm)
    }

    pub fn total(&self) -> usize {
        self.tp + self.tn + self.fp + self.fn_
    }

    /// Fraction of correct calls, `0.0` when empty.
    pub fn accuracy(&self) -> f64 {
        ratio(self.tp + self.tn, self.total())
    }

    /// `tp / (tp + fn)`.
    pub fn sensitivity(&self) -> f64 {
        ratio(self.tp, self.tp + self.fn_)
    }

    /// `tn / (tn + fp)`.
    pub fn specificity(&self) -> f64 {
        ratio(self.tn, self.tn + self.fp)
    }

    /// Matthews correlation coefficient, `0.0` when any margin is empty.
    pub fn mcc(&self) -> f64 {
        let (tp, tn, fp, fn_) = (
            self.tp as f64,
            self.tn as f64,
            self.fp as f64,
            self.fn_ as f64,
        );
        let denom = ((tp + fp) * (tp + fn_) * (tn + fp) * (tn + fn_)).sqrt();
        if denom == 0.0 {
            0.0
        } else {
            (tp * tn - fp * fn_) / denom
        }
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

// =============================================================================
// Regression
// =============================================================================

/// R², adjusted R² and RMSE of a regression fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitSummary {
    pub r2: f64,
    /// `None` when there are no residual degrees of freedom.
    pub adjusted_r2: Option<f64>,
    pub rmse: f64,
}

impl FitSummary {
    /// Summarize predictions of a model with `n_params` nonzero weights
    /// (intercept not counted).
    pub fn compute(
        truth: ArrayView1<'_, f64>,
        preds: ArrayView1<'_, f64>,
        n_params: usize,
    ) -> Result<Self> {
        check_lengths(truth.len(), preds.len())?;
        let n = truth.len();
        if n == 0 {
            return Err(Error::EmptyInput);
        }

        let mean = truth.sum() / n as f64;
        let sse: f64 = truth
            .iter()
            .zip(preds.iter())
            .map(|(t, p)| (t - p).powi(2))
            .sum();
        let sst: f64 = truth.iter().map(|t| (t - mean).powi(2)).sum();

        let r2 = if sst == 0.0 { 0.0 } else { 1.0 - sse / sst };
        let adjusted_r2 = match n.checked_sub(n_params + 1) {
            Some(dof) if dof > 0 && n > 1 && sst != 0.0 => {
                Some(1.0 - (sse / dof as f64) / (sst / (n - 1) as f64))
            }
            _ => None,
        };
        let rmse = (sse / n as f64).sqrt();

        Ok(Self {
            r2,
            adjusted_r2,
            rmse,
        })
    }
}
