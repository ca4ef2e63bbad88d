//! Centering and scaling of the design matrix and response.
//!
//! Column 0 of the normalized design is the intercept column of ones; it is
//! added here and never centered or scaled. Every caller column `j` maps to
//! design column `j + 1`.

use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2};

use crate::error::{Error, Result};

/// Maximum deviation from zero mean (and from unit norm) accepted after
/// normalization.
pub const NORMALIZATION_TOLERANCE: f64 = 1e-9;

/// Constants recorded by [`Regressor::learn`](super::Regressor::learn).
///
/// `xbar` and `xvar` have one entry per caller column (the intercept is not
/// included). A column with `xvar[j] == 0.0` was constant and is only
/// centered.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalization {
    pub xbar: Array1<f64>,
    pub xvar: Array1<f64>,
    pub ybar: f64,
}

/// Check `deviation` against the tolerance, logging before failing.
fn within_tolerance(quantity: impl FnOnce() -> String, deviation: f64) -> Result<()> {
    // also rejects NaN
    if !(deviation.abs() <= NORMALIZATION_TOLERANCE) {
        let quantity = quantity();
        log::warn!("normalization: {quantity} deviates by {deviation:e}");
        return Err(Error::NumericalInvariant {
            quantity,
            deviation,
            tolerance: NORMALIZATION_TOLERANCE,
        });
    }
    Ok(())
}

fn mean_of(values: ArrayView1<'_, f64>) -> f64 {
    values.sum() / values.len() as f64
}

impl Normalization {
    /// Number of caller columns these constants were computed for.
    pub fn n_features(&self) -> usize {
        self.xbar.len()
    }

    /// Normalize training data.
    ///
    /// Returns the constants together with the intercept-prefixed, normalized
    /// design and the centered response.
    pub fn fit(
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, f64>,
    ) -> Result<(Self, Array2<f64>, Array1<f64>)> {
        let (n, p) = x.dim();
        if n == 0 {
            return Err(Error::EmptyInput);
        }
        if y.len() != n {
            return Err(Error::ShapeMismatch {
                expected: format!("{n} responses"),
                actual: format!("{}", y.len()),
            });
        }

        let mut design = Array2::<f64>::zeros((n, p + 1));
        design.column_mut(0).fill(1.0);
        let mut xbar = Array1::<f64>::zeros(p);
        let mut xvar = Array1::<f64>::zeros(p);

        for j in 0..p {
            let mut col = design.column_mut(j + 1);
            col.assign(&x.column(j));

            // second pass removes what rounding left of large offsets
            let mut mean = mean_of(col.view());
            col -= mean;
            let residual = mean_of(col.view());
            col -= residual;
            mean += residual;

            within_tolerance(|| format!("mean of column {j}"), mean_of(col.view()))?;

            let norm = col.dot(&col).sqrt();
            if norm != 0.0 {
                col /= norm;
                within_tolerance(|| format!("norm of column {j}"), col.dot(&col) - 1.0)?;
            }

            xbar[j] = mean;
            xvar[j] = norm;
        }

        let mut ybar = mean_of(y);
        let mut target = y.mapv(|v| v - ybar);
        let residual = mean_of(target.view());
        target -= residual;
        ybar += residual;
        within_tolerance(|| "mean of response".to_string(), mean_of(target.view()))?;

        log::trace!("normalized {n}x{p} design, ybar={ybar:.4}");
        Ok((Self { xbar, xvar, ybar }, design, target))
    }

    /// Apply the stored constants to new data.
    pub fn apply(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        let (n, p) = x.dim();
        if p != self.n_features() {
            return Err(Error::ShapeMismatch {
                expected: format!("{} columns", self.n_features()),
                actual: format!("{p}"),
            });
        }

        let mut design = Array2::<f64>::zeros((n, p + 1));
        design.column_mut(0).fill(1.0);
        design.slice_mut(s![.., 1..]).assign(&x);
        for j in 0..p {
            let mut col = design.column_mut(j + 1);
            col -= self.xbar[j];
            if self.xvar[j] != 0.0 {
                col /= self.xvar[j];
            }
        }
        Ok(design)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn intercept_column_untouched() {
        let x = array![[1.0, 5.0], [2.0, 5.0], [3.0, 5.0]];
        let y = array![1.0, 2.0, 6.0];
        let (norm, design, target) = Normalization::fit(x.view(), y.view()).unwrap();

        assert_eq!(design.column(0).to_vec(), vec![1.0; 3]);
        assert_abs_diff_eq!(norm.ybar, 3.0);
        assert_abs_diff_eq!(target.sum(), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(norm.xbar[0], 2.0);
        assert_abs_diff_eq!(norm.xvar[0], 2.0_f64.sqrt());
    }

    #[test]
    fn constant_column_is_only_centered() {
        let x = array![[5.0], [5.0]];
        let y = array![0.0, 1.0];
        let (norm, design, _) = Normalization::fit(x.view(), y.view()).unwrap();
        assert_eq!(norm.xvar[0], 0.0);
        assert_eq!(design.column(1).to_vec(), vec![0.0, 0.0]);
    }

    #[test]
    fn apply_reuses_training_constants() {
        let x = array![[0.0], [2.0]];
        let y = array![0.0, 1.0];
        let (norm, design, _) = Normalization::fit(x.view(), y.view()).unwrap();
        let again = norm.apply(x.view()).unwrap();
        assert_eq!(design, again);

        let fresh = norm.apply(array![[4.0]].view()).unwrap();
        assert_abs_diff_eq!(fresh[[0, 1]], 3.0 / 2.0_f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn large_offset_column_centers_cleanly() {
        let x = crate::testing::random_design(50, 1, 5, 1e7, 1e7 + 1000.0);
        let y = crate::testing::random_design(50, 1, 6, 1e7, 1e7 + 1000.0).column(0).to_owned();
        let (norm, design, target) = Normalization::fit(x.view(), y.view()).unwrap();

        assert!((design.column(1).sum() / 50.0).abs() <= NORMALIZATION_TOLERANCE);
        assert!((target.sum() / 50.0).abs() <= NORMALIZATION_TOLERANCE);
        assert_abs_diff_eq!(norm.xbar[0], 1e7 + 500.0, epsilon = 200.0);
        assert_abs_diff_eq!(design.column(1).dot(&design.column(1)), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn nan_input_violates_invariant() {
        let x = array![[f64::NAN], [1.0]];
        let y = array![0.0, 1.0];
        assert!(matches!(
            Normalization::fit(x.view(), y.view()),
            Err(Error::NumericalInvariant { .. })
        ));
    }

    #[test]
    fn wrong_width_rejected() {
        let x = array![[0.0, 1.0], [2.0, 3.0]];
        let y = array![0.0, 1.0];
        let (norm, _, _) = Normalization::fit(x.view(), y.view()).unwrap();
        assert!(matches!(
            norm.apply(array![[1.0]].view()),
            Err(Error::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn empty_design_rejected() {
        let x = Array2::<f64>::zeros((0, 2));
        let y = Array1::<f64>::zeros(0);
        assert!(matches!(
            Normalization::fit(x.view(), y.view()),
            Err(Error::EmptyInput)
        ));
    }
}
