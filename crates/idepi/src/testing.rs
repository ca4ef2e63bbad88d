//! Synthetic data for tests and benchmarks.
//!
//! Everything here is seeded, so the same arguments always give the same data.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use rand::prelude::*;

/// Random design matrix with entries uniform in `[min, max]`.
pub fn random_design(rows: usize, cols: usize, seed: u64, min: f64, max: f64) -> Array2<f64> {
    assert!(max >= min);
    let mut rng = StdRng::seed_from_u64(seed);
    let width = max - min;
    Array2::from_shape_simple_fn((rows, cols), || min + rng.r#gen::<f64>() * width)
}

/// Random 0/1 design where each entry is one with probability `density`.
///
/// With `cols > rows` this gives the wide, collinear shape of site-indicator
/// features: duplicated and all-zero columns are common.
pub fn binary_design(rows: usize, cols: usize, seed: u64, density: f64) -> Array2<f64> {
    random_design(rows, cols, seed, 0.0, 1.0).mapv(|v| if v >= 1.0 - density { 1.0 } else { 0.0 })
}

/// Targets `x . weights + bias` plus uniform noise in `[-noise, noise]`.
pub fn linear_targets(
    x: ArrayView2<'_, f64>,
    weights: ArrayView1<'_, f64>,
    bias: f64,
    seed: u64,
    noise: f64,
) -> Array1<f64> {
    assert_eq!(x.ncols(), weights.len());
    let mut rng = StdRng::seed_from_u64(seed);
    let mut y = x.dot(&weights) + bias;
    if noise > 0.0 {
        y.mapv_inplace(|v| v + (rng.r#gen::<f64>() * 2.0 - 1.0) * noise);
    }
    y
}

/// Random regression problem without an intercept.
///
/// Features are uniform in `[-1, 1]`, true weights uniform in `[-1, 1]`.
/// Returns `(x, y, weights)`.
pub fn synthetic_regression(
    rows: usize,
    cols: usize,
    seed: u64,
    noise: f64,
) -> (Array2<f64>, Array1<f64>, Array1<f64>) {
    let x = random_design(rows, cols, seed, -1.0, 1.0);
    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(1));
    let weights = Array1::from_shape_simple_fn(cols, || rng.r#gen::<f64>() * 2.0 - 1.0);
    let y = linear_targets(x.view(), weights.view(), 0.0, seed.wrapping_add(2), noise);
    (x, y, weights)
}

/// Replicate measurements around `centers`.
///
/// Every sample gets between 1 and `max_replicates` values, each the center
/// times a factor uniform in `[1 - spread, 1 + spread]`.
pub fn replicate_measurements(
    centers: &[f64],
    max_replicates: usize,
    spread: f64,
    seed: u64,
) -> Vec<Vec<f64>> {
    assert!(max_replicates >= 1);
    let mut rng = StdRng::seed_from_u64(seed);
    centers
        .iter()
        .map(|&center| {
            let count = rng.gen_range(1..=max_replicates);
            (0..count)
                .map(|_| center * (1.0 + (rng.r#gen::<f64>() * 2.0 - 1.0) * spread))
                .collect()
        })
        .collect()
}
