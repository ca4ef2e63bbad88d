//! Small dense linear-algebra helpers used by the solvers.

use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2, Axis};

/// Solve the symmetric positive-definite system `a x = b` by Cholesky
/// decomposition.
///
/// Returns `None` if `a` is not square, the sizes disagree, or a pivot is not
/// strictly positive (the matrix is singular or indefinite).
pub fn cholesky_solve(a: ArrayView2<'_, f64>, b: ArrayView1<'_, f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    if n != a.ncols() || n != b.len() {
        return None;
    }

    // A = L L^T
    let mut l = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l[[i, k]] * l[[j, k]];
            }
            if i == j {
                let diag = a[[i, i]] - sum;
                if diag <= 1e-12 * a[[i, i]].abs().max(1.0) {
                    return None;
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }

    // L z = b
    let mut z = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut sum = 0.0;
        for j in 0..i {
            sum += l[[i, j]] * z[j];
        }
        z[i] = (b[i] - sum) / l[[i, i]];
    }

    // L^T x = z
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut sum = 0.0;
        for j in (i + 1)..n {
            sum += l[[j, i]] * x[j];
        }
        x[i] = (z[i] - sum) / l[[i, i]];
    }

    Some(x)
}

/// Euclidean norm of every column.
pub fn column_norms(x: ArrayView2<'_, f64>) -> Array1<f64> {
    x.map_axis(Axis(0), |col| col.dot(&col).sqrt())
}

/// Append `sqrt(ridge) * I` below `x` and zeros below `y`.
///
/// Least squares on the augmented system is ridge regression on the original
/// one, so any solver run on it gains an L2 penalty of `ridge`.
pub fn ridge_augment(
    x: ArrayView2<'_, f64>,
    y: ArrayView1<'_, f64>,
    ridge: f64,
) -> (Array2<f64>, Array1<f64>) {
    let (n, p) = x.dim();
    let mut xa = Array2::<f64>::zeros((n + p, p));
    xa.slice_mut(s![..n, ..]).assign(&x);
    let scale = ridge.sqrt();
    for j in 0..p {
        xa[[n + j, j]] = scale;
    }

    let mut ya = Array1::<f64>::zeros(n + p);
    ya.slice_mut(s![..n]).assign(&y);

    (xa, ya)
}
