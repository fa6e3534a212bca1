//! Dense solver for the normal equations of linear regression

use crate::{MathError, Result};
use ndarray::{Array1, Array2};

/// Relative tolerance below which a Cholesky pivot is treated as zero
const PIVOT_TOLERANCE: f64 = 1e-10;

/// Solve `a * x = b` for a symmetric positive semi-definite matrix `a`.
///
/// The factorization is a Cholesky decomposition that skips pivots which are
/// numerically zero. Columns that are linear combinations of earlier columns
/// (for example a feature that is constant over the training set) receive a
/// zero coefficient instead of failing the whole solve.
pub fn solve_symmetric(a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>> {
    let n = a.nrows();
    if a.ncols() != n {
        return Err(MathError::InvalidInput(format!(
            "Matrix must be square, got {}x{}",
            n,
            a.ncols()
        )));
    }
    if b.len() != n {
        return Err(MathError::DimensionMismatch {
            expected: n,
            found: b.len(),
        });
    }
    if a.iter().chain(b.iter()).any(|v| !v.is_finite()) {
        return Err(MathError::InvalidInput(
            "System contains non-finite values".to_string(),
        ));
    }

    let max_diag = a.diag().iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    let tolerance = PIVOT_TOLERANCE * max_diag.max(1.0);

    let mut lower = Array2::<f64>::zeros((n, n));
    let mut active = vec![false; n];

    for j in 0..n {
        let mut pivot = a[[j, j]];
        for k in 0..j {
            pivot -= lower[[j, k]] * lower[[j, k]];
        }
        if pivot <= tolerance {
            continue;
        }
        let root = pivot.sqrt();
        lower[[j, j]] = root;
        active[j] = true;

        for i in (j + 1)..n {
            let mut value = a[[i, j]];
            for k in 0..j {
                value -= lower[[i, k]] * lower[[j, k]];
            }
            lower[[i, j]] = value / root;
        }
    }

    // Forward substitution: L z = b
    let mut z = Array1::<f64>::zeros(n);
    for j in 0..n {
        if !active[j] {
            continue;
        }
        let mut value = b[j];
        for k in 0..j {
            value -= lower[[j, k]] * z[k];
        }
        z[j] = value / lower[[j, j]];
    }

    // Back substitution: L^T x = z
    let mut x = Array1::<f64>::zeros(n);
    for j in (0..n).rev() {
        if !active[j] {
            continue;
        }
        let mut value = z[j];
        for k in (j + 1)..n {
            value -= lower[[k, j]] * x[k];
        }
        x[j] = value / lower[[j, j]];
    }

    if x.iter().any(|v| !v.is_finite()) {
        return Err(MathError::CalculationError(
            "Solver produced non-finite coefficients".to_string(),
        ));
    }

    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn solves_positive_definite_system() {
        let a = array![[4.0, 2.0], [2.0, 3.0]];
        let b = array![10.0, 8.0];

        let x = solve_symmetric(&a, &b).unwrap();

        assert_relative_eq!(x[0], 1.75, epsilon = 1e-12);
        assert_relative_eq!(x[1], 1.5, epsilon = 1e-12);
    }

    #[test]
    fn zero_column_gets_zero_coefficient() {
        let a = array![[2.0, 0.0, 0.0], [0.0, 0.0, 0.0], [0.0, 0.0, 5.0]];
        let b = array![4.0, 0.0, 10.0];

        let x = solve_symmetric(&a, &b).unwrap();

        assert_relative_eq!(x[0], 2.0, epsilon = 1e-12);
        assert_eq!(x[1], 0.0);
        assert_relative_eq!(x[2], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn rejects_non_square_matrix() {
        let a = Array2::<f64>::zeros((2, 3));
        let b = array![1.0, 2.0];
        assert!(matches!(
            solve_symmetric(&a, &b),
            Err(MathError::InvalidInput(_))
        ));
    }

    #[test]
    fn rejects_mismatched_rhs() {
        let a = Array2::<f64>::eye(3);
        let b = array![1.0, 2.0];
        assert!(matches!(
            solve_symmetric(&a, &b),
            Err(MathError::DimensionMismatch {
                expected: 3,
                found: 2
            })
        ));
    }
}
