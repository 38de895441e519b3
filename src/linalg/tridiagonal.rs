//! Direct solver for tridiagonal systems (Thomas algorithm).

use nalgebra::DVector;

/// Solve a tridiagonal system.
///
/// `sub` holds the `n - 1` entries below the diagonal, `diag` the `n` diagonal
/// entries and `sup` the `n - 1` entries above it. No pivoting is done, so the
/// system should be diagonally dominant; a zero pivot yields non-finite output.
///
/// # Panics
///
/// Panics if the slice lengths are inconsistent.
pub fn tridiagonal_solve(sub: &[f64], diag: &[f64], sup: &[f64], rhs: &[f64]) -> DVector<f64> {
    let n = diag.len();
    assert_eq!(rhs.len(), n, "right-hand side length mismatch");
    if n == 0 {
        return DVector::zeros(0);
    }
    assert_eq!(sub.len(), n - 1, "sub-diagonal length mismatch");
    assert_eq!(sup.len(), n - 1, "super-diagonal length mismatch");

    let mut c = vec![0.0; n];
    let mut d = vec![0.0; n];

    // Forward sweep
    if n > 1 {
        c[0] = sup[0] / diag[0];
    }
    d[0] = rhs[0] / diag[0];
    for i in 1..n {
        let denom = diag[i] - sub[i - 1] * c[i - 1];
        if i < n - 1 {
            c[i] = sup[i] / denom;
        }
        d[i] = (rhs[i] - sub[i - 1] * d[i - 1]) / denom;
    }

    // Back substitution
    let mut x = DVector::zeros(n);
    x[n - 1] = d[n - 1];
    for i in (0..n - 1).rev() {
        x[i] = d[i] - c[i] * x[i + 1];
    }
    x
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_by_three() {
        // [2 1 0]       [4]
        // [1 2 1] * x = [8]   ->   x = (1, 2, 3)
        // [0 1 2]       [8]
        let x = tridiagonal_solve(&[1.0, 1.0], &[2.0, 2.0, 2.0], &[1.0, 1.0], &[4.0, 8.0, 8.0]);
        for (xi, expected) in x.iter().zip([1.0, 2.0, 3.0]) {
            assert!((xi - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_single_equation() {
        let x = tridiagonal_solve(&[], &[4.0], &[], &[2.0]);
        assert_eq!(x.as_slice(), &[0.5]);
    }

    #[test]
    fn test_empty() {
        assert_eq!(tridiagonal_solve(&[], &[], &[], &[]).len(), 0);
    }

    #[test]
    #[should_panic(expected = "sub-diagonal length mismatch")]
    fn test_length_mismatch_panics() {
        tridiagonal_solve(&[1.0], &[2.0, 2.0, 2.0], &[1.0, 1.0], &[1.0, 1.0, 1.0]);
    }
}
