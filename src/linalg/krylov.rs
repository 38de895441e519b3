//! Iterative Krylov-subspace solvers.
//!
//! All solvers take the initial guess in `x` and leave their last iterate there,
//! whether or not they converged. Convergence is judged on the relative
//! residual `||b - A x|| / ||b||`. Nothing special is done for `NaN` or `inf`
//! input; such values propagate through the iteration.

use nalgebra::{DMatrix, DVector};

use super::LinearOperator;

/// How an iterative solve ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    /// The right-hand side was zero or the initial guess already met the tolerance.
    Trivial,
    /// The tolerance was met after at least one iteration.
    Converged,
    /// The iteration cap was reached first.
    MaxIterations,
}

/// Outcome of an iterative solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveReport {
    /// How the solve ended.
    pub status: SolveStatus,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Relative residual of the final iterate.
    pub relative_residual: f64,
}

impl SolveReport {
    fn trivial(relative_residual: f64) -> Self {
        Self {
            status: SolveStatus::Trivial,
            iterations: 0,
            relative_residual,
        }
    }

    fn converged(iterations: usize, relative_residual: f64) -> Self {
        Self {
            status: SolveStatus::Converged,
            iterations,
            relative_residual,
        }
    }

    fn exhausted(iterations: usize, relative_residual: f64) -> Self {
        Self {
            status: SolveStatus::MaxIterations,
            iterations,
            relative_residual,
        }
    }

    /// Whether the returned iterate satisfies the tolerance.
    #[inline]
    pub fn is_converged(&self) -> bool {
        self.status != SolveStatus::MaxIterations
    }

    /// Classic integer status: iteration count on convergence, `0` for a
    /// trivial solve, `-1` when the iteration cap was hit.
    pub fn code(&self) -> i64 {
        match self.status {
            SolveStatus::Trivial => 0,
            SolveStatus::Converged => self.iterations as i64,
            SolveStatus::MaxIterations => -1,
        }
    }
}

fn check_dims<A: LinearOperator + ?Sized>(a: &A, x: &DVector<f64>, b: &DVector<f64>) {
    assert_eq!(a.nrows(), b.len(), "Matrix-vector dimension mismatch");
    assert_eq!(a.ncols(), x.len(), "Solution dimension mismatch");
    assert_eq!(a.nrows(), a.ncols(), "Matrix must be square");
}

/// Solve A*x = b using the Conjugate Gradient method.
///
/// Requires A to be symmetric positive definite.
///
/// # Arguments
///
/// * `a` - The system matrix (must be symmetric positive definite)
/// * `x` - Initial guess on entry, last iterate on return
/// * `b` - The right-hand side vector
/// * `max_iter` - Maximum number of iterations
/// * `tolerance` - Convergence tolerance (relative residual norm)
pub fn conjugate_gradient<A: LinearOperator + ?Sized>(
    a: &A,
    x: &mut DVector<f64>,
    b: &DVector<f64>,
    max_iter: usize,
    tolerance: f64,
) -> SolveReport {
    check_dims(a, x, b);

    let b_norm = b.norm();
    if b_norm == 0.0 {
        x.fill(0.0);
        return SolveReport::trivial(0.0);
    }

    // r = b - A*x
    let mut r = b - a.apply(x);
    let mut rel = r.norm() / b_norm;
    if rel < tolerance {
        return SolveReport::trivial(rel);
    }

    let mut p = r.clone();
    let mut r_norm_sq = r.dot(&r);

    for iter in 1..=max_iter {
        let ap = a.apply(&p);

        // alpha = (r · r) / (p · Ap)
        let alpha = r_norm_sq / p.dot(&ap);

        x.axpy(alpha, &p, 1.0);
        r.axpy(-alpha, &ap, 1.0);

        rel = r.norm() / b_norm;
        if rel < tolerance {
            return SolveReport::converged(iter, rel);
        }

        // beta = (r_new · r_new) / (r_old · r_old)
        let new_r_norm_sq = r.dot(&r);
        let beta = new_r_norm_sq / r_norm_sq;
        r_norm_sq = new_r_norm_sq;

        // p = r + beta * p
        p.axpy(1.0, &r, beta);
    }

    SolveReport::exhausted(max_iter, rel)
}

/// Solve A*x = b using the Conjugate Residual method.
///
/// Requires A to be symmetric; unlike [`conjugate_gradient`] it tolerates
/// indefinite matrices. It minimizes the residual norm over the Krylov space,
/// so the residual decreases monotonically.
///
/// # Example
///
/// ```
/// use mfesmooth::linalg::{conjugate_residual, CsrMatrix};
/// use nalgebra::DVector;
///
/// let a = CsrMatrix::from_triplets(2, 2, vec![(0, 0, 4.0), (0, 1, 1.0), (1, 0, 1.0), (1, 1, 3.0)]);
/// let b = DVector::from_vec(vec![1.0, 2.0]);
/// let mut x = DVector::zeros(2);
///
/// let report = conjugate_residual(&a, &mut x, &b, 4000, 1e-10);
/// assert!(report.code() > 0);
/// assert!((x[0] - 1.0 / 11.0).abs() < 1e-8);
/// ```
pub fn conjugate_residual<A: LinearOperator + ?Sized>(
    a: &A,
    x: &mut DVector<f64>,
    b: &DVector<f64>,
    max_iter: usize,
    tolerance: f64,
) -> SolveReport {
    check_dims(a, x, b);

    let b_norm = b.norm();
    if b_norm == 0.0 {
        x.fill(0.0);
        return SolveReport::trivial(0.0);
    }

    let mut r = b - a.apply(x);
    let mut rel = r.norm() / b_norm;
    if rel < tolerance {
        return SolveReport::trivial(rel);
    }

    let mut p = r.clone();
    let mut ar = a.apply(&r);
    let mut ap = ar.clone();
    let mut r_ar = r.dot(&ar);

    for iter in 1..=max_iter {
        // alpha = (r · Ar) / (Ap · Ap)
        let alpha = r_ar / ap.dot(&ap);

        x.axpy(alpha, &p, 1.0);
        r.axpy(-alpha, &ap, 1.0);

        rel = r.norm() / b_norm;
        if rel < tolerance {
            return SolveReport::converged(iter, rel);
        }

        ar = a.apply(&r);
        let new_r_ar = r.dot(&ar);
        let beta = new_r_ar / r_ar;
        r_ar = new_r_ar;

        // p = r + beta * p, Ap = Ar + beta * Ap
        p.axpy(1.0, &r, beta);
        ap.axpy(1.0, &ar, beta);
    }

    SolveReport::exhausted(max_iter, rel)
}

/// Solve A*x = b using restarted GMRES(m).
///
/// Works for general non-symmetric matrices. The Arnoldi basis is rebuilt every
/// `restart` iterations; the least-squares problem is updated incrementally
/// with Givens rotations.
///
/// # Panics
///
/// Panics if `restart` is zero.
pub fn gmres<A: LinearOperator + ?Sized>(
    a: &A,
    x: &mut DVector<f64>,
    b: &DVector<f64>,
    restart: usize,
    max_iter: usize,
    tolerance: f64,
) -> SolveReport {
    check_dims(a, x, b);
    assert!(restart > 0, "GMRES restart length must be positive");

    let b_norm = b.norm();
    if b_norm == 0.0 {
        x.fill(0.0);
        return SolveReport::trivial(0.0);
    }

    let mut r = b - a.apply(x);
    let mut beta = r.norm();
    let mut rel = beta / b_norm;
    if rel < tolerance {
        return SolveReport::trivial(rel);
    }

    let m = restart;
    let mut iterations = 0;

    while iterations < max_iter {
        let mut basis: Vec<DVector<f64>> = Vec::with_capacity(m + 1);
        basis.push(&r / beta);

        let mut h = DMatrix::<f64>::zeros(m + 1, m);
        let mut s = DVector::<f64>::zeros(m + 1);
        s[0] = beta;
        let mut cs = vec![0.0; m];
        let mut sn = vec![0.0; m];

        let mut k = 0;
        while k < m && iterations < max_iter {
            iterations += 1;

            // Arnoldi step with modified Gram-Schmidt
            let mut w = a.apply(&basis[k]);
            for (i, v) in basis.iter().enumerate() {
                let hik = w.dot(v);
                h[(i, k)] = hik;
                w.axpy(-hik, v, 1.0);
            }
            let h_next = w.norm();
            h[(k + 1, k)] = h_next;
            basis.push(if h_next > 0.0 { w / h_next } else { w });

            for i in 0..k {
                apply_rotation(&mut h, i, k, cs[i], sn[i]);
            }
            let (c, sv) = givens(h[(k, k)], h[(k + 1, k)]);
            cs[k] = c;
            sn[k] = sv;
            apply_rotation(&mut h, k, k, c, sv);

            let sk = s[k];
            s[k] = c * sk + sv * s[k + 1];
            s[k + 1] = -sv * sk + c * s[k + 1];

            k += 1;
            rel = s[k].abs() / b_norm;
            if rel < tolerance {
                update_solution(x, &h, &s, &basis, k);
                return SolveReport::converged(iterations, rel);
            }
        }

        update_solution(x, &h, &s, &basis, k);
        r = b - a.apply(x);
        beta = r.norm();
        rel = beta / b_norm;
        if rel < tolerance {
            return SolveReport::converged(iterations, rel);
        }
    }

    SolveReport::exhausted(iterations, rel)
}

/// Rotation `(c, s)` that zeroes `dy` in the pair `(dx, dy)`.
fn givens(dx: f64, dy: f64) -> (f64, f64) {
    if dy == 0.0 {
        (1.0, 0.0)
    } else if dy.abs() > dx.abs() {
        let t = dx / dy;
        let s = 1.0 / (1.0 + t * t).sqrt();
        (t * s, s)
    } else {
        let t = dy / dx;
        let c = 1.0 / (1.0 + t * t).sqrt();
        (c, t * c)
    }
}

fn apply_rotation(h: &mut DMatrix<f64>, i: usize, col: usize, c: f64, s: f64) {
    let top = h[(i, col)];
    let bottom = h[(i + 1, col)];
    h[(i, col)] = c * top + s * bottom;
    h[(i + 1, col)] = -s * top + c * bottom;
}

/// x += V_k y, with y solving the k x k upper triangular system H y = s.
fn update_solution(
    x: &mut DVector<f64>,
    h: &DMatrix<f64>,
    s: &DVector<f64>,
    basis: &[DVector<f64>],
    k: usize,
) {
    let mut y = vec![0.0; k];
    for i in (0..k).rev() {
        let mut sum = s[i];
        for j in (i + 1)..k {
            sum -= h[(i, j)] * y[j];
        }
        y[i] = sum / h[(i, i)];
    }
    for (yi, v) in y.iter().zip(basis) {
        x.axpy(*yi, v, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::{CsrMatrix, SparseMatrix};

    fn spd_2x2() -> CsrMatrix {
        CsrMatrix::from_triplets(2, 2, vec![(0, 0, 4.0), (0, 1, 1.0), (1, 0, 1.0), (1, 1, 3.0)])
    }

    fn spd_4x4() -> CsrMatrix {
        // Symmetric, diagonally dominant
        let triplets = vec![
            (0, 0, 10.0),
            (0, 1, 1.0),
            (0, 2, 2.0),
            (1, 0, 1.0),
            (1, 1, 10.0),
            (1, 2, 1.0),
            (2, 0, 2.0),
            (2, 1, 1.0),
            (2, 2, 10.0),
            (2, 3, 1.0),
            (3, 2, 1.0),
            (3, 3, 10.0),
        ];
        CsrMatrix::from_triplets(4, 4, triplets)
    }

    #[test]
    fn test_cg_simple() {
        // Solution: x = 1/11, y = 7/11
        let a = spd_2x2();
        let b = DVector::from_vec(vec![1.0, 2.0]);
        let mut x = DVector::zeros(2);

        let report = conjugate_gradient(&a, &mut x, &b, 100, 1e-10);
        assert_eq!(report.status, SolveStatus::Converged);
        assert!(report.code() > 0);

        let residual = a.mul_vec(&x) - b;
        assert!(residual.norm() < 1e-8);
        assert!((x[0] - 1.0 / 11.0).abs() < 1e-8);
        assert!((x[1] - 7.0 / 11.0).abs() < 1e-8);
    }

    #[test]
    fn test_cg_larger_system() {
        let a = spd_4x4();
        let b = DVector::from_vec(vec![1.0, 2.0, 3.0, 4.0]);
        let mut x = DVector::zeros(4);

        let report = conjugate_gradient(&a, &mut x, &b, 100, 1e-10);
        assert!(report.is_converged());
        assert!((a.mul_vec(&x) - &b).norm() < 1e-8);
    }

    #[test]
    fn test_cr_simple() {
        let a = spd_2x2();
        let b = DVector::from_vec(vec![1.0, 2.0]);
        let mut x = DVector::zeros(2);

        let report = conjugate_residual(&a, &mut x, &b, 4000, 1e-5);
        assert_eq!(report.status, SolveStatus::Converged);
        assert!(report.iterations > 0 && report.iterations < 4000);
        assert!(report.relative_residual < 1e-5);
        assert!((a.mul_vec(&x) - &b).norm() / b.norm() < 1e-5);
        assert!((x[0] - 1.0 / 11.0).abs() < 1e-5);
        assert!((x[1] - 7.0 / 11.0).abs() < 1e-5);
    }

    #[test]
    fn test_cr_symmetric_indefinite() {
        // diag(2, -1, 3) coupled symmetrically
        let mut s: SparseMatrix = SparseMatrix::new(3, 3);
        s.add(0, 0, 2.0);
        s.add(1, 1, -1.0);
        s.add(2, 2, 3.0);
        s.add(0, 1, 0.5);
        s.add(1, 0, 0.5);
        let a = CsrMatrix::from_sparse(&s);
        let b = DVector::from_vec(vec![1.0, 1.0, 1.0]);
        let mut x = DVector::zeros(3);

        let report = conjugate_residual(&a, &mut x, &b, 100, 1e-10);
        assert!(report.is_converged());
        assert!((a.mul_vec(&x) - &b).norm() < 1e-8);
    }

    #[test]
    fn test_cr_on_assembly_format() {
        let mut s: SparseMatrix = SparseMatrix::new(2, 2);
        s.add(0, 0, 4.0);
        s.add(0, 1, 1.0);
        s.add(1, 0, 1.0);
        s.add(1, 1, 3.0);
        let b = DVector::from_vec(vec![1.0, 2.0]);
        let mut x = DVector::zeros(2);

        let report = conjugate_residual(&s, &mut x, &b, 100, 1e-10);
        assert!(report.is_converged());
        assert!((x[1] - 7.0 / 11.0).abs() < 1e-8);
    }

    #[test]
    fn test_zero_rhs_is_trivial() {
        let a = spd_2x2();
        let b = DVector::zeros(2);
        let mut x = DVector::from_vec(vec![3.0, -4.0]);

        let report = conjugate_residual(&a, &mut x, &b, 10, 1e-5);
        assert_eq!(report.status, SolveStatus::Trivial);
        assert_eq!(report.code(), 0);
        assert_eq!(x, DVector::zeros(2));

        let mut x = DVector::from_vec(vec![3.0, -4.0]);
        assert_eq!(conjugate_gradient(&a, &mut x, &b, 10, 1e-5).code(), 0);
    }

    #[test]
    fn test_exact_initial_guess_is_trivial() {
        let a = spd_2x2();
        let b = DVector::from_vec(vec![1.0, 2.0]);
        let mut x = DVector::from_vec(vec![1.0 / 11.0, 7.0 / 11.0]);

        let report = conjugate_residual(&a, &mut x, &b, 10, 1e-5);
        assert_eq!(report.code(), 0);
    }

    #[test]
    fn test_iteration_cap_reports_failure() {
        let a = spd_4x4();
        let b = DVector::from_vec(vec![1.0, 2.0, 3.0, 4.0]);
        let mut x = DVector::zeros(4);

        let report = conjugate_residual(&a, &mut x, &b, 1, 1e-14);
        assert_eq!(report.status, SolveStatus::MaxIterations);
        assert_eq!(report.code(), -1);
        // The last iterate is kept and is better than the zero guess.
        assert!((a.mul_vec(&x) - &b).norm() < b.norm());
    }

    #[test]
    fn test_gmres_nonsymmetric() {
        let a = DMatrix::from_row_slice(3, 3, &[4.0, 1.0, 0.0, -2.0, 5.0, 1.0, 0.5, 0.0, 3.0]);
        let b = DVector::from_vec(vec![1.0, 2.0, 3.0]);
        let mut x = DVector::zeros(3);

        let report = gmres(&a, &mut x, &b, 3, 50, 1e-12);
        assert!(report.is_converged());
        assert!((&a * &x - &b).norm() < 1e-9);
    }

    #[test]
    fn test_gmres_with_restarts() {
        let a = DMatrix::from_row_slice(
            4,
            4,
            &[
                5.0, 1.0, 0.0, 0.5, //
                -1.0, 6.0, 2.0, 0.0, //
                0.0, -2.0, 7.0, 1.0, //
                0.3, 0.0, -1.0, 4.0,
            ],
        );
        let b = DVector::from_vec(vec![1.0, -1.0, 2.0, 0.5]);
        let mut x = DVector::zeros(4);

        let report = gmres(&a, &mut x, &b, 2, 200, 1e-10);
        assert!(report.is_converged());
        assert!((&a * &x - &b).norm() / b.norm() < 1e-9);
    }
}
