//! Linear algebra kernel for the smoothing solver.
//!
//! Dense vectors and matrices are nalgebra's [`DVector`] and [`DMatrix`]. The
//! stiffness matrix is assembled into a row-wise [`SparseMatrix`] and then
//! compressed into a [`CsrMatrix`] for the iterative solvers in [`krylov`].
//!
//! # Solvers
//!
//! - [`conjugate_residual`]: symmetric systems (used by the smoother)
//! - [`conjugate_gradient`]: symmetric positive definite systems
//! - [`gmres`]: general systems
//! - [`tridiagonal_solve`]: direct solve for banded 1D problems

mod csr;
pub mod krylov;
mod sparse;
mod tridiagonal;

pub use csr::CsrMatrix;
pub use krylov::{conjugate_gradient, conjugate_residual, gmres, SolveReport, SolveStatus};
pub use sparse::{SparseMatrix, SparseVector};
pub use tridiagonal::tridiagonal_solve;

use nalgebra::{DMatrix, DVector};

/// A square-or-rectangular operator that can be applied to a vector.
///
/// The Krylov solvers only need matrix-vector products, so they accept any
/// implementor of this trait.
pub trait LinearOperator {
    /// Number of rows of the operator.
    fn nrows(&self) -> usize;

    /// Number of columns of the operator.
    fn ncols(&self) -> usize;

    /// Compute `A * x`.
    fn apply(&self, x: &DVector<f64>) -> DVector<f64>;
}

impl LinearOperator for CsrMatrix {
    fn nrows(&self) -> usize {
        CsrMatrix::nrows(self)
    }

    fn ncols(&self) -> usize {
        CsrMatrix::ncols(self)
    }

    fn apply(&self, x: &DVector<f64>) -> DVector<f64> {
        self.mul_vec(x)
    }
}

impl LinearOperator for SparseMatrix<f64> {
    fn nrows(&self) -> usize {
        SparseMatrix::nrows(self)
    }

    fn ncols(&self) -> usize {
        SparseMatrix::ncols(self)
    }

    fn apply(&self, x: &DVector<f64>) -> DVector<f64> {
        self.mul_vec(x)
    }
}

impl LinearOperator for DMatrix<f64> {
    fn nrows(&self) -> usize {
        self.shape().0
    }

    fn ncols(&self) -> usize {
        self.shape().1
    }

    fn apply(&self, x: &DVector<f64>) -> DVector<f64> {
        self * x
    }
}

/// Infinity norm of a dense vector (largest absolute entry, `0` when empty).
#[inline]
pub fn inf_norm(v: &DVector<f64>) -> f64 {
    if v.is_empty() {
        0.0
    } else {
        v.amax()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operators_agree() {
        let dense = DMatrix::from_row_slice(2, 3, &[1.0, 0.0, 2.0, 0.0, 3.0, 0.0]);
        let mut sparse: SparseMatrix = SparseMatrix::new(2, 3);
        sparse.set(0, 0, 1.0);
        sparse.set(0, 2, 2.0);
        sparse.set(1, 1, 3.0);
        let csr = CsrMatrix::from_sparse(&sparse);

        let x = DVector::from_vec(vec![1.0, 2.0, 3.0]);
        let expected = DVector::from_vec(vec![7.0, 6.0]);

        let ops: [&dyn LinearOperator; 3] = [&dense, &sparse, &csr];
        for op in ops {
            assert_eq!(op.nrows(), 2);
            assert_eq!(op.ncols(), 3);
            assert_eq!(op.apply(&x), expected);
        }
    }

    #[test]
    fn test_inf_norm() {
        assert_eq!(inf_norm(&DVector::from_vec(vec![1.0, -4.0, 2.0])), 4.0);
        assert_eq!(inf_norm(&DVector::zeros(0)), 0.0);
    }
}
