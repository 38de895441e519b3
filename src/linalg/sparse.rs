//! Row-oriented sparse vectors and matrices used during assembly.
//!
//! A [`SparseVector`] is an association list of `(index, value)` pairs kept in
//! insertion order. Reads never change the structure: [`SparseVector::get`]
//! returns zero for a missing index. Writers that are about to accumulate into
//! an entry use [`SparseVector::get_or_insert`], which materializes a zero entry
//! on first access.
//!
//! A [`SparseMatrix`] is an array of sparse rows. It is cheap to write into at
//! random positions, which makes it the assembly format; once assembled it can
//! be compressed into a [`CsrMatrix`](super::CsrMatrix) for repeated products.

use nalgebra::{DVector, RealField};

/// Sparse vector stored as an association list.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseVector<T: RealField + Copy = f64> {
    entries: Vec<(usize, T)>,
}

impl<T: RealField + Copy> Default for SparseVector<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: RealField + Copy> SparseVector<T> {
    /// Create an empty sparse vector.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Create an empty sparse vector with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Number of stored entries (including explicit zeros).
    #[inline]
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entry is stored.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Value at `index`, zero if no entry is stored.
    pub fn get(&self, index: usize) -> T {
        self.entries
            .iter()
            .find(|(i, _)| *i == index)
            .map(|&(_, v)| v)
            .unwrap_or_else(T::zero)
    }

    /// Whether an entry is stored at `index`.
    pub fn contains(&self, index: usize) -> bool {
        self.entries.iter().any(|(i, _)| *i == index)
    }

    /// Mutable access to the entry at `index`, inserting a zero if missing.
    pub fn get_or_insert(&mut self, index: usize) -> &mut T {
        let pos = match self.entries.iter().position(|(i, _)| *i == index) {
            Some(pos) => pos,
            None => {
                self.entries.push((index, T::zero()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[pos].1
    }

    /// Store `value` at `index`, replacing any previous value.
    #[inline]
    pub fn set(&mut self, index: usize, value: T) {
        *self.get_or_insert(index) = value;
    }

    /// Add `value` to the entry at `index`.
    #[inline]
    pub fn add(&mut self, index: usize, value: T) {
        *self.get_or_insert(index) += value;
    }

    /// Iterate over stored `(index, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, T)> + '_ {
        self.entries.iter().copied()
    }

    /// Inner product with a dense vector.
    pub fn dot(&self, x: &DVector<T>) -> T {
        let mut sum = T::zero();
        for &(i, v) in &self.entries {
            sum += v * x[i];
        }
        sum
    }

    /// Remove all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Sparse matrix stored as an array of [`SparseVector`] rows.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseMatrix<T: RealField + Copy = f64> {
    ncols: usize,
    rows: Vec<SparseVector<T>>,
}

impl<T: RealField + Copy> SparseMatrix<T> {
    /// Create an all-zero `nrows x ncols` matrix.
    pub fn new(nrows: usize, ncols: usize) -> Self {
        Self {
            ncols,
            rows: vec![SparseVector::new(); nrows],
        }
    }

    /// Get the number of rows.
    #[inline]
    pub fn nrows(&self) -> usize {
        self.rows.len()
    }

    /// Get the number of columns.
    #[inline]
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Get the number of stored entries.
    pub fn nnz(&self) -> usize {
        self.rows.iter().map(SparseVector::nnz).sum()
    }

    /// Borrow a row.
    #[inline]
    pub fn row(&self, r: usize) -> &SparseVector<T> {
        &self.rows[r]
    }

    /// Mutably borrow a row.
    #[inline]
    pub fn row_mut(&mut self, r: usize) -> &mut SparseVector<T> {
        &mut self.rows[r]
    }

    /// Value at `(r, c)`, zero if not stored.
    #[inline]
    pub fn get(&self, r: usize, c: usize) -> T {
        debug_assert!(c < self.ncols, "column {} out of range", c);
        self.rows[r].get(c)
    }

    /// Mutable access to `(r, c)`, inserting a zero if missing.
    #[inline]
    pub fn entry(&mut self, r: usize, c: usize) -> &mut T {
        debug_assert!(c < self.ncols, "column {} out of range", c);
        self.rows[r].get_or_insert(c)
    }

    /// Store `value` at `(r, c)`.
    #[inline]
    pub fn set(&mut self, r: usize, c: usize, value: T) {
        *self.entry(r, c) = value;
    }

    /// Add `value` to `(r, c)`.
    #[inline]
    pub fn add(&mut self, r: usize, c: usize, value: T) {
        *self.entry(r, c) += value;
    }

    /// Iterate over rows.
    pub fn rows(&self) -> impl Iterator<Item = &SparseVector<T>> + '_ {
        self.rows.iter()
    }

    /// Multiply matrix by vector: y = A * x.
    pub fn mul_vec(&self, x: &DVector<T>) -> DVector<T> {
        assert_eq!(x.len(), self.ncols, "Vector dimension mismatch");

        let mut y = DVector::zeros(self.rows.len());
        for (i, row) in self.rows.iter().enumerate() {
            y[i] = row.dot(x);
        }
        y
    }
}
