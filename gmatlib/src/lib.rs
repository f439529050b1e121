/// Contains the error types returned by fallible `Matrix` operations.
pub mod errors;

use std::ops::{Index, IndexMut, Mul};
use num_traits::{Float, Num};

use errors::{MatrixError, MatrixInversionError};

/// The pivot magnitude below which a column is considered singular during
/// Gauss-Jordan inversion.
const PIVOT_EPSILON: f64 = 1e-12;

/// A dense, row-major matrix of numeric elements.
///
/// `Matrix` owns its backing buffer outright; there is no separate "view"
/// type and no reference counting. Every operation that produces a new
/// matrix allocates a fresh buffer rather than aliasing an existing one.
#[derive(Clone, Debug, PartialEq)]
pub struct Matrix<T>
{
    rows: usize,
    cols: usize,
    elements: Vec<T>,
}

impl<T> Matrix<T>
where
    T: Num + Copy,
{
    /// Creates a new `rows` by `cols` matrix filled with zeroes.
    pub fn new(rows: usize, cols: usize) -> Matrix<T>
    {
        Matrix
        {
            rows,
            cols,
            elements: vec![T::zero(); rows * cols],
        }
    }

    /// Creates a new `n` by `n` identity matrix.
    pub fn new_identity(n: usize) -> Matrix<T>
    {
        let mut m = Matrix::new(n, n);
        for i in 0..n
        {
            m.elements[i * n + i] = T::one();
        }
        m
    }

    /// Builds a matrix from a flat, row-major `Vec` of elements.
    pub fn from_vec(rows: usize, elements: Vec<T>) -> anyhow::Result<Matrix<T>>
    {
        if elements.len() % rows != 0
        {
            return Err(MatrixError::DimensionMismatch(rows, elements.len() / rows.max(1), 0, 0).into());
        }
        let cols = elements.len() / rows;
        Ok(Matrix { rows, cols, elements })
    }

    /// Builds a single-column matrix (column vector) from a `Vec`.
    pub fn from_col_vec(elements: Vec<T>) -> Matrix<T>
    {
        Matrix
        {
            rows: elements.len(),
            cols: 1,
            elements,
        }
    }

    pub fn get_rows(&self) -> usize
    {
        self.rows
    }

    pub fn get_cols(&self) -> usize
    {
        self.cols
    }

    fn check_index(&self, i: usize, j: usize) -> anyhow::Result<()>
    {
        if i >= self.rows || j >= self.cols
        {
            return Err(MatrixError::IndexOutOfRange(i, j, self.rows, self.cols).into());
        }
        Ok(())
    }

    /// Reads the element at `(i, j)`, failing if either index is out of range.
    pub fn get(&self, i: usize, j: usize) -> anyhow::Result<T>
    {
        self.check_index(i, j)?;
        Ok(self.elements[i * self.cols + j])
    }

    /// Writes `value` to the element at `(i, j)`, failing if either index is out of range.
    pub fn set(&mut self, i: usize, j: usize, value: T) -> anyhow::Result<()>
    {
        self.check_index(i, j)?;
        self.elements[i * self.cols + j] = value;
        Ok(())
    }

    /// Swaps row `i` with row `k` in place.
    pub fn inplace_row_swap(&mut self, i: usize, k: usize) -> anyhow::Result<()>
    {
        self.check_index(i, 0)?;
        self.check_index(k, 0)?;
        for j in 0..self.cols
        {
            self.elements.swap(i * self.cols + j, k * self.cols + j);
        }
        Ok(())
    }

    /// Scales row `i` by `scalar` in place.
    pub fn inplace_row_scale(&mut self, i: usize, scalar: T) -> anyhow::Result<()>
    {
        self.check_index(i, 0)?;
        for j in 0..self.cols
        {
            self.elements[i * self.cols + j] = self.elements[i * self.cols + j] * scalar;
        }
        Ok(())
    }

    /// Adds row `k` onto row `i` in place: `row i <- row i + row k`.
    pub fn inplace_row_add(&mut self, i: usize, k: usize) -> anyhow::Result<()>
    {
        self.inplace_scaled_row_add(i, k, T::one())
    }

    /// Adds a scaled copy of row `k` onto row `i` in place: `row i <- row i + scalar * row k`.
    pub fn inplace_scaled_row_add(&mut self, i: usize, k: usize, scalar: T) -> anyhow::Result<()>
    {
        self.check_index(i, 0)?;
        self.check_index(k, 0)?;
        for j in 0..self.cols
        {
            let addend = self.elements[k * self.cols + j] * scalar;
            self.elements[i * self.cols + j] = self.elements[i * self.cols + j] + addend;
        }
        Ok(())
    }

    /// Scales every element of the matrix by `scalar` in place.
    pub fn inplace_scale(&mut self, scalar: T)
    {
        for e in self.elements.iter_mut()
        {
            *e = *e * scalar;
        }
    }

    /// Returns a new matrix that is the product of `self` and `other`.
    pub fn multiply_matrix(&self, other: &Matrix<T>) -> anyhow::Result<Matrix<T>>
    {
        if self.cols != other.rows
        {
            return Err(MatrixError::DimensionMismatch(self.rows, self.cols, other.rows, other.cols).into());
        }

        let mut result = Matrix::new(self.rows, other.cols);
        for i in 0..self.rows
        {
            for j in 0..other.cols
            {
                let mut sum = T::zero();
                for k in 0..self.cols
                {
                    sum = sum + self.elements[i * self.cols + k] * other.elements[k * other.cols + j];
                }
                result.elements[i * result.cols + j] = sum;
            }
        }
        Ok(result)
    }

    /// Returns a new matrix formed by placing the columns of `other` to the right of `self`'s.
    pub fn augment_with(&self, other: &Matrix<T>) -> anyhow::Result<Matrix<T>>
    {
        if self.rows != other.rows
        {
            return Err(MatrixError::AugmentRowMismatch(self.rows, other.rows).into());
        }

        let mut result = Matrix::new(self.rows, self.cols + other.cols);
        for i in 0..self.rows
        {
            for j in 0..self.cols
            {
                result.elements[i * result.cols + j] = self.elements[i * self.cols + j];
            }
            for j in 0..other.cols
            {
                result.elements[i * result.cols + self.cols + j] = other.elements[i * other.cols + j];
            }
        }
        Ok(result)
    }

    /// Returns the inclusive submatrix spanning rows `i1..=i2` and columns `j1..=j2`.
    pub fn subset(&self, i1: usize, j1: usize, i2: usize, j2: usize) -> anyhow::Result<Matrix<T>>
    {
        if i1 > i2 || j1 > j2 || i2 >= self.rows || j2 >= self.cols
        {
            return Err(MatrixError::InvalidSubsetRange(i1, j1, i2, j2).into());
        }

        let rows = i2 - i1 + 1;
        let cols = j2 - j1 + 1;
        let mut result = Matrix::new(rows, cols);
        for i in 0..rows
        {
            for j in 0..cols
            {
                result.elements[i * cols + j] = self.elements[(i1 + i) * self.cols + (j1 + j)];
            }
        }
        Ok(result)
    }

    /// Returns the transpose of this matrix as a new matrix.
    pub fn transpose(&self) -> Matrix<T>
    {
        let mut result = Matrix::new(self.cols, self.rows);
        for i in 0..self.rows
        {
            for j in 0..self.cols
            {
                result.elements[j * result.cols + i] = self.elements[i * self.cols + j];
            }
        }
        result
    }

    /// Returns the trace (sum of the diagonal) of a square matrix.
    ///
    /// Per `spec.md` this never panics: a non-square matrix simply yields `T::zero()`.
    pub fn trace(&self) -> T
    {
        if self.rows != self.cols
        {
            return T::zero();
        }
        let mut sum = T::zero();
        for i in 0..self.rows
        {
            sum = sum + self.elements[i * self.cols + i];
        }
        sum
    }

    /// Returns an iterator over the elements in row-major order.
    pub fn iter(&self) -> std::slice::Iter<'_, T>
    {
        self.elements.iter()
    }
}

impl<T> Matrix<T>
where
    T: Float,
{
    /// Inverts the matrix in place using Gauss-Jordan elimination on `[A | I]`
    /// with partial pivoting (largest `|value|` at or below the diagonal in
    /// the current column). Fails with `MatrixInversionError` if a pivot
    /// below `1e-12` is encountered.
    pub fn try_inplace_invert(&mut self) -> anyhow::Result<()>
    {
        if self.rows != self.cols
        {
            return Err(MatrixInversionError::NotSquare.into());
        }
        let n = self.rows;
        let epsilon = T::from(PIVOT_EPSILON).unwrap_or(T::epsilon());

        let mut augmented = self.augment_with(&Matrix::new_identity(n))?;

        for col in 0..n
        {
            // Partial pivot: find the largest-magnitude entry at or below the diagonal.
            let mut pivot_row = col;
            let mut pivot_val = augmented.elements[col * augmented.cols + col].abs();
            for row in (col + 1)..n
            {
                let candidate = augmented.elements[row * augmented.cols + col].abs();
                if candidate > pivot_val
                {
                    pivot_val = candidate;
                    pivot_row = row;
                }
            }

            if pivot_val < epsilon
            {
                return Err(MatrixInversionError::SingularValueWasZero.into());
            }

            if pivot_row != col
            {
                augmented.inplace_row_swap(col, pivot_row)?;
            }

            let pivot = augmented.elements[col * augmented.cols + col];
            augmented.inplace_row_scale(col, T::one() / pivot)?;

            for row in 0..n
            {
                if row == col
                {
                    continue;
                }
                let factor = augmented.elements[row * augmented.cols + col];
                if factor != T::zero()
                {
                    augmented.inplace_scaled_row_add(row, col, -factor)?;
                }
            }
        }

        // Verify the left half settled to the identity; a near-zero diagonal
        // entry here means elimination left a degenerate row behind.
        for i in 0..n
        {
            if augmented.elements[i * augmented.cols + i].abs() < epsilon
            {
                return Err(MatrixInversionError::ZeroDuringInversion.into());
            }
        }

        self.elements = augmented.subset(0, n, n - 1, 2 * n - 1)?.elements;
        Ok(())
    }
}

impl<T> Index<(usize, usize)> for Matrix<T>
{
    type Output = T;

    fn index(&self, (i, j): (usize, usize)) -> &T
    {
        &self.elements[i * self.cols + j]
    }
}

impl<T> IndexMut<(usize, usize)> for Matrix<T>
{
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut T
    {
        &mut self.elements[i * self.cols + j]
    }
}

impl<T> Mul for Matrix<T>
where
    T: Num + Copy,
{
    type Output = Matrix<T>;

    fn mul(self, rhs: Matrix<T>) -> Matrix<T>
    {
        self.multiply_matrix(&rhs).expect("dimension mismatch in Matrix * Matrix")
    }
}

impl<T> From<Matrix<T>> for Vec<T>
{
    fn from(m: Matrix<T>) -> Vec<T>
    {
        m.elements
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn identity_is_its_own_transpose()
    {
        let i = Matrix::<f64>::new_identity(4);
        assert_eq!(i.transpose(), i);
    }

    #[test]
    fn transpose_is_involutive()
    {
        let a = Matrix::from_vec(2, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        assert_eq!(a.transpose().transpose(), a);
    }

    #[test]
    fn identity_multiply_is_identity()
    {
        let a = Matrix::from_vec(2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let i = Matrix::<f64>::new_identity(2);
        assert_eq!(a.multiply_matrix(&i).unwrap(), a);
    }

    #[test]
    fn augment_dimensions()
    {
        let a = Matrix::<f64>::new(3, 2);
        let b = Matrix::<f64>::new(3, 4);
        let ab = a.augment_with(&b).unwrap();
        assert_eq!(ab.get_cols(), 6);
        assert_eq!(ab.get_rows(), 3);
    }

    #[test]
    fn augment_fails_on_row_mismatch()
    {
        let a = Matrix::<f64>::new(3, 2);
        let b = Matrix::<f64>::new(2, 2);
        assert!(a.augment_with(&b).is_err());
    }

    #[test]
    fn invert_recovers_identity()
    {
        let mut a = Matrix::from_vec(2, vec![4.0, 7.0, 2.0, 6.0]).unwrap();
        let original = a.clone();
        a.try_inplace_invert().unwrap();

        let product = original.multiply_matrix(&a).unwrap();
        let id = Matrix::<f64>::new_identity(2);
        for i in 0..2
        {
            for j in 0..2
            {
                assert!((product[(i, j)] - id[(i, j)]).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn singular_matrix_fails_to_invert()
    {
        let mut a = Matrix::from_vec(2, vec![1.0, 2.0, 2.0, 4.0]).unwrap();
        assert!(a.try_inplace_invert().is_err());
    }

    #[test]
    fn trace_of_non_square_is_zero_not_panic()
    {
        let a = Matrix::<f64>::new(2, 3);
        assert_eq!(a.trace(), 0.0);
    }

    #[test]
    fn index_out_of_range_fails_cleanly()
    {
        let a = Matrix::<f64>::new(2, 2);
        assert!(a.get(5, 0).is_err());
    }

    #[test]
    fn subset_extracts_inclusive_range()
    {
        let a = Matrix::from_vec(3, vec![
            1.0, 2.0, 3.0,
            4.0, 5.0, 6.0,
            7.0, 8.0, 9.0,
        ]).unwrap();

        let s = a.subset(0, 0, 1, 1).unwrap();
        assert_eq!(s.get_rows(), 2);
        assert_eq!(s.get_cols(), 2);
        assert_eq!(s[(1, 1)], 5.0);
    }
}
