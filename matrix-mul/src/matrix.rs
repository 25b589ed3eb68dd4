//! Dense row-major matrix of `f64` values.

use std::ops::{Index, IndexMut};

use crate::Error;

/// A rectangular, dense matrix stored in row-major order.
///
/// Both dimensions are always greater than zero and the backing buffer holds
/// exactly `rows * cols` elements.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Creates a matrix from a row-major buffer.
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self, Error> {
        check_dimensions(rows, cols)?;
        if rows.checked_mul(cols) != Some(data.len()) {
            return Err(Error::InvalidDimensions { rows, cols });
        }
        Ok(Self { rows, cols, data })
    }

    /// Creates a zero-filled matrix.
    pub fn zeros(rows: usize, cols: usize) -> Result<Self, Error> {
        check_dimensions(rows, cols)?;
        let len = rows
            .checked_mul(cols)
            .ok_or(Error::InvalidDimensions { rows, cols })?;
        Ok(Self {
            rows,
            cols,
            data: vec![0.0; len],
        })
    }

    /// Creates the `n`x`n` identity matrix.
    pub fn identity(n: usize) -> Result<Self, Error> {
        let mut m = Self::zeros(n, n)?;
        for i in 0..n {
            m[(i, i)] = 1.0;
        }
        Ok(m)
    }

    /// Builds a matrix from nested rows. Every row must have the same length.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, Error> {
        let m = rows.len();
        let n = rows.first().map_or(0, |row| row.len());
        check_dimensions(m, n)?;

        let mut data = Vec::with_capacity(m * n);
        for row in rows {
            if row.len() != n {
                return Err(Error::InvalidDimensions { rows: m, cols: n });
            }
            data.extend(row);
        }
        Ok(Self {
            rows: m,
            cols: n,
            data,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Returns `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.rows && col < self.cols {
            Some(self.data[row * self.cols + col])
        } else {
            None
        }
    }

    /// Returns row `i` as a slice.
    ///
    /// # Panics
    ///
    /// Panics if `i >= self.rows()`.
    pub fn row(&self, i: usize) -> &[f64] {
        let start = i * self.cols;
        &self.data[start..start + self.cols]
    }

    pub fn row_mut(&mut self, i: usize) -> &mut [f64] {
        let start = i * self.cols;
        &mut self.data[start..start + self.cols]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks_exact(self.cols)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Converts into nested rows.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.iter_rows().map(<[f64]>::to_vec).collect()
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    fn index(&self, (row, col): (usize, usize)) -> &f64 {
        assert!(col < self.cols, "column {col} out of bounds");
        &self.data[row * self.cols + col]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut f64 {
        assert!(col < self.cols, "column {col} out of bounds");
        &mut self.data[row * self.cols + col]
    }
}

pub(crate) fn check_dimensions(rows: usize, cols: usize) -> Result<(), Error> {
    if rows == 0 || cols == 0 {
        return Err(Error::InvalidDimensions { rows, cols });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rows_is_row_major() {
        let m = Matrix::from_rows(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap();
        assert_eq!(m.shape(), (2, 3));
        assert_eq!(m.as_slice(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(m[(1, 0)], 4.0);
        assert_eq!(m.row(1), &[4.0, 5.0, 6.0]);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let err = Matrix::from_rows(vec![vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert!(matches!(err, Error::InvalidDimensions { rows: 2, cols: 2 }));
    }

    #[test]
    fn zero_dimensions_are_rejected() {
        assert!(Matrix::zeros(0, 3).is_err());
        assert!(Matrix::zeros(3, 0).is_err());
        assert!(Matrix::from_rows(Vec::new()).is_err());
        assert!(Matrix::new(2, 2, vec![1.0; 3]).is_err());
    }

    #[test]
    fn identity_has_ones_on_diagonal() {
        let id = Matrix::identity(3).unwrap();
        for i in 0..3 {
            for j in 0..3 {
                assert_eq!(id[(i, j)], if i == j { 1.0 } else { 0.0 });
            }
        }
    }

    #[test]
    fn get_is_bounds_checked() {
        let m = Matrix::zeros(2, 2).unwrap();
        assert_eq!(m.get(1, 1), Some(0.0));
        assert_eq!(m.get(2, 0), None);
        assert_eq!(m.get(0, 2), None);
    }
}
