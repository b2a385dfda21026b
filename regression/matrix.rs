use alloc::vec::Vec;

use crate::RegressionError;

/// Row-major integer matrix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    values: Vec<i64>,
}

impl Matrix {
    pub fn new(rows: usize, cols: usize, values: Vec<i64>) -> Result<Self, RegressionError> {
        if rows == 0 || cols == 0 {
            return Err(RegressionError::Empty);
        }
        if rows.checked_mul(cols) != Some(values.len()) {
            return Err(RegressionError::Shape {
                rows,
                cols,
                len: values.len(),
            });
        }
        Ok(Self { rows, cols, values })
    }

    /// Builds a matrix from fixed-width rows
    pub fn from_rows<const N: usize>(rows: &[[i64; N]]) -> Result<Self, RegressionError> {
        let values = rows.iter().flat_map(|row| row.iter().copied()).collect();
        Self::new(rows.len(), N, values)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn values(&self) -> &[i64] {
        &self.values
    }

    pub fn get(&self, row: usize, col: usize) -> i64 {
        self.values[row * self.cols + col]
    }

    pub fn row(&self, row: usize) -> &[i64] {
        &self.values[row * self.cols..(row + 1) * self.cols]
    }
}

impl TryFrom<Vec<Vec<i64>>> for Matrix {
    type Error = RegressionError;

    fn try_from(rows: Vec<Vec<i64>>) -> Result<Self, Self::Error> {
        let cols = rows.first().map(Vec::len).unwrap_or(0);
        let mut values = Vec::with_capacity(rows.len() * cols);
        for (index, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(RegressionError::RaggedRow {
                    row: index,
                    expected: cols,
                    found: row.len(),
                });
            }
            values.extend_from_slice(row);
        }
        Self::new(rows.len(), cols, values)
    }
}
