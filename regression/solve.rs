use alloc::vec::Vec;
use core::fmt;

use crate::{Matrix, RegressionError};

/// Fixed-point scale of every coefficient (six decimal places)
pub const SCALE: i64 = 1_000_000;

/// Regression coefficients, one per matrix column, scaled by [`SCALE`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coefficients(Vec<i64>);

impl Coefficients {
    pub fn from_scaled(values: Vec<i64>) -> Self {
        Self(values)
    }

    pub fn scaled(&self) -> &[i64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Coefficients {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scale = SCALE.unsigned_abs();
        f.write_str("[")?;
        for (index, value) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            let sign = if *value < 0 { "-" } else { "" };
            let magnitude = value.unsigned_abs();
            write!(f, "{sign}{}.{:06}", magnitude / scale, magnitude % scale)?;
        }
        f.write_str("]")
    }
}

/// Ordinary least squares fit of `b ≈ a · beta`.
///
/// Solves the normal equations `aᵀa · beta = aᵀb` exactly over the integers
/// (Cramer's rule on fraction-free determinants) and truncates each
/// coefficient toward zero at [`SCALE`].
pub fn multiple_linear_regression(a: &Matrix, b: &[i64]) -> Result<Coefficients, RegressionError> {
    let (rows, cols) = (a.rows(), a.cols());
    if b.len() != rows {
        return Err(RegressionError::VectorLength { rows, len: b.len() });
    }
    if rows < cols {
        return Err(RegressionError::Underdetermined { rows, cols });
    }

    let (gram, moment) = normal_equations(a, b)?;
    let det = determinant(gram.clone(), cols)?;
    if det == 0 {
        return Err(RegressionError::Singular);
    }

    let mut beta = Vec::with_capacity(cols);
    for col in 0..cols {
        let mut replaced = gram.clone();
        for row in 0..cols {
            replaced[row * cols + col] = moment[row];
        }
        let det_col = determinant(replaced, cols)?;
        let scaled = det_col
            .checked_mul(i128::from(SCALE))
            .ok_or(RegressionError::Overflow)?
            / det;
        beta.push(i64::try_from(scaled).map_err(|_| RegressionError::Overflow)?);
    }
    Ok(Coefficients(beta))
}

/// Returns `aᵀa` (row-major, `cols x cols`) and `aᵀb`
fn normal_equations(a: &Matrix, b: &[i64]) -> Result<(Vec<i128>, Vec<i128>), RegressionError> {
    let cols = a.cols();
    let mut gram = alloc::vec![0i128; cols * cols];
    let mut moment = alloc::vec![0i128; cols];

    for (row, &target) in b.iter().enumerate() {
        let values = a.row(row);
        for i in 0..cols {
            let x_i = i128::from(values[i]);
            moment[i] = x_i
                .checked_mul(i128::from(target))
                .and_then(|v| v.checked_add(moment[i]))
                .ok_or(RegressionError::Overflow)?;
            for j in 0..cols {
                let cell = &mut gram[i * cols + j];
                *cell = x_i
                    .checked_mul(i128::from(values[j]))
                    .and_then(|v| v.checked_add(*cell))
                    .ok_or(RegressionError::Overflow)?;
            }
        }
    }
    Ok((gram, moment))
}

/// Bareiss elimination; every intermediate division is exact.
fn determinant(mut m: Vec<i128>, n: usize) -> Result<i128, RegressionError> {
    let mut sign = 1i128;
    let mut previous = 1i128;

    for k in 0..n.saturating_sub(1) {
        if m[k * n + k] == 0 {
            match (k + 1..n).find(|&r| m[r * n + k] != 0) {
                Some(r) => {
                    for c in 0..n {
                        m.swap(k * n + c, r * n + c);
                    }
                    sign = -sign;
                }
                None => return Ok(0),
            }
        }
        let pivot = m[k * n + k];
        for i in k + 1..n {
            for j in k + 1..n {
                let lhs = m[i * n + j].checked_mul(pivot);
                let rhs = m[i * n + k].checked_mul(m[k * n + j]);
                let value = lhs
                    .zip(rhs)
                    .and_then(|(l, r)| l.checked_sub(r))
                    .ok_or(RegressionError::Overflow)?;
                m[i * n + j] = value / previous;
            }
            m[i * n + k] = 0;
        }
        previous = pivot;
    }
    Ok(sign * m[n * n - 1])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Matrix, Vec<i64>) {
        let a = Matrix::from_rows(&[[43, 1], [21, 1], [25, 1], [42, 1], [57, 1], [59, 1]]).unwrap();
        (a, vec![99, 65, 79, 75, 87, 81])
    }

    #[test]
    fn fits_the_sample_observations() {
        let (a, b) = sample();
        let beta = multiple_linear_regression(&a, &b).unwrap();
        // slope 2868/7445, intercept 484979/7445
        assert_eq!(beta.scaled(), &[385_224, 65_141_571]);
        assert_eq!(beta.to_string(), "[0.385224, 65.141571]");
    }

    #[test]
    fn recovers_an_exact_plane() {
        // b = 2*x - 3*y + 7
        let a = Matrix::from_rows(&[[1, 0, 1], [0, 1, 1], [2, 5, 1], [4, 1, 1]]).unwrap();
        let b: Vec<i64> = (0..a.rows())
            .map(|r| 2 * a.get(r, 0) - 3 * a.get(r, 1) + 7)
            .collect();
        let beta = multiple_linear_regression(&a, &b).unwrap();
        assert_eq!(beta.scaled(), &[2 * SCALE, -3 * SCALE, 7 * SCALE]);
        assert_eq!(beta.to_string(), "[2.000000, -3.000000, 7.000000]");
    }

    #[test]
    fn pivots_past_a_zero_leading_entry() {
        let a = Matrix::from_rows(&[[0, 1], [1, 0]]).unwrap();
        assert_eq!(determinant(vec![0, 1, 1, 0], 2), Ok(-1));
        let beta = multiple_linear_regression(&a, &[5, -4]).unwrap();
        assert_eq!(beta.scaled(), &[-4 * SCALE, 5 * SCALE]);
    }

    #[test]
    fn negative_fractions_truncate_toward_zero() {
        // single column: beta = Σxy / Σx² = -1/3
        let a = Matrix::from_rows(&[[3]]).unwrap();
        let beta = multiple_linear_regression(&a, &[-1]).unwrap();
        assert_eq!(beta.scaled(), &[-333_333]);
        assert_eq!(beta.to_string(), "[-0.333333]");
    }

    #[test]
    fn collinear_columns_are_singular() {
        let a = Matrix::from_rows(&[[1, 2], [2, 4], [3, 6]]).unwrap();
        assert_eq!(
            multiple_linear_regression(&a, &[1, 2, 3]),
            Err(RegressionError::Singular)
        );
    }

    #[test]
    fn rejects_mismatched_and_underdetermined_inputs() {
        let (a, _) = sample();
        assert_eq!(
            multiple_linear_regression(&a, &[1, 2]),
            Err(RegressionError::VectorLength { rows: 6, len: 2 })
        );

        let wide = Matrix::from_rows(&[[1, 2, 3]]).unwrap();
        assert_eq!(
            multiple_linear_regression(&wide, &[1]),
            Err(RegressionError::Underdetermined { rows: 1, cols: 3 })
        );
    }

    #[test]
    fn reports_overflow_instead_of_wrapping() {
        let a = Matrix::from_rows(&[[i64::MAX], [i64::MAX], [i64::MAX]]).unwrap();
        assert_eq!(
            multiple_linear_regression(&a, &[i64::MAX, i64::MAX, i64::MAX]),
            Err(RegressionError::Overflow)
        );
    }
}
