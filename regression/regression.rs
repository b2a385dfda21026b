//! Fixed-point multiple linear regression shared by the regression contract
//! and the host-side deploy scripts.
//!
//! Everything here is `no_std` so the same code runs inside the Miden
//! account component and natively in tests.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

mod felt;
mod matrix;
mod solve;

pub use felt::{decode_call, decode_felt, encode_call, encode_felt, MAX_CALL_INPUTS, MODULUS};
pub use matrix::Matrix;
pub use solve::{multiple_linear_regression, Coefficients, SCALE};

/// Errors raised while building, encoding or solving a regression problem
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RegressionError {
    #[error("matrix has no rows or no columns")]
    Empty,
    #[error("row {row} has {found} columns, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("matrix of {rows}x{cols} cannot hold {len} values")]
    Shape { rows: usize, cols: usize, len: usize },
    #[error("vector has {len} entries but the matrix has {rows} rows")]
    VectorLength { rows: usize, len: usize },
    #[error("{rows} observations cannot determine {cols} coefficients")]
    Underdetermined { rows: usize, cols: usize },
    #[error("normal equations are singular")]
    Singular,
    #[error("arithmetic overflow while solving")]
    Overflow,
    #[error("value {0} does not fit in a field element")]
    OutOfRange(i64),
    #[error("{0} is not a canonical field element")]
    NonCanonical(u64),
    #[error("call payload of {len} elements exceeds the limit of {max}")]
    PayloadTooLarge { len: usize, max: usize },
    #[error("call payload is truncated: expected {expected} elements, found {found}")]
    Truncated { expected: usize, found: usize },
}
