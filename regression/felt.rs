//! Signed integers as Miden field elements, and the call payload layout.
//!
//! A value `v` is stored as `v` when non-negative and as `p - |v|` otherwise,
//! so field negation and integer negation agree. The payload carried by the
//! call note is `[rows, cols, a(0,0) .. a(r-1,c-1), b(0) .. b(r-1)]`.

use alloc::vec::Vec;

use crate::{Matrix, RegressionError};

/// Order of the Miden base field, `2^64 - 2^32 + 1`
pub const MODULUS: u64 = 0xFFFF_FFFF_0000_0001;

/// Note input limit of the Miden protocol
pub const MAX_CALL_INPUTS: usize = 128;

const HALF: u64 = (MODULUS - 1) / 2;

pub fn encode_felt(value: i64) -> Result<u64, RegressionError> {
    let magnitude = value.unsigned_abs();
    if magnitude > HALF {
        return Err(RegressionError::OutOfRange(value));
    }
    Ok(if value < 0 { MODULUS - magnitude } else { magnitude })
}

pub fn decode_felt(element: u64) -> Result<i64, RegressionError> {
    if element >= MODULUS {
        return Err(RegressionError::NonCanonical(element));
    }
    // HALF < 2^63, so both branches fit in i64
    Ok(if element > HALF {
        -((MODULUS - element) as i64)
    } else {
        element as i64
    })
}

pub fn encode_call(a: &Matrix, b: &[i64]) -> Result<Vec<u64>, RegressionError> {
    if b.len() != a.rows() {
        return Err(RegressionError::VectorLength {
            rows: a.rows(),
            len: b.len(),
        });
    }
    let len = 2 + a.values().len() + b.len();
    if len > MAX_CALL_INPUTS {
        return Err(RegressionError::PayloadTooLarge {
            len,
            max: MAX_CALL_INPUTS,
        });
    }

    let mut payload = Vec::with_capacity(len);
    payload.push(a.rows() as u64);
    payload.push(a.cols() as u64);
    for &value in a.values().iter().chain(b) {
        payload.push(encode_felt(value)?);
    }
    Ok(payload)
}

pub fn decode_call(payload: &[u64]) -> Result<(Matrix, Vec<i64>), RegressionError> {
    let [rows, cols, body @ ..] = payload else {
        return Err(RegressionError::Truncated {
            expected: 2,
            found: payload.len(),
        });
    };
    let (rows, cols) = (*rows as usize, *cols as usize);
    let cells = rows.checked_mul(cols).ok_or(RegressionError::Overflow)?;
    let expected = cells.checked_add(rows).ok_or(RegressionError::Overflow)?;
    if body.len() < expected {
        return Err(RegressionError::Truncated {
            expected: expected + 2,
            found: payload.len(),
        });
    }

    let values = body[..cells]
        .iter()
        .map(|&e| decode_felt(e))
        .collect::<Result<Vec<_>, _>>()?;
    let vector = body[cells..expected]
        .iter()
        .map(|&e| decode_felt(e))
        .collect::<Result<Vec<_>, _>>()?;
    Ok((Matrix::new(rows, cols, values)?, vector))
}
