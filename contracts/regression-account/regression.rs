// Do not link against libstd (i.e. anything defined in `std::`)
#![no_std]
#![feature(alloc_error_handler)]

extern crate alloc;

use alloc::vec::Vec;

use miden::*;
use regression::{decode_call, encode_felt, multiple_linear_regression};

/// Regression account component
///
/// Fits the observations carried by the note that calls it and keeps the
/// fixed-point coefficients in storage.
#[component]
struct RegressionAccount {
    #[storage(slot(0), description = "fitted coefficients, keyed by column index")]
    coefficients: StorageMap,
}

fn coefficient_key(index: Felt) -> Word {
    Word::from([felt!(0), felt!(0), felt!(0), index])
}

/// Holds the number of coefficients last written
fn count_key() -> Word {
    Word::from([felt!(0), felt!(0), felt!(1), felt!(0)])
}

#[component]
impl RegressionAccount {
    /// Solves `b ≈ a · beta` for the payload `[rows, cols, a.., b..]` of the
    /// active note. Aborts the transaction on malformed or singular input.
    pub fn multiple_linear_regression(&self) -> Felt {
        let payload: Vec<u64> = note::get_inputs().iter().map(|e| e.as_u64()).collect();
        let (a, b) = match decode_call(&payload) {
            Ok(call) => call,
            Err(_) => panic!("malformed regression payload"),
        };
        let beta = match multiple_linear_regression(&a, &b) {
            Ok(beta) => beta,
            Err(_) => panic!("regression has no unique solution"),
        };

        for (index, value) in beta.scaled().iter().enumerate() {
            let encoded = match encode_felt(*value) {
                Ok(encoded) => encoded,
                Err(_) => panic!("coefficient out of field range"),
            };
            let key = coefficient_key(Felt::from_u32(index as u32));
            self.coefficients.set(key, Felt::from_u64_unchecked(encoded));
        }
        let count = Felt::from_u32(beta.len() as u32);
        self.coefficients.set(count_key(), count);
        count
    }

    pub fn get_coefficient(&self, index: Felt) -> Felt {
        self.coefficients.get(&coefficient_key(index))
    }
}
