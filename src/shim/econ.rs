// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

pub use super::fvm_shared_latest::econ::TokenAmount;
use num_traits::Signed as _;

/// Shorthand for an attoFIL amount, the unit every harness balance is given in.
pub fn atto(value: u64) -> TokenAmount {
    TokenAmount::from_atto(value)
}

pub fn is_negative(amount: &TokenAmount) -> bool {
    amount.atto().is_negative()
}
