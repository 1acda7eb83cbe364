// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

pub use super::fvm_shared_latest::address::{
    Address, BLS_PUB_LEN, Error, Payload, Protocol, SECP_PUB_LEN,
};

/// Builds a deterministic BLS address whose public key bytes are `n` encoded
/// big-endian into the head of an otherwise zeroed key. Useful for well-known
/// addresses that must exist before any wallet does.
pub fn bls_addr(n: u64) -> Result<Address, Error> {
    let mut key = [0u8; BLS_PUB_LEN];
    key[..8].copy_from_slice(&n.to_be_bytes());
    Address::new_bls(&key)
}

/// Returns `true` for addresses that are backed by a public key.
pub fn is_key_address(addr: &Address) -> bool {
    matches!(addr.protocol(), Protocol::Secp256k1 | Protocol::BLS)
}
