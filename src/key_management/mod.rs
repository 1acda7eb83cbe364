// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

mod errors;
mod keystore;
mod wallet;
pub mod wallet_helpers;

pub use errors::Error;
pub use keystore::{KeyInfo, KeyStore};
pub use wallet::{Key, Wallet};

use crate::shim::{address::Address, crypto::SignatureType};

/// Source of fresh externally-owned addresses.
pub trait KeyProvider {
    /// Generates a new key of type `typ` and returns its address. Every call
    /// yields a distinct address.
    fn generate_key(&mut self, typ: SignatureType) -> Result<Address, Error>;
}
