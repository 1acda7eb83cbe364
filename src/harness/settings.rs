// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::path::Path;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::shim::{ChainEpoch, crypto::SignatureType};
use crate::utils::io::read_toml;

/// Balance the default miner is funded with at genesis.
pub const HARNESS_MINER_FUNDS: u64 = 1_000_000;

/// Tunables for a harness run. Every field has a default, so a settings file
/// only needs to name what it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, smart_default::SmartDefault)]
#[serde(default)]
pub struct HarnessSettings {
    /// Genesis balance of the default miner, in attoFIL.
    #[default(HARNESS_MINER_FUNDS)]
    pub miner_funds: u64,
    /// Key type requested when an option needs a fresh address.
    pub key_type: SignatureType,
    #[default(1)]
    pub gas_price: u64,
    #[default(1)]
    pub gas_limit: u64,
    /// Seed for key generation. Unset means OS randomness.
    pub rng_seed: Option<u64>,
    /// Epoch the engine is constructed at.
    #[default(1)]
    pub epoch: ChainEpoch,
}

impl HarnessSettings {
    pub fn from_toml(toml: &str) -> anyhow::Result<Self> {
        read_toml(toml)
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read harness settings {}", path.display()))?;
        Self::from_toml(&raw)
            .with_context(|| format!("failed to parse harness settings {}", path.display()))
    }
}
