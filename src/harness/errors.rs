// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use thiserror::Error;

use crate::shim::{address::Address, econ::TokenAmount, error::ExitCode};
use crate::{chain, interpreter, key_management};

/// Harness error. Everything except [`Error::BalanceMismatch`] means the
/// fixture itself is broken.
#[derive(Debug, Error)]
pub enum Error {
    #[error("precondition violated: {0}")]
    Precondition(String),

    #[error("key generation failed: {0}")]
    KeyGeneration(#[from] key_management::Error),

    #[error("failed to build genesis state: {0:#}")]
    Genesis(anyhow::Error),

    #[error("execution engine failure: {0}")]
    Engine(#[from] interpreter::Error),

    #[error("failed to serialize params: {0}")]
    Serialization(#[from] fvm_ipld_encoding::Error),

    #[error("failed to reload state: {0}")]
    Store(#[from] chain::Error),

    #[error("creating actor: exit code {exit_code}: {reason}")]
    ActorCreation { exit_code: ExitCode, reason: String },

    #[error("balance of {address} is {actual}, expected {expected}")]
    BalanceMismatch {
        address: Address,
        expected: TokenAmount,
        actual: TokenAmount,
    },
}
