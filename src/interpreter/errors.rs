// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use thiserror::Error;

use crate::shim::{address::Address, state_tree};

/// Interpreter error. These are engine-level failures; actor-level failures
/// are reported through the receipt instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    #[error("execution context was cancelled")]
    Cancelled,

    #[error("actor {0} not found")]
    ActorNotFound(Address),

    #[error(transparent)]
    State(#[from] state_tree::Error),

    #[error(transparent)]
    Encoding(#[from] fvm_ipld_encoding::Error),

    #[error("failed to read state from the database: {0}")]
    Lookup(#[from] anyhow::Error),
}
