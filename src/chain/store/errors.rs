// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use cid::Cid;
use thiserror::Error;

use crate::shim::state_tree;

/// Chain store error
#[derive(Debug, Error)]
pub enum Error {
    /// Root was never recorded in this store
    #[error("state root {0} is unknown to the chain store")]
    UnknownRoot(Cid),
    /// Error originating from the state tree
    #[error(transparent)]
    State(#[from] state_tree::Error),
}
