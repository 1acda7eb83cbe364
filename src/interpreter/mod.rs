// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

mod errors;
mod vm;

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use cid::Cid;

use crate::shim::{
    ChainEpoch,
    address::Address,
    econ::TokenAmount,
    executor::ApplyRet,
    message::Message,
    version::{DEFAULT_NETWORK_VERSION, NetworkVersion},
};

pub use self::{errors::Error, vm::*};

/// Ambient parameters every engine call runs under.
///
/// Clones share the cancellation flag.
#[derive(Clone, Debug)]
pub struct ExecutionContext {
    pub epoch: ChainEpoch,
    pub network_version: NetworkVersion,
    cancelled: Arc<AtomicBool>,
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new(0)
    }
}

impl ExecutionContext {
    pub fn new(epoch: ChainEpoch) -> Self {
        Self {
            epoch,
            network_version: DEFAULT_NETWORK_VERSION,
            cancelled: Arc::default(),
        }
    }

    pub fn with_network_version(mut self, network_version: NetworkVersion) -> Self {
        self.network_version = network_version;
        self
    }

    /// Cancels this context and every clone of it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Applies messages against a state and persists the outcome.
pub trait ExecutionEngine {
    /// Applies a single message. `Err` means the message could not be applied
    /// at all; actor failures are reported in the returned receipt.
    fn apply_message(&mut self, ctx: &ExecutionContext, msg: &Message) -> Result<ApplyRet, Error>;

    /// Persists pending state and returns the new state root.
    fn flush(&mut self, ctx: &ExecutionContext) -> Result<Cid, Error>;

    /// Balance of the actor at `addr` in the engine's live state.
    fn actor_balance(&self, addr: &Address) -> Result<TokenAmount, Error>;
}
