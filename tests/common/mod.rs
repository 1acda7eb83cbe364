// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

use actor_harness::db::MemoryDB;
use actor_harness::interpreter::{self, ExecutionContext, ExecutionEngine, VM};
use actor_harness::shim::{
    ChainEpoch, address::Address, econ::TokenAmount, executor::ApplyRet, message::Message,
};
use cid::Cid;

/// Wraps the reference VM, counting `apply_message` calls and failing the
/// first `fail_first` of them with an engine-level error.
pub struct CountingEngine {
    inner: VM<MemoryDB>,
    calls: Rc<Cell<usize>>,
    fail_first: usize,
}

impl ExecutionEngine for CountingEngine {
    fn apply_message(
        &mut self,
        ctx: &ExecutionContext,
        msg: &Message,
    ) -> Result<ApplyRet, interpreter::Error> {
        let call = self.calls.get() + 1;
        self.calls.set(call);
        if call <= self.fail_first {
            return Err(interpreter::Error::Lookup(anyhow::anyhow!(
                "engine unavailable"
            )));
        }
        self.inner.apply_message(ctx, msg)
    }

    fn flush(&mut self, ctx: &ExecutionContext) -> Result<Cid, interpreter::Error> {
        ExecutionEngine::flush(&mut self.inner, ctx)
    }

    fn actor_balance(&self, addr: &Address) -> Result<TokenAmount, interpreter::Error> {
        self.inner.actor_balance(addr)
    }
}

/// Factory for [`actor_harness::Harness::new_with_engine`] plus the shared
/// call counter.
#[allow(clippy::type_complexity)]
pub fn counting_engine(
    fail_first: usize,
) -> (
    Rc<Cell<usize>>,
    impl FnOnce(
        &Cid,
        Arc<MemoryDB>,
        ChainEpoch,
        Address,
    ) -> Result<Box<dyn ExecutionEngine>, interpreter::Error>,
) {
    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    let factory = move |root: &Cid,
                        store: Arc<MemoryDB>,
                        epoch: ChainEpoch,
                        miner: Address|
          -> Result<Box<dyn ExecutionEngine>, interpreter::Error> {
        Ok(Box::new(CountingEngine {
            inner: VM::new(root, store, epoch, miner)?,
            calls: counter,
            fail_first,
        }))
    };
    (calls, factory)
}
