// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Deterministic fixture for driving messages through an execution engine.
//!
//! A [`Harness`] is built in two stages. Options valid in [`Stage::PreInit`]
//! shape the genesis funding and the miner; the genesis state is then built,
//! the engine is constructed over it and the harness moves to
//! [`Stage::PostInit`], where the remaining options (actor creation) run
//! against the live engine. After construction, tests apply messages and
//! assert on balances.
//!
//! ```
//! use actor_harness::harness::{AddressSlot, Harness, HarnessOption};
//! use actor_harness::shim::econ::atto;
//!
//! let (miner, alice) = (AddressSlot::empty(), AddressSlot::empty());
//! let mut h = Harness::new(vec![
//!     HarnessOption::miner(&miner),
//!     HarnessOption::fund(&alice, 0),
//! ])
//! .unwrap();
//! let (miner, alice) = (miner.get().unwrap(), alice.get().unwrap());
//!
//! let (ret, _) = h.send_funds(miner, alice, atto(500)).unwrap();
//! assert!(ret.exit_code().is_success());
//! h.assert_balance(&alice, &atto(500)).unwrap();
//! ```

mod errors;
mod funding;
mod options;
mod settings;
mod slot;

use std::sync::Arc;

use ahash::{HashMap, HashMapExt as _};
use cid::Cid;
use fvm_ipld_encoding::RawBytes;
use serde::Serialize;
use tracing::{debug, error, info};

pub use self::errors::Error;
pub use self::funding::{FundingRegistry, FundingSpec, default_miner};
pub use self::options::HarnessOption;
pub use self::settings::{HARNESS_MINER_FUNDS, HarnessSettings};
pub use self::slot::AddressSlot;

use crate::builtin::{INIT_ACTOR_ADDR, init};
use crate::chain::ChainStore;
use crate::db::MemoryDB;
use crate::genesis::make_initial_state_tree;
use crate::interpreter::{self, ExecutionContext, ExecutionEngine, VM};
use crate::key_management::{KeyProvider, KeyStore, Wallet};
use crate::shim::{
    ChainEpoch,
    address::Address,
    econ::{TokenAmount, atto},
    executor::ApplyRet,
    message::{METHOD_SEND, Message, MethodNum},
    state_tree::StateTree,
};
use crate::utils::encoding::dump_object;

/// State tree view the harness hands out after every message.
pub type HarnessStateTree = StateTree<Arc<MemoryDB>>;

/// Builds the engine once genesis exists: `(genesis root, store, epoch, miner)`.
pub type EngineFactory<'a> = dyn FnOnce(
        &Cid,
        Arc<MemoryDB>,
        ChainEpoch,
        Address,
    ) -> Result<Box<dyn ExecutionEngine>, interpreter::Error>
    + 'a;

/// Lifecycle phase of a harness. Moves from `PreInit` to `PostInit` once,
/// during construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum Stage {
    PreInit,
    PostInit,
}

/// A message as tests describe it. Unset fields are filled in by the harness.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HarnessMessage {
    pub from: Address,
    pub to: Address,
    pub method_num: MethodNum,
    pub params: RawBytes,
    pub value: TokenAmount,
    /// `None` takes the sender's tracked nonce. An explicit value is sent
    /// verbatim and leaves the tracker alone.
    pub sequence: Option<u64>,
    pub gas_price: Option<TokenAmount>,
    pub gas_limit: Option<u64>,
}

impl Default for HarnessMessage {
    fn default() -> Self {
        Self {
            from: Address::new_id(0),
            to: Address::new_id(0),
            method_num: METHOD_SEND,
            params: RawBytes::default(),
            value: TokenAmount::default(),
            sequence: None,
            gas_price: None,
            gas_limit: None,
        }
    }
}

/// Engine-side state that only exists once genesis has been built.
struct Live {
    engine: Box<dyn ExecutionEngine>,
    chain_store: ChainStore<MemoryDB>,
}

pub struct Harness {
    settings: HarnessSettings,
    stage: Stage,
    funding: FundingSpec,
    nonces: HashMap<Address, u64>,
    ctx: ExecutionContext,
    store: Arc<MemoryDB>,
    key_provider: Box<dyn KeyProvider>,
    live: Option<Live>,
}

impl std::fmt::Debug for Harness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Harness")
            .field("stage", &self.stage)
            .field("miner", &self.funding.miner())
            .field("funded", &self.funding.registry().len())
            .field("nonces", &self.nonces)
            .field("ctx", &self.ctx)
            .field("live", &self.live.is_some())
            .finish_non_exhaustive()
    }
}

impl Harness {
    /// Builds a harness with default settings over the reference [`VM`].
    pub fn new(options: Vec<HarnessOption>) -> Result<Self, Error> {
        Self::with_settings(HarnessSettings::default(), options)
    }

    pub fn with_settings(
        settings: HarnessSettings,
        options: Vec<HarnessOption>,
    ) -> Result<Self, Error> {
        Self::build(settings, options, Box::new(reference_engine))
    }

    /// Builds a harness whose engine is produced by `factory`.
    pub fn new_with_engine<F>(options: Vec<HarnessOption>, factory: F) -> Result<Self, Error>
    where
        F: FnOnce(
            &Cid,
            Arc<MemoryDB>,
            ChainEpoch,
            Address,
        ) -> Result<Box<dyn ExecutionEngine>, interpreter::Error>,
    {
        Self::build(HarnessSettings::default(), options, Box::new(factory))
    }

    fn build(
        settings: HarnessSettings,
        mut options: Vec<HarnessOption>,
        factory: Box<EngineFactory<'_>>,
    ) -> Result<Self, Error> {
        let keystore = KeyStore::default();
        let wallet = match settings.rng_seed {
            Some(seed) => Wallet::new_seeded(keystore, seed),
            None => Wallet::new(keystore)?,
        };
        let funding = FundingSpec::new(settings.miner_funds)
            .map_err(|e| Error::Precondition(format!("invalid default miner: {e}")))?;

        let mut h = Harness {
            ctx: ExecutionContext::new(settings.epoch),
            settings,
            stage: Stage::PreInit,
            funding,
            nonces: HashMap::new(),
            store: Arc::new(MemoryDB::default()),
            key_provider: Box::new(wallet),
            live: None,
        };

        options::run_options(&mut h, &mut options)?;

        let genesis_root = make_initial_state_tree(
            Arc::clone(&h.store),
            h.funding.registry().entries(),
        )
        .and_then(|mut tree| Ok(tree.flush()?))
        .map_err(Error::Genesis)?;
        info!(
            root = %genesis_root,
            accounts = h.funding.registry().len(),
            miner = %h.funding.miner(),
            "genesis state built"
        );

        let chain_store = ChainStore::new(Arc::clone(&h.store), genesis_root);
        let engine = factory(
            &genesis_root,
            Arc::clone(&h.store),
            h.settings.epoch,
            h.funding.miner(),
        )?;
        h.live = Some(Live {
            engine,
            chain_store,
        });
        h.stage = Stage::PostInit;

        options::run_options(&mut h, &mut options)?;
        Ok(h)
    }

    fn live(&self) -> Result<&Live, Error> {
        self.live
            .as_ref()
            .ok_or_else(|| Error::Precondition(format!("engine not available in {}", self.stage)))
    }

    fn live_mut(&mut self) -> Result<&mut Live, Error> {
        let stage = self.stage;
        self.live
            .as_mut()
            .ok_or_else(|| Error::Precondition(format!("engine not available in {stage}")))
    }

    /// Applies `msg`, flushes the engine and reloads state from the new root.
    ///
    /// A message without a sequence takes the sender's tracked nonce, which
    /// is advanced exactly once, before dispatch, whatever the outcome.
    pub fn apply(&mut self, msg: HarnessMessage) -> Result<(ApplyRet, HarnessStateTree), Error> {
        let sequence = match msg.sequence {
            Some(sequence) => sequence,
            None => {
                let next = self.nonces.entry(msg.from).or_default();
                let sequence = *next;
                *next += 1;
                debug!(from = %msg.from, sequence, "assigned tracked nonce");
                sequence
            }
        };
        let message = Message {
            version: 0,
            from: msg.from,
            to: msg.to,
            sequence,
            value: msg.value,
            method_num: msg.method_num,
            params: msg.params,
            gas_limit: msg.gas_limit.unwrap_or(self.settings.gas_limit),
            gas_price: msg
                .gas_price
                .unwrap_or_else(|| atto(self.settings.gas_price)),
        };

        let ctx = self.ctx.clone();
        let live = self.live_mut()?;
        let ret = live.engine.apply_message(&ctx, &message).map_err(|e| {
            error!(
                from = %message.from,
                to = %message.to,
                sequence,
                method = message.method_num,
                "failed to apply message: {e}"
            );
            Error::Engine(e)
        })?;

        let root = live.engine.flush(&ctx)?;
        live.chain_store.set_heaviest_state(root);
        let view = live.chain_store.load_state_tree(&root)?;
        debug!(%root, exit_code = %ret.exit_code(), "applied harness message");
        Ok((ret, view))
    }

    /// Creates an actor of type `code` through the Init actor's `Exec`
    /// method. Check the exit code before decoding the return value.
    pub fn create_actor<P>(
        &mut self,
        from: Address,
        code: Cid,
        params: &P,
    ) -> Result<(ApplyRet, HarnessStateTree), Error>
    where
        P: Serialize + ?Sized,
    {
        let params = dump_object(params)?;
        self.create_actor_raw(from, code, params)
    }

    fn create_actor_raw(
        &mut self,
        from: Address,
        code: Cid,
        constructor_params: RawBytes,
    ) -> Result<(ApplyRet, HarnessStateTree), Error> {
        let exec = dump_object(&init::ExecParams {
            code_cid: code,
            constructor_params,
        })?;
        debug!(%from, %code, "creating actor");
        self.apply(HarnessMessage {
            from,
            to: INIT_ACTOR_ADDR,
            method_num: init::Method::Exec as MethodNum,
            params: exec,
            ..Default::default()
        })
    }

    /// Plain value transfer.
    pub fn send_funds(
        &mut self,
        from: Address,
        to: Address,
        value: TokenAmount,
    ) -> Result<(ApplyRet, HarnessStateTree), Error> {
        self.apply(HarnessMessage {
            from,
            to,
            method_num: METHOD_SEND,
            value,
            ..Default::default()
        })
    }

    /// Calls `method` on `to` with serialized `params` and no value.
    pub fn invoke<P>(
        &mut self,
        from: Address,
        to: Address,
        method: MethodNum,
        params: &P,
    ) -> Result<(ApplyRet, HarnessStateTree), Error>
    where
        P: Serialize + ?Sized,
    {
        let params = dump_object(params)?;
        self.apply(HarnessMessage {
            from,
            to,
            method_num: method,
            params,
            ..Default::default()
        })
    }

    /// Checks the live balance of `addr`. A mismatch is logged and returned
    /// as [`Error::BalanceMismatch`].
    pub fn assert_balance(&self, addr: &Address, expected: &TokenAmount) -> Result<(), Error> {
        let actual = self.balance(addr)?;
        if &actual != expected {
            error!(address = %addr, %expected, %actual, "balance mismatch");
            return Err(Error::BalanceMismatch {
                address: *addr,
                expected: expected.clone(),
                actual,
            });
        }
        Ok(())
    }

    /// Live balance of `addr` as the engine reports it.
    pub fn balance(&self, addr: &Address) -> Result<TokenAmount, Error> {
        Ok(self.live()?.engine.actor_balance(addr)?)
    }

    /// Next nonce the harness will assign for `addr`.
    pub fn nonce(&self, addr: &Address) -> u64 {
        self.nonces.get(addr).copied().unwrap_or_default()
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn funding(&self) -> &FundingSpec {
        &self.funding
    }

    pub fn miner(&self) -> Address {
        self.funding.miner()
    }

    pub fn settings(&self) -> &HarnessSettings {
        &self.settings
    }

    /// State view as of the last applied message.
    pub fn state_tree(&self) -> Result<HarnessStateTree, Error> {
        Ok(self.live()?.chain_store.heaviest_state_tree()?)
    }

    pub fn chain_store(&self) -> Result<&ChainStore<MemoryDB>, Error> {
        Ok(&self.live()?.chain_store)
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.ctx
    }

    pub fn store(&self) -> &Arc<MemoryDB> {
        &self.store
    }
}

fn reference_engine(
    root: &Cid,
    store: Arc<MemoryDB>,
    epoch: ChainEpoch,
    miner: Address,
) -> Result<Box<dyn ExecutionEngine>, interpreter::Error> {
    Ok(Box::new(VM::new(root, store, epoch, miner)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::MULTISIG_ACTOR_CODE_ID;
    use crate::shim::error::ExitCode;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_harness_funds_miner() {
        let h = Harness::new(vec![]).unwrap();
        assert_eq!(h.stage(), Stage::PostInit);
        assert_eq!(h.miner(), default_miner().unwrap());
        h.assert_balance(&h.miner(), &atto(HARNESS_MINER_FUNDS))
            .unwrap();
        assert_eq!(h.funding().n_addrs(), 1);
    }

    #[test]
    fn explicit_sequence_leaves_tracker_alone() {
        let mut h = Harness::new(vec![]).unwrap();
        let miner = h.miner();
        let to = Address::new_id(1);

        let (ret, _) = h
            .apply(HarnessMessage {
                from: miner,
                to,
                sequence: Some(0),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(ret.exit_code(), ExitCode::OK);
        assert_eq!(h.nonce(&miner), 0);

        // The tracker still thinks 0 is next, so the engine rejects it.
        let (ret, _) = h.send_funds(miner, to, atto(1)).unwrap();
        assert_eq!(ret.exit_code(), ExitCode::SYS_SENDER_STATE_INVALID);
        assert_eq!(h.nonce(&miner), 1);
    }

    #[test]
    fn every_apply_records_a_root() {
        let mut h = Harness::new(vec![]).unwrap();
        let miner = h.miner();
        h.send_funds(miner, Address::new_id(1), atto(1)).unwrap();
        h.send_funds(miner, Address::new_id(1), atto(1)).unwrap();
        let cs = h.chain_store().unwrap();
        assert_eq!(cs.state_roots().len(), 3);
        assert_ne!(cs.genesis_state_root(), cs.heaviest_state_root());
    }

    #[test]
    fn rejected_messages_do_not_grow_the_root_list() {
        let mut h = Harness::new(vec![]).unwrap();
        let stranger = crate::shim::address::bls_addr(42).unwrap();
        for _ in 0..5 {
            let (ret, _) = h.send_funds(stranger, h.miner(), atto(1)).unwrap();
            assert_eq!(ret.exit_code(), ExitCode::SYS_SENDER_INVALID);
        }
        let cs = h.chain_store().unwrap();
        assert_eq!(cs.state_roots(), vec![cs.genesis_state_root()]);
    }

    #[test]
    fn actor_option_needs_creator() {
        let err = Harness::new(vec![HarnessOption::actor(
            &AddressSlot::empty(),
            &AddressSlot::empty(),
            *MULTISIG_ACTOR_CODE_ID,
            || (),
        )])
        .unwrap_err();
        assert!(matches!(err, Error::Precondition(_)));
    }

    #[test]
    fn actor_option_surfaces_exit_code() {
        let creator = AddressSlot::empty();
        let err = Harness::new(vec![
            HarnessOption::fund(&creator, 10),
            HarnessOption::actor(
                &AddressSlot::empty(),
                &creator,
                *crate::builtin::ACCOUNT_ACTOR_CODE_ID,
                || (),
            ),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            Error::ActorCreation {
                exit_code: ExitCode::USR_FORBIDDEN,
                ..
            }
        ));
    }

    #[test]
    fn seeded_settings_are_reproducible() {
        let settings = HarnessSettings {
            rng_seed: Some(3),
            ..Default::default()
        };
        let (a, b) = (AddressSlot::empty(), AddressSlot::empty());
        Harness::with_settings(settings.clone(), vec![HarnessOption::fund(&a, 1)]).unwrap();
        Harness::with_settings(settings, vec![HarnessOption::fund(&b, 1)]).unwrap();
        assert_eq!(a.get(), b.get());
    }
}
