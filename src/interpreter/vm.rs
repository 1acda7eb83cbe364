// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::sync::Arc;

use cid::Cid;
use fvm_ipld_blockstore::Blockstore;
use fvm_ipld_encoding::RawBytes;
use num_traits::FromPrimitive as _;
use tracing::{debug, warn};

use super::{Error, ExecutionContext, ExecutionEngine};
use crate::builtin::{
    ACCOUNT_ACTOR_CODE_ID, INIT_ACTOR_ADDR, INIT_ACTOR_CODE_ID, account, init,
    is_account_actor, is_builtin_singleton,
};
use crate::shim::{
    ChainEpoch,
    address::{Address, is_key_address},
    econ::TokenAmount,
    error::{ActorError, actor_error},
    executor::ApplyRet,
    message::{METHOD_SEND, Message},
    state_tree::{ActorState, StateTree},
};
use crate::utils::db::CborStoreExt as _;

type SendResult = Result<RawBytes, ActorError>;

/// Interpreter which handles execution of state transitioning messages and
/// returns receipts from the VM execution.
///
/// No gas is charged: the gas fields of a message are validated and otherwise
/// ignored.
pub struct VM<DB> {
    state: StateTree<Arc<DB>>,
    epoch: ChainEpoch,
    miner: Address,
}

impl<DB> VM<DB>
where
    DB: Blockstore,
{
    pub fn new(root: &Cid, store: Arc<DB>, epoch: ChainEpoch, miner: Address) -> Result<Self, Error> {
        let state = StateTree::new_from_root(store, root)?;
        Ok(VM {
            state,
            epoch,
            miner,
        })
    }

    pub fn epoch(&self) -> ChainEpoch {
        self.epoch
    }

    /// Recipient of block rewards for the blocks this VM executes.
    pub fn miner(&self) -> &Address {
        &self.miner
    }

    pub fn state(&self) -> &StateTree<Arc<DB>> {
        &self.state
    }

    /// Applies the state transition for a single message.
    pub fn apply_message(
        &mut self,
        ctx: &ExecutionContext,
        msg: &Message,
    ) -> Result<ApplyRet, Error> {
        if ctx.is_cancelled() {
            return Err(Error::Cancelled);
        }
        msg.check()
            .map_err(|e| Error::InvalidMessage(e.to_string()))?;

        let from_act = match self.state.get_actor(&msg.from)? {
            Some(act) => act,
            None => {
                return Ok(ApplyRet::failure(
                    actor_error!(SYS_SENDER_INVALID; "Sender invalid"),
                ));
            }
        };

        if !is_account_actor(&from_act.code) {
            return Ok(ApplyRet::failure(
                actor_error!(SYS_SENDER_INVALID; "send not from account actor"),
            ));
        }

        if msg.sequence != from_act.sequence {
            return Ok(ApplyRet::failure(actor_error!(SYS_SENDER_STATE_INVALID;
                "actor sequence invalid: {} != {}", msg.sequence, from_act.sequence)));
        }

        if from_act.balance < msg.value {
            return Ok(ApplyRet::failure(actor_error!(SYS_INSUFFICIENT_FUNDS;
                "actor balance less than needed: {} < {}", from_act.balance, msg.value)));
        }

        self.state.mutate_actor(&msg.from, |act| {
            act.sequence += 1;
            Ok(())
        })?;

        self.state.snapshot();
        let sent = match self.send(msg) {
            Ok(sent) => sent,
            Err(e) => {
                self.state.revert_to_snapshot()?;
                return Err(e);
            }
        };
        let ret = match sent {
            Ok(return_data) => {
                self.state.clear_snapshot()?;
                ApplyRet::success(return_data)
            }
            Err(err) => {
                warn!(
                    "[from={}, to={}, seq={}, m={}, h={}] send error: {}",
                    msg.from, msg.to, msg.sequence, msg.method_num, self.epoch, err
                );
                self.state.revert_to_snapshot()?;
                ApplyRet::failure(err)
            }
        };

        debug!(
            from = %msg.from,
            to = %msg.to,
            sequence = msg.sequence,
            method = msg.method_num,
            network_version = ?ctx.network_version,
            exit_code = %ret.exit_code(),
            "applied message"
        );
        Ok(ret)
    }

    /// Moves the value and dispatches the method. The outer error aborts the
    /// whole application; the inner one only fails the receipt.
    fn send(&mut self, msg: &Message) -> Result<SendResult, Error> {
        let to = match self.state.lookup_id(&msg.to)? {
            Some(id) => id,
            None if is_key_address(&msg.to) => self.create_account(&msg.to)?,
            None => {
                return Ok(Err(actor_error!(SYS_INVALID_RECEIVER;
                    "actor {} does not exist", msg.to)));
            }
        };
        let to_code = match self.state.get_actor(&to)? {
            Some(act) => act.code,
            None => {
                return Ok(Err(actor_error!(SYS_INVALID_RECEIVER;
                    "actor {} does not exist", msg.to)));
            }
        };

        self.transfer(&msg.from, &to, &msg.value)?;

        if msg.method_num == METHOD_SEND {
            return Ok(Ok(RawBytes::default()));
        }

        if to_code == *INIT_ACTOR_CODE_ID {
            return match init::Method::from_u64(msg.method_num) {
                Some(init::Method::Exec) => self.exec(msg),
                Some(init::Method::Constructor) => Ok(Err(actor_error!(USR_FORBIDDEN;
                    "init actor can only be constructed at genesis"))),
                None => Ok(Err(actor_error!(USR_UNHANDLED_MESSAGE;
                    "init actor has no method {}", msg.method_num))),
            };
        }

        Ok(Err(actor_error!(USR_UNHANDLED_MESSAGE;
            "actor {} with code {} has no method {}", msg.to, to_code, msg.method_num)))
    }

    /// Init actor `Exec`: allocates an ID and a robust address for a new
    /// actor and stores its constructor params as the actor state.
    fn exec(&mut self, msg: &Message) -> Result<SendResult, Error> {
        let params: init::ExecParams = match msg.params.deserialize() {
            Ok(params) => params,
            Err(e) => {
                return Ok(Err(actor_error!(USR_SERIALIZATION;
                    "failed to decode exec params: {}", e)));
            }
        };
        if !can_exec(&params.code_cid) {
            return Ok(Err(actor_error!(USR_FORBIDDEN;
                "cannot exec actor type {}", params.code_cid)));
        }

        let robust_address = new_actor_address(msg);
        let id_address = self.state.register_new_address(&robust_address)?;

        let head = self
            .state
            .store()
            .put_cbor_default(&params.constructor_params)?;
        self.state.set_actor(
            &id_address,
            ActorState::new(params.code_cid, head, TokenAmount::default(), 0),
        )?;
        self.transfer(&INIT_ACTOR_ADDR, &id_address, &msg.value)?;

        debug!(%id_address, %robust_address, code = %params.code_cid, "created actor");
        Ok(Ok(RawBytes::serialize(init::ExecReturn {
            id_address,
            robust_address,
        })?))
    }

    fn create_account(&mut self, addr: &Address) -> Result<Address, Error> {
        let id = self.state.register_new_address(addr)?;
        let head = self
            .state
            .store()
            .put_cbor_default(&account::State { address: *addr })?;
        self.state.set_actor(
            &id,
            ActorState::new(*ACCOUNT_ACTOR_CODE_ID, head, TokenAmount::default(), 0),
        )?;
        debug!(address = %addr, %id, "implicitly created account actor");
        Ok(id)
    }

    fn transfer(&mut self, from: &Address, to: &Address, value: &TokenAmount) -> Result<(), Error> {
        if value.is_zero() {
            return Ok(());
        }
        self.state
            .mutate_actor(from, |act| act.deduct_funds(value))?;
        self.state.mutate_actor(to, |act| {
            act.deposit_funds(value);
            Ok(())
        })?;
        Ok(())
    }

    /// Persists the pending state and returns its root.
    pub fn flush(&mut self) -> Result<Cid, Error> {
        Ok(self.state.flush()?)
    }

    pub fn actor_balance(&self, addr: &Address) -> Result<TokenAmount, Error> {
        let act = self
            .state
            .get_actor(addr)?
            .ok_or(Error::ActorNotFound(*addr))?;
        Ok(act.balance)
    }
}

impl<DB: Blockstore> ExecutionEngine for VM<DB> {
    fn apply_message(&mut self, ctx: &ExecutionContext, msg: &Message) -> Result<ApplyRet, Error> {
        VM::apply_message(self, ctx, msg)
    }

    fn flush(&mut self, ctx: &ExecutionContext) -> Result<Cid, Error> {
        if ctx.is_cancelled() {
            return Err(Error::Cancelled);
        }
        VM::flush(self)
    }

    fn actor_balance(&self, addr: &Address) -> Result<TokenAmount, Error> {
        VM::actor_balance(self, addr)
    }
}

/// Singletons and accounts are only ever created by the system.
fn can_exec(exec: &Cid) -> bool {
    !is_builtin_singleton(exec) && !is_account_actor(exec)
}

/// Re-org stable address derived from the creating message's sender and
/// sequence.
fn new_actor_address(msg: &Message) -> Address {
    let mut seed = msg.from.to_bytes();
    seed.extend_from_slice(&msg.sequence.to_be_bytes());
    Address::new_actor(&seed)
}
