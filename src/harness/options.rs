// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::fmt;

use cid::Cid;
use fvm_ipld_encoding::RawBytes;
use serde::Serialize;
use tracing::{debug, info};

use super::{AddressSlot, Error, Harness, Stage};
use crate::builtin::init::ExecReturn;
use crate::interpreter::ExecutionContext;
use crate::shim::econ::{TokenAmount, atto};
use crate::utils::encoding::dump_object;

type ParamsThunk = Box<dyn FnOnce() -> Result<RawBytes, fvm_ipld_encoding::Error>>;

/// A single configuration step of harness construction.
///
/// Options run in the order given, once per [`Stage`]; an option only acts in
/// the stages [`HarnessOption::valid_in`] accepts.
pub enum HarnessOption {
    /// Registers an address with a genesis balance, generating the address
    /// when the slot is empty.
    Fund { slot: AddressSlot, value: TokenAmount },
    /// Reads the miner into an empty slot, or makes the slot's address the
    /// miner.
    Miner { slot: AddressSlot },
    /// Replaces the execution context.
    Context(ExecutionContext),
    /// Creates an actor through the Init actor and writes its address into
    /// `slot`, which must be empty.
    Actor {
        slot: AddressSlot,
        creator: AddressSlot,
        code: Cid,
        params: Option<ParamsThunk>,
    },
}

impl HarnessOption {
    pub fn fund(slot: &AddressSlot, value: u64) -> Self {
        Self::Fund {
            slot: slot.clone(),
            value: atto(value),
        }
    }

    pub fn miner(slot: &AddressSlot) -> Self {
        Self::Miner { slot: slot.clone() }
    }

    pub fn context(ctx: ExecutionContext) -> Self {
        Self::Context(ctx)
    }

    /// `params` is evaluated once, when the option runs against the live
    /// engine.
    pub fn actor<P, F>(slot: &AddressSlot, creator: &AddressSlot, code: Cid, params: F) -> Self
    where
        P: Serialize,
        F: FnOnce() -> P + 'static,
    {
        Self::Actor {
            slot: slot.clone(),
            creator: creator.clone(),
            code,
            params: Some(Box::new(move || dump_object(&params()))),
        }
    }

    pub fn valid_in(&self, stage: Stage) -> bool {
        match self {
            Self::Fund { .. } | Self::Miner { .. } => stage == Stage::PreInit,
            Self::Context(_) => true,
            Self::Actor { .. } => stage == Stage::PostInit,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Fund { .. } => "fund",
            Self::Miner { .. } => "miner",
            Self::Context(_) => "context",
            Self::Actor { .. } => "actor",
        }
    }

    pub(super) fn apply(&mut self, h: &mut Harness) -> Result<(), Error> {
        match self {
            Self::Fund { slot, value } => {
                let addr = match slot.get() {
                    Some(addr) => addr,
                    None => {
                        let addr = h.key_provider.generate_key(h.settings.key_type)?;
                        h.funding.record_generated();
                        slot.set(addr);
                        addr
                    }
                };
                debug!(address = %addr, balance = %value, "funding address");
                h.funding.fund(addr, value.clone());
            }
            Self::Miner { slot } => match slot.get() {
                None => slot.set(h.funding.miner()),
                Some(addr) => {
                    let previous = h.funding.replace_miner(addr);
                    info!(miner = %addr, %previous, "replaced miner");
                }
            },
            Self::Context(ctx) => h.ctx = ctx.clone(),
            Self::Actor {
                slot,
                creator,
                code,
                params,
            } => {
                if let Some(existing) = slot.get() {
                    return Err(Error::Precondition(format!(
                        "actor address should be empty, found {existing}"
                    )));
                }
                let creator = creator.get().ok_or_else(|| {
                    Error::Precondition("actor creator address is not set".to_owned())
                })?;
                let params = params
                    .take()
                    .ok_or_else(|| Error::Precondition("actor params already used".to_owned()))?;

                let (ret, _) = h.create_actor_raw(creator, *code, params()?)?;
                if !ret.exit_code().is_success() {
                    return Err(Error::ActorCreation {
                        exit_code: ret.exit_code(),
                        reason: ret.failure_info().unwrap_or_default(),
                    });
                }
                let created: ExecReturn = ret.return_data().deserialize()?;
                slot.set(created.id_address);
            }
        }
        Ok(())
    }
}

impl fmt::Debug for HarnessOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fund { slot, value } => f
                .debug_struct("Fund")
                .field("slot", slot)
                .field("value", value)
                .finish(),
            Self::Miner { slot } => f.debug_struct("Miner").field("slot", slot).finish(),
            Self::Context(ctx) => f.debug_tuple("Context").field(ctx).finish(),
            Self::Actor {
                slot,
                creator,
                code,
                params,
            } => f
                .debug_struct("Actor")
                .field("slot", slot)
                .field("creator", creator)
                .field("code", code)
                .field("params_pending", &params.is_some())
                .finish(),
        }
    }
}

/// Runs every option valid in the harness's current stage, in order. The
/// first failure aborts the run.
pub(super) fn run_options(h: &mut Harness, options: &mut [HarnessOption]) -> Result<(), Error> {
    let stage = h.stage;
    for opt in options.iter_mut().filter(|opt| opt.valid_in(stage)) {
        debug!(?stage, option = opt.name(), "applying harness option");
        opt.apply(h)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(HarnessOption::fund(&AddressSlot::empty(), 1), true, false)]
    #[case(HarnessOption::miner(&AddressSlot::empty()), true, false)]
    #[case(HarnessOption::context(ExecutionContext::default()), true, true)]
    #[case(
        HarnessOption::actor(
            &AddressSlot::empty(),
            &AddressSlot::empty(),
            *crate::builtin::MULTISIG_ACTOR_CODE_ID,
            || ()
        ),
        false,
        true
    )]
    fn stage_validity(#[case] opt: HarnessOption, #[case] pre: bool, #[case] post: bool) {
        assert_eq!(opt.valid_in(Stage::PreInit), pre);
        assert_eq!(opt.valid_in(Stage::PostInit), post);
    }
}
