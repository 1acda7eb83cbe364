// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use ahash::{HashSet, HashSetExt as _};
use anyhow::{Context as _, bail};
use fvm_ipld_blockstore::Blockstore;
use tracing::{debug, info};

use crate::builtin::{
    ACCOUNT_ACTOR_CODE_ID, HARNESS_NETWORK_NAME, INIT_ACTOR_ADDR, INIT_ACTOR_CODE_ID,
    SYSTEM_ACTOR_ADDR, SYSTEM_ACTOR_CODE_ID, account, init,
};
use crate::shim::{
    address::{Address, is_key_address},
    econ::TokenAmount,
    state_tree::{ActorState, StateTree},
};
use crate::utils::db::CborStoreExt as _;

/// Builds the initial state tree: the System and Init singletons followed by
/// one funded Account actor per entry, in the order given. Only key
/// addresses can be funded and each may appear once.
///
/// The returned tree is unflushed; call [`StateTree::flush`] to obtain the
/// genesis state root.
pub fn make_initial_state_tree<DB>(
    store: DB,
    accounts: &[(Address, TokenAmount)],
) -> anyhow::Result<StateTree<DB>>
where
    DB: Blockstore + Clone,
{
    let mut state_tree = StateTree::new(store.clone()).context("failed to create state tree")?;

    let system_head = store.put_cbor_default(&())?;
    state_tree.set_actor(
        &SYSTEM_ACTOR_ADDR,
        ActorState::new(*SYSTEM_ACTOR_CODE_ID, system_head, TokenAmount::default(), 0),
    )?;

    let init_state = init::State::new(&store, HARNESS_NETWORK_NAME.to_owned())?;
    let init_head = store.put_cbor_default(&init_state)?;
    state_tree.set_actor(
        &INIT_ACTOR_ADDR,
        ActorState::new(*INIT_ACTOR_CODE_ID, init_head, TokenAmount::default(), 0),
    )?;

    let mut seen = HashSet::with_capacity(accounts.len());
    for (address, balance) in accounts {
        if !is_key_address(address) {
            bail!("genesis account {address} is not a key address");
        }
        if !seen.insert(*address) {
            bail!("duplicate genesis account {address}");
        }

        let id = state_tree
            .register_new_address(address)
            .with_context(|| format!("failed to register genesis account {address}"))?;
        let head = store.put_cbor_default(&account::State { address: *address })?;
        state_tree.set_actor(
            &id,
            ActorState::new(*ACCOUNT_ACTOR_CODE_ID, head, balance.clone(), 0),
        )?;
        debug!(%address, %id, %balance, "created genesis account");
    }

    info!(accounts = accounts.len(), "built genesis state tree");
    Ok(state_tree)
}
