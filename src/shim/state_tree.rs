// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use ahash::{HashMap, HashMapExt as _};
use cid::Cid;
use fvm_ipld_blockstore::Blockstore;
use fvm_ipld_encoding::{CborStore as _, tuple::*};
use fvm_ipld_hamt::{BytesKey, Hamt};
use fvm_shared4::HAMT_BIT_WIDTH;
use thiserror::Error;

use crate::builtin::{INIT_ACTOR_ADDR, init};
use crate::shim::{
    address::{Address, Protocol},
    econ::TokenAmount,
};
use crate::utils::db::CborStoreExt as _;

/// Version tag written into every [`StateRoot`].
pub const STATE_TREE_VERSION: u64 = 5;

#[derive(Debug, Error)]
pub enum Error {
    #[error("state root {0} not found in store")]
    RootNotFound(Cid),
    #[error("Resolution lookup failed for {0}")]
    Resolution(Address),
    #[error("Actor for address: {0} does not exist")]
    ActorNotFound(Address),
    #[error("snapshot error: {0}")]
    Snapshot(String),
    #[error(transparent)]
    Hamt(#[from] fvm_ipld_hamt::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// State of all actor implementations.
#[derive(PartialEq, Eq, Clone, Debug, Serialize_tuple, Deserialize_tuple)]
pub struct ActorState {
    /// Link to code for the actor.
    pub code: Cid,
    /// Link to the state of the actor.
    pub state: Cid,
    /// Sequence of the actor.
    pub sequence: u64,
    /// Tokens available to the actor.
    pub balance: TokenAmount,
}

impl ActorState {
    pub fn new(code: Cid, state: Cid, balance: TokenAmount, sequence: u64) -> Self {
        Self {
            code,
            state,
            sequence,
            balance,
        }
    }

    /// Safely deducts funds from an Actor
    pub fn deduct_funds(&mut self, amt: &TokenAmount) -> anyhow::Result<()> {
        if &self.balance < amt {
            anyhow::bail!("Not enough funds");
        }
        self.balance -= amt.clone();
        Ok(())
    }

    /// Deposits funds to an Actor
    pub fn deposit_funds(&mut self, amt: &TokenAmount) {
        self.balance += amt.clone();
    }
}

/// Persisted head of a state tree.
#[derive(PartialEq, Eq, Clone, Debug, Serialize_tuple, Deserialize_tuple)]
pub struct StateRoot {
    pub version: u64,
    pub actors: Cid,
    pub info: Cid,
}

#[derive(Default, Serialize_tuple, Deserialize_tuple)]
struct StateInfo0 {}

/// State snap shot layer
#[derive(Debug, Default)]
struct StateSnapLayer {
    actors: HashMap<Address, Option<ActorState>>,
    resolve_cache: HashMap<Address, Address>,
}

/// Collection of state snapshots
#[derive(Debug)]
struct StateSnapshots {
    layers: Vec<StateSnapLayer>,
}

impl StateSnapshots {
    fn new() -> Self {
        Self {
            layers: vec![StateSnapLayer::default()],
        }
    }

    fn add_layer(&mut self) {
        self.layers.push(StateSnapLayer::default())
    }

    fn drop_layer(&mut self) -> Result<(), Error> {
        if self.layers.len() < 2 {
            return Err(Error::Snapshot(
                "cannot drop the base snapshot layer".to_owned(),
            ));
        }
        self.layers.pop();
        Ok(())
    }

    fn merge_last_layer(&mut self) -> Result<(), Error> {
        if self.layers.len() < 2 {
            return Err(Error::Snapshot(
                "no snapshot layer to merge".to_owned(),
            ));
        }
        let top = self.layers.pop().unwrap_or_default();
        if let Some(below) = self.layers.last_mut() {
            below.actors.extend(top.actors);
            below.resolve_cache.extend(top.resolve_cache);
        }
        Ok(())
    }

    fn top(&mut self) -> &mut StateSnapLayer {
        if self.layers.is_empty() {
            self.layers.push(StateSnapLayer::default());
        }
        let last = self.layers.len() - 1;
        &mut self.layers[last]
    }

    fn resolve_address(&self, addr: &Address) -> Option<Address> {
        self.layers
            .iter()
            .rev()
            .find_map(|layer| layer.resolve_cache.get(addr).copied())
    }

    fn cache_resolve_address(&mut self, addr: Address, resolved: Address) {
        self.top().resolve_cache.insert(addr, resolved);
    }

    /// `Some(None)` means the actor was deleted in a pending layer.
    fn get_actor(&self, addr: &Address) -> Option<Option<ActorState>> {
        self.layers
            .iter()
            .rev()
            .find_map(|layer| layer.actors.get(addr).cloned())
    }

    fn set_actor(&mut self, addr: Address, actor: ActorState) {
        self.top().actors.insert(addr, Some(actor));
    }

    fn delete_actor(&mut self, addr: Address) {
        self.top().actors.insert(addr, None);
    }
}

/// State tree implementation using hamt. This structure is not threadsafe and
/// should only be used in sync contexts.
pub struct StateTree<S> {
    hamt: Hamt<S, ActorState>,
    info: Cid,
    snaps: StateSnapshots,
}

impl<S> std::fmt::Debug for StateTree<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateTree")
            .field("info", &self.info)
            .field("snapshot_layers", &self.snaps.layers.len())
            .finish_non_exhaustive()
    }
}

impl<S> StateTree<S>
where
    S: Blockstore + Clone,
{
    /// Creates an empty state tree.
    pub fn new(store: S) -> Result<Self, Error> {
        let info = store.put_cbor_default(&StateInfo0::default())?;
        let hamt = Hamt::new_with_bit_width(store, HAMT_BIT_WIDTH);
        Ok(Self {
            hamt,
            info,
            snaps: StateSnapshots::new(),
        })
    }

    /// Constructor for a hamt state tree given an IPLD store
    pub fn new_from_root(store: S, c: &Cid) -> Result<Self, Error> {
        let StateRoot { actors, info, .. } = store
            .get_cbor::<StateRoot>(c)?
            .ok_or(Error::RootNotFound(*c))?;
        let hamt = Hamt::load_with_bit_width(&actors, store, HAMT_BIT_WIDTH)?;
        Ok(Self {
            hamt,
            info,
            snaps: StateSnapshots::new(),
        })
    }

    /// Retrieve store reference to modify db.
    pub fn store(&self) -> &S {
        self.hamt.store()
    }

    /// Get actor state from an address. Will be resolved to ID address.
    pub fn get_actor(&self, addr: &Address) -> Result<Option<ActorState>, Error> {
        let addr = match self.lookup_id(addr)? {
            Some(addr) => addr,
            None => return Ok(None),
        };

        if let Some(pending) = self.snaps.get_actor(&addr) {
            return Ok(pending);
        }

        Ok(self.hamt.get(&addr.to_bytes())?.cloned())
    }

    /// Set actor state for an address. Will set state at ID address.
    pub fn set_actor(&mut self, addr: &Address, actor: ActorState) -> Result<(), Error> {
        let addr = self
            .lookup_id(addr)?
            .ok_or(Error::Resolution(*addr))?;
        self.snaps.set_actor(addr, actor);
        Ok(())
    }

    /// Get an ID address from any Address
    pub fn lookup_id(&self, addr: &Address) -> Result<Option<Address>, Error> {
        if addr.protocol() == Protocol::ID {
            return Ok(Some(*addr));
        }

        if let Some(res_address) = self.snaps.resolve_address(addr) {
            return Ok(Some(res_address));
        }

        let init_act = self
            .get_actor(&INIT_ACTOR_ADDR)?
            .ok_or(Error::ActorNotFound(INIT_ACTOR_ADDR))?;
        let state: init::State = self
            .store()
            .get_cbor(&init_act.state)?
            .ok_or_else(|| anyhow::anyhow!("init actor state {} not found", init_act.state))?;

        Ok(state.resolve_address(self.store(), addr)?)
    }

    /// Delete actor for an address. Will resolve to ID address to delete.
    pub fn delete_actor(&mut self, addr: &Address) -> Result<(), Error> {
        let addr = self
            .lookup_id(addr)?
            .ok_or(Error::Resolution(*addr))?;
        self.snaps.delete_actor(addr);
        Ok(())
    }

    /// Mutate and set actor state for an Address.
    pub fn mutate_actor<F>(&mut self, addr: &Address, mutate: F) -> Result<(), Error>
    where
        F: FnOnce(&mut ActorState) -> anyhow::Result<()>,
    {
        let mut act = self
            .get_actor(addr)?
            .ok_or(Error::ActorNotFound(*addr))?;
        mutate(&mut act)?;
        self.set_actor(addr, act)
    }

    /// Register a new address through the init actor.
    pub fn register_new_address(&mut self, addr: &Address) -> Result<Address, Error> {
        let mut actor = self
            .get_actor(&INIT_ACTOR_ADDR)?
            .ok_or(Error::ActorNotFound(INIT_ACTOR_ADDR))?;

        let mut ias: init::State = self
            .store()
            .get_cbor(&actor.state)?
            .ok_or_else(|| anyhow::anyhow!("init actor state {} not found", actor.state))?;

        let new_addr = ias.map_address_to_new_id(self.store(), addr)?;

        // Set state for init actor in store and update root Cid
        actor.state = self.store().put_cbor_default(&ias)?;
        self.set_actor(&INIT_ACTOR_ADDR, actor)?;
        self.snaps.cache_resolve_address(*addr, new_addr);

        Ok(new_addr)
    }

    /// Add snapshot layer to stack.
    pub fn snapshot(&mut self) {
        self.snaps.add_layer();
    }

    /// Merges last two snap shot layers.
    pub fn clear_snapshot(&mut self) -> Result<(), Error> {
        self.snaps.merge_last_layer()
    }

    /// Revert state cache by removing last snapshot
    pub fn revert_to_snapshot(&mut self) -> Result<(), Error> {
        self.snaps.drop_layer()
    }

    /// Flush state tree and return Cid root.
    pub fn flush(&mut self) -> Result<Cid, Error> {
        if self.snaps.layers.len() != 1 {
            return Err(Error::Snapshot(format!(
                "tried to flush state tree with snapshots on the stack: {}",
                self.snaps.layers.len()
            )));
        }

        let pending = std::mem::take(&mut self.snaps.layers[0].actors);
        for (addr, sto) in pending {
            match sto {
                None => {
                    self.hamt.delete(&addr.to_bytes())?;
                }
                Some(state) => {
                    self.hamt.set(BytesKey(addr.to_bytes()), state)?;
                }
            }
        }

        let actors = self.hamt.flush()?;
        Ok(self.store().put_cbor_default(&StateRoot {
            version: STATE_TREE_VERSION,
            actors,
            info: self.info,
        })?)
    }

    /// Iterates over every persisted actor. Pending writes are not visited;
    /// flush first to include them.
    pub fn for_each<F>(&self, mut f: F) -> Result<(), Error>
    where
        F: FnMut(Address, &ActorState) -> anyhow::Result<()>,
    {
        self.hamt.for_each(|k, v| {
            let addr = Address::from_bytes(&k.0)?;
            f(addr, v)
        })?;
        Ok(())
    }

    /// Collects every persisted actor keyed by ID address.
    pub fn actors(&self) -> Result<HashMap<Address, ActorState>, Error> {
        let mut out = HashMap::new();
        self.for_each(|addr, act| {
            out.insert(addr, act.clone());
            Ok(())
        })?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::{ACCOUNT_ACTOR_CODE_ID, HARNESS_NETWORK_NAME, INIT_ACTOR_CODE_ID};
    use crate::db::MemoryDB;
    use crate::shim::{address::bls_addr, econ::atto};
    use crate::utils::cid::CidCborExt as _;
    use std::sync::Arc;

    fn tree_with_init() -> StateTree<Arc<MemoryDB>> {
        let store = Arc::new(MemoryDB::default());
        let mut tree = StateTree::new(store.clone()).unwrap();
        let init_state = init::State::new(&store, HARNESS_NETWORK_NAME.into()).unwrap();
        let head = store.put_cbor_default(&init_state).unwrap();
        tree.set_actor(
            &INIT_ACTOR_ADDR,
            ActorState::new(*INIT_ACTOR_CODE_ID, head, TokenAmount::default(), 0),
        )
        .unwrap();
        tree
    }

    fn account(balance: u64) -> ActorState {
        ActorState::new(
            *ACCOUNT_ACTOR_CODE_ID,
            crate::utils::cid::raw_blake2b256(b"empty"),
            atto(balance),
            0,
        )
    }

    #[test]
    fn get_set_cache() {
        let mut tree = tree_with_init();
        let addr = Address::new_id(101);

        assert_eq!(tree.get_actor(&addr).unwrap(), None);
        tree.set_actor(&addr, account(1)).unwrap();
        tree.set_actor(&addr, account(2)).unwrap();
        assert_eq!(tree.get_actor(&addr).unwrap(), Some(account(2)));
    }

    #[test]
    fn delete_actor() {
        let mut tree = tree_with_init();
        let addr = Address::new_id(103);
        tree.set_actor(&addr, account(1)).unwrap();
        assert_eq!(tree.get_actor(&addr).unwrap(), Some(account(1)));
        tree.delete_actor(&addr).unwrap();
        assert_eq!(tree.get_actor(&addr).unwrap(), None);
    }

    #[test]
    fn key_addresses_resolve_through_init() {
        let mut tree = tree_with_init();
        let key = bls_addr(9).unwrap();
        assert_eq!(tree.lookup_id(&key).unwrap(), None);
        assert!(tree.set_actor(&key, account(1)).is_err());

        let id = tree.register_new_address(&key).unwrap();
        tree.set_actor(&key, account(5)).unwrap();
        assert_eq!(tree.lookup_id(&key).unwrap(), Some(id));
        assert_eq!(tree.get_actor(&id).unwrap(), Some(account(5)));
    }

    #[test]
    fn revert_discards_snapshot_writes() {
        let mut tree = tree_with_init();
        let addr = Address::new_id(104);
        tree.set_actor(&addr, account(1)).unwrap();

        tree.snapshot();
        tree.mutate_actor(&addr, |act| {
            act.sequence = 9;
            Ok(())
        })
        .unwrap();
        assert_eq!(tree.get_actor(&addr).unwrap().unwrap().sequence, 9);
        tree.revert_to_snapshot().unwrap();
        assert_eq!(tree.get_actor(&addr).unwrap(), Some(account(1)));

        tree.snapshot();
        tree.set_actor(&addr, account(7)).unwrap();
        tree.clear_snapshot().unwrap();
        assert_eq!(tree.get_actor(&addr).unwrap(), Some(account(7)));
        assert!(tree.revert_to_snapshot().is_err());
    }

    #[test]
    fn flush_refuses_open_snapshots() {
        let mut tree = tree_with_init();
        tree.snapshot();
        assert!(matches!(tree.flush(), Err(Error::Snapshot(_))));
    }

    #[test]
    fn flush_and_reload() {
        let mut tree = tree_with_init();
        let key = bls_addr(1).unwrap();
        tree.register_new_address(&key).unwrap();
        tree.set_actor(&key, account(50)).unwrap();
        let root = tree.flush().unwrap();

        let reloaded = StateTree::new_from_root(tree.store().clone(), &root).unwrap();
        assert_eq!(reloaded.get_actor(&key).unwrap(), Some(account(50)));
        assert_eq!(reloaded.actors().unwrap().len(), 2);

        // Old roots stay valid once the tree moves on.
        tree.mutate_actor(&key, |act| {
            act.balance = atto(10);
            Ok(())
        })
        .unwrap();
        let next = tree.flush().unwrap();
        assert_ne!(root, next);
        let old = StateTree::new_from_root(tree.store().clone(), &root).unwrap();
        assert_eq!(old.get_actor(&key).unwrap(), Some(account(50)));
    }

    #[test]
    fn missing_root_is_reported() {
        let store = Arc::new(MemoryDB::default());
        let bogus = Cid::from_cbor_blake2b256(&"nope").unwrap();
        assert!(matches!(
            StateTree::new_from_root(store, &bogus),
            Err(Error::RootNotFound(c)) if c == bogus
        ));
    }
}
