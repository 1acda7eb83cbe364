// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use anyhow::{Context as _, bail};
use cid::Cid;
use fvm_ipld_blockstore::Blockstore;
use fvm_ipld_encoding::RawBytes;
use fvm_ipld_encoding::tuple::*;
use fvm_ipld_hamt::Hamt;
use fvm_shared4::HAMT_BIT_WIDTH;
use num_derive::FromPrimitive;

use super::FIRST_NON_SINGLETON_ADDR;
use crate::shim::{
    ActorID,
    address::{Address, Protocol},
    message::METHOD_CONSTRUCTOR,
};

/// Init actor methods available
#[derive(FromPrimitive, Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u64)]
pub enum Method {
    Constructor = METHOD_CONSTRUCTOR,
    Exec = 2,
}

/// Init actor Exec Params
#[derive(Serialize_tuple, Deserialize_tuple, Clone, Debug, PartialEq, Eq)]
pub struct ExecParams {
    pub code_cid: Cid,
    pub constructor_params: RawBytes,
}

/// Init actor Exec Return value
#[derive(Serialize_tuple, Deserialize_tuple, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExecReturn {
    /// ID based address for created actor
    pub id_address: Address,
    /// Reorg safe address for actor
    pub robust_address: Address,
}

/// State is reponsible for allocating actor IDs and mapping key and robust
/// addresses onto them.
#[derive(Serialize_tuple, Deserialize_tuple, Clone, Debug, PartialEq, Eq)]
pub struct State {
    pub address_map: Cid,
    pub next_id: ActorID,
    pub network_name: String,
}

impl State {
    pub fn new<BS: Blockstore>(store: &BS, network_name: String) -> anyhow::Result<Self> {
        let address_map = Hamt::<_, ActorID>::new_with_bit_width(store, HAMT_BIT_WIDTH)
            .flush()
            .context("failed to create empty map")?;
        Ok(Self {
            address_map,
            next_id: FIRST_NON_SINGLETON_ADDR,
            network_name,
        })
    }

    /// Allocates a new ID address and stores a mapping of the argument address to it.
    /// Fails if the argument address is already present in the map.
    pub fn map_address_to_new_id<BS: Blockstore>(
        &mut self,
        store: &BS,
        addr: &Address,
    ) -> anyhow::Result<Address> {
        let id = self.next_id;
        self.next_id += 1;

        let mut map =
            Hamt::<_, ActorID>::load_with_bit_width(&self.address_map, store, HAMT_BIT_WIDTH)
                .context("failed to load address map")?;
        let is_new = map
            .set_if_absent(addr.to_bytes().into(), id)
            .context("failed to set map key")?;
        if !is_new {
            bail!("address {addr} is already allocated in the address map");
        }
        self.address_map = map.flush().context("failed to store address map")?;

        Ok(Address::new_id(id))
    }

    /// Resolves an address to an ID-address, if possible. ID addresses are
    /// returned as-is; unknown addresses yield `None`.
    pub fn resolve_address<BS: Blockstore>(
        &self,
        store: &BS,
        addr: &Address,
    ) -> anyhow::Result<Option<Address>> {
        if addr.protocol() == Protocol::ID {
            return Ok(Some(*addr));
        }

        let map =
            Hamt::<_, ActorID>::load_with_bit_width(&self.address_map, store, HAMT_BIT_WIDTH)
                .context("failed to load address map")?;

        let found = map
            .get(&addr.to_bytes())
            .context("failed to get address entry")?;
        Ok(found.copied().map(Address::new_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDB;
    use crate::shim::address::bls_addr;

    #[test]
    fn allocates_sequential_ids() {
        let store = MemoryDB::default();
        let mut state = State::new(&store, "test".into()).unwrap();
        let a = bls_addr(1).unwrap();
        let b = bls_addr(2).unwrap();

        assert_eq!(
            state.map_address_to_new_id(&store, &a).unwrap(),
            Address::new_id(FIRST_NON_SINGLETON_ADDR)
        );
        assert_eq!(
            state.map_address_to_new_id(&store, &b).unwrap(),
            Address::new_id(FIRST_NON_SINGLETON_ADDR + 1)
        );
        assert_eq!(
            state.resolve_address(&store, &b).unwrap(),
            Some(Address::new_id(FIRST_NON_SINGLETON_ADDR + 1))
        );
        assert_eq!(state.resolve_address(&store, &bls_addr(3).unwrap()).unwrap(), None);
    }

    #[test]
    fn rejects_duplicate_mapping() {
        let store = MemoryDB::default();
        let mut state = State::new(&store, "test".into()).unwrap();
        let a = bls_addr(1).unwrap();
        state.map_address_to_new_id(&store, &a).unwrap();
        assert!(state.map_address_to_new_id(&store, &a).is_err());
    }

    #[test]
    fn id_addresses_resolve_to_themselves() {
        let store = MemoryDB::default();
        let state = State::new(&store, "test".into()).unwrap();
        let id = Address::new_id(42);
        assert_eq!(state.resolve_address(&store, &id).unwrap(), Some(id));
    }
}
