// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use crate::shim::{
    address::{self, Address, bls_addr},
    econ::{TokenAmount, atto},
};

/// Ordered address to genesis balance list. Each address appears at most
/// once; genesis creates accounts in list order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FundingRegistry {
    entries: Vec<(Address, TokenAmount)>,
}

impl FundingRegistry {
    /// Sets the balance of `addr`, appending it if it is new. Returns the
    /// previous balance.
    pub fn upsert(&mut self, addr: Address, balance: TokenAmount) -> Option<TokenAmount> {
        match self.entries.iter_mut().find(|(a, _)| *a == addr) {
            Some((_, existing)) => Some(std::mem::replace(existing, balance)),
            None => {
                self.entries.push((addr, balance));
                None
            }
        }
    }

    /// Removes `addr`, keeping the order of the remaining entries.
    pub fn remove(&mut self, addr: &Address) -> Option<TokenAmount> {
        let pos = self.entries.iter().position(|(a, _)| a == addr)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn get(&self, addr: &Address) -> Option<&TokenAmount> {
        self.entries
            .iter()
            .find_map(|(a, balance)| (a == addr).then_some(balance))
    }

    pub fn contains(&self, addr: &Address) -> bool {
        self.get(addr).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[(Address, TokenAmount)] {
        &self.entries
    }

    pub fn addresses(&self) -> impl Iterator<Item = &Address> {
        self.entries.iter().map(|(a, _)| a)
    }
}

/// Genesis funding: the registry, the designated miner and the number of
/// addresses the harness has handed out, counting the default miner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FundingSpec {
    registry: FundingRegistry,
    miner: Address,
    n_addrs: u64,
}

impl FundingSpec {
    /// Starts with the default miner funded with `miner_funds`.
    pub fn new(miner_funds: u64) -> Result<Self, address::Error> {
        let miner = default_miner()?;
        let mut registry = FundingRegistry::default();
        registry.upsert(miner, atto(miner_funds));
        Ok(Self {
            registry,
            miner,
            n_addrs: 1,
        })
    }

    pub fn registry(&self) -> &FundingRegistry {
        &self.registry
    }

    pub fn miner(&self) -> Address {
        self.miner
    }

    pub fn n_addrs(&self) -> u64 {
        self.n_addrs
    }

    /// Funds `addr`; a repeated address keeps its position and takes the new
    /// balance.
    pub fn fund(&mut self, addr: Address, balance: TokenAmount) {
        self.registry.upsert(addr, balance);
    }

    /// Counts an address the key provider generated for this harness.
    pub fn record_generated(&mut self) {
        self.n_addrs += 1;
    }

    /// Makes `addr` the miner. The previous miner loses its funding; the new
    /// one is not funded by this call.
    pub fn replace_miner(&mut self, addr: Address) -> Address {
        self.registry.remove(&self.miner);
        std::mem::replace(&mut self.miner, addr)
    }
}

/// The well-known address every harness starts with as its miner.
pub fn default_miner() -> Result<Address, address::Error> {
    bls_addr(0)
}
