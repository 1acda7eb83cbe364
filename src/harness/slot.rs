// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::cell::Cell;
use std::rc::Rc;

use crate::shim::address::Address;

/// Shared in/out address parameter for harness options.
///
/// A test keeps one clone and hands another to an option. An empty slot asks
/// the option to fill it in; a filled slot tells the option which address to
/// use. Clones observe each other's writes.
#[derive(Clone, Debug, Default)]
pub struct AddressSlot(Rc<Cell<Option<Address>>>);

impl AddressSlot {
    /// A slot the harness is expected to fill.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A slot pinned to a known address.
    pub fn with(addr: Address) -> Self {
        Self(Rc::new(Cell::new(Some(addr))))
    }

    pub fn get(&self) -> Option<Address> {
        self.0.get()
    }

    pub fn set(&self, addr: Address) {
        self.0.set(Some(addr));
    }

    pub fn is_empty(&self) -> bool {
        self.get().is_none()
    }
}

impl From<Address> for AddressSlot {
    fn from(addr: Address) -> Self {
        Self::with(addr)
    }
}
