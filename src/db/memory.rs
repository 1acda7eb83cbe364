// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use ahash::HashMap;
use cid::Cid;
use fvm_ipld_blockstore::Blockstore;
use parking_lot::RwLock;

/// Content-addressed, append-only in-memory block store. Blocks are never
/// replaced once written, so any previously returned root keeps resolving to
/// the same snapshot.
#[derive(Debug, Default)]
pub struct MemoryDB {
    blockchain_db: RwLock<HashMap<Cid, Vec<u8>>>,
}

impl MemoryDB {
    /// Number of distinct blocks held.
    pub fn len(&self) -> usize {
        self.blockchain_db.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blockchain_db.read().is_empty()
    }
}

impl Blockstore for MemoryDB {
    fn get(&self, k: &Cid) -> anyhow::Result<Option<Vec<u8>>> {
        Ok(self.blockchain_db.read().get(k).cloned())
    }

    fn put_keyed(&self, k: &Cid, block: &[u8]) -> anyhow::Result<()> {
        self.blockchain_db
            .write()
            .entry(*k)
            .or_insert_with(|| block.to_vec());
        Ok(())
    }

    fn has(&self, k: &Cid) -> anyhow::Result<bool> {
        Ok(self.blockchain_db.read().contains_key(k))
    }
}
