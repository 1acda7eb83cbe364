// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::sync::Arc;

use ahash::HashSet;
use cid::Cid;
use fvm_ipld_blockstore::Blockstore;
use parking_lot::Mutex;
use tracing::debug;

use super::Error;
use crate::shim::state_tree::StateTree;

/// Tracks the state roots produced by a harness run: the genesis root, the
/// heaviest (most recently flushed) root and every root in between.
///
/// Roots are only ever appended; earlier roots stay loadable because the
/// backing store is append-only.
pub struct ChainStore<DB> {
    /// key-value `datastore`.
    db: Arc<DB>,

    genesis_state_root: Cid,

    roots: Mutex<Roots>,
}

/// Flushed roots, oldest first, plus an index for membership checks. The list
/// is never empty and the last entry is the heaviest.
struct Roots {
    ordered: Vec<Cid>,
    known: HashSet<Cid>,
}

impl<DB> ChainStore<DB>
where
    DB: Blockstore,
{
    pub fn new(db: Arc<DB>, genesis_state_root: Cid) -> Self {
        Self {
            db,
            genesis_state_root,
            roots: Mutex::new(Roots {
                ordered: vec![genesis_state_root],
                known: HashSet::from_iter([genesis_state_root]),
            }),
        }
    }

    /// Records `root` as the heaviest state. Re-recording the current
    /// heaviest root is a no-op.
    pub fn set_heaviest_state(&self, root: Cid) {
        let mut roots = self.roots.lock();
        if roots.ordered.last() == Some(&root) {
            return;
        }
        debug!(%root, "new heaviest state root");
        roots.ordered.push(root);
        roots.known.insert(root);
    }

    pub fn genesis_state_root(&self) -> Cid {
        self.genesis_state_root
    }

    pub fn heaviest_state_root(&self) -> Cid {
        self.roots
            .lock()
            .ordered
            .last()
            .copied()
            .unwrap_or(self.genesis_state_root)
    }

    /// Every recorded root, genesis first.
    pub fn state_roots(&self) -> Vec<Cid> {
        self.roots.lock().ordered.clone()
    }

    /// Loads a state tree view at a root previously recorded in this store.
    pub fn load_state_tree(&self, root: &Cid) -> Result<StateTree<Arc<DB>>, Error> {
        if !self.roots.lock().known.contains(root) {
            return Err(Error::UnknownRoot(*root));
        }
        Ok(StateTree::new_from_root(Arc::clone(&self.db), root)?)
    }

    /// Loads the state tree at the heaviest root.
    pub fn heaviest_state_tree(&self) -> Result<StateTree<Arc<DB>>, Error> {
        self.load_state_tree(&self.heaviest_state_root())
    }
}
