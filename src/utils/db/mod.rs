// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use cid::Cid;
use fvm_ipld_blockstore::Blockstore;
use multihash_codetable::{Code, MultihashDigest as _};
use serde::Serialize;

/// Extension methods for inserting and retrieving IPLD data with CIDs
pub trait CborStoreExt: Blockstore {
    /// Puts the object into the store as `dag-cbor` keyed by its BLAKE2b-256
    /// CID and returns that CID.
    fn put_cbor_default<S: Serialize>(&self, obj: &S) -> anyhow::Result<Cid> {
        let bytes = fvm_ipld_encoding::to_vec(obj)?;
        let cid = Cid::new_v1(
            fvm_ipld_encoding::DAG_CBOR,
            Code::Blake2b256.digest(&bytes),
        );
        self.put_keyed(&cid, &bytes)?;
        Ok(cid)
    }
}

impl<T: Blockstore> CborStoreExt for T {}
