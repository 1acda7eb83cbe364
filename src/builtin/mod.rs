// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

pub mod account;
pub mod init;

use std::sync::LazyLock;

use cid::Cid;

use crate::shim::{ActorID, address::Address};
use crate::utils::cid::raw_blake2b256;

/// Distinguished System actor address.
pub const SYSTEM_ACTOR_ADDR: Address = Address::new_id(0);
/// Distinguished Init actor address.
pub const INIT_ACTOR_ADDR: Address = Address::new_id(1);

/// First ID handed out to actors that are not singletons.
pub const FIRST_NON_SINGLETON_ADDR: ActorID = 100;

/// Network name recorded in the genesis Init actor state.
pub const HARNESS_NETWORK_NAME: &str = "harness";

fn make_builtin(name: &str) -> Cid {
    raw_blake2b256(format!("fil/harness/{name}").as_bytes())
}

pub static SYSTEM_ACTOR_CODE_ID: LazyLock<Cid> = LazyLock::new(|| make_builtin("system"));
pub static INIT_ACTOR_CODE_ID: LazyLock<Cid> = LazyLock::new(|| make_builtin("init"));
pub static ACCOUNT_ACTOR_CODE_ID: LazyLock<Cid> = LazyLock::new(|| make_builtin("account"));
pub static MULTISIG_ACTOR_CODE_ID: LazyLock<Cid> = LazyLock::new(|| make_builtin("multisig"));
pub static PAYCH_ACTOR_CODE_ID: LazyLock<Cid> = LazyLock::new(|| make_builtin("paymentchannel"));

/// Code identifiers the engine knows how to run itself. Anything else is a
/// user actor whose constructor params are stored verbatim as its state.
pub fn is_builtin_singleton(code: &Cid) -> bool {
    code == &*SYSTEM_ACTOR_CODE_ID || code == &*INIT_ACTOR_CODE_ID
}

pub fn is_account_actor(code: &Cid) -> bool {
    code == &*ACCOUNT_ACTOR_CODE_ID
}
