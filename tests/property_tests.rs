// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use actor_harness::harness::HarnessSettings;
use actor_harness::shim::{address::bls_addr, econ::atto, error::ExitCode};
use actor_harness::{AddressSlot, Harness, HarnessMessage, HarnessOption};
use quickcheck_macros::quickcheck;

fn seeded(seed: u64) -> HarnessSettings {
    HarnessSettings {
        rng_seed: Some(seed),
        ..Default::default()
    }
}

#[quickcheck]
fn tracked_nonces_are_gapless(count: u8) -> bool {
    let count = u64::from(count % 12);
    let Ok(mut h) = Harness::new(vec![]) else {
        return false;
    };
    let miner = h.miner();
    let to = bls_addr(3).unwrap();

    for expected in 0..count {
        if h.nonce(&miner) != expected {
            return false;
        }
        let Ok((ret, _)) = h.send_funds(miner, to, atto(1)) else {
            return false;
        };
        if ret.exit_code() != ExitCode::OK {
            return false;
        }
    }
    let state = h.state_tree().unwrap();
    state.get_actor(&miner).unwrap().unwrap().sequence == count && h.nonce(&miner) == count
}

#[quickcheck]
fn explicit_sequences_do_not_move_the_tracker(explicit: Vec<bool>) -> bool {
    let Ok(mut h) = Harness::new(vec![]) else {
        return false;
    };
    let miner = h.miner();
    let to = bls_addr(4).unwrap();

    let mut tracked = 0;
    for use_explicit in explicit.into_iter().take(10) {
        let sequence = use_explicit.then_some(99);
        if h
            .apply(HarnessMessage {
                from: miner,
                to,
                sequence,
                ..Default::default()
            })
            .is_err()
        {
            return false;
        }
        if !use_explicit {
            tracked += 1;
        }
        if h.nonce(&miner) != tracked {
            return false;
        }
    }
    true
}

#[quickcheck]
fn funded_registry_stays_unique(funds: Vec<(bool, u16)>, seed: u64) -> bool {
    let shared = AddressSlot::empty();
    let options = funds
        .iter()
        .take(8)
        .map(|(reuse, value)| {
            let slot = if *reuse {
                shared.clone()
            } else {
                AddressSlot::empty()
            };
            HarnessOption::fund(&slot, u64::from(*value))
        })
        .collect();
    let Ok(h) = Harness::with_settings(seeded(seed), options) else {
        return false;
    };

    let registry = h.funding().registry();
    let mut seen = ahash::HashSet::default();
    registry.addresses().all(|a| seen.insert(*a))
        && registry
            .entries()
            .iter()
            .all(|(addr, balance)| h.balance(addr).is_ok_and(|b| &b == balance))
}

#[quickcheck]
fn reload_after_flush_is_idempotent(amounts: Vec<u16>) -> bool {
    let Ok(mut h) = Harness::new(vec![]) else {
        return false;
    };
    let miner = h.miner();
    let to = bls_addr(5).unwrap();
    for amount in amounts.into_iter().take(6) {
        if h.send_funds(miner, to, atto(u64::from(amount))).is_err() {
            return false;
        }
    }

    let cs = h.chain_store().unwrap();
    let root = cs.heaviest_state_root();
    let first = cs.load_state_tree(&root).unwrap().actors().unwrap();
    let second = cs.load_state_tree(&root).unwrap().actors().unwrap();
    let live = h.state_tree().unwrap().actors().unwrap();
    first == second && first == live
}

#[quickcheck]
fn earlier_roots_stay_readable(amount: u16) -> bool {
    let Ok(mut h) = Harness::new(vec![]) else {
        return false;
    };
    let miner = h.miner();
    let genesis = h.chain_store().unwrap().genesis_state_root();
    if h
        .send_funds(miner, bls_addr(6).unwrap(), atto(u64::from(amount)))
        .is_err()
    {
        return false;
    }
    let old = h.chain_store().unwrap().load_state_tree(&genesis).unwrap();
    old.get_actor(&miner).unwrap().unwrap().balance == atto(1_000_000)
}
