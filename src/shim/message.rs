// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use anyhow::{anyhow, ensure};
use fvm_ipld_encoding::{RawBytes, de::Deserializer, ser::Serializer};
use serde::{Deserialize, Serialize};

pub use super::fvm_shared_latest::{METHOD_CONSTRUCTOR, METHOD_SEND};
use crate::shim::{
    address::Address,
    econ::{TokenAmount, is_negative},
};

/// Method number indicator for calling actor methods.
pub type MethodNum = u64;

/// Unsigned message as handed to the execution engine. The sequence is always
/// concrete here; nonce tracking happens before a message reaches this type.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Message {
    pub version: u64,
    pub from: Address,
    pub to: Address,
    pub sequence: u64,
    pub value: TokenAmount,
    pub method_num: MethodNum,
    pub params: RawBytes,
    pub gas_limit: u64,
    pub gas_price: TokenAmount,
}

impl Default for Message {
    fn default() -> Self {
        Self {
            version: 0,
            from: Address::new_id(0),
            to: Address::new_id(0),
            sequence: 0,
            value: TokenAmount::default(),
            method_num: METHOD_SEND,
            params: RawBytes::default(),
            gas_limit: 0,
            gas_price: TokenAmount::default(),
        }
    }
}

impl Message {
    /// Does some basic checks on the Message to see if the fields are valid.
    pub fn check(self: &Message) -> anyhow::Result<()> {
        if self.gas_limit == 0 {
            return Err(anyhow!("Message has no gas limit set"));
        }
        if self.gas_limit > i64::MAX as u64 {
            return Err(anyhow!("Message gas exceeds i64 max"));
        }
        ensure!(!is_negative(&self.value), "message value cannot be negative");
        ensure!(
            !is_negative(&self.gas_price),
            "gas price cannot be negative"
        );
        Ok(())
    }

    /// Creates a new Message to transfer an amount of FIL specified in the `value` field.
    pub fn transfer(from: Address, to: Address, value: TokenAmount) -> Self {
        Message {
            from,
            to,
            value,
            method_num: METHOD_SEND,
            ..Default::default()
        }
    }

    pub fn cid(&self) -> Result<cid::Cid, fvm_ipld_encoding::Error> {
        use crate::utils::cid::CidCborExt;
        cid::Cid::from_cbor_blake2b256(self)
    }
}

impl Serialize for Message {
    fn serialize<S>(&self, s: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (
            &self.version,
            &self.to,
            &self.from,
            &self.sequence,
            &self.value,
            &self.gas_limit,
            &self.gas_price,
            &self.method_num,
            &self.params,
        )
            .serialize(s)
    }
}

impl<'de> Deserialize<'de> for Message {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (version, to, from, sequence, value, gas_limit, gas_price, method_num, params) =
            Deserialize::deserialize(deserializer)?;
        Ok(Self {
            version,
            from,
            to,
            sequence,
            value,
            method_num,
            params,
            gas_limit,
            gas_price,
        })
    }
}
