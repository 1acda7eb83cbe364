// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Deterministic test harness for Filecoin-style actor message execution.

pub mod builtin;
pub mod chain;
pub mod db;
pub mod genesis;
pub mod harness;
pub mod interpreter;
pub mod key_management;
pub mod logger;
pub mod shim;
pub mod utils;

pub use harness::{AddressSlot, Harness, HarnessMessage, HarnessOption, Stage};
