// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

pub use super::fvm_shared_latest::version::NetworkVersion;

/// Network version the harness engine reports when a context does not pick one.
pub const DEFAULT_NETWORK_VERSION: NetworkVersion = NetworkVersion::V21;
