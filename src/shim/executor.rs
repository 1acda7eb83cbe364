// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use fvm_ipld_encoding::RawBytes;
use fvm_ipld_encoding::tuple::*;

use crate::shim::error::{ActorError, ExitCode};

/// Result of a state transition from a message
#[derive(PartialEq, Eq, Clone, Debug, Serialize_tuple, Deserialize_tuple)]
pub struct Receipt {
    pub exit_code: ExitCode,
    pub return_data: RawBytes,
    pub gas_used: u64,
}

impl Receipt {
    pub fn exit_code(&self) -> ExitCode {
        self.exit_code
    }
}

/// Outcome of applying a single message: the receipt plus the actor error, if
/// the invocation aborted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApplyRet {
    pub msg_receipt: Receipt,
    pub act_error: Option<ActorError>,
}

impl ApplyRet {
    pub fn success(return_data: RawBytes) -> Self {
        Self {
            msg_receipt: Receipt {
                exit_code: ExitCode::OK,
                return_data,
                gas_used: 0,
            },
            act_error: None,
        }
    }

    pub fn failure(err: ActorError) -> Self {
        Self {
            msg_receipt: Receipt {
                exit_code: err.exit_code(),
                return_data: RawBytes::default(),
                gas_used: 0,
            },
            act_error: Some(err),
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        self.msg_receipt.exit_code()
    }

    pub fn return_data(&self) -> &RawBytes {
        &self.msg_receipt.return_data
    }

    pub fn failure_info(&self) -> Option<String> {
        self.act_error.as_ref().map(|e| e.to_string())
    }
}
