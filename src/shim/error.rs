// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT
use super::fvm_shared_latest::error::ExitCode as ExitCode_latest;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// `Newtype` wrapper for the FVM `ExitCode`.
///
/// # Examples
/// ```
/// # use actor_harness::shim::error::ExitCode;
/// let ok = ExitCode::from(0);
/// assert!(ok.is_success());
/// assert_eq!(ok.to_string(), "0");
/// assert_eq!(ExitCode::SYS_SENDER_INVALID.to_string(), "SysErrSenderInvalid(1)");
/// ```
#[derive(
    PartialEq, Eq, Debug, Clone, Copy, Serialize, Deserialize, derive_more::From, derive_more::Into,
)]
pub struct ExitCode(ExitCode_latest);

impl PartialOrd for ExitCode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.value().cmp(&other.value()))
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self.0 {
            ExitCode_latest::SYS_SENDER_INVALID => Some("SysErrSenderInvalid"),
            ExitCode_latest::SYS_SENDER_STATE_INVALID => Some("SysErrSenderStateInvalid"),
            ExitCode_latest::SYS_ILLEGAL_INSTRUCTION => Some("SysErrIllegalInstruction"),
            ExitCode_latest::SYS_INVALID_RECEIVER => Some("SysErrInvalidReceiver"),
            ExitCode_latest::SYS_INSUFFICIENT_FUNDS => Some("SysErrInsufficientFunds"),
            ExitCode_latest::SYS_OUT_OF_GAS => Some("SysErrOutOfGas"),
            ExitCode_latest::SYS_ILLEGAL_EXIT_CODE => Some("SysErrIllegalExitCode"),
            ExitCode_latest::SYS_ASSERTION_FAILED => Some("SysFatal"),
            ExitCode_latest::SYS_MISSING_RETURN => Some("SysErrMissingReturn"),

            ExitCode_latest::USR_ILLEGAL_ARGUMENT => Some("ErrIllegalArgument"),
            ExitCode_latest::USR_NOT_FOUND => Some("ErrNotFound"),
            ExitCode_latest::USR_FORBIDDEN => Some("ErrForbidden"),
            ExitCode_latest::USR_INSUFFICIENT_FUNDS => Some("ErrInsufficientFunds"),
            ExitCode_latest::USR_ILLEGAL_STATE => Some("ErrIllegalState"),
            ExitCode_latest::USR_SERIALIZATION => Some("ErrSerialization"),
            ExitCode_latest::USR_UNHANDLED_MESSAGE => Some("ErrUnhandledMessage"),
            ExitCode_latest::USR_UNSPECIFIED => Some("ErrUnspecified"),
            ExitCode_latest::USR_ASSERTION_FAILED => Some("ErrAssertionFailed"),
            ExitCode_latest::USR_READ_ONLY => Some("ErrReadOnly"),
            ExitCode_latest::USR_NOT_PAYABLE => Some("ErrNotPayable"),

            _ => None,
        };
        match name {
            Some(name) => write!(f, "{}({})", name, self.value()),
            None => write!(f, "{}", self.value()),
        }
    }
}

impl ExitCode {
    pub const OK: Self = Self::new(ExitCode_latest::OK);

    /// The message sender doesn't exist or is not an account.
    pub const SYS_SENDER_INVALID: Self = Self::new(ExitCode_latest::SYS_SENDER_INVALID);

    /// The message sequence didn't match the sender's state.
    pub const SYS_SENDER_STATE_INVALID: Self =
        Self::new(ExitCode_latest::SYS_SENDER_STATE_INVALID);

    /// The message receiver doesn't exist and can't be created implicitly.
    pub const SYS_INVALID_RECEIVER: Self = Self::new(ExitCode_latest::SYS_INVALID_RECEIVER);

    /// The message sender didn't have the requisite funds.
    pub const SYS_INSUFFICIENT_FUNDS: Self = Self::new(ExitCode_latest::SYS_INSUFFICIENT_FUNDS);

    pub const USR_FORBIDDEN: Self = Self::new(ExitCode_latest::USR_FORBIDDEN);
    pub const USR_SERIALIZATION: Self = Self::new(ExitCode_latest::USR_SERIALIZATION);
    pub const USR_UNHANDLED_MESSAGE: Self = Self::new(ExitCode_latest::USR_UNHANDLED_MESSAGE);

    pub fn value(&self) -> u32 {
        self.0.value()
    }

    pub fn is_success(&self) -> bool {
        self.0.is_success()
    }

    pub const fn new(value: ExitCode_latest) -> Self {
        Self(value)
    }
}

impl From<u32> for ExitCode {
    fn from(value: u32) -> Self {
        Self(ExitCode_latest::new(value))
    }
}

/// The error an actor invocation aborted with. Carried next to the receipt so
/// tests can inspect why a message failed.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("ActorError(exit_code: {exit_code}, msg: {msg})")]
pub struct ActorError {
    /// The exit code for this invocation, never success.
    exit_code: ExitCode,
    /// Message for debugging purposes.
    msg: String,
}

impl ActorError {
    pub fn new(exit_code: ExitCode, msg: impl Into<String>) -> Self {
        Self {
            exit_code,
            msg: msg.into(),
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        self.exit_code
    }

    pub fn msg(&self) -> &str {
        &self.msg
    }
}

/// Convenience macro for constructing an [`ActorError`]
/// ```ignore
/// actor_error!(USR_FORBIDDEN; "cannot exec {}", code)
/// ```
macro_rules! actor_error {
    ($code:ident; $($arg:tt)*) => {
        $crate::shim::error::ActorError::new(
            $crate::shim::error::ExitCode::$code,
            format!($($arg)*),
        )
    };
}
pub(crate) use actor_error;
