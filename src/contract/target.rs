//! Outbound call interface
//!
//! The executor treats whatever it calls as opaque: it hands over
//! `(destination, value, payload)` and only looks at success or failure.

use crate::core::Address;
use thiserror::Error;

/// Errors raised by a call target
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CallError {
    #[error("Insufficient balance in {account}: have {have}, need {need}")]
    InsufficientBalance {
        account: Address,
        have: u64,
        need: u64,
    },
    #[error("Balance overflow for {0}")]
    BalanceOverflow(Address),
    #[error("Call reverted: {0}")]
    Reverted(String),
}

/// A single outbound call
#[derive(Debug, Clone, Copy)]
pub struct CallContext<'a> {
    /// Identity making the call (the wallet)
    pub caller: &'a Address,
    pub destination: &'a Address,
    pub value: u64,
    pub payload: &'a [u8],
}

/// Something the wallet can invoke
pub trait CallTarget {
    /// Perform the call, returning its output
    ///
    /// A failed call must leave the target as it was before the call.
    fn invoke(&mut self, call: &CallContext<'_>) -> Result<Vec<u8>, CallError>;
}
