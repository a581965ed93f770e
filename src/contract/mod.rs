//! Call target module
//!
//! The boundary between the multisig core and whatever it invokes.
//!
//! # Overview
//!
//! This module implements:
//! - The `CallTarget` trait the executor calls through
//! - An in-memory account ledger that moves value between identities
//! - Per-address call handlers standing in for deployed contracts
//!
//! # Example
//!
//! ```rust
//! use multisig_executor::contract::{AccountLedger, CallContext, CallTarget};
//! use multisig_executor::core::Address;
//!
//! let wallet = Address::from_bytes([1; 20]);
//! let player = Address::from_bytes([2; 20]);
//!
//! let mut ledger = AccountLedger::new();
//! ledger.deposit(wallet, 100).unwrap();
//!
//! let call = CallContext { caller: &wallet, destination: &player, value: 40, payload: &[] };
//! ledger.invoke(&call).unwrap();
//! assert_eq!(ledger.balance(&player), 40);
//! ```

pub mod ledger;
pub mod target;

pub use ledger::{AccountLedger, CallHandler};
pub use target::{CallContext, CallError, CallTarget};
