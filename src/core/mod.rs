//! Core multisig data types
//!
//! This module contains the fundamental building blocks:
//! - Identities (20-byte addresses with canonical byte ordering)
//! - Proposals (destination, value, payload, deadline, nonce)
//! - Transaction identifiers and execution digests

pub mod address;
pub mod proposal;

pub use address::{Address, AddressError};
pub use proposal::{u64_word, Proposal, TransactionId, EXEC_TYPE, TX_TYPE};
