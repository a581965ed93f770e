//! Cryptographic utilities for the multisig engine
//!
//! This module provides:
//! - Keccak-256 hashing and the personal-sign message prefix
//! - ECDSA key management (secp256k1) with recoverable signatures
//! - Signer identity derivation and recovery

pub mod hash;
pub mod keys;

pub use hash::{eth_signed_message_hash, keccak256, keccak256_concat, keccak256_hex};
pub use keys::{
    public_key_to_address, recover_signer, sign_prehash, KeyError, KeyPair, SIGNATURE_LENGTH,
};
