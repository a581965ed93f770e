//! Hashing utilities
//!
//! Keccak-256 is used for transaction identifiers, proposal digests and
//! signer identities.

use sha3::{Digest, Keccak256};

/// Prefix applied by personal-sign tooling before signing a 32-byte digest
const SIGNED_MESSAGE_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n32";

/// Computes Keccak-256 hash of the input data
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Computes Keccak-256 over the concatenation of several byte slices
pub fn keccak256_concat(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// Computes Keccak-256 hash and returns it as a hex string
pub fn keccak256_hex(data: &[u8]) -> String {
    hex::encode(keccak256(data))
}

/// Hash that signers actually sign for a given digest
pub fn eth_signed_message_hash(digest: &[u8; 32]) -> [u8; 32] {
    keccak256_concat(&[SIGNED_MESSAGE_PREFIX, digest])
}
