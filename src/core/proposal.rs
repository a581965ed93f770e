//! Proposals and their canonical encoding
//!
//! Off-chain signers must reproduce this encoding exactly. Every scalar
//! is a 32-byte big-endian word, addresses are left-padded and the call
//! payload enters as its Keccak-256 hash:
//!
//! ```text
//! transaction_id = keccak256(TX_TYPEHASH || destination || value || keccak256(payload)
//!                            || deadline || nonce)
//! digest         = keccak256(EXEC_TYPEHASH || destination || value || keccak256(payload)
//!                            || deadline || transaction_id || wallet)
//! ```

use crate::core::address::{decode_fixed, Address, AddressError};
use crate::crypto::{keccak256, keccak256_concat};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Type string hashed into every transaction identifier
pub const TX_TYPE: &str =
    "MultisigTransaction(address destination,uint256 value,bytes data,uint256 deadline,uint256 nonce)";

/// Type string hashed into every execution digest
pub const EXEC_TYPE: &str = "MultisigExecute(address destination,uint256 value,bytes data,uint256 deadline,bytes32 transactionId,address wallet)";

/// Encode an integer as a 32-byte big-endian word
pub fn u64_word(value: u64) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Deterministic identifier of a proposal, used as the replay ledger key
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransactionId([u8; 32]);

impl TransactionId {
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Abbreviated form for log lines
    pub fn short(&self) -> String {
        hex::encode(&self.0[..6])
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransactionId({})", self)
    }
}

impl FromStr for TransactionId {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_fixed::<32>(s).map(Self)
    }
}

impl Serialize for TransactionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TransactionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// A candidate call awaiting authorization
///
/// Exists only as an argument to execution; nothing about a proposal is
/// stored except its identifier once it has been executed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Proposal {
    /// Identity to invoke
    pub destination: Address,
    /// Amount transferred with the call
    pub value: u64,
    /// Opaque call data
    pub payload: Vec<u8>,
    /// Unix timestamp (seconds) after which the proposal is invalid
    pub deadline: u64,
    /// Disambiguates otherwise identical proposals
    pub nonce: u64,
}

impl Proposal {
    pub fn new(
        destination: Address,
        value: u64,
        payload: Vec<u8>,
        deadline: u64,
        nonce: u64,
    ) -> Self {
        Self {
            destination,
            value,
            payload,
            deadline,
            nonce,
        }
    }

    pub fn payload_hash(&self) -> [u8; 32] {
        keccak256(&self.payload)
    }

    /// Expired strictly after the deadline; `now == deadline` is still valid
    pub fn is_expired(&self, now: u64) -> bool {
        now > self.deadline
    }

    pub fn transaction_id(&self) -> TransactionId {
        let typehash = keccak256(TX_TYPE.as_bytes());
        TransactionId(keccak256_concat(&[
            &typehash,
            &self.destination.to_word(),
            &u64_word(self.value),
            &self.payload_hash(),
            &u64_word(self.deadline),
            &u64_word(self.nonce),
        ]))
    }

    /// Message signed off-chain, bound to one wallet instance
    pub fn digest(&self, transaction_id: &TransactionId, wallet: &Address) -> [u8; 32] {
        let typehash = keccak256(EXEC_TYPE.as_bytes());
        keccak256_concat(&[
            &typehash,
            &self.destination.to_word(),
            &u64_word(self.value),
            &self.payload_hash(),
            &u64_word(self.deadline),
            transaction_id.as_bytes(),
            &wallet.to_word(),
        ])
    }
}
