//! Signer registry
//!
//! The fixed M-of-N signer set a wallet is initialized with.

use crate::core::{u64_word, Address};
use crate::crypto::keccak256_concat;
use crate::multisig::error::MultisigError;
use serde::{Deserialize, Serialize};

/// Unvalidated registry as it appears on disk
#[derive(Deserialize)]
struct RegistryData {
    signers: Vec<Address>,
    threshold: u8,
}

impl TryFrom<RegistryData> for SignerRegistry {
    type Error = MultisigError;

    fn try_from(data: RegistryData) -> Result<Self, Self::Error> {
        SignerRegistry::new(data.signers, data.threshold)
    }
}

/// Authorized signers and the required threshold
///
/// Immutable once constructed. Deserialization goes through the same
/// validation as [`SignerRegistry::new`].
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "RegistryData")]
pub struct SignerRegistry {
    /// Signer identities, strictly ascending
    signers: Vec<Address>,
    /// Minimum signatures required (M in M-of-N)
    threshold: u8,
}

impl SignerRegistry {
    /// Create a new registry
    ///
    /// Signers must be supplied in canonical order (strictly ascending
    /// identities), the same order signatures are later checked in.
    ///
    /// # Errors
    /// `InvalidThreshold` if the threshold is zero or exceeds the signer
    /// count, `DuplicateSigner` if any identity repeats, and
    /// `SignerOrderViolation` if the list is not ascending.
    pub fn new(signers: Vec<Address>, threshold: u8) -> Result<Self, MultisigError> {
        if threshold == 0 || threshold as usize > signers.len() {
            return Err(MultisigError::InvalidThreshold {
                threshold,
                signers: signers.len(),
            });
        }

        // Check for duplicates
        let mut sorted = signers.clone();
        sorted.sort();
        if let Some(pair) = sorted.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(MultisigError::DuplicateSigner(pair[0]));
        }

        if let Some(pair) = signers.windows(2).find(|pair| pair[0] > pair[1]) {
            return Err(MultisigError::SignerOrderViolation {
                previous: pair[0],
                current: pair[1],
            });
        }

        Ok(Self { signers, threshold })
    }

    /// Check if an identity is an authorized signer
    pub fn is_signer(&self, identity: &Address) -> bool {
        self.signers.contains(identity)
    }

    /// Get the threshold (M)
    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Get the total signer count (N)
    pub fn signer_count(&self) -> usize {
        self.signers.len()
    }

    pub fn signers(&self) -> &[Address] {
        &self.signers
    }

    /// Get description like "2-of-3"
    pub fn description(&self) -> String {
        format!("{}-of-{}", self.threshold, self.signers.len())
    }

    /// Derive a wallet identity for a deployment of this registry
    ///
    /// Identity = last 20 bytes of keccak256(threshold || signers || salt).
    /// The salt keeps two deployments with the same signer set apart.
    pub fn derive_wallet_identity(&self, salt: &[u8]) -> Address {
        let threshold = u64_word(self.threshold as u64);
        let mut parts: Vec<&[u8]> = Vec::with_capacity(self.signers.len() + 2);
        parts.push(&threshold);
        for signer in &self.signers {
            parts.push(signer.as_bytes());
        }
        parts.push(salt);

        let hash = keccak256_concat(&parts);
        let mut bytes = [0u8; Address::LEN];
        bytes.copy_from_slice(&hash[12..]);
        Address::from_bytes(bytes)
    }
}
