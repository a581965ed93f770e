//! Signature bundle validation
//!
//! Recovers the signer behind each signature, checks membership in the
//! registry and enforces strictly ascending signer order. The ordering
//! check alone rejects duplicates, so no auxiliary set is needed.

use crate::core::Address;
use crate::crypto::{eth_signed_message_hash, recover_signer};
use crate::multisig::error::MultisigError;
use crate::multisig::registry::SignerRegistry;
use secp256k1::{Secp256k1, VerifyOnly};

/// Capability that maps a signature over a digest back to a signer identity
pub trait SignatureScheme {
    fn recover(&self, digest: &[u8; 32], signature: &[u8]) -> Result<Address, MultisigError>;
}

/// Recoverable secp256k1 ECDSA over the personal-sign prefixed digest
#[derive(Clone)]
pub struct Secp256k1Scheme {
    secp: Secp256k1<VerifyOnly>,
}

impl Secp256k1Scheme {
    pub fn new() -> Self {
        Self {
            secp: Secp256k1::verification_only(),
        }
    }
}

impl Default for Secp256k1Scheme {
    fn default() -> Self {
        Self::new()
    }
}

impl SignatureScheme for Secp256k1Scheme {
    fn recover(&self, digest: &[u8; 32], signature: &[u8]) -> Result<Address, MultisigError> {
        let hash = eth_signed_message_hash(digest);
        recover_signer(&self.secp, &hash, signature)
            .map_err(|e| MultisigError::InvalidSignature(e.to_string()))
    }
}

/// Signatures submitted with a proposal
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SignatureBundle {
    /// Signatures in ascending signer order
    pub signatures: Vec<Vec<u8>>,
    /// Asserted signer for each signature, for callers that name signers explicitly
    pub signers: Option<Vec<Address>>,
}

impl SignatureBundle {
    pub fn new(signatures: Vec<Vec<u8>>) -> Self {
        Self {
            signatures,
            signers: None,
        }
    }

    /// Bundle where each signature is paired with the identity it claims
    pub fn with_signers(signatures: Vec<Vec<u8>>, signers: Vec<Address>) -> Self {
        Self {
            signatures,
            signers: Some(signers),
        }
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }
}

/// Signers accepted from a bundle
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Approval {
    /// Distinct authorized signers in ascending order
    pub signers: Vec<Address>,
    pub threshold: u8,
}

impl Approval {
    /// True when enough signers approved
    pub fn is_sufficient(&self) -> bool {
        self.signers.len() >= self.threshold as usize
    }
}

/// Verifies signature bundles against a registry
///
/// Pure: holds only borrowed state and never mutates it.
pub struct SignatureValidator<'a, S: SignatureScheme + ?Sized> {
    registry: &'a SignerRegistry,
    scheme: &'a S,
}

impl<'a, S: SignatureScheme + ?Sized> SignatureValidator<'a, S> {
    pub fn new(registry: &'a SignerRegistry, scheme: &'a S) -> Self {
        Self { registry, scheme }
    }

    /// Validate every signature in `bundle` over `digest`
    ///
    /// Fails on the first unrecoverable signature, unauthorized signer or
    /// ordering violation. A well-formed bundle with too few signers is not
    /// an error here; check [`Approval::is_sufficient`].
    pub fn validate(
        &self,
        digest: &[u8; 32],
        bundle: &SignatureBundle,
    ) -> Result<Approval, MultisigError> {
        if let Some(claimed) = &bundle.signers {
            if claimed.len() != bundle.signatures.len() {
                return Err(MultisigError::InvalidSignature(format!(
                    "{} signers listed for {} signatures",
                    claimed.len(),
                    bundle.signatures.len()
                )));
            }
        }

        let mut signers: Vec<Address> = Vec::with_capacity(bundle.len());

        for (index, signature) in bundle.signatures.iter().enumerate() {
            let recovered = self.scheme.recover(digest, signature)?;

            if let Some(claimed) = bundle.signers.as_ref().map(|s| s[index]) {
                if claimed != recovered {
                    return Err(MultisigError::InvalidSignature(format!(
                        "signature {} recovers {} but claims {}",
                        index, recovered, claimed
                    )));
                }
            }

            if !self.registry.is_signer(&recovered) {
                return Err(MultisigError::SignerNotAuthorized(recovered));
            }

            if let Some(&previous) = signers.last() {
                if recovered <= previous {
                    return Err(MultisigError::SignerOrderViolation {
                        previous,
                        current: recovered,
                    });
                }
            }

            log::debug!("Signature {} accepted from {}", index, recovered);
            signers.push(recovered);
        }

        Ok(Approval {
            signers,
            threshold: self.registry.threshold(),
        })
    }
}
