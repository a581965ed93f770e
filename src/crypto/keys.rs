//! ECDSA key management for multisig signers
//!
//! Provides key pair generation, recoverable signing and signer recovery
//! using the secp256k1 elliptic curve. A signer's identity is the last
//! 20 bytes of the Keccak-256 hash of its uncompressed public key.

use rand::rngs::OsRng;
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey, Verification};
use thiserror::Error;

use super::hash::{eth_signed_message_hash, keccak256};
use crate::core::Address;

/// Length of a serialized recoverable signature (r || s || v)
pub const SIGNATURE_LENGTH: usize = 65;

/// Errors that can occur during key operations
#[derive(Error, Debug)]
pub enum KeyError {
    #[error("Invalid private key")]
    InvalidPrivateKey,
    #[error("Invalid signature length: expected 65 bytes, got {0}")]
    InvalidSignatureLength(usize),
    #[error("Invalid recovery id: {0}")]
    InvalidRecoveryId(u8),
    #[error("Signature is not in canonical low-s form")]
    MalleableSignature,
    #[error("Secp256k1 error: {0}")]
    Secp256k1Error(#[from] secp256k1::Error),
}

/// A key pair consisting of a private key and its corresponding public key
#[derive(Clone)]
pub struct KeyPair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
}

impl KeyPair {
    /// Generate a new random key pair
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let (secret_key, public_key) = secp.generate_keypair(&mut OsRng);
        Self {
            secret_key,
            public_key,
        }
    }

    /// Create a key pair from an existing secret key
    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let secp = Secp256k1::new();
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);
        Self {
            secret_key,
            public_key,
        }
    }

    /// Create a key pair from a hex-encoded private key (optional `0x` prefix)
    pub fn from_private_key_hex(hex_key: &str) -> Result<Self, KeyError> {
        let trimmed = hex_key.trim();
        let bytes = hex::decode(trimmed.strip_prefix("0x").unwrap_or(trimmed))
            .map_err(|_| KeyError::InvalidPrivateKey)?;
        let secret_key =
            SecretKey::from_slice(&bytes).map_err(|_| KeyError::InvalidPrivateKey)?;
        Ok(Self::from_secret_key(secret_key))
    }

    /// Get the private key as a hex string
    pub fn private_key_hex(&self) -> String {
        hex::encode(self.secret_key.secret_bytes())
    }

    /// Get the public key as a hex string (compressed format)
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key.serialize())
    }

    /// Signer identity for this key
    pub fn address(&self) -> Address {
        public_key_to_address(&self.public_key)
    }

    /// Sign a proposal digest the way external signers do
    ///
    /// The digest is wrapped with the personal-sign prefix before signing,
    /// so the result verifies against `eth_signed_message_hash(digest)`.
    pub fn sign_digest(&self, digest: &[u8; 32]) -> Result<[u8; SIGNATURE_LENGTH], KeyError> {
        sign_prehash(&self.secret_key, &eth_signed_message_hash(digest))
    }
}

/// Convert a public key to a signer identity
pub fn public_key_to_address(public_key: &PublicKey) -> Address {
    let uncompressed = public_key.serialize_uncompressed();
    let hash = keccak256(&uncompressed[1..]);
    let mut bytes = [0u8; Address::LEN];
    bytes.copy_from_slice(&hash[12..]);
    Address::from_bytes(bytes)
}

/// Produce a 65-byte recoverable signature over an already-hashed message
pub fn sign_prehash(
    secret_key: &SecretKey,
    hash: &[u8; 32],
) -> Result<[u8; SIGNATURE_LENGTH], KeyError> {
    let secp = Secp256k1::signing_only();
    let message = Message::from_digest_slice(hash)?;
    let (recovery_id, compact) = secp
        .sign_ecdsa_recoverable(&message, secret_key)
        .serialize_compact();

    let mut signature = [0u8; SIGNATURE_LENGTH];
    signature[..64].copy_from_slice(&compact);
    signature[64] = recovery_id.to_i32() as u8 + 27;
    Ok(signature)
}

/// Recover the signer identity from a 65-byte signature over `hash`
///
/// Accepts `v` as either 0/1 or 27/28. High-s signatures are rejected so
/// each signer has exactly one valid encoding per message.
pub fn recover_signer<C: Verification>(
    secp: &Secp256k1<C>,
    hash: &[u8; 32],
    signature: &[u8],
) -> Result<Address, KeyError> {
    if signature.len() != SIGNATURE_LENGTH {
        return Err(KeyError::InvalidSignatureLength(signature.len()));
    }

    let v = signature[64];
    let rec_id = match v {
        27 | 28 => v - 27,
        0 | 1 => v,
        _ => return Err(KeyError::InvalidRecoveryId(v)),
    };
    let recovery_id =
        RecoveryId::from_i32(rec_id as i32).map_err(|_| KeyError::InvalidRecoveryId(v))?;
    let recoverable = RecoverableSignature::from_compact(&signature[..64], recovery_id)?;

    let mut normalized = recoverable.to_standard();
    normalized.normalize_s();
    if normalized != recoverable.to_standard() {
        return Err(KeyError::MalleableSignature);
    }

    let message = Message::from_digest_slice(hash)?;
    let public_key = secp.recover_ecdsa(&message, &recoverable)?;
    Ok(public_key_to_address(&public_key))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Secp256k1 group order n, big-endian
    const CURVE_ORDER: [u8; 32] = [
        0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
        0xfe, 0xba, 0xae, 0xdc, 0xe6, 0xaf, 0x48, 0xa0, 0x3b, 0xbf, 0xd2, 0x5e, 0x8c, 0xd0, 0x36,
        0x41, 0x41,
    ];

    fn negate_s(s: &[u8]) -> [u8; 32] {
        let mut out = [0u8; 32];
        let mut borrow = 0i16;
        for i in (0..32).rev() {
            let mut diff = CURVE_ORDER[i] as i16 - s[i] as i16 - borrow;
            if diff < 0 {
                diff += 256;
                borrow = 1;
            } else {
                borrow = 0;
            }
            out[i] = diff as u8;
        }
        out
    }

    #[test]
    fn test_key_pair_generation() {
        let kp = KeyPair::generate();
        assert_eq!(kp.private_key_hex().len(), 64);
        assert_eq!(kp.public_key_hex().len(), 66);
        assert_ne!(kp.address(), Address::ZERO);
    }

    #[test]
    fn test_key_pair_from_hex() {
        let kp1 = KeyPair::generate();
        let private_hex = format!("0x{}", kp1.private_key_hex());

        let kp2 = KeyPair::from_private_key_hex(&private_hex).unwrap();
        assert_eq!(kp1.public_key_hex(), kp2.public_key_hex());
        assert_eq!(kp1.address(), kp2.address());

        let doubled = format!("0x0x{}", kp1.private_key_hex());
        assert!(matches!(
            KeyPair::from_private_key_hex(&doubled),
            Err(KeyError::InvalidPrivateKey)
        ));
    }

    #[test]
    fn test_known_address_derivation() {
        // Private key 1 maps to a well-known identity
        let kp = KeyPair::from_private_key_hex(
            "0000000000000000000000000000000000000000000000000000000000000001",
        )
        .unwrap();
        assert_eq!(
            kp.address().to_string(),
            "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf"
        );
    }

    #[test]
    fn test_sign_and_recover() {
        let kp = KeyPair::generate();
        let hash = keccak256(b"approve payout");

        let signature = sign_prehash(&kp.secret_key, &hash).unwrap();
        assert!(signature[64] == 27 || signature[64] == 28);

        let secp = Secp256k1::verification_only();
        assert_eq!(recover_signer(&secp, &hash, &signature).unwrap(), kp.address());

        // Raw recovery id form is accepted too
        let mut raw_v = signature;
        raw_v[64] -= 27;
        assert_eq!(recover_signer(&secp, &hash, &raw_v).unwrap(), kp.address());
    }

    #[test]
    fn test_recover_wrong_message_yields_other_identity() {
        let kp = KeyPair::generate();
        let signature = sign_prehash(&kp.secret_key, &keccak256(b"one")).unwrap();

        let secp = Secp256k1::verification_only();
        match recover_signer(&secp, &keccak256(b"two"), &signature) {
            Ok(address) => assert_ne!(address, kp.address()),
            Err(_) => {}
        }
    }

    #[test]
    fn test_recover_rejects_malformed_input() {
        let secp = Secp256k1::verification_only();
        let hash = keccak256(b"x");

        assert!(matches!(
            recover_signer(&secp, &hash, &[0u8; 64]),
            Err(KeyError::InvalidSignatureLength(64))
        ));

        let kp = KeyPair::generate();
        let mut signature = sign_prehash(&kp.secret_key, &hash).unwrap();
        signature[64] = 5;
        assert!(matches!(
            recover_signer(&secp, &hash, &signature),
            Err(KeyError::InvalidRecoveryId(5))
        ));
    }

    #[test]
    fn test_recover_rejects_high_s() {
        let kp = KeyPair::generate();
        let hash = keccak256(b"malleable");
        let signature = sign_prehash(&kp.secret_key, &hash).unwrap();

        let mut flipped = signature;
        flipped[32..64].copy_from_slice(&negate_s(&signature[32..64]));
        flipped[64] = if signature[64] == 27 { 28 } else { 27 };

        let secp = Secp256k1::verification_only();
        assert!(matches!(
            recover_signer(&secp, &hash, &flipped),
            Err(KeyError::MalleableSignature)
        ));
    }

    #[test]
    fn test_sign_digest_uses_prefixed_hash() {
        let kp = KeyPair::generate();
        let digest = keccak256(b"digest");
        let signature = kp.sign_digest(&digest).unwrap();

        let secp = Secp256k1::verification_only();
        let prefixed = eth_signed_message_hash(&digest);
        assert_eq!(recover_signer(&secp, &prefixed, &signature).unwrap(), kp.address());
    }
}
