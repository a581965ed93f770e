//! Multisig error taxonomy

use crate::core::{Address, TransactionId};
use thiserror::Error;

/// Errors related to multisig operations
///
/// Every variant aborts execution without touching the replay ledger.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MultisigError {
    #[error("Invalid threshold: {threshold} of {signers} signers")]
    InvalidThreshold { threshold: u8, signers: usize },
    #[error("Duplicate signer: {0}")]
    DuplicateSigner(Address),
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),
    #[error("Signer not authorized: {0}")]
    SignerNotAuthorized(Address),
    #[error("Signer order violation: {current} does not follow {previous}")]
    SignerOrderViolation { previous: Address, current: Address },
    #[error("Insufficient signatures: have {have}, need {need}")]
    InsufficientSignatures { have: usize, need: u8 },
    #[error("Proposal expired: deadline {deadline}, now {now}")]
    ProposalExpired { deadline: u64, now: u64 },
    #[error("Transaction already executed: {0}")]
    AlreadyExecuted(TransactionId),
}
