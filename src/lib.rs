//! Multisig Executor: a threshold multi-signature wallet engine in Rust
//!
//! This crate authorizes arbitrary calls on behalf of a fixed signer set
//! using signatures collected off-chain:
//! - M-of-N signer registry fixed at initialization
//! - Recoverable ECDSA signatures (secp256k1) behind a pluggable scheme
//! - Strictly ascending signer order, which also rules out duplicates
//! - Deadlines and nonces on every proposal
//! - Replay ledger that consumes a proposal before its call runs
//! - Digests bound to the wallet's own identity against cross-wallet replay
//! - JSON persistence with backups
//!
//! # Example
//!
//! ```rust
//! use multisig_executor::contract::AccountLedger;
//! use multisig_executor::core::{Address, Proposal};
//! use multisig_executor::crypto::KeyPair;
//! use multisig_executor::multisig::{MultisigError, ProposalExecutor, SignatureBundle, SignerRegistry};
//!
//! // Three signers, sorted into canonical order
//! let mut keys: Vec<KeyPair> = (0..3).map(|_| KeyPair::generate()).collect();
//! keys.sort_by_key(|k| k.address());
//!
//! // A 2-of-3 wallet holding some funds
//! let registry = SignerRegistry::new(keys.iter().map(|k| k.address()).collect(), 2).unwrap();
//! let identity = registry.derive_wallet_identity(b"guild-treasury");
//! let mut wallet = ProposalExecutor::with_defaults(identity, registry);
//! let mut accounts = AccountLedger::new();
//! accounts.deposit(identity, 1_000).unwrap();
//!
//! // Two signers approve a payout off-chain
//! let player = Address::from_bytes([0x42; 20]);
//! let proposal = Proposal::new(player, 250, Vec::new(), u64::MAX, 1);
//! let digest = wallet.digest(&proposal);
//! let bundle = SignatureBundle::new(vec![
//!     keys[0].sign_digest(&digest).unwrap().to_vec(),
//!     keys[1].sign_digest(&digest).unwrap().to_vec(),
//! ]);
//!
//! let outcome = wallet.execute_transaction(&proposal, &bundle, &mut accounts).unwrap();
//! assert!(outcome.success);
//! assert_eq!(accounts.balance(&player), 250);
//!
//! // The same bundle cannot be used twice
//! assert!(matches!(
//!     wallet.execute_transaction(&proposal, &bundle, &mut accounts),
//!     Err(MultisigError::AlreadyExecuted(_))
//! ));
//! ```

pub mod cli;
pub mod contract;
pub mod core;
pub mod crypto;
pub mod multisig;
pub mod storage;

// Re-export commonly used types
pub use contract::{AccountLedger, CallContext, CallError, CallTarget};
pub use crate::core::{Address, Proposal, TransactionId};
pub use crypto::KeyPair;
pub use multisig::{
    Clock, ExecutionOutcome, MultisigError, ProposalExecutor, Secp256k1Scheme, SignatureBundle,
    SignatureScheme, SignerRegistry, SystemClock, WalletState,
};
pub use storage::{Storage, StorageConfig, StoredWallet};
