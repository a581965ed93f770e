//! Threshold multi-signature authorization and execution
//!
//! A wallet holds a fixed M-of-N signer set. Signers approve a proposal
//! off-chain by signing its digest; anyone can then submit the proposal
//! with a complete signature bundle and the wallet executes it at most once.
//!
//! # Example
//!
//! ```ignore
//! use multisig_executor::multisig::{ProposalExecutor, SignatureBundle, SignerRegistry};
//!
//! // Create a 2-of-3 wallet
//! let registry = SignerRegistry::new(vec![alice, bob, carol], 2)?;
//! let mut wallet = ProposalExecutor::with_defaults(identity, registry);
//!
//! // Signers sign the digest off-chain, in ascending identity order
//! let digest = wallet.digest(&proposal);
//! let bundle = SignatureBundle::new(vec![sig_alice, sig_bob]);
//!
//! // Consumes the proposal and calls the destination
//! let outcome = wallet.execute_transaction(&proposal, &bundle, &mut accounts)?;
//! ```

pub mod error;
pub mod executor;
pub mod registry;
pub mod replay;
pub mod validator;

pub use error::MultisigError;
pub use executor::{
    Clock, ExecutionOutcome, ManualClock, ProposalExecutor, SystemClock, WalletState,
};
pub use registry::SignerRegistry;
pub use replay::{ExecutionRecord, ReplayGuard};
pub use validator::{
    Approval, Secp256k1Scheme, SignatureBundle, SignatureScheme, SignatureValidator,
};
