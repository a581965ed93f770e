//! Proposal execution
//!
//! Runs a proposal through expiry, replay and signature checks, consumes
//! its identifier and then invokes the target. Consumption happens before
//! the call and is permanent: a call that fails cannot be retried with the
//! same signatures, only resubmitted as a new proposal with a new nonce.

use crate::contract::{CallContext, CallTarget};
use crate::core::{Address, Proposal, TransactionId};
use crate::multisig::error::MultisigError;
use crate::multisig::registry::SignerRegistry;
use crate::multisig::replay::{ExecutionRecord, ReplayGuard};
use crate::multisig::validator::{
    Secp256k1Scheme, SignatureBundle, SignatureScheme, SignatureValidator,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::cell::Cell;

/// Source of the current time in unix seconds
pub trait Clock {
    fn now(&self) -> u64;
}

/// Wall-clock time
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        Utc::now().timestamp().max(0) as u64
    }
}

/// Clock that only moves when told to
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now: Cell<u64>,
}

impl ManualClock {
    pub fn new(now: u64) -> Self {
        Self { now: Cell::new(now) }
    }

    pub fn set(&self, now: u64) {
        self.now.set(now);
    }

    pub fn advance(&self, seconds: u64) {
        self.now.set(self.now.get().saturating_add(seconds));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.now.get()
    }
}

/// Persistent part of a wallet
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct WalletState {
    /// This wallet's own identity, bound into every digest
    pub identity: Address,
    pub registry: SignerRegistry,
    pub ledger: ReplayGuard,
}

/// Result of an authorized execution
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub transaction_id: TransactionId,
    /// Whether the target call succeeded
    pub success: bool,
    /// Output of a successful call
    pub return_data: Vec<u8>,
    /// Error reported by a failed call
    pub failure: Option<String>,
}

/// Threshold multisig wallet
///
/// Owns the signer registry and replay ledger; targets are passed in per
/// call so nothing is reached through globals.
pub struct ProposalExecutor<S = Secp256k1Scheme, C = SystemClock> {
    identity: Address,
    registry: SignerRegistry,
    guard: ReplayGuard,
    scheme: S,
    clock: C,
}

impl ProposalExecutor<Secp256k1Scheme, SystemClock> {
    /// Wallet using secp256k1 signatures and wall-clock time
    pub fn with_defaults(identity: Address, registry: SignerRegistry) -> Self {
        Self::new(identity, registry, Secp256k1Scheme::new(), SystemClock)
    }
}

impl<S: SignatureScheme, C: Clock> ProposalExecutor<S, C> {
    pub fn new(identity: Address, registry: SignerRegistry, scheme: S, clock: C) -> Self {
        Self {
            identity,
            registry,
            guard: ReplayGuard::new(),
            scheme,
            clock,
        }
    }

    /// Rebuild a wallet from persisted state
    pub fn from_state(state: WalletState, scheme: S, clock: C) -> Self {
        Self {
            identity: state.identity,
            registry: state.registry,
            guard: state.ledger,
            scheme,
            clock,
        }
    }

    /// Snapshot of the persistent state
    pub fn state(&self) -> WalletState {
        WalletState {
            identity: self.identity,
            registry: self.registry.clone(),
            ledger: self.guard.clone(),
        }
    }

    pub fn identity(&self) -> Address {
        self.identity
    }

    pub fn registry(&self) -> &SignerRegistry {
        &self.registry
    }

    pub fn ledger(&self) -> &ReplayGuard {
        &self.guard
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn transaction_id(&self, proposal: &Proposal) -> TransactionId {
        proposal.transaction_id()
    }

    /// Digest signers must sign for `proposal` on this wallet
    pub fn digest(&self, proposal: &Proposal) -> [u8; 32] {
        proposal.digest(&proposal.transaction_id(), &self.identity)
    }

    pub fn is_executed(&self, tx_id: &TransactionId) -> bool {
        self.guard.is_executed(tx_id)
    }

    pub fn execution(&self, tx_id: &TransactionId) -> Option<&ExecutionRecord> {
        self.guard.get(tx_id)
    }

    pub fn executed_count(&self) -> usize {
        self.guard.len()
    }

    /// Authorize and run a proposal
    ///
    /// Returns an error, with no state change, if the proposal is expired,
    /// already executed or not signed by enough authorized signers in
    /// ascending order. Otherwise the identifier is consumed and the target
    /// is called; a failing call is reported through
    /// [`ExecutionOutcome::success`], not as an error.
    pub fn execute_transaction(
        &mut self,
        proposal: &Proposal,
        bundle: &SignatureBundle,
        target: &mut dyn CallTarget,
    ) -> Result<ExecutionOutcome, MultisigError> {
        let tx_id = proposal.transaction_id();

        let now = self.clock.now();
        if proposal.is_expired(now) {
            log::warn!("Rejected {}: expired at {}", tx_id.short(), proposal.deadline);
            return Err(MultisigError::ProposalExpired {
                deadline: proposal.deadline,
                now,
            });
        }

        if self.guard.is_executed(&tx_id) {
            log::warn!("Rejected {}: already executed", tx_id.short());
            return Err(MultisigError::AlreadyExecuted(tx_id));
        }

        let digest = proposal.digest(&tx_id, &self.identity);
        let approval = SignatureValidator::new(&self.registry, &self.scheme)
            .validate(&digest, bundle)
            .map_err(|e| {
                log::warn!("Rejected {}: {}", tx_id.short(), e);
                e
            })?;

        if !approval.is_sufficient() {
            log::warn!(
                "Rejected {}: {} of {} required signatures",
                tx_id.short(),
                approval.signers.len(),
                approval.threshold
            );
            return Err(MultisigError::InsufficientSignatures {
                have: approval.signers.len(),
                need: approval.threshold,
            });
        }

        self.guard.mark_executed(tx_id, now)?;
        log::info!(
            "Authorized {} by {} signer(s), calling {} with value {}",
            tx_id.short(),
            approval.signers.len(),
            proposal.destination,
            proposal.value
        );

        let call = CallContext {
            caller: &self.identity,
            destination: &proposal.destination,
            value: proposal.value,
            payload: &proposal.payload,
        };
        let (success, return_data, failure) = match target.invoke(&call) {
            Ok(output) => (true, output, None),
            Err(e) => {
                log::warn!("Call for {} failed: {}", tx_id.short(), e);
                (false, Vec::new(), Some(e.to_string()))
            }
        };
        self.guard.record_outcome(&tx_id, success);

        Ok(ExecutionOutcome {
            transaction_id: tx_id,
            success,
            return_data,
            failure,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{AccountLedger, CallError};
    use crate::core::{u64_word, EXEC_TYPE};
    use crate::crypto::{keccak256, keccak256_concat, KeyPair};
    use crate::multisig::validator::mock::{mock_sign, MockScheme};

    const A: Address = Address::from_bytes([0x0a; 20]);
    const B: Address = Address::from_bytes([0x0b; 20]);
    const C: Address = Address::from_bytes([0x0c; 20]);
    const WALLET: Address = Address::from_bytes([0xee; 20]);
    const PLAYER: Address = Address::from_bytes([0x42; 20]);
    const NOW: u64 = 1_700_000_000;

    fn wallet() -> ProposalExecutor<MockScheme, ManualClock> {
        let registry = SignerRegistry::new(vec![A, B, C], 2).unwrap();
        ProposalExecutor::new(WALLET, registry, MockScheme, ManualClock::new(NOW))
    }

    fn funded_ledger() -> AccountLedger {
        let mut ledger = AccountLedger::new();
        ledger.deposit(WALLET, 1_000).unwrap();
        ledger
    }

    fn proposal(nonce: u64) -> Proposal {
        Proposal::new(PLAYER, 100, b"reward".to_vec(), NOW + 60, nonce)
    }

    fn signed_by<S: SignatureScheme, C: Clock>(
        wallet: &ProposalExecutor<S, C>,
        proposal: &Proposal,
        signers: &[Address],
    ) -> SignatureBundle {
        let digest = wallet.digest(proposal);
        SignatureBundle::new(signers.iter().map(|s| mock_sign(s, &digest)).collect())
    }

    #[test]
    fn test_ascending_bundle_executes_once() {
        let mut wallet = wallet();
        let mut ledger = funded_ledger();
        let p = proposal(1);
        let bundle = signed_by(&wallet, &p, &[B, C]);

        let outcome = wallet.execute_transaction(&p, &bundle, &mut ledger).unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.transaction_id, p.transaction_id());
        assert_eq!(ledger.balance(&PLAYER), 100);
        assert_eq!(ledger.balance(&WALLET), 900);

        assert!(wallet.is_executed(&outcome.transaction_id));
        assert_eq!(
            wallet.execution(&outcome.transaction_id),
            Some(&ExecutionRecord {
                success: true,
                executed_at: NOW
            })
        );

        assert_eq!(
            wallet.execute_transaction(&p, &bundle, &mut ledger),
            Err(MultisigError::AlreadyExecuted(p.transaction_id()))
        );
        assert_eq!(ledger.balance(&PLAYER), 100);
        assert_eq!(wallet.executed_count(), 1);
    }

    #[test]
    fn test_descending_bundle_rejected() {
        let mut wallet = wallet();
        let mut ledger = funded_ledger();
        let p = proposal(1);

        let result = wallet.execute_transaction(&p, &signed_by(&wallet, &p, &[C, B]), &mut ledger);
        assert_eq!(
            result,
            Err(MultisigError::SignerOrderViolation {
                previous: C,
                current: B
            })
        );
        assert!(!wallet.is_executed(&p.transaction_id()));
    }

    #[test]
    fn test_single_signature_insufficient_then_complete_bundle_succeeds() {
        let mut wallet = wallet();
        let mut ledger = funded_ledger();
        let p = proposal(1);

        let result = wallet.execute_transaction(&p, &signed_by(&wallet, &p, &[A]), &mut ledger);
        assert_eq!(
            result,
            Err(MultisigError::InsufficientSignatures { have: 1, need: 2 })
        );
        assert!(!wallet.is_executed(&p.transaction_id()));
        assert_eq!(wallet.executed_count(), 0);

        let outcome = wallet
            .execute_transaction(&p, &signed_by(&wallet, &p, &[A, B]), &mut ledger)
            .unwrap();
        assert!(outcome.success);
    }

    #[test]
    fn test_empty_bundle_insufficient() {
        let mut wallet = wallet();
        let mut ledger = funded_ledger();

        assert_eq!(
            wallet.execute_transaction(&proposal(1), &SignatureBundle::default(), &mut ledger),
            Err(MultisigError::InsufficientSignatures { have: 0, need: 2 })
        );
    }

    #[test]
    fn test_expired_proposal_rejected_regardless_of_signatures() {
        let mut wallet = wallet();
        let mut ledger = funded_ledger();
        let p = proposal(1);
        let bundle = signed_by(&wallet, &p, &[A, B]);

        wallet.clock().advance(61);
        assert_eq!(
            wallet.execute_transaction(&p, &bundle, &mut ledger),
            Err(MultisigError::ProposalExpired {
                deadline: p.deadline,
                now: p.deadline + 1
            })
        );
        assert!(!wallet.is_executed(&p.transaction_id()));

        // Exactly at the deadline is still valid
        wallet.clock().set(p.deadline);
        assert!(wallet.execute_transaction(&p, &bundle, &mut ledger).is_ok());
    }

    #[test]
    fn test_expired_proposal_rejected_before_signature_checks() {
        let mut wallet = wallet();
        let mut ledger = funded_ledger();
        let p = proposal(1);
        wallet.clock().set(p.deadline + 1);

        let expired = Err(MultisigError::ProposalExpired {
            deadline: p.deadline,
            now: p.deadline + 1,
        });
        let garbage = SignatureBundle::new(vec![vec![0xff; 7], mock_sign(&PLAYER, &[0; 32])]);

        assert_eq!(
            wallet.execute_transaction(&p, &SignatureBundle::default(), &mut ledger),
            expired
        );
        assert_eq!(wallet.execute_transaction(&p, &garbage, &mut ledger), expired);
        assert!(!wallet.is_executed(&p.transaction_id()));
        assert_eq!(wallet.executed_count(), 0);
        assert_eq!(ledger.balance(&PLAYER), 0);
    }

    /// Digest encoding with the deadline and transaction id words swapped
    fn permuted_digest<S: SignatureScheme, C: Clock>(
        wallet: &ProposalExecutor<S, C>,
        p: &Proposal,
    ) -> [u8; 32] {
        keccak256_concat(&[
            &keccak256(EXEC_TYPE.as_bytes()),
            &p.destination.to_word(),
            &u64_word(p.value),
            &p.payload_hash(),
            p.transaction_id().as_bytes(),
            &u64_word(p.deadline),
            &wallet.identity().to_word(),
        ])
    }

    #[test]
    fn test_permuted_digest_encoding_rejected() {
        let mut wallet = wallet();
        let mut ledger = funded_ledger();
        let p = proposal(1);

        let permuted = permuted_digest(&wallet, &p);
        assert_ne!(permuted, wallet.digest(&p));

        let bundle =
            SignatureBundle::new(vec![mock_sign(&A, &permuted), mock_sign(&B, &permuted)]);
        assert!(matches!(
            wallet.execute_transaction(&p, &bundle, &mut ledger),
            Err(MultisigError::InvalidSignature(_))
        ));
        assert!(!wallet.is_executed(&p.transaction_id()));
        assert_eq!(ledger.balance(&PLAYER), 0);
    }

    #[test]
    fn test_failed_call_consumes_proposal() {
        let mut wallet = wallet();
        let mut ledger = AccountLedger::new();
        ledger.deposit(WALLET, 10).unwrap();
        let p = proposal(1);
        let bundle = signed_by(&wallet, &p, &[A, C]);

        let outcome = wallet.execute_transaction(&p, &bundle, &mut ledger).unwrap();
        assert!(!outcome.success);
        assert!(outcome.failure.is_some());
        assert_eq!(
            wallet.execution(&p.transaction_id()).map(|r| r.success),
            Some(false)
        );

        // Funding the wallet afterwards does not allow a retry
        ledger.deposit(WALLET, 1_000).unwrap();
        assert_eq!(
            wallet.execute_transaction(&p, &bundle, &mut ledger),
            Err(MultisigError::AlreadyExecuted(p.transaction_id()))
        );

        // A fresh nonce needs fresh signatures but goes through
        let retry = proposal(2);
        let outcome = wallet
            .execute_transaction(&retry, &signed_by(&wallet, &retry, &[A, C]), &mut ledger)
            .unwrap();
        assert!(outcome.success);
        assert_eq!(ledger.balance(&PLAYER), 100);
    }

    #[test]
    fn test_reverting_handler_is_reported() {
        let mut wallet = wallet();
        let mut ledger = funded_ledger();
        ledger.register_handler(
            PLAYER,
            Box::new(|_| Err(CallError::Reverted("inventory full".to_string()))),
        );
        let p = proposal(1);

        let outcome = wallet
            .execute_transaction(&p, &signed_by(&wallet, &p, &[A, B]), &mut ledger)
            .unwrap();
        assert!(!outcome.success);
        assert_eq!(
            outcome.failure.as_deref(),
            Some("Call reverted: inventory full")
        );
        assert_eq!(ledger.balance(&WALLET), 1_000);
    }

    #[test]
    fn test_return_data_passed_through() {
        let mut wallet = wallet();
        let mut ledger = funded_ledger();
        ledger.register_handler(PLAYER, Box::new(|_| Ok(b"ok".to_vec())));
        let p = proposal(1);

        let outcome = wallet
            .execute_transaction(&p, &signed_by(&wallet, &p, &[B, C]), &mut ledger)
            .unwrap();
        assert_eq!(outcome.return_data, b"ok".to_vec());
    }

    #[test]
    fn test_bundle_for_other_wallet_rejected() {
        let registry = SignerRegistry::new(vec![A, B, C], 2).unwrap();
        let other = ProposalExecutor::new(
            Address::from_bytes([0xdd; 20]),
            registry,
            MockScheme,
            ManualClock::new(NOW),
        );
        let mut wallet = wallet();
        let mut ledger = funded_ledger();
        let p = proposal(1);

        // Signed for a different deployment with the same signers
        let foreign = signed_by(&other, &p, &[A, B]);
        assert!(matches!(
            wallet.execute_transaction(&p, &foreign, &mut ledger),
            Err(MultisigError::InvalidSignature(_))
        ));
        assert!(!wallet.is_executed(&p.transaction_id()));
    }

    #[test]
    fn test_tampered_field_invalidates_bundle() {
        let mut wallet = wallet();
        let mut ledger = funded_ledger();
        let p = proposal(1);
        let bundle = signed_by(&wallet, &p, &[A, B]);

        let mut tampered = p.clone();
        tampered.value = 999;
        assert!(matches!(
            wallet.execute_transaction(&tampered, &bundle, &mut ledger),
            Err(MultisigError::InvalidSignature(_))
        ));
        assert_eq!(ledger.balance(&PLAYER), 0);
    }

    #[test]
    fn test_state_roundtrip() {
        let mut wallet = wallet();
        let mut ledger = funded_ledger();
        let p = proposal(1);
        let bundle = signed_by(&wallet, &p, &[A, B]);
        wallet.execute_transaction(&p, &bundle, &mut ledger).unwrap();

        let json = serde_json::to_string(&wallet.state()).unwrap();
        let state: WalletState = serde_json::from_str(&json).unwrap();
        let mut restored = ProposalExecutor::from_state(state, MockScheme, ManualClock::new(NOW));

        assert_eq!(restored.identity(), WALLET);
        assert_eq!(restored.registry().description(), "2-of-3");
        assert_eq!(
            restored.execute_transaction(&p, &bundle, &mut ledger),
            Err(MultisigError::AlreadyExecuted(p.transaction_id()))
        );
    }

    #[test]
    fn test_secp256k1_end_to_end() {
        let mut keys: Vec<KeyPair> = (0..3).map(|_| KeyPair::generate()).collect();
        keys.sort_by_key(|k| k.address());
        let registry =
            SignerRegistry::new(keys.iter().map(|k| k.address()).collect(), 2).unwrap();
        let identity = registry.derive_wallet_identity(b"guild-treasury");
        let mut wallet = ProposalExecutor::new(
            identity,
            registry,
            Secp256k1Scheme::new(),
            ManualClock::new(NOW),
        );

        let mut ledger = AccountLedger::new();
        ledger.deposit(identity, 500).unwrap();

        let p = proposal(9);
        let digest = wallet.digest(&p);
        let sign = |i: usize| keys[i].sign_digest(&digest).unwrap().to_vec();

        let descending = SignatureBundle::new(vec![sign(1), sign(0)]);
        assert!(matches!(
            wallet.execute_transaction(&p, &descending, &mut ledger),
            Err(MultisigError::SignerOrderViolation { .. })
        ));

        let explicit = SignatureBundle::with_signers(
            vec![sign(0), sign(1)],
            vec![keys[0].address(), keys[1].address()],
        );
        let outcome = wallet.execute_transaction(&p, &explicit, &mut ledger).unwrap();
        assert!(outcome.success);
        assert_eq!(ledger.balance(&PLAYER), 100);

        // Real signatures over a permuted encoding recover other identities
        let next = proposal(11);
        let permuted = permuted_digest(&wallet, &next);
        let misencoded = SignatureBundle::with_signers(
            vec![
                keys[0].sign_digest(&permuted).unwrap().to_vec(),
                keys[1].sign_digest(&permuted).unwrap().to_vec(),
            ],
            vec![keys[0].address(), keys[1].address()],
        );
        assert!(matches!(
            wallet.execute_transaction(&next, &misencoded, &mut ledger),
            Err(MultisigError::InvalidSignature(_))
        ));
        assert!(!wallet.is_executed(&next.transaction_id()));

        let outsider = KeyPair::generate();
        let late = proposal(10);
        let late_digest = wallet.digest(&late);
        let bundle = SignatureBundle::new(vec![outsider.sign_digest(&late_digest).unwrap().to_vec()]);
        assert!(matches!(
            wallet.execute_transaction(&late, &bundle, &mut ledger),
            Err(MultisigError::SignerNotAuthorized(_))
        ));
    }
}
