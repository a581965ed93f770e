//! Replay ledger
//!
//! Append-only map from transaction identifier to execution record.
//! Entries are never removed: a consumed identifier stays consumed even
//! when the call it authorized failed.

use crate::core::TransactionId;
use crate::multisig::error::MultisigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What happened when an identifier was consumed
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExecutionRecord {
    /// Outcome of the target call
    pub success: bool,
    /// Unix timestamp (seconds) at which the identifier was consumed
    pub executed_at: u64,
}

/// Tracks which transaction identifiers have been consumed
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReplayGuard {
    executed: BTreeMap<TransactionId, ExecutionRecord>,
}

impl ReplayGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_executed(&self, tx_id: &TransactionId) -> bool {
        self.executed.contains_key(tx_id)
    }

    /// Consume `tx_id`
    ///
    /// The record starts out as unsuccessful; the executor updates it once
    /// the target call returns.
    pub fn mark_executed(
        &mut self,
        tx_id: TransactionId,
        executed_at: u64,
    ) -> Result<(), MultisigError> {
        if self.executed.contains_key(&tx_id) {
            return Err(MultisigError::AlreadyExecuted(tx_id));
        }

        self.executed.insert(
            tx_id,
            ExecutionRecord {
                success: false,
                executed_at,
            },
        );
        Ok(())
    }

    /// Record the target call outcome for an already consumed identifier
    pub(crate) fn record_outcome(&mut self, tx_id: &TransactionId, success: bool) {
        if let Some(record) = self.executed.get_mut(tx_id) {
            record.success = success;
        }
    }

    pub fn get(&self, tx_id: &TransactionId) -> Option<&ExecutionRecord> {
        self.executed.get(tx_id)
    }

    pub fn len(&self) -> usize {
        self.executed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.executed.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TransactionId, &ExecutionRecord)> {
        self.executed.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(byte: u8) -> TransactionId {
        TransactionId::from_bytes([byte; 32])
    }

    #[test]
    fn test_mark_once() {
        let mut guard = ReplayGuard::new();
        assert!(guard.is_empty());
        assert!(!guard.is_executed(&id(1)));

        guard.mark_executed(id(1), 100).unwrap();
        assert!(guard.is_executed(&id(1)));
        assert!(!guard.is_executed(&id(2)));
        assert_eq!(guard.len(), 1);
    }

    #[test]
    fn test_second_mark_fails() {
        let mut guard = ReplayGuard::new();
        guard.mark_executed(id(1), 100).unwrap();

        assert_eq!(
            guard.mark_executed(id(1), 200),
            Err(MultisigError::AlreadyExecuted(id(1)))
        );
        // Original record untouched
        assert_eq!(guard.get(&id(1)).unwrap().executed_at, 100);
    }

    #[test]
    fn test_failed_outcome_still_consumes() {
        let mut guard = ReplayGuard::new();
        guard.mark_executed(id(3), 5).unwrap();
        guard.record_outcome(&id(3), false);

        assert!(guard.is_executed(&id(3)));
        assert!(!guard.get(&id(3)).unwrap().success);
        assert!(guard.mark_executed(id(3), 6).is_err());
    }

    #[test]
    fn test_record_outcome() {
        let mut guard = ReplayGuard::new();
        guard.mark_executed(id(4), 5).unwrap();
        guard.record_outcome(&id(4), true);
        assert!(guard.get(&id(4)).unwrap().success);

        // Unknown identifiers are ignored
        guard.record_outcome(&id(9), true);
        assert!(!guard.is_executed(&id(9)));
    }

    #[test]
    fn test_serde_roundtrip_keeps_entries() {
        let mut guard = ReplayGuard::new();
        guard.mark_executed(id(1), 10).unwrap();
        guard.mark_executed(id(2), 20).unwrap();
        guard.record_outcome(&id(2), true);

        let json = serde_json::to_string(&guard).unwrap();
        let back: ReplayGuard = serde_json::from_str(&json).unwrap();
        assert_eq!(back, guard);
        assert_eq!(back.iter().count(), 2);
    }
}
