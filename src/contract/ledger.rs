//! In-memory account ledger
//!
//! Holds balances per identity and optional handlers for identities that
//! behave like deployed contracts. Value moves before the handler runs and
//! is moved back if the handler fails.

use crate::contract::target::{CallContext, CallError, CallTarget};
use crate::core::Address;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Code run when a registered destination is called
pub type CallHandler = Box<dyn FnMut(&CallContext<'_>) -> Result<Vec<u8>, CallError>>;

/// Balances and handlers for every known identity
///
/// Only balances are persisted; handlers must be registered again after
/// loading.
#[derive(Default, Serialize, Deserialize)]
pub struct AccountLedger {
    balances: BTreeMap<Address, u64>,
    #[serde(skip)]
    handlers: HashMap<Address, CallHandler>,
}

impl AccountLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit an account, returning its new balance
    pub fn deposit(&mut self, account: Address, amount: u64) -> Result<u64, CallError> {
        let balance = self.balances.entry(account).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or(CallError::BalanceOverflow(account))?;
        Ok(*balance)
    }

    pub fn balance(&self, account: &Address) -> u64 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    /// Attach a handler to `destination`, replacing any previous one
    pub fn register_handler(&mut self, destination: Address, handler: CallHandler) {
        self.handlers.insert(destination, handler);
    }

    pub fn remove_handler(&mut self, destination: &Address) -> Option<CallHandler> {
        self.handlers.remove(destination)
    }

    pub fn has_handler(&self, destination: &Address) -> bool {
        self.handlers.contains_key(destination)
    }

    /// All accounts with a balance entry
    pub fn accounts(&self) -> impl Iterator<Item = (&Address, &u64)> {
        self.balances.iter()
    }

    /// Total value held across all accounts
    pub fn total_supply(&self) -> u128 {
        self.balances.values().map(|b| *b as u128).sum()
    }

    fn transfer(&mut self, from: &Address, to: &Address, amount: u64) -> Result<(), CallError> {
        if amount == 0 {
            return Ok(());
        }

        let have = self.balance(from);
        if have < amount {
            return Err(CallError::InsufficientBalance {
                account: *from,
                have,
                need: amount,
            });
        }

        if from != to && self.balance(to).checked_add(amount).is_none() {
            return Err(CallError::BalanceOverflow(*to));
        }

        self.balances.insert(*from, have - amount);
        let credited = self.balance(to) + amount;
        self.balances.insert(*to, credited);
        Ok(())
    }
}

impl CallTarget for AccountLedger {
    fn invoke(&mut self, call: &CallContext<'_>) -> Result<Vec<u8>, CallError> {
        self.transfer(call.caller, call.destination, call.value)?;

        let Some(handler) = self.handlers.get_mut(call.destination) else {
            // Plain account: the payload is ignored
            return Ok(Vec::new());
        };

        match handler(call) {
            Ok(output) => Ok(output),
            Err(e) => {
                self.transfer(call.destination, call.caller, call.value)?;
                Err(e)
            }
        }
    }
}

impl fmt::Debug for AccountLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountLedger")
            .field("balances", &self.balances)
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}
