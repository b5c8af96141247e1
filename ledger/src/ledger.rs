//! Per-delegate accounting balances.
//!
//! Each delegate is a fungible accounting-token class. A holder's balance of
//! class `d` is the amount of the asset the holder has parked in `d`'s proxy.
//! The per-class supply is tracked alongside so conservation can be checked
//! against the proxy's asset balance without summing over holders.

use crate::error::LedgerError;
use multidelegate_types::{Address, Amount, DelegateId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Two-level mapping `holder -> delegate -> amount` plus per-class supply.
///
/// Entries appear on the first non-zero mint and are never removed; a zero
/// balance is a normal steady state.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationLedger {
    balances: HashMap<Address, HashMap<DelegateId, Amount>>,
    supply: HashMap<DelegateId, Amount>,
}

impl DelegationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance_of(&self, holder: &Address, delegate: &DelegateId) -> Amount {
        self.balances
            .get(holder)
            .and_then(|row| row.get(delegate))
            .copied()
            .unwrap_or_default()
    }

    /// Sum of all holders' balances of `delegate`'s class.
    pub fn total_supply(&self, delegate: &DelegateId) -> Amount {
        self.supply.get(delegate).copied().unwrap_or_default()
    }

    /// Everything `holder` has delegated, across all delegates.
    pub fn holder_total(&self, holder: &Address) -> Amount {
        self.balances
            .get(holder)
            .map(|row| row.values().fold(Amount::ZERO, |acc, a| acc.saturating_add(*a)))
            .unwrap_or_default()
    }

    /// The holder's entries, sorted by delegate.
    pub fn entries_of(&self, holder: &Address) -> Vec<(DelegateId, Amount)> {
        let mut entries: Vec<_> = self
            .balances
            .get(holder)
            .map(|row| row.iter().map(|(d, a)| (*d, *a)).collect())
            .unwrap_or_default();
        entries.sort_by_key(|(d, _)| *d);
        entries
    }

    /// Every class that has ever been minted, with its current supply.
    pub fn classes(&self) -> impl Iterator<Item = (&DelegateId, &Amount)> {
        self.supply.iter()
    }

    /// Credit `holder` with `amount` of `delegate`'s class.
    ///
    /// The caller must already have moved the matching asset into the
    /// delegate's proxy.
    pub(crate) fn mint(
        &mut self,
        holder: &Address,
        delegate: &DelegateId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        if amount.is_zero() {
            return Ok(());
        }
        let balance = self
            .balance_of(holder, delegate)
            .checked_add(amount)
            .ok_or(LedgerError::AmountOverflow)?;
        let supply = self
            .total_supply(delegate)
            .checked_add(amount)
            .ok_or(LedgerError::AmountOverflow)?;
        self.balances.entry(*holder).or_default().insert(*delegate, balance);
        self.supply.insert(*delegate, supply);
        Ok(())
    }

    /// Debit `amount` of `delegate`'s class from `holder`.
    pub(crate) fn burn(
        &mut self,
        holder: &Address,
        delegate: &DelegateId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        if amount.is_zero() {
            return Ok(());
        }
        let available = self.balance_of(holder, delegate);
        let balance = available
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientDelegatedBalance {
                holder: *holder,
                delegate: *delegate,
                requested: amount,
                available,
            })?;
        // Supply is at least any single holder's balance.
        let supply = self.total_supply(delegate).saturating_sub(amount);
        self.balances.entry(*holder).or_default().insert(*delegate, balance);
        self.supply.insert(*delegate, supply);
        Ok(())
    }

    /// Serialize the ledger for persistence.
    pub fn save_state(&self) -> Result<Vec<u8>, LedgerError> {
        bincode::serialize(self).map_err(|e| LedgerError::Snapshot(e.to_string()))
    }

    /// Restore a ledger from [`DelegationLedger::save_state`] output.
    pub fn load_state(data: &[u8]) -> Result<Self, LedgerError> {
        bincode::deserialize(data).map_err(|e| LedgerError::Snapshot(e.to_string()))
    }
}
