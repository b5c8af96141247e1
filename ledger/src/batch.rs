//! Batch request shape and alignment rules.

use crate::error::LedgerError;
use crate::locks::LockKey;
use multidelegate_types::{Address, Amount, DelegateId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One holder's request to withdraw from some delegates and deposit to others.
///
/// `amounts[i]` is both the withdrawal from `sources[i]` (if present) and the
/// deposit to `targets[i]` (if present), so `amounts` is exactly as long as the
/// longer of the two delegate lists.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRequest {
    pub sources: Vec<DelegateId>,
    pub targets: Vec<DelegateId>,
    pub amounts: Vec<Amount>,
}

impl BatchRequest {
    pub fn new(sources: Vec<DelegateId>, targets: Vec<DelegateId>, amounts: Vec<Amount>) -> Self {
        Self {
            sources,
            targets,
            amounts,
        }
    }

    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.sources.is_empty() && self.targets.is_empty() {
            return Err(LedgerError::EmptyBatch);
        }
        let expected = self.sources.len().max(self.targets.len());
        if self.amounts.len() != expected {
            return Err(LedgerError::AmountsLengthMismatch {
                expected,
                actual: self.amounts.len(),
            });
        }
        Ok(())
    }

    /// `(source, amount)` pairs in request order.
    pub fn withdrawals(&self) -> impl Iterator<Item = (&DelegateId, Amount)> + '_ {
        self.sources.iter().zip(self.amounts.iter().copied())
    }

    /// `(target, amount)` pairs in request order.
    pub fn deposits(&self) -> impl Iterator<Item = (&DelegateId, Amount)> + '_ {
        self.targets.iter().zip(self.amounts.iter().copied())
    }

    /// Every distinct delegate named by the request.
    pub fn delegates(&self) -> BTreeSet<DelegateId> {
        self.sources.iter().chain(&self.targets).copied().collect()
    }

    /// Locks a batch for `holder` must hold: the holder and each distinct delegate.
    pub fn lock_keys(&self, holder: &Address) -> BTreeSet<LockKey> {
        std::iter::once(LockKey::Holder(*holder))
            .chain(self.delegates().into_iter().map(LockKey::Delegate))
            .collect()
    }
}
