//! Thin adapter over the external governance token.
//!
//! Both directions are `transferFrom` calls spent by the ledger's own address:
//! a pull spends the holder's allowance, a push spends the max allowance every
//! proxy grants the ledger when it is bound.

use crate::error::LedgerError;
use multidelegate_store::GovernanceToken;
use multidelegate_types::{Address, Amount};

pub struct AssetTransferAdapter<'a, T: ?Sized> {
    token: &'a T,
    spender: Address,
}

impl<'a, T: GovernanceToken + ?Sized> AssetTransferAdapter<'a, T> {
    pub fn new(token: &'a T, spender: Address) -> Self {
        Self { token, spender }
    }

    pub fn token(&self) -> &'a T {
        self.token
    }

    pub fn spender(&self) -> &Address {
        &self.spender
    }

    /// Move `amount` from `from` into `proxy`.
    pub fn pull(&self, from: &Address, proxy: &Address, amount: Amount) -> Result<(), LedgerError> {
        self.move_funds(from, proxy, amount)
    }

    /// Pay `amount` out of `proxy` to `to`.
    pub fn push(&self, proxy: &Address, to: &Address, amount: Amount) -> Result<(), LedgerError> {
        self.move_funds(proxy, to, amount)
    }

    fn move_funds(&self, from: &Address, to: &Address, amount: Amount) -> Result<(), LedgerError> {
        self.token
            .transfer_from(&self.spender, from, to, amount)
            .map_err(|reason| LedgerError::AssetTransferFailed {
                from: *from,
                to: *to,
                amount,
                reason,
            })
    }
}
