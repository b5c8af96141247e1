//! Interface to the external governance token.
//!
//! The token is an ERC-20 style asset with vote delegation. Every mutating
//! call names its caller explicitly; the implementation decides whether that
//! caller is allowed to move the funds.

use multidelegate_types::{Address, Amount};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AssetError {
    #[error("insufficient balance for {account}: need {needed}, have {available}")]
    InsufficientBalance {
        account: Address,
        needed: Amount,
        available: Amount,
    },

    #[error("insufficient allowance from {owner} to {spender}: need {needed}, have {available}")]
    InsufficientAllowance {
        owner: Address,
        spender: Address,
        needed: Amount,
        available: Amount,
    },

    #[error("transfer to the zero address")]
    ZeroAddress,

    #[error("asset rejected the call: {0}")]
    Rejected(String),
}

/// A transferable governance token with vote delegation.
pub trait GovernanceToken {
    /// The token's own address (part of every proxy's derived address).
    fn address(&self) -> Address;

    fn total_supply(&self) -> Amount;
    fn balance_of(&self, who: &Address) -> Amount;
    fn allowance(&self, owner: &Address, spender: &Address) -> Amount;

    fn transfer(&self, caller: &Address, to: &Address, amount: Amount) -> Result<(), AssetError>;

    fn transfer_from(
        &self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), AssetError>;

    fn approve(&self, owner: &Address, spender: &Address, amount: Amount) -> Result<(), AssetError>;

    /// Direct `account`'s voting power to `delegatee` (the zero address clears it).
    fn delegate(&self, account: &Address, delegatee: &Address) -> Result<(), AssetError>;

    /// Current delegatee of `account`, or the zero address.
    fn delegates(&self, account: &Address) -> Address;

    /// Voting power currently directed at `account`.
    fn get_votes(&self, account: &Address) -> Amount;
}

impl<T: GovernanceToken + ?Sized> GovernanceToken for Arc<T> {
    fn address(&self) -> Address {
        (**self).address()
    }

    fn total_supply(&self) -> Amount {
        (**self).total_supply()
    }

    fn balance_of(&self, who: &Address) -> Amount {
        (**self).balance_of(who)
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        (**self).allowance(owner, spender)
    }

    fn transfer(&self, caller: &Address, to: &Address, amount: Amount) -> Result<(), AssetError> {
        (**self).transfer(caller, to, amount)
    }

    fn transfer_from(
        &self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), AssetError> {
        (**self).transfer_from(spender, from, to, amount)
    }

    fn approve(&self, owner: &Address, spender: &Address, amount: Amount) -> Result<(), AssetError> {
        (**self).approve(owner, spender, amount)
    }

    fn delegate(&self, account: &Address, delegatee: &Address) -> Result<(), AssetError> {
        (**self).delegate(account, delegatee)
    }

    fn delegates(&self, account: &Address) -> Address {
        (**self).delegates(account)
    }

    fn get_votes(&self, account: &Address) -> Amount {
        (**self).get_votes(account)
    }
}
