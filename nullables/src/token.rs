//! Nullable governance token: an in-memory ERC-20 with vote delegation.
//!
//! Follows the usual token rules: a max allowance is never spent down,
//! voting power follows balances of accounts that have picked a delegatee,
//! and zero-value transfers always succeed.

use multidelegate_store::{AssetError, GovernanceToken};
use multidelegate_types::{Address, Amount};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
struct TokenState {
    balances: HashMap<Address, Amount>,
    allowances: HashMap<(Address, Address), Amount>,
    delegates: HashMap<Address, Address>,
    votes: HashMap<Address, Amount>,
    total_supply: Amount,
    /// Successful transfers and transfer_froms (including zero-value ones).
    transfers: u64,
    /// Mutating calls seen so far.
    calls: u64,
    /// The mutating call number that will be rejected once.
    fail_at: Option<u64>,
}

impl TokenState {
    fn balance(&self, who: &Address) -> Amount {
        self.balances.get(who).copied().unwrap_or_default()
    }

    fn check_injected_failure(&mut self) -> Result<(), AssetError> {
        self.calls += 1;
        if self.fail_at == Some(self.calls) {
            self.fail_at = None;
            return Err(AssetError::Rejected("injected failure".into()));
        }
        Ok(())
    }

    fn move_votes(&mut self, from: Address, to: Address, amount: Amount) {
        if from == to || amount.is_zero() {
            return;
        }
        if !from.is_zero() {
            let v = self.votes.entry(from).or_default();
            *v = v.saturating_sub(amount);
        }
        if !to.is_zero() {
            let v = self.votes.entry(to).or_default();
            *v = v.checked_add(amount).unwrap_or(Amount::MAX);
        }
    }

    fn transfer(&mut self, from: &Address, to: &Address, amount: Amount) -> Result<(), AssetError> {
        if to.is_zero() {
            return Err(AssetError::ZeroAddress);
        }
        let available = self.balance(from);
        let remaining = available
            .checked_sub(amount)
            .ok_or(AssetError::InsufficientBalance {
                account: *from,
                needed: amount,
                available,
            })?;
        self.balances.insert(*from, remaining);
        let credited = self
            .balance(to)
            .checked_add(amount)
            .ok_or_else(|| AssetError::Rejected("balance overflow".into()))?;
        self.balances.insert(*to, credited);
        let (src, dst) = (
            self.delegates.get(from).copied().unwrap_or_default(),
            self.delegates.get(to).copied().unwrap_or_default(),
        );
        self.move_votes(src, dst, amount);
        self.transfers += 1;
        Ok(())
    }
}

/// An in-memory governance token for testing.
pub struct NullToken {
    address: Address,
    state: Mutex<TokenState>,
}

impl NullToken {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            state: Mutex::new(TokenState::default()),
        }
    }

    /// Create new tokens out of thin air.
    pub fn mint(&self, to: &Address, amount: Amount) {
        let mut state = self.state.lock().unwrap();
        let balance = state.balance(to).checked_add(amount).unwrap();
        state.balances.insert(*to, balance);
        state.total_supply = state.total_supply.checked_add(amount).unwrap();
        let delegatee = state.delegates.get(to).copied().unwrap_or_default();
        state.move_votes(Address::ZERO, delegatee, amount);
    }

    /// Reject the `n`-th mutating call from now on (1 = the very next one), once.
    pub fn fail_on_call(&self, n: u64) {
        let mut state = self.state.lock().unwrap();
        state.fail_at = Some(state.calls + n);
    }

    /// Number of transfers that went through.
    pub fn transfer_count(&self) -> u64 {
        self.state.lock().unwrap().transfers
    }
}

impl GovernanceToken for NullToken {
    fn address(&self) -> Address {
        self.address
    }

    fn total_supply(&self) -> Amount {
        self.state.lock().unwrap().total_supply
    }

    fn balance_of(&self, who: &Address) -> Amount {
        self.state.lock().unwrap().balance(who)
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.state
            .lock()
            .unwrap()
            .allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or_default()
    }

    fn transfer(&self, caller: &Address, to: &Address, amount: Amount) -> Result<(), AssetError> {
        let mut state = self.state.lock().unwrap();
        state.check_injected_failure()?;
        state.transfer(caller, to, amount)
    }

    fn transfer_from(
        &self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), AssetError> {
        let mut state = self.state.lock().unwrap();
        state.check_injected_failure()?;
        if to.is_zero() {
            return Err(AssetError::ZeroAddress);
        }
        let key = (*from, *spender);
        let allowed = state.allowances.get(&key).copied().unwrap_or_default();
        if allowed != Amount::MAX {
            let left = allowed
                .checked_sub(amount)
                .ok_or(AssetError::InsufficientAllowance {
                    owner: *from,
                    spender: *spender,
                    needed: amount,
                    available: allowed,
                })?;
            // Check the balance before spending the allowance.
            if state.balance(from) < amount {
                return Err(AssetError::InsufficientBalance {
                    account: *from,
                    needed: amount,
                    available: state.balance(from),
                });
            }
            state.allowances.insert(key, left);
        }
        state.transfer(from, to, amount)
    }

    fn approve(&self, owner: &Address, spender: &Address, amount: Amount) -> Result<(), AssetError> {
        let mut state = self.state.lock().unwrap();
        state.check_injected_failure()?;
        state.allowances.insert((*owner, *spender), amount);
        Ok(())
    }

    fn delegate(&self, account: &Address, delegatee: &Address) -> Result<(), AssetError> {
        let mut state = self.state.lock().unwrap();
        state.check_injected_failure()?;
        let old = state.delegates.insert(*account, *delegatee).unwrap_or_default();
        let balance = state.balance(account);
        state.move_votes(old, *delegatee, balance);
        Ok(())
    }

    fn delegates(&self, account: &Address) -> Address {
        self.state
            .lock()
            .unwrap()
            .delegates
            .get(account)
            .copied()
            .unwrap_or_default()
    }

    fn get_votes(&self, account: &Address) -> Amount {
        self.state
            .lock()
            .unwrap()
            .votes
            .get(account)
            .copied()
            .unwrap_or_default()
    }
}
