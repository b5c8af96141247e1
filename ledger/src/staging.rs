//! Planning phase of a batch.
//!
//! The planner walks the request against an overlay of the asset (balances
//! and allowances read through from the token) and a private copy of the
//! holder's ledger row. Every rule is enforced here; nothing outside the
//! planner is touched until the resulting [`StagedBatch`] is committed.

use crate::batch::BatchRequest;
use crate::error::LedgerError;
use crate::registry::ProxyRegistry;
use multidelegate_store::{AccountStore, AssetError, GovernanceToken};
use multidelegate_types::{Address, Amount, DelegateId, ProxyHandle};
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Direction {
    /// Burn the holder's balance and pay the asset out of the proxy.
    Withdraw,
    /// Pull the asset into the proxy and mint the holder's balance.
    Deposit,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Movement {
    pub direction: Direction,
    pub proxy: ProxyHandle,
    pub amount: Amount,
}

/// Everything a validated batch will do, in commit order.
#[derive(Debug)]
pub(crate) struct StagedBatch {
    pub holder: Address,
    /// Proxies to deploy, one per distinct vacant target.
    pub deployments: Vec<ProxyHandle>,
    /// Non-zero asset movements: all withdrawals, then all deposits.
    pub movements: Vec<Movement>,
}

/// Ledger values the planner starts from, captured under the batch locks.
pub(crate) struct LedgerView {
    pub row: HashMap<DelegateId, Amount>,
    pub supply: HashMap<DelegateId, Amount>,
}

pub(crate) struct Planner<'a, S, T: ?Sized> {
    registry: &'a ProxyRegistry<S>,
    token: &'a T,
    spender: Address,
    holder: Address,
    view: LedgerView,
    balances: HashMap<Address, Amount>,
    allowances: HashMap<Address, Amount>,
    /// Resolved proxies and whether each is deployed or staged for deployment.
    proxies: HashMap<DelegateId, (ProxyHandle, bool)>,
    staged: StagedBatch,
}

impl<'a, S: AccountStore, T: GovernanceToken + ?Sized> Planner<'a, S, T> {
    pub(crate) fn new(
        registry: &'a ProxyRegistry<S>,
        token: &'a T,
        spender: Address,
        holder: Address,
        view: LedgerView,
    ) -> Self {
        Self {
            registry,
            token,
            spender,
            holder,
            view,
            balances: HashMap::new(),
            allowances: HashMap::new(),
            proxies: HashMap::new(),
            staged: StagedBatch {
                holder,
                deployments: Vec::new(),
                movements: Vec::new(),
            },
        }
    }

    pub(crate) fn plan(mut self, request: &BatchRequest) -> Result<StagedBatch, LedgerError> {
        for (delegate, amount) in request.withdrawals() {
            if amount.is_zero() {
                continue;
            }
            self.stage_withdrawal(delegate, amount)?;
        }
        for (delegate, amount) in request.deposits() {
            // Resolved even for zero amounts: every target gets a proxy.
            let proxy = self.resolve_target(delegate)?;
            if amount.is_zero() {
                continue;
            }
            self.stage_deposit(proxy, amount)?;
        }
        Ok(self.staged)
    }

    fn stage_withdrawal(&mut self, delegate: &DelegateId, amount: Amount) -> Result<(), LedgerError> {
        let available = self.view.row.get(delegate).copied().unwrap_or_default();
        let remaining = available
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientDelegatedBalance {
                holder: self.holder,
                delegate: *delegate,
                requested: amount,
                available,
            })?;
        let proxy = self.resolve_source(delegate)?;
        self.simulate_transfer(proxy.address, self.holder, amount)?;

        self.view.row.insert(*delegate, remaining);
        let supply = self.view.supply.entry(*delegate).or_default();
        *supply = supply.saturating_sub(amount);
        tracing::debug!(holder = %self.holder, delegate = %delegate, %amount, "staged withdrawal");
        self.staged.movements.push(Movement {
            direction: Direction::Withdraw,
            proxy,
            amount,
        });
        Ok(())
    }

    fn stage_deposit(&mut self, proxy: ProxyHandle, amount: Amount) -> Result<(), LedgerError> {
        let delegate = proxy.delegate;
        let balance = self
            .view
            .row
            .get(&delegate)
            .copied()
            .unwrap_or_default()
            .checked_add(amount)
            .ok_or(LedgerError::AmountOverflow)?;
        let supply = self
            .view
            .supply
            .get(&delegate)
            .copied()
            .unwrap_or_default()
            .checked_add(amount)
            .ok_or(LedgerError::AmountOverflow)?;
        self.simulate_transfer(self.holder, proxy.address, amount)?;

        self.view.row.insert(delegate, balance);
        self.view.supply.insert(delegate, supply);
        tracing::debug!(holder = %self.holder, delegate = %delegate, %amount, "staged deposit");
        self.staged.movements.push(Movement {
            direction: Direction::Deposit,
            proxy,
            amount,
        });
        Ok(())
    }

    /// A withdrawal source never causes a deployment.
    fn resolve_source(&mut self, delegate: &DelegateId) -> Result<ProxyHandle, LedgerError> {
        if let Some((h, _)) = self.proxies.get(delegate) {
            return Ok(*h);
        }
        let status = self.registry.status(delegate)?;
        self.proxies.insert(*delegate, (*status.handle(), status.is_deployed()));
        Ok(*status.handle())
    }

    /// A deposit target is deployed on first sight if it is vacant.
    fn resolve_target(&mut self, delegate: &DelegateId) -> Result<ProxyHandle, LedgerError> {
        let (handle, ready) = match self.proxies.get(delegate) {
            Some(entry) => *entry,
            None => {
                let status = self.registry.status(delegate)?;
                (*status.handle(), status.is_deployed())
            }
        };
        if !ready {
            self.stage_deployment(handle);
        }
        self.proxies.insert(*delegate, (handle, true));
        Ok(handle)
    }

    fn stage_deployment(&mut self, handle: ProxyHandle) {
        tracing::debug!(delegate = %handle.delegate, proxy = %handle.address, "staged proxy deployment");
        // Binding grants the ledger a max allowance over the proxy.
        self.allowances.insert(handle.address, Amount::MAX);
        self.staged.deployments.push(handle);
    }

    fn balance(&mut self, who: Address) -> Amount {
        let token = self.token;
        *self.balances.entry(who).or_insert_with(|| token.balance_of(&who))
    }

    fn allowance(&mut self, owner: Address) -> Amount {
        let (token, spender) = (self.token, self.spender);
        *self
            .allowances
            .entry(owner)
            .or_insert_with(|| token.allowance(&owner, &spender))
    }

    /// Apply a `transferFrom` spent by the ledger to the overlay, with the
    /// token's own balance and allowance rules.
    fn simulate_transfer(&mut self, from: Address, to: Address, amount: Amount) -> Result<(), LedgerError> {
        let failed = |reason| LedgerError::AssetTransferFailed {
            from,
            to,
            amount,
            reason,
        };
        if to.is_zero() {
            return Err(failed(AssetError::ZeroAddress));
        }
        let allowed = self.allowance(from);
        let allowance_left = if allowed == Amount::MAX {
            allowed
        } else {
            allowed.checked_sub(amount).ok_or_else(|| {
                failed(AssetError::InsufficientAllowance {
                    owner: from,
                    spender: self.spender,
                    needed: amount,
                    available: allowed,
                })
            })?
        };
        let available = self.balance(from);
        let debited = available.checked_sub(amount).ok_or_else(|| {
            failed(AssetError::InsufficientBalance {
                account: from,
                needed: amount,
                available,
            })
        })?;
        let credited = self
            .balance(to)
            .checked_add(amount)
            .ok_or(LedgerError::AmountOverflow)?;

        self.allowances.insert(from, allowance_left);
        self.balances.insert(from, debited);
        self.balances.insert(to, credited);
        Ok(())
    }
}
