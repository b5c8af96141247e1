//! Atomic batch reconciliation.
//!
//! A batch runs in three steps under its holder and delegate locks:
//! 1. **Plan**: walk withdrawals, then deposits, against an overlay; every
//!    error surfaces here and nothing has been touched yet.
//! 2. **Asset commit**: bind new proxies, then move the asset (withdrawals
//!    before deposits), journaling each call.
//! 3. **Ledger commit**: burn/mint the holder's balances and record proxy code.
//!
//! A failure in step 2 or 3 rolls back whatever was applied.

use crate::batch::BatchRequest;
use crate::error::LedgerError;
use crate::journal::Journal;
use crate::ledger::DelegationLedger;
use crate::locks::{acquire, LockTable};
use crate::registry::ProxyRegistry;
use crate::staging::{Direction, LedgerView, Movement, Planner, StagedBatch};
use multidelegate_store::{AccountStore, GovernanceToken};
use multidelegate_types::{Address, Amount, DelegateId, ProxyHandle};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// What a committed batch did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub holder: Address,
    /// Proxies deployed by this batch, in first-seen order.
    pub deployed: Vec<ProxyHandle>,
    /// Non-zero withdrawals, in request order.
    pub withdrawn: Vec<(DelegateId, Amount)>,
    /// Non-zero deposits, in request order.
    pub deposited: Vec<(DelegateId, Amount)>,
}

impl ReconcileOutcome {
    fn from_staged(staged: &StagedBatch) -> Self {
        let pick = |dir: Direction| -> Vec<_> {
            staged
                .movements
                .iter()
                .filter(|m| m.direction == dir)
                .map(|m| (m.proxy.delegate, m.amount))
                .collect()
        };
        Self {
            holder: staged.holder,
            deployed: staged.deployments.clone(),
            withdrawn: pick(Direction::Withdraw),
            deposited: pick(Direction::Deposit),
        }
    }

    /// True when the batch moved no asset and changed no balance.
    pub fn is_noop(&self) -> bool {
        self.withdrawn.is_empty() && self.deposited.is_empty()
    }
}

pub(crate) fn lock_ledger(ledger: &Mutex<DelegationLedger>) -> MutexGuard<'_, DelegationLedger> {
    ledger.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct BatchReconciler<'a, S, T: ?Sized> {
    registry: &'a ProxyRegistry<S>,
    ledger: &'a Mutex<DelegationLedger>,
    token: &'a T,
    locks: &'a LockTable,
}

impl<'a, S: AccountStore, T: GovernanceToken + ?Sized> BatchReconciler<'a, S, T> {
    pub fn new(
        registry: &'a ProxyRegistry<S>,
        ledger: &'a Mutex<DelegationLedger>,
        token: &'a T,
        locks: &'a LockTable,
    ) -> Self {
        Self {
            registry,
            ledger,
            token,
            locks,
        }
    }

    /// Run `request` for `holder` as one atomic unit.
    ///
    /// `on_commit` runs after a successful commit, before the locks are
    /// released.
    pub fn reconcile(
        &self,
        holder: &Address,
        request: &BatchRequest,
        on_commit: impl FnOnce(&ReconcileOutcome),
    ) -> Result<ReconcileOutcome, LedgerError> {
        request.validate()?;

        let handles = self.locks.handles(&request.lock_keys(holder));
        let _guards = acquire(&handles);

        tracing::debug!(
            holder = %holder,
            sources = request.sources.len(),
            targets = request.targets.len(),
            "planning batch"
        );
        let view = self.capture(holder, request);
        let spender = *self.registry.factory();
        let staged = Planner::new(self.registry, self.token, spender, *holder, view)
            .plan(request)
            .inspect_err(|e| tracing::warn!(holder = %holder, error = %e, "batch rejected"))?;

        self.commit(&staged)?;

        let outcome = ReconcileOutcome::from_staged(&staged);
        tracing::info!(
            holder = %holder,
            deployed = outcome.deployed.len(),
            withdrawn = outcome.withdrawn.len(),
            deposited = outcome.deposited.len(),
            "batch committed"
        );
        on_commit(&outcome);
        Ok(outcome)
    }

    fn capture(&self, holder: &Address, request: &BatchRequest) -> LedgerView {
        let ledger = lock_ledger(self.ledger);
        let delegates = request.delegates();
        LedgerView {
            row: delegates
                .iter()
                .map(|d| (*d, ledger.balance_of(holder, d)))
                .collect(),
            supply: delegates
                .iter()
                .map(|d| (*d, ledger.total_supply(d)))
                .collect(),
        }
    }

    fn commit(&self, staged: &StagedBatch) -> Result<(), LedgerError> {
        let holder = staged.holder;
        let mut journal = Journal::new(self.token, *self.registry.factory());

        let asset_side = staged
            .deployments
            .iter()
            .try_for_each(|h| journal.bind(h))
            .and_then(|_| {
                staged.movements.iter().try_for_each(|m| match m.direction {
                    Direction::Withdraw => journal.push(&m.proxy.address, &holder, m.amount),
                    Direction::Deposit => journal.pull(&holder, &m.proxy.address, m.amount),
                })
            });
        if let Err(e) = asset_side {
            tracing::error!(holder = %holder, error = %e, "asset commit failed, compensating");
            journal.rollback();
            return Err(e);
        }

        let mut ledger = lock_ledger(self.ledger);
        let mut applied = 0;
        let ledger_side = staged
            .movements
            .iter()
            .try_for_each(|m| -> Result<(), LedgerError> {
                apply(&mut ledger, &holder, m)?;
                applied += 1;
                Ok(())
            })
            .and_then(|_| self.registry.record(&staged.deployments));
        if let Err(e) = ledger_side {
            tracing::error!(holder = %holder, error = %e, "ledger commit failed, compensating");
            for m in staged.movements[..applied].iter().rev() {
                if let Err(undo) = revert(&mut ledger, &holder, m) {
                    tracing::error!(holder = %holder, error = %undo, "ledger compensation failed");
                }
            }
            drop(ledger);
            journal.rollback();
            return Err(e);
        }
        Ok(())
    }
}

fn apply(ledger: &mut DelegationLedger, holder: &Address, m: &Movement) -> Result<(), LedgerError> {
    match m.direction {
        Direction::Withdraw => ledger.burn(holder, &m.proxy.delegate, m.amount),
        Direction::Deposit => ledger.mint(holder, &m.proxy.delegate, m.amount),
    }
}

fn revert(ledger: &mut DelegationLedger, holder: &Address, m: &Movement) -> Result<(), LedgerError> {
    match m.direction {
        Direction::Withdraw => ledger.mint(holder, &m.proxy.delegate, m.amount),
        Direction::Deposit => ledger.burn(holder, &m.proxy.delegate, m.amount),
    }
}
