//! The multi-delegate ledger facade.
//!
//! Owns the proxy registry, the delegation ledger, the lock table and the
//! event bus, and exposes the public call surface: batch delegation, proxy
//! lookup, balance queries and the metadata URI.

use crate::batch::BatchRequest;
use crate::config::MultiDelegateConfig;
use crate::error::LedgerError;
use crate::events::{DelegationEvent, EventBus};
use crate::ledger::DelegationLedger;
use crate::locks::{acquire, LockKey, LockTable};
use crate::reconciler::{lock_ledger, BatchReconciler, ReconcileOutcome};
use crate::registry::ProxyRegistry;
use multidelegate_store::{AccountStore, GovernanceToken};
use multidelegate_types::{Address, Amount, DelegateId, ProxyHandle};
use std::collections::BTreeSet;
use std::sync::{Mutex, PoisonError, RwLock};

pub struct MultiDelegate<S, T> {
    config: MultiDelegateConfig,
    token: T,
    registry: ProxyRegistry<S>,
    ledger: Mutex<DelegationLedger>,
    locks: LockTable,
    uri: RwLock<String>,
    events: EventBus,
}

impl<S: AccountStore, T: GovernanceToken> MultiDelegate<S, T> {
    pub fn new(config: MultiDelegateConfig, store: S, token: T) -> Result<Self, LedgerError> {
        Self::with_ledger(config, store, token, DelegationLedger::new())
    }

    /// Start from a previously saved ledger (see [`MultiDelegate::save_state`]).
    ///
    /// Fails with [`LedgerError::ConservationViolated`] if any class in the
    /// saved ledger is not backed by its proxy under this configuration.
    pub fn with_ledger(
        config: MultiDelegateConfig,
        store: S,
        token: T,
        ledger: DelegationLedger,
    ) -> Result<Self, LedgerError> {
        config.validate()?;
        let registry = ProxyRegistry::new(store, config.system_address, config.salt, token.address());
        let engine = Self {
            uri: RwLock::new(config.uri.clone()),
            config,
            token,
            registry,
            ledger: Mutex::new(ledger),
            locks: LockTable::new(),
            events: EventBus::new(),
        };
        engine
            .verify_conservation()
            .inspect_err(|e| tracing::error!(error = %e, "restored ledger rejected"))?;
        Ok(engine)
    }

    pub fn config(&self) -> &MultiDelegateConfig {
        &self.config
    }

    pub fn token(&self) -> &T {
        &self.token
    }

    pub fn registry(&self) -> &ProxyRegistry<S> {
        &self.registry
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&DelegationEvent) + Send + Sync>) {
        self.events.subscribe(listener);
    }

    /// Withdraw `amounts[i]` from `sources[i]` and deposit `amounts[i]` to
    /// `targets[i]` on behalf of `holder`, atomically.
    pub fn delegate_multi(
        &self,
        holder: &Address,
        sources: &[DelegateId],
        targets: &[DelegateId],
        amounts: &[Amount],
    ) -> Result<ReconcileOutcome, LedgerError> {
        let request = BatchRequest::new(sources.to_vec(), targets.to_vec(), amounts.to_vec());
        self.reconcile(holder, &request)
    }

    pub fn reconcile(
        &self,
        holder: &Address,
        request: &BatchRequest,
    ) -> Result<ReconcileOutcome, LedgerError> {
        BatchReconciler::new(&self.registry, &self.ledger, &self.token, &self.locks)
            .reconcile(holder, request, |outcome| self.publish(outcome))
    }

    fn publish(&self, outcome: &ReconcileOutcome) {
        for h in &outcome.deployed {
            self.events.emit(&DelegationEvent::ProxyDeployed {
                delegate: h.delegate,
                proxy: h.address,
            });
        }
        for (delegate, amount) in &outcome.withdrawn {
            self.events.emit(&DelegationEvent::Withdrawn {
                holder: outcome.holder,
                delegate: *delegate,
                amount: *amount,
            });
        }
        for (delegate, amount) in &outcome.deposited {
            self.events.emit(&DelegationEvent::Deposited {
                holder: outcome.holder,
                delegate: *delegate,
                amount: *amount,
            });
        }
    }

    /// Deploy `delegate`'s proxy outside of a batch. Idempotent.
    pub fn deploy_proxy(&self, delegate: &DelegateId) -> Result<ProxyHandle, LedgerError> {
        let keys = BTreeSet::from([LockKey::Delegate(*delegate)]);
        let handles = self.locks.handles(&keys);
        let _guards = acquire(&handles);
        let (handle, created) = self.registry.get_or_create(delegate, &self.token)?;
        if created {
            self.events.emit(&DelegationEvent::ProxyDeployed {
                delegate: handle.delegate,
                proxy: handle.address,
            });
        }
        Ok(handle)
    }

    /// Where `delegate`'s proxy lives, deployed or not.
    pub fn proxy_address(&self, delegate: &DelegateId) -> Address {
        self.registry.derive(delegate).address
    }

    /// `delegate`'s proxy if it has been deployed.
    pub fn proxy(&self, delegate: &DelegateId) -> Result<Option<ProxyHandle>, LedgerError> {
        self.registry.get(delegate)
    }

    /// Asset held by `delegate`'s proxy.
    pub fn get_balance_for_delegate(&self, delegate: &DelegateId) -> Amount {
        self.token.balance_of(&self.proxy_address(delegate))
    }

    pub fn balance_of(&self, holder: &Address, delegate: &DelegateId) -> Amount {
        lock_ledger(&self.ledger).balance_of(holder, delegate)
    }

    /// Pairwise `balance_of(holders[i], delegates[i])`.
    pub fn balance_of_batch(
        &self,
        holders: &[Address],
        delegates: &[DelegateId],
    ) -> Result<Vec<Amount>, LedgerError> {
        if holders.len() != delegates.len() {
            return Err(LedgerError::QueryLengthMismatch {
                holders: holders.len(),
                delegates: delegates.len(),
            });
        }
        let ledger = lock_ledger(&self.ledger);
        Ok(holders
            .iter()
            .zip(delegates)
            .map(|(h, d)| ledger.balance_of(h, d))
            .collect())
    }

    pub fn total_supply(&self, delegate: &DelegateId) -> Amount {
        lock_ledger(&self.ledger).total_supply(delegate)
    }

    /// Everything `holder` has delegated, across all delegates.
    pub fn holder_total(&self, holder: &Address) -> Amount {
        lock_ledger(&self.ledger).holder_total(holder)
    }

    /// Metadata URI for `delegate`'s accounting-token class.
    pub fn uri(&self, delegate: &DelegateId) -> String {
        self.uri
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .replace("{id}", &delegate.token_id().to_string())
    }

    pub fn set_uri(&self, caller: &Address, uri: impl Into<String>) -> Result<(), LedgerError> {
        if self.config.owner.is_zero() || *caller != self.config.owner {
            return Err(LedgerError::NotOwner(*caller));
        }
        let uri = uri.into();
        *self.uri.write().unwrap_or_else(PoisonError::into_inner) = uri.clone();
        tracing::info!(%uri, "metadata uri changed");
        self.events.emit(&DelegationEvent::UriChanged { uri });
        Ok(())
    }

    /// Check that every minted class is fully backed by its proxy's asset
    /// balance.
    pub fn verify_conservation(&self) -> Result<(), LedgerError> {
        let delegates: BTreeSet<DelegateId> = lock_ledger(&self.ledger)
            .classes()
            .map(|(d, _)| *d)
            .collect();
        let keys: BTreeSet<_> = delegates.iter().copied().map(LockKey::Delegate).collect();
        let handles = self.locks.handles(&keys);
        let _guards = acquire(&handles);

        // Only the delegates locked above; classes minted since then belong
        // to batches that may still be committing.
        let ledger = lock_ledger(&self.ledger);
        for delegate in &delegates {
            let supply = ledger.total_supply(delegate);
            let proxy_balance = self.get_balance_for_delegate(delegate);
            if proxy_balance != supply {
                return Err(LedgerError::ConservationViolated {
                    delegate: *delegate,
                    supply,
                    proxy_balance,
                });
            }
        }
        Ok(())
    }

    /// Serialize the delegation ledger.
    pub fn save_state(&self) -> Result<Vec<u8>, LedgerError> {
        lock_ledger(&self.ledger).save_state()
    }

    /// Drop per-holder and per-delegate locks that are no longer in use.
    pub fn prune_locks(&self) {
        self.locks.prune();
    }
}
