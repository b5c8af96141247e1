//! Deterministic, idempotent proxy factory.
//!
//! A delegate's proxy address is derived from the delegate alone (plus the
//! fixed factory address, salt and asset), so any two callers asking for the
//! same delegate arrive at the same address. Whether the proxy exists is a
//! single code lookup at that address; there is no registry table to keep in
//! sync.

use crate::error::LedgerError;
use crate::journal::Journal;
use multidelegate_crypto::derive_proxy_address;
use multidelegate_store::{AccountCode, AccountStore, GovernanceToken};
use multidelegate_types::{Address, DelegateId, ProxyHandle, Salt};

/// Result of looking up a delegate's proxy address.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProxyStatus {
    /// Proxy code for this delegate is installed at the derived address.
    Deployed(ProxyHandle),
    /// Nothing lives at the derived address yet.
    Vacant(ProxyHandle),
}

impl ProxyStatus {
    pub fn handle(&self) -> &ProxyHandle {
        match self {
            ProxyStatus::Deployed(h) | ProxyStatus::Vacant(h) => h,
        }
    }

    pub fn is_deployed(&self) -> bool {
        matches!(self, ProxyStatus::Deployed(_))
    }
}

pub struct ProxyRegistry<S> {
    store: S,
    factory: Address,
    salt: Salt,
    asset: Address,
}

impl<S: AccountStore> ProxyRegistry<S> {
    pub fn new(store: S, factory: Address, salt: Salt, asset: Address) -> Self {
        Self {
            store,
            factory,
            salt,
            asset,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn factory(&self) -> &Address {
        &self.factory
    }

    /// The proxy handle for `delegate`. Pure: no storage access.
    pub fn derive(&self, delegate: &DelegateId) -> ProxyHandle {
        ProxyHandle {
            address: derive_proxy_address(&self.factory, &self.salt, &self.asset, delegate),
            delegate: *delegate,
        }
    }

    fn proxy_code(&self, delegate: &DelegateId) -> AccountCode {
        AccountCode::Proxy {
            asset: self.asset,
            delegate: *delegate,
        }
    }

    /// Look up the derived address.
    ///
    /// Fails with [`LedgerError::ProxyDerivationCollision`] when the address
    /// holds anything other than this delegate's proxy code.
    pub fn status(&self, delegate: &DelegateId) -> Result<ProxyStatus, LedgerError> {
        let handle = self.derive(delegate);
        match self.store.code_at(&handle.address)? {
            None => Ok(ProxyStatus::Vacant(handle)),
            Some(code) if code == self.proxy_code(delegate) => Ok(ProxyStatus::Deployed(handle)),
            Some(_) => Err(LedgerError::ProxyDerivationCollision {
                delegate: *delegate,
                address: handle.address,
            }),
        }
    }

    /// The deployed proxy for `delegate`, if any.
    pub fn get(&self, delegate: &DelegateId) -> Result<Option<ProxyHandle>, LedgerError> {
        Ok(match self.status(delegate)? {
            ProxyStatus::Deployed(h) => Some(h),
            ProxyStatus::Vacant(_) => None,
        })
    }

    /// Return the delegate's proxy, deploying it first if needed.
    ///
    /// The second element is `true` when this call performed the deployment.
    /// Callers must hold the delegate's lock.
    pub fn get_or_create<T: GovernanceToken + ?Sized>(
        &self,
        delegate: &DelegateId,
        token: &T,
    ) -> Result<(ProxyHandle, bool), LedgerError> {
        let handle = match self.status(delegate)? {
            ProxyStatus::Deployed(h) => return Ok((h, false)),
            ProxyStatus::Vacant(h) => h,
        };
        let mut journal = Journal::new(token, self.factory);
        let deployed = journal
            .bind(&handle)
            .and_then(|_| self.record(std::slice::from_ref(&handle)));
        if let Err(e) = deployed {
            journal.rollback();
            return Err(e);
        }
        Ok((handle, true))
    }

    /// Install proxy code for every handle in one atomic store write.
    pub(crate) fn record(&self, handles: &[ProxyHandle]) -> Result<(), LedgerError> {
        if handles.is_empty() {
            return Ok(());
        }
        let entries: Vec<_> = handles
            .iter()
            .map(|h| (h.address, self.proxy_code(&h.delegate)))
            .collect();
        self.store.put_codes(&entries)?;
        for h in handles {
            tracing::info!(delegate = %h.delegate, proxy = %h.address, "proxy deployed");
        }
        Ok(())
    }
}
