//! Account code storage trait.
//!
//! The proxy registry never keeps its own table of deployed proxies: a proxy
//! exists exactly when its derived address holds proxy code.

use crate::StoreError;
use multidelegate_types::{Address, DelegateId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Code installed at an address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountCode {
    /// A proxy delegator holding `asset` and voting for `delegate`.
    Proxy { asset: Address, delegate: DelegateId },
    /// Anything not deployed by the ledger.
    Foreign { code_hash: [u8; 32] },
}

impl AccountCode {
    /// The delegate a proxy is bound to, or `None` for foreign code.
    pub fn proxy_delegate(&self) -> Option<&DelegateId> {
        match self {
            AccountCode::Proxy { delegate, .. } => Some(delegate),
            AccountCode::Foreign { .. } => None,
        }
    }
}

/// Trait for account code storage.
///
/// Code is write-once: writing to an address that already holds code must
/// fail with [`StoreError::Duplicate`].
pub trait AccountStore {
    fn code_at(&self, address: &Address) -> Result<Option<AccountCode>, StoreError>;

    /// Install code at several addresses atomically: either every entry is
    /// written or none is.
    fn put_codes(&self, entries: &[(Address, AccountCode)]) -> Result<(), StoreError>;

    fn code_count(&self) -> Result<u64, StoreError>;

    fn put_code(&self, address: &Address, code: AccountCode) -> Result<(), StoreError> {
        self.put_codes(&[(*address, code)])
    }

    fn has_code(&self, address: &Address) -> Result<bool, StoreError> {
        self.code_at(address).map(|c| c.is_some())
    }
}

impl<S: AccountStore + ?Sized> AccountStore for Arc<S> {
    fn code_at(&self, address: &Address) -> Result<Option<AccountCode>, StoreError> {
        (**self).code_at(address)
    }

    fn put_codes(&self, entries: &[(Address, AccountCode)]) -> Result<(), StoreError> {
        (**self).put_codes(entries)
    }

    fn code_count(&self) -> Result<u64, StoreError> {
        (**self).code_count()
    }
}
