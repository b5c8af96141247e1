//! Nullable account store: thread-safe in-memory code storage for testing.

use multidelegate_store::{AccountCode, AccountStore, StoreError};
use multidelegate_types::Address;
use std::collections::HashMap;
use std::sync::Mutex;

/// An in-memory account code store for testing.
pub struct NullAccountStore {
    code: Mutex<HashMap<Address, AccountCode>>,
}

impl NullAccountStore {
    pub fn new() -> Self {
        Self {
            code: Mutex::new(HashMap::new()),
        }
    }

    /// Install code that the ledger did not deploy, e.g. to provoke a
    /// derivation collision.
    pub fn plant_foreign(&self, address: Address, code_hash: [u8; 32]) {
        self.code
            .lock()
            .unwrap()
            .insert(address, AccountCode::Foreign { code_hash });
    }
}

impl Default for NullAccountStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AccountStore for NullAccountStore {
    fn code_at(&self, address: &Address) -> Result<Option<AccountCode>, StoreError> {
        Ok(self.code.lock().unwrap().get(address).cloned())
    }

    fn put_codes(&self, entries: &[(Address, AccountCode)]) -> Result<(), StoreError> {
        let mut map = self.code.lock().unwrap();
        for (i, (address, _)) in entries.iter().enumerate() {
            let repeated = entries[..i].iter().any(|(a, _)| a == address);
            if repeated || map.contains_key(address) {
                return Err(StoreError::Duplicate(address.to_string()));
            }
        }
        for (address, code) in entries {
            map.insert(*address, code.clone());
        }
        Ok(())
    }

    fn code_count(&self) -> Result<u64, StoreError> {
        Ok(self.code.lock().unwrap().len() as u64)
    }
}
