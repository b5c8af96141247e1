//! Handle to a deployed (or deployable) per-delegate proxy account.

use crate::{Address, DelegateId};
use serde::{Deserialize, Serialize};

/// A proxy account and the delegate it is permanently bound to.
///
/// The address is a pure function of the delegate, the ledger's own address
/// and the system salt, so two handles for the same delegate are always equal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProxyHandle {
    pub address: Address,
    pub delegate: DelegateId,
}
