//! Abstract state traits for the multi-delegate ledger.
//!
//! Every backend (in-memory for testing, a chain adapter in production)
//! implements these traits. The ledger crate depends only on the traits.

pub mod account;
pub mod asset;
pub mod error;

pub use account::{AccountCode, AccountStore};
pub use asset::{AssetError, GovernanceToken};
pub use error::StoreError;
