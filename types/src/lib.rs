//! Fundamental types for the multi-delegate ledger.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! account addresses, delegate identities and their accounting-token ids, amounts,
//! derivation salts, and proxy handles.

pub mod address;
pub mod amount;
pub mod delegate;
pub mod error;
pub mod proxy;
pub mod salt;

pub use address::Address;
pub use alloy_primitives::U256;
pub use amount::Amount;
pub use delegate::{DelegateId, TokenId};
pub use error::TypesError;
pub use proxy::ProxyHandle;
pub use salt::Salt;
