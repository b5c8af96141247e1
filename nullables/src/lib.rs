//! Nullable infrastructure for deterministic testing.
//!
//! The ledger only talks to its environment through the `AccountStore` and
//! `GovernanceToken` traits. This crate provides in-memory implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically (minting, planting foreign code, injected failures)
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod store;
pub mod token;

pub use store::NullAccountStore;
pub use token::NullToken;
