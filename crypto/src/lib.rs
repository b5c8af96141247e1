//! Cryptographic primitives for the multi-delegate ledger.
//!
//! - **Blake2b-256** for all hashing
//! - Deterministic proxy address derivation (factory + salt + init-code hash),
//!   so a proxy's address is known before it exists and never needs a lookup table

pub mod derive;
pub mod hash;

pub use derive::{derive_proxy_address, proxy_init_code_hash};
pub use hash::{blake2b_256, blake2b_256_multi};
