//! Shared utilities for the multi-delegate ledger.

pub mod logging;

pub use logging::{init_logging, LogFormat};
