//! Multi-delegate proxy ledger.
//!
//! Lets one token holder split voting power across many delegates. Each
//! delegate gets a deterministically addressed proxy account that holds the
//! delegated asset and votes for that delegate; each holder's share of a
//! proxy is tracked as a balance of that delegate's accounting-token class.
//!
//! Components, leaf-first:
//! - [`ProxyRegistry`]: derives proxy addresses and deploys proxies idempotently
//! - [`DelegationLedger`]: `holder -> delegate -> amount`, mint/burn restricted to this crate
//! - [`AssetTransferAdapter`]: pull/push of the external asset
//! - [`BatchReconciler`]: one atomic withdraw-then-deposit batch
//! - [`MultiDelegate`]: the public call surface tying them together

pub mod adapter;
pub mod batch;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
mod journal;
pub mod ledger;
pub mod locks;
pub mod reconciler;
pub mod registry;
mod staging;

pub use adapter::AssetTransferAdapter;
pub use batch::BatchRequest;
pub use config::MultiDelegateConfig;
pub use engine::MultiDelegate;
pub use error::LedgerError;
pub use events::{DelegationEvent, EventBus};
pub use ledger::DelegationLedger;
pub use locks::{LockKey, LockTable};
pub use reconciler::{BatchReconciler, ReconcileOutcome};
pub use registry::{ProxyRegistry, ProxyStatus};
