use multidelegate_store::{AssetError, StoreError};
use multidelegate_types::{Address, Amount, DelegateId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("insufficient delegated balance: {holder} has {available} with {delegate}, asked to withdraw {requested}")]
    InsufficientDelegatedBalance {
        holder: Address,
        delegate: DelegateId,
        requested: Amount,
        available: Amount,
    },

    #[error("asset transfer of {amount} from {from} to {to} failed: {reason}")]
    AssetTransferFailed {
        from: Address,
        to: Address,
        amount: Amount,
        #[source]
        reason: AssetError,
    },

    #[error("proxy address {address} for delegate {delegate} is occupied by a non-proxy account")]
    ProxyDerivationCollision { delegate: DelegateId, address: Address },

    #[error("binding proxy {proxy} to delegate {delegate} failed: {reason}")]
    ProxyBindingFailed {
        delegate: DelegateId,
        proxy: Address,
        #[source]
        reason: AssetError,
    },

    #[error("batch names no source and no target delegates")]
    EmptyBatch,

    #[error("amounts length mismatch: expected {expected}, got {actual}")]
    AmountsLengthMismatch { expected: usize, actual: usize },

    #[error("query length mismatch: {holders} holders, {delegates} delegates")]
    QueryLengthMismatch { holders: usize, delegates: usize },

    #[error("amount overflow")]
    AmountOverflow,

    #[error("conservation violated for {delegate}: ledger supply {supply}, proxy balance {proxy_balance}")]
    ConservationViolated {
        delegate: DelegateId,
        supply: Amount,
        proxy_balance: Amount,
    },

    #[error("caller {0} is not the owner")]
    NotOwner(Address),

    #[error("config error: {0}")]
    Config(String),

    #[error("snapshot error: {0}")]
    Snapshot(String),

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}
