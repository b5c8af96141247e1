//! Events published after a batch commits.

use multidelegate_types::{Address, Amount, DelegateId};

/// Ledger-level events that observers can subscribe to via the [`EventBus`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DelegationEvent {
    /// A proxy was deployed and bound to its delegate.
    ProxyDeployed { delegate: DelegateId, proxy: Address },
    /// A holder took `amount` back out of a delegate's proxy.
    Withdrawn {
        holder: Address,
        delegate: DelegateId,
        amount: Amount,
    },
    /// A holder put `amount` into a delegate's proxy.
    Deposited {
        holder: Address,
        delegate: DelegateId,
        amount: Amount,
    },
    /// The metadata URI template changed.
    UriChanged { uri: String },
}

/// Synchronous fan-out event bus.
///
/// Listeners are invoked inline on the committing thread while the batch's
/// locks are still held; keep handlers fast.
pub struct EventBus {
    listeners: Vec<Box<dyn Fn(&DelegationEvent) + Send + Sync>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&DelegationEvent) + Send + Sync>) {
        self.listeners.push(listener);
    }

    pub fn emit(&self, event: &DelegationEvent) {
        for listener in &self.listeners {
            listener(event);
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
