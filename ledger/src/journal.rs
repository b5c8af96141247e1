//! Asset-side transaction log for the commit phase.
//!
//! Every effect applied to the external token is recorded together with what
//! is needed to undo it. If a later step fails, [`Journal::rollback`] replays
//! the log backwards with compensating calls.

use crate::adapter::AssetTransferAdapter;
use crate::error::LedgerError;
use multidelegate_store::GovernanceToken;
use multidelegate_types::{Address, Amount, ProxyHandle};

#[derive(Clone, Debug)]
enum Effect {
    Approved { owner: Address, previous: Amount },
    Delegated { account: Address, previous: Address },
    Pulled { from: Address, proxy: Address, amount: Amount, allowance_before: Amount },
    Pushed { proxy: Address, to: Address, amount: Amount },
}

pub(crate) struct Journal<'a, T: ?Sized> {
    adapter: AssetTransferAdapter<'a, T>,
    effects: Vec<Effect>,
}

impl<'a, T: GovernanceToken + ?Sized> Journal<'a, T> {
    pub(crate) fn new(token: &'a T, spender: Address) -> Self {
        Self {
            adapter: AssetTransferAdapter::new(token, spender),
            effects: Vec::new(),
        }
    }

    /// Bind a proxy on the token side: grant the ledger a max allowance and
    /// direct the proxy's votes to its delegate.
    pub(crate) fn bind(&mut self, handle: &ProxyHandle) -> Result<(), LedgerError> {
        let token = self.adapter.token();
        let spender = *self.adapter.spender();
        let proxy = handle.address;
        let binding_failed = |reason| LedgerError::ProxyBindingFailed {
            delegate: handle.delegate,
            proxy,
            reason,
        };

        let previous = token.allowance(&proxy, &spender);
        token
            .approve(&proxy, &spender, Amount::MAX)
            .map_err(binding_failed)?;
        self.effects.push(Effect::Approved { owner: proxy, previous });

        let previous = token.delegates(&proxy);
        token
            .delegate(&proxy, handle.delegate.address())
            .map_err(binding_failed)?;
        self.effects.push(Effect::Delegated { account: proxy, previous });
        Ok(())
    }

    pub(crate) fn pull(&mut self, from: &Address, proxy: &Address, amount: Amount) -> Result<(), LedgerError> {
        let allowance_before = self.adapter.token().allowance(from, self.adapter.spender());
        self.adapter.pull(from, proxy, amount)?;
        self.effects.push(Effect::Pulled {
            from: *from,
            proxy: *proxy,
            amount,
            allowance_before,
        });
        Ok(())
    }

    pub(crate) fn push(&mut self, proxy: &Address, to: &Address, amount: Amount) -> Result<(), LedgerError> {
        self.adapter.push(proxy, to, amount)?;
        self.effects.push(Effect::Pushed {
            proxy: *proxy,
            to: *to,
            amount,
        });
        Ok(())
    }

    /// Undo every recorded effect, newest first.
    ///
    /// Compensation is best effort: a failing undo step is logged and the
    /// remaining steps still run.
    pub(crate) fn rollback(self) {
        let token = self.adapter.token();
        let spender = *self.adapter.spender();
        for effect in self.effects.into_iter().rev() {
            let result = match &effect {
                Effect::Approved { owner, previous } => token.approve(owner, &spender, *previous),
                Effect::Delegated { account, previous } => token.delegate(account, previous),
                Effect::Pulled { from, proxy, amount, allowance_before } => token
                    .transfer_from(&spender, proxy, from, *amount)
                    .and_then(|_| {
                        if *allowance_before == Amount::MAX {
                            Ok(())
                        } else {
                            token.approve(from, &spender, *allowance_before)
                        }
                    }),
                Effect::Pushed { proxy, to, amount } => token.transfer(to, proxy, *amount),
            };
            if let Err(e) = result {
                tracing::error!(?effect, error = %e, "compensation step failed");
            }
        }
    }
}
