//! Events emitted by ledger operations.
//!
//! Every successful mutating call appends its events to the ledger's log in
//! emission order and fans them out to [`EventBus`] subscribers. A failed
//! call emits nothing.

use multisig_types::{AccountId, Amount, TxIndex};
use serde::{Deserialize, Serialize};

/// Observable ledger events.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    /// An owner created a new proposal.
    TransactionProposed {
        index: TxIndex,
        proposer: AccountId,
        target: AccountId,
        value: Amount,
    },
    /// An owner approved a pending proposal.
    TransactionConfirmed { index: TxIndex, voter: AccountId },
    /// An owner voted against a pending proposal.
    TransactionRejected { index: TxIndex, voter: AccountId },
    /// The threshold was reached and the transfer was released.
    TransactionExecuted { index: TxIndex },
    /// The threshold became unreachable; the proposal is closed.
    ProposalBlocked { index: TxIndex },
    /// Value was paid into the wallet.
    Deposit {
        from: AccountId,
        amount: Amount,
        balance: Amount,
    },
}

impl LedgerEvent {
    /// Stable event name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::TransactionProposed { .. } => "TransactionProposed",
            Self::TransactionConfirmed { .. } => "TransactionConfirmed",
            Self::TransactionRejected { .. } => "TransactionRejected",
            Self::TransactionExecuted { .. } => "TransactionExecuted",
            Self::ProposalBlocked { .. } => "ProposalBlocked",
            Self::Deposit { .. } => "Deposit",
        }
    }

    /// The transaction this event concerns, if any.
    pub fn index(&self) -> Option<TxIndex> {
        match self {
            Self::TransactionProposed { index, .. }
            | Self::TransactionConfirmed { index, .. }
            | Self::TransactionRejected { index, .. }
            | Self::TransactionExecuted { index }
            | Self::ProposalBlocked { index } => Some(*index),
            Self::Deposit { .. } => None,
        }
    }
}

/// Synchronous fan-out event bus for ledger events.
///
/// Listeners are invoked inline, after the call that emitted the event has
/// committed.
pub struct EventBus {
    listeners: Vec<Box<dyn Fn(&LedgerEvent) + Send + Sync>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&LedgerEvent) + Send + Sync>) {
        self.listeners.push(listener);
    }

    pub fn emit(&self, event: &LedgerEvent) {
        for listener in &self.listeners {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    #[test]
    fn emit_calls_all_listeners() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut bus = EventBus::new();

        let c1 = Arc::clone(&counter);
        bus.subscribe(Box::new(move |_| {
            c1.fetch_add(1, Ordering::SeqCst);
        }));

        let c2 = Arc::clone(&counter);
        bus.subscribe(Box::new(move |_| {
            c2.fetch_add(10, Ordering::SeqCst);
        }));

        bus.emit(&LedgerEvent::TransactionExecuted { index: 0 });

        assert_eq!(counter.load(Ordering::SeqCst), 11);
        assert_eq!(bus.listener_count(), 2);
    }

    #[test]
    fn emit_with_no_listeners_is_noop() {
        let bus = EventBus::new();
        bus.emit(&LedgerEvent::ProposalBlocked { index: 7 });
    }

    #[test]
    fn names_and_indices() {
        let voter = AccountId::from_bytes([2; 20]);
        let event = LedgerEvent::TransactionRejected { index: 4, voter };
        assert_eq!(event.name(), "TransactionRejected");
        assert_eq!(event.index(), Some(4));

        let deposit = LedgerEvent::Deposit {
            from: voter,
            amount: Amount::new(5),
            balance: Amount::new(5),
        };
        assert_eq!(deposit.name(), "Deposit");
        assert_eq!(deposit.index(), None);
    }
}
