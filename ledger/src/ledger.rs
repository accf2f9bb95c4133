//! The authorization ledger: owner registry, threshold, and the proposal
//! state machine.
//!
//! Every mutating call resolves all of its preconditions, including the
//! outcome of the value transfer, before it touches ledger state. A call
//! therefore either commits entirely (state and events) or returns an error
//! and leaves the ledger exactly as it was.

use multisig_types::{AccountId, Amount, OutboundTransfer, TransferError, TxIndex, ValueTransfer};
use tracing::{debug, info, warn};

use crate::error::LedgerError;
use crate::event::{EventBus, LedgerEvent};
use crate::owners::OwnerSet;
use crate::snapshot::LedgerSnapshot;
use crate::transaction::Transaction;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Vote {
    Confirm,
    Reject,
}

/// A multi-signature wallet ledger.
///
/// `T` is the mechanism that actually moves value when a proposal executes.
#[derive(Debug)]
pub struct MultisigLedger<T> {
    owners: OwnerSet,
    required_confirmations: u32,
    transactions: Vec<Transaction>,
    balance: Amount,
    events: Vec<LedgerEvent>,
    bus: EventBus,
    transfer: T,
}

impl<T: ValueTransfer> MultisigLedger<T> {
    /// Create a ledger controlled by `owners`, executing proposals once
    /// `required_confirmations` distinct owners approve.
    pub fn new(
        owners: Vec<AccountId>,
        required_confirmations: u32,
        transfer: T,
    ) -> Result<Self, LedgerError> {
        let owners = OwnerSet::new(owners)?;
        check_threshold(&owners, required_confirmations)?;
        info!(
            owners = owners.len(),
            required_confirmations, "multisig ledger created"
        );
        Ok(Self {
            owners,
            required_confirmations,
            transactions: Vec::new(),
            balance: Amount::ZERO,
            events: Vec::new(),
            bus: EventBus::new(),
            transfer,
        })
    }

    // ── Mutations ──────────────────────────────────────────────────────

    /// Propose a transfer of `value` to `target`. The caller's approval is
    /// counted immediately; with a threshold of 1 the transfer executes in
    /// this same call.
    pub fn propose(
        &mut self,
        caller: &AccountId,
        target: AccountId,
        value: Amount,
        payload: Vec<u8>,
    ) -> Result<TxIndex, LedgerError> {
        self.authorize(caller)?;

        let index = self.transactions.len() as TxIndex;
        let mut tx = Transaction::proposed(*caller, target, value, payload);
        let mut events = vec![LedgerEvent::TransactionProposed {
            index,
            proposer: *caller,
            target,
            value,
        }];

        if tx.confirmations >= self.required_confirmations {
            self.balance = self.release(tx.outbound(index))?;
            tx.executed = true;
            events.push(LedgerEvent::TransactionExecuted { index });
            info!(index, %target, %value, "transaction executed on proposal");
        }

        info!(index, proposer = %caller, %target, %value, "transaction proposed");
        self.transactions.push(tx);
        self.commit(events);
        Ok(index)
    }

    /// Approve pending transaction `index`. Executes the transfer once the
    /// threshold is reached.
    pub fn confirm(&mut self, caller: &AccountId, index: TxIndex) -> Result<(), LedgerError> {
        let slot = self.open_for_vote(caller, index, Vote::Confirm)?;

        let confirmations = self.transactions[slot].confirmations + 1;
        let executes = confirmations >= self.required_confirmations;
        let remaining = if executes {
            let outbound = self.transactions[slot].outbound(index);
            Some(self.release(outbound)?)
        } else {
            None
        };

        let tx = &mut self.transactions[slot];
        tx.confirmations = confirmations;
        tx.voters.insert(*caller);
        debug!(index, voter = %caller, confirmations, "transaction confirmed");

        let mut events = vec![LedgerEvent::TransactionConfirmed {
            index,
            voter: *caller,
        }];
        if let Some(remaining) = remaining {
            tx.executed = true;
            info!(index, target = %tx.target, value = %tx.value, "transaction executed");
            self.balance = remaining;
            events.push(LedgerEvent::TransactionExecuted { index });
        }

        self.commit(events);
        Ok(())
    }

    /// Vote against pending transaction `index`. Closes the proposal as soon
    /// as the remaining owners can no longer reach the threshold.
    pub fn reject(&mut self, caller: &AccountId, index: TxIndex) -> Result<(), LedgerError> {
        let slot = self.open_for_vote(caller, index, Vote::Reject)?;
        let blocked_at = self.owner_count();
        let required = self.required_confirmations;

        let tx = &mut self.transactions[slot];
        tx.rejections += 1;
        tx.voters.insert(*caller);
        debug!(index, voter = %caller, rejections = tx.rejections, "transaction rejected");

        let mut events = vec![LedgerEvent::TransactionRejected {
            index,
            voter: *caller,
        }];
        if quorum_unreachable(blocked_at, tx.rejections, required) {
            tx.rejected = true;
            info!(index, rejections = tx.rejections, "proposal blocked");
            events.push(LedgerEvent::ProposalBlocked { index });
        }

        self.commit(events);
        Ok(())
    }

    /// Pay `amount` into the wallet. Anyone may deposit.
    pub fn deposit(&mut self, from: AccountId, amount: Amount) -> Result<(), LedgerError> {
        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount);
        }
        let balance = self
            .balance
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow)?;
        self.balance = balance;
        info!(%from, %amount, %balance, "deposit received");
        self.commit(vec![LedgerEvent::Deposit {
            from,
            amount,
            balance,
        }]);
        Ok(())
    }

    /// Register a listener invoked for every event committed from now on.
    pub fn subscribe(&mut self, listener: Box<dyn Fn(&LedgerEvent) + Send + Sync>) {
        self.bus.subscribe(listener);
        debug!(listeners = self.bus.listener_count(), "ledger listener subscribed");
    }

    // ── Queries ────────────────────────────────────────────────────────

    pub fn get_owners(&self) -> &[AccountId] {
        self.owners.as_slice()
    }

    pub fn is_owner(&self, address: &AccountId) -> bool {
        self.owners.is_owner(address)
    }

    pub fn get_transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn get_transaction(&self, index: TxIndex) -> Result<&Transaction, LedgerError> {
        self.slot(index)
            .map(|slot| &self.transactions[slot])
            .ok_or(LedgerError::NotFound(index))
    }

    pub fn get_transaction_count(&self) -> u64 {
        self.transactions.len() as u64
    }

    pub fn get_confirmations_required(&self) -> u32 {
        self.required_confirmations
    }

    pub fn balance(&self) -> Amount {
        self.balance
    }

    /// Transactions still collecting votes, in creation order.
    pub fn pending_transactions(&self) -> impl Iterator<Item = (TxIndex, &Transaction)> {
        self.transactions
            .iter()
            .enumerate()
            .filter(|(_, tx)| tx.is_pending())
            .map(|(i, tx)| (i as TxIndex, tx))
    }

    /// Every event committed since this ledger value was created or restored.
    pub fn events(&self) -> &[LedgerEvent] {
        &self.events
    }

    /// The value-transfer mechanism this ledger releases funds through.
    pub fn transfer_mechanism(&self) -> &T {
        &self.transfer
    }

    pub fn transfer_mechanism_mut(&mut self) -> &mut T {
        &mut self.transfer
    }

    // ── Persistence ────────────────────────────────────────────────────

    /// Capture owners, threshold, balance, and all records.
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot::create(
            self.owners.as_slice().to_vec(),
            self.required_confirmations,
            self.balance,
            self.transactions.clone(),
        )
    }

    /// Rebuild a ledger from a snapshot, re-checking every invariant.
    pub fn restore(snapshot: LedgerSnapshot, transfer: T) -> Result<Self, LedgerError> {
        if !snapshot.verify() {
            return Err(LedgerError::Snapshot("hash mismatch".into()));
        }
        if snapshot.version != LedgerSnapshot::VERSION {
            return Err(LedgerError::Snapshot(format!(
                "unsupported version {}",
                snapshot.version
            )));
        }

        let transaction_count = snapshot.transaction_count();
        let owners = OwnerSet::new(snapshot.owners)?;
        check_threshold(&owners, snapshot.required_confirmations)?;
        let owner_count = owners.len() as u32;

        for (index, tx) in snapshot.transactions.iter().enumerate() {
            let required = snapshot.required_confirmations;
            let foreign_voter = tx.voters().any(|v| !owners.is_owner(v));
            let reached = tx.confirmations >= required;
            let overfull = tx.confirmations > required;
            let blocked = quorum_unreachable(owner_count, tx.rejections, required);
            if !tx.is_consistent()
                || foreign_voter
                || overfull
                || reached != tx.executed
                || blocked != tx.rejected
            {
                return Err(LedgerError::Snapshot(format!(
                    "transaction {index} is inconsistent"
                )));
            }
        }

        info!(
            transactions = transaction_count,
            balance = %snapshot.balance,
            "multisig ledger restored"
        );
        Ok(Self {
            owners,
            required_confirmations: snapshot.required_confirmations,
            transactions: snapshot.transactions,
            balance: snapshot.balance,
            events: Vec::new(),
            bus: EventBus::new(),
            transfer,
        })
    }

    // ── Internals ──────────────────────────────────────────────────────

    fn authorize(&self, caller: &AccountId) -> Result<(), LedgerError> {
        if self.owners.is_owner(caller) {
            Ok(())
        } else {
            Err(LedgerError::Unauthorized(*caller))
        }
    }

    fn slot(&self, index: TxIndex) -> Option<usize> {
        usize::try_from(index)
            .ok()
            .filter(|&slot| slot < self.transactions.len())
    }

    /// Checks, in order: ownership, existence, not terminal, not yet voted.
    fn open_for_vote(
        &self,
        caller: &AccountId,
        index: TxIndex,
        vote: Vote,
    ) -> Result<usize, LedgerError> {
        self.authorize(caller)?;
        let slot = self.slot(index).ok_or(LedgerError::NotFound(index))?;
        let tx = &self.transactions[slot];
        let status = tx.status();
        if status.is_terminal() {
            return Err(LedgerError::AlreadyFinalized { index, status });
        }
        if tx.has_voted(caller) {
            debug!(index, voter = %caller, ?vote, "duplicate vote refused");
            return Err(LedgerError::DuplicateVote {
                index,
                voter: *caller,
            });
        }
        Ok(slot)
    }

    /// Hand the transfer to the mechanism. Returns the balance to commit on
    /// success; ledger state is untouched either way.
    fn release(&mut self, outbound: OutboundTransfer) -> Result<Amount, LedgerError> {
        let index = outbound.index;
        let available = self.balance;
        let remaining = available.checked_sub(outbound.value).ok_or_else(|| {
            warn!(index, needed = %outbound.value, %available, "insufficient wallet balance");
            LedgerError::TransferFailed {
                index,
                source: TransferError::InsufficientFunds {
                    needed: outbound.value.raw(),
                    available: available.raw(),
                },
            }
        })?;

        self.transfer.transfer(&outbound).map_err(|source| {
            warn!(index, error = %source, "value transfer failed");
            LedgerError::TransferFailed { index, source }
        })?;
        Ok(remaining)
    }

    fn commit(&mut self, events: Vec<LedgerEvent>) {
        for event in events {
            self.bus.emit(&event);
            self.events.push(event);
        }
    }

    fn owner_count(&self) -> u32 {
        self.owners.len() as u32
    }
}

fn check_threshold(owners: &OwnerSet, required_confirmations: u32) -> Result<(), LedgerError> {
    let owner_count = u32::try_from(owners.len())
        .map_err(|_| LedgerError::InvalidConfig("too many owners".into()))?;
    if required_confirmations == 0 {
        return Err(LedgerError::InvalidConfig(
            "required confirmations must be at least 1".into(),
        ));
    }
    if required_confirmations > owner_count {
        return Err(LedgerError::InvalidConfig(format!(
            "required confirmations {required_confirmations} exceeds owner count {owner_count}"
        )));
    }
    Ok(())
}

/// True once the owners who have not rejected can no longer supply
/// `required` confirmations: `owners - rejections < required`.
pub fn quorum_unreachable(owners: u32, rejections: u32, required: u32) -> bool {
    owners.saturating_sub(rejections) < required
}

#[cfg(test)]
mod tests {
    use super::*;
    use multisig_nullables::NullTransfer;

    fn owner(n: u8) -> AccountId {
        AccountId::from_bytes([n; 20])
    }

    fn owners(count: u8) -> Vec<AccountId> {
        (1..=count).map(owner).collect()
    }

    fn funded(count: u8, required: u32) -> MultisigLedger<NullTransfer> {
        let mut ledger = MultisigLedger::new(owners(count), required, NullTransfer::new()).unwrap();
        ledger.deposit(owner(1), Amount::new(1_000_000)).unwrap();
        ledger
    }

    #[test]
    fn new_validates_threshold() {
        assert!(MultisigLedger::new(owners(3), 0, NullTransfer::new()).is_err());
        assert!(MultisigLedger::new(owners(3), 4, NullTransfer::new()).is_err());
        assert!(MultisigLedger::new(vec![], 1, NullTransfer::new()).is_err());
        assert!(MultisigLedger::new(owners(3), 3, NullTransfer::new()).is_ok());
    }

    #[test]
    fn quorum_arithmetic_boundary() {
        // 10 owners, 6 required: 4 rejections still leave 6 possible approvers.
        assert!(!quorum_unreachable(10, 4, 6));
        assert!(quorum_unreachable(10, 5, 6));
        // Unanimity: a single rejection closes the proposal.
        assert!(quorum_unreachable(3, 1, 3));
        assert!(!quorum_unreachable(3, 0, 3));
    }

    #[test]
    fn propose_records_proposer_vote() {
        let mut ledger = funded(3, 2);
        let index = ledger
            .propose(&owner(1), owner(9), Amount::new(10), vec![1, 2])
            .unwrap();
        assert_eq!(index, 0);
        let tx = ledger.get_transaction(index).unwrap();
        assert_eq!(tx.confirmations, 1);
        assert!(tx.has_voted(&owner(1)));
        assert!(tx.is_pending());
    }

    #[test]
    fn proposer_cannot_vote_again() {
        let mut ledger = funded(3, 2);
        let index = ledger.propose(&owner(1), owner(9), Amount::new(10), vec![]).unwrap();
        assert!(matches!(
            ledger.confirm(&owner(1), index),
            Err(LedgerError::DuplicateVote { .. })
        ));
        assert!(matches!(
            ledger.reject(&owner(1), index),
            Err(LedgerError::DuplicateVote { .. })
        ));
    }

    #[test]
    fn confirm_executes_at_threshold_and_debits_balance() {
        let mut ledger = funded(3, 2);
        let index = ledger.propose(&owner(1), owner(9), Amount::new(250), vec![]).unwrap();
        ledger.confirm(&owner(2), index).unwrap();

        let tx = ledger.get_transaction(index).unwrap();
        assert!(tx.executed);
        assert_eq!(tx.confirmations, 2);
        assert_eq!(ledger.balance(), Amount::new(1_000_000 - 250));
        assert_eq!(ledger.transfer_mechanism().transfers().len(), 1);
    }

    #[test]
    fn mixed_votes_can_still_execute() {
        let mut ledger = funded(5, 3);
        let index = ledger.propose(&owner(1), owner(9), Amount::new(5), vec![]).unwrap();
        ledger.reject(&owner(2), index).unwrap();
        ledger.confirm(&owner(3), index).unwrap();
        ledger.reject(&owner(4), index).unwrap();
        assert!(ledger.get_transaction(index).unwrap().is_pending());
        ledger.confirm(&owner(5), index).unwrap();

        let tx = ledger.get_transaction(index).unwrap();
        assert!(tx.executed);
        assert!(!tx.rejected);
        assert_eq!((tx.confirmations, tx.rejections), (3, 2));
    }

    #[test]
    fn insufficient_balance_leaves_vote_unrecorded() {
        let mut ledger = MultisigLedger::new(owners(2), 2, NullTransfer::new()).unwrap();
        let index = ledger.propose(&owner(1), owner(9), Amount::new(10), vec![]).unwrap();
        let before = ledger.events().len();

        let err = ledger.confirm(&owner(2), index).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::TransferFailed {
                source: TransferError::InsufficientFunds { needed: 10, available: 0 },
                ..
            }
        ));
        let tx = ledger.get_transaction(index).unwrap();
        assert_eq!(tx.confirmations, 1);
        assert!(!tx.has_voted(&owner(2)));
        assert_eq!(ledger.events().len(), before);
        assert!(ledger.transfer_mechanism().transfers().is_empty());
    }

    #[test]
    fn deposit_rejects_zero_and_overflow() {
        let mut ledger = MultisigLedger::new(owners(1), 1, NullTransfer::new()).unwrap();
        assert!(matches!(
            ledger.deposit(owner(7), Amount::ZERO),
            Err(LedgerError::InvalidAmount)
        ));
        ledger.deposit(owner(7), Amount::new(u128::MAX)).unwrap();
        assert!(matches!(
            ledger.deposit(owner(7), Amount::new(1)),
            Err(LedgerError::BalanceOverflow)
        ));
        assert_eq!(ledger.balance(), Amount::new(u128::MAX));
    }

    #[test]
    fn get_transaction_out_of_range() {
        let ledger = funded(2, 1);
        assert!(matches!(
            ledger.get_transaction(0),
            Err(LedgerError::NotFound(0))
        ));
        assert!(matches!(
            ledger.get_transaction(u64::MAX),
            Err(LedgerError::NotFound(_))
        ));
    }

    #[test]
    fn pending_transactions_skips_terminal_records() {
        let mut ledger = funded(3, 2);
        let a = ledger.propose(&owner(1), owner(9), Amount::new(1), vec![]).unwrap();
        let b = ledger.propose(&owner(2), owner(9), Amount::new(1), vec![]).unwrap();
        ledger.confirm(&owner(3), a).unwrap();

        let pending: Vec<TxIndex> = ledger.pending_transactions().map(|(i, _)| i).collect();
        assert_eq!(pending, vec![b]);
    }

    #[test]
    fn subscribers_see_committed_events_only() {
        use std::sync::{Arc, Mutex};

        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut ledger = MultisigLedger::new(owners(2), 2, NullTransfer::new()).unwrap();
        let sink = Arc::clone(&seen);
        ledger.subscribe(Box::new(move |event| {
            sink.lock().unwrap().push(event.name());
        }));

        assert!(ledger.propose(&owner(9), owner(1), Amount::new(1), vec![]).is_err());
        ledger.propose(&owner(1), owner(9), Amount::new(1), vec![]).unwrap();
        assert!(ledger.confirm(&owner(2), 0).is_err()); // unfunded

        assert_eq!(*seen.lock().unwrap(), vec!["TransactionProposed"]);
    }

    #[test]
    fn snapshot_restore_preserves_state() {
        let mut ledger = funded(4, 3);
        let a = ledger.propose(&owner(1), owner(9), Amount::new(7), vec![9]).unwrap();
        ledger.reject(&owner(2), a).unwrap();
        let b = ledger.propose(&owner(3), owner(8), Amount::new(3), vec![]).unwrap();
        ledger.confirm(&owner(1), b).unwrap();
        ledger.confirm(&owner(2), b).unwrap();

        let restored = MultisigLedger::restore(ledger.snapshot(), NullTransfer::new()).unwrap();
        assert_eq!(restored.get_owners(), ledger.get_owners());
        assert_eq!(restored.get_transactions(), ledger.get_transactions());
        assert_eq!(restored.balance(), ledger.balance());
        assert_eq!(restored.get_confirmations_required(), 3);
        assert!(restored.events().is_empty());
    }

    #[test]
    fn restore_rejects_inconsistent_records() {
        let mut ledger = funded(3, 2);
        ledger.propose(&owner(1), owner(9), Amount::new(1), vec![]).unwrap();
        let mut snapshot = ledger.snapshot();
        snapshot.transactions[0].confirmations = 2;
        let snapshot = LedgerSnapshot::create(
            snapshot.owners,
            snapshot.required_confirmations,
            snapshot.balance,
            snapshot.transactions,
        );
        assert!(matches!(
            MultisigLedger::restore(snapshot, NullTransfer::new()),
            Err(LedgerError::Snapshot(_))
        ));
    }

    #[test]
    fn restore_rejects_tampered_snapshot() {
        let ledger = funded(3, 2);
        let mut snapshot = ledger.snapshot();
        snapshot.balance = Amount::new(1);
        assert!(matches!(
            MultisigLedger::restore(snapshot, NullTransfer::new()),
            Err(LedgerError::Snapshot(_))
        ));
    }
}
