use proptest::prelude::*;

use multisig_ledger::{quorum_unreachable, LedgerError, MultisigLedger, TxStatus};
use multisig_nullables::NullTransfer;
use multisig_types::{AccountId, Amount};

fn account(n: u8) -> AccountId {
    AccountId::from_bytes([n; 20])
}

fn owners(count: u8) -> Vec<AccountId> {
    (1..=count).map(account).collect()
}

/// (owner count, required confirmations) with 1 <= required <= owners.
fn configuration() -> impl Strategy<Value = (u8, u32)> {
    (1u8..=12).prop_flat_map(|n| (Just(n), 1u32..=n as u32))
}

#[derive(Clone, Debug)]
enum Call {
    Confirm(u8),
    Reject(u8),
}

fn calls(max_owner: u8) -> impl Strategy<Value = Vec<Call>> {
    prop::collection::vec(
        prop_oneof![
            (1u8..=max_owner).prop_map(Call::Confirm),
            (1u8..=max_owner).prop_map(Call::Reject),
        ],
        0..40,
    )
}

proptest! {
    /// Construction succeeds exactly for 1 <= required <= owners.
    #[test]
    fn construction_validates_threshold(n in 0u8..12, required in 0u32..16) {
        let result = MultisigLedger::new(owners(n), required, NullTransfer::new());
        let valid = n > 0 && required >= 1 && required <= n as u32;
        prop_assert_eq!(result.is_ok(), valid);
        if let Err(err) = result {
            prop_assert!(matches!(err, LedgerError::InvalidConfig(_)));
        }
    }

    /// Rejecting only: the record is blocked at exactly the (N - K + 1)-th
    /// rejection and never earlier. K == 1 executes on proposal, so it has
    /// nothing to block.
    #[test]
    fn blocked_exactly_at_quorum_impossibility((n, k) in configuration()) {
        prop_assume!(k > 1);
        let mut ledger = MultisigLedger::new(owners(n), k, NullTransfer::new()).unwrap();
        ledger.deposit(account(250), Amount::new(1)).unwrap();
        let index = ledger.propose(&account(1), account(200), Amount::new(1), vec![]).unwrap();

        let blocking = n as u32 - k + 1;
        for (i, voter) in (2..=n).enumerate() {
            let rejections = i as u32 + 1;
            if rejections > blocking {
                break;
            }
            ledger.reject(&account(voter), index).unwrap();
            let tx = ledger.get_transaction(index).unwrap();
            prop_assert_eq!(tx.rejected, rejections == blocking);
            prop_assert_eq!(tx.rejected, quorum_unreachable(n as u32, rejections, k));
        }
    }

    /// Arbitrary vote sequences: every owner votes at most once, terminal
    /// records never change, and counts match the accepted calls.
    #[test]
    fn arbitrary_vote_sequences_respect_invariants(
        (n, k) in configuration(),
        sequence in calls(12),
    ) {
        let mut ledger = MultisigLedger::new(owners(n), k, NullTransfer::new()).unwrap();
        ledger.deposit(account(250), Amount::new(1_000)).unwrap();
        let index = ledger.propose(&account(1), account(200), Amount::new(1), vec![]).unwrap();

        let mut accepted_confirms = 1u32;
        let mut accepted_rejects = 0u32;
        for call in sequence {
            let before = ledger.get_transaction(index).unwrap().clone();
            let (voter, result) = match call {
                Call::Confirm(v) => (v, ledger.confirm(&account(v), index)),
                Call::Reject(v) => (v, ledger.reject(&account(v), index)),
            };
            let after = ledger.get_transaction(index).unwrap().clone();

            match result {
                Ok(()) => {
                    prop_assert!(before.is_pending());
                    prop_assert!(!before.has_voted(&account(voter)));
                    match call {
                        Call::Confirm(_) => accepted_confirms += 1,
                        Call::Reject(_) => accepted_rejects += 1,
                    }
                }
                Err(LedgerError::Unauthorized(_)) => {
                    prop_assert!(voter > n);
                    prop_assert_eq!(&after, &before);
                }
                Err(LedgerError::AlreadyFinalized { status, .. }) => {
                    prop_assert!(status.is_terminal());
                    prop_assert_eq!(&after, &before);
                }
                Err(LedgerError::DuplicateVote { .. }) => {
                    prop_assert!(before.has_voted(&account(voter)));
                    prop_assert_eq!(&after, &before);
                }
                Err(other) => {
                    prop_assert!(false, "unexpected error: {}", other);
                }
            }

            prop_assert_eq!(after.confirmations, accepted_confirms);
            prop_assert_eq!(after.rejections, accepted_rejects);
            prop_assert!(after.confirmations <= k);
            prop_assert_eq!(after.executed, after.confirmations >= k);
            prop_assert_eq!(after.rejected, quorum_unreachable(n as u32, after.rejections, k));
            prop_assert!(!(after.executed && after.rejected));
        }

        let tx = ledger.get_transaction(index).unwrap();
        let released = ledger.transfer_mechanism().transfers().len();
        prop_assert_eq!(released, usize::from(tx.status() == TxStatus::Executed));
    }
}
