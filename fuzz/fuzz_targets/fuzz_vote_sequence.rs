#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use multisig_ledger::{quorum_unreachable, MultisigLedger};
use multisig_nullables::NullTransfer;
use multisig_types::{AccountId, Amount, TransferError};

#[derive(Debug, Arbitrary)]
enum Call {
    Propose { caller: u8, value: u16 },
    Confirm { caller: u8, index: u8 },
    Reject { caller: u8, index: u8 },
    Deposit { amount: u16 },
    FailNextTransfer,
}

#[derive(Debug, Arbitrary)]
struct Input {
    owners: u8,
    required: u8,
    calls: Vec<Call>,
}

fn account(n: u8) -> AccountId {
    AccountId::from_bytes([n; 20])
}

fuzz_target!(|input: Input| {
    let n = input.owners % 16;
    let owners: Vec<AccountId> = (1..=n).map(account).collect();
    let Ok(mut ledger) =
        MultisigLedger::new(owners, u32::from(input.required % 18), NullTransfer::new())
    else {
        return;
    };
    let required = ledger.get_confirmations_required();

    for call in input.calls {
        let _ = match call {
            Call::Propose { caller, value } => ledger
                .propose(
                    &account(caller % 18),
                    account(200),
                    Amount::new(u128::from(value)),
                    Vec::new(),
                )
                .map(|_| ()),
            Call::Confirm { caller, index } => {
                ledger.confirm(&account(caller % 18), u64::from(index % 8))
            }
            Call::Reject { caller, index } => {
                ledger.reject(&account(caller % 18), u64::from(index % 8))
            }
            Call::Deposit { amount } => {
                ledger.deposit(account(250), Amount::new(u128::from(amount)))
            }
            Call::FailNextTransfer => {
                ledger
                    .transfer_mechanism_mut()
                    .fail_next(TransferError::Other("fuzz".into()));
                Ok(())
            }
        };

        for tx in ledger.get_transactions() {
            assert!(!(tx.executed && tx.rejected));
            assert!(tx.confirmations <= required);
            assert_eq!(tx.executed, tx.confirmations == required);
            assert_eq!(
                tx.rejected,
                quorum_unreachable(u32::from(n), tx.rejections, required)
            );
        }
    }

    let restored = MultisigLedger::restore(ledger.snapshot(), NullTransfer::new());
    assert!(restored.is_ok());
});
