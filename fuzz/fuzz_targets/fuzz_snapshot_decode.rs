#![no_main]

use libfuzzer_sys::fuzz_target;
use multisig_ledger::{LedgerSnapshot, MultisigLedger, Transaction};
use multisig_nullables::NullTransfer;

fuzz_target!(|data: &[u8]| {
    // Decoding and restoring must reject malformed state without panicking.
    let _ = bincode::deserialize::<Transaction>(data);
    let _ = bincode::deserialize::<multisig_types::AccountId>(data);

    if let Ok(snapshot) = LedgerSnapshot::from_bytes(data) {
        let _ = MultisigLedger::restore(snapshot, NullTransfer::new());
    }
});
