//! Nullable value transfer — record outbound transfers without moving value.

use std::collections::{HashSet, VecDeque};

use multisig_types::{AccountId, OutboundTransfer, TransferError, ValueTransfer};

/// A test transfer mechanism that records every released transfer.
///
/// Failures can be scripted: queued one-shot failures are consumed first,
/// then refused targets are checked.
#[derive(Debug, Default)]
pub struct NullTransfer {
    /// All transfers that "succeeded", in order.
    released: Vec<OutboundTransfer>,
    /// Failures to return on the next calls, one per call.
    scripted_failures: VecDeque<TransferError>,
    /// Recipients that refuse every transfer.
    refused: HashSet<AccountId>,
    /// Total calls, successful or not.
    attempts: usize,
}

impl NullTransfer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next call fail with `error`.
    pub fn fail_next(&mut self, error: TransferError) {
        self.scripted_failures.push_back(error);
    }

    /// Refuse every transfer to `target`.
    pub fn refuse(&mut self, target: AccountId) {
        self.refused.insert(target);
    }

    /// Get all released transfers (for assertions).
    pub fn transfers(&self) -> &[OutboundTransfer] {
        &self.released
    }

    /// Number of times the ledger invoked this mechanism.
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    /// Clear all state.
    pub fn reset(&mut self) {
        self.released.clear();
        self.scripted_failures.clear();
        self.refused.clear();
        self.attempts = 0;
    }
}

impl ValueTransfer for NullTransfer {
    fn transfer(&mut self, outbound: &OutboundTransfer) -> Result<(), TransferError> {
        self.attempts += 1;
        if let Some(error) = self.scripted_failures.pop_front() {
            return Err(error);
        }
        if self.refused.contains(&outbound.target) {
            return Err(TransferError::Rejected(format!(
                "{} refuses transfers",
                outbound.target
            )));
        }
        self.released.push(outbound.clone());
        Ok(())
    }
}
