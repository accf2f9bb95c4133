//! Proposed transactions and their lifecycle.

use std::collections::BTreeSet;
use std::fmt;

use multisig_types::{AccountId, Amount, OutboundTransfer, TxIndex};
use serde::{Deserialize, Serialize};

/// Where a transaction record is in its lifecycle.
///
/// `Pending → {Executed | Rejected}`; both terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxStatus {
    /// Collecting votes.
    Pending,
    /// Confirmations reached the threshold and the transfer was released.
    Executed,
    /// Enough owners rejected that the threshold can no longer be reached.
    Rejected,
}

impl TxStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Executed => "executed",
            Self::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

/// One proposed outbound transfer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Owner who created the proposal. Their approval is pre-counted.
    pub proposer: AccountId,
    pub target: AccountId,
    pub value: Amount,
    /// Opaque call data, possibly empty.
    pub payload: Vec<u8>,
    /// Distinct owners who approved.
    pub confirmations: u32,
    /// Distinct owners who rejected.
    pub rejections: u32,
    pub executed: bool,
    pub rejected: bool,
    /// Every owner who cast any vote, confirm or reject.
    pub(crate) voters: BTreeSet<AccountId>,
}

impl Transaction {
    /// A fresh pending record carrying the proposer's implicit approval.
    pub(crate) fn proposed(
        proposer: AccountId,
        target: AccountId,
        value: Amount,
        payload: Vec<u8>,
    ) -> Self {
        Self {
            proposer,
            target,
            value,
            payload,
            confirmations: 1,
            rejections: 0,
            executed: false,
            rejected: false,
            voters: BTreeSet::from([proposer]),
        }
    }

    pub fn status(&self) -> TxStatus {
        if self.executed {
            TxStatus::Executed
        } else if self.rejected {
            TxStatus::Rejected
        } else {
            TxStatus::Pending
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status() == TxStatus::Pending
    }

    pub fn has_voted(&self, owner: &AccountId) -> bool {
        self.voters.contains(owner)
    }

    /// Owners who have voted, in account order.
    pub fn voters(&self) -> impl Iterator<Item = &AccountId> {
        self.voters.iter()
    }

    /// The transfer this record releases when it executes.
    pub(crate) fn outbound(&self, index: TxIndex) -> OutboundTransfer {
        OutboundTransfer {
            index,
            target: self.target,
            value: self.value,
            payload: self.payload.clone(),
        }
    }

    /// Record counts agree with the voter set and at most one terminal flag is set.
    pub(crate) fn is_consistent(&self) -> bool {
        let votes = u64::from(self.confirmations) + u64::from(self.rejections);
        self.confirmations >= 1
            && self.voters.contains(&self.proposer)
            && votes == self.voters.len() as u64
            && !(self.executed && self.rejected)
    }
}
