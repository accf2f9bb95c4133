//! The value-transfer seam.
//!
//! The ledger decides *when* funds leave the wallet; an implementation of
//! [`ValueTransfer`] decides *how*. The ledger only observes success or
//! failure, and treats a failure as "nothing happened".

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{AccountId, Amount, TxIndex};

/// A transfer the ledger has authorized and asks the mechanism to release.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundTransfer {
    /// Index of the transaction record being executed.
    pub index: TxIndex,
    pub target: AccountId,
    pub value: Amount,
    /// Opaque call data forwarded with the transfer.
    pub payload: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    #[error("insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: u128, available: u128 },

    #[error("transfer refused by recipient: {0}")]
    Rejected(String),

    #[error("{0}")]
    Other(String),
}

/// Performs the atomic debit/credit for an executed proposal.
///
/// Must be all-or-nothing: on `Err` no value may have moved.
pub trait ValueTransfer {
    fn transfer(&mut self, outbound: &OutboundTransfer) -> Result<(), TransferError>;
}

impl<T: ValueTransfer + ?Sized> ValueTransfer for Box<T> {
    fn transfer(&mut self, outbound: &OutboundTransfer) -> Result<(), TransferError> {
        (**self).transfer(outbound)
    }
}
