use multisig_types::{AccountId, TransferError, TxIndex};
use thiserror::Error;

use crate::transaction::TxStatus;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("not an owner: {0}")]
    Unauthorized(AccountId),

    #[error("transaction {0} does not exist")]
    NotFound(TxIndex),

    #[error("transaction {index} already {status}")]
    AlreadyFinalized { index: TxIndex, status: TxStatus },

    #[error("owner {voter} has already voted on transaction {index}")]
    DuplicateVote { index: TxIndex, voter: AccountId },

    #[error("transfer for transaction {index} failed: {source}")]
    TransferFailed {
        index: TxIndex,
        #[source]
        source: TransferError,
    },

    #[error("amount must be greater than zero")]
    InvalidAmount,

    #[error("wallet balance would overflow")]
    BalanceOverflow,

    #[error("snapshot error: {0}")]
    Snapshot(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LedgerError {
    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::AlreadyFinalized { .. } => "ALREADY_FINALIZED",
            Self::DuplicateVote { .. } => "DUPLICATE_VOTE",
            Self::TransferFailed { .. } => "TRANSFER_FAILED",
            Self::InvalidAmount => "INVALID_AMOUNT",
            Self::BalanceOverflow => "BALANCE_OVERFLOW",
            Self::Snapshot(_) => "SNAPSHOT_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Io(_) => "IO_ERROR",
        }
    }
}
