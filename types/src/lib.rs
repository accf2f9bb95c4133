//! Fundamental types for the multisig wallet.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! account identifiers, amounts, transaction indices, and the value-transfer
//! seam through which the ledger releases funds.

pub mod account;
pub mod amount;
pub mod error;
pub mod transfer;

pub use account::AccountId;
pub use amount::Amount;
pub use error::TypesError;
pub use transfer::{OutboundTransfer, TransferError, ValueTransfer};

/// Position of a transaction record in the ledger's append-only sequence.
pub type TxIndex = u64;
